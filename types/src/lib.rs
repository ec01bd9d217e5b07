//! Shared configuration and query result types for eqlog
//!
//! This crate contains serializable types that are shared between the
//! aggregation engine (eqlog-core) and presentation code (the CLI, overlays).

use serde::{Deserialize, Serialize};

/// Class filter value that matches every player.
pub const ANY_CLASS: &str = "Any Class";

/// Default seconds of inactivity before a fight is considered dead.
pub const FIGHT_TIMEOUT: u32 = 30;

// ─────────────────────────────────────────────────────────────────────────────
// Query Result Types (shared between backend and frontend)
// ─────────────────────────────────────────────────────────────────────────────

/// Which per-player contribution a stats result is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StatKind {
    /// Damage dealt to NPCs
    #[default]
    Damage,
    /// Damage taken from NPCs
    Tanking,
    /// Healing done during a fight
    Healing,
}

impl StatKind {
    pub const ALL: [StatKind; 3] = [StatKind::Damage, StatKind::Tanking, StatKind::Healing];

    /// Label used in total titles ("150 Damage @15")
    pub fn label(&self) -> &'static str {
        match self {
            StatKind::Damage => "Damage",
            StatKind::Tanking => "Tanked",
            StatKind::Healing => "Healed",
        }
    }

    /// Short rate label (DPS, DTPS, HPS)
    pub fn rate_label(&self) -> &'static str {
        match self {
            StatKind::Damage => "DPS",
            StatKind::Tanking => "DTPS",
            StatKind::Healing => "HPS",
        }
    }
}

/// One ranked row of a stats result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    /// 1-based position in the ranking before class filtering
    pub rank: u16,
    /// Display name, including a " +Pets" suffix when pet damage was merged in
    pub name: String,
    /// Name without any suffix
    pub orig_name: String,
    /// Inferred class, empty when unknown
    pub class_name: String,
    pub total: i64,
    /// Total per second, rounded to two decimals
    pub dps: f64,
    pub total_seconds: f64,
}

/// Ranked, filtered rows plus the raid-wide aggregate for one [`StatKind`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CombinedStats {
    pub kind: StatKind,
    pub stats_list: Vec<PlayerStats>,
    pub raid_stats: PlayerStats,
    /// Target name, prefixed with "C(n): " when several fights are combined
    pub target_title: String,
    pub time_title: String,
    pub total_title: String,
    pub fight_count: u32,
}

/// Result of one overlay query. A kind is `None` when it had nothing fresh to show.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OverlayStats {
    pub damage: Option<CombinedStats>,
    pub tanking: Option<CombinedStats>,
    pub healing: Option<CombinedStats>,
}

impl OverlayStats {
    pub fn get(&self, kind: StatKind) -> Option<&CombinedStats> {
        match kind {
            StatKind::Damage => self.damage.as_ref(),
            StatKind::Tanking => self.tanking.as_ref(),
            StatKind::Healing => self.healing.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.damage.is_none() && self.tanking.is_none() && self.healing.is_none()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Overlay query settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySettings {
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
    #[serde(default = "default_selected_class")]
    pub selected_class: String,
    /// 0 uses the fight timeout; any other value is a cumulative window in seconds
    #[serde(default)]
    pub timeout_mode: u32,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            selected_class: default_selected_class(),
            timeout_mode: 0,
        }
    }
}

fn default_max_rows() -> usize {
    5
}
fn default_selected_class() -> String {
    ANY_CLASS.to_string()
}
fn default_fight_timeout() -> u32 {
    FIGHT_TIMEOUT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Character name that replaces "you"/"your" in events
    #[serde(default)]
    pub player_name: String,
    /// Directory holding spells.txt and petnames.txt
    #[serde(default)]
    pub data_directory: String,
    #[serde(default = "default_fight_timeout")]
    pub fight_timeout_secs: u32,
    #[serde(default)]
    pub overlay: OverlaySettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::with_data_directory(String::new())
    }
}

impl AppConfig {
    /// Create a new AppConfig with the specified data directory.
    /// Other fields use their default values.
    pub fn with_data_directory(data_directory: String) -> Self {
        Self {
            player_name: String::new(),
            data_directory,
            fight_timeout_secs: FIGHT_TIMEOUT,
            overlay: OverlaySettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_stats_lookup_by_kind() {
        let stats = OverlayStats {
            tanking: Some(CombinedStats {
                kind: StatKind::Tanking,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(stats.get(StatKind::Damage).is_none());
        assert_eq!(stats.get(StatKind::Tanking).map(|s| s.kind), Some(StatKind::Tanking));
        assert!(!stats.is_empty());
        assert!(OverlayStats::default().is_empty());
    }

    #[test]
    fn config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.fight_timeout_secs, 30);
        assert_eq!(config.overlay.max_rows, 5);
        assert_eq!(config.overlay.selected_class, ANY_CLASS);
        assert_eq!(config.overlay.timeout_mode, 0);
    }
}
