//! Fights against a single NPC and their per-player contributions

pub mod summary;
pub mod time_range;

use chrono::DateTime;
use hashbrown::HashMap;

pub use time_range::{TimeRange, TimeSegment};

/// One player's running contribution to a fight
#[derive(Debug, Clone, PartialEq)]
pub struct FightTotal {
    pub total: i64,
    pub hits: u32,
    /// Owner to credit when this total came from a pet
    pub pet_owner: Option<String>,
    pub begin_time: f64,
    pub update_time: f64,
    /// Position in which the player first contributed to the fight
    pub order: u32,
}

impl FightTotal {
    pub fn segment(&self) -> TimeSegment {
        TimeSegment::new(self.begin_time, self.update_time)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TauntEntry {
    pub player: String,
    pub success: bool,
    pub improved: bool,
    pub timestamp: f64,
}

/// Per-player totals keyed by name, remembering first-contribution order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerTotals {
    totals: HashMap<String, FightTotal>,
}

impl PlayerTotals {
    pub fn add(&mut self, player: &str, pet_owner: Option<&str>, amount: i64, timestamp: f64) {
        let order = self.totals.len() as u32;
        let total = self
            .totals
            .entry(player.to_string())
            .or_insert_with(|| FightTotal {
                total: 0,
                hits: 0,
                pet_owner: None,
                begin_time: timestamp,
                update_time: timestamp,
                order,
            });

        total.total += amount;
        total.hits += 1;
        total.begin_time = total.begin_time.min(timestamp);
        total.update_time = total.update_time.max(timestamp);
        if let Some(owner) = pet_owner {
            total.pet_owner = Some(owner.to_string());
        }
    }

    pub fn get(&self, player: &str) -> Option<&FightTotal> {
        self.totals.get(player)
    }

    /// Totals in the order players first contributed
    pub fn ordered(&self) -> Vec<(&String, &FightTotal)> {
        let mut entries: Vec<_> = self.totals.iter().collect();
        entries.sort_by_key(|(_, total)| total.order);
        entries
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fight {
    pub id: u64,
    /// NPC name
    pub name: String,
    pub begin_time: f64,
    pub last_time: f64,
    pub dead: bool,
    pub damage_total: i64,
    pub tank_total: i64,
    pub heal_total: i64,
    pub damage: PlayerTotals,
    pub tanking: PlayerTotals,
    pub healing: PlayerTotals,
    pub taunts: Vec<TauntEntry>,
}

impl Fight {
    pub fn new(id: u64, name: &str, timestamp: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            begin_time: timestamp,
            last_time: timestamp,
            dead: false,
            damage_total: 0,
            tank_total: 0,
            heal_total: 0,
            damage: PlayerTotals::default(),
            tanking: PlayerTotals::default(),
            healing: PlayerTotals::default(),
            taunts: Vec::new(),
        }
    }

    fn touch(&mut self, timestamp: f64) {
        self.last_time = self.last_time.max(timestamp);
    }

    pub fn add_damage(&mut self, player: &str, pet_owner: Option<&str>, amount: i64, timestamp: f64) {
        self.damage.add(player, pet_owner, amount, timestamp);
        self.damage_total += amount;
        self.touch(timestamp);
    }

    pub fn add_tanking(&mut self, player: &str, amount: i64, timestamp: f64) {
        self.tanking.add(player, None, amount, timestamp);
        self.tank_total += amount;
        self.touch(timestamp);
    }

    pub fn add_healing(&mut self, player: &str, amount: i64, timestamp: f64) {
        self.healing.add(player, None, amount, timestamp);
        self.heal_total += amount;
        self.touch(timestamp);
    }

    pub fn add_taunt(&mut self, taunt: TauntEntry) {
        self.touch(taunt.timestamp);
        self.taunts.push(taunt);
    }

    pub fn duration_seconds(&self) -> f64 {
        (self.last_time - self.begin_time).max(0.0)
    }

    /// Start time rendered as UTC, for timestamps that are epoch seconds
    pub fn began_at(&self) -> String {
        DateTime::from_timestamp(self.begin_time as i64, 0)
            .map(|dt| dt.format("%H:%M:%S").to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contributions_extend_fight_window() {
        let mut fight = Fight::new(1, "a gnoll", 100.0);
        fight.add_damage("Kelethin", None, 40, 100.0);
        fight.add_damage("Kelethin", None, 60, 110.0);
        fight.add_tanking("Firiona", 25, 105.0);

        assert_eq!(fight.damage_total, 100);
        assert_eq!(fight.tank_total, 25);
        assert_eq!(fight.last_time, 110.0);
        assert_eq!(fight.duration_seconds(), 10.0);

        let total = fight.damage.get("Kelethin").unwrap();
        assert_eq!(total.hits, 2);
        assert_eq!(total.segment(), TimeSegment::new(100.0, 110.0));
    }

    #[test]
    fn last_time_never_moves_backwards() {
        let mut fight = Fight::new(1, "a gnoll", 100.0);
        fight.add_damage("Kelethin", None, 1, 120.0);
        fight.add_damage("Kelethin", None, 1, 90.0);
        assert_eq!(fight.last_time, 120.0);
        assert_eq!(fight.damage.get("Kelethin").map(|t| t.begin_time), Some(90.0));
    }

    #[test]
    fn ordered_totals_follow_first_contribution() {
        let mut fight = Fight::new(1, "a gnoll", 0.0);
        fight.add_damage("Zed", None, 1, 0.0);
        fight.add_damage("Amy", None, 1, 1.0);
        fight.add_damage("Zed", None, 1, 2.0);
        let names: Vec<&String> = fight.damage.ordered().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Zed", "Amy"]);
    }

    #[test]
    fn began_at_formats_epoch_seconds() {
        let fight = Fight::new(1, "a gnoll", 3_661.0);
        assert_eq!(fight.began_at(), "01:01:01");
    }
}
