//! Ranked damage, tanking and healing stats across current fights
//!
//! Each [`StatKind`] keeps its own dead-totals accumulator. In the default
//! mode a dead fight simply drops out of the result. With a timeout override
//! the result is cumulative: dead fights are folded into the accumulator once
//! and keep contributing while the most recent update stays inside the window.
//!
//! The builder only reads the shared [`FightTracker`]. Fights it has consumed
//! are hidden in its own view, so other readers are unaffected by a query.

use hashbrown::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use eqlog_types::{ANY_CLASS, CombinedStats, OverlaySettings, OverlayStats, PlayerStats, StatKind};

use super::round2;
use crate::encounter::summary::{target_title, time_title, total_title};
use crate::encounter::{Fight, PlayerTotals, TimeRange};
use crate::game_data::SpellClass;
use crate::registry::{EntityRegistry, UNASSIGNED_PET_OWNER};
use crate::state::FightTracker;

/// Rows not updated within this many seconds are hidden
pub const MAX_TIMEOUT: f64 = 60.0;

#[derive(Debug, Clone, PartialEq)]
pub struct StatsRequest {
    /// Drop accumulated dead totals and dead fights before computing
    pub reset: bool,
    /// Cumulative window in seconds; `None` uses the fight timeout
    pub timeout_override: Option<u32>,
    pub max_rows: usize,
    /// Class name or abbreviation, or [`ANY_CLASS`]
    pub class_filter: String,
}

impl Default for StatsRequest {
    fn default() -> Self {
        Self {
            reset: false,
            timeout_override: None,
            max_rows: 5,
            class_filter: ANY_CLASS.to_string(),
        }
    }
}

impl StatsRequest {
    pub fn from_settings(settings: &OverlaySettings) -> Self {
        Self {
            reset: false,
            timeout_override: (settings.timeout_mode > 0).then_some(settings.timeout_mode),
            max_rows: settings.max_rows,
            class_filter: settings.selected_class.clone(),
        }
    }
}

/// Aggregated contribution of one credited name
#[derive(Debug, Clone, Default)]
struct PlayerAccum {
    total: i64,
    range: TimeRange,
    update_time: f64,
    has_pets: bool,
    order: usize,
}

#[derive(Debug, Clone, Default)]
struct Accumulator {
    players: HashMap<String, PlayerAccum>,
    range: TimeRange,
    update_time: f64,
    total: i64,
    fight_name: Option<String>,
    oldest_begin: Option<f64>,
    fight_count: u32,
}

impl Accumulator {
    fn absorb(&mut self, fight: &Fight, kind: StatKind, registry: &EntityRegistry) {
        let totals = totals_for(fight, kind);
        if totals.is_empty() {
            return;
        }

        for (name, total) in totals.ordered() {
            let (credited, from_pet) = credit_name(name, total.pet_owner.as_deref(), kind, registry);
            let next_order = self.players.len();
            let player = self.players.entry(credited).or_insert_with(|| PlayerAccum {
                order: next_order,
                ..Default::default()
            });

            player.total += total.total;
            player.range.add(total.segment());
            player.update_time = player.update_time.max(total.update_time);
            player.has_pets |= from_pet;

            self.range.add(total.segment());
            self.update_time = self.update_time.max(total.update_time);
            self.total += total.total;
        }

        self.fight_count += 1;
        if self.oldest_begin.is_none_or(|begin| fight.begin_time < begin) {
            self.oldest_begin = Some(fight.begin_time);
            self.fight_name = Some(fight.name.clone());
        }
    }
}

fn totals_for(fight: &Fight, kind: StatKind) -> &PlayerTotals {
    match kind {
        StatKind::Damage => &fight.damage,
        StatKind::Tanking => &fight.tanking,
        StatKind::Healing => &fight.healing,
    }
}

/// Pet damage is credited to its owner when one is known
fn credit_name(
    name: &str,
    pet_owner: Option<&str>,
    kind: StatKind,
    registry: &EntityRegistry,
) -> (String, bool) {
    if kind != StatKind::Damage {
        return (name.to_string(), false);
    }

    let owner = pet_owner
        .map(str::to_string)
        .or_else(|| registry.pet_owner_of(name))
        .filter(|owner| owner != UNASSIGNED_PET_OWNER && owner != name);

    match owner {
        Some(owner) => (owner, true),
        None => (name.to_string(), false),
    }
}

#[derive(Debug, Default)]
struct KindState {
    dead: Accumulator,
    /// Dead fights already folded into `dead`
    folded: HashSet<u64>,
}

/// The builder's own view of the shared fights.
///
/// Fights consumed or dropped by a query are hidden here; the tracker is
/// never modified, so taunt and spell-count readers keep seeing them.
#[derive(Debug, Default)]
struct OverlayView {
    hidden: HashSet<u64>,
}

impl OverlayView {
    /// Fights not hidden yet. Fights idle past `fight_timeout` are flagged dead
    /// even when the tracker has not expired them.
    fn visible(&mut self, snapshot: Vec<Fight>, now: f64, fight_timeout: f64) -> Vec<Fight> {
        let present: HashSet<u64> = snapshot.iter().map(|f| f.id).collect();
        self.hidden.retain(|id| present.contains(id));

        snapshot
            .into_iter()
            .filter(|fight| !self.hidden.contains(&fight.id))
            .map(|mut fight| {
                if now - fight.last_time > fight_timeout {
                    fight.dead = true;
                }
                fight
            })
            .collect()
    }

    fn evict_dead(&mut self, fights: &[Fight]) {
        self.hidden
            .extend(fights.iter().filter(|f| f.dead).map(|f| f.id));
    }
}

#[derive(Debug, Default)]
struct BuilderState {
    kinds: HashMap<StatKind, KindState>,
    view: OverlayView,
}

#[derive(Debug)]
pub struct DamageStatsBuilder {
    fights: Arc<FightTracker>,
    registry: Arc<EntityRegistry>,
    fight_timeout: f64,
    state: Mutex<BuilderState>,
}

impl DamageStatsBuilder {
    pub fn new(fights: Arc<FightTracker>, registry: Arc<EntityRegistry>, fight_timeout: f64) -> Self {
        Self {
            fights,
            registry,
            fight_timeout,
            state: Mutex::new(BuilderState::default()),
        }
    }

    /// Forget every dead-totals accumulator and show every tracked fight again
    pub fn reset(&self) {
        if let Ok(mut state) = self.state.lock() {
            *state = BuilderState::default();
        }
    }

    /// Build against the wall clock
    pub fn build(&self, request: &StatsRequest) -> Option<OverlayStats> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        self.build_at(request, now)
    }

    /// Build with `now` on the same clock as event timestamps
    pub fn build_at(&self, request: &StatsRequest, now: f64) -> Option<OverlayStats> {
        let override_mode = request.timeout_override.is_some_and(|t| t > 0);
        let timeout = match request.timeout_override {
            Some(t) if t > 0 => t as f64,
            _ => self.fight_timeout,
        };

        let Ok(mut state) = self.state.lock() else {
            return None;
        };
        let state = &mut *state;

        let mut fights = state.view.visible(self.fights.snapshot(), now, self.fight_timeout);
        if request.reset {
            state.kinds.clear();
            state.view.evict_dead(&fights);
            fights.retain(|f| !f.dead);
        }
        let visible_ids: HashSet<u64> = fights.iter().map(|f| f.id).collect();

        let mut stats = OverlayStats::default();
        for kind in StatKind::ALL {
            let kind_state = state.kinds.entry(kind).or_default();
            kind_state.folded.retain(|id| visible_ids.contains(id));
            let result = self.compute(kind, kind_state, &fights, now, timeout, override_mode, request);
            match kind {
                StatKind::Damage => stats.damage = result,
                StatKind::Tanking => stats.tanking = result,
                StatKind::Healing => stats.healing = result,
            }
        }

        // Dead fights were dropped or folded by this pass
        state.view.evict_dead(&fights);

        if stats.is_empty() {
            tracing::debug!(now, "No fresh stats, resetting dead totals");
            state.kinds.clear();
            return None;
        }
        Some(stats)
    }

    fn compute(
        &self,
        kind: StatKind,
        kind_state: &mut KindState,
        fights: &[Fight],
        now: f64,
        timeout: f64,
        override_mode: bool,
        request: &StatsRequest,
    ) -> Option<CombinedStats> {
        let mut working = if override_mode {
            kind_state.dead.clone()
        } else {
            Accumulator::default()
        };

        for fight in fights {
            if fight.dead {
                if override_mode && kind_state.folded.insert(fight.id) {
                    kind_state.dead.absorb(fight, kind, &self.registry);
                    working.absorb(fight, kind, &self.registry);
                }
                continue;
            }
            working.absorb(fight, kind, &self.registry);
        }

        let fight_name = working.fight_name.clone()?;
        let diff = now - working.update_time;
        if working.range.is_empty() || working.total <= 0 || !(0.0..=timeout).contains(&diff) {
            return None;
        }
        // Timestamps have one second resolution, so same-second hits span 1s
        let total_seconds = working.range.total_seconds().max(1.0);

        let stats_list = self.rank_rows(&working, now, timeout, request);
        let raid_dps = round2(working.total as f64 / total_seconds);

        Some(CombinedStats {
            kind,
            stats_list,
            raid_stats: PlayerStats {
                rank: 0,
                name: fight_name.clone(),
                orig_name: fight_name.clone(),
                class_name: String::new(),
                total: working.total,
                dps: raid_dps,
                total_seconds,
            },
            target_title: target_title(&fight_name, working.fight_count),
            time_title: time_title(total_seconds),
            total_title: total_title(kind, working.total, raid_dps),
            fight_count: working.fight_count,
        })
    }

    fn rank_rows(
        &self,
        working: &Accumulator,
        now: f64,
        timeout: f64,
        request: &StatsRequest,
    ) -> Vec<PlayerStats> {
        let mut players: Vec<(&String, &PlayerAccum)> = working.players.iter().collect();
        players.sort_by_key(|(_, p)| p.order);
        players.sort_by(|a, b| b.1.total.cmp(&a.1.total));

        let me = self.registry.player_name();
        let wanted_class = SpellClass::parse(&request.class_filter)
            .map(|c| c.name().to_string())
            .unwrap_or_else(|| request.class_filter.clone());
        let any_class = request.class_filter == ANY_CLASS;
        let row_timeout = MAX_TIMEOUT.max(timeout);

        let mut rows = Vec::new();
        let mut my_index = None;
        let mut rank = 0u16;

        for (name, player) in players {
            if player.range.is_empty() || now - player.update_time > row_timeout {
                continue;
            }
            rank += 1;

            let class_name = self.registry.player_class(name);
            let is_me = !me.is_empty() && *name == me;
            if !(is_me || any_class || class_name.eq_ignore_ascii_case(&wanted_class)) {
                continue;
            }

            // Single-hit rows still show a rate
            let total_seconds = player.range.total_seconds().max(1.0);
            if is_me {
                my_index = Some(rows.len());
            }
            rows.push(PlayerStats {
                rank,
                name: if player.has_pets {
                    format!("{name} +Pets")
                } else {
                    name.clone()
                },
                orig_name: name.clone(),
                class_name,
                total: player.total,
                dps: round2(player.total as f64 / total_seconds),
                total_seconds,
            });
        }

        let max_rows = request.max_rows.max(1);
        match my_index {
            Some(index) if index > max_rows - 1 => {
                let mine = rows.remove(index);
                rows.truncate(max_rows - 1);
                rows.push(mine);
            }
            _ => rows.truncate(max_rows),
        }
        rows
    }
}
