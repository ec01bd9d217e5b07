//! Active and recently dead fights
//!
//! A fight is created by the first NPC-targeted action against a name with no
//! active fight. It dies once nothing touches it for longer than the timeout
//! (checked whenever the log clock advances). Dead fights stay enumerable as
//! session history for every reader; only the oldest are evicted once more
//! than [`DEAD_FIGHT_HISTORY`] have piled up.

use hashbrown::HashMap;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::encounter::{Fight, TauntEntry};
use crate::signal_processor::{GameSignal, SignalHandler};

/// Dead fights kept for taunt, spell-count and cumulative stats readers
pub const DEAD_FIGHT_HISTORY: usize = 200;

#[derive(Debug, Default)]
struct FightState {
    /// NPC name -> id of its live fight
    active: HashMap<String, u64>,
    /// Every fight not yet evicted, in creation order
    fights: BTreeMap<u64, Fight>,
    next_id: u64,
}

impl FightState {
    fn fight_for(&mut self, npc: &str, timestamp: f64) -> &mut Fight {
        let id = match self.active.get(npc) {
            Some(id) => *id,
            None => {
                self.next_id += 1;
                let id = self.next_id;
                tracing::debug!(npc, id, "New fight");
                self.active.insert(npc.to_string(), id);
                self.fights.insert(id, Fight::new(id, npc, timestamp));
                id
            }
        };
        self.fights
            .entry(id)
            .or_insert_with(|| Fight::new(id, npc, timestamp))
    }
}

#[derive(Debug, Default)]
pub struct FightTracker {
    state: RwLock<FightState>,
}

impl FightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Contributions ---

    pub fn record_damage(
        &self,
        npc: &str,
        player: &str,
        pet_owner: Option<&str>,
        amount: i64,
        timestamp: f64,
    ) {
        if let Ok(mut state) = self.state.write() {
            state
                .fight_for(npc, timestamp)
                .add_damage(player, pet_owner, amount, timestamp);
        }
    }

    pub fn record_tanking(&self, npc: &str, player: &str, amount: i64, timestamp: f64) {
        if let Ok(mut state) = self.state.write() {
            state
                .fight_for(npc, timestamp)
                .add_tanking(player, amount, timestamp);
        }
    }

    /// Credit healing to the most recently active fight. Returns false when no
    /// fight is active.
    pub fn record_healing(&self, healer: &str, amount: i64, timestamp: f64) -> bool {
        let Ok(mut state) = self.state.write() else {
            return false;
        };
        let latest = state
            .active
            .values()
            .filter_map(|id| state.fights.get(id))
            .max_by(|a, b| a.last_time.total_cmp(&b.last_time).then(a.id.cmp(&b.id)))
            .map(|fight| fight.id);

        match latest.and_then(|id| state.fights.get_mut(&id)) {
            Some(fight) => {
                fight.add_healing(healer, amount, timestamp);
                true
            }
            None => false,
        }
    }

    pub fn record_taunt(&self, npc: &str, taunt: TauntEntry) {
        if let Ok(mut state) = self.state.write() {
            state.fight_for(npc, taunt.timestamp).add_taunt(taunt);
        }
    }

    // --- Lifecycle ---

    /// Mark fights idle for longer than `timeout` seconds as dead. Returns how
    /// many died.
    pub fn expire(&self, now: f64, timeout: f64) -> usize {
        let Ok(mut state) = self.state.write() else {
            return 0;
        };
        let state = &mut *state;
        let mut expired = 0;
        state.active.retain(|_, id| match state.fights.get_mut(id) {
            Some(fight) if now - fight.last_time > timeout => {
                fight.dead = true;
                expired += 1;
                false
            }
            Some(_) => true,
            None => false,
        });
        if expired > 0 {
            tracing::debug!(expired, now, "Fights timed out");
        }
        expired
    }

    /// Evict dead fights with the given ids. Live fights are left alone.
    pub fn evict(&self, ids: &[u64]) -> usize {
        let Ok(mut state) = self.state.write() else {
            return 0;
        };
        let mut evicted = 0;
        for id in ids {
            if state.fights.get(id).is_some_and(|f| f.dead) {
                state.fights.remove(id);
                evicted += 1;
            }
        }
        evicted
    }

    /// Evict the oldest dead fights until at most `keep` remain
    pub fn trim_dead(&self, keep: usize) -> usize {
        let dead: Vec<u64> = match self.state.read() {
            Ok(state) => state
                .fights
                .values()
                .filter(|f| f.dead)
                .map(|f| f.id)
                .collect(),
            Err(_) => return 0,
        };
        if dead.len() <= keep {
            return 0;
        }
        let evicted = self.evict(&dead[..dead.len() - keep]);
        tracing::debug!(evicted, keep, "Trimmed dead fight history");
        evicted
    }

    /// Drop the live fight of an NPC that turned out to be a player or pet
    pub fn remove_active(&self, npc: &str) -> bool {
        let Ok(mut state) = self.state.write() else {
            return false;
        };
        match state.active.remove(npc) {
            Some(id) => {
                state.fights.remove(&id);
                tracing::debug!(npc, id, "Removed fight for reclassified name");
                true
            }
            None => false,
        }
    }

    /// Forget every fight
    pub fn reset(&self) {
        if let Ok(mut state) = self.state.write() {
            state.active.clear();
            state.fights.clear();
        }
    }

    // --- Reads ---

    /// Copy of every fight, live and dead, in creation order
    pub fn snapshot(&self) -> Vec<Fight> {
        self.state
            .read()
            .map(|state| state.fights.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn active_fight(&self, npc: &str) -> Option<Fight> {
        self.state.read().ok().and_then(|state| {
            state
                .active
                .get(npc)
                .and_then(|id| state.fights.get(id))
                .cloned()
        })
    }

    pub fn has_active_fight(&self, npc: &str) -> bool {
        self.state
            .read()
            .map(|state| state.active.contains_key(npc))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.fights.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Drops the active fight of any NPC name that gets reclassified
pub struct FightPurger {
    fights: Arc<FightTracker>,
}

impl FightPurger {
    pub fn new(fights: Arc<FightTracker>) -> Self {
        Self { fights }
    }
}

impl SignalHandler for FightPurger {
    fn handle_signal(&mut self, signal: &GameSignal) {
        if let GameSignal::RemovedNonPlayer { name } = signal {
            self.fights.remove_active(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taunt(player: &str, timestamp: f64) -> TauntEntry {
        TauntEntry {
            player: player.to_string(),
            success: true,
            improved: false,
            timestamp,
        }
    }

    #[test]
    fn contributions_share_the_active_fight() {
        let fights = FightTracker::new();
        fights.record_damage("a gnoll", "Kelethin", None, 10, 0.0);
        fights.record_tanking("a gnoll", "Firiona", 5, 1.0);
        fights.record_taunt("a gnoll", taunt("Firiona", 2.0));

        assert_eq!(fights.len(), 1);
        let fight = fights.active_fight("a gnoll").unwrap();
        assert_eq!(fight.damage_total, 10);
        assert_eq!(fight.tank_total, 5);
        assert_eq!(fight.taunts.len(), 1);
        assert_eq!(fight.last_time, 2.0);
    }

    #[test]
    fn expired_fight_is_dead_and_replaced() {
        let fights = FightTracker::new();
        fights.record_damage("a gnoll", "Kelethin", None, 10, 0.0);

        assert_eq!(fights.expire(30.0, 30.0), 0);
        assert_eq!(fights.expire(30.5, 30.0), 1);
        assert!(!fights.has_active_fight("a gnoll"));

        fights.record_damage("a gnoll", "Kelethin", None, 7, 40.0);
        let snapshot = fights.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot[0].dead);
        assert!(!snapshot[1].dead);
        assert_eq!(snapshot[1].damage_total, 7);
    }

    #[test]
    fn evict_only_removes_dead_fights() {
        let fights = FightTracker::new();
        fights.record_damage("a gnoll", "Kelethin", None, 10, 0.0);
        fights.record_damage("a bat", "Kelethin", None, 10, 50.0);
        fights.expire(60.0, 30.0);

        let ids: Vec<u64> = fights.snapshot().iter().map(|f| f.id).collect();
        assert_eq!(fights.evict(&ids), 1);
        assert_eq!(fights.len(), 1);
        assert!(fights.has_active_fight("a bat"));
    }

    #[test]
    fn healing_goes_to_latest_fight() {
        let fights = FightTracker::new();
        assert!(!fights.record_healing("Cleric", 100, 0.0));

        fights.record_damage("a gnoll", "Kelethin", None, 10, 0.0);
        fights.record_damage("a bat", "Kelethin", None, 10, 5.0);
        assert!(fights.record_healing("Cleric", 100, 6.0));

        assert_eq!(fights.active_fight("a bat").unwrap().heal_total, 100);
        assert_eq!(fights.active_fight("a gnoll").unwrap().heal_total, 0);
    }

    #[test]
    fn trim_dead_keeps_newest_history() {
        let fights = FightTracker::new();
        for (i, npc) in ["a gnoll", "a bat", "a rat"].into_iter().enumerate() {
            fights.record_damage(npc, "Kelethin", None, 10, i as f64);
        }
        fights.expire(100.0, 30.0);
        fights.record_damage("a wolf", "Kelethin", None, 10, 100.0);

        assert_eq!(fights.trim_dead(1), 2);
        let names: Vec<String> = fights.snapshot().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["a rat", "a wolf"]);
        assert_eq!(fights.trim_dead(1), 0);
    }

    #[test]
    fn parallel_updates_and_expiry_keep_totals() {
        let fights = FightTracker::new();
        std::thread::scope(|s| {
            for npc in ["a gnoll", "a bat", "a rat", "a wolf"] {
                let fights = &fights;
                s.spawn(move || {
                    for i in 0..250 {
                        fights.record_damage(npc, "Kelethin", None, 2, i as f64 * 0.1);
                    }
                });
            }
            s.spawn(|| {
                for i in 0..100 {
                    // Never past the timeout, so nothing dies mid-update
                    fights.expire(i as f64 * 0.1, 30.0);
                }
            });
        });

        let snapshot = fights.snapshot();
        assert_eq!(snapshot.len(), 4);
        assert!(snapshot.iter().all(|f| !f.dead && f.damage_total == 500));

        fights.expire(100.0, 30.0);
        assert!(fights.snapshot().iter().all(|f| f.dead));
    }

    #[test]
    fn purger_removes_reclassified_fight() {
        let fights = Arc::new(FightTracker::new());
        fights.record_damage("Sorin", "Kelethin", None, 10, 0.0);

        let mut purger = FightPurger::new(Arc::clone(&fights));
        purger.handle_signal(&GameSignal::RemovedNonPlayer { name: "Sorin".into() });
        assert!(fights.is_empty());
    }
}
