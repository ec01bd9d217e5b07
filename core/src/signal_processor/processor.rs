//! Routes classified events into the registry, spell streams and fights.
//!
//! The processor holds no per-event state apart from the log clock, so many
//! producer threads can share one instance. Each store guards itself.

use std::sync::{Arc, Mutex};

use crate::combat_log::{
    CastRecord, ChatRecord, CombatEvent, DamageRecord, DeathRecord, EventKind, HealRecord,
    ReceivedRecord, TauntRecord,
};
use crate::encounter::TauntEntry;
use crate::game_data::{ReferenceStore, abbreviate_spell_name};
use crate::registry::{EntityRegistry, is_possible_player_name};
use crate::state::{
    DEAD_FIGHT_HISTORY, FightTracker, PlayerDeath, ReceivedSpell, SpellCast, SpellStreams,
};

/// Which side of a damage event is the NPC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcSide {
    Attacker,
    Defender,
}

#[derive(Debug)]
pub struct EventProcessor {
    reference: Arc<ReferenceStore>,
    registry: Arc<EntityRegistry>,
    streams: Arc<SpellStreams>,
    fights: Arc<FightTracker>,
    fight_timeout: f64,
    /// Latest timestamp seen
    clock: Mutex<f64>,
}

impl EventProcessor {
    pub fn new(
        reference: Arc<ReferenceStore>,
        registry: Arc<EntityRegistry>,
        streams: Arc<SpellStreams>,
        fights: Arc<FightTracker>,
        fight_timeout: f64,
    ) -> Self {
        Self {
            reference,
            registry,
            streams,
            fights,
            fight_timeout,
            clock: Mutex::new(f64::MIN),
        }
    }

    pub fn process_event(&self, event: CombatEvent) {
        let timestamp = event.timestamp;
        self.advance_clock(timestamp);

        match event.kind {
            EventKind::Damage(record) => self.handle_damage(record, timestamp),
            EventKind::Heal(record) => self.handle_heal(record, timestamp),
            EventKind::Cast(record) => self.handle_cast(record, timestamp),
            EventKind::Received(record) => self.handle_received(record, timestamp),
            EventKind::Taunt(record) => self.handle_taunt(record, timestamp),
            EventKind::Death(record) => self.handle_death(record, timestamp),
            EventKind::Chat(record) => self.handle_chat(record),
        }
    }

    /// Latest event timestamp, if any event was processed
    pub fn last_timestamp(&self) -> Option<f64> {
        self.clock
            .lock()
            .ok()
            .map(|clock| *clock)
            .filter(|t| *t > f64::MIN)
    }

    pub fn reset_clock(&self) {
        if let Ok(mut clock) = self.clock.lock() {
            *clock = f64::MIN;
        }
    }

    fn advance_clock(&self, timestamp: f64) {
        let advanced = match self.clock.lock() {
            Ok(mut clock) if timestamp > *clock => {
                *clock = timestamp;
                true
            }
            _ => false,
        };
        if advanced && self.fights.expire(timestamp, self.fight_timeout) > 0 {
            self.fights.trim_dead(DEAD_FIGHT_HISTORY);
        }
    }

    // --- Damage ---

    fn handle_damage(&self, record: DamageRecord, timestamp: f64) {
        let (attacker, _) = self.registry.replace_attacker(&record.attacker);
        let (defender, _) = self.registry.replace_attacker(&record.defender);
        if attacker.is_empty() || defender.is_empty() || attacker.eq_ignore_ascii_case(&defender) {
            return;
        }

        let attacker_owner = record
            .attacker_owner
            .as_deref()
            .map(|owner| self.registry.replace_attacker(owner).0);
        let defender_owner = record
            .defender_owner
            .as_deref()
            .map(|owner| self.registry.replace_attacker(owner).0);

        if let Some(owner) = &attacker_owner {
            self.claim_pet(&attacker, owner);
        }
        if let Some(owner) = &defender_owner {
            self.claim_pet(&defender, owner);
        }

        match self.npc_side(&attacker, &defender) {
            Some(NpcSide::Defender) => {
                self.note_npc(&defender);
                self.fights.record_damage(
                    &defender,
                    &attacker,
                    attacker_owner.as_deref(),
                    record.amount,
                    timestamp,
                );
            }
            Some(NpcSide::Attacker) => {
                self.note_npc(&attacker);
                self.fights
                    .record_tanking(&attacker, &defender, record.amount, timestamp);
            }
            None => {
                tracing::trace!(attacker = %attacker, defender = %defender, "Damage with no clear NPC side");
            }
        }
    }

    fn claim_pet(&self, pet: &str, owner: &str) {
        self.registry.mark_verified_pet(pet);
        self.registry.mark_verified_player(owner);
        self.registry.set_pet_owner(pet, owner);
    }

    fn note_npc(&self, name: &str) {
        self.registry.note_non_player(name);
        self.registry.record_possible_player_miss(name);
    }

    fn is_npc(&self, name: &str) -> bool {
        self.registry.is_known_non_player(name) || self.fights.has_active_fight(name)
    }

    fn is_plausible_player(&self, name: &str) -> bool {
        is_possible_player_name(name) && !self.registry.is_likely_not_player(name)
    }

    /// Decide which participant is the NPC from what the registry knows
    pub fn npc_side(&self, attacker: &str, defender: &str) -> Option<NpcSide> {
        let attacker_friendly = self.registry.is_pet_or_player(attacker);
        let defender_friendly = self.registry.is_pet_or_player(defender);

        match (attacker_friendly, defender_friendly) {
            (true, false) => Some(NpcSide::Defender),
            (false, true) => Some(NpcSide::Attacker),
            // Duels and PvP are not fights
            (true, true) => None,
            (false, false) => match (self.is_npc(attacker), self.is_npc(defender)) {
                (false, true) => {
                    if self.is_plausible_player(attacker) {
                        self.registry.mark_unverified_pet_or_player(attacker);
                    }
                    Some(NpcSide::Defender)
                }
                (true, false) => {
                    if self.is_plausible_player(defender) {
                        self.registry.mark_unverified_pet_or_player(defender);
                    }
                    Some(NpcSide::Attacker)
                }
                // A charmed NPC attacking the NPC being fought
                (true, true) => (self.fights.has_active_fight(defender)
                    && !self.fights.has_active_fight(attacker))
                .then_some(NpcSide::Defender),
                (false, false) => {
                    match (self.is_plausible_player(attacker), self.is_plausible_player(defender)) {
                        (true, false) => Some(NpcSide::Defender),
                        (false, true) => Some(NpcSide::Attacker),
                        _ => None,
                    }
                }
            },
        }
    }

    // --- Healing ---

    fn handle_heal(&self, record: HealRecord, timestamp: f64) {
        let (healer, _) = self.registry.replace_attacker(&record.healer);
        let (healed, _) = self.registry.replace_attacker(&record.healed);

        // NPCs healing each other say nothing about players
        if self.is_npc(&healer) || self.is_npc(&healed) {
            return;
        }

        for name in [&healer, &healed] {
            if !self.registry.is_pet_or_player(name) && self.is_plausible_player(name) {
                self.registry.mark_unverified_pet_or_player(name);
            }
        }

        if self.registry.is_pet_or_player(&healer)
            || self.registry.is_unverified_pet_or_player(&healer)
        {
            self.fights.record_healing(&healer, record.amount, timestamp);
        }
    }

    // --- Spells ---

    fn handle_cast(&self, record: CastRecord, timestamp: f64) {
        let (caster, _) = self.registry.replace_attacker(&record.caster);
        let abbrv = abbreviate_spell_name(&record.spell);
        let spell_data = self.reference.by_abbreviation(&abbrv);

        if !record.interrupted
            && let Some(class) = self.reference.class_owner_of(&record.spell)
            && !self.registry.is_known_non_player(&caster)
            && is_possible_player_name(&caster)
        {
            self.registry.mark_verified_player(&caster);
            self.registry.update_player_class(&caster, class);
        }

        self.streams.append_cast(SpellCast {
            timestamp,
            caster,
            spell: record.spell,
            spell_abbrv: abbrv,
            spell_data,
            interrupted: record.interrupted,
        });
    }

    fn handle_received(&self, record: ReceivedRecord, timestamp: f64) {
        let (receiver, _) = self.registry.replace_attacker(&record.receiver);
        let candidates = self
            .reference
            .lands_on(record.phrase_kind, &record.phrase)
            .to_vec();

        if candidates.is_empty() {
            tracing::trace!(phrase = %record.phrase, "Landed text matches no spell");
            return;
        }

        // Ambiguous spells are resolved at query time, once more casts are known
        self.streams.append_received(ReceivedSpell::new(
            timestamp,
            &receiver,
            &record.phrase,
            candidates,
            record.wear_off,
        ));
    }

    // --- Other ---

    fn handle_taunt(&self, record: TauntRecord, timestamp: f64) {
        let (player, _) = self.registry.replace_attacker(&record.player);
        if is_possible_player_name(&player) {
            self.registry.mark_verified_player(&player);
        }
        self.registry.note_non_player(&record.npc);
        self.fights.record_taunt(
            &record.npc,
            TauntEntry {
                player,
                success: record.success,
                improved: record.improved,
                timestamp,
            },
        );
    }

    fn handle_death(&self, record: DeathRecord, timestamp: f64) {
        let (killed, _) = self.registry.replace_attacker(&record.killed);
        if self.registry.is_verified_player(&killed) {
            let killer = record
                .killer
                .as_deref()
                .map(|k| self.registry.replace_attacker(k).0);
            self.streams.append_death(PlayerDeath {
                timestamp,
                player: killed,
                killer,
            });
        }
    }

    fn handle_chat(&self, record: ChatRecord) {
        let (sender, _) = self.registry.replace_attacker(&record.sender);
        if is_possible_player_name(&sender) && !self.registry.is_known_non_player(&sender) {
            self.registry.mark_verified_player(&sender);
        }
    }
}
