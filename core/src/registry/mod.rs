//! Entity classification registry
//!
//! Decides whether a name belongs to a player, a pet or an NPC from the
//! evidence seen so far. Verification is sticky: once a name is a verified
//! player or pet it is never counted as an NPC again.
//!
//! The classification sets share one lock so a name can never be observed in
//! two exclusive sets at once. Pet owners, class inference and the player name
//! each have their own lock. Signals are emitted after locks are released.

use hashbrown::{HashMap, HashSet};
use phf::phf_set;
use std::sync::{Arc, RwLock};

use crate::game_data::{ReferenceStore, SpellClass};
use crate::signal_processor::{GameSignal, SignalBus};

#[cfg(test)]
mod tests;

/// Misses before a name is permanently treated as not a player
pub const PROBABLY_NOT_A_PLAYER_THRESHOLD: u32 = 5;

/// Owner assigned to game-generated pets whose real owner is not known yet
pub const UNASSIGNED_PET_OWNER: &str = "Unknown Pet Owner";

/// Tokens replaced by the configured player name
static SECOND_PERSON: phf::Set<&'static str> = phf_set! {
    "you", "You", "YOU",
    "your", "Your", "YOUR",
    "yourself", "Yourself", "YOURSELF",
};

/// Reflexive names the game uses for whoever cast on themselves
static THIRD_PERSON: phf::Set<&'static str> = phf_set! {
    "himself", "herself", "itself",
};

/// At least three characters, letters only
pub fn is_possible_player_name(name: &str) -> bool {
    name.chars().count() >= 3 && name.chars().all(char::is_alphabetic)
}

#[derive(Debug, Default)]
struct Classification {
    verified_players: HashSet<String>,
    verified_pets: HashSet<String>,
    definitely_not: HashSet<String>,
    probably_not: HashMap<String, u32>,
    unverified_pet_or_player: HashSet<String>,
    non_players: HashSet<String>,
}

impl Classification {
    fn is_verified(&self, name: &str) -> bool {
        self.verified_players.contains(name) || self.verified_pets.contains(name)
    }

    /// Drop every trace of NPC-ness. Returns true when the name was a tracked NPC.
    fn purge_non_player(&mut self, name: &str) -> bool {
        self.definitely_not.remove(name);
        self.probably_not.remove(name);
        self.unverified_pet_or_player.remove(name);
        self.non_players.remove(name)
    }

    fn is_likely_not_player(&self, name: &str, game_pet: bool) -> bool {
        if self.definitely_not.contains(name) {
            return true;
        }
        !self.is_verified(name)
            && !game_pet
            && !self.unverified_pet_or_player.contains(name)
            && self
                .probably_not
                .get(name)
                .is_some_and(|count| *count >= PROBABLY_NOT_A_PLAYER_THRESHOLD)
    }
}

/// Running cast tally used to infer a player's class
#[derive(Debug, Default)]
struct ClassTally {
    counts: HashMap<SpellClass, u32>,
    current: Option<SpellClass>,
    current_max: u32,
}

#[derive(Debug)]
pub struct EntityRegistry {
    reference: Arc<ReferenceStore>,
    bus: Arc<SignalBus>,
    sets: RwLock<Classification>,
    pet_owners: RwLock<HashMap<String, String>>,
    classes: RwLock<HashMap<String, ClassTally>>,
    player_name: RwLock<String>,
}

impl EntityRegistry {
    pub fn new(reference: Arc<ReferenceStore>, bus: Arc<SignalBus>) -> Self {
        let mut sets = Classification::default();
        sets.verified_players
            .extend(THIRD_PERSON.iter().map(|name| name.to_string()));

        Self {
            reference,
            bus,
            sets: RwLock::new(sets),
            pet_owners: RwLock::new(HashMap::new()),
            classes: RwLock::new(HashMap::new()),
            player_name: RwLock::new(String::new()),
        }
    }

    // --- Player Identity ---

    /// Install the character name used in place of "you"/"your"
    pub fn set_player_name(&self, name: &str) {
        let name = name.trim();
        if let Ok(mut current) = self.player_name.write() {
            *current = name.to_string();
        }
        if !name.is_empty() {
            self.mark_verified_player(name);
        }
    }

    pub fn player_name(&self) -> String {
        self.player_name
            .read()
            .map(|name| name.clone())
            .unwrap_or_default()
    }

    /// Rewrite self-references to the configured player name
    pub fn replace_attacker(&self, name: &str) -> (String, bool) {
        if SECOND_PERSON.contains(name) {
            let player = self.player_name();
            if !player.is_empty() {
                return (player, true);
            }
        }
        (name.to_string(), false)
    }

    // --- Verification ---

    pub fn is_verified_player(&self, name: &str) -> bool {
        self.sets
            .read()
            .map(|s| s.verified_players.contains(name))
            .unwrap_or(false)
    }

    /// True for verified pets. Game-generated pet names are verified on first
    /// check and given a placeholder owner.
    pub fn is_verified_pet(&self, name: &str) -> bool {
        let verified = self
            .sets
            .read()
            .map(|s| s.verified_pets.contains(name))
            .unwrap_or(false);
        if verified {
            return true;
        }

        if self.reference.is_game_generated_pet(name) {
            self.mark_verified_pet(name);
            self.assign_placeholder_owner(name);
            return true;
        }
        false
    }

    /// Give `pet` the unassigned owner unless it already has one. The check
    /// and insert share one write guard so a concurrent real owner wins.
    fn assign_placeholder_owner(&self, pet: &str) {
        let assigned = self
            .pet_owners
            .write()
            .map(|mut owners| {
                if owners.contains_key(pet) {
                    false
                } else {
                    owners.insert(pet.to_string(), UNASSIGNED_PET_OWNER.to_string());
                    true
                }
            })
            .unwrap_or(false);

        if assigned {
            tracing::debug!(pet, "Game pet given placeholder owner");
            self.bus.emit(GameSignal::PetMappingChanged {
                pet: pet.to_string(),
                owner: UNASSIGNED_PET_OWNER.to_string(),
            });
        }
    }

    pub fn is_pet_or_player(&self, name: &str) -> bool {
        self.is_verified_player(name) || self.is_verified_pet(name)
    }

    pub fn mark_verified_player(&self, name: &str) {
        let mut signals = Vec::new();
        if let Ok(mut sets) = self.sets.write() {
            if sets.verified_players.insert(name.to_string()) {
                sets.verified_pets.remove(name);
                tracing::debug!(name, "Verified player");
                signals.push(GameSignal::NewVerifiedPlayer {
                    name: name.to_string(),
                });
            }
            if sets.purge_non_player(name) {
                signals.push(GameSignal::RemovedNonPlayer {
                    name: name.to_string(),
                });
            }
        }
        self.bus.emit_all(signals);
    }

    pub fn mark_verified_pet(&self, name: &str) {
        let mut signals = Vec::new();
        if let Ok(mut sets) = self.sets.write() {
            if sets.verified_pets.insert(name.to_string()) {
                sets.verified_players.remove(name);
                tracing::debug!(name, "Verified pet");
                signals.push(GameSignal::NewVerifiedPet {
                    name: name.to_string(),
                });
            }
            if sets.purge_non_player(name) {
                signals.push(GameSignal::RemovedNonPlayer {
                    name: name.to_string(),
                });
            }
        }
        self.bus.emit_all(signals);
    }

    /// Record a name that behaves like a player or pet without proof.
    /// Ignored once the name is likely not a player.
    pub fn mark_unverified_pet_or_player(&self, name: &str) {
        let game_pet = self.reference.is_game_generated_pet(name);
        let mut removed = false;
        if let Ok(mut sets) = self.sets.write() {
            if sets.is_verified(name) || sets.is_likely_not_player(name, game_pet) {
                return;
            }
            sets.unverified_pet_or_player.insert(name.to_string());
            sets.probably_not.remove(name);
            removed = sets.non_players.remove(name);
        }
        if removed {
            self.bus.emit(GameSignal::RemovedNonPlayer {
                name: name.to_string(),
            });
        }
    }

    pub fn is_unverified_pet_or_player(&self, name: &str) -> bool {
        self.sets
            .read()
            .map(|s| s.unverified_pet_or_player.contains(name))
            .unwrap_or(false)
    }

    // --- Not-a-player Tracking ---

    /// Count one piece of evidence that `name` is not a player.
    /// Returns true when the count changed.
    pub fn record_possible_player_miss(&self, name: &str) -> bool {
        let game_pet = self.reference.is_game_generated_pet(name);
        let Ok(mut sets) = self.sets.write() else {
            return false;
        };

        if game_pet
            || sets.is_verified(name)
            || sets.unverified_pet_or_player.contains(name)
            || sets.definitely_not.contains(name)
        {
            return false;
        }

        let count = {
            let entry = sets.probably_not.entry(name.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };

        if count >= PROBABLY_NOT_A_PLAYER_THRESHOLD {
            sets.probably_not.remove(name);
            sets.definitely_not.insert(name.to_string());
            tracing::debug!(name, "Name is no longer considered a player");
        }
        true
    }

    pub fn is_likely_not_player(&self, name: &str) -> bool {
        let game_pet = self.reference.is_game_generated_pet(name);
        self.sets
            .read()
            .map(|s| s.is_likely_not_player(name, game_pet))
            .unwrap_or(false)
    }

    // --- NPC Tracking ---

    /// Remember a name seen acting as an NPC. Returns true on first sighting.
    pub fn note_non_player(&self, name: &str) -> bool {
        if self.is_verified_pet(name) {
            return false;
        }

        // Verification and insertion under one guard, so a concurrent
        // promotion either sees this name or is seen by it
        let added = self
            .sets
            .write()
            .map(|mut s| {
                !s.is_verified(name)
                    && !s.unverified_pet_or_player.contains(name)
                    && s.non_players.insert(name.to_string())
            })
            .unwrap_or(false);

        if added {
            self.bus.emit(GameSignal::NewNonPlayer {
                name: name.to_string(),
            });
        }
        added
    }

    pub fn is_known_non_player(&self, name: &str) -> bool {
        self.sets
            .read()
            .map(|s| s.non_players.contains(name))
            .unwrap_or(false)
    }

    // --- Pets ---

    pub fn pet_owner_of(&self, pet: &str) -> Option<String> {
        self.pet_owners
            .read()
            .ok()
            .and_then(|owners| owners.get(pet).cloned())
    }

    /// Assign `owner` to `pet`, signalling only when the owner changed
    pub fn set_pet_owner(&self, pet: &str, owner: &str) {
        let changed = self
            .pet_owners
            .write()
            .map(|mut owners| {
                let previous = owners.insert(pet.to_string(), owner.to_string());
                previous.as_deref() != Some(owner)
            })
            .unwrap_or(false);

        if changed {
            tracing::debug!(pet, owner, "Pet owner updated");
            self.bus.emit(GameSignal::PetMappingChanged {
                pet: pet.to_string(),
                owner: owner.to_string(),
            });
        }
    }

    // --- Class Inference ---

    /// Count a cast of a class-owned spell towards `player`'s class
    pub fn update_player_class(&self, player: &str, class: SpellClass) {
        if let Ok(mut classes) = self.classes.write() {
            let tally = classes.entry(player.to_string()).or_default();
            let count = tally.counts.entry(class).or_insert(0);
            *count += 1;
            if *count > tally.current_max {
                tally.current_max = *count;
                tally.current = Some(class);
            }
        }
    }

    /// Inferred class name, empty when nothing is known
    pub fn player_class(&self, name: &str) -> String {
        self.classes
            .read()
            .ok()
            .and_then(|classes| classes.get(name).and_then(|t| t.current))
            .map(|class| class.name().to_string())
            .unwrap_or_default()
    }

    // --- Lifecycle ---

    /// Verified players, sorted, excluding the reflexive placeholders
    pub fn verified_players(&self) -> Vec<String> {
        let mut players: Vec<String> = self
            .sets
            .read()
            .map(|s| {
                s.verified_players
                    .iter()
                    .filter(|name| !THIRD_PERSON.contains(name.as_str()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        players.sort();
        players
    }

    /// Forget NPC and candidate tracking. Verified names and pet owners persist.
    pub fn clear_active(&self) {
        if let Ok(mut sets) = self.sets.write() {
            sets.non_players.clear();
            sets.probably_not.clear();
            sets.definitely_not.clear();
            sets.unverified_pet_or_player.clear();
        }
        self.bus.emit(GameSignal::ActiveDataCleared);
    }
}
