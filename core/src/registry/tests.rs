use super::*;
use std::sync::mpsc::Receiver;

fn registry_with_pets(pets: &str) -> (EntityRegistry, Receiver<GameSignal>) {
    let reference = ReferenceStore::from_readers("".as_bytes(), pets.as_bytes()).unwrap();
    let bus = Arc::new(SignalBus::new());
    let rx = bus.channel();
    (EntityRegistry::new(Arc::new(reference), bus), rx)
}

fn registry() -> (EntityRegistry, Receiver<GameSignal>) {
    registry_with_pets("")
}

fn drain(rx: &Receiver<GameSignal>) -> Vec<GameSignal> {
    rx.try_iter().collect()
}

#[test]
fn replace_attacker_uses_player_name() {
    let (registry, _rx) = registry();
    assert_eq!(registry.replace_attacker("You"), ("You".to_string(), false));

    registry.set_player_name("Kelethin");
    assert_eq!(registry.replace_attacker("You"), ("Kelethin".to_string(), true));
    assert_eq!(registry.replace_attacker("YOUR"), ("Kelethin".to_string(), true));
    assert_eq!(registry.replace_attacker("Yolanda"), ("Yolanda".to_string(), false));
    assert!(registry.is_verified_player("Kelethin"));
}

#[test]
fn reflexive_names_are_verified_players() {
    let (registry, _rx) = registry();
    assert!(registry.is_verified_player("himself"));
    assert!(registry.verified_players().is_empty());
}

#[test]
fn miss_threshold_reached_on_fifth_call() {
    let (registry, _rx) = registry();
    for _ in 0..4 {
        assert!(registry.record_possible_player_miss("a gnoll pup"));
        assert!(!registry.is_likely_not_player("a gnoll pup"));
    }
    assert!(registry.record_possible_player_miss("a gnoll pup"));
    assert!(registry.is_likely_not_player("a gnoll pup"));

    // Permanently excluded, no further counting
    assert!(!registry.record_possible_player_miss("a gnoll pup"));
    assert!(registry.is_likely_not_player("a gnoll pup"));
}

#[test]
fn verification_clears_miss_history() {
    let (registry, _rx) = registry();
    for _ in 0..PROBABLY_NOT_A_PLAYER_THRESHOLD {
        registry.record_possible_player_miss("Brewmaster");
    }
    assert!(registry.is_likely_not_player("Brewmaster"));

    registry.mark_verified_player("Brewmaster");
    assert!(!registry.is_likely_not_player("Brewmaster"));
    assert!(!registry.record_possible_player_miss("Brewmaster"));
    assert!(!registry.is_likely_not_player("Brewmaster"));
}

#[test]
fn unverified_candidates_are_not_counted() {
    let (registry, _rx) = registry();
    registry.mark_unverified_pet_or_player("Sorin");
    assert!(registry.is_unverified_pet_or_player("Sorin"));
    assert!(!registry.record_possible_player_miss("Sorin"));
    assert!(!registry.is_likely_not_player("Sorin"));
}

#[test]
fn likely_non_players_cannot_become_candidates() {
    let (registry, _rx) = registry();
    for _ in 0..PROBABLY_NOT_A_PLAYER_THRESHOLD {
        registry.record_possible_player_miss("Lord Nagafen");
    }
    registry.mark_unverified_pet_or_player("Lord Nagafen");
    assert!(!registry.is_unverified_pet_or_player("Lord Nagafen"));
}

#[test]
fn verified_pet_signal_fires_once() {
    let (registry, rx) = registry();
    registry.mark_verified_pet("Vabtik");
    registry.mark_verified_pet("Vabtik");

    let signals = drain(&rx);
    assert_eq!(
        signals,
        vec![GameSignal::NewVerifiedPet {
            name: "Vabtik".to_string()
        }]
    );
}

#[test]
fn promotion_removes_non_player() {
    let (registry, rx) = registry();
    assert!(registry.note_non_player("Tarnak"));
    assert!(!registry.note_non_player("Tarnak"));
    assert!(registry.is_known_non_player("Tarnak"));

    registry.mark_verified_player("Tarnak");
    assert!(!registry.is_known_non_player("Tarnak"));
    assert!(!registry.note_non_player("Tarnak"));

    let signals = drain(&rx);
    assert_eq!(
        signals,
        vec![
            GameSignal::NewNonPlayer { name: "Tarnak".into() },
            GameSignal::NewVerifiedPlayer { name: "Tarnak".into() },
            GameSignal::RemovedNonPlayer { name: "Tarnak".into() },
        ]
    );
}

#[test]
fn player_and_pet_are_exclusive() {
    let (registry, _rx) = registry();
    registry.mark_verified_player("Xegony");
    registry.mark_verified_pet("Xegony");
    assert!(registry.is_verified_pet("Xegony"));
    assert!(!registry.is_verified_player("Xegony"));
}

#[test]
fn pet_owner_signal_only_on_change() {
    let (registry, rx) = registry();
    registry.set_pet_owner("Jobanab", "Kelethin");
    registry.set_pet_owner("Jobanab", "Kelethin");
    registry.set_pet_owner("Jobanab", "Firiona");

    assert_eq!(registry.pet_owner_of("Jobanab").as_deref(), Some("Firiona"));
    assert_eq!(registry.pet_owner_of("Nobody"), None);

    let changes = drain(&rx)
        .into_iter()
        .filter(|s| matches!(s, GameSignal::PetMappingChanged { .. }))
        .count();
    assert_eq!(changes, 2);
}

#[test]
fn game_generated_pets_verify_on_check() {
    let (registry, rx) = registry_with_pets("Gobaner\n");
    assert!(registry.is_verified_pet("Gobaner"));
    assert_eq!(registry.pet_owner_of("Gobaner").as_deref(), Some(UNASSIGNED_PET_OWNER));
    assert!(!registry.record_possible_player_miss("Gobaner"));

    // Second check is a plain lookup
    assert!(registry.is_verified_pet("Gobaner"));
    let verified = drain(&rx)
        .into_iter()
        .filter(|s| matches!(s, GameSignal::NewVerifiedPet { .. }))
        .count();
    assert_eq!(verified, 1);
}

#[test]
fn class_follows_most_cast_class() {
    let (registry, _rx) = registry();
    assert_eq!(registry.player_class("Kelethin"), "");

    registry.update_player_class("Kelethin", SpellClass::Druid);
    assert_eq!(registry.player_class("Kelethin"), "Druid");

    registry.update_player_class("Kelethin", SpellClass::Wizard);
    registry.update_player_class("Kelethin", SpellClass::Wizard);
    assert_eq!(registry.player_class("Kelethin"), "Wizard");
}

#[test]
fn clear_active_keeps_verified_names() {
    let (registry, rx) = registry();
    registry.mark_verified_player("Kelethin");
    registry.note_non_player("a bat");
    registry.clear_active();

    assert!(registry.is_verified_player("Kelethin"));
    assert!(!registry.is_known_non_player("a bat"));
    assert_eq!(drain(&rx).last(), Some(&GameSignal::ActiveDataCleared));
}

#[test]
fn possible_player_names() {
    assert!(is_possible_player_name("Kelethin"));
    assert!(!is_possible_player_name("Al"));
    assert!(!is_possible_player_name("a gnoll"));
    assert!(!is_possible_player_name("Pet`s"));
}

#[test]
fn placeholder_owner_keeps_known_owner() {
    let (registry, rx) = registry_with_pets("Gobaner\n");
    registry.set_pet_owner("Gobaner", "Firiona");
    assert!(registry.is_verified_pet("Gobaner"));
    assert_eq!(registry.pet_owner_of("Gobaner").as_deref(), Some("Firiona"));

    let changes = drain(&rx)
        .into_iter()
        .filter(|s| matches!(s, GameSignal::PetMappingChanged { .. }))
        .count();
    assert_eq!(changes, 1);
}

// --- Concurrent producers ---

#[test]
fn parallel_verification_notifies_once_per_name() {
    let (registry, rx) = registry();
    let names: Vec<String> = (0..50).map(|i| format!("Player{i}")).collect();

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for name in &names {
                    registry.mark_verified_player(name);
                }
            });
        }
    });

    let mut verified: Vec<String> = drain(&rx)
        .into_iter()
        .filter_map(|s| match s {
            GameSignal::NewVerifiedPlayer { name } => Some(name),
            _ => None,
        })
        .collect();
    verified.sort();
    let mut expected = names.clone();
    expected.sort();
    assert_eq!(verified, expected);
}

#[test]
fn real_owner_survives_parallel_pet_checks() {
    let pets: String = (0..100).map(|i| format!("Gab{i}\n")).collect();
    let (registry, _rx) = registry_with_pets(&pets);
    let names: Vec<String> = (0..100).map(|i| format!("Gab{i}")).collect();

    std::thread::scope(|s| {
        s.spawn(|| {
            for name in &names {
                registry.is_verified_pet(name);
            }
        });
        s.spawn(|| {
            for name in names.iter().rev() {
                registry.set_pet_owner(name, "Firiona");
            }
        });
    });

    for name in &names {
        assert_eq!(registry.pet_owner_of(name).as_deref(), Some("Firiona"), "{name}");
    }
}

#[test]
fn promoted_names_never_stay_tracked_as_npcs() {
    let (registry, _rx) = registry();
    let names: Vec<String> = (0..100).map(|i| format!("Traveler{i}")).collect();

    std::thread::scope(|s| {
        s.spawn(|| {
            for name in &names {
                registry.note_non_player(name);
            }
        });
        s.spawn(|| {
            for name in names.iter().rev() {
                registry.mark_verified_player(name);
            }
        });
    });

    for name in &names {
        assert!(!registry.is_known_non_player(name), "{name}");
        assert!(registry.is_verified_player(name));
    }
}
