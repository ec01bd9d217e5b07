//! EverQuest player classes and spell class bitmasks
//!
//! Spell reference rows carry a bitmask of the classes able to use the spell.
//! Only masks with exactly one bit set attribute a spell to a class.

use phf::phf_map;
use serde::{Deserialize, Serialize};

/// EverQuest player classes, valued by their spell bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum SpellClass {
    Warrior = 1,
    Cleric = 2,
    Paladin = 4,
    Ranger = 8,
    ShadowKnight = 16,
    Druid = 32,
    Monk = 64,
    Bard = 128,
    Rogue = 256,
    Shaman = 512,
    Necromancer = 1024,
    Wizard = 2048,
    Magician = 4096,
    Enchanter = 8192,
    Beastlord = 16384,
    Berserker = 32768,
}

impl SpellClass {
    pub const ALL: [SpellClass; 16] = [
        SpellClass::Warrior,
        SpellClass::Cleric,
        SpellClass::Paladin,
        SpellClass::Ranger,
        SpellClass::ShadowKnight,
        SpellClass::Druid,
        SpellClass::Monk,
        SpellClass::Bard,
        SpellClass::Rogue,
        SpellClass::Shaman,
        SpellClass::Necromancer,
        SpellClass::Wizard,
        SpellClass::Magician,
        SpellClass::Enchanter,
        SpellClass::Beastlord,
        SpellClass::Berserker,
    ];

    pub const fn mask(self) -> u32 {
        self as u32
    }

    /// Class owning a mask with exactly one class bit set
    pub fn from_mask(mask: u32) -> Option<SpellClass> {
        if !mask.is_power_of_two() {
            return None;
        }
        Self::ALL.into_iter().find(|c| c.mask() == mask)
    }

    /// Display name, also used by the overlay class filter
    pub const fn name(&self) -> &'static str {
        match self {
            SpellClass::Warrior => "Warrior",
            SpellClass::Cleric => "Cleric",
            SpellClass::Paladin => "Paladin",
            SpellClass::Ranger => "Ranger",
            SpellClass::ShadowKnight => "Shadow Knight",
            SpellClass::Druid => "Druid",
            SpellClass::Monk => "Monk",
            SpellClass::Bard => "Bard",
            SpellClass::Rogue => "Rogue",
            SpellClass::Shaman => "Shaman",
            SpellClass::Necromancer => "Necromancer",
            SpellClass::Wizard => "Wizard",
            SpellClass::Magician => "Magician",
            SpellClass::Enchanter => "Enchanter",
            SpellClass::Beastlord => "Beastlord",
            SpellClass::Berserker => "Berserker",
        }
    }

    /// Parse a three-letter abbreviation ("SHD") or a display name ("Shadow Knight")
    pub fn parse(value: &str) -> Option<SpellClass> {
        CLASS_ABBREVIATIONS
            .get(value.to_ascii_uppercase().as_str())
            .copied()
            .or_else(|| Self::ALL.into_iter().find(|c| c.name().eq_ignore_ascii_case(value)))
    }
}

static CLASS_ABBREVIATIONS: phf::Map<&'static str, SpellClass> = phf_map! {
    "WAR" => SpellClass::Warrior,
    "CLR" => SpellClass::Cleric,
    "PAL" => SpellClass::Paladin,
    "RNG" => SpellClass::Ranger,
    "SHD" => SpellClass::ShadowKnight,
    "DRU" => SpellClass::Druid,
    "MNK" => SpellClass::Monk,
    "BRD" => SpellClass::Bard,
    "ROG" => SpellClass::Rogue,
    "SHM" => SpellClass::Shaman,
    "NEC" => SpellClass::Necromancer,
    "WIZ" => SpellClass::Wizard,
    "MAG" => SpellClass::Magician,
    "ENC" => SpellClass::Enchanter,
    "BST" => SpellClass::Beastlord,
    "BER" => SpellClass::Berserker,
};
