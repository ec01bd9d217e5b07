//! Spell and pet reference store
//!
//! Built once from `spells.txt` and `petnames.txt` and shared read-only
//! afterwards. Every lookup returns `Arc<SpellData>` so events can hold on to
//! the record without copying it.

use hashbrown::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use super::classes::SpellClass;
use super::error::ReferenceError;
use super::spells::SpellData;

pub const SPELLS_FILE: &str = "spells.txt";
pub const PET_NAMES_FILE: &str = "petnames.txt";

/// Which lands-on table a received phrase belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandsOn {
    /// Text shown to the player the spell landed on
    You,
    /// "Target's eyes glaze over." style text (leading "'s " removed)
    Possessive,
    /// " is surrounded by..." style text (leading space removed)
    Other,
}

#[derive(Debug, Default)]
pub struct ReferenceStore {
    by_id: HashMap<String, Arc<SpellData>>,
    by_abbrv: HashMap<String, Arc<SpellData>>,
    class_owners: HashMap<String, SpellClass>,
    lands_on_you: HashMap<String, Vec<Arc<SpellData>>>,
    lands_on_possessive: HashMap<String, Vec<Arc<SpellData>>>,
    lands_on_other: HashMap<String, Vec<Arc<SpellData>>>,
    game_pets: HashSet<String>,
}

impl ReferenceStore {
    /// Load both reference tables from `dir`. A missing file is an error.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ReferenceError> {
        let dir = dir.as_ref();
        let spells = open(&dir.join(SPELLS_FILE))?;
        let pets = open(&dir.join(PET_NAMES_FILE))?;
        let store = Self::from_readers(spells, pets)?;
        tracing::info!(
            path = ?dir,
            spells = store.by_id.len(),
            pets = store.game_pets.len(),
            "Loaded reference data"
        );
        Ok(store)
    }

    /// Build the store from already-open tables
    pub fn from_readers(spells: impl BufRead, pets: impl BufRead) -> Result<Self, ReferenceError> {
        let mut store = ReferenceStore::default();
        let mut excluded: HashSet<String> = HashSet::new();
        let mut skipped = 0usize;

        for line in spells.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match SpellData::parse_row(&line) {
                Some(spell) => store.insert_spell(Arc::new(spell), &mut excluded),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::warn!(skipped, "Skipped malformed spell reference rows");
        }

        for line in pets.lines() {
            let line = line?;
            let name = line.trim();
            if !name.is_empty() {
                store.game_pets.insert(name.to_string());
            }
        }

        Ok(store)
    }

    fn insert_spell(&mut self, spell: Arc<SpellData>, excluded: &mut HashSet<String>) {
        self.by_id.insert(spell.id.clone(), Arc::clone(&spell));
        self.by_abbrv.insert(spell.abbrv.clone(), Arc::clone(&spell));

        // Only single-class rows count. Names claimed by two classes are never
        // attributed.
        if let Some(class) = spell.owning_class()
            && !excluded.contains(&spell.name)
        {
            match self.class_owners.get(&spell.name) {
                None => {
                    self.class_owners.insert(spell.name.clone(), class);
                }
                Some(existing) if *existing == class => {}
                Some(_) => {
                    self.class_owners.remove(&spell.name);
                    excluded.insert(spell.name.clone());
                }
            }
        }

        if let Some(text) = spell.lands_on_other.strip_prefix("'s ") {
            push_candidate(&mut self.lands_on_possessive, text, &spell);
        } else if spell.lands_on_other.len() > 1 {
            let mut chars = spell.lands_on_other.chars();
            chars.next();
            push_candidate(&mut self.lands_on_other, chars.as_str(), &spell);
        }

        if !spell.lands_on_you.is_empty() && !spell.lands_on_other.is_empty() {
            push_candidate(&mut self.lands_on_you, &spell.lands_on_you, &spell);
        }
    }

    // --- Lookups ---

    pub fn by_id(&self, id: &str) -> Option<Arc<SpellData>> {
        self.by_id.get(id).cloned()
    }

    pub fn by_abbreviation(&self, abbrv: &str) -> Option<Arc<SpellData>> {
        self.by_abbrv.get(abbrv).cloned()
    }

    /// Class that exclusively owns the spell with this full name
    pub fn class_owner_of(&self, spell_name: &str) -> Option<SpellClass> {
        self.class_owners.get(spell_name).copied()
    }

    /// All spells whose landed text matches `text` in the given table
    pub fn lands_on(&self, kind: LandsOn, text: &str) -> &[Arc<SpellData>] {
        let table = match kind {
            LandsOn::You => &self.lands_on_you,
            LandsOn::Possessive => &self.lands_on_possessive,
            LandsOn::Other => &self.lands_on_other,
        };
        table.get(text).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_game_generated_pet(&self, name: &str) -> bool {
        self.game_pets.contains(name)
    }

    pub fn spell_count(&self) -> usize {
        self.by_id.len()
    }
}

fn open(path: &Path) -> Result<BufReader<File>, ReferenceError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| ReferenceError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn push_candidate(
    table: &mut HashMap<String, Vec<Arc<SpellData>>>,
    text: &str,
    spell: &Arc<SpellData>,
) {
    table
        .entry(text.to_string())
        .or_default()
        .push(Arc::clone(spell));
}
