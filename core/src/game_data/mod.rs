//! Static EverQuest reference data: spells, classes and game-generated pet names

pub mod classes;
pub mod error;
pub mod reference;
pub mod spells;

pub use classes::SpellClass;
pub use error::ReferenceError;
pub use reference::{LandsOn, PET_NAMES_FILE, ReferenceStore, SPELLS_FILE};
pub use spells::{SpellData, abbreviate_spell_name};
