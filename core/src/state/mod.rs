//! Shared mutable engine state: spell streams and fights

pub mod fights;
pub mod lru;
pub mod spell_streams;

pub use fights::{DEAD_FIGHT_HISTORY, FightPurger, FightTracker};
pub use lru::LruCache;
pub use spell_streams::{
    AMBIGUITY_CACHE_CAPACITY, AMBIGUITY_CACHE_TRIM, PlayerDeath, ReceivedSpell, SpellCast,
    SpellStreams, Timestamped,
};
