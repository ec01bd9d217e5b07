//! On-demand aggregation over fights and spell streams

pub mod damage;
pub mod spell_counts;
pub mod taunts;


pub use damage::{DamageStatsBuilder, MAX_TIMEOUT, StatsRequest};
pub use spell_counts::{BUFF_OFFSET, HALF_OFFSET, SpellCountData, spell_counts};
pub use taunts::{TauntCounts, TauntStats, taunt_stats};

/// Round half away from zero to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
