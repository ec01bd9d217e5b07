pub mod combat_log;
pub mod context;
pub mod encounter;
pub mod game_data;
pub mod query;
pub mod registry;
pub mod signal_processor;
pub mod state;

// Re-exports for convenience
pub use combat_log::*;
pub use context::{AppConfig, AppConfigExt, ConfigError, OverlaySettings, ParsingSession};
pub use encounter::summary::{
    FightOverview, StatsSummary, SummaryBuilder, SummaryOptions, format_fights, format_taunts,
    format_totals,
};
pub use encounter::{Fight, TimeRange, TimeSegment};
pub use game_data::{LandsOn, ReferenceError, ReferenceStore, SpellClass, SpellData};
pub use query::{DamageStatsBuilder, SpellCountData, StatsRequest, TauntStats};
pub use registry::EntityRegistry;
pub use signal_processor::{EventProcessor, GameSignal, SignalBus, SignalHandler};
pub use state::{FightTracker, SpellStreams};
