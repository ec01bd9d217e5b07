use std::sync::Arc;
use std::sync::mpsc::Receiver;

use eqlog_types::{AppConfig, OverlayStats};

use super::config::AppConfigExt;
use crate::combat_log::CombatEvent;
use crate::encounter::summary::FightOverview;
use crate::encounter::{TimeRange, TimeSegment};
use crate::game_data::{ReferenceError, ReferenceStore};
use crate::query::{DamageStatsBuilder, SpellCountData, StatsRequest, TauntStats, spell_counts, taunt_stats};
use crate::registry::EntityRegistry;
use crate::signal_processor::{EventProcessor, GameSignal, SignalBus, SignalHandler};
use crate::state::{FightPurger, FightTracker, PlayerDeath, SpellStreams};

/// A live parsing session wiring every store to one event processor.
///
/// All methods take `&self`: producers may feed events from several threads
/// while a consumer queries stats, since each store guards its own state.
#[derive(Debug)]
pub struct ParsingSession {
    reference: Arc<ReferenceStore>,
    bus: Arc<SignalBus>,
    registry: Arc<EntityRegistry>,
    streams: Arc<SpellStreams>,
    fights: Arc<FightTracker>,
    processor: EventProcessor,
    stats: DamageStatsBuilder,
}

impl ParsingSession {
    /// Load reference data from the configured directory and start a session.
    /// Missing reference files are fatal.
    pub fn new(config: &AppConfig) -> Result<Self, ReferenceError> {
        let reference = ReferenceStore::load(config.reference_dir())?;
        Ok(Self::from_reference(config, Arc::new(reference)))
    }

    pub fn from_reference(config: &AppConfig, reference: Arc<ReferenceStore>) -> Self {
        let fight_timeout = config.fight_timeout_secs as f64;
        let bus = Arc::new(SignalBus::new());
        let registry = Arc::new(EntityRegistry::new(Arc::clone(&reference), Arc::clone(&bus)));
        let streams = Arc::new(SpellStreams::new());
        let fights = Arc::new(FightTracker::new());

        // Names proven to be players must not keep a fight open
        bus.subscribe(Box::new(FightPurger::new(Arc::clone(&fights))));
        if !config.player_name.is_empty() {
            registry.set_player_name(&config.player_name);
        }

        let processor = EventProcessor::new(
            Arc::clone(&reference),
            Arc::clone(&registry),
            Arc::clone(&streams),
            Arc::clone(&fights),
            fight_timeout,
        );
        let stats = DamageStatsBuilder::new(Arc::clone(&fights), Arc::clone(&registry), fight_timeout);

        Self {
            reference,
            bus,
            registry,
            streams,
            fights,
            processor,
            stats,
        }
    }

    // --- Ingestion ---

    pub fn process_event(&self, event: CombatEvent) {
        self.processor.process_event(event);
    }

    pub fn process_events(&self, events: Vec<CombatEvent>) {
        for event in events {
            self.processor.process_event(event);
        }
    }

    // --- Queries ---

    /// Stats as of the latest event timestamp. `None` before any event or
    /// when nothing is fresh.
    pub fn compute_stats(&self, request: &StatsRequest) -> Option<OverlayStats> {
        let now = self.processor.last_timestamp()?;
        self.stats.build_at(request, now)
    }

    pub fn compute_stats_at(&self, request: &StatsRequest, now: f64) -> Option<OverlayStats> {
        self.stats.build_at(request, now)
    }

    /// Spell counts over the spans of the current fights, or over the whole
    /// stream when no fight is left. Defaults to every verified player.
    pub fn spell_counts(&self, players: Option<Vec<String>>) -> SpellCountData {
        let players = players.unwrap_or_else(|| self.registry.verified_players());
        let mut range = TimeRange::new();
        for fight in self.fights.snapshot() {
            range.add(TimeSegment::new(fight.begin_time, fight.last_time));
        }
        if range.is_empty() {
            range = self.stream_span();
        }
        spell_counts(&self.streams, &players, &range)
    }

    fn stream_span(&self) -> TimeRange {
        let casts = self.streams.snapshot_casts();
        let received = self.streams.snapshot_received();
        let begin = [casts.first().map(|c| c.timestamp), received.first().map(|r| r.timestamp)]
            .into_iter()
            .flatten()
            .reduce(f64::min);
        let end = [casts.last().map(|c| c.timestamp), received.last().map(|r| r.timestamp)]
            .into_iter()
            .flatten()
            .reduce(f64::max);
        match (begin, end) {
            (Some(begin), Some(end)) => TimeRange::from_segment(TimeSegment::new(begin, end)),
            _ => TimeRange::new(),
        }
    }

    pub fn taunt_stats(&self) -> Vec<TauntStats> {
        taunt_stats(&self.fights.snapshot())
    }

    /// Every tracked fight, oldest first, with the players who died during it
    pub fn fight_overview(&self) -> Vec<FightOverview> {
        self.fights
            .snapshot()
            .into_iter()
            .map(|fight| {
                let deaths = self
                    .streams
                    .deaths_during(fight.begin_time, fight.last_time)
                    .iter()
                    .map(|death| death.player.clone())
                    .collect();
                FightOverview {
                    began_at: fight.began_at(),
                    seconds: fight.duration_seconds(),
                    damage_total: fight.damage_total,
                    dead: fight.dead,
                    name: fight.name,
                    deaths,
                }
            })
            .collect()
    }

    pub fn deaths(&self) -> Vec<Arc<PlayerDeath>> {
        self.streams.snapshot_deaths()
    }

    pub fn verified_players(&self) -> Vec<String> {
        self.registry.verified_players()
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.processor.last_timestamp()
    }

    pub fn reference(&self) -> &ReferenceStore {
        &self.reference
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn fight_count(&self) -> usize {
        self.fights.len()
    }

    // --- Signals ---

    /// Receive every signal emitted after this call
    pub fn signals(&self) -> Receiver<GameSignal> {
        self.bus.channel()
    }

    pub fn add_signal_handler(&self, handler: Box<dyn SignalHandler + Send>) {
        self.bus.subscribe(handler);
    }

    // --- Lifecycle ---

    pub fn set_player_name(&self, name: &str) {
        self.registry.set_player_name(name);
    }

    /// Drop all fights, streams and NPC tracking. Verified players, pets and
    /// inferred classes survive.
    pub fn clear(&self) {
        self.fights.reset();
        self.streams.clear();
        self.stats.reset();
        self.processor.reset_clock();
        self.registry.clear_active();
        tracing::info!("Active data cleared");
    }
}
