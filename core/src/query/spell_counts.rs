//! Spell cast and received counts per player inside fight windows
//!
//! Casts are counted from `BUFF_OFFSET` seconds before each fight segment so
//! pre-fight buffs are included, and up to `HALF_OFFSET` seconds after it.

use hashbrown::{HashMap, HashSet};
use rayon::prelude::*;
use std::sync::Arc;

use crate::encounter::{TimeRange, TimeSegment};
use crate::game_data::SpellData;
use crate::state::{ReceivedSpell, SpellCast, SpellStreams};

pub const BUFF_OFFSET: f64 = 30.0;
pub const HALF_OFFSET: f64 = 15.0;

type Counts = HashMap<String, HashMap<String, u32>>;

#[derive(Debug, Clone, Default)]
pub struct SpellCountData {
    /// player -> spell id -> completed casts
    pub player_cast_counts: Counts,
    /// player -> spell abbreviation -> interrupted casts
    pub player_interrupted_counts: Counts,
    /// player -> spell id -> times landed on the player
    pub player_received_counts: Counts,
    /// spell id -> highest cast count of any player
    pub max_cast_counts: HashMap<String, u32>,
    /// spell id -> highest received count of any player
    pub max_received_counts: HashMap<String, u32>,
    pub unique_spells: HashMap<String, Arc<SpellData>>,
}

fn bump(counts: &mut Counts, player: &str, key: &str, by: u32) {
    *counts
        .entry(player.to_string())
        .or_default()
        .entry(key.to_string())
        .or_insert(0) += by;
}

fn merge_counts(into: &mut Counts, from: Counts) {
    for (player, spells) in from {
        for (key, count) in spells {
            bump(into, &player, &key, count);
        }
    }
}

fn max_counts(counts: &Counts) -> HashMap<String, u32> {
    let mut max: HashMap<String, u32> = HashMap::new();
    for spells in counts.values() {
        for (id, count) in spells {
            let entry = max.entry(id.clone()).or_insert(0);
            *entry = (*entry).max(*count);
        }
    }
    max
}

impl SpellCountData {
    fn add_cast(&mut self, cast: &SpellCast) {
        if cast.interrupted {
            bump(&mut self.player_interrupted_counts, &cast.caster, &cast.spell_abbrv, 1);
        } else if let Some(spell) = &cast.spell_data {
            bump(&mut self.player_cast_counts, &cast.caster, &spell.id, 1);
            self.unique_spells
                .entry(spell.id.clone())
                .or_insert_with(|| Arc::clone(spell));
        }
    }

    fn add_received(&mut self, receiver: &str, spell: &Arc<SpellData>) {
        bump(&mut self.player_received_counts, receiver, &spell.id, 1);
        self.unique_spells
            .entry(spell.id.clone())
            .or_insert_with(|| Arc::clone(spell));
    }

    fn merge(mut self, other: SpellCountData) -> SpellCountData {
        merge_counts(&mut self.player_cast_counts, other.player_cast_counts);
        merge_counts(&mut self.player_interrupted_counts, other.player_interrupted_counts);
        merge_counts(&mut self.player_received_counts, other.player_received_counts);
        for (id, spell) in other.unique_spells {
            self.unique_spells.entry(id).or_insert(spell);
        }
        self
    }

    /// Players with at least one cast, interrupt or received spell, sorted
    pub fn unique_players(&self) -> Vec<String> {
        let mut players: Vec<String> = self
            .player_cast_counts
            .keys()
            .chain(self.player_interrupted_counts.keys())
            .chain(self.player_received_counts.keys())
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        players.sort();
        players
    }

    pub fn cast_count(&self, player: &str, spell_id: &str) -> u32 {
        self.player_cast_counts
            .get(player)
            .and_then(|spells| spells.get(spell_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn received_count(&self, player: &str, spell_id: &str) -> u32 {
        self.player_received_counts
            .get(player)
            .and_then(|spells| spells.get(spell_id))
            .copied()
            .unwrap_or(0)
    }
}

/// Widen every fight segment into the window casts are collected from
fn cast_windows(range: &TimeRange) -> TimeRange {
    let mut windows = TimeRange::new();
    for segment in range.segments() {
        windows.add(TimeSegment::new(segment.begin - BUFF_OFFSET, segment.end + HALF_OFFSET));
    }
    windows
}

/// Count casts by and spells received by `players` during `range`
pub fn spell_counts(streams: &SpellStreams, players: &[String], range: &TimeRange) -> SpellCountData {
    if range.is_empty() || players.is_empty() {
        return SpellCountData::default();
    }

    let wanted: HashSet<&str> = players.iter().map(String::as_str).collect();
    let mut casts: Vec<Arc<SpellCast>> = Vec::new();
    let mut received: Vec<Arc<ReceivedSpell>> = Vec::new();
    for window in cast_windows(range).segments() {
        casts.extend(
            streams
                .casts_during(window.begin, window.end)
                .into_iter()
                .filter(|c| wanted.contains(c.caster.as_str())),
        );
    }
    for segment in range.segments() {
        received.extend(
            streams
                .received_during(segment.begin, segment.end)
                .into_iter()
                .filter(|r| !r.wear_off && wanted.contains(r.receiver.as_str())),
        );
    }

    let from_casts = casts
        .par_iter()
        .fold(SpellCountData::default, |mut data, cast| {
            data.add_cast(cast);
            data
        })
        .reduce(SpellCountData::default, SpellCountData::merge);

    let from_received = received
        .par_iter()
        .fold(SpellCountData::default, |mut data, landed| {
            // Unresolved landings stay in the stream but are not counted
            if let Some(spell) = streams.resolve_received(landed) {
                data.add_received(&landed.receiver, &spell);
            }
            data
        })
        .reduce(SpellCountData::default, SpellCountData::merge);

    let mut data = from_casts.merge(from_received);
    data.max_cast_counts = max_counts(&data.player_cast_counts);
    data.max_received_counts = max_counts(&data.player_received_counts);
    tracing::debug!(
        casts = casts.len(),
        received = received.len(),
        spells = data.unique_spells.len(),
        "Counted spells"
    );
    data
}
