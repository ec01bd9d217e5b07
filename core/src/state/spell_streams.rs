//! Ordered cast, received-spell and death streams
//!
//! Each stream has its own lock so appends to one never wait on another.
//! Records are shared as `Arc`s and snapshots copy the pointers only.

use hashbrown::HashSet;
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use super::lru::LruCache;
use crate::game_data::SpellData;

pub const AMBIGUITY_CACHE_CAPACITY: usize = 2000;
pub const AMBIGUITY_CACHE_TRIM: usize = 500;

/// Anything stored in a time-ordered stream
pub trait Timestamped {
    fn timestamp(&self) -> f64;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpellCast {
    pub timestamp: f64,
    pub caster: String,
    /// Full spell name as cast
    pub spell: String,
    pub spell_abbrv: String,
    pub spell_data: Option<Arc<SpellData>>,
    pub interrupted: bool,
}

/// A spell that landed on someone. An ambiguous landing keeps its candidates
/// and gets its spell attached at most once.
#[derive(Debug)]
pub struct ReceivedSpell {
    pub timestamp: f64,
    pub receiver: String,
    pub wear_off: bool,
    pub candidates: Vec<Arc<SpellData>>,
    /// Landed text used as the disambiguation key
    pub phrase: String,
    resolved: OnceLock<Arc<SpellData>>,
}

impl ReceivedSpell {
    pub fn new(
        timestamp: f64,
        receiver: &str,
        phrase: &str,
        candidates: Vec<Arc<SpellData>>,
        wear_off: bool,
    ) -> Self {
        let resolved = OnceLock::new();
        let candidates = if candidates.len() == 1 {
            let _ = resolved.set(Arc::clone(&candidates[0]));
            Vec::new()
        } else {
            candidates
        };

        Self {
            timestamp,
            receiver: receiver.to_string(),
            wear_off,
            candidates,
            phrase: phrase.to_string(),
            resolved,
        }
    }

    pub fn spell(&self) -> Option<&Arc<SpellData>> {
        self.resolved.get()
    }

    pub fn is_ambiguous(&self) -> bool {
        self.resolved.get().is_none() && self.candidates.len() > 1
    }

    /// Attach the resolved spell. Later calls leave the first resolution in place.
    pub fn resolve(&self, spell: Arc<SpellData>) -> &Arc<SpellData> {
        self.resolved.get_or_init(|| spell)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerDeath {
    pub timestamp: f64,
    pub player: String,
    pub killer: Option<String>,
}

impl Timestamped for SpellCast {
    fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

impl Timestamped for ReceivedSpell {
    fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

impl Timestamped for PlayerDeath {
    fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

/// Append keeping timestamp order. In-order appends are a push.
fn insert_ordered<T: Timestamped>(stream: &RwLock<Vec<Arc<T>>>, item: Arc<T>) {
    if let Ok(mut items) = stream.write() {
        let at = items.partition_point(|e| e.timestamp() <= item.timestamp());
        if at == items.len() {
            items.push(item);
        } else {
            items.insert(at, item);
        }
    }
}

fn snapshot<T>(stream: &RwLock<Vec<Arc<T>>>) -> Vec<Arc<T>> {
    stream.read().map(|items| items.clone()).unwrap_or_default()
}

fn during<T: Timestamped>(stream: &RwLock<Vec<Arc<T>>>, begin: f64, end: f64) -> Vec<Arc<T>> {
    stream
        .read()
        .map(|items| {
            let start = items.partition_point(|e| e.timestamp() < begin);
            let stop = items.partition_point(|e| e.timestamp() <= end);
            items[start..stop.max(start)].to_vec()
        })
        .unwrap_or_default()
}

#[derive(Debug)]
pub struct SpellStreams {
    casts: RwLock<Vec<Arc<SpellCast>>>,
    received: RwLock<Vec<Arc<ReceivedSpell>>>,
    deaths: RwLock<Vec<Arc<PlayerDeath>>>,
    cast_abbrvs: RwLock<HashSet<String>>,
    ambiguity_cache: Mutex<LruCache<String, Option<Arc<SpellData>>>>,
}

impl Default for SpellStreams {
    fn default() -> Self {
        Self::new()
    }
}

impl SpellStreams {
    pub fn new() -> Self {
        Self {
            casts: RwLock::new(Vec::new()),
            received: RwLock::new(Vec::new()),
            deaths: RwLock::new(Vec::new()),
            cast_abbrvs: RwLock::new(HashSet::new()),
            ambiguity_cache: Mutex::new(LruCache::new(AMBIGUITY_CACHE_CAPACITY, AMBIGUITY_CACHE_TRIM)),
        }
    }

    // --- Appends ---

    pub fn append_cast(&self, cast: SpellCast) {
        if let Ok(mut abbrvs) = self.cast_abbrvs.write()
            && !abbrvs.contains(&cast.spell_abbrv)
        {
            abbrvs.insert(cast.spell_abbrv.clone());
        }
        insert_ordered(&self.casts, Arc::new(cast));
    }

    pub fn append_received(&self, received: ReceivedSpell) -> Arc<ReceivedSpell> {
        let received = Arc::new(received);
        insert_ordered(&self.received, Arc::clone(&received));
        received
    }

    pub fn append_death(&self, death: PlayerDeath) {
        insert_ordered(&self.deaths, Arc::new(death));
    }

    // --- Snapshots ---

    pub fn snapshot_casts(&self) -> Vec<Arc<SpellCast>> {
        snapshot(&self.casts)
    }

    pub fn snapshot_received(&self) -> Vec<Arc<ReceivedSpell>> {
        snapshot(&self.received)
    }

    pub fn snapshot_deaths(&self) -> Vec<Arc<PlayerDeath>> {
        snapshot(&self.deaths)
    }

    /// Casts with `begin <= timestamp <= end`
    pub fn casts_during(&self, begin: f64, end: f64) -> Vec<Arc<SpellCast>> {
        during(&self.casts, begin, end)
    }

    pub fn received_during(&self, begin: f64, end: f64) -> Vec<Arc<ReceivedSpell>> {
        during(&self.received, begin, end)
    }

    pub fn deaths_during(&self, begin: f64, end: f64) -> Vec<Arc<PlayerDeath>> {
        during(&self.deaths, begin, end)
    }

    // --- Ambiguity ---

    /// Pick one spell among candidates sharing a landed phrase.
    ///
    /// Prefers a candidate that has actually been cast. When nothing was cast
    /// but every candidate has the same abbreviation, the last one wins. The
    /// outcome, including no match, is cached under `cache_key`.
    pub fn resolve_ambiguous_spell(
        &self,
        candidates: &[Arc<SpellData>],
        cache_key: &str,
    ) -> Option<Arc<SpellData>> {
        match candidates {
            [] => return None,
            [only] => return Some(Arc::clone(only)),
            _ => {}
        }

        let key = cache_key.to_string();
        if let Ok(mut cache) = self.ambiguity_cache.lock()
            && let Some(cached) = cache.get(&key)
        {
            return cached;
        }

        let resolved = self.pick_candidate(candidates);
        if let Ok(mut cache) = self.ambiguity_cache.lock() {
            cache.insert(key, resolved.clone());
        }
        resolved
    }

    fn pick_candidate(&self, candidates: &[Arc<SpellData>]) -> Option<Arc<SpellData>> {
        if let Ok(abbrvs) = self.cast_abbrvs.read()
            && let Some(seen) = candidates.iter().find(|c| abbrvs.contains(&c.abbrv))
        {
            return Some(Arc::clone(seen));
        }

        let first = &candidates[0].abbrv;
        if candidates.iter().all(|c| &c.abbrv == first) {
            return candidates.last().cloned();
        }
        None
    }

    /// Resolve a received spell once, attaching the result to the record
    pub fn resolve_received(&self, received: &ReceivedSpell) -> Option<Arc<SpellData>> {
        if let Some(spell) = received.spell() {
            return Some(Arc::clone(spell));
        }
        let spell = self.resolve_ambiguous_spell(&received.candidates, &received.phrase)?;
        Some(Arc::clone(received.resolve(spell)))
    }

    pub fn ambiguity_cache_hits(&self) -> u64 {
        self.ambiguity_cache.lock().map(|c| c.hits()).unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Ok(mut casts) = self.casts.write() {
            casts.clear();
        }
        if let Ok(mut received) = self.received.write() {
            received.clear();
        }
        if let Ok(mut deaths) = self.deaths.write() {
            deaths.clear();
        }
        if let Ok(mut abbrvs) = self.cast_abbrvs.write() {
            abbrvs.clear();
        }
        if let Ok(mut cache) = self.ambiguity_cache.lock() {
            cache.clear();
        }
    }
}
