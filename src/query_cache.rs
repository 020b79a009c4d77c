//! Keyed, timestamped read snapshots with write-driven invalidation.
//!
//! Every key keeps its last outcome plus a generation counter. Invalidation
//! marks the entry stale and bumps the generation; a fetch started under an
//! older generation is dropped on completion so the caller can re-issue it.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Utc};

/// What a reader sees for one key.
#[derive(Debug, PartialEq)]
pub enum QueryState<'a, T> {
    Loading,
    Error(&'a str),
    Success(&'a T),
}

#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub data: T,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Stored,
    /// The key was invalidated while the fetch was in flight.
    Superseded,
}

#[derive(Debug)]
struct Entry<T> {
    last: Option<Result<Snapshot<T>, String>>,
    stale: bool,
    generation: u64,
    in_flight: bool,
}

impl<T> Default for Entry<T> {
    fn default() -> Self {
        Self {
            last: None,
            stale: false,
            generation: 0,
            in_flight: false,
        }
    }
}

#[derive(Debug)]
pub struct QueryCache<K, T> {
    entries: HashMap<K, Entry<T>>,
}

impl<K: Eq + Hash + Clone, T> Default for QueryCache<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone, T> QueryCache<K, T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn state(&self, key: &K) -> QueryState<'_, T> {
        let Some(entry) = self.entries.get(key) else {
            return QueryState::Loading;
        };
        match &entry.last {
            None => QueryState::Loading,
            Some(Err(_)) if entry.in_flight => QueryState::Loading,
            Some(Err(reason)) => QueryState::Error(reason),
            Some(Ok(snapshot)) => QueryState::Success(&snapshot.data),
        }
    }

    pub fn snapshot(&self, key: &K) -> Option<&Snapshot<T>> {
        match self.entries.get(key)?.last.as_ref()? {
            Ok(snapshot) => Some(snapshot),
            Err(_) => None,
        }
    }

    /// True when the key has never been read or was invalidated, and no
    /// fetch for it is already running.
    pub fn needs_fetch(&self, key: &K) -> bool {
        match self.entries.get(key) {
            None => true,
            Some(entry) => !entry.in_flight && (entry.last.is_none() || entry.stale),
        }
    }

    pub fn is_fetching(&self, key: &K) -> bool {
        self.entries.get(key).is_some_and(|entry| entry.in_flight)
    }

    /// Marks a fetch as running and returns the generation it belongs to.
    pub fn begin_fetch(&mut self, key: K) -> u64 {
        let entry = self.entries.entry(key).or_default();
        entry.in_flight = true;
        entry.generation
    }

    pub fn complete_fetch(
        &mut self,
        key: &K,
        generation: u64,
        result: Result<T, String>,
    ) -> FetchOutcome {
        let entry = self.entries.entry(key.clone()).or_default();
        entry.in_flight = false;
        if generation != entry.generation {
            return FetchOutcome::Superseded;
        }
        entry.last = Some(result.map(|data| Snapshot {
            data,
            fetched_at: Utc::now(),
        }));
        entry.stale = false;
        FetchOutcome::Stored
    }

    pub fn invalidate(&mut self, key: &K) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.stale = true;
            entry.generation += 1;
        }
    }

    /// Invalidates every key of this query family.
    pub fn invalidate_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.stale = true;
            entry.generation += 1;
        }
    }
}
