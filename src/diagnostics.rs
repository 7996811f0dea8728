//! Per-run warnings and counters.
//!
//! A [`Diagnostics`] is created by the caller, shared with the candidate
//! builder and the routers of a run, and read back once the run completes.
//! Recoverable conditions tend to repeat (the same facility is served by
//! many routes), so each distinct warning is only logged on its first
//! occurrence. Later occurrences are counted.

use indexmap::IndexMap;
use log::warn;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// The counters tracked throughout a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Counter {
    /// Loop links fabricated for stops without a usable candidate.
    LoopLinks,
    /// Stop searches which admitted no link at all.
    EmptySearches,
    /// Manual candidates which could not be resolved.
    OverridesSkipped,
    /// Manual candidates kept despite exceeding the maximum distance.
    OverridesOverDistance,
    RouterBuilds,
    PathQueries,
    PathCacheHits,
    UnreachablePaths,
}

impl Counter {
    const COUNT: usize = 8;

    #[inline]
    const fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Mutex<IndexMap<String, usize>>,
    counters: [AtomicUsize; Counter::COUNT],
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning, logging it only if it has not been seen before.
    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        let mut warnings = self.warnings.lock().unwrap_or_else(PoisonError::into_inner);

        match warnings.get_mut(&message) {
            Some(seen) => *seen += 1,
            None => {
                warn!("{message}");
                warnings.insert(message, 1);
            }
        }
    }

    #[inline]
    pub fn increment(&self, counter: Counter) {
        self.counters[counter.slot()].fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn count(&self, counter: Counter) -> usize {
        self.counters[counter.slot()].load(Ordering::Relaxed)
    }

    /// The number of times a warning was recorded.
    pub fn occurrences(&self, message: &str) -> usize {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(message)
            .copied()
            .unwrap_or(0)
    }

    pub fn report(&self) -> DiagnosticsReport {
        let warnings = self
            .warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(message, count)| (message.clone(), *count))
            .collect();

        DiagnosticsReport {
            warnings,
            loop_links: self.count(Counter::LoopLinks),
            empty_searches: self.count(Counter::EmptySearches),
            overrides_skipped: self.count(Counter::OverridesSkipped),
            overrides_over_distance: self.count(Counter::OverridesOverDistance),
            router_builds: self.count(Counter::RouterBuilds),
            path_queries: self.count(Counter::PathQueries),
            path_cache_hits: self.count(Counter::PathCacheHits),
            unreachable_paths: self.count(Counter::UnreachablePaths),
        }
    }
}

/// A snapshot of a [`Diagnostics`], with warnings in order of first occurrence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticsReport {
    pub warnings: Vec<(String, usize)>,

    pub loop_links: usize,
    pub empty_searches: usize,
    pub overrides_skipped: usize,
    pub overrides_over_distance: usize,

    pub router_builds: usize,
    pub path_queries: usize,
    pub path_cache_hits: usize,
    pub unreachable_paths: usize,
}
