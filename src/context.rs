// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared run state (§3, §9 "Design notes"): rather than bare global
//! statics, every piece of state a worker or the writer touches lives in
//! one `IndexerContext`, constructed once per run and handed to every
//! thread as an `Arc`. Grounded in `tools/gc-test/src/main.rs`'s pattern
//! of building one shared context struct and cloning `Arc`s of it into
//! each spawned thread.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::IndexerConfig;
use crate::dictionary::AddressDictionary;

/// State shared by every thread in one indexing run.
///
/// One `IndexerContext` is built per input file (the dictionary is
/// destroyed after that file's sorted output is flushed, per §3
/// "Lifecycle summary"), but `quit` is a handle shared across every file
/// in the process: SIGINT/SIGTERM must stop the file currently in flight
/// and every file still queued behind it, not just the one active when
/// the signal arrived.
pub struct IndexerContext {
    pub config: IndexerConfig,
    pub dictionary: AddressDictionary,
    /// Set by the signal handler (§6 SIGINT/SIGTERM); every loop checks
    /// this between units of work. Shared across all per-file contexts
    /// in one process run.
    pub quit: Arc<AtomicBool>,
    /// Lines processed since the last progress snapshot (§4.9). Reset by
    /// the progress thread, never read for anything but diagnostics.
    pub lines_since_snapshot: AtomicU64,
    /// Total lines processed, maintained independently of the snapshot
    /// counter so a final summary is always accurate regardless of timing.
    pub total_lines: AtomicU64,
    /// Count of locations dropped because a `LocationArray` hit its hard
    /// capacity ceiling (§4.3, §7) — surfaced in the final summary.
    pub dropped_locations: AtomicU64,
}

impl IndexerContext {
    /// Build a context with its own, unshared quit flag — convenient for
    /// tests and single-file callers that don't need cross-file signal
    /// propagation.
    pub fn new(config: IndexerConfig) -> Arc<Self> {
        Self::with_quit_flag(config, Arc::new(AtomicBool::new(false)))
    }

    /// Build a context whose `quit` flag is shared with other contexts,
    /// e.g. one per input file in a multi-file CLI run (§6).
    pub fn with_quit_flag(config: IndexerConfig, quit: Arc<AtomicBool>) -> Arc<Self> {
        let max_entries = config.max_entries;
        Arc::new(Self {
            config,
            dictionary: AddressDictionary::new(max_entries),
            quit,
            lines_since_snapshot: AtomicU64::new(0),
            total_lines: AtomicU64::new(0),
            dropped_locations: AtomicU64::new(0),
        })
    }

    pub fn should_quit(&self) -> bool {
        self.quit.load(Ordering::Relaxed)
    }

    pub fn record_lines(&self, n: u64) {
        self.lines_since_snapshot.fetch_add(n, Ordering::Relaxed);
        self.total_lines.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_dropped_location(&self) {
        self.dropped_locations.fetch_add(1, Ordering::Relaxed);
    }
}
