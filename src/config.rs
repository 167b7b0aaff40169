// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run configuration and mode selection (§4.10, §5, §6).

use crate::dictionary::DEFAULT_MAX_ENTRIES;

/// Default target chunk size for the dispatcher (§4.5): 128 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 128 * 1024 * 1024;

/// Dispatcher will never read a chunk smaller than this (§4.5).
pub const MIN_CHUNK_SIZE: usize = 1024 * 1024;

/// Threshold above which the parallel pipeline is preferred over the
/// serial fallback (§4.10).
pub const PARALLEL_SIZE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Depth of the bounded chunk/insertion queues (§3 "ChunkQueue").
pub const QUEUE_CAPACITY: usize = 16;

/// Workers flush buffered `InsertionRequest`s after this many new
/// addresses, to minimize the duplicate-race window (§4.6 step 3).
pub const INSERTION_BATCH_SIZE: usize = 5;

/// How often the progress monitor snapshots and resets the line counter
/// (§4.9): 60 seconds of wall clock by default.
pub const PROGRESS_INTERVAL_SECS: u64 = 60;

/// Tunable knobs for one indexing run, derived from CLI flags (§6).
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub chunk_size: usize,
    pub force_serial: bool,
    pub greedy: bool,
    pub max_entries: usize,
    pub progress_interval_secs: u64,
    pub debug_level: i32,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            force_serial: false,
            greedy: false,
            max_entries: DEFAULT_MAX_ENTRIES,
            progress_interval_secs: PROGRESS_INTERVAL_SECS,
            debug_level: 0,
        }
    }
}

/// Whether a given input should run through the parallel pipeline or the
/// degenerate serial path, per §4.10.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Parallel { workers: usize },
    Serial,
}

impl IndexerConfig {
    /// §4.10 "Mode selection": seekable + large + multi-core + not forced
    /// serial ⇒ parallel with `workers = max(2, min(8, cores/2))`.
    /// Compressed inputs and stdin are always serial (§6), reflected by
    /// the caller passing `seekable = false` for those.
    pub fn select_mode(&self, seekable: bool, input_len: Option<u64>) -> Mode {
        if self.force_serial || !seekable {
            return Mode::Serial;
        }
        let cores = num_cpus::get();
        let big_enough = input_len.map(|len| len > PARALLEL_SIZE_THRESHOLD).unwrap_or(false);
        if big_enough && cores > 1 {
            let workers = (cores / 2).clamp(2, 8);
            Mode::Parallel { workers }
        } else {
            Mode::Serial
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_file_runs_serial() {
        let cfg = IndexerConfig::default();
        assert_eq!(cfg.select_mode(true, Some(1024)), Mode::Serial);
    }

    #[test]
    fn forced_serial_overrides_everything() {
        let mut cfg = IndexerConfig::default();
        cfg.force_serial = true;
        assert_eq!(
            cfg.select_mode(true, Some(10 * 1024 * 1024 * 1024)),
            Mode::Serial
        );
    }

    #[test]
    fn unseekable_input_is_always_serial() {
        let cfg = IndexerConfig::default();
        assert_eq!(
            cfg.select_mode(false, Some(10 * 1024 * 1024 * 1024)),
            Mode::Serial
        );
    }
}
