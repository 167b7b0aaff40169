// SPDX-License-Identifier: MIT OR Apache-2.0

//! Progress monitor (§4.9): a periodic thread that snapshots and resets
//! the global line counter for human-readable reporting. Workers never
//! call `now()` on the hot path; only this thread does, once per
//! interval.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use human_repr::HumanCount;

use crate::context::IndexerContext;

/// Blocks the calling thread, waking every `ctx.config.progress_interval_secs`
/// to read-and-clear `ctx.lines_since_snapshot` and log a throughput line.
/// Exits promptly once `ctx.should_quit()` (SIGINT/SIGTERM) or `done` (this
/// file's pipeline has joined) is observed. `done` is local to one file's
/// run, unlike `ctx.quit`, which is shared across every file in the
/// process.
pub fn run(ctx: Arc<IndexerContext>, done: Arc<std::sync::atomic::AtomicBool>) {
    let interval = Duration::from_secs(ctx.config.progress_interval_secs.max(1));
    let mut last_tick = Instant::now();

    loop {
        std::thread::sleep(Duration::from_millis(200));
        if ctx.should_quit() || done.load(Ordering::Relaxed) {
            break;
        }
        if last_tick.elapsed() < interval {
            continue;
        }
        last_tick = Instant::now();
        let lines = ctx.lines_since_snapshot.swap(0, Ordering::Relaxed);
        let rate = lines as f64 / interval.as_secs_f64();
        tracing::info!(
            "processed {} lines ({}/min)",
            lines,
            (rate * 60.0) as u64
        );
    }
}

/// One-shot summary line printed after the pipeline joins, reporting
/// totals the periodic monitor's reset-on-read counter can't provide.
pub fn log_summary(ctx: &IndexerContext) {
    let total = ctx.total_lines.load(Ordering::Relaxed);
    let dropped = ctx.dropped_locations.load(Ordering::Relaxed);
    let distinct = ctx.dictionary.len();
    tracing::info!(
        "finished: {} lines, {} distinct addresses, {} locations dropped",
        total.human_count(""),
        distinct,
        dropped,
    );
}
