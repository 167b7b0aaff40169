// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pipeline orchestration (§2 "Data flow", §4.10 "Mode selection").
//!
//! Control flow: launch the dispatcher, then the worker pool, then the
//! writer; wait for the dispatcher to finish, then for workers to join,
//! then for the writer to join; only then is the dictionary handed to
//! the sorted output stage. A serial run (one worker, `max_threads = 1`)
//! reduces to the same code path, matching §4.10's claim that the two
//! modes are semantically identical.

pub mod chunk;
pub mod dispatcher;
pub mod progress;
pub mod worker;
pub mod writer;

use std::io::Read;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;

use crate::config::{Mode, QUEUE_CAPACITY};
use crate::context::IndexerContext;
use crate::error::Result;

/// Run one input to completion: dispatch chunks, fan out to `workers`
/// parallel worker threads, feed a single writer thread, then join
/// everything in the order §2 specifies. Returns once the dictionary for
/// this input is fully built.
pub fn run_to_completion(
    ctx: &Arc<IndexerContext>,
    input: impl Read + Send + 'static,
    mode: Mode,
) -> Result<()> {
    let workers = match mode {
        Mode::Parallel { workers } => workers,
        Mode::Serial => 1,
    };

    let (chunk_tx, chunk_rx) = flume::bounded(QUEUE_CAPACITY);
    let (insertion_tx, insertion_rx) = flume::bounded(QUEUE_CAPACITY);

    let progress_done = Arc::new(AtomicBool::new(false));
    let progress_ctx = ctx.clone();
    let progress_done_handle = progress_done.clone();
    let progress_handle =
        thread::spawn(move || progress::run(progress_ctx, progress_done_handle));

    let dispatcher_ctx = ctx.clone();
    let chunk_size = ctx.config.chunk_size;
    let dispatcher_handle =
        thread::spawn(move || dispatcher::run(&dispatcher_ctx, input, chunk_size, chunk_tx));

    let mut worker_handles = Vec::with_capacity(workers);
    for worker_id in 0..workers {
        let worker_ctx = ctx.clone();
        let worker_chunk_rx = chunk_rx.clone();
        let worker_insertion_tx = insertion_tx.clone();
        worker_handles.push(thread::spawn(move || {
            worker::run(worker_ctx, worker_id, worker_chunk_rx, worker_insertion_tx)
        }));
    }
    drop(chunk_rx);
    drop(insertion_tx);

    let writer_ctx = ctx.clone();
    let writer_handle = thread::spawn(move || writer::run(writer_ctx, workers, insertion_rx));

    // §2 control flow: dispatcher, then workers, then writer.
    let dispatch_result = dispatcher_handle
        .join()
        .expect("dispatcher thread panicked");
    for handle in worker_handles {
        handle.join().expect("worker thread panicked");
    }
    let writer_result = writer_handle.join().expect("writer thread panicked");

    progress_done.store(true, std::sync::atomic::Ordering::Relaxed);
    progress_handle.join().expect("progress thread panicked");
    progress::log_summary(ctx);

    dispatch_result?;
    writer_result?;
    Ok(())
}
