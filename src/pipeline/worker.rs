// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker (§4.6): parses lines out of a chunk, looks each address up in
//! the shared dictionary, and either appends to its own per-thread
//! location array or batches an `InsertionRequest` for the writer.

use std::sync::Arc;

use flume::{Receiver, Sender};

use crate::config::INSERTION_BATCH_SIZE;
use crate::context::IndexerContext;
use crate::location_array::Location;
use crate::pipeline::chunk::Chunk;

/// One buffered new-address observation, forwarded to the writer when the
/// worker's local lookup misses the dictionary (§3 "InsertionRequest").
pub struct InsertionRequest {
    pub address: Arc<str>,
    pub location: Location,
    pub worker_id: usize,
}

/// Runs one worker's chunk-consumption loop until `chunk_rx` disconnects
/// (the dispatcher has finished and every chunk has been drained) or
/// `ctx.should_quit()`.
pub fn run(
    ctx: Arc<IndexerContext>,
    worker_id: usize,
    chunk_rx: Receiver<Chunk>,
    insertion_tx: Sender<InsertionRequest>,
) {
    let mut batch: Vec<InsertionRequest> = Vec::with_capacity(INSERTION_BATCH_SIZE);

    for chunk in chunk_rx.iter() {
        if ctx.should_quit() {
            break;
        }
        process_chunk(&ctx, worker_id, &chunk, &insertion_tx, &mut batch);
    }

    flush_batch(&insertion_tx, &mut batch);
}

fn process_chunk(
    ctx: &Arc<IndexerContext>,
    worker_id: usize,
    chunk: &Chunk,
    insertion_tx: &Sender<InsertionRequest>,
    batch: &mut Vec<InsertionRequest>,
) {
    let mut worker_lines_processed: u64 = 0;
    let greedy = ctx.config.greedy;

    // `split` yields a trailing empty slice whenever the buffer ends in
    // '\n'; that artifact is not a line and must not be counted. A final
    // chunk that doesn't end in '\n' (§3 "Chunk" invariant) has no such
    // artifact and its last slice is a real, unterminated line.
    let ends_with_newline = chunk.buffer.last() == Some(&b'\n');
    let mut lines = chunk.buffer.split(|&b| b == b'\n').peekable();

    while let Some(raw_line) = lines.next() {
        if ends_with_newline && lines.peek().is_none() {
            break;
        }
        let Ok(line) = std::str::from_utf8(raw_line) else {
            worker_lines_processed += 1;
            ctx.record_lines(1);
            continue;
        };

        let absolute_line =
            chunk.start_line_number + chunk.carry_forward_lines + worker_lines_processed;

        for field in crate::tokenizer::tokenize(line, greedy) {
            let location = Location::new(absolute_line, field.field_index);
            if let Some(data) = ctx.dictionary.lookup(&field.canonical) {
                if !data.append_location(worker_id, location) {
                    ctx.record_dropped_location();
                    tracing::warn!(
                        address = %field.canonical,
                        "location array capacity ceiling reached; dropping location"
                    );
                }
            } else {
                batch.push(InsertionRequest {
                    address: Arc::from(field.canonical.as_str()),
                    location,
                    worker_id,
                });
                if batch.len() >= INSERTION_BATCH_SIZE {
                    flush_batch(insertion_tx, batch);
                }
            }
        }

        worker_lines_processed += 1;
        ctx.record_lines(1);
    }

    flush_batch(insertion_tx, batch);
}

fn flush_batch(tx: &Sender<InsertionRequest>, batch: &mut Vec<InsertionRequest>) {
    for req in batch.drain(..) {
        if tx.send(req).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexerConfig;

    #[test]
    fn processes_chunk_and_populates_dictionary() {
        let ctx = IndexerContext::new(IndexerConfig::default());
        let (chunk_tx, chunk_rx) = flume::unbounded();
        let (insertion_tx, insertion_rx) = flume::unbounded();

        chunk_tx
            .send(Chunk {
                id: 0,
                start_offset: 0,
                end_offset: 12,
                start_line_number: 0,
                carry_forward_lines: 0,
                buffer: b"a 10.0.0.1 b\n".to_vec(),
            })
            .unwrap();
        drop(chunk_tx);

        run(ctx.clone(), 0, chunk_rx, insertion_tx);
        drop(insertion_rx.clone());

        let requests: Vec<_> = insertion_rx.try_iter().collect();
        assert_eq!(requests.len(), 1);
        assert_eq!(&*requests[0].address, "10.0.0.1");
        assert_eq!(requests[0].location.line, 0);
        assert_eq!(requests[0].location.field, 2);
    }

    #[test]
    fn repeated_address_in_same_chunk_after_dictionary_seed_appends_locally() {
        let ctx = IndexerContext::new(IndexerConfig::default());
        let addr: Arc<str> = Arc::from("10.0.0.1");
        ctx.dictionary
            .insert_or_update(&addr, 0, 1, Location::new(0, 2))
            .unwrap();

        let (chunk_tx, chunk_rx) = flume::unbounded();
        let (insertion_tx, insertion_rx) = flume::unbounded();
        chunk_tx
            .send(Chunk {
                id: 0,
                start_offset: 0,
                end_offset: 12,
                start_line_number: 1,
                carry_forward_lines: 0,
                buffer: b"c 10.0.0.1 d\n".to_vec(),
            })
            .unwrap();
        drop(chunk_tx);

        run(ctx.clone(), 0, chunk_rx, insertion_tx);
        assert!(insertion_rx.try_iter().next().is_none());

        let data = ctx.dictionary.lookup("10.0.0.1").unwrap();
        assert_eq!(data.total_count(), 2);
    }
}
