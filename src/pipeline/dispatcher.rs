// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chunk dispatcher (§4.5): the single I/O-bound thread that turns an
//! input byte stream into line-aligned `Chunk`s on the bounded chunk
//! queue, tracking carry-forward bytes and absolute line numbers across
//! chunk boundaries.

use std::io::Read;
use std::sync::Arc;

use flume::Sender;

use crate::context::IndexerContext;
use crate::error::Result;
use crate::pipeline::chunk::Chunk;

/// Read and split `input` into chunks of up to `chunk_size` bytes,
/// sending each onto `tx`. Runs to EOF or until `ctx.should_quit()`.
///
/// This is the only place bytes are read off `input`; everything
/// downstream operates on already-sliced, line-aligned buffers.
pub fn run(
    ctx: &Arc<IndexerContext>,
    mut input: impl Read,
    chunk_size: usize,
    tx: Sender<Chunk>,
) -> Result<()> {
    let mut carry_forward: Vec<u8> = Vec::new();
    let mut running_line_counter: u64 = 0;
    let mut next_offset: u64 = 0;
    let mut chunk_id: u64 = 0;
    let mut read_buf = vec![0u8; chunk_size];

    loop {
        if ctx.should_quit() {
            break;
        }

        let carry_forward_lines = count_newlines(&carry_forward);
        let mut scratch = std::mem::take(&mut carry_forward);

        let n = read_fill(&mut input, &mut read_buf)?;
        if n == 0 {
            // EOF. Whatever remains in `scratch` is the final chunk,
            // terminated or not (§4.5 step 6).
            if !scratch.is_empty() {
                let lines_in_chunk = count_newlines(&scratch);
                let start_offset = next_offset;
                next_offset += scratch.len() as u64;
                let chunk = Chunk {
                    id: chunk_id,
                    start_offset,
                    end_offset: next_offset,
                    start_line_number: running_line_counter,
                    carry_forward_lines,
                    buffer: scratch,
                };
                running_line_counter += lines_in_chunk - carry_forward_lines;
                if tx.send(chunk).is_err() {
                    break;
                }
            }
            break;
        }
        scratch.extend_from_slice(&read_buf[..n]);

        let split_at = match scratch.iter().rposition(|&b| b == b'\n') {
            Some(idx) => idx + 1,
            None => {
                // No newline anywhere yet (§4.5 "edge cases": a single
                // line longer than target_chunk_size). Keep accumulating
                // rather than starve workers on an artificially small
                // chunk boundary — but cap growth isn't specified, so we
                // emit what we have if it's already at least chunk_size.
                if scratch.len() >= chunk_size * 2 {
                    scratch.len()
                } else {
                    carry_forward = scratch;
                    continue;
                }
            }
        };

        let new_carry_forward = scratch.split_off(split_at);
        let buffer = scratch;
        let lines_in_chunk = count_newlines(&buffer);

        let start_offset = next_offset;
        next_offset = start_offset + buffer.len() as u64;
        let chunk = Chunk {
            id: chunk_id,
            start_offset,
            end_offset: next_offset,
            start_line_number: running_line_counter,
            carry_forward_lines,
            buffer,
        };
        chunk_id += 1;
        running_line_counter += lines_in_chunk - carry_forward_lines;
        carry_forward = new_carry_forward;

        if tx.send(chunk).is_err() {
            break;
        }
    }

    Ok(())
}

fn count_newlines(buf: &[u8]) -> u64 {
    buf.iter().filter(|&&b| b == b'\n').count() as u64
}

/// Fill `buf` as much as possible from `input`, short of EOF. Returns the
/// number of bytes read (0 at EOF).
fn read_fill(input: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match input.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(crate::error::Error::Read {
                    path: std::path::PathBuf::new(),
                    source: e,
                })
            }
        }
    }
    Ok(total)
}
