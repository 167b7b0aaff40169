// SPDX-License-Identifier: MIT OR Apache-2.0

//! The unit of work handed from the dispatcher to a worker (§3 "Chunk",
//! §4.5).

/// A contiguous byte range of the input file, plus enough bookkeeping for
/// a worker to assign correct absolute line numbers and to recover any
/// partial line the dispatcher had to carry forward across the chunk
/// boundary.
pub struct Chunk {
    pub id: u64,
    pub start_offset: u64,
    pub end_offset: u64,
    /// The absolute (0-based) line index of the first byte of `buffer`.
    pub start_line_number: u64,
    /// Count of '\n' occurrences inside the carry-forward bytes that were
    /// prepended to this chunk's buffer; those line boundaries were
    /// already counted against the previous chunk and must not re-advance
    /// the running line counter (§3 "Chunk").
    pub carry_forward_lines: u64,
    /// The complete, line-aligned bytes to process: carry-forward bytes
    /// from the previous chunk followed by this chunk's own read.
    pub buffer: Vec<u8>,
}

impl Chunk {
    pub fn byte_len(&self) -> u64 {
        self.end_offset - self.start_offset
    }
}
