// SPDX-License-Identifier: MIT OR Apache-2.0

//! A high-throughput log indexer: extracts IPv4, IPv6, and MAC-48
//! addresses from tokenized log lines and emits a deterministic,
//! frequency-sorted inverted index mapping each address to every
//! `(line, field)` location it occurred at.
//!
//! The engine is split leaf-first: [`address`] classifies and
//! canonicalizes tokens, [`tokenizer`] turns a raw line into tagged
//! fields, [`location_array`] and [`hash_table`]/[`dictionary`] hold the
//! concurrent address index, and [`pipeline`] wires a dispatcher/worker
//! pool/writer around it. [`output`] sorts and flattens the finished
//! dictionary; [`config`], [`context`], [`input`], and [`error`] are the
//! ambient plumbing that ties a single `run` call together.

pub mod address;
pub mod config;
pub mod context;
pub mod dictionary;
pub mod error;
pub mod hash_table;
pub mod input;
pub mod location_array;
pub mod output;
pub mod pipeline;
pub mod tokenizer;

pub use address::AddressKind;
pub use config::{IndexerConfig, Mode};
pub use context::IndexerContext;
pub use error::{Error, Result};
pub use input::InputSource;

use std::io::Write;
use std::sync::Arc;

/// Index one input end-to-end: run the dispatcher/worker/writer pipeline
/// to build the dictionary, then write the sorted index to `out`. This is
/// the library-level equivalent of one iteration of the CLI's per-file
/// driver loop (§6).
pub fn index_one(
    config: IndexerConfig,
    quit: Arc<std::sync::atomic::AtomicBool>,
    input: &InputSource,
    out: &mut impl Write,
) -> Result<()> {
    let seekable = input.is_seekable_regular_file();
    let len = input.len();
    let mode = config.select_mode(seekable, len);

    let ctx = IndexerContext::with_quit_flag(config, quit);

    if seekable {
        let file = input.open_seekable()?;
        pipeline::run_to_completion(&ctx, file, mode)?;
    } else {
        let stream = input.open()?;
        pipeline::run_to_completion(&ctx, stream, mode)?;
    }

    let ctx = Arc::try_unwrap(ctx)
        .unwrap_or_else(|arc| panic!("dangling IndexerContext reference ({} refs)", Arc::strong_count(&arc)));
    output::write_sorted_index(ctx.dictionary, out)
}
