// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::PathBuf;

/// Errors produced by the indexing engine.
///
/// Recoverable conditions (a single unreadable input file, a dropped
/// location under a growth cap) are logged and absorbed by the caller; only
/// the variants below ever propagate out of the engine, per §7 of the
/// design: allocation failures that would leave the dictionary in a
/// half-built state, and cap violations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open input {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error reading {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write index output: {0}")]
    Write(#[source] std::io::Error),

    #[error("dictionary entry cap exceeded ({0} distinct addresses)")]
    EntryCapExceeded(usize),

    #[error("stdin input is incompatible with -w/--write")]
    StdinWithWrite,

    #[error("debug verbosity {0} is out of range (expected 0-9)")]
    DebugOutOfRange(i32),
}

pub type Result<T> = std::result::Result<T, Error>;
