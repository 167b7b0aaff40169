// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line front end (§6), treated by the core engine as an
//! external collaborator: argument parsing, signal handling, the
//! per-file driver loop, and process exit-code policy all live here so
//! `logaddr_index` itself stays a library with no `process::exit` calls.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use logaddr_index::{index_one, Error, IndexerConfig, InputSource};

/// High-throughput log indexer: extract IPv4/IPv6/MAC addresses from log
/// files and emit a frequency-sorted inverted index.
#[derive(Parser, Debug)]
#[command(name = "lpi", version, about)]
struct Args {
    /// Input files to index; `-` reads stdin.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Diagnostic verbosity, 0-9.
    #[arg(short = 'd', long = "debug", default_value_t = 0)]
    debug: i32,

    /// Write an index file per input, named `<input>.lpi`, instead of
    /// writing to stdout.
    #[arg(short = 'w', long = "write")]
    write: bool,

    /// Force the serial (single-threaded) pipeline.
    #[arg(short = 's', long = "serial")]
    serial: bool,

    /// Tokenizer greedy mode: quote characters are ordinary content.
    #[arg(short = 'g', long = "greedy")]
    greedy: bool,
}

fn main() {
    let args = Args::parse();

    if !(0..=9).contains(&args.debug) {
        eprintln!("error: {}", Error::DebugOutOfRange(args.debug));
        std::process::exit(1);
    }

    init_logging(args.debug);

    let quit = Arc::new(AtomicBool::new(false));
    {
        let quit = quit.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            tracing::warn!("signal received, shutting down after the current chunk");
            quit.store(true, Ordering::Relaxed);
        }) {
            tracing::warn!(error = %e, "failed to install signal handler");
        }
    }

    let config = IndexerConfig {
        force_serial: args.serial,
        greedy: args.greedy,
        debug_level: args.debug,
        ..IndexerConfig::default()
    };

    let mut any_succeeded = false;
    let mut any_failed = false;

    for arg in &args.inputs {
        let source = InputSource::from_arg(arg);

        if let Err(e) = logaddr_index::input::validate_write_flag(&source, args.write) {
            eprintln!("error: {e}");
            any_failed = true;
            continue;
        }

        match run_one(&config, quit.clone(), &source, args.write) {
            Ok(()) => any_succeeded = true,
            Err(e) => {
                eprintln!("error indexing {}: {e}", source.display_name());
                any_failed = true;
            }
        }

        if quit.load(Ordering::Relaxed) {
            break;
        }
    }

    if any_failed && !any_succeeded {
        std::process::exit(1);
    }
}

fn run_one(
    config: &IndexerConfig,
    quit: Arc<AtomicBool>,
    source: &InputSource,
    write: bool,
) -> logaddr_index::Result<()> {
    if write {
        let path: PathBuf = source
            .index_output_path()
            .expect("validate_write_flag rejects stdin + --write");
        let file = File::create(&path).map_err(|e| Error::Open { path: path.clone(), source: e })?;
        let mut out = BufWriter::new(file);
        index_one(config.clone(), quit, source, &mut out)
    } else {
        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        let result = index_one(config.clone(), quit, source, &mut out);
        let _ = out.flush();
        result
    }
}

fn init_logging(debug_level: i32) {
    use tracing_subscriber::filter::LevelFilter;

    let level = match debug_level {
        0 => LevelFilter::WARN,
        1..=2 => LevelFilter::INFO,
        3..=5 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}
