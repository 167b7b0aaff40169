// SPDX-License-Identifier: MIT OR Apache-2.0

//! Input source abstraction (§6): a plain file, stdin, or a `.gz`-named
//! file decompressed through the external gzip interface. Only the
//! byte-stream interface of gzip decompression is assumed, per §1 scope.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;

use crate::error::{Error, Result};

/// One input to index: either a path on disk (possibly gzip-compressed)
/// or stdin (`-`).
pub enum InputSource {
    Stdin,
    Path(PathBuf),
}

impl InputSource {
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            InputSource::Stdin
        } else {
            InputSource::Path(PathBuf::from(arg))
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            InputSource::Stdin => "-".to_string(),
            InputSource::Path(p) => p.display().to_string(),
        }
    }

    pub fn is_gzip(&self) -> bool {
        match self {
            InputSource::Stdin => false,
            InputSource::Path(p) => p
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("gz")),
        }
    }

    /// §4.10/§6: only a seekable, regular file can use the parallel
    /// pipeline. Stdin and gzip streams are always serial.
    pub fn is_seekable_regular_file(&self) -> bool {
        match self {
            InputSource::Stdin => false,
            InputSource::Path(p) => !self.is_gzip() && p.is_file(),
        }
    }

    pub fn len(&self) -> Option<u64> {
        match self {
            InputSource::Stdin => None,
            InputSource::Path(p) => std::fs::metadata(p).ok().map(|m| m.len()),
        }
    }

    /// The output path for `-w`/`--write`: `<input>.lpi`.
    pub fn index_output_path(&self) -> Option<PathBuf> {
        match self {
            InputSource::Stdin => None,
            InputSource::Path(p) => {
                let mut s = p.as_os_str().to_os_string();
                s.push(".lpi");
                Some(PathBuf::from(s))
            }
        }
    }

    /// Open a boxed byte stream for this input, transparently
    /// decompressing `.gz` files.
    pub fn open(&self) -> Result<Box<dyn Read + Send>> {
        match self {
            InputSource::Stdin => Ok(Box::new(BufReader::new(io::stdin()))),
            InputSource::Path(path) => {
                let file = File::open(path).map_err(|source| Error::Open {
                    path: path.clone(),
                    source,
                })?;
                if self.is_gzip() {
                    Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
                } else {
                    Ok(Box::new(BufReader::new(file)))
                }
            }
        }
    }

    /// Open a direct, seekable file handle for the chunked parallel
    /// dispatcher (§4.5), bypassing the boxed `Read` used by the serial
    /// path. Only ever called when `is_seekable_regular_file()` is true.
    pub fn open_seekable(&self) -> Result<File> {
        match self {
            InputSource::Stdin => unreachable!("stdin is never seekable"),
            InputSource::Path(path) => File::open(path).map_err(|source| Error::Open {
                path: path.clone(),
                source,
            }),
        }
    }
}

pub fn validate_write_flag(input: &InputSource, write_requested: bool) -> Result<()> {
    if write_requested {
        if matches!(input, InputSource::Stdin) {
            return Err(Error::StdinWithWrite);
        }
    }
    Ok(())
}

pub fn path_is_gz(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}
