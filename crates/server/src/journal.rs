//! Append-only crossing journal.
//!
//! One JSON-encoded [`CrossingRecord`] per line. Replayed into the stats
//! aggregator at startup so per-vehicle history survives a restart.

use onelane_types::CrossingRecord;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode crossing record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Writer side of the journal.
#[derive(Debug)]
pub struct CrossingJournal {
    path: PathBuf,
    file: Mutex<File>,
}

impl CrossingJournal {
    /// Open (creating if needed) a journal for appending.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, JournalError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| JournalError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line.
    pub fn append(&self, record: &CrossingRecord) -> Result<(), JournalError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = self.file.lock();
        file.write_all(&line)
            .and_then(|_| file.flush())
            .map_err(|source| JournalError::Io {
                path: self.path.clone(),
                source,
            })
    }

    /// Read every record from a journal file.
    ///
    /// A missing file is an empty journal. Lines that fail to decode (such
    /// as a torn final write) are skipped with a warning.
    pub fn replay(path: &Path) -> Result<Vec<CrossingRecord>, JournalError> {
        let io_err = |source: io::Error| JournalError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No journal to replay");
                return Ok(Vec::new());
            }
            Err(e) => return Err(io_err(e)),
        };

        let mut records = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(io_err)?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<CrossingRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    path = %path.display(),
                    line = index + 1,
                    error = %e,
                    "Skipping malformed journal line"
                ),
            }
        }
        Ok(records)
    }
}
