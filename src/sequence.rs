//! Key Allocator
//!
//! Issues monotonically increasing string keys per collection, backed by a
//! `.seq` counter file in the collection directory.
//!
//! ## Counter File
//! ```text
//! {collection}/.seq    decimal text of the last issued key, e.g. "42"
//! ```
//!
//! A missing or empty counter means no key has been issued yet, so the first
//! key is `"1"`. Any other non-integer content is corruption and is reported,
//! never reset, because restarting at 1 would hand out keys that already exist.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use fs2::FileExt;

use crate::config::Config;
use crate::error::{DirDocError, Result};

/// Reserved name of the counter file inside every collection directory
pub const SEQUENCE_FILE: &str = ".seq";

/// Allocates keys from a collection's counter file
///
/// ## Concurrency:
/// - With `lock` set, the read-increment-write runs under an exclusive
///   advisory lock on `.seq`, so concurrent allocators (threads or processes)
///   never observe the same counter value
/// - Without it, two racing callers can be issued the same key
#[derive(Debug, Clone, Copy)]
pub struct KeyAllocator {
    lock: bool,
    sync: bool,
}

impl KeyAllocator {
    pub fn new(lock: bool, sync: bool) -> Self {
        Self { lock, sync }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.lock_sequence, config.sync_writes)
    }

    /// Allocate the next key for the collection at `collection_dir`
    ///
    /// The counter file is rewritten with the issued value before returning.
    /// Candidates whose document directory already exists are skipped.
    pub fn next_key(&self, collection_dir: &Path) -> Result<String> {
        let path = collection_dir.join(SEQUENCE_FILE);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        if self.lock {
            FileExt::lock_exclusive(&file)?;
        }

        let key = self.advance(&mut file, &path, collection_dir)?;

        if self.lock {
            FileExt::unlock(&file)?;
        }

        tracing::debug!(collection = %collection_dir.display(), key = %key, "allocated key");
        Ok(key)
    }

    /// Read the last issued key without allocating
    pub fn current(&self, collection_dir: &Path) -> Result<Option<u64>> {
        let path = collection_dir.join(SEQUENCE_FILE);
        match std::fs::read_to_string(&path) {
            Ok(contents) => match parse_counter(&path, &contents)? {
                0 => Ok(None),
                n => Ok(Some(n)),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn advance(&self, file: &mut File, path: &Path, collection_dir: &Path) -> Result<String> {
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let last = parse_counter(path, &contents)?;
        let mut next = increment(path, last)?;
        while collection_dir.join(next.to_string()).exists() {
            next = increment(path, next)?;
        }

        let key = next.to_string();
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(key.as_bytes())?;
        if self.sync {
            file.sync_data()?;
        }

        Ok(key)
    }
}

impl Default for KeyAllocator {
    fn default() -> Self {
        Self::new(true, false)
    }
}

/// Parse counter text; blank means nothing has been issued
fn parse_counter(path: &Path, contents: &str) -> Result<u64> {
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<u64>()
        .map_err(|_| DirDocError::CorruptSequenceState {
            path: path.to_path_buf(),
            contents: contents.to_string(),
        })
}

fn increment(path: &Path, value: u64) -> Result<u64> {
    value
        .checked_add(1)
        .ok_or_else(|| DirDocError::CorruptSequenceState {
            path: path.to_path_buf(),
            contents: value.to_string(),
        })
}
