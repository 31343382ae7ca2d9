//! Layout Resolver
//!
//! Maps collections and documents to directories under the base path,
//! creating them on demand.
//!
//! ## On-Disk Layout
//! ```text
//! {base}/
//!   {Collection}/
//!     .seq              (last issued key)
//!     {key}/            (one directory per document)
//!       {FieldName}     (one file per non-null field)
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{DirDocError, Result};
use crate::sequence::{KeyAllocator, SEQUENCE_FILE};

/// Resolves collection and document directories
#[derive(Debug, Clone)]
pub struct Layout {
    /// Directory holding one subdirectory per collection
    base_dir: PathBuf,

    /// Issues keys for documents stored without one
    allocator: KeyAllocator,
}

impl Layout {
    pub fn new(base_dir: impl Into<PathBuf>, allocator: KeyAllocator) -> Self {
        Self {
            base_dir: base_dir.into(),
            allocator,
        }
    }

    /// Resolve (creating if needed) the directory of a collection
    ///
    /// Existing directories are matched ignoring ASCII case, as they would be
    /// on a case-insensitive filesystem. More than one match is an error.
    pub fn collection_dir(&self, collection: &str) -> Result<PathBuf> {
        let mut matches = self.matching_dirs(collection)?;

        match matches.len() {
            0 => {
                let dir = self.base_dir.join(collection);
                fs::create_dir_all(&dir)?;
                tracing::debug!(collection, dir = %dir.display(), "created collection directory");
                Ok(dir)
            }
            1 => Ok(self.base_dir.join(matches.remove(0))),
            _ => {
                matches.sort();
                Err(DirDocError::AmbiguousCollection {
                    collection: collection.to_string(),
                    matches,
                })
            }
        }
    }

    /// Resolve the directory of a document
    ///
    /// An unset `key` is allocated first and written back through the
    /// reference. Returns `None` when the document does not exist and
    /// `create` is false; a key that cannot name a document never exists.
    pub fn document_dir(
        &self,
        collection_dir: &Path,
        key: &mut Option<String>,
        create: bool,
    ) -> Result<Option<PathBuf>> {
        let key = match key {
            Some(key) => key,
            None => key.insert(self.allocator.next_key(collection_dir)?),
        };
        if !create && check_component(key).is_err() {
            return Ok(None);
        }
        validate_key(key)?;

        let dir = collection_dir.join(key.as_str());
        if dir.is_dir() {
            return Ok(Some(dir));
        }
        if !create {
            return Ok(None);
        }

        fs::create_dir(&dir)?;
        Ok(Some(dir))
    }

    /// List the document keys of a collection directory
    pub fn document_entries(&self, collection_dir: &Path) -> Result<fs::ReadDir> {
        Ok(fs::read_dir(collection_dir)?)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Names of directories under the base path equal to `collection` ignoring case
    fn matching_dirs(&self, collection: &str) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut matches = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.eq_ignore_ascii_case(collection) {
                    matches.push(name.to_string());
                }
            }
        }
        Ok(matches)
    }
}

/// Check that a name can be used as a single path component
///
/// Used for keys, collection names and field names. Returns the reason on
/// failure.
pub fn check_component(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("name is empty".to_string());
    }
    if name == "." || name == ".." {
        return Err(format!("'{}' is not a valid name", name));
    }
    if name == SEQUENCE_FILE {
        return Err(format!("'{}' is reserved for the sequence counter", name));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(format!("'{}' contains a path separator", name));
    }
    Ok(())
}

/// Reject keys that cannot name a document directory
pub fn validate_key(key: &str) -> Result<()> {
    check_component(key).map_err(|_| DirDocError::InvalidKey(key.to_string()))
}
