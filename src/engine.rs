//! Engine Module
//!
//! The persistence engine that coordinates all components.
//!
//! ## Responsibilities
//! - Hold the registered models and codecs
//! - Serialize records into per-field files (store)
//! - Rebuild records from document directories (find / get_all)
//! - Remove document directories (delete)

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::codec::CodecRegistry;
use crate::config::Config;
use crate::error::{BoxError, DirDocError, Result};
use crate::layout::Layout;
use crate::model::{Model, Record};
use crate::sequence::KeyAllocator;

struct ModelEntry {
    collection: String,
    model: Arc<dyn Any + Send + Sync>,
}

/// The document store
///
/// ## Concurrency Model
///
/// Every operation takes `&self` and is synchronous. Registries sit behind
/// `RwLock`s; key allocation is serialized by a file lock on `.seq` when
/// `Config::lock_sequence` is set. Nothing else is coordinated:
///
/// - A store deletes a document's field files and then rewrites them. A crash
///   or concurrent writer in between can leave a mix of old and new fields, or
///   fields missing. Retrying the full store reconciles the document.
/// - The base directory is assumed to be owned by one engine per process.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Collection/document directory resolution and key allocation
    layout: Layout,

    /// Value type -> encode/decode pair
    codecs: CodecRegistry,

    /// Record type -> model descriptor
    models: RwLock<HashMap<TypeId, ModelEntry>>,
}

impl Engine {
    /// Open or create a store with the given config
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let layout = Layout::new(&config.data_dir, KeyAllocator::from_config(&config));

        tracing::info!(
            data_dir = %config.data_dir.display(),
            lock_sequence = config.lock_sequence,
            sync_writes = config.sync_writes,
            "opened document store"
        );

        Ok(Self {
            config,
            layout,
            codecs: CodecRegistry::new(),
            models: RwLock::new(HashMap::new()),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register (or replace) the model of a record type
    ///
    /// Fails if another record type already maps to the same collection name,
    /// compared ignoring ASCII case.
    pub fn register_model<R: Record>(&self, model: Model<R>) -> Result<()> {
        model.validate()?;

        let mut models = self.models.write();
        let clashes: Vec<String> = models
            .iter()
            .filter(|(id, entry)| {
                **id != TypeId::of::<R>()
                    && entry.collection.eq_ignore_ascii_case(model.collection_name())
            })
            .map(|(_, entry)| entry.collection.clone())
            .collect();

        if !clashes.is_empty() {
            return Err(DirDocError::AmbiguousCollection {
                collection: model.collection_name().to_string(),
                matches: clashes,
            });
        }

        tracing::debug!(
            record_type = type_name::<R>(),
            collection = model.collection_name(),
            fields = model.fields().len(),
            "registered model"
        );

        models.insert(
            TypeId::of::<R>(),
            ModelEntry {
                collection: model.collection_name().to_string(),
                model: Arc::new(model),
            },
        );
        Ok(())
    }

    /// Install or replace the codec for a value type
    pub fn register_codec<T, E, D, DecodeErr>(&self, encode: E, decode: D)
    where
        T: 'static,
        E: Fn(&T) -> String + Send + Sync + 'static,
        D: Fn(&str) -> std::result::Result<T, DecodeErr> + Send + Sync + 'static,
        DecodeErr: Into<BoxError>,
    {
        self.codecs.register::<T, E, D, DecodeErr>(encode, decode);
    }

    /// Install a codec for a type that round-trips through `Display`/`FromStr`
    pub fn register_parse_codec<T>(&self)
    where
        T: std::fmt::Display + std::str::FromStr + 'static,
        T::Err: Into<BoxError>,
    {
        self.codecs.register_parse::<T>();
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Store a record, assigning a key if it has none
    ///
    /// Existing field files of the document are removed first, so the
    /// document afterwards holds exactly the record's non-null fields.
    /// Every field is encoded before the document directory is touched; a
    /// failure while writing files leaves the document partially written.
    pub fn store<R: Record>(&self, record: &mut R) -> Result<()> {
        let model = self.model::<R>()?;
        let collection_dir = self.layout.collection_dir(model.collection_name())?;

        let mut files = Vec::with_capacity(model.fields().len());
        for field in model.fields() {
            if let Some(text) = field.encode(record, &self.codecs)? {
                files.push((field.name(), text));
            }
        }

        let had_key = record.key().is_some();
        let mut key = record.key().map(str::to_owned);
        let document_dir = self
            .layout
            .document_dir(&collection_dir, &mut key, true)?
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "document directory not created"))?;

        if !had_key {
            if let Some(key) = &key {
                record.set_key(key.clone());
            }
        }

        clear_files(&document_dir)?;
        for (name, text) in &files {
            self.write_field(&document_dir.join(name), text)?;
        }

        tracing::debug!(
            collection = model.collection_name(),
            key = key.as_deref().unwrap_or_default(),
            fields = files.len(),
            "stored document"
        );
        Ok(())
    }

    /// Load a record by key; `None` if no such document exists
    pub fn find<R: Record>(&self, id: &str) -> Result<Option<R>> {
        let model = self.model::<R>()?;
        let collection_dir = self.layout.collection_dir(model.collection_name())?;

        let mut key = Some(id.to_string());
        match self.layout.document_dir(&collection_dir, &mut key, false)? {
            Some(document_dir) => self.parse(&model, id, &document_dir).map(Some),
            None => Ok(None),
        }
    }

    /// Load several records; results follow the order of `ids`
    pub fn find_many<R, I, S>(&self, ids: I) -> Result<Vec<Option<R>>>
    where
        R: Record,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ids.into_iter().map(|id| self.find::<R>(id.as_ref())).collect()
    }

    /// Delete a document and all its field files
    ///
    /// Returns `false` if the document does not exist.
    pub fn delete<R: Record>(&self, id: &str) -> Result<bool> {
        let model = self.model::<R>()?;
        let collection_dir = self.layout.collection_dir(model.collection_name())?;

        let mut key = Some(id.to_string());
        match self.layout.document_dir(&collection_dir, &mut key, false)? {
            Some(document_dir) => {
                fs::remove_dir_all(&document_dir)?;
                tracing::debug!(collection = model.collection_name(), key = id, "deleted document");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Delete the document of a record; `false` if the record was never stored
    pub fn delete_record<R: Record>(&self, record: &R) -> Result<bool> {
        match record.key() {
            Some(key) => self.delete::<R>(key),
            None => Ok(false),
        }
    }

    /// Lazily load every document of a record type
    ///
    /// Each call re-reads the collection directory. Order follows the
    /// filesystem's directory listing.
    pub fn get_all<R: Record>(&self) -> Result<Documents<'_, R>> {
        let model = self.model::<R>()?;
        let collection_dir = self.layout.collection_dir(model.collection_name())?;
        let entries = self.layout.document_entries(&collection_dir)?;

        Ok(Documents {
            engine: self,
            model,
            entries,
        })
    }

    /// Directory of a record type's collection, created if missing
    pub fn collection_dir<R: Record>(&self) -> Result<PathBuf> {
        let model = self.model::<R>()?;
        self.layout.collection_dir(model.collection_name())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    pub fn is_registered<R: Record>(&self) -> bool {
        self.models.read().contains_key(&TypeId::of::<R>())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn model<R: Record>(&self) -> Result<Arc<Model<R>>> {
        let model = self
            .models
            .read()
            .get(&TypeId::of::<R>())
            .map(|entry| Arc::clone(&entry.model));

        model
            .and_then(|m| m.downcast::<Model<R>>().ok())
            .ok_or(DirDocError::UnmappedType {
                type_name: type_name::<R>(),
            })
    }

    /// Build a record from a document directory
    fn parse<R: Record>(&self, model: &Model<R>, key: &str, document_dir: &Path) -> Result<R> {
        let mut record = model.construct()?;
        record.set_key(key.to_string());

        for field in model.fields() {
            let text = match fs::read_to_string(document_dir.join(field.name())) {
                Ok(text) => text,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            field.decode_into(&mut record, &text, &self.codecs)?;
        }

        Ok(record)
    }

    fn write_field(&self, path: &Path, text: &str) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(text.as_bytes())?;
        if self.config.sync_writes {
            file.sync_all()?;
        }
        Ok(())
    }
}

/// Remove every file directly inside a document directory
fn clear_files(document_dir: &Path) -> Result<()> {
    for entry in fs::read_dir(document_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// Lazy sequence of the documents in a collection
///
/// Yields `Err` for unreadable entries and for documents that fail to decode.
pub struct Documents<'a, R: Record> {
    engine: &'a Engine,
    model: Arc<Model<R>>,
    entries: fs::ReadDir,
}

impl<R: Record> Iterator for Documents<'_, R> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e.into())),
            };

            match entry.file_type() {
                Ok(file_type) if file_type.is_dir() => {}
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }

            let key = match entry.file_name().into_string() {
                Ok(key) => key,
                Err(name) => {
                    return Some(Err(DirDocError::InvalidKey(name.to_string_lossy().into_owned())))
                }
            };

            return Some(self.engine.parse(&self.model, &key, &entry.path()));
        }
    }
}
