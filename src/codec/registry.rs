//! Codec registry
//!
//! Type-keyed table of encode/decode pairs. Lookups happen with the value's
//! static type, so each stored codec is downcast back to `Codec<T>`.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{BoxError, DirDocError, Result};

type EncodeFn<T> = dyn Fn(&T) -> String + Send + Sync;
type DecodeFn<T> = dyn Fn(&str) -> std::result::Result<T, BoxError> + Send + Sync;

/// A matched encode/decode pair for one value type
pub struct Codec<T> {
    type_name: &'static str,
    encode: Box<EncodeFn<T>>,
    decode: Box<DecodeFn<T>>,
}

impl<T> Codec<T> {
    /// Encode a value to its stored text
    pub fn encode(&self, value: &T) -> String {
        (self.encode)(value)
    }

    /// Decode stored text back to a value
    pub fn decode(&self, text: &str) -> std::result::Result<T, BoxError> {
        (self.decode)(text)
    }

    /// Name of the value type this codec handles
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

struct Entry {
    type_name: &'static str,
    codec: Arc<dyn Any + Send + Sync>,
}

/// Registry of codecs keyed by value type
///
/// ## Concurrency:
/// - `codecs`: Protected by RwLock, so registration works through `&self`
/// - Lookups clone the `Arc` out and release the lock before encoding
pub struct CodecRegistry {
    codecs: RwLock<HashMap<TypeId, Entry>>,
}

impl CodecRegistry {
    /// Create a registry with the `String` identity codec installed
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register::<String, _, _, Infallible>(|s| s.clone(), |s| Ok(s.to_string()));
        registry
    }

    /// Create a registry with no codecs at all
    pub fn empty() -> Self {
        Self {
            codecs: RwLock::new(HashMap::new()),
        }
    }

    /// Install or replace the codec for `T`
    pub fn register<T, E, D, DecodeErr>(&self, encode: E, decode: D)
    where
        T: 'static,
        E: Fn(&T) -> String + Send + Sync + 'static,
        D: Fn(&str) -> std::result::Result<T, DecodeErr> + Send + Sync + 'static,
        DecodeErr: Into<BoxError>,
    {
        let codec = Codec {
            type_name: type_name::<T>(),
            encode: Box::new(encode),
            decode: Box::new(move |text: &str| decode(text).map_err(Into::<BoxError>::into)),
        };

        let replaced = self.codecs.write().insert(
            TypeId::of::<T>(),
            Entry {
                type_name: type_name::<T>(),
                codec: Arc::new(codec),
            },
        );

        tracing::debug!(
            value_type = type_name::<T>(),
            replaced = replaced.is_some(),
            "registered codec"
        );
    }

    /// Install a codec built from `Display` and `FromStr`
    pub fn register_parse<T>(&self)
    where
        T: fmt::Display + FromStr + 'static,
        T::Err: Into<BoxError>,
    {
        self.register::<T, _, _, T::Err>(|v| v.to_string(), |s| s.parse::<T>());
    }

    /// Look up the codec for `T`
    pub fn get<T: 'static>(&self) -> Result<Arc<Codec<T>>> {
        let codec = self
            .codecs
            .read()
            .get(&TypeId::of::<T>())
            .map(|entry| Arc::clone(&entry.codec));

        codec
            .and_then(|c| c.downcast::<Codec<T>>().ok())
            .ok_or(DirDocError::NoCodecRegistered {
                type_name: type_name::<T>(),
            })
    }

    /// Whether a codec for `T` is installed
    pub fn contains<T: 'static>(&self) -> bool {
        self.codecs.read().contains_key(&TypeId::of::<T>())
    }

    /// Encode a value with the codec registered for its type
    pub fn encode<T: 'static>(&self, value: &T) -> Result<String> {
        Ok(self.get::<T>()?.encode(value))
    }

    /// Names of all types with a registered codec, sorted
    pub fn registered_types(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.codecs.read().values().map(|e| e.type_name).collect();
        names.sort_unstable();
        names
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("types", &self.registered_types())
            .finish()
    }
}
