//! Model Module
//!
//! Declarative descriptors that tell the engine how a record type maps to
//! disk: its collection name, how to construct an empty instance, and an
//! ordered list of persisted fields with their accessors.
//!
//! ## Example
//! ```
//! use dirdoc::{Model, Record};
//!
//! #[derive(Default)]
//! struct Auto {
//!     key: Option<String>,
//!     name: Option<String>,
//!     passengers: Option<Vec<String>>,
//! }
//!
//! impl Record for Auto {
//!     fn key(&self) -> Option<&str> {
//!         self.key.as_deref()
//!     }
//!
//!     fn set_key(&mut self, key: String) {
//!         self.key = Some(key);
//!     }
//! }
//!
//! let model = Model::<Auto>::new()
//!     .constructor(Auto::default)
//!     .field("Name", |a: &Auto| a.name.as_ref(), |a, v| a.name = Some(v))
//!     .array_field("Passengers", |a: &Auto| a.passengers.as_deref(), |a, v| a.passengers = Some(v));
//!
//! assert_eq!(model.collection_name(), "Auto");
//! assert_eq!(model.fields().len(), 2);
//! ```

use std::any::type_name;
use std::collections::HashSet;
use std::fmt;

use crate::codec::{join_elements, split_elements, CodecRegistry};
use crate::error::{BoxError, DirDocError, Result};
use crate::layout::check_component;

/// A record type that can be persisted as a document
///
/// The key is `None` until the record is stored for the first time.
pub trait Record: 'static {
    fn key(&self) -> Option<&str>;

    fn set_key(&mut self, key: String);
}

/// Shape of a persisted field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// One value, stored as its encoded text
    Scalar,

    /// A list of values, stored as CRLF-joined element text
    Array,
}

type EncodeField<R> = dyn Fn(&R, &CodecRegistry) -> Result<Option<String>> + Send + Sync;
type DecodeField<R> = dyn Fn(&mut R, &str, &CodecRegistry) -> Result<()> + Send + Sync;
type Construct<R> = dyn Fn() -> std::result::Result<R, BoxError> + Send + Sync;

/// One persisted field of a record type
pub struct FieldDescriptor<R> {
    name: String,
    kind: FieldKind,
    value_type: &'static str,
    encode: Box<EncodeField<R>>,
    decode: Box<DecodeField<R>>,
}

impl<R> FieldDescriptor<R> {
    /// File name of the field inside a document directory
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Value type (element type for arrays)
    pub fn value_type(&self) -> &'static str {
        self.value_type
    }

    /// Encode the field's current value, or `None` if it is null
    pub fn encode(&self, record: &R, codecs: &CodecRegistry) -> Result<Option<String>> {
        (self.encode)(record, codecs)
    }

    /// Decode file text and assign it to the field
    pub fn decode_into(&self, record: &mut R, text: &str, codecs: &CodecRegistry) -> Result<()> {
        (self.decode)(record, text, codecs)
    }
}

impl<R> fmt::Debug for FieldDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("value_type", &self.value_type)
            .finish()
    }
}

/// Descriptor of a record type
pub struct Model<R> {
    collection: String,
    constructor: Option<Box<Construct<R>>>,
    fields: Vec<FieldDescriptor<R>>,
}

impl<R: Record> Model<R> {
    /// Start a descriptor named after the type itself
    pub fn new() -> Self {
        Self {
            collection: short_type_name::<R>().to_string(),
            constructor: None,
            fields: Vec::new(),
        }
    }

    /// Override the collection name
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection = name.into();
        self
    }

    /// Set the zero-argument construction path used when loading documents
    pub fn constructor<F>(mut self, construct: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
    {
        self.constructor = Some(Box::new(move || Ok::<R, BoxError>(construct())));
        self
    }

    /// Set a construction path that may fail
    pub fn try_constructor<F, E>(mut self, construct: F) -> Self
    where
        F: Fn() -> std::result::Result<R, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.constructor = Some(Box::new(move || construct().map_err(Into::<BoxError>::into)));
        self
    }

    /// Add a scalar field
    ///
    /// `get` returns `None` for a null value, which is not written.
    pub fn field<T, G, S>(mut self, name: impl Into<String>, get: G, set: S) -> Self
    where
        T: 'static,
        G: Fn(&R) -> Option<&T> + Send + Sync + 'static,
        S: Fn(&mut R, T) + Send + Sync + 'static,
    {
        let name = name.into();
        let field = name.clone();

        let encode = move |record: &R, codecs: &CodecRegistry| -> Result<Option<String>> {
            match get(record) {
                Some(value) => Ok(Some(codecs.get::<T>()?.encode(value))),
                None => Ok(None),
            }
        };

        let decode = move |record: &mut R, text: &str, codecs: &CodecRegistry| -> Result<()> {
            let codec = codecs.get::<T>()?;
            let value = codec.decode(text).map_err(|source| DirDocError::Decode {
                field: field.clone(),
                type_name: codec.type_name(),
                source,
            })?;
            set(record, value);
            Ok(())
        };

        self.fields.push(FieldDescriptor {
            name,
            kind: FieldKind::Scalar,
            value_type: type_name::<T>(),
            encode: Box::new(encode),
            decode: Box::new(decode),
        });
        self
    }

    /// Add an array field whose elements use the codec registered for `T`
    pub fn array_field<T, G, S>(mut self, name: impl Into<String>, get: G, set: S) -> Self
    where
        T: 'static,
        G: Fn(&R) -> Option<&[T]> + Send + Sync + 'static,
        S: Fn(&mut R, Vec<T>) + Send + Sync + 'static,
    {
        let name = name.into();
        let encode_field = name.clone();
        let decode_field = name.clone();

        let encode = move |record: &R, codecs: &CodecRegistry| -> Result<Option<String>> {
            let Some(values) = get(record) else {
                return Ok(None);
            };
            let codec = codecs.get::<T>()?;
            let elements: Vec<String> = values.iter().map(|v| codec.encode(v)).collect();

            join_elements(&elements)
                .map(Some)
                .map_err(|e| DirDocError::UnrepresentableValue {
                    field: encode_field.clone(),
                    reason: e.to_string(),
                })
        };

        let decode = move |record: &mut R, text: &str, codecs: &CodecRegistry| -> Result<()> {
            let codec = codecs.get::<T>()?;
            let values = split_elements(text)
                .into_iter()
                .map(|element| codec.decode(element))
                .collect::<std::result::Result<Vec<T>, BoxError>>()
                .map_err(|source| DirDocError::Decode {
                    field: decode_field.clone(),
                    type_name: codec.type_name(),
                    source,
                })?;
            set(record, values);
            Ok(())
        };

        self.fields.push(FieldDescriptor {
            name,
            kind: FieldKind::Array,
            value_type: type_name::<T>(),
            encode: Box::new(encode),
            decode: Box::new(decode),
        });
        self
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    /// Persisted fields in declaration order
    pub fn fields(&self) -> &[FieldDescriptor<R>] {
        &self.fields
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor<R>> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_constructible(&self) -> bool {
        self.constructor.is_some()
    }

    /// Check names once, before the model is used
    pub fn validate(&self) -> Result<()> {
        check_component(&self.collection).map_err(|reason| {
            DirDocError::InvalidModel(format!("collection of {}: {}", type_name::<R>(), reason))
        })?;

        let mut seen = HashSet::new();
        for field in &self.fields {
            check_component(&field.name).map_err(|reason| {
                DirDocError::InvalidModel(format!("field of {}: {}", type_name::<R>(), reason))
            })?;
            if !seen.insert(field.name.as_str()) {
                return Err(DirDocError::InvalidModel(format!(
                    "field '{}' declared twice on {}",
                    field.name,
                    type_name::<R>()
                )));
            }
        }
        Ok(())
    }

    /// Build an empty instance through the construction path
    pub fn construct(&self) -> Result<R> {
        let construct = self
            .constructor
            .as_ref()
            .ok_or_else(|| DirDocError::UnconstructableType {
                type_name: type_name::<R>(),
                reason: "no zero-argument constructor was declared".to_string(),
            })?;

        construct().map_err(|e| DirDocError::UnconstructableType {
            type_name: type_name::<R>(),
            reason: format!("constructor failed: {}", e),
        })
    }
}

impl<R: Record> Default for Model<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for Model<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("collection", &self.collection)
            .field("constructible", &self.constructor.is_some())
            .field("fields", &self.fields)
            .finish()
    }
}

/// `my_app::models::Auto<T>` -> `Auto`
fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics.rsplit("::").next().unwrap_or(without_generics)
}
