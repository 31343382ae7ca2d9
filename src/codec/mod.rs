//! Codec Module
//!
//! Converts typed field values to and from the text stored in field files.
//!
//! ## Responsibilities
//! - Map a value type to an encode/decode pair (`CodecRegistry`)
//! - Frame array fields as separator-joined element text
//!
//! ## Field File Format
//! ```text
//! Scalar field:   <encoded value>
//! Array field:    <elem 0>\r\n<elem 1>\r\n ... <elem n>
//! Empty array:    (empty file)
//! ```
//!
//! `decode(encode(v)) == v` must hold for every value the application stores.

mod array;
mod registry;

pub use array::{join_elements, split_elements, FramingError, ARRAY_SEPARATOR};
pub use registry::{Codec, CodecRegistry};
