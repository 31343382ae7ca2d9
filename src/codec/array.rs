//! Array framing
//!
//! Array fields are stored as the encoded text of each element joined by a
//! CRLF separator. The separator is not escaped, so element text containing it
//! is rejected instead of silently splitting into extra elements on read.

use thiserror::Error;

/// Separator between encoded array elements
pub const ARRAY_SEPARATOR: &str = "\r\n";

/// Reasons an array cannot be framed losslessly
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FramingError {
    #[error("element {index} contains the CRLF array separator")]
    EmbeddedSeparator { index: usize },

    /// `[""]` frames to the same empty text as `[]`
    #[error("a single empty element cannot be told apart from an empty array")]
    SingleEmptyElement,
}

/// Join encoded elements into field file text
pub fn join_elements(elements: &[String]) -> Result<String, FramingError> {
    if let Some(index) = elements.iter().position(|e| e.contains(ARRAY_SEPARATOR)) {
        return Err(FramingError::EmbeddedSeparator { index });
    }
    if elements.len() == 1 && elements[0].is_empty() {
        return Err(FramingError::SingleEmptyElement);
    }
    Ok(elements.join(ARRAY_SEPARATOR))
}

/// Split field file text back into encoded elements
///
/// Empty text is the empty array.
pub fn split_elements(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split(ARRAY_SEPARATOR).collect()
}
