//! Tests for CodecRegistry and array framing
//!
//! These tests verify:
//! - The default String identity codec
//! - Registration, replacement and lookup by type
//! - Missing codecs reported by type name
//! - CRLF array framing and its rejected values

use std::num::ParseIntError;

use dirdoc::codec::{join_elements, split_elements, FramingError, ARRAY_SEPARATOR};
use dirdoc::{CodecRegistry, DirDocError};

// =============================================================================
// Helper Functions
// =============================================================================

fn round_trip<T: 'static + Clone + PartialEq + std::fmt::Debug>(registry: &CodecRegistry, value: T) {
    let codec = registry.get::<T>().unwrap();
    let text = codec.encode(&value);
    let decoded = codec.decode(&text).unwrap();
    assert_eq!(decoded, value, "round trip through {:?}", text);
}

// =============================================================================
// Registry Tests
// =============================================================================

#[test]
fn test_string_codec_installed_by_default() {
    let registry = CodecRegistry::new();

    assert!(registry.contains::<String>());
    round_trip(&registry, "SuperCrazy".to_string());
    round_trip(&registry, String::new());
    round_trip(&registry, "line one\nline two".to_string());
}

#[test]
fn test_empty_registry_has_no_codecs() {
    let registry = CodecRegistry::empty();

    assert!(!registry.contains::<String>());
    assert!(registry.registered_types().is_empty());
}

#[test]
fn test_missing_codec_names_the_type() {
    let registry = CodecRegistry::new();

    let err = registry.encode(&12i32).unwrap_err();

    match err {
        DirDocError::NoCodecRegistered { type_name } => assert_eq!(type_name, "i32"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_register_custom_codec() {
    let registry = CodecRegistry::new();
    registry.register::<i32, _, _, ParseIntError>(|v| v.to_string(), |s| s.parse());

    assert_eq!(registry.encode(&-42i32).unwrap(), "-42");
    round_trip(&registry, 0i32);
    round_trip(&registry, i32::MAX);
    round_trip(&registry, i32::MIN);
}

#[test]
fn test_register_parse_codec() {
    let registry = CodecRegistry::new();
    registry.register_parse::<u64>();
    registry.register_parse::<bool>();
    registry.register_parse::<f64>();

    round_trip(&registry, 18_446_744_073_709_551_615u64);
    round_trip(&registry, true);
    round_trip(&registry, 1.5f64);
}

#[test]
fn test_register_replaces_existing_codec() {
    let registry = CodecRegistry::new();
    registry.register::<String, _, _, std::convert::Infallible>(
        |s| s.to_uppercase(),
        |s| Ok(s.to_lowercase()),
    );

    assert_eq!(registry.encode(&"abc".to_string()).unwrap(), "ABC");
    assert_eq!(registry.registered_types().len(), 1);
}

#[test]
fn test_decode_failure_is_returned() {
    let registry = CodecRegistry::new();
    registry.register_parse::<i32>();

    let codec = registry.get::<i32>().unwrap();
    let err = codec.decode("twelve").unwrap_err();

    assert!(err.to_string().contains("invalid digit"));
}

#[test]
fn test_registered_types_sorted() {
    let registry = CodecRegistry::new();
    registry.register_parse::<u8>();
    registry.register_parse::<i64>();

    let types = registry.registered_types();

    assert_eq!(types.len(), 3);
    let mut sorted = types.clone();
    sorted.sort();
    assert_eq!(types, sorted);
}

// =============================================================================
// Array Framing Tests
// =============================================================================

#[test]
fn test_join_uses_crlf() {
    let elements = vec!["me".to_string(), "you".to_string(), "marley".to_string()];

    let text = join_elements(&elements).unwrap();

    assert_eq!(text, "me\r\nyou\r\nmarley");
    assert_eq!(split_elements(&text), vec!["me", "you", "marley"]);
}

#[test]
fn test_empty_array_is_empty_text() {
    let text = join_elements(&[]).unwrap();

    assert_eq!(text, "");
    assert!(split_elements(&text).is_empty());
}

#[test]
fn test_empty_elements_survive_when_not_alone() {
    let elements = vec![String::new(), "x".to_string(), String::new()];

    let text = join_elements(&elements).unwrap();

    assert_eq!(split_elements(&text), vec!["", "x", ""]);
}

#[test]
fn test_lone_newline_is_not_a_separator() {
    let elements = vec!["a\nb".to_string(), "c\rd".to_string()];

    let text = join_elements(&elements).unwrap();

    assert_eq!(split_elements(&text), vec!["a\nb", "c\rd"]);
}

#[test]
fn test_element_containing_separator_rejected() {
    let elements = vec!["ok".to_string(), format!("bad{}value", ARRAY_SEPARATOR)];

    let err = join_elements(&elements).unwrap_err();

    assert_eq!(err, FramingError::EmbeddedSeparator { index: 1 });
}

#[test]
fn test_single_empty_element_rejected() {
    let err = join_elements(&[String::new()]).unwrap_err();

    assert_eq!(err, FramingError::SingleEmptyElement);
}
