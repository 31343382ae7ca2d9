//! Tests for KeyAllocator
//!
//! These tests verify:
//! - Keys start at "1" and increase by one
//! - The counter file holds the last issued key as decimal text
//! - Corrupt counters are reported, never reset
//! - Existing document directories are skipped
//! - Locked allocation hands out unique keys across threads

use std::collections::HashSet;
use std::fs;
use std::sync::Arc;
use std::thread;

use dirdoc::sequence::{KeyAllocator, SEQUENCE_FILE};
use dirdoc::DirDocError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_collection() -> TempDir {
    TempDir::new().unwrap()
}

fn read_counter(dir: &TempDir) -> String {
    fs::read_to_string(dir.path().join(SEQUENCE_FILE)).unwrap()
}

// =============================================================================
// Allocation Tests
// =============================================================================

#[test]
fn test_first_key_is_one() {
    let dir = setup_collection();
    let allocator = KeyAllocator::default();

    assert_eq!(allocator.next_key(dir.path()).unwrap(), "1");
    assert_eq!(read_counter(&dir), "1");
}

#[test]
fn test_keys_increase_sequentially() {
    let dir = setup_collection();
    let allocator = KeyAllocator::default();

    let keys: Vec<String> = (0..12).map(|_| allocator.next_key(dir.path()).unwrap()).collect();

    let expected: Vec<String> = (1..=12).map(|n| n.to_string()).collect();
    assert_eq!(keys, expected);
    assert_eq!(read_counter(&dir), "12");
}

#[test]
fn test_empty_counter_file_starts_at_one() {
    let dir = setup_collection();
    fs::write(dir.path().join(SEQUENCE_FILE), "").unwrap();

    let key = KeyAllocator::default().next_key(dir.path()).unwrap();

    assert_eq!(key, "1");
}

#[test]
fn test_counter_continues_from_existing_value() {
    let dir = setup_collection();
    fs::write(dir.path().join(SEQUENCE_FILE), "41").unwrap();

    let key = KeyAllocator::default().next_key(dir.path()).unwrap();

    assert_eq!(key, "42");
    assert_eq!(read_counter(&dir), "42");
}

#[test]
fn test_counter_with_trailing_newline_accepted() {
    let dir = setup_collection();
    fs::write(dir.path().join(SEQUENCE_FILE), "7\n").unwrap();

    let key = KeyAllocator::default().next_key(dir.path()).unwrap();

    assert_eq!(key, "8");
    assert_eq!(read_counter(&dir), "8");
}

#[test]
fn test_corrupt_counter_is_an_error() {
    let dir = setup_collection();
    fs::write(dir.path().join(SEQUENCE_FILE), "seven").unwrap();

    let err = KeyAllocator::default().next_key(dir.path()).unwrap_err();

    match err {
        DirDocError::CorruptSequenceState { contents, .. } => assert_eq!(contents, "seven"),
        other => panic!("unexpected error: {:?}", other),
    }
    // Not reset
    assert_eq!(read_counter(&dir), "seven");
}

#[test]
fn test_negative_counter_is_an_error() {
    let dir = setup_collection();
    fs::write(dir.path().join(SEQUENCE_FILE), "-3").unwrap();

    let result = KeyAllocator::default().next_key(dir.path());

    assert!(matches!(result, Err(DirDocError::CorruptSequenceState { .. })));
}

#[test]
fn test_overflowing_counter_is_an_error() {
    let dir = setup_collection();
    fs::write(dir.path().join(SEQUENCE_FILE), u64::MAX.to_string()).unwrap();

    let result = KeyAllocator::default().next_key(dir.path());

    assert!(matches!(result, Err(DirDocError::CorruptSequenceState { .. })));
}

#[test]
fn test_existing_document_directories_are_skipped() {
    let dir = setup_collection();
    fs::create_dir(dir.path().join("1")).unwrap();
    fs::create_dir(dir.path().join("2")).unwrap();

    let allocator = KeyAllocator::default();

    assert_eq!(allocator.next_key(dir.path()).unwrap(), "3");
    assert_eq!(allocator.next_key(dir.path()).unwrap(), "4");
}

#[test]
fn test_current_reports_last_issued() {
    let dir = setup_collection();
    let allocator = KeyAllocator::default();

    assert_eq!(allocator.current(dir.path()).unwrap(), None);

    allocator.next_key(dir.path()).unwrap();
    allocator.next_key(dir.path()).unwrap();

    assert_eq!(allocator.current(dir.path()).unwrap(), Some(2));
}

#[test]
fn test_unlocked_allocation_still_sequential() {
    let dir = setup_collection();
    let allocator = KeyAllocator::new(false, true);

    assert_eq!(allocator.next_key(dir.path()).unwrap(), "1");
    assert_eq!(allocator.next_key(dir.path()).unwrap(), "2");
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_locked_allocation_is_unique_across_threads() {
    let dir = Arc::new(setup_collection());
    let allocator = KeyAllocator::new(true, false);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let dir = Arc::clone(&dir);
            thread::spawn(move || {
                (0..25)
                    .map(|_| allocator.next_key(dir.path()).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut keys = HashSet::new();
    for handle in handles {
        for key in handle.join().unwrap() {
            assert!(keys.insert(key), "duplicate key issued");
        }
    }

    assert_eq!(keys.len(), 200);
    assert_eq!(read_counter(&dir), "200");
}
