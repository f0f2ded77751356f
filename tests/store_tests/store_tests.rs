//! Store Tests
//!
//! Tests verify:
//! - Basic CRUD operations
//! - Key and value validation
//! - Snapshot ordering
//! - Concurrent access patterns

use std::sync::Arc;
use std::thread;

use keyval::{KeyvalError, Store};

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_store_is_empty() {
    let store = Store::new();
    assert_eq!(store.len(), 0);
    assert!(store.is_empty());
}

#[test]
fn test_put_and_get() {
    let store = Store::new();

    store.put("key1", "value1").unwrap();

    assert_eq!(store.get("key1").unwrap(), "value1");
    assert_eq!(store.len(), 1);
}

#[test]
fn test_get_missing_key() {
    let store = Store::new();

    assert!(matches!(store.get("nope"), Err(KeyvalError::NoSuchKey)));
}

#[test]
fn test_put_overwrites_existing() {
    let store = Store::new();

    store.put("key1", "value1").unwrap();
    store.put("key1", "value2").unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(store.get("key1").unwrap(), "value2");
}

#[test]
fn test_delete_removes_key() {
    let store = Store::new();

    store.put("key1", "value1").unwrap();
    store.delete("key1").unwrap();

    assert!(store.is_empty());
    assert!(matches!(store.get("key1"), Err(KeyvalError::NoSuchKey)));
}

#[test]
fn test_delete_missing_key_is_ok() {
    let store = Store::new();

    store.delete("never-there").unwrap();

    assert!(store.is_empty());
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_empty_key_rejected() {
    let store = Store::new();

    assert!(matches!(store.put("", "v"), Err(KeyvalError::EmptyKey)));
    assert!(matches!(store.get(""), Err(KeyvalError::EmptyKey)));
    assert!(matches!(store.delete(""), Err(KeyvalError::EmptyKey)));
    assert!(store.is_empty());
}

#[test]
fn test_empty_value_rejected() {
    let store = Store::new();
    store.put("k", "old").unwrap();

    assert!(matches!(store.put("k", ""), Err(KeyvalError::EmptyValue)));

    // Failed put leaves the old value alone
    assert_eq!(store.get("k").unwrap(), "old");
}

// =============================================================================
// Snapshot Tests
// =============================================================================

#[test]
fn test_snapshot_sorted_by_key() {
    let store = Store::new();
    store.put("c", "3").unwrap();
    store.put("a", "1").unwrap();
    store.put("b", "2").unwrap();

    let snapshot: Vec<(String, String)> = store.snapshot().into_iter().collect();

    assert_eq!(
        snapshot,
        vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
            ("c".to_string(), "3".to_string()),
        ]
    );
}

#[test]
fn test_snapshot_is_a_copy() {
    let store = Store::new();
    store.put("a", "1").unwrap();

    let snapshot = store.snapshot();
    store.put("a", "2").unwrap();

    assert_eq!(snapshot["a"], "1");
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_readers_and_writers() {
    let store = Arc::new(Store::new());
    store.put("shared", "0").unwrap();

    let mut handles = Vec::new();
    for t in 0..4 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                store.put(&format!("t{}-{}", t, i), "v").unwrap();
                assert!(store.get("shared").is_ok());
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), 401);
}
