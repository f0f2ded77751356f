//! Tests for the SQLite Backend
//!
//! These tests verify:
//! - Table creation on first open, and only then
//! - Database-assigned ids
//! - Empty strings stored faithfully
//! - Row decode failures abort the read

use std::path::PathBuf;

use keyval::wal::{collect_events, Event, EventKind, SqliteBackend, WalBackend};
use keyval::KeyvalError;
use rusqlite::Connection;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_db() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("wal.db");
    (temp_dir, db_path)
}

fn column_names(path: &PathBuf) -> Vec<String> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn.prepare("PRAGMA table_info(events)").unwrap();
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    names
}

// =============================================================================
// Schema Tests
// =============================================================================

#[test]
fn test_open_creates_events_table() {
    let (_temp, db_path) = setup_temp_db();

    let backend = SqliteBackend::open(&db_path).unwrap();

    assert!(db_path.exists());
    assert_eq!(backend.last_event_id(), 0);
    assert_eq!(
        column_names(&db_path),
        vec!["event_id", "event_type", "event_key", "event_value"]
    );
}

#[test]
fn test_open_creates_parent_dirs() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("a").join("b").join("wal.db");

    SqliteBackend::open(&db_path).unwrap();

    assert!(db_path.exists());
}

#[test]
fn test_reopen_keeps_existing_rows() {
    let (_temp, db_path) = setup_temp_db();

    {
        let mut backend = SqliteBackend::open(&db_path).unwrap();
        backend.append(&Event::put("a", "1")).unwrap();
        backend.append(&Event::put("b", "2")).unwrap();
    }

    // Second open must not recreate the table
    {
        let mut backend = SqliteBackend::open(&db_path).unwrap();
        assert_eq!(collect_events(&mut backend).unwrap().len(), 2);
    }

    let mut backend = SqliteBackend::open(&db_path).unwrap();
    let events = collect_events(&mut backend).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], Event::put("a", "1").with_id(1));
    assert_eq!(events[1], Event::put("b", "2").with_id(2));
}

// =============================================================================
// Append Tests
// =============================================================================

#[test]
fn test_append_assigns_database_ids() {
    let mut backend = SqliteBackend::open_in_memory().unwrap();

    let id1 = backend.append(&Event::put("a", "1").with_id(50)).unwrap();
    let id2 = backend.append(&Event::put("b", "2")).unwrap();
    let id3 = backend.append(&Event::delete("a")).unwrap();

    assert_eq!((id1, id2, id3), (1, 2, 3));
    assert_eq!(backend.last_event_id(), 3);
}

#[test]
fn test_append_after_reopen_continues_without_read() {
    let (_temp, db_path) = setup_temp_db();
    {
        let mut backend = SqliteBackend::open(&db_path).unwrap();
        backend.append(&Event::put("a", "1")).unwrap();
        backend.append(&Event::put("b", "2")).unwrap();
    }

    let mut backend = SqliteBackend::open(&db_path).unwrap();
    let id = backend.append(&Event::put("c", "3")).unwrap();

    assert_eq!(id, 3);
}

#[test]
fn test_empty_value_stored_faithfully() {
    let (_temp, db_path) = setup_temp_db();
    SqliteBackend::open(&db_path)
        .unwrap()
        .append(&Event::put("x", ""))
        .unwrap();

    let events = collect_events(&mut SqliteBackend::open(&db_path).unwrap()).unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].value, "");
}

#[test]
fn test_delete_value_preserved() {
    let mut backend = SqliteBackend::open_in_memory().unwrap();
    backend.append(&Event::delete("a")).unwrap();
    backend
        .append(&Event {
            id: 0,
            kind: EventKind::Delete,
            key: "b".to_string(),
            value: "ignored".to_string(),
        })
        .unwrap();

    let events = collect_events(&mut backend).unwrap();

    assert_eq!(events[0].value, "");
    assert_eq!(events[1].value, "ignored");
}

#[test]
fn test_separators_round_trip() {
    let mut backend = SqliteBackend::open_in_memory().unwrap();
    backend.append(&Event::put("a\tb", "line1\nline2")).unwrap();

    let events = collect_events(&mut backend).unwrap();

    assert_eq!(events[0].key, "a\tb");
    assert_eq!(events[0].value, "line1\nline2");
}

// =============================================================================
// Read Tests
// =============================================================================

#[test]
fn test_read_empty_table() {
    let mut backend = SqliteBackend::open_in_memory().unwrap();

    assert!(collect_events(&mut backend).unwrap().is_empty());
}

#[test]
fn test_read_orders_by_id() {
    let (_temp, db_path) = setup_temp_db();
    SqliteBackend::open(&db_path).unwrap();

    {
        let conn = Connection::open(&db_path).unwrap();
        for (id, key) in [(5, "e"), (2, "b"), (9, "i")] {
            conn.execute(
                "INSERT INTO events (event_id, event_type, event_key, event_value) VALUES (?1, 1, ?2, 'v')",
                rusqlite::params![id, key],
            )
            .unwrap();
        }
    }

    let mut backend = SqliteBackend::open(&db_path).unwrap();
    let events = collect_events(&mut backend).unwrap();

    assert_eq!(events.iter().map(|e| e.id).collect::<Vec<_>>(), vec![2, 5, 9]);
    assert_eq!(backend.last_event_id(), 9);
}

#[test]
fn test_unknown_event_type_aborts_read() {
    let (_temp, db_path) = setup_temp_db();
    {
        let mut backend = SqliteBackend::open(&db_path).unwrap();
        backend.append(&Event::put("a", "1")).unwrap();
    }
    {
        let conn = Connection::open(&db_path).unwrap();
        conn.execute(
            "INSERT INTO events (event_type, event_key, event_value) VALUES (7, 'b', '2')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO events (event_type, event_key, event_value) VALUES (1, 'c', '3')",
            [],
        )
        .unwrap();
    }

    let mut backend = SqliteBackend::open(&db_path).unwrap();
    let mut seen = Vec::new();
    let result = backend.read_all(&mut |event| {
        seen.push(event);
        Ok(())
    });

    assert!(matches!(result, Err(KeyvalError::WalDecode(_))));
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].key, "a");
}

#[test]
fn test_wrong_column_type_aborts_read() {
    let (_temp, db_path) = setup_temp_db();
    SqliteBackend::open(&db_path).unwrap();
    {
        let conn = Connection::open(&db_path).unwrap();
        conn.execute(
            "INSERT INTO events (event_type, event_key, event_value) VALUES ('put', 'a', '1')",
            [],
        )
        .unwrap();
    }

    let mut backend = SqliteBackend::open(&db_path).unwrap();
    let result = collect_events(&mut backend);

    assert!(matches!(result, Err(KeyvalError::Sqlite(_))));
}
