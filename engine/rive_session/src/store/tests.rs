//! Tests for the variable store.

#![allow(
    clippy::unwrap_used,
    reason = "test code uses unwrap for concise assertions"
)]

use super::*;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

#[test]
fn sessions_are_isolated() {
    let store = VariableStore::new();
    store.set("alice", "name", "A");
    assert_eq!(store.get("bob", "name"), None);
    assert_eq!(store.get("alice", "name"), Some("A".to_string()));
}

#[test]
fn get_does_not_create_sessions() {
    let store = VariableStore::new();
    assert_eq!(store.get("ghost", "anything"), None);
    assert!(!store.has_session("ghost"));
    assert_eq!(store.session_count(), 0);
}

#[test]
fn set_creates_session_lazily_and_overwrites() {
    let store = VariableStore::new();
    store.set("alice", "mood", "happy");
    store.set("alice", "mood", "sad");
    assert!(store.has_session("alice"));
    assert_eq!(store.session_count(), 1);
    assert_eq!(store.get("alice", "mood").as_deref(), Some("sad"));
}

#[test]
fn snapshot_copies_all_variables() {
    let store = VariableStore::new();
    store.set("alice", "a", "1");
    store.set("alice", "b", "2");
    let snapshot = store.snapshot("alice").unwrap();
    store.set("alice", "c", "3");

    let mut keys: Vec<_> = snapshot.keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(store.snapshot("nobody"), None);
}

#[test]
fn remove_and_purge() {
    let store = VariableStore::new();
    store.set("alice", "name", "A");
    assert_eq!(store.remove("alice", "name").as_deref(), Some("A"));
    assert_eq!(store.remove("alice", "name"), None);
    assert!(store.purge("alice"));
    assert!(!store.purge("alice"));
    assert!(!store.has_session("alice"));
}

#[test]
fn turn_creates_session_and_returns_value() {
    let store = VariableStore::new();
    let out = store.with_turn("carol", || {
        store.set("carol", "seen", "yes");
        42
    });
    assert_eq!(out, 42);
    assert_eq!(store.get("carol", "seen").as_deref(), Some("yes"));
}

#[test]
fn turns_of_one_session_are_serialized() {
    let store = Arc::new(VariableStore::new());
    let active = Arc::new(AtomicUsize::new(0));
    let overlaps = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let active = Arc::clone(&active);
            let overlaps = Arc::clone(&overlaps);
            thread::spawn(move || {
                for _ in 0..5 {
                    store.with_turn("shared", || {
                        if active.fetch_add(1, Ordering::SeqCst) > 0 {
                            overlaps.fetch_add(1, Ordering::SeqCst);
                        }
                        thread::sleep(Duration::from_millis(1));
                        active.fetch_sub(1, Ordering::SeqCst);
                    });
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
}

#[test]
fn purge_during_a_turn_keeps_later_turns_waiting() {
    let store = Arc::new(VariableStore::new());
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let turn = |store: Arc<VariableStore>, active: Arc<AtomicUsize>, peak: Arc<AtomicUsize>| {
        thread::spawn(move || {
            store.with_turn("alice", || {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(150));
                active.fetch_sub(1, Ordering::SeqCst);
            });
        })
    };

    store.set("alice", "name", "A");
    let first = turn(Arc::clone(&store), Arc::clone(&active), Arc::clone(&peak));
    thread::sleep(Duration::from_millis(40));
    assert!(store.purge("alice"));
    let second = turn(Arc::clone(&store), Arc::clone(&active), Arc::clone(&peak));
    first.join().unwrap();
    second.join().unwrap();

    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert_eq!(store.get("alice", "name"), None);
}

#[test]
fn turn_of_one_session_does_not_block_another() {
    let store = Arc::new(VariableStore::new());
    let other = Arc::clone(&store);
    store.with_turn("alice", || {
        // Another thread can run a full turn for bob while alice's is held.
        thread::spawn(move || other.with_turn("bob", || other.set("bob", "x", "1")))
            .join()
            .unwrap();
    });
    assert_eq!(store.get("bob", "x").as_deref(), Some("1"));
}

#[test]
fn concurrent_writers_to_distinct_sessions() {
    let store = Arc::new(VariableStore::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let id = format!("user{i}");
                for n in 0..50 {
                    store.set(&id, "count", &n.to_string());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(store.session_count(), 8);
    for i in 0..8 {
        assert_eq!(store.get(&format!("user{i}"), "count").as_deref(), Some("49"));
    }
}
