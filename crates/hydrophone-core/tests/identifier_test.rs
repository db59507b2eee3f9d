//! Identifier uniqueness under concurrent generation.

use std::collections::HashSet;
use std::thread;

use hydrophone_core::validation::{validate_duid, validate_fuid};
use hydrophone_core::{new_duid, new_fuid};

const THREADS: usize = 8;
const PER_THREAD: usize = 10_000;

fn generate_concurrently(generate: fn() -> String) -> Vec<String> {
    let handles: Vec<_> = (0..THREADS)
        .map(|_| thread::spawn(move || (0..PER_THREAD).map(|_| generate()).collect::<Vec<_>>()))
        .collect();
    handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect()
}

#[test]
fn test_concurrent_duids_are_distinct_and_valid() {
    let ids = generate_concurrently(new_duid);
    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), THREADS * PER_THREAD);
    for id in ids.iter().take(100) {
        validate_duid(id).unwrap();
    }
}

#[test]
fn test_concurrent_fuids_are_distinct_and_valid() {
    let ids = generate_concurrently(new_fuid);
    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), THREADS * PER_THREAD);
    for id in ids.iter().take(100) {
        validate_fuid(id).unwrap();
    }
}

#[test]
fn test_duids_sort_in_generation_order() {
    let ids: Vec<String> = (0..1_000).map(|_| new_duid()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}
