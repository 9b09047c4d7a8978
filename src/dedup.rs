// 🔍 Deduplication - Collapse repeated entities before loading
//
// The split extract files repeat records, so the accumulated batch can hold
// the same child entity many times. Equality is structural over the full
// field tuple; entries differing in any single field are kept apart.

use std::collections::HashSet;
use std::hash::Hash;

use crate::entities::Blank;

/// Remove exact repeats and all-blank entries from an accumulated list.
///
/// First occurrence wins; relative order of survivors is preserved.
pub fn dedupe<T>(entries: Vec<T>) -> Vec<T>
where
    T: Clone + Eq + Hash + Blank,
{
    let mut seen: HashSet<T> = HashSet::with_capacity(entries.len());
    entries
        .into_iter()
        .filter(|entry| !entry.is_blank())
        .filter(|entry| seen.insert(entry.clone()))
        .collect()
}
