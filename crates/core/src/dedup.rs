//! Content deduplication cache.
//!
//! Holds the fingerprints of every payload that is either in flight or already
//! persisted. Reservation and confirmed membership share the same set: an
//! upload reserves its fingerprint at admission, and the reservation is either
//! released (admission or persistence failed) or simply left in place.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

/// Set of known content fingerprints, safe for concurrent use.
///
/// No method awaits; the lock is held only for the set operation itself.
#[derive(Debug, Default)]
pub struct DedupCache {
    known: RwLock<HashSet<String>>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically checks for `fingerprint` and inserts it if absent.
    ///
    /// Returns `true` when the caller now owns the reservation, `false` when the
    /// content is already known or in flight.
    pub fn try_reserve(&self, fingerprint: &str) -> bool {
        let mut known = self.known.write().unwrap_or_else(PoisonError::into_inner);
        if known.contains(fingerprint) {
            return false;
        }
        known.insert(fingerprint.to_string())
    }

    /// Drops a reservation so identical content can be admitted again.
    pub fn release(&self, fingerprint: &str) -> bool {
        self.known
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(fingerprint)
    }

    /// Marks a reservation as permanent. The entry already lives in the set.
    pub fn confirm(&self, fingerprint: &str) {
        debug_assert!(self.contains(fingerprint));
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.known
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.known.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds fingerprints of content persisted before this process started.
    pub fn seed<I, S>(&self, fingerprints: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut known = self.known.write().unwrap_or_else(PoisonError::into_inner);
        let before = known.len();
        known.extend(fingerprints.into_iter().map(Into::into));
        known.len() - before
    }
}
