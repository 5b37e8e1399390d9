//! Intentionally incorrect admission policies.
//!
//! These exist to prove the property checkers and the stress harness catch
//! real violations; they must never be used outside tests. Each one keeps
//! the monitor's lock/condvar shape but breaks the admission scan in a way
//! that has actually been observed in the wild.

use std::sync::{Condvar, Mutex};

use crate::path::Path;

/// Admits a vehicle after checking it against only the **first** occupant.
///
/// This is the classic partial-scan bug: the admission loop stops at the
/// first registry entry instead of scanning all of them, so a vehicle that
/// is compatible with the front of the list slips in past a conflicting
/// occupant further down.
#[derive(Default)]
pub struct FirstEntryOnlyIntersection {
    registry: Mutex<Vec<Path>>,
    exited: Condvar,
}

impl FirstEntryOnlyIntersection {
    /// Create an empty intersection with the broken admission policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Block only while `path` conflicts with the first occupant.
    pub fn enter(&self, path: Path) {
        let mut registry = self.registry.lock().unwrap();
        loop {
            match registry.first() {
                // BUG: occupants beyond the first are never checked.
                Some(first) if path.conflicts_with(first) => {
                    registry = self.exited.wait(registry).unwrap();
                }
                _ => break,
            }
        }
        registry.push(path);
    }

    /// Remove one occupant equal to `path` and wake every waiter.
    ///
    /// # Panics
    ///
    /// Panics if no occupant equals `path`.
    pub fn exit(&self, path: Path) {
        let mut registry = self.registry.lock().unwrap();
        let i = registry
            .iter()
            .position(|o| *o == path)
            .unwrap_or_else(|| panic!("vehicle exited path {path} which is not in the intersection"));
        registry.swap_remove(i);
        self.exited.notify_all();
    }

    /// Snapshot of the current occupant multiset.
    pub fn occupants(&self) -> Vec<Path> {
        self.registry.lock().unwrap().clone()
    }
}

/// Admits every vehicle unconditionally.
///
/// The degenerate policy: no scan at all. Useful as the loudest possible
/// violation source when tuning checker output.
#[derive(Default)]
pub struct NoScanIntersection {
    registry: Mutex<Vec<Path>>,
    exited: Condvar,
}

impl NoScanIntersection {
    /// Create an empty intersection with no admission control.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` immediately, never blocking.
    pub fn enter(&self, path: Path) {
        self.registry.lock().unwrap().push(path);
    }

    /// Remove one occupant equal to `path`.
    ///
    /// # Panics
    ///
    /// Panics if no occupant equals `path`.
    pub fn exit(&self, path: Path) {
        let mut registry = self.registry.lock().unwrap();
        let i = registry
            .iter()
            .position(|o| *o == path)
            .unwrap_or_else(|| panic!("vehicle exited path {path} which is not in the intersection"));
        registry.swap_remove(i);
        self.exited.notify_all();
    }

    /// Snapshot of the current occupant multiset.
    pub fn occupants(&self) -> Vec<Path> {
        self.registry.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Direction::{East, North, South, West};

    #[test]
    fn test_partial_scan_admits_a_conflicting_vehicle() {
        let ix = FirstEntryOnlyIntersection::new();

        // Legitimate co-occupancy: same origin, first one a right turn.
        ix.enter(Path::new(North, West));
        ix.enter(Path::new(North, South));

        // Compatible with the first occupant, conflicts with the second.
        // A full scan would block here; the partial scan admits it.
        let intruder = Path::new(East, South);
        assert!(intruder.compatible_with(&Path::new(North, West)));
        assert!(intruder.conflicts_with(&Path::new(North, South)));
        ix.enter(intruder);

        let occupants = ix.occupants();
        let violation = occupants.iter().enumerate().any(|(i, a)| {
            occupants[i + 1..].iter().any(|b| a.conflicts_with(b))
        });
        assert!(violation, "partial scan failed to produce a violation");
    }

    #[test]
    fn test_no_scan_admits_anything() {
        let ix = NoScanIntersection::new();
        ix.enter(Path::new(North, South));
        ix.enter(Path::new(East, South));
        let occupants = ix.occupants();
        assert!(occupants[0].conflicts_with(&occupants[1]));
    }
}
