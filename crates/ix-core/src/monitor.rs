//! The intersection admission monitor.
//!
//! One mutex guards the registry of vehicles currently inside the
//! intersection; one condition variable wakes waiters whenever a vehicle
//! leaves. A vehicle thread calls [`Intersection::enter`] before crossing
//! (blocking until its path conflicts with no occupant) and
//! [`Intersection::exit`] after crossing.
//!
//! # Protocol
//!
//! `enter` holds the lock while it scans the **entire** registry. If any
//! occupant conflicts it waits on the condvar and, once woken, re-scans
//! from scratch: the registry may have changed arbitrarily while the thread
//! was blocked, so pre-sleep knowledge is never reused. `exit` removes one
//! matching entry and wakes *every* waiter. Broadcast is deliberate:
//! computing which waiter's conflict set changed is no cheaper than letting
//! each waiter re-scan, and under-waking risks missed wakeups.
//!
//! The lock makes "scan, then conditionally insert" atomic, which is what
//! rules out two vehicles concurrently observing "no conflict" against each
//! other and both entering with incompatible paths.
//!
//! # Guarantees and non-guarantees
//!
//! - Safety: every pair of registry entries is conflict-free whenever the
//!   lock is not held mid-mutation.
//! - Liveness: every exit gives every waiter a chance to re-check. Nothing
//!   more: there is no FIFO or priority ordering among waiters, no timeout,
//!   and no cancellation of a pending `enter`.
//!
//! # Contract violations
//!
//! Exiting a path that was never entered, or shutting down a non-empty
//! intersection, panics. Callers are trusted collaborators and a mismatched
//! enter/exit pair is a bug, not a recoverable condition.
//!
//! # Loom
//!
//! Under `--cfg loom` the sync primitives come from `loom::sync` and the
//! interleaving tests at the bottom of this file exhaustively check small
//! schedules:
//!
//! ```bash
//! RUSTFLAGS="--cfg loom" cargo test -p ix-core --release
//! ```

#[cfg(loom)]
use loom::sync::{Condvar, Mutex};
#[cfg(not(loom))]
use std::sync::{Condvar, Mutex};

use crate::path::Path;

/// Multiset of paths currently inside the intersection.
///
/// Duplicates are legal (several vehicles from one origin may cross at
/// once) and interchangeable.
#[derive(Debug, Default)]
struct Registry {
    occupants: Vec<Path>,
}

impl Registry {
    /// True iff `path` conflicts with no current occupant.
    ///
    /// Always scans the whole registry; a partial scan would let a vehicle
    /// in after clearing only some of the occupants it can collide with.
    fn admits(&self, path: &Path) -> bool {
        self.occupants.iter().all(|o| !path.conflicts_with(o))
    }

    /// Remove one entry equal to `path`. Returns false if none is present.
    fn remove_one(&mut self, path: &Path) -> bool {
        match self.occupants.iter().position(|o| o == path) {
            Some(i) => {
                self.occupants.swap_remove(i);
                true
            }
            None => false,
        }
    }
}

/// The shared admission monitor for one four-way intersection.
///
/// Create it once before any vehicle thread starts, share it (typically via
/// `Arc`) with every vehicle thread, and [`shutdown`] it after all vehicle
/// threads have finished.
///
/// [`shutdown`]: Intersection::shutdown
#[derive(Debug)]
pub struct Intersection {
    registry: Mutex<Registry>,
    exited: Condvar,
}

impl Default for Intersection {
    fn default() -> Self {
        Self::new()
    }
}

impl Intersection {
    /// Create an empty intersection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            exited: Condvar::new(),
        }
    }

    /// Block until `path` can safely cross, then register it as an
    /// occupant.
    ///
    /// Returns once the vehicle is admitted. There is no bound on the
    /// number of wait/re-scan rounds; forward progress depends on current
    /// occupants eventually calling [`exit`].
    ///
    /// [`exit`]: Intersection::exit
    pub fn enter(&self, path: Path) {
        let mut registry = self.registry.lock().unwrap();
        while !registry.admits(&path) {
            // Woken by a broadcast from `exit`. Re-scan from scratch.
            registry = self.exited.wait(registry).unwrap();
        }
        registry.occupants.push(path);
    }

    /// Remove one occupant equal to `path` and wake every waiter.
    ///
    /// Never blocks beyond the bounded critical section.
    ///
    /// # Panics
    ///
    /// Panics if no occupant equals `path`: the caller is exiting a
    /// crossing it never entered.
    pub fn exit(&self, path: Path) {
        let mut registry = self.registry.lock().unwrap();
        assert!(
            registry.remove_one(&path),
            "vehicle exited path {path} which is not in the intersection"
        );
        self.exited.notify_all();
    }

    /// Snapshot of the current occupant multiset.
    pub fn occupants(&self) -> Vec<Path> {
        self.registry.lock().unwrap().occupants.clone()
    }

    /// Number of vehicles currently inside.
    pub fn len(&self) -> usize {
        self.registry.lock().unwrap().occupants.len()
    }

    /// True iff no vehicle is inside.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tear the intersection down.
    ///
    /// Taking `self` by value proves no thread can still be blocked in
    /// [`enter`]: a waiter would hold a reference, and the borrow checker
    /// (or `Arc::try_unwrap` at the call site) forbids that.
    ///
    /// # Panics
    ///
    /// Panics if any vehicle is still inside — a leaked or mismatched
    /// enter/exit pair.
    ///
    /// [`enter`]: Intersection::enter
    pub fn shutdown(self) {
        let registry = self.registry.lock().unwrap();
        assert!(
            registry.occupants.is_empty(),
            "intersection shut down with {} vehicle(s) still inside: {:?}",
            registry.occupants.len(),
            registry.occupants
        );
    }
}


/// Loom tests — exhaustively check small interleavings.
#[cfg(loom)]
mod loom_tests {
    use super::*;
    use crate::path::Direction::{East, North, South};
    use loom::sync::atomic::{AtomicUsize, Ordering};
    use loom::sync::Arc;
    use loom::thread;

    #[test]
    fn test_conflicting_paths_are_mutually_excluded() {
        loom::model(|| {
            let ix = Arc::new(Intersection::new());
            // Shared destination: these two may never be inside together.
            let inside = Arc::new(AtomicUsize::new(0));

            let mut handles = Vec::new();
            for path in [Path::new(North, South), Path::new(East, South)] {
                let ix = Arc::clone(&ix);
                let inside = Arc::clone(&inside);
                handles.push(thread::spawn(move || {
                    ix.enter(path);
                    let occupancy = inside.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(occupancy, 0, "conflicting paths inside together");
                    inside.fetch_sub(1, Ordering::SeqCst);
                    ix.exit(path);
                }));
            }
            for h in handles {
                h.join().unwrap();
            }

            assert!(ix.is_empty());
        });
    }

    #[test]
    fn test_compatible_paths_both_complete() {
        loom::model(|| {
            let ix = Arc::new(Intersection::new());

            let mut handles = Vec::new();
            // Exact reverses: neither may ever block the other.
            for path in [Path::new(North, South), Path::new(South, North)] {
                let ix = Arc::clone(&ix);
                handles.push(thread::spawn(move || {
                    ix.enter(path);
                    ix.exit(path);
                }));
            }
            for h in handles {
                h.join().unwrap();
            }

            assert!(ix.is_empty());
        });
    }

    #[test]
    fn test_exit_wakes_blocked_waiter() {
        loom::model(|| {
            let ix = Arc::new(Intersection::new());
            let a = Path::new(North, South);
            let b = Path::new(East, South);

            ix.enter(a);

            let ix2 = Arc::clone(&ix);
            let waiter = thread::spawn(move || {
                ix2.enter(b);
                ix2.exit(b);
            });

            ix.exit(a);
            waiter.join().unwrap();

            assert!(ix.is_empty());
        });
    }
}
