//! Thread-per-vehicle stress harness for intersection implementations.
//!
//! The harness spawns one OS thread per simulated vehicle. Each thread
//! repeatedly picks a random valid path, enters the intersection, checks
//! the occupant snapshot for conflicts, holds the crossing for a bounded
//! random delay, and exits. All randomness derives from a single seed, so
//! the same seed drives the same sequence of paths and delays per thread.
//!
//! The implementation under test has no harness knowledge: it only has to
//! satisfy [`DstTestableIntersection`]. After the run, the recorded
//! history goes through the full [`CrossingPropertyChecker`].
//!
//! # History ordering
//!
//! For the replay check to be sound against real thread timing, events are
//! recorded so the log order is consistent with admission order wherever it
//! matters: admissions are recorded while the vehicle is still inside, and
//! exits are recorded *before* the monitor removal they describe. Any pair
//! of events whose log order could be inverted relative to real time
//! belongs to vehicles that were provably inside together, which the
//! predicate's symmetry makes harmless.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde::Serialize;

use ix_core::buggy::{FirstEntryOnlyIntersection, NoScanIntersection};
use ix_core::{
    CrossingHistory, CrossingProperties, CrossingPropertyChecker, Direction, Intersection, Path,
    PropertyChecker,
};

use crate::random::DeterministicRng;

/// Trait an intersection implementation must satisfy to be stress-tested.
///
/// MINIMAL interface — no DST knowledge in the implementation.
pub trait DstTestableIntersection: Send + Sync + 'static {
    /// Block until the path may safely cross, then register it.
    fn enter(&self, path: Path);

    /// Deregister one occupant equal to the path and wake waiters.
    fn exit(&self, path: Path);

    /// Snapshot of the current occupant multiset.
    fn occupants(&self) -> Vec<Path>;
}

impl DstTestableIntersection for Intersection {
    fn enter(&self, path: Path) {
        Intersection::enter(self, path);
    }

    fn exit(&self, path: Path) {
        Intersection::exit(self, path);
    }

    fn occupants(&self) -> Vec<Path> {
        Intersection::occupants(self)
    }
}

impl DstTestableIntersection for FirstEntryOnlyIntersection {
    fn enter(&self, path: Path) {
        FirstEntryOnlyIntersection::enter(self, path);
    }

    fn exit(&self, path: Path) {
        FirstEntryOnlyIntersection::exit(self, path);
    }

    fn occupants(&self) -> Vec<Path> {
        FirstEntryOnlyIntersection::occupants(self)
    }
}

impl DstTestableIntersection for NoScanIntersection {
    fn enter(&self, path: Path) {
        NoScanIntersection::enter(self, path);
    }

    fn exit(&self, path: Path) {
        NoScanIntersection::exit(self, path);
    }

    fn occupants(&self) -> Vec<Path> {
        NoScanIntersection::occupants(self)
    }
}

/// Configuration for the stress harness.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Number of vehicle threads.
    pub vehicles_count: usize,
    /// Crossings each vehicle performs.
    pub crossings_per_vehicle: u64,
    /// Upper bound on the random in-intersection delay, in microseconds.
    /// Zero disables the delay.
    pub crossing_delay_max_us: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            vehicles_count: 8,
            crossings_per_vehicle: 50,
            crossing_delay_max_us: 50,
        }
    }
}

impl HarnessConfig {
    /// Configuration for quick testing.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            vehicles_count: 4,
            crossings_per_vehicle: 10,
            crossing_delay_max_us: 10,
        }
    }

    /// Configuration for stress testing.
    #[must_use]
    pub fn stress() -> Self {
        Self {
            vehicles_count: 16,
            crossings_per_vehicle: 200,
            crossing_delay_max_us: 100,
        }
    }
}

/// Result of a harness run.
#[derive(Debug, Clone, Serialize)]
pub struct HarnessResult {
    /// Seed used, for reproduction via `DST_SEED=<seed>`.
    pub seed: u64,
    /// Vehicle threads spawned.
    pub vehicles_count: usize,
    /// Completed crossings across all vehicles.
    pub crossings_count: u64,
    /// Largest occupant multiset observed.
    pub max_concurrent_count: usize,
    /// Whether every invariant held.
    pub all_invariants_held: bool,
    /// First violation (if any).
    pub first_violation: Option<String>,
}

impl HarnessResult {
    /// Format for display.
    #[must_use]
    pub fn format(&self) -> String {
        let status = if self.all_invariants_held {
            "PASS"
        } else {
            "FAIL"
        };

        let mut result = format!(
            "[{}] DST_SEED={} vehicles={} crossings={} max_concurrent={}",
            status, self.seed, self.vehicles_count, self.crossings_count, self.max_concurrent_count
        );

        if let Some(ref violation) = self.first_violation {
            result.push_str(&format!("\n  Violation: {violation}"));
        }

        result
    }
}

/// Shared event log with a global step counter.
///
/// Implements [`CrossingProperties`] by replaying its own log, so the full
/// checker can run over it after the threads join.
#[derive(Default)]
struct Tracker {
    history: Mutex<CrossingHistory>,
    step: AtomicU64,
}

impl Tracker {
    fn record_enter(&self, thread_id: u64, path: Path) {
        let step = self.step.fetch_add(1, Ordering::Relaxed) + 1;
        self.history.lock().unwrap().record_enter(thread_id, path, step);
    }

    fn record_exit(&self, thread_id: u64, path: Path) {
        let step = self.step.fetch_add(1, Ordering::Relaxed) + 1;
        self.history.lock().unwrap().record_exit(thread_id, path, step);
    }
}

impl CrossingProperties for Tracker {
    fn entered_paths(&self) -> Vec<Path> {
        let history = self.history.lock().unwrap();
        history
            .events
            .iter()
            .filter(|e| e.op == ix_core::CrossingOp::Enter)
            .map(|e| e.path)
            .collect()
    }

    fn exited_paths(&self) -> Vec<Path> {
        let history = self.history.lock().unwrap();
        history
            .events
            .iter()
            .filter(|e| e.op == ix_core::CrossingOp::Exit)
            .map(|e| e.path)
            .collect()
    }

    fn current_occupants(&self) -> Vec<Path> {
        let history = self.history.lock().unwrap();
        let mut occupants: Vec<Path> = Vec::new();
        for event in &history.events {
            match event.op {
                ix_core::CrossingOp::Enter => occupants.push(event.path),
                ix_core::CrossingOp::Exit => {
                    if let Some(i) = occupants.iter().position(|o| *o == event.path) {
                        occupants.swap_remove(i);
                    }
                }
            }
        }
        occupants
    }

    fn history(&self) -> CrossingHistory {
        self.history.lock().unwrap().clone()
    }
}

/// Stress harness driving one intersection implementation.
pub struct CrossingHarness<I> {
    intersection: Arc<I>,
    config: HarnessConfig,
    seed: u64,
}

impl<I: DstTestableIntersection> CrossingHarness<I> {
    /// Create a harness around an implementation with the given seed.
    pub fn new(intersection: I, seed: u64, config: HarnessConfig) -> Self {
        debug_assert!(seed != 0, "seed should not be zero");
        debug_assert!(config.vehicles_count > 0, "must have at least one vehicle");
        Self {
            intersection: Arc::new(intersection),
            config,
            seed,
        }
    }

    /// Seed used by this harness.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run the stress test and check every invariant.
    pub fn run(self) -> HarnessResult {
        let tracker = Arc::new(Tracker::default());
        let stopped = Arc::new(AtomicBool::new(false));
        let violation: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let crossings_count = Arc::new(AtomicU64::new(0));
        let max_concurrent = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(self.config.vehicles_count);
        for vehicle in 0..self.config.vehicles_count {
            let intersection = Arc::clone(&self.intersection);
            let tracker = Arc::clone(&tracker);
            let stopped = Arc::clone(&stopped);
            let violation = Arc::clone(&violation);
            let crossings_count = Arc::clone(&crossings_count);
            let max_concurrent = Arc::clone(&max_concurrent);
            let config = self.config.clone();
            // Per-thread stream derived from the run seed.
            let mut rng = DeterministicRng::new(self.seed.wrapping_add(vehicle as u64 + 1));

            handles.push(thread::spawn(move || {
                let thread_id = vehicle as u64;
                for _ in 0..config.crossings_per_vehicle {
                    if stopped.load(Ordering::Acquire) {
                        break;
                    }

                    let path = random_path(&mut rng);
                    intersection.enter(path);
                    tracker.record_enter(thread_id, path);

                    // Direct safety probe: the snapshot we are part of must
                    // be pairwise conflict-free.
                    let snapshot = intersection.occupants();
                    max_concurrent.fetch_max(snapshot.len(), Ordering::Relaxed);
                    if let Some((a, b)) = first_conflicting_pair(&snapshot) {
                        stop_with_violation(
                            &stopped,
                            &violation,
                            format!(
                                "thread {thread_id}: occupant snapshot holds conflicting paths {a} and {b}: {snapshot:?}"
                            ),
                        );
                        // Fall through: the exit below must still happen or
                        // waiters on other policies would hang forever.
                    }

                    if config.crossing_delay_max_us > 0 {
                        let us = rng.gen_range(0..config.crossing_delay_max_us);
                        thread::sleep(Duration::from_micros(us));
                    }

                    // Recorded before the removal so no admission this exit
                    // enables can be logged ahead of it.
                    tracker.record_exit(thread_id, path);
                    intersection.exit(path);
                    crossings_count.fetch_add(1, Ordering::Relaxed);
                }
            }));
        }

        for handle in handles {
            handle.join().expect("vehicle thread panicked");
        }

        // The run is over; every admitted vehicle exited, so the
        // intersection must be empty.
        let leftover = self.intersection.occupants();
        if !leftover.is_empty() {
            stop_with_violation(
                &stopped,
                &violation,
                format!("intersection not empty after run: {leftover:?}"),
            );
        }

        // Full invariant sweep over the recorded history.
        let checker = CrossingPropertyChecker::new(&*tracker).with_seed(self.seed);
        if violation.lock().unwrap().is_none() {
            if let Some(v) = checker.first_violation() {
                stop_with_violation(&stopped, &violation, v);
            }
        }

        let first_violation = violation.lock().unwrap().clone();
        HarnessResult {
            seed: self.seed,
            vehicles_count: self.config.vehicles_count,
            crossings_count: crossings_count.load(Ordering::Relaxed),
            max_concurrent_count: max_concurrent.load(Ordering::Relaxed),
            all_invariants_held: first_violation.is_none(),
            first_violation,
        }
    }
}

fn stop_with_violation(
    stopped: &AtomicBool,
    violation: &Mutex<Option<String>>,
    message: String,
) {
    let mut guard = violation.lock().unwrap();
    if guard.is_none() {
        *guard = Some(message);
    }
    stopped.store(true, Ordering::Release);
}

/// Pick a uniformly random valid path.
fn random_path(rng: &mut DeterministicRng) -> Path {
    let origin = Direction::ALL[rng.gen_range(0..4) as usize];
    loop {
        let destination = Direction::ALL[rng.gen_range(0..4) as usize];
        if destination != origin {
            return Path::new(origin, destination);
        }
    }
}

/// First conflicting pair in a snapshot, if any.
fn first_conflicting_pair(snapshot: &[Path]) -> Option<(Path, Path)> {
    for (i, a) in snapshot.iter().enumerate() {
        for b in &snapshot[i + 1..] {
            if a.conflicts_with(b) {
                return Some((*a, *b));
            }
        }
    }
    None
}
