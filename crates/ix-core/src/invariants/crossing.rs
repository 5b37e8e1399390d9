//! Intersection crossing invariants.
//!
//! | Property | Description |
//! |----------|-------------|
//! | NoConflictingOccupants | No two current occupants can collide |
//! | ConflictSymmetry | `conflicts` is symmetric over all valid pairs |
//! | BalancedCrossings | Every entered vehicle is inside or has exited |
//! | AdmissionSafety | Every recorded admission was conflict-free |
//!
//! The first three are checked against the structure's current state; the
//! fourth replays the full crossing history against a model registry, which
//! is what catches admission policies that scan only part of the registry
//! (the admitted vehicle conflicts with an occupant further down the list).

use crate::counterexample::{Counterexample, StateSnapshot, ThreadAction};
use crate::path::Path;
use crate::property::{PropertyChecker, PropertyResult};

/// State an intersection implementation must expose for property checking.
///
/// Implementations provide access to their tracked state; the checker
/// verifies invariants against it. Methods return owned data to avoid
/// lifetime entanglement with internal mutexes.
pub trait CrossingProperties {
    /// Every path admitted so far, in admission order.
    fn entered_paths(&self) -> Vec<Path>;

    /// Every path that has exited so far.
    fn exited_paths(&self) -> Vec<Path>;

    /// Current occupant multiset.
    fn current_occupants(&self) -> Vec<Path>;

    /// Full enter/exit history for replay checking.
    fn history(&self) -> CrossingHistory;
}

/// History of enter/exit events in observation order.
#[derive(Debug, Clone, Default)]
pub struct CrossingHistory {
    /// Recorded events, steps strictly increasing.
    pub events: Vec<CrossingEvent>,
}

/// A single recorded crossing event.
#[derive(Debug, Clone)]
pub struct CrossingEvent {
    /// Vehicle thread that performed the operation.
    pub thread_id: u64,
    /// Global step number for ordering.
    pub step: u64,
    /// Operation kind.
    pub op: CrossingOp,
    /// Path involved.
    pub path: Path,
}

/// Kind of crossing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingOp {
    Enter,
    Exit,
}

impl CrossingHistory {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an admission.
    pub fn record_enter(&mut self, thread_id: u64, path: Path, step: u64) {
        debug_assert!(step > 0, "step must be positive");
        self.events.push(CrossingEvent {
            thread_id,
            step,
            op: CrossingOp::Enter,
            path,
        });
    }

    /// Record an exit.
    pub fn record_exit(&mut self, thread_id: u64, path: Path, step: u64) {
        debug_assert!(step > 0, "step must be positive");
        self.events.push(CrossingEvent {
            thread_id,
            step,
            op: CrossingOp::Exit,
            path,
        });
    }
}

/// Property checker for intersection implementations.
pub struct CrossingPropertyChecker<'a, T: CrossingProperties> {
    crossing: &'a T,
    dst_seed: Option<u64>,
}

impl<'a, T: CrossingProperties> CrossingPropertyChecker<'a, T> {
    /// Create a new checker for the given intersection state.
    #[must_use]
    pub fn new(crossing: &'a T) -> Self {
        Self {
            crossing,
            dst_seed: None,
        }
    }

    /// Set the DST seed for counterexample reproduction.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        debug_assert!(seed != 0, "DST seed should not be zero");
        self.dst_seed = Some(seed);
        self
    }

    fn counterexample(&self) -> Counterexample {
        match self.dst_seed {
            Some(seed) => Counterexample::with_seed(seed),
            None => Counterexample::new(),
        }
    }

    /// NoConflictingOccupants
    ///
    /// The core safety invariant: no pair of current occupants may collide.
    fn check_no_conflicting_occupants(&self) -> PropertyResult {
        let occupants = self.crossing.current_occupants();

        for (i, a) in occupants.iter().enumerate() {
            for b in &occupants[i + 1..] {
                if a.conflicts_with(b) {
                    let mut ce = self.counterexample().with_description(format!(
                        "occupants {a} and {b} can collide"
                    ));
                    ce.add_state(StateSnapshot {
                        step: 1,
                        description: format!("{occupants:?}"),
                    });
                    return PropertyResult::fail(
                        "NoConflictingOccupants",
                        format!("conflicting occupants {a} and {b} are inside together"),
                        Some(ce),
                    );
                }
            }
        }

        PropertyResult::pass("NoConflictingOccupants")
    }

    /// ConflictSymmetry
    ///
    /// `conflicts(a, b) == conflicts(b, a)` for all valid path pairs. A
    /// required property of the predicate, not an implementation accident.
    fn check_conflict_symmetry(&self) -> PropertyResult {
        for a in Path::all() {
            for b in Path::all() {
                if a.conflicts_with(&b) != b.conflicts_with(&a) {
                    return PropertyResult::fail(
                        "ConflictSymmetry",
                        format!("conflicts({a}, {b}) != conflicts({b}, {a})"),
                        None,
                    );
                }
            }
        }
        PropertyResult::pass("ConflictSymmetry")
    }

    /// BalancedCrossings
    ///
    /// The entered multiset equals the exited multiset plus the current
    /// occupants: no vehicle is lost and none appears out of nowhere.
    fn check_balanced_crossings(&self) -> PropertyResult {
        let mut entered = self.crossing.entered_paths();
        let mut accounted = self.crossing.exited_paths();
        accounted.extend(self.crossing.current_occupants());

        entered.sort_unstable();
        accounted.sort_unstable();

        if entered != accounted {
            return PropertyResult::fail(
                "BalancedCrossings",
                format!(
                    "entered multiset {:?} != exited + occupants {:?}",
                    entered, accounted
                ),
                None,
            );
        }

        PropertyResult::pass("BalancedCrossings")
    }

    /// AdmissionSafety
    ///
    /// Replay the history against a model registry: every admission must
    /// have been conflict-free against every occupant at that moment, and
    /// every exit must remove an entry that is actually present.
    fn check_admission_safety(&self) -> PropertyResult {
        let history = self.crossing.history();
        let mut model: Vec<Path> = Vec::new();

        for event in &history.events {
            match event.op {
                CrossingOp::Enter => {
                    if let Some(occupant) =
                        model.iter().find(|o| event.path.conflicts_with(o))
                    {
                        let occupant = *occupant;
                        return PropertyResult::fail(
                            "AdmissionSafety",
                            format!(
                                "thread {} admitted {} while conflicting occupant {} was inside (step {})",
                                event.thread_id, event.path, occupant, event.step
                            ),
                            Some(self.admission_counterexample(&history, event.step, &model)),
                        );
                    }
                    model.push(event.path);
                }
                CrossingOp::Exit => {
                    match model.iter().position(|o| *o == event.path) {
                        Some(i) => {
                            model.swap_remove(i);
                        }
                        None => {
                            return PropertyResult::fail(
                                "AdmissionSafety",
                                format!(
                                    "thread {} exited {} without a matching admission (step {})",
                                    event.thread_id, event.path, event.step
                                ),
                                None,
                            );
                        }
                    }
                }
            }
        }

        PropertyResult::pass("AdmissionSafety")
    }

    /// Build a thread diagram covering the history up to the failing step.
    fn admission_counterexample(
        &self,
        history: &CrossingHistory,
        failing_step: u64,
        occupants: &[Path],
    ) -> Counterexample {
        let mut ce = self.counterexample();

        for event in history.events.iter().filter(|e| e.step <= failing_step) {
            let verb = match event.op {
                CrossingOp::Enter => "enter",
                CrossingOp::Exit => "exit",
            };
            ce.add_action(ThreadAction {
                thread_id: event.thread_id,
                step: event.step,
                action: format!("{verb}({})", event.path),
            });
        }

        ce.add_state(StateSnapshot {
            step: failing_step,
            description: format!("{occupants:?}"),
        });

        ce
    }
}

impl<T: CrossingProperties> PropertyChecker for CrossingPropertyChecker<'_, T> {
    fn check_all(&self) -> Vec<PropertyResult> {
        vec![
            self.check_no_conflicting_occupants(),
            self.check_conflict_symmetry(),
            self.check_balanced_crossings(),
            self.check_admission_safety(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Direction::{East, North, South, West};

    /// Test implementation of CrossingProperties.
    #[derive(Default)]
    struct TestCrossing {
        entered: Vec<Path>,
        exited: Vec<Path>,
        occupants: Vec<Path>,
        history: CrossingHistory,
    }

    impl TestCrossing {
        fn enter(&mut self, thread_id: u64, path: Path) {
            self.entered.push(path);
            self.occupants.push(path);
            let step = self.history.events.len() as u64 + 1;
            self.history.record_enter(thread_id, path, step);
        }

        fn exit(&mut self, thread_id: u64, path: Path) {
            if let Some(i) = self.occupants.iter().position(|o| *o == path) {
                self.occupants.swap_remove(i);
            }
            self.exited.push(path);
            let step = self.history.events.len() as u64 + 1;
            self.history.record_exit(thread_id, path, step);
        }
    }

    impl CrossingProperties for TestCrossing {
        fn entered_paths(&self) -> Vec<Path> {
            self.entered.clone()
        }

        fn exited_paths(&self) -> Vec<Path> {
            self.exited.clone()
        }

        fn current_occupants(&self) -> Vec<Path> {
            self.occupants.clone()
        }

        fn history(&self) -> CrossingHistory {
            self.history.clone()
        }
    }

    #[test]
    fn test_safe_run_passes_all() {
        let mut crossing = TestCrossing::default();
        crossing.enter(0, Path::new(North, East));
        crossing.enter(1, Path::new(North, South));
        crossing.exit(0, Path::new(North, East));
        crossing.enter(2, Path::new(South, North));
        crossing.exit(1, Path::new(North, South));
        crossing.exit(2, Path::new(South, North));

        let checker = CrossingPropertyChecker::new(&crossing);
        let results = checker.check_all();
        assert!(
            checker.all_hold(),
            "unexpected violation: {:?}",
            results.iter().find(|r| !r.holds)
        );
    }

    #[test]
    fn test_conflicting_occupants_detected() {
        let mut crossing = TestCrossing::default();
        // Shared destination: may never be inside together.
        crossing.enter(0, Path::new(North, South));
        crossing.enter(1, Path::new(East, South));

        let checker = CrossingPropertyChecker::new(&crossing).with_seed(42);
        let results = checker.check_all();

        let safety = results
            .iter()
            .find(|r| r.name == "NoConflictingOccupants")
            .unwrap();
        assert!(!safety.holds);

        let admission = results.iter().find(|r| r.name == "AdmissionSafety").unwrap();
        assert!(!admission.holds);
        let ce = admission.counterexample.as_ref().unwrap();
        assert_eq!(ce.dst_seed, Some(42));
        assert!(ce.render_diagram().contains("enter(East->South)"));
    }

    #[test]
    fn test_lost_vehicle_detected() {
        let crossing = TestCrossing {
            entered: vec![Path::new(North, South), Path::new(South, North)],
            exited: vec![Path::new(North, South)],
            occupants: Vec::new(), // South->North vanished
            history: CrossingHistory::new(),
        };

        let checker = CrossingPropertyChecker::new(&crossing);
        let results = checker.check_all();
        let balanced = results
            .iter()
            .find(|r| r.name == "BalancedCrossings")
            .unwrap();
        assert!(!balanced.holds);
    }

    #[test]
    fn test_exit_without_admission_detected() {
        let mut history = CrossingHistory::new();
        history.record_exit(0, Path::new(West, North), 1);
        let crossing = TestCrossing {
            entered: Vec::new(),
            exited: vec![Path::new(West, North)],
            occupants: Vec::new(),
            history,
        };

        let checker = CrossingPropertyChecker::new(&crossing);
        let results = checker.check_all();
        let admission = results.iter().find(|r| r.name == "AdmissionSafety").unwrap();
        assert!(!admission.holds);
        assert!(admission
            .violation
            .as_ref()
            .unwrap()
            .contains("without a matching admission"));
    }
}
