//! Intersection admission protocol as a state machine.
//!
//! Abstracts the monitor to what model checking can reach: each vehicle is
//! a fixed path moving through four statuses. Blocking is modeled by the
//! `Admit` guard rather than a condvar; an interleaving where a conflicting
//! vehicle is admitted simply does not exist in the state graph, so if the
//! checker finds one the conflict predicate itself is wrong.
//!
//! # Invariants
//!
//! 1. `NoConflictingAdmissions`: admitted vehicles are pairwise compatible
//! 2. The guard never blocks spuriously: an empty intersection admits any
//!    waiter
//! 3. `AllVehiclesExit` (liveness): every path through the graph ends with
//!    every vehicle exited

use ix_core::Path;
use stateright::{Model, Property};

/// Vehicle identifier, an index into the model's path table.
pub type VehicleId = u8;

/// Lifecycle of one vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VehicleStatus {
    /// Has not yet approached the intersection.
    NotRequested,
    /// Requested entry, not yet admitted.
    Waiting,
    /// Inside the intersection.
    Admitted,
    /// Crossed and left.
    Exited,
}

/// One step a vehicle can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CrossingAction {
    /// Vehicle approaches and requests entry.
    Request(VehicleId),
    /// Waiting vehicle is admitted; only enabled when conflict-free.
    Admit(VehicleId),
    /// Admitted vehicle leaves.
    Exit(VehicleId),
}

/// Snapshot of every vehicle's status.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrossingState {
    /// Status per vehicle, indexed by `VehicleId`.
    pub statuses: Vec<VehicleStatus>,
}

impl CrossingState {
    /// Initial state: nobody has approached yet.
    #[must_use]
    pub fn new(vehicles_count: usize) -> Self {
        Self {
            statuses: vec![VehicleStatus::NotRequested; vehicles_count],
        }
    }

    /// Status of one vehicle.
    #[must_use]
    pub fn status(&self, vehicle: VehicleId) -> VehicleStatus {
        self.statuses[vehicle as usize]
    }

    /// Paths of the vehicles currently inside.
    pub fn admitted_paths(&self, paths: &[Path]) -> Vec<Path> {
        self.statuses
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == VehicleStatus::Admitted)
            .map(|(i, _)| paths[i])
            .collect()
    }

    /// NoConflictingAdmissions: no two admitted vehicles can collide.
    pub fn no_conflicting_admissions(&self, paths: &[Path]) -> bool {
        let admitted = self.admitted_paths(paths);
        admitted
            .iter()
            .enumerate()
            .all(|(i, a)| admitted[i + 1..].iter().all(|b| a.compatible_with(b)))
    }

    /// Whether every vehicle has crossed and left.
    pub fn all_exited(&self) -> bool {
        self.statuses.iter().all(|s| *s == VehicleStatus::Exited)
    }
}

/// Model over a fixed set of vehicles, one path each.
#[derive(Debug, Clone)]
pub struct CrossingModel {
    /// Path of each vehicle; index is the `VehicleId`.
    pub paths: Vec<Path>,
}

impl CrossingModel {
    /// Create a model for the given vehicle paths.
    #[must_use]
    pub fn new(paths: Vec<Path>) -> Self {
        debug_assert!(!paths.is_empty(), "model needs at least one vehicle");
        debug_assert!(paths.len() <= u8::MAX as usize, "VehicleId is a u8");
        Self { paths }
    }

    /// Whether `vehicle` may be admitted in `state`.
    ///
    /// The model-level equivalent of the monitor's full registry scan.
    pub fn admissible(&self, state: &CrossingState, vehicle: VehicleId) -> bool {
        let path = self.paths[vehicle as usize];
        state
            .admitted_paths(&self.paths)
            .iter()
            .all(|occupant| path.compatible_with(occupant))
    }

    /// Enabled actions in `state`.
    pub fn enabled_actions(&self, state: &CrossingState) -> Vec<CrossingAction> {
        let mut actions = Vec::new();
        for (i, status) in state.statuses.iter().enumerate() {
            let vehicle = i as VehicleId;
            match status {
                VehicleStatus::NotRequested => actions.push(CrossingAction::Request(vehicle)),
                VehicleStatus::Waiting => {
                    if self.admissible(state, vehicle) {
                        actions.push(CrossingAction::Admit(vehicle));
                    }
                }
                VehicleStatus::Admitted => actions.push(CrossingAction::Exit(vehicle)),
                VehicleStatus::Exited => {}
            }
        }
        actions
    }

    /// Apply an action, returning the successor state.
    ///
    /// Returns `None` when the action is not enabled, including an `Admit`
    /// that would put conflicting vehicles inside together.
    pub fn apply(&self, state: &CrossingState, action: CrossingAction) -> Option<CrossingState> {
        let mut next = state.clone();
        match action {
            CrossingAction::Request(v) => {
                if next.status(v) != VehicleStatus::NotRequested {
                    return None;
                }
                next.statuses[v as usize] = VehicleStatus::Waiting;
            }
            CrossingAction::Admit(v) => {
                if next.status(v) != VehicleStatus::Waiting || !self.admissible(state, v) {
                    return None;
                }
                next.statuses[v as usize] = VehicleStatus::Admitted;
            }
            CrossingAction::Exit(v) => {
                if next.status(v) != VehicleStatus::Admitted {
                    return None;
                }
                next.statuses[v as usize] = VehicleStatus::Exited;
            }
        }
        Some(next)
    }
}

impl Model for CrossingModel {
    type State = CrossingState;
    type Action = CrossingAction;

    fn init_states(&self) -> Vec<Self::State> {
        vec![CrossingState::new(self.paths.len())]
    }

    fn actions(&self, state: &Self::State, actions: &mut Vec<Self::Action>) {
        actions.extend(self.enabled_actions(state));
    }

    fn next_state(&self, last_state: &Self::State, action: Self::Action) -> Option<Self::State> {
        self.apply(last_state, action)
    }

    fn properties(&self) -> Vec<Property<Self>> {
        vec![
            Property::<Self>::always("no conflicting admissions", |model, state| {
                state.no_conflicting_admissions(&model.paths)
            }),
            // The guard must never block spuriously: a waiter facing an
            // empty intersection is always admissible.
            Property::<Self>::always("empty intersection admits any waiter", |model, state| {
                let empty = state.admitted_paths(&model.paths).is_empty();
                !empty
                    || state
                        .statuses
                        .iter()
                        .enumerate()
                        .filter(|(_, s)| **s == VehicleStatus::Waiting)
                        .all(|(i, _)| model.admissible(state, i as VehicleId))
            }),
            // Every maximal path terminates with all vehicles through: some
            // action stays enabled until then, and an admitted vehicle can
            // always exit, which unblocks whoever it conflicted with.
            Property::<Self>::eventually("all vehicles exit", |_, state| state.all_exited()),
        ]
    }
}
