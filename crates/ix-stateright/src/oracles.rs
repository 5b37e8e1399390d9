//! Canonical admission traces for replay testing.
//!
//! An oracle is a concrete action sequence through [`CrossingModel`] that
//! pins down one behavior of the protocol. The passing oracles replay to a
//! final state; the blocking ones replay to a [`ReplayError`] proving the
//! guard refused the admission. Both kinds double as executable
//! documentation of the compatibility rules.

use ix_core::Direction::{East, North, South, West};
use ix_core::Path;
use thiserror::Error;

use crate::crossing::{CrossingAction, CrossingModel, CrossingState};

/// Why a replay stopped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplayError {
    /// The action's guard was false in the state it was applied to.
    #[error("action {action:?} at index {index} is not enabled")]
    ActionNotEnabled {
        index: usize,
        action: CrossingAction,
    },
    /// An action named a vehicle the model does not have.
    #[error("action {action:?} at index {index} names vehicle {vehicle} but the model has {vehicles_count}")]
    UnknownVehicle {
        index: usize,
        action: CrossingAction,
        vehicle: u8,
        vehicles_count: usize,
    },
}

/// Category of the scenario an oracle captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CrossingOracleCategory {
    /// Multiple vehicles from the same origin inside together.
    SameOriginConvoy,
    /// Exact-reverse paths inside together.
    OppositeReverses,
    /// Right turn admitted beside a diverging vehicle.
    RightTurnMerge,
    /// Conflicting vehicle refused until the occupant exits.
    BlockedUntilExit,
    /// Admission attempt the guard must reject.
    RejectedAdmission,
}

/// A named action sequence through the crossing model.
#[derive(Debug, Clone)]
pub struct CrossingOracle {
    pub name: String,
    pub category: CrossingOracleCategory,
    /// Paths of the vehicles involved; index is the vehicle id.
    pub paths: Vec<Path>,
    pub actions: Vec<CrossingAction>,
    pub description: String,
}

impl CrossingOracle {
    /// Replay the actions from the initial state.
    ///
    /// Returns the final state, or the first action whose guard failed.
    pub fn replay(&self) -> Result<CrossingState, ReplayError> {
        let model = CrossingModel::new(self.paths.clone());
        let mut state = CrossingState::new(self.paths.len());

        for (index, &action) in self.actions.iter().enumerate() {
            let vehicle = match action {
                CrossingAction::Request(v)
                | CrossingAction::Admit(v)
                | CrossingAction::Exit(v) => v,
            };
            if vehicle as usize >= self.paths.len() {
                return Err(ReplayError::UnknownVehicle {
                    index,
                    action,
                    vehicle,
                    vehicles_count: self.paths.len(),
                });
            }
            state = model
                .apply(&state, action)
                .ok_or(ReplayError::ActionNotEnabled { index, action })?;
        }

        Ok(state)
    }

    /// Three vehicles from the same origin crossing simultaneously.
    pub fn same_origin_convoy() -> Self {
        use CrossingAction::{Admit, Exit, Request};
        Self {
            name: "same_origin_convoy".into(),
            category: CrossingOracleCategory::SameOriginConvoy,
            paths: vec![
                Path::new(North, South),
                Path::new(North, East),
                Path::new(North, West),
            ],
            actions: vec![
                Request(0),
                Admit(0),
                Request(1),
                Admit(1),
                Request(2),
                Admit(2),
                Exit(0),
                Exit(1),
                Exit(2),
            ],
            description: "All three paths share an origin, so all are inside together".into(),
        }
    }

    /// Two vehicles on exactly reversed paths.
    pub fn opposite_reverses() -> Self {
        use CrossingAction::{Admit, Exit, Request};
        Self {
            name: "opposite_reverses".into(),
            category: CrossingOracleCategory::OppositeReverses,
            paths: vec![Path::new(North, South), Path::new(South, North)],
            actions: vec![Request(0), Request(1), Admit(0), Admit(1), Exit(0), Exit(1)],
            description: "N->S and S->N are exact reverses and cross concurrently".into(),
        }
    }

    /// A right turn admitted beside a straight with a different destination.
    pub fn right_turn_merge() -> Self {
        use CrossingAction::{Admit, Exit, Request};
        Self {
            name: "right_turn_merge".into(),
            category: CrossingOracleCategory::RightTurnMerge,
            paths: vec![Path::new(North, South), Path::new(East, North)],
            actions: vec![Request(0), Admit(0), Request(1), Admit(1), Exit(1), Exit(0)],
            description: "E->N is a right turn to a free destination, admitted mid-crossing".into(),
        }
    }

    /// A crossing straight is refused until the occupant exits.
    pub fn blocked_until_exit() -> Self {
        use CrossingAction::{Admit, Exit, Request};
        Self {
            name: "blocked_until_exit".into(),
            category: CrossingOracleCategory::BlockedUntilExit,
            paths: vec![Path::new(North, South), Path::new(East, West)],
            actions: vec![
                Request(0),
                Admit(0),
                Request(1),
                // Admit(1) would be rejected here.
                Exit(0),
                Admit(1),
                Exit(1),
            ],
            description: "E->W waits for the crossing N->S to exit before admission".into(),
        }
    }

    /// Attempting the admission `blocked_until_exit` avoids. Replay must fail.
    pub fn premature_admission() -> Self {
        use CrossingAction::{Admit, Request};
        Self {
            name: "premature_admission".into(),
            category: CrossingOracleCategory::RejectedAdmission,
            paths: vec![Path::new(North, South), Path::new(East, West)],
            actions: vec![Request(0), Admit(0), Request(1), Admit(1)],
            description: "Admitting E->W while N->S is inside must be refused".into(),
        }
    }

    /// Shared destination conflicts even when the later path is a right turn.
    pub fn shared_destination_rejected() -> Self {
        use CrossingAction::{Admit, Request};
        Self {
            name: "shared_destination_rejected".into(),
            category: CrossingOracleCategory::RejectedAdmission,
            paths: vec![Path::new(North, South), Path::new(West, South)],
            actions: vec![Request(0), Admit(0), Request(1), Admit(1)],
            description: "W->S is a right turn but shares the destination, so it is refused".into(),
        }
    }

    /// Every pre-built oracle.
    pub fn all_oracles() -> Vec<Self> {
        vec![
            Self::same_origin_convoy(),
            Self::opposite_reverses(),
            Self::right_turn_merge(),
            Self::blocked_until_exit(),
            Self::premature_admission(),
            Self::shared_destination_rejected(),
        ]
    }

    /// Whether this oracle is expected to replay to completion.
    #[must_use]
    pub fn expects_success(&self) -> bool {
        self.category != CrossingOracleCategory::RejectedAdmission
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passing_oracles_replay_to_all_exited() {
        for oracle in CrossingOracle::all_oracles() {
            if !oracle.expects_success() {
                continue;
            }
            let state = oracle
                .replay()
                .unwrap_or_else(|e| panic!("{} failed: {e}", oracle.name));
            assert!(state.all_exited(), "{} left vehicles inside", oracle.name);
        }
    }

    #[test]
    fn test_premature_admission_is_refused() {
        let oracle = CrossingOracle::premature_admission();
        let err = oracle.replay().unwrap_err();
        assert_eq!(
            err,
            ReplayError::ActionNotEnabled {
                index: 3,
                action: CrossingAction::Admit(1),
            }
        );
    }

    #[test]
    fn test_shared_destination_is_refused() {
        let err = CrossingOracle::shared_destination_rejected()
            .replay()
            .unwrap_err();
        assert!(matches!(err, ReplayError::ActionNotEnabled { index: 3, .. }));
    }

    #[test]
    fn test_unknown_vehicle_is_reported() {
        let oracle = CrossingOracle {
            name: "bad".into(),
            category: CrossingOracleCategory::SameOriginConvoy,
            paths: vec![Path::new(North, South)],
            actions: vec![CrossingAction::Request(7)],
            description: String::new(),
        };
        let err = oracle.replay().unwrap_err();
        assert!(matches!(err, ReplayError::UnknownVehicle { vehicle: 7, .. }));
    }
}
