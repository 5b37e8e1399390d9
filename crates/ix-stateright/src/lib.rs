//! # ix-stateright
//!
//! Exhaustive model checking of the intersection admission protocol.
//!
//! The state machine in [`crossing`] abstracts the monitor down to vehicle
//! statuses and the admission guard, then stateright explores every
//! interleaving for small vehicle sets. [`oracles`] holds canonical traces
//! through the same machine for replay-style assertions.
//!
//! Run the checks with `cargo test -p ix-stateright`.

pub mod crossing;
pub mod oracles;

pub use crossing::{CrossingAction, CrossingModel, CrossingState, VehicleId, VehicleStatus};
pub use oracles::{CrossingOracle, CrossingOracleCategory, ReplayError};
