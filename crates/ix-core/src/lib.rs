//! # ix-core
//!
//! Core types and invariants for the verified intersection monitor.
//!
//! This crate provides:
//! - [`Direction`] and [`Path`] — the trajectory model and the pure
//!   conflict predicate over path pairs
//! - [`Intersection`] — the mutex/condvar admission monitor: blocking
//!   `enter`, broadcast-on-`exit`, full re-scan after every wakeup
//! - `PropertyResult` and `PropertyChecker` for verifying invariants
//! - `Counterexample` for rendering failure paths
//! - [`invariants::crossing`] — the crossing invariants and their checker
//! - [`buggy`] — intentionally broken admission policies for testing the
//!   checkers
//!
//! ## Verification layers
//!
//! The monitor is verified three ways, mirrored across the workspace:
//! loom interleaving tests live next to the monitor (run with
//! `RUSTFLAGS="--cfg loom"`), seed-reproducible multi-threaded stress runs
//! live in `ix-dst`, and exhaustive model checking of the admission
//! protocol lives in `ix-stateright`.

pub mod buggy;
pub mod counterexample;
pub mod invariants;
pub mod monitor;
pub mod path;
pub mod property;

pub use counterexample::{Counterexample, StateSnapshot, ThreadAction};
pub use invariants::crossing::{
    CrossingEvent, CrossingHistory, CrossingOp, CrossingProperties, CrossingPropertyChecker,
};
pub use monitor::Intersection;
pub use path::{Direction, Path};
pub use property::{PropertyChecker, PropertyResult};
