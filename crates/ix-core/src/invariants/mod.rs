//! Invariant definitions and checkers.
//!
//! Each concurrent structure in the workspace gets a Properties trait
//! describing the state it must expose for verification, plus a checker
//! that verifies every invariant against that state.

pub mod crossing;
