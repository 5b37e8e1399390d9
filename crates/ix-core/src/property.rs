//! Property checking results and the checker trait.
//!
//! Every invariant check produces a [`PropertyResult`]; a
//! [`PropertyChecker`] bundles the checks for one structure and reports
//! them together. Violations carry a human-readable message and, when the
//! failure came out of a seeded run, a [`Counterexample`] for reproduction.

use crate::counterexample::Counterexample;

/// Result of checking a single property.
#[derive(Debug, Clone)]
pub struct PropertyResult {
    /// Property name, e.g. `"NoConflictingOccupants"`.
    pub name: &'static str,
    /// Whether the property held.
    pub holds: bool,
    /// Violation message when the property failed.
    pub violation: Option<String>,
    /// Failure path, when one was captured.
    pub counterexample: Option<Counterexample>,
}

impl PropertyResult {
    /// The property held.
    #[must_use]
    pub fn pass(name: &'static str) -> Self {
        Self {
            name,
            holds: true,
            violation: None,
            counterexample: None,
        }
    }

    /// The property was violated.
    #[must_use]
    pub fn fail(
        name: &'static str,
        violation: impl Into<String>,
        counterexample: Option<Counterexample>,
    ) -> Self {
        Self {
            name,
            holds: false,
            violation: Some(violation.into()),
            counterexample,
        }
    }
}

/// A checker that verifies a set of properties against one structure.
pub trait PropertyChecker {
    /// Run every check and return all results.
    fn check_all(&self) -> Vec<PropertyResult>;

    /// True iff every property held.
    fn all_hold(&self) -> bool {
        self.check_all().iter().all(|r| r.holds)
    }

    /// First violation, if any, rendered as `"<name>: <message>"`.
    fn first_violation(&self) -> Option<String> {
        self.check_all().into_iter().find(|r| !r.holds).map(|r| {
            format!(
                "{}: {}",
                r.name,
                r.violation.unwrap_or_else(|| "property violated".to_string())
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedChecker {
        results: Vec<PropertyResult>,
    }

    impl PropertyChecker for FixedChecker {
        fn check_all(&self) -> Vec<PropertyResult> {
            self.results.clone()
        }
    }

    #[test]
    fn test_all_hold_when_every_property_passes() {
        let checker = FixedChecker {
            results: vec![PropertyResult::pass("A"), PropertyResult::pass("B")],
        };
        assert!(checker.all_hold());
        assert!(checker.first_violation().is_none());
    }

    #[test]
    fn test_first_violation_names_the_failing_property() {
        let checker = FixedChecker {
            results: vec![
                PropertyResult::pass("A"),
                PropertyResult::fail("B", "broken", None),
                PropertyResult::fail("C", "also broken", None),
            ],
        };
        assert!(!checker.all_hold());
        assert_eq!(checker.first_violation().unwrap(), "B: broken");
    }
}
