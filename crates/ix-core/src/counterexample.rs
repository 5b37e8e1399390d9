//! Counterexample representation and rendering.
//!
//! When a property violation is detected, a counterexample shows the
//! sequence of crossings that led to the failure, laid out as a
//! step-by-thread diagram. Runs driven by a seed record it so the exact
//! schedule can be replayed with `DST_SEED=<seed>`.

use std::fmt;

/// A counterexample showing the failure path.
#[derive(Debug, Clone, Default)]
pub struct Counterexample {
    /// Sequence of state snapshots.
    pub states: Vec<StateSnapshot>,
    /// Thread interleaving that caused the failure.
    pub interleaving: Vec<ThreadAction>,
    /// DST seed for reproduction (if the run was seeded).
    pub dst_seed: Option<u64>,
    /// Human-readable description of the failure.
    pub description: Option<String>,
}

/// Snapshot of the occupant state at a point in time.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    /// Step number in the execution.
    pub step: u64,
    /// Description of the state, e.g. the occupant multiset.
    pub description: String,
}

/// Action taken by a vehicle thread.
#[derive(Debug, Clone)]
pub struct ThreadAction {
    /// Thread identifier.
    pub thread_id: u64,
    /// Step number when this action occurred.
    pub step: u64,
    /// Description of the action, e.g. `enter(North->South)`.
    pub action: String,
}

impl Counterexample {
    /// Create a new empty counterexample.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a counterexample with a DST seed for reproduction.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        debug_assert!(seed != 0, "DST seed should not be zero");
        Self {
            dst_seed: Some(seed),
            ..Self::default()
        }
    }

    /// Set the failure description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a state snapshot.
    pub fn add_state(&mut self, state: StateSnapshot) {
        debug_assert!(
            self.states.is_empty() || state.step > self.states.last().unwrap().step,
            "states must be added in step order"
        );
        self.states.push(state);
    }

    /// Add a thread action.
    pub fn add_action(&mut self, action: ThreadAction) {
        self.interleaving.push(action);
    }

    /// Render the counterexample as a human-readable thread diagram.
    ///
    /// Format:
    /// ```text
    /// DST_SEED=12345
    ///
    /// Step | Thread 0            | Thread 1            | State
    /// -----|---------------------|---------------------|------
    ///    1 | enter(North->South) |                     | [North->South]
    ///    2 |                     | enter(East->South)  | [North->South, East->South]
    /// ```
    #[must_use]
    pub fn render_diagram(&self) -> String {
        let mut output = String::new();

        if let Some(seed) = self.dst_seed {
            output.push_str(&format!("DST_SEED={seed}\n\n"));
        }

        if let Some(ref desc) = self.description {
            output.push_str("Failure: ");
            output.push_str(desc);
            output.push_str("\n\n");
        }

        let mut threads: Vec<u64> = self.interleaving.iter().map(|a| a.thread_id).collect();
        threads.sort_unstable();
        threads.dedup();

        if threads.is_empty() {
            output.push_str("(no thread actions recorded)\n");
            return output;
        }

        let column_width = 19;

        output.push_str("Step |");
        for tid in &threads {
            output.push_str(&format!(" {:<column_width$} |", format!("Thread {tid}")));
        }
        output.push_str(" State\n");

        output.push_str("-----|");
        for _ in &threads {
            output.push_str(&format!("{}|", "-".repeat(column_width + 2)));
        }
        output.push_str("------\n");

        let max_step = self.interleaving.iter().map(|a| a.step).max().unwrap_or(0);

        for step in 1..=max_step {
            output.push_str(&format!("{step:4} |"));

            for tid in &threads {
                let action = self
                    .interleaving
                    .iter()
                    .find(|a| a.step == step && a.thread_id == *tid);
                match action {
                    Some(a) => output.push_str(&format!(" {:<column_width$} |", a.action)),
                    None => output.push_str(&format!(" {:<column_width$} |", "")),
                }
            }

            if let Some(state) = self.states.iter().find(|s| s.step == step) {
                output.push_str(&format!(" {}", state.description));
            }

            output.push('\n');
        }

        output
    }
}

impl fmt::Display for Counterexample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_diagram())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counterexample_creation() {
        let ce = Counterexample::new();
        assert!(ce.states.is_empty());
        assert!(ce.interleaving.is_empty());
        assert!(ce.dst_seed.is_none());
    }

    #[test]
    fn test_counterexample_with_seed() {
        let ce = Counterexample::with_seed(12345);
        assert_eq!(ce.dst_seed, Some(12345));
    }

    #[test]
    fn test_render_diagram() {
        let mut ce = Counterexample::with_seed(42)
            .with_description("conflicting occupants North->South and East->South");

        ce.add_action(ThreadAction {
            thread_id: 0,
            step: 1,
            action: "enter(North->South)".to_string(),
        });
        ce.add_action(ThreadAction {
            thread_id: 1,
            step: 2,
            action: "enter(East->South)".to_string(),
        });
        ce.add_state(StateSnapshot {
            step: 2,
            description: "[North->South, East->South]".to_string(),
        });

        let diagram = ce.render_diagram();
        assert!(diagram.contains("DST_SEED=42"));
        assert!(diagram.contains("Thread 0"));
        assert!(diagram.contains("enter(North->South)"));
        assert!(diagram.contains("[North->South, East->South]"));
    }

    #[test]
    fn test_render_without_actions() {
        let ce = Counterexample::new();
        assert!(ce.render_diagram().contains("no thread actions"));
    }
}
