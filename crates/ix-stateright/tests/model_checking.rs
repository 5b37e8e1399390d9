//! Exhaustive exploration of the admission protocol for small vehicle sets.
//!
//! BFS over every interleaving; `assert_properties` fails the test with a
//! counterexample path if any property breaks.

use ix_core::Direction::{East, North, South, West};
use ix_core::Path;
use ix_stateright::{CrossingModel, CrossingOracle};
use stateright::{Checker, Model};

fn check(paths: Vec<Path>) {
    let model = CrossingModel::new(paths);
    model
        .checker()
        .threads(1)
        .spawn_bfs()
        .join()
        .assert_properties();
}

#[test]
fn test_two_crossing_straights() {
    check(vec![Path::new(North, South), Path::new(East, West)]);
}

#[test]
fn test_two_exact_reverses() {
    check(vec![Path::new(North, South), Path::new(South, North)]);
}

#[test]
fn test_three_vehicles_shared_destination() {
    // All want South; only one may be inside at a time.
    check(vec![
        Path::new(North, South),
        Path::new(East, South),
        Path::new(West, South),
    ]);
}

#[test]
fn test_four_vehicles_mixed() {
    check(vec![
        Path::new(North, South),
        Path::new(South, North),
        Path::new(East, North), // right turn
        Path::new(West, East),
    ]);
}

#[test]
fn test_four_right_turns() {
    // The four right turns have four distinct destinations, so any subset
    // may be inside together; the whole graph must still terminate cleanly.
    check(vec![
        Path::new(North, West),
        Path::new(South, East),
        Path::new(East, North),
        Path::new(West, South),
    ]);
}

#[test]
fn test_oracles_agree_with_model() {
    // Every passing oracle is a path through a model the checker verified.
    for oracle in CrossingOracle::all_oracles() {
        let model = CrossingModel::new(oracle.paths.clone());
        model
            .checker()
            .threads(1)
            .spawn_bfs()
            .join()
            .assert_properties();

        if oracle.expects_success() {
            let state = oracle
                .replay()
                .unwrap_or_else(|e| panic!("{} failed: {e}", oracle.name));
            assert!(state.all_exited());
        } else {
            assert!(oracle.replay().is_err(), "{} replayed", oracle.name);
        }
    }
}
