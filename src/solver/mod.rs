//! Escape-route engines.
//!
//! All engines implement [`Solver`](crate::Solver) and are interchangeable:
//! - [`BacktrackSolver`]: single-threaded depth-first search, the baseline.
//! - [`DirectedSolver`]: the baseline, trying moves towards the exit first.
//! - [`DualSolver`]: two searches, from each end, that stop when one walks
//!   onto the other's path.
//! - [`SharedMapSolver`]: two searches sharing one visited map, rebuilt
//!   from parent pointers where they touch.
//! - [`ForkJoinSolver`]: one search that forks workers at branch points.
//! - [`AutoSolver`]: picks single- or dual-threaded search by maze span.

mod auto;
mod backtrack;
mod dual;
mod fork_join;
mod shared_map;
pub mod sync;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::geometry::Position;
use crate::Solver;

pub use auto::{AutoSolver, DEFAULT_THRESHOLD};
pub use backtrack::{BacktrackSolver, DirectedSolver};
pub use dual::DualSolver;
pub use fork_join::{ForkJoinSolver, FORK_DISTANCE};
pub use shared_map::SharedMapSolver;

/// Why a solve call produced no route.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolveError {
    #[error("there is no route from {start} to {exit}")]
    NoRoute { start: Position, exit: Position },
}

/// Capacity hint used when the endpoints give no useful estimate.
const FALLBACK_CAPACITY: usize = 100;

/// Upper bound on the capacity hint, so far-apart endpoints in an
/// unbounded maze do not reserve gigabytes up front.
const MAX_CAPACITY: usize = 1 << 16;

/// Expected route length: Manhattan distance plus 20%.
///
/// Only sizes containers; the search never depends on it.
pub(crate) fn estimate_route_len(start: Position, exit: Position) -> usize {
    let distance = start.manhattan(exit);
    if distance == 0 {
        return FALLBACK_CAPACITY;
    }
    let estimate = distance.saturating_mul(12) / 10;
    usize::try_from(estimate).map_or(MAX_CAPACITY, |estimate| estimate.clamp(1, MAX_CAPACITY))
}

/// Named engine choices, for configuration and the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    Backtrack,
    Directed,
    Dual,
    SharedMap,
    ForkJoin,
    Auto,
}

impl Strategy {
    pub const ALL: [Strategy; 6] = [
        Strategy::Backtrack,
        Strategy::Directed,
        Strategy::Dual,
        Strategy::SharedMap,
        Strategy::ForkJoin,
        Strategy::Auto,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Backtrack => "backtrack",
            Strategy::Directed => "directed",
            Strategy::Dual => "dual",
            Strategy::SharedMap => "shared-map",
            Strategy::ForkJoin => "fork-join",
            Strategy::Auto => "auto",
        }
    }

    /// An engine for this strategy with default tuning.
    pub fn solver(self) -> Box<dyn Solver> {
        match self {
            Strategy::Backtrack => Box::new(BacktrackSolver),
            Strategy::Directed => Box::new(DirectedSolver),
            Strategy::Dual => Box::new(DualSolver),
            Strategy::SharedMap => Box::new(SharedMapSolver),
            Strategy::ForkJoin => Box::new(ForkJoinSolver::default()),
            Strategy::Auto => Box::new(AutoSolver::default()),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown strategy name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown strategy `{0}` (one of backtrack, directed, dual, shared-map, fork-join, auto)")]
pub struct UnknownStrategy(pub String);

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == name)
            .ok_or_else(|| UnknownStrategy(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_adds_twenty_percent() {
        let origin = Position::new(0, 0);
        assert_eq!(estimate_route_len(origin, Position::new(10, 10)), 24);
        assert_eq!(estimate_route_len(origin, Position::new(0, 1)), 1);
    }

    #[test]
    fn test_estimate_falls_back_for_zero_distance() {
        let here = Position::new(-7, 7);
        assert_eq!(estimate_route_len(here, here), FALLBACK_CAPACITY);
    }

    #[test]
    fn test_estimate_is_capped() {
        let low = Position::new(i32::MIN, i32::MIN);
        let high = Position::new(i32::MAX, i32::MAX);
        assert_eq!(estimate_route_len(low, high), MAX_CAPACITY);
    }

    #[test]
    fn test_strategy_names_round_trip() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.name().parse::<Strategy>(), Ok(strategy));
            assert_eq!(strategy.solver().name(), strategy.name());
        }
        assert_eq!("directed".parse::<Strategy>(), Ok(Strategy::Directed));
        assert!("bfs".parse::<Strategy>().is_err());
    }
}
