use log::debug;

use crate::geometry::Position;
use crate::maze::Maze;
use crate::route::Route;
use crate::solver::{BacktrackSolver, DualSolver, SolveError, Strategy};
use crate::Solver;

/// Span (Chebyshev distance between the endpoints) below which two threads
/// cost more than they save.
pub const DEFAULT_THRESHOLD: u64 = 512;

/// Size-based dispatcher: single-threaded search for nearby endpoints,
/// bidirectional search for distant ones.
#[derive(Clone, Copy, Debug)]
pub struct AutoSolver {
    pub threshold: u64,
}

impl Default for AutoSolver {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl AutoSolver {
    /// The strategy used for a search between `start` and `exit`.
    pub fn choose(&self, start: Position, exit: Position) -> Strategy {
        if start.chebyshev(exit) < self.threshold {
            Strategy::Backtrack
        } else {
            Strategy::Dual
        }
    }
}

impl Solver for AutoSolver {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn solve(&self, maze: &dyn Maze, start: Position, exit: Position) -> Result<Route, SolveError> {
        let strategy = self.choose(start, exit);
        debug!("auto: {start} -> {exit} using {strategy}");
        match strategy {
            Strategy::Dual => DualSolver.solve(maze, start, exit),
            _ => BacktrackSolver.solve(maze, start, exit),
        }
    }
}
