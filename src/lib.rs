//! Maze Escape-Route Solver Library
//!
//! Finds a simple path from a start cell to an exit cell through any maze
//! that can answer "can I move in direction D from position P". Several
//! interchangeable engines are provided, from a single-threaded backtracking
//! baseline to bidirectional and fork-join parallel searches.

pub mod fixtures;
pub mod generator;
pub mod geometry;
pub mod maze;
pub mod permutations;
pub mod route;
pub mod solver;

pub use geometry::{Direction, Position};
pub use maze::{GridMaze, Maze};
pub use route::{check_route, Route};
pub use solver::{SolveError, Strategy};

/// An escape-route engine.
///
/// Engines are object safe so callers can pick one at runtime through
/// [`Strategy::solver`].
pub trait Solver: Send + Sync {
    /// Short name used in logs and on the command line.
    fn name(&self) -> &'static str;

    /// Finds a route from `start` to `exit`.
    ///
    /// The route begins at `start`, ends at `exit`, moves one passable step
    /// at a time and never repeats a position. `start == exit` yields
    /// `[start]`. Fails with [`SolveError::NoRoute`] when the exit cannot be
    /// reached.
    fn solve(&self, maze: &dyn Maze, start: Position, exit: Position) -> Result<Route, SolveError>;
}
