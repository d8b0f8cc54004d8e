//! Single-threaded depth-first backtracking search.
//!
//! The search keeps an explicit stack of frames instead of recursing, so
//! deep paths through large mazes cannot overflow the call stack. Each
//! frame remembers which directions it has already tried; popping a frame
//! is the backtrack step and costs O(1).
//!
//! [`DirectedSolver`] runs the same search but tries the directions that
//! point at the exit first.

use log::debug;
use rustc_hash::FxHashSet;

use crate::geometry::{Direction, Position};
use crate::maze::Maze;
use crate::permutations::{DIRECTED, PERMUTATIONS};
use crate::route::Route;
use crate::solver::{estimate_route_len, SolveError};
use crate::Solver;

/// One level of the depth-first search.
///
/// `order` holds the directions worth trying at `position`; `next` is how
/// many of them have been consumed.
pub(crate) struct Frame {
    pub position: Position,
    order: &'static [Direction],
    next: usize,
}

impl Frame {
    /// Enters `position`, reached by moving in `arrived_by`.
    #[inline]
    pub fn new(position: Position, arrived_by: Option<Direction>) -> Self {
        Self {
            position,
            order: PERMUTATIONS.order(arrived_by, position),
            next: 0,
        }
    }

    /// Enters `position` on the way to `target`, trying the directions
    /// that point at `target` first.
    #[inline]
    pub fn toward(position: Position, arrived_by: Option<Direction>, target: Position) -> Self {
        Self {
            position,
            order: DIRECTED.order(arrived_by, position, target),
            next: 0,
        }
    }

    /// Directions not handed out yet, in trial order.
    #[inline]
    pub fn untried(&self) -> &'static [Direction] {
        let order: &'static [Direction] = self.order;
        &order[self.next..]
    }

    /// Consumes directions until one the maze allows, and returns the move.
    #[inline]
    pub fn next_move(&mut self, maze: &dyn Maze) -> Option<(Direction, Position)> {
        while let Some(&direction) = self.order.get(self.next) {
            self.next += 1;
            if maze.can_go(direction, self.position) {
                return Some((direction, self.position.neighbor(direction)));
            }
        }
        None
    }
}

/// Depth-first search from `start` to `exit`, building each frame with
/// `enter`.
fn depth_first(
    name: &str,
    maze: &dyn Maze,
    start: Position,
    exit: Position,
    enter: impl Fn(Position, Option<Direction>) -> Frame,
) -> Result<Route, SolveError> {
    if start == exit {
        return Ok(vec![start]);
    }

    let capacity = estimate_route_len(start, exit);
    let mut frames: Vec<Frame> = Vec::with_capacity(capacity);
    // every position ever placed on the path; never shrinks, which keeps
    // the search linear in the explored area
    let mut visited: FxHashSet<Position> =
        FxHashSet::with_capacity_and_hasher(capacity * 4 / 3, Default::default());

    frames.push(enter(start, None));
    visited.insert(start);

    while let Some(frame) = frames.last_mut() {
        let Some((direction, next)) = frame.next_move(maze) else {
            frames.pop();
            continue;
        };
        if !visited.insert(next) {
            continue;
        }
        if next == exit {
            let mut route: Route = Vec::with_capacity(frames.len() + 1);
            route.extend(frames.iter().map(|frame| frame.position));
            route.push(next);
            debug!(
                "{name}: route of {} positions after visiting {}",
                route.len(),
                visited.len()
            );
            return Ok(route);
        }
        frames.push(enter(next, Some(direction)));
    }

    debug!("{name}: exhausted {} positions", visited.len());
    Err(SolveError::NoRoute { start, exit })
}

/// The baseline engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct BacktrackSolver;

impl Solver for BacktrackSolver {
    fn name(&self) -> &'static str {
        "backtrack"
    }

    fn solve(&self, maze: &dyn Maze, start: Position, exit: Position) -> Result<Route, SolveError> {
        depth_first(self.name(), maze, start, exit, Frame::new)
    }
}

/// Backtracking that heads for the exit first at every cell.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectedSolver;

impl Solver for DirectedSolver {
    fn name(&self) -> &'static str {
        "directed"
    }

    fn solve(&self, maze: &dyn Maze, start: Position, exit: Position) -> Result<Route, SolveError> {
        let enter = |position, arrived_by| Frame::toward(position, arrived_by, exit);
        depth_first(self.name(), maze, start, exit, enter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{FIXTURES, MAZE_3X3};
    use crate::route::check_route;

    #[test]
    fn test_fixtures_yield_their_unique_route() {
        for fixture in FIXTURES {
            let maze = fixture.maze().unwrap();
            let route = BacktrackSolver
                .solve(&maze, fixture.start(), fixture.exit())
                .unwrap();
            assert_eq!(route, fixture.route, "fixture {}", fixture.name);
        }
    }

    #[test]
    fn test_reverse_direction() {
        let maze = MAZE_3X3.maze().unwrap();
        let route = BacktrackSolver
            .solve(&maze, MAZE_3X3.exit(), MAZE_3X3.start())
            .unwrap();
        let mut expected = MAZE_3X3.route.to_vec();
        expected.reverse();
        assert_eq!(route, expected);
    }

    #[test]
    fn test_start_is_exit() {
        let nowhere = |_: Direction, _: Position| false;
        let here = Position::new(3, 3);
        assert_eq!(BacktrackSolver.solve(&nowhere, here, here), Ok(vec![here]));
    }

    #[test]
    fn test_no_passages_is_no_route() {
        let nowhere = |_: Direction, _: Position| false;
        let start = Position::new(0, 0);
        let exit = Position::new(i32::MAX, i32::MAX);
        assert_eq!(
            BacktrackSolver.solve(&nowhere, start, exit),
            Err(SolveError::NoRoute { start, exit })
        );
    }

    #[test]
    fn test_open_room_with_loops() {
        let room = |direction: Direction, position: Position| {
            let next = position.neighbor(direction);
            (0..10).contains(&next.x) && (0..10).contains(&next.y)
        };
        let start = Position::new(0, 0);
        let exit = Position::new(9, 9);
        let route = BacktrackSolver.solve(&room, start, exit).unwrap();
        check_route(&room, &route, start, exit).unwrap();
    }

    #[test]
    fn test_directed_finds_fixture_routes() {
        for fixture in FIXTURES {
            let maze = fixture.maze().unwrap();
            let route = DirectedSolver
                .solve(&maze, fixture.start(), fixture.exit())
                .unwrap();
            assert_eq!(route, fixture.route, "fixture {}", fixture.name);

            let back = DirectedSolver
                .solve(&maze, fixture.exit(), fixture.start())
                .unwrap();
            assert_eq!(back.len(), fixture.route.len(), "fixture {}", fixture.name);
        }
    }

    #[test]
    fn test_directed_walks_straight_across_an_open_room() {
        let room = |direction: Direction, position: Position| {
            let next = position.neighbor(direction);
            (0..10).contains(&next.x) && (0..10).contains(&next.y)
        };
        let start = Position::new(0, 0);
        for (x, y) in [(9, 0), (9, 9), (2, 7)] {
            let exit = Position::new(x, y);
            let route = DirectedSolver.solve(&room, start, exit).unwrap();
            check_route(&room, &route, start, exit).unwrap();
            assert_eq!(route.len() as u64, start.manhattan(exit) + 1, "to {exit}");
        }
    }

    #[test]
    fn test_frame_toward_tries_the_target_first() {
        let maze = MAZE_3X3.maze().unwrap();
        let (here, target) = (Position::new(1, 0), Position::new(1, 2));
        let mut frame = Frame::toward(here, Some(Direction::Right), target);
        assert_eq!(
            frame.untried(),
            [Direction::Down, Direction::Right, Direction::Up]
        );
        // (1,0) has no passage down
        let (direction, next) = frame.next_move(&maze).unwrap();
        assert_eq!((direction, next), (Direction::Right, Position::new(2, 0)));
    }

    #[test]
    fn test_frame_skips_walls() {
        let maze = MAZE_3X3.maze().unwrap();
        let mut frame = Frame::new(Position::new(1, 0), Some(Direction::Right));
        let mut moves = Vec::new();
        while let Some((direction, _)) = frame.next_move(&maze) {
            moves.push(direction);
        }
        // (1,0) opens left and right; left leads back and is never offered
        assert_eq!(moves, vec![Direction::Right]);
    }
}
