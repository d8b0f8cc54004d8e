//! Bidirectional search: one worker walks from the start, one from the exit.
//!
//! Each worker runs the plain backtracking search over its own
//! [`SharedPath`]. Before descending it asks whether the new position is on
//! the partner's path; a hit freezes the partner's path and stops both
//! workers. After both threads are joined the two paths are stitched at a
//! common position.
//!
//! The backward worker walks passages in reverse, so mazes are expected to
//! have symmetric passages.

use std::io;
use std::thread;

use log::{debug, warn};
use rustc_hash::FxHashSet;

use crate::geometry::Position;
use crate::maze::Maze;
use crate::route::Route;
use crate::solver::backtrack::{BacktrackSolver, Frame};
use crate::solver::sync::{CancelToken, SharedPath};
use crate::solver::{estimate_route_len, SolveError};
use crate::Solver;

/// Two-thread bidirectional engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct DualSolver;

/// How a worker stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    /// Walked onto its target.
    Reached,
    /// Walked onto the partner's path.
    Met,
    /// Backtracked out of its origin.
    Exhausted,
    /// Told to stop, or found its own path frozen.
    Stopped,
}

struct Worker<'a> {
    maze: &'a dyn Maze,
    origin: Position,
    target: Position,
    own: &'a SharedPath,
    partner: &'a SharedPath,
    stop: &'a CancelToken,
    capacity: usize,
}

impl Worker<'_> {
    fn run(self) -> Outcome {
        // whatever ends this worker ends the partner too
        let _finish = self.stop.cancel_on_drop();

        let mut frames: Vec<Frame> = Vec::with_capacity(self.capacity);
        let mut visited: FxHashSet<Position> =
            FxHashSet::with_capacity_and_hasher(self.capacity * 4 / 3, Default::default());

        if !self.own.push(self.origin) {
            return Outcome::Stopped;
        }
        visited.insert(self.origin);
        frames.push(Frame::new(self.origin, None));

        while let Some(frame) = frames.last_mut() {
            if self.stop.is_cancelled() {
                return Outcome::Stopped;
            }
            let Some((direction, next)) = frame.next_move(self.maze) else {
                frames.pop();
                if !self.own.pop() {
                    return Outcome::Stopped;
                }
                continue;
            };
            if !visited.insert(next) {
                continue;
            }
            if !self.own.push(next) {
                return Outcome::Stopped;
            }
            if next == self.target {
                return Outcome::Reached;
            }
            if self.partner.freeze_if_contains(next) {
                return Outcome::Met;
            }
            frames.push(Frame::new(next, Some(direction)));
        }

        Outcome::Exhausted
    }
}

impl Solver for DualSolver {
    fn name(&self) -> &'static str {
        "dual"
    }

    fn solve(&self, maze: &dyn Maze, start: Position, exit: Position) -> Result<Route, SolveError> {
        if start == exit {
            return Ok(vec![start]);
        }

        let capacity = estimate_route_len(start, exit);
        let forward = SharedPath::with_capacity(capacity);
        let backward = SharedPath::with_capacity(capacity);
        let stop = CancelToken::new();

        let joined = thread::scope(|scope| -> io::Result<_> {
            let ahead = Worker {
                maze,
                origin: start,
                target: exit,
                own: &forward,
                partner: &backward,
                stop: &stop,
                capacity,
            };
            let behind = Worker {
                maze,
                origin: exit,
                target: start,
                own: &backward,
                partner: &forward,
                stop: &stop,
                capacity,
            };

            let ahead = thread::Builder::new()
                .name("escape-forward".to_string())
                .spawn_scoped(scope, move || ahead.run())?;
            let behind = match thread::Builder::new()
                .name("escape-backward".to_string())
                .spawn_scoped(scope, move || behind.run())
            {
                Ok(handle) => handle,
                Err(error) => {
                    stop.cancel();
                    let _ = ahead.join();
                    return Err(error);
                }
            };
            Ok((ahead.join(), behind.join()))
        });

        match joined {
            Ok((Ok(ahead), Ok(behind))) => {
                debug!("dual: forward {ahead:?}, backward {behind:?}");
                let (forward, _) = forward.into_parts();
                let (backward, backward_members) = backward.into_parts();
                merge(start, exit, forward, backward, &backward_members)
            }
            Ok(_) => {
                warn!("dual: a search worker panicked, retrying single-threaded");
                BacktrackSolver.solve(maze, start, exit)
            }
            Err(error) => {
                warn!("dual: cannot start search workers ({error}), retrying single-threaded");
                BacktrackSolver.solve(maze, start, exit)
            }
        }
    }
}

/// Stitches the forward path (from `start`) and the backward path (from
/// `exit`) into one route.
///
/// Among the common positions the one earliest on the forward path wins, so
/// the forward prefix never touches the backward path before the seam.
fn merge(
    start: Position,
    exit: Position,
    mut forward: Vec<Position>,
    mut backward: Vec<Position>,
    backward_members: &FxHashSet<Position>,
) -> Result<Route, SolveError> {
    if forward.last() == Some(&exit) {
        return Ok(forward);
    }
    if backward.last() == Some(&start) {
        backward.reverse();
        return Ok(backward);
    }

    let Some(seam) = forward
        .iter()
        .position(|position| backward_members.contains(position))
    else {
        return Err(SolveError::NoRoute { start, exit });
    };
    let meeting = forward[seam];

    let common = forward[seam..]
        .iter()
        .filter(|position| backward_members.contains(position))
        .count();
    if common > 1 {
        debug!("dual: paths share {common} positions, joining at {meeting}");
    }

    let Some(tail) = backward.iter().position(|&position| position == meeting) else {
        return Err(SolveError::NoRoute { start, exit });
    };
    forward.truncate(seam + 1);
    forward.extend(backward[..tail].iter().rev());
    Ok(forward)
}
