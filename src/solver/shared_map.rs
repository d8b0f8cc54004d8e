//! Bidirectional search over one shared visited map.
//!
//! Instead of probing each other's paths, the two workers mark positions in a
//! single concurrent map tagged with the side that got there first. A worker
//! that reaches a position marked by the other side has found the meeting
//! point. Each worker keeps a parent map (position -> predecessor) that only
//! grows; the route is read back from both parent maps once the threads have
//! been joined.

use std::io;
use std::thread;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::{debug, warn};
use parking_lot::Mutex;
use rustc_hash::{FxBuildHasher, FxHashMap};

use crate::geometry::Position;
use crate::maze::Maze;
use crate::route::Route;
use crate::solver::backtrack::{BacktrackSolver, Frame};
use crate::solver::sync::CancelToken;
use crate::solver::{estimate_route_len, SolveError};
use crate::Solver;

/// Two-thread engine sharing one visited map.
#[derive(Clone, Copy, Debug, Default)]
pub struct SharedMapSolver;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Forward,
    Backward,
}

type Parents = FxHashMap<Position, Position>;

struct Worker<'a> {
    side: Side,
    maze: &'a dyn Maze,
    origin: Position,
    visited: &'a DashMap<Position, Side, FxBuildHasher>,
    meeting: &'a Mutex<Option<Position>>,
    stop: &'a CancelToken,
    capacity: usize,
}

impl Worker<'_> {
    /// Searches until contact, exhaustion or a stop request, and hands back
    /// the parent map.
    fn run(self) -> Parents {
        let _finish = self.stop.cancel_on_drop();

        let mut parents: Parents =
            FxHashMap::with_capacity_and_hasher(self.capacity, Default::default());
        let mut frames: Vec<Frame> = Vec::with_capacity(self.capacity);
        frames.push(Frame::new(self.origin, None));

        while let Some(frame) = frames.last_mut() {
            if self.stop.is_cancelled() {
                break;
            }
            let here = frame.position;
            let Some((direction, next)) = frame.next_move(self.maze) else {
                frames.pop();
                continue;
            };

            let (owner, fresh) = match self.visited.entry(next) {
                Entry::Occupied(entry) => (*entry.get(), false),
                Entry::Vacant(entry) => {
                    entry.insert(self.side);
                    (self.side, true)
                }
            };
            if owner != self.side {
                parents.insert(next, here);
                let mut meeting = self.meeting.lock();
                if meeting.is_none() {
                    *meeting = Some(next);
                }
                break;
            }
            if !fresh {
                continue;
            }

            parents.insert(next, here);
            frames.push(Frame::new(next, Some(direction)));
        }

        debug!(
            "shared-map: {:?} worker stops after {} positions",
            self.side,
            parents.len()
        );
        parents
    }
}

impl Solver for SharedMapSolver {
    fn name(&self) -> &'static str {
        "shared-map"
    }

    fn solve(&self, maze: &dyn Maze, start: Position, exit: Position) -> Result<Route, SolveError> {
        if start == exit {
            return Ok(vec![start]);
        }

        let capacity = estimate_route_len(start, exit);
        let visited: DashMap<Position, Side, FxBuildHasher> =
            DashMap::with_capacity_and_hasher(capacity * 2, FxBuildHasher);
        visited.insert(start, Side::Forward);
        visited.insert(exit, Side::Backward);
        let meeting: Mutex<Option<Position>> = Mutex::new(None);
        let stop = CancelToken::new();

        let joined = thread::scope(|scope| -> io::Result<_> {
            let ahead = Worker {
                side: Side::Forward,
                maze,
                origin: start,
                visited: &visited,
                meeting: &meeting,
                stop: &stop,
                capacity,
            };
            let behind = Worker {
                side: Side::Backward,
                origin: exit,
                ..ahead
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

        let (forward, backward) = match joined {
            Ok((Ok(forward), Ok(backward))) => (forward, backward),
            Ok(_) => {
                warn!("shared-map: a search worker panicked, retrying single-threaded");
                return BacktrackSolver.solve(maze, start, exit);
            }
            Err(error) => {
                warn!(
                    "shared-map: cannot start search workers ({error}), retrying single-threaded"
                );
                return BacktrackSolver.solve(maze, start, exit);
            }
        };

        let Some(meeting) = meeting.into_inner() else {
            return Err(SolveError::NoRoute { start, exit });
        };
        Ok(splice(meeting, &forward, &backward))
    }
}

/// Follows parent pointers from `from` until a position without a parent.
fn chain(parents: &Parents, from: Position) -> Vec<Position> {
    let mut chain = vec![from];
    let mut at = from;
    while let Some(&parent) = parents.get(&at) {
        chain.push(parent);
        at = parent;
    }
    chain
}

/// Builds the route through `meeting` from the two parent maps.
///
/// Every position is marked by exactly one side, and each side's parent map
/// only points at positions that side marked, so the two chains meet only at
/// `meeting`.
fn splice(meeting: Position, forward: &Parents, backward: &Parents) -> Route {
    let mut route = chain(forward, meeting);
    route.reverse();
    route.extend(chain(backward, meeting).into_iter().skip(1));
    route
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{FIXTURES, MAZE_3X3};
    use crate::geometry::Direction;
    use crate::route::check_route;

    fn p(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn test_fixtures_yield_their_unique_route() {
        for fixture in FIXTURES {
            let maze = fixture.maze().unwrap();
            let route = SharedMapSolver
                .solve(&maze, fixture.start(), fixture.exit())
                .unwrap();
            assert_eq!(route, fixture.route, "fixture {}", fixture.name);
        }
    }

    #[test]
    fn test_both_directions_on_small_maze() {
        let maze = MAZE_3X3.maze().unwrap();
        let route = SharedMapSolver.solve(&maze, p(2, 2), p(0, 0)).unwrap();
        check_route(&maze, &route, p(2, 2), p(0, 0)).unwrap();
        assert_eq!(route.len(), 5);
    }

    #[test]
    fn test_no_passages_is_no_route() {
        let nowhere = |_: Direction, _: Position| false;
        assert_eq!(
            SharedMapSolver.solve(&nowhere, p(0, 0), p(0, 1)),
            Err(SolveError::NoRoute {
                start: p(0, 0),
                exit: p(0, 1)
            })
        );
    }

    #[test]
    fn test_open_room_with_loops() {
        let room = |direction: Direction, position: Position| {
            let next = position.neighbor(direction);
            (0..32).contains(&next.x) && (0..32).contains(&next.y)
        };
        for _ in 0..20 {
            let route = SharedMapSolver.solve(&room, p(0, 0), p(31, 31)).unwrap();
            check_route(&room, &route, p(0, 0), p(31, 31)).unwrap();
        }
    }

    #[test]
    fn test_splice_drops_duplicate_meeting_point() {
        let forward: Parents = [(p(1, 0), p(0, 0)), (p(2, 0), p(1, 0))].into_iter().collect();
        let backward: Parents = [(p(2, 0), p(3, 0))].into_iter().collect();
        assert_eq!(
            splice(p(2, 0), &forward, &backward),
            vec![p(0, 0), p(1, 0), p(2, 0), p(3, 0)]
        );
    }

    #[test]
    fn test_splice_at_an_origin() {
        let forward: Parents = [(p(1, 0), p(0, 0))].into_iter().collect();
        let backward = Parents::default();
        assert_eq!(splice(p(1, 0), &forward, &backward), vec![p(0, 0), p(1, 0)]);
    }
}
