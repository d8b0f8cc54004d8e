//! Fork-join search on a bounded rayon pool.
//!
//! A single logical depth-first search that hands whole branches to new
//! tasks. Every position is claimed exactly once in a shared set; the task
//! that claims a position owns its neighbour list, so no two tasks ever
//! explore the same cell. A task forks at a branch point when its path has
//! grown by at least `fork_distance` positions past the point of its last
//! fork and a worker credit is free. The forked task starts from the branch position
//! with a private copy of the path leading to it and never backtracks past
//! that position.
//!
//! The first task to claim the exit stores its route and cancels the rest.

use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use dashmap::DashSet;
use log::{debug, warn};
use parking_lot::Mutex;
use rayon::{Scope, ThreadPoolBuilder};
use rustc_hash::FxBuildHasher;

use crate::geometry::{Direction, Position};
use crate::maze::Maze;
use crate::route::Route;
use crate::solver::backtrack::{BacktrackSolver, Frame};
use crate::solver::sync::{CancelToken, Credit, Credits};
use crate::solver::{estimate_route_len, SolveError};
use crate::Solver;

/// Net path growth a task needs before it may fork again.
pub const FORK_DISTANCE: usize = 16;

/// Parallel engine forking tasks at branch points.
#[derive(Clone, Copy, Debug)]
pub struct ForkJoinSolver {
    /// Pool size; also bounds the number of live tasks.
    pub workers: usize,
    pub fork_distance: usize,
}

impl Default for ForkJoinSolver {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism().map_or(1, NonZeroUsize::get),
            fork_distance: FORK_DISTANCE,
        }
    }
}

impl ForkJoinSolver {
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }
}

/// State shared by every task of one solve call.
struct Search<'a> {
    maze: &'a dyn Maze,
    exit: Position,
    fork_distance: usize,
    claimed: DashSet<Position, FxBuildHasher>,
    credits: Credits,
    stop: CancelToken,
    winner: Mutex<Option<Route>>,
    forks: AtomicUsize,
    live: AtomicUsize,
    peak_live: AtomicUsize,
}

/// What a fork-join solve did besides finding a route.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ForkStats {
    /// Tasks spawned at branch points.
    pub forks: usize,
    /// Most forked tasks alive at the same time.
    pub peak_live: usize,
}

/// A forked task's worker credit, counted as live until the task ends.
struct Lease<'s> {
    _credit: Credit<'s>,
    live: &'s AtomicUsize,
}

impl<'s> Lease<'s> {
    fn new(credit: Credit<'s>, live: &'s AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = live.fetch_add(1, Ordering::AcqRel) + 1;
        peak.fetch_max(now, Ordering::AcqRel);
        Self {
            _credit: credit,
            live,
        }
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A branch handed to a new task.
struct Task<'s> {
    /// Route from the start up to, but excluding, `root`.
    prefix: Vec<Position>,
    root: Position,
    arrived_by: Option<Direction>,
    _lease: Option<Lease<'s>>,
}

/// Path depth of a task's last fork, lowered as the task backtracks past it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ForkMark(usize);

impl ForkMark {
    fn due(self, depth: usize, distance: usize) -> bool {
        depth >= self.0.saturating_add(distance)
    }

    fn retreat(&mut self, depth: usize) {
        self.0 = self.0.min(depth);
    }
}

impl Search<'_> {
    fn explore<'s>(&'s self, scope: &Scope<'s>, task: Task<'s>) {
        let mut frames: Vec<Frame> = vec![Frame::new(task.root, task.arrived_by)];
        let mut mark = ForkMark(frames.len());

        while let Some(frame) = frames.last_mut() {
            if self.stop.is_cancelled() {
                return;
            }
            let Some((direction, next)) = frame.next_move(self.maze) else {
                frames.pop();
                mark.retreat(frames.len());
                continue;
            };
            if !self.claimed.insert(next) {
                continue;
            }
            if next == self.exit {
                let mut route = self.path_to(&task.prefix, &frames);
                route.push(next);
                self.finish(route);
                return;
            }

            frames.push(Frame::new(next, Some(direction)));
            if mark.due(frames.len(), self.fork_distance)
                && self.fork(scope, &task.prefix, &frames)
            {
                mark = ForkMark(frames.len());
            }
        }
    }

    /// Hands the extra branches at the top frame to new tasks, one credit
    /// each. Returns whether anything was forked.
    fn fork<'s>(&'s self, scope: &Scope<'s>, prefix: &[Position], frames: &[Frame]) -> bool {
        let Some(frame) = frames.last() else {
            return false;
        };
        if self.credits.available() == 0 {
            return false;
        }

        let here = frame.position;
        let mut branches = [(Direction::Up, here); 4];
        let mut count = 0;
        for &direction in frame.untried() {
            let next = here.neighbor(direction);
            if self.maze.can_go(direction, here) && !self.claimed.contains(&next) {
                branches[count] = (direction, next);
                count += 1;
            }
        }
        if count < 2 {
            return false;
        }

        // the first branch stays with this task
        let mut forked = false;
        for &(direction, next) in &branches[1..count] {
            let Some(credit) = self.credits.try_acquire() else {
                break;
            };
            if !self.claimed.insert(next) {
                continue;
            }
            let mut path = self.path_to(prefix, frames);
            if next == self.exit {
                path.push(next);
                self.finish(path);
                return true;
            }

            self.forks.fetch_add(1, Ordering::Relaxed);
            forked = true;
            let task = Task {
                prefix: path,
                root: next,
                arrived_by: Some(direction),
                _lease: Some(Lease::new(credit, &self.live, &self.peak_live)),
            };
            scope.spawn(move |scope| self.explore(scope, task));
        }
        forked
    }

    fn path_to(&self, prefix: &[Position], frames: &[Frame]) -> Vec<Position> {
        let mut path = Vec::with_capacity(prefix.len() + frames.len() + 1);
        path.extend_from_slice(prefix);
        path.extend(frames.iter().map(|frame| frame.position));
        path
    }

    fn finish(&self, route: Route) {
        let mut winner = self.winner.lock();
        if winner.is_none() {
            *winner = Some(route);
        }
        self.stop.cancel();
    }
}

impl Solver for ForkJoinSolver {
    fn name(&self) -> &'static str {
        "fork-join"
    }

    fn solve(&self, maze: &dyn Maze, start: Position, exit: Position) -> Result<Route, SolveError> {
        self.solve_with_stats(maze, start, exit).0
    }
}

impl ForkJoinSolver {
    /// Solves like [`Solver::solve`] and also reports how the search forked.
    pub(crate) fn solve_with_stats(
        &self,
        maze: &dyn Maze,
        start: Position,
        exit: Position,
    ) -> (Result<Route, SolveError>, ForkStats) {
        if start == exit {
            return (Ok(vec![start]), ForkStats::default());
        }

        let workers = self.workers.max(1);
        let pool = match ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("escape-fork-{index}"))
            .build()
        {
            Ok(pool) => pool,
            Err(error) => {
                warn!("fork-join: cannot build worker pool ({error}), retrying single-threaded");
                let route = BacktrackSolver.solve(maze, start, exit);
                return (route, ForkStats::default());
            }
        };

        let capacity = estimate_route_len(start, exit);
        let search = Search {
            maze,
            exit,
            fork_distance: self.fork_distance.max(1),
            claimed: DashSet::with_capacity_and_hasher(capacity * 4, FxBuildHasher),
            // the root task runs without a credit
            credits: Credits::new(workers - 1),
            stop: CancelToken::new(),
            winner: Mutex::new(None),
            forks: AtomicUsize::new(0),
            live: AtomicUsize::new(0),
            peak_live: AtomicUsize::new(0),
        };
        search.claimed.insert(start);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            pool.scope(|scope| {
                let root = Task {
                    prefix: Vec::new(),
                    root: start,
                    arrived_by: None,
                    _lease: None,
                };
                search.explore(scope, root);
            })
        }));
        if outcome.is_err() {
            warn!("fork-join: a search task panicked, retrying single-threaded");
            let route = BacktrackSolver.solve(maze, start, exit);
            return (route, ForkStats::default());
        }

        let stats = ForkStats {
            forks: search.forks.load(Ordering::Relaxed),
            peak_live: search.peak_live.load(Ordering::Acquire),
        };
        debug!(
            "fork-join: {} forks, at most {} at once, {} positions claimed",
            stats.forks,
            stats.peak_live,
            search.claimed.len()
        );
        let route = search
            .winner
            .into_inner()
            .ok_or(SolveError::NoRoute { start, exit });
        (route, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::FIXTURES;
    use crate::generator::generate;
    use crate::route::check_route;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn p(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn test_fixtures_yield_their_unique_route() {
        for fixture in FIXTURES {
            let maze = fixture.maze().unwrap();
            let route = ForkJoinSolver::with_workers(4)
                .solve(&maze, fixture.start(), fixture.exit())
                .unwrap();
            assert_eq!(route, fixture.route, "fixture {}", fixture.name);
        }
    }

    fn open_room(direction: Direction, position: Position) -> bool {
        let next = position.neighbor(direction);
        (0..64).contains(&next.x) && (0..64).contains(&next.y)
    }

    #[test]
    fn test_forks_on_an_open_room() {
        let solver = ForkJoinSolver {
            workers: 4,
            fork_distance: 1,
        };
        for _ in 0..10 {
            let (route, stats) = solver.solve_with_stats(&open_room, p(0, 0), p(63, 63));
            check_route(&open_room, &route.unwrap(), p(0, 0), p(63, 63)).unwrap();
            assert!(stats.forks >= 1, "{stats:?}");
        }
    }

    #[test]
    fn test_live_forks_stay_within_credits() {
        for workers in [2, 4] {
            let solver = ForkJoinSolver {
                workers,
                fork_distance: 1,
            };
            for _ in 0..10 {
                let (route, stats) = solver.solve_with_stats(&open_room, p(0, 0), p(63, 63));
                assert!(route.is_ok());
                assert!(stats.peak_live <= workers - 1, "{workers}: {stats:?}");
            }
        }
    }

    #[test]
    fn test_single_worker_never_forks() {
        let maze = generate(30, 30, &mut StdRng::seed_from_u64(3)).unwrap();
        let exit = maze.far_corner();
        let solver = ForkJoinSolver {
            workers: 1,
            fork_distance: 1,
        };
        let (route, stats) = solver.solve_with_stats(&maze, p(0, 0), exit);
        check_route(&maze, &route.unwrap(), p(0, 0), exit).unwrap();
        assert_eq!(stats, ForkStats::default());

        let (route, stats) = solver.solve_with_stats(&open_room, p(0, 0), p(63, 63));
        assert!(route.is_ok());
        assert_eq!(stats.forks, 0);
    }

    #[test]
    fn test_fork_waits_for_net_path_growth() {
        let mut mark = ForkMark(30);
        // dead ends explored at or above the mark do not count
        assert!(!mark.due(30, 16));
        assert!(!mark.due(45, 16));
        assert!(mark.due(46, 16));

        // after backtracking to depth 10 the task needs 16 fresh steps
        mark.retreat(10);
        assert!(!mark.due(25, 16));
        assert!(mark.due(26, 16));

        // climbing back never raises the mark
        mark.retreat(40);
        assert_eq!(mark, ForkMark(10));
    }

    #[test]
    fn test_unreachable_exit_is_no_route() {
        let rooms = |direction: Direction, position: Position| {
            let next = position.neighbor(direction);
            let room = |q: Position| {
                (0..6).contains(&q.y) && ((0..6).contains(&q.x) || (7..13).contains(&q.x))
            };
            room(position) && room(next)
        };
        let solver = ForkJoinSolver {
            workers: 4,
            fork_distance: 1,
        };
        assert_eq!(
            solver.solve(&rooms, p(0, 0), p(12, 5)),
            Err(SolveError::NoRoute {
                start: p(0, 0),
                exit: p(12, 5)
            })
        );
    }

    #[test]
    fn test_default_tuning() {
        let solver = ForkJoinSolver::default();
        assert!(solver.workers >= 1);
        assert_eq!(solver.fork_distance, FORK_DISTANCE);
    }
}
