//! Structural validation of escape routes.

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::geometry::{Direction, Position};
use crate::maze::Maze;

/// An ordered list of adjacent positions from start to exit.
pub type Route = Vec<Position>;

/// The first rule a route breaks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteDefect {
    #[error("route is empty")]
    Empty,
    #[error("route starts at {found}, expected {expected}")]
    WrongStart { expected: Position, found: Position },
    #[error("route ends at {found}, expected {expected}")]
    WrongExit { expected: Position, found: Position },
    #[error("step {index}: {from} and {to} are not adjacent")]
    NotAdjacent {
        index: usize,
        from: Position,
        to: Position,
    },
    #[error("step {index}: a wall blocks {from} -> {to}")]
    Walled {
        index: usize,
        from: Position,
        to: Position,
    },
    #[error("position {position} appears twice (again at index {index})")]
    Repeated { index: usize, position: Position },
}

/// Checks that `route` leads from `start` to `exit` through `maze` without
/// jumping, crossing walls, or visiting any position twice.
pub fn check_route(
    maze: &dyn Maze,
    route: &[Position],
    start: Position,
    exit: Position,
) -> Result<(), RouteDefect> {
    let (&first, &last) = match (route.first(), route.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(RouteDefect::Empty),
    };
    if first != start {
        return Err(RouteDefect::WrongStart {
            expected: start,
            found: first,
        });
    }
    if last != exit {
        return Err(RouteDefect::WrongExit {
            expected: exit,
            found: last,
        });
    }

    let mut seen: FxHashSet<Position> =
        FxHashSet::with_capacity_and_hasher(route.len(), Default::default());
    seen.insert(first);

    for (index, pair) in route.windows(2).enumerate() {
        let (from, to) = (pair[0], pair[1]);
        let step = index + 1;
        let Some(direction) = Direction::between(from, to) else {
            return Err(RouteDefect::NotAdjacent {
                index: step,
                from,
                to,
            });
        };
        if !maze.can_go(direction, from) {
            return Err(RouteDefect::Walled {
                index: step,
                from,
                to,
            });
        }
        if !seen.insert(to) {
            return Err(RouteDefect::Repeated {
                index: step,
                position: to,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::MAZE_3X3;

    fn p(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn test_single_position_route() {
        let nowhere = |_: Direction, _: Position| false;
        assert_eq!(check_route(&nowhere, &[p(4, 4)], p(4, 4), p(4, 4)), Ok(()));
    }

    #[test]
    fn test_defects() {
        let maze = MAZE_3X3.maze().unwrap();
        let start = p(0, 0);
        let exit = p(2, 2);

        let empty = check_route(&maze, &[], start, exit);
        assert_eq!(empty, Err(RouteDefect::Empty));
        assert!(matches!(
            check_route(&maze, &[p(1, 0), p(2, 2)], start, exit),
            Err(RouteDefect::WrongStart { .. })
        ));
        assert!(matches!(
            check_route(&maze, &[p(0, 0), p(1, 0)], start, exit),
            Err(RouteDefect::WrongExit { .. })
        ));
        assert_eq!(
            check_route(&maze, &[p(0, 0), p(2, 2)], start, exit),
            Err(RouteDefect::NotAdjacent {
                index: 1,
                from: p(0, 0),
                to: p(2, 2)
            })
        );
        // (1,0) has no passage down to (1,1)
        assert!(matches!(
            check_route(
                &maze,
                &[p(0, 0), p(1, 0), p(1, 1), p(2, 1), p(2, 2)],
                start,
                exit
            ),
            Err(RouteDefect::Walled { index: 2, .. })
        ));
        assert_eq!(
            check_route(
                &maze,
                &[
                    p(0, 0), p(1, 0), p(0, 0), p(1, 0), p(2, 0), p(2, 1), p(2, 2),
                ],
                start,
                exit
            ),
            Err(RouteDefect::Repeated {
                index: 2,
                position: p(0, 0)
            })
        );
    }
}
