//! Example mazes with their known escape routes.
//!
//! Every fixture is loop-free, so the route from its first to its last
//! position is the only simple path between them.

use crate::geometry::Position;
use crate::maze::{GridError, GridMaze};

/// A hand-made maze and the route through it.
pub struct Fixture {
    pub name: &'static str,
    /// Passage flags, top row first (see [`crate::maze::flags`]).
    pub rows: &'static [&'static [u8]],
    /// The unique route from `start()` to `exit()`.
    pub route: &'static [Position],
}

impl Fixture {
    pub fn maze(&self) -> Result<GridMaze, GridError> {
        GridMaze::from_rows(self.rows)
    }

    pub fn start(&self) -> Position {
        self.route[0]
    }

    pub fn exit(&self) -> Position {
        self.route[self.route.len() - 1]
    }
}

const fn at(x: i32, y: i32) -> Position {
    Position::new(x, y)
}

/// 3x3 maze, solved from the top-left to the bottom-right corner.
pub const MAZE_3X3: Fixture = Fixture {
    name: "3x3",
    rows: &[
        &[0xc, 0xa, 0x6],
        &[0xd, 0x6, 0x5],
        &[0x1, 0x1, 0x1],
    ],
    route: &[at(0, 0), at(1, 0), at(2, 0), at(2, 1), at(2, 2)],
};

/// 7x7 maze, solved from the top-left to the bottom-right corner.
pub const MAZE_7X7: Fixture = Fixture {
    name: "7x7",
    rows: &[
        &[0x8, 0xa, 0xa, 0x6, 0x8, 0x6, 0x4],
        &[0xc, 0xa, 0xe, 0x7, 0x8, 0xb, 0x7],
        &[0x1, 0x8, 0x3, 0xd, 0xa, 0xe, 0x7],
        &[0xc, 0xa, 0xa, 0x7, 0xc, 0x7, 0x5],
        &[0x5, 0xc, 0xe, 0x3, 0x5, 0x1, 0x5],
        &[0x5, 0x1, 0x5, 0x8, 0x3, 0xc, 0x7],
        &[0x1, 0x8, 0x3, 0x8, 0xa, 0x3, 0x1],
    ],
    route: &[
        at(0, 0), at(1, 0), at(2, 0), at(3, 0), at(3, 1), at(3, 2), at(4, 2), at(5, 2), at(6, 2),
        at(6, 3), at(6, 4), at(6, 5), at(6, 6),
    ],
};

/// 12x6 maze, solved from the top-left to the bottom-right corner.
pub const MAZE_12X6: Fixture = Fixture {
    name: "12x6",
    rows: &[
        &[
            0xc, 0xe, 0xe, 0xe, 0xa, 0x2, 0x4, 0xc, 0xa, 0x2, 0x4, 0x4,
        ],
        &[
            0x1, 0x1, 0x5, 0xd, 0xe, 0xe, 0xf, 0xf, 0xe, 0xa, 0xf, 0x3,
        ],
        &[
            0xc, 0xe, 0x7, 0x5, 0x1, 0x5, 0x1, 0x5, 0x9, 0x6, 0xd, 0x6,
        ],
        &[
            0x5, 0x1, 0x5, 0x9, 0x6, 0x9, 0x6, 0x5, 0x4, 0x5, 0x5, 0x5,
        ],
        &[
            0x5, 0xc, 0xf, 0x2, 0xd, 0x6, 0x5, 0xd, 0x3, 0x5, 0x1, 0x5,
        ],
        &[
            0x1, 0x1, 0x1, 0x8, 0x3, 0x1, 0x1, 0x9, 0x2, 0x9, 0x2, 0x1,
        ],
    ],
    route: &[
        at(0, 0), at(1, 0), at(2, 0), at(3, 0), at(3, 1), at(4, 1), at(5, 1), at(6, 1), at(7, 1),
        at(8, 1), at(9, 1), at(10, 1), at(10, 2), at(11, 2), at(11, 3), at(11, 4), at(11, 5),
    ],
};

/// All fixtures, smallest first.
pub const FIXTURES: &[Fixture] = &[MAZE_3X3, MAZE_7X7, MAZE_12X6];

/// Looks a fixture up by name (`"3x3"`, `"7x7"`, `"12x6"`).
pub fn by_name(name: &str) -> Option<&'static Fixture> {
    FIXTURES.iter().find(|fixture| fixture.name == name)
}
