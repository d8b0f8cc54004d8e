//! The maze capability and a finite grid implementation of it.
//!
//! Solvers only ever ask one question: "can I move in this direction from
//! this position?". [`GridMaze`] answers it from a flat array of passage
//! flags, one byte per cell, row-major.

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::geometry::{Direction, Position};

/// Anything that can answer passage queries.
///
/// Implementations must be pure: the same query always gives the same
/// answer, never blocks, and may be issued from several threads at once.
/// Positions outside the maze simply report no passage.
pub trait Maze: Sync {
    fn can_go(&self, direction: Direction, position: Position) -> bool;
}

impl<F> Maze for F
where
    F: Fn(Direction, Position) -> bool + Sync,
{
    #[inline]
    fn can_go(&self, direction: Direction, position: Position) -> bool {
        self(direction, position)
    }
}

/// Passage flag bits stored per cell.
pub mod flags {
    pub const UP: u8 = 0x1;
    pub const LEFT: u8 = 0x2;
    pub const DOWN: u8 = 0x4;
    pub const RIGHT: u8 = 0x8;
}

/// Flag bit for a direction.
#[inline(always)]
pub const fn flag(direction: Direction) -> u8 {
    match direction {
        Direction::Up => flags::UP,
        Direction::Left => flags::LEFT,
        Direction::Down => flags::DOWN,
        Direction::Right => flags::RIGHT,
    }
}

/// Reasons a grid cannot be built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("a maze needs at least one row and one column")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("{width}x{height} does not fit into i32 coordinates")]
    TooLarge { width: usize, height: usize },
}

/// A finite rectangular maze with cells at `(0, 0)..(width, height)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridMaze {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl GridMaze {
    /// Builds a maze with every wall standing.
    pub fn closed(width: usize, height: usize) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::Empty);
        }
        if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
            return Err(GridError::TooLarge { width, height });
        }
        let cell_count = width
            .checked_mul(height)
            .ok_or(GridError::TooLarge { width, height })?;
        Ok(Self {
            width,
            height,
            cells: vec![0; cell_count],
        })
    }

    /// Builds a maze from rows of passage flags, top row first.
    ///
    /// Flags are taken as given; a passage recorded on only one side of a
    /// wall stays one-way.
    pub fn from_rows(rows: &[&[u8]]) -> Result<Self, GridError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.len());
        let mut maze = Self::closed(width, height)?;

        for (row_index, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(GridError::RaggedRow {
                    row: row_index,
                    expected: width,
                    found: row.len(),
                });
            }
            let offset = row_index * width;
            maze.cells[offset..offset + width].copy_from_slice(row);
        }

        Ok(maze)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells in the grid.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false: construction rejects empty grids.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The bottom-right cell.
    pub fn far_corner(&self) -> Position {
        Position::new(self.width as i32 - 1, self.height as i32 - 1)
    }

    #[inline]
    fn index(&self, position: Position) -> Option<usize> {
        let x = usize::try_from(position.x).ok()?;
        let y = usize::try_from(position.y).ok()?;
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Whether `position` lies inside the grid.
    pub fn contains(&self, position: Position) -> bool {
        self.index(position).is_some()
    }

    /// Passage flags of a cell, `0` outside the grid.
    #[inline]
    pub fn flags(&self, position: Position) -> u8 {
        self.index(position).map_or(0, |index| self.cells[index])
    }

    /// Knocks down the wall between `position` and its neighbour in
    /// `direction`, on both sides.
    ///
    /// Returns false (and changes nothing) if either cell is outside the grid.
    pub fn carve(&mut self, position: Position, direction: Direction) -> bool {
        let neighbor = position.neighbor(direction);
        match (self.index(position), self.index(neighbor)) {
            (Some(here), Some(there)) => {
                self.cells[here] |= flag(direction);
                self.cells[there] |= flag(direction.opposite());
                true
            }
            _ => false,
        }
    }
}

impl Maze for GridMaze {
    #[inline]
    fn can_go(&self, direction: Direction, position: Position) -> bool {
        self.flags(position) & flag(direction) != 0
    }
}

/// Draws the maze as ASCII art, marking the cells of `route`.
///
/// The first route cell shows as `S`, the last as `E`, the rest as `*`.
pub fn render(maze: &GridMaze, route: &[Position]) -> String {
    let start = route.first().copied();
    let exit = route.last().copied();
    let on_route: FxHashSet<Position> = route.iter().copied().collect();

    let marker = |position: Position| -> &'static str {
        if Some(position) == start {
            " S "
        } else if Some(position) == exit {
            " E "
        } else if on_route.contains(&position) {
            " * "
        } else {
            "   "
        }
    };

    let mut output = String::new();
    for y in 0..maze.height as i32 {
        // wall above the row
        for x in 0..maze.width as i32 {
            output.push('+');
            let open = maze.can_go(Direction::Up, Position::new(x, y));
            output.push_str(if open { "   " } else { "---" });
        }
        output.push_str("+\n");

        for x in 0..maze.width as i32 {
            let position = Position::new(x, y);
            let open = maze.can_go(Direction::Left, position);
            output.push(if open { ' ' } else { '|' });
            output.push_str(marker(position));
        }
        let last = Position::new(maze.width as i32 - 1, y);
        let open = maze.can_go(Direction::Right, last);
        output.push(if open { ' ' } else { '|' });
        output.push('\n');
    }

    // wall below the bottom row
    let bottom = maze.height as i32 - 1;
    for x in 0..maze.width as i32 {
        output.push('+');
        let open = maze.can_go(Direction::Down, Position::new(x, bottom));
        output.push_str(if open { "   " } else { "---" });
    }
    output.push_str("+\n");

    output
}
