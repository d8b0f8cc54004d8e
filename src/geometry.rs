//! Grid coordinates and the four movement directions.
//!
//! Mazes are laid out with `x` growing to the right and `y` growing
//! downwards, so `Up` decrements `y`.

use std::fmt;

/// One of the four moves available from a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Up,
    Left,
    Down,
    Right,
}

impl Direction {
    /// All directions in declaration order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Left,
        Direction::Down,
        Direction::Right,
    ];

    /// The move that undoes this one.
    #[inline]
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Position of this direction in [`Direction::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Offset `(dx, dy)` applied by this move.
    #[inline]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Down => (0, 1),
            Direction::Right => (1, 0),
        }
    }

    /// Returns the direction leading from `from` to the adjacent `to`.
    ///
    /// Returns `None` if the two positions are not grid neighbours.
    pub fn between(from: Position, to: Position) -> Option<Direction> {
        let dx = to.x.wrapping_sub(from.x);
        let dy = to.y.wrapping_sub(from.y);
        match (dx, dy) {
            (0, -1) => Some(Direction::Up),
            (-1, 0) => Some(Direction::Left),
            (0, 1) => Some(Direction::Down),
            (1, 0) => Some(Direction::Right),
            _ => None,
        }
    }
}

/// An immutable 2D integer coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The adjacent position one step in `direction`.
    ///
    /// Coordinates wrap at the `i32` bounds instead of overflowing; a maze
    /// never reports a passage leading there anyway.
    #[inline]
    pub const fn neighbor(self, direction: Direction) -> Position {
        let (dx, dy) = direction.delta();
        Position::new(self.x.wrapping_add(dx), self.y.wrapping_add(dy))
    }

    /// Grid distance to `other`, saturating instead of overflowing.
    #[inline]
    pub fn manhattan(self, other: Position) -> u64 {
        let dx = (i64::from(self.x) - i64::from(other.x)).unsigned_abs();
        let dy = (i64::from(self.y) - i64::from(other.y)).unsigned_abs();
        dx.saturating_add(dy)
    }

    /// Largest per-axis distance to `other`.
    #[inline]
    pub fn chebyshev(self, other: Position) -> u64 {
        let dx = (i64::from(self.x) - i64::from(other.x)).unsigned_abs();
        let dy = (i64::from(self.y) - i64::from(other.y)).unsigned_abs();
        dx.max(dy)
    }

    /// Whether `other` is exactly one step away.
    #[inline]
    pub fn is_adjacent(self, other: Position) -> bool {
        self.manhattan(other) == 1
    }

    /// Cheap coordinate mix used to spread positions over the
    /// direction permutation table.
    #[inline]
    pub(crate) const fn spread(self) -> u32 {
        let a = (self.x.wrapping_add(1) as u32).wrapping_mul(727);
        let b = (self.y.wrapping_neg().wrapping_add(1) as u32).wrapping_mul(911);
        a ^ b
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposites_are_involutions() {
        for direction in Direction::ALL {
            assert_ne!(direction, direction.opposite());
            assert_eq!(direction, direction.opposite().opposite());
        }
    }

    #[test]
    fn test_neighbor_and_back() {
        let origin = Position::new(3, 7);
        for direction in Direction::ALL {
            let next = origin.neighbor(direction);
            assert!(origin.is_adjacent(next));
            assert_eq!(next.neighbor(direction.opposite()), origin);
            assert_eq!(Direction::between(origin, next), Some(direction));
        }
    }

    #[test]
    fn test_up_decrements_y() {
        let origin = Position::new(0, 0);
        assert_eq!(origin.neighbor(Direction::Up), Position::new(0, -1));
        assert_eq!(origin.neighbor(Direction::Right), Position::new(1, 0));
    }

    #[test]
    fn test_manhattan_does_not_overflow() {
        let a = Position::new(i32::MIN, i32::MIN);
        let b = Position::new(i32::MAX, i32::MAX);
        assert_eq!(a.manhattan(b), 2 * (u32::MAX as u64));
        assert!(!a.is_adjacent(b));
        assert_eq!(a.chebyshev(b), u32::MAX as u64);
        assert_eq!(Position::new(1, 5).chebyshev(Position::new(4, 3)), 3);
    }

    #[test]
    fn test_between_rejects_distant_positions() {
        let origin = Position::new(0, 0);
        assert_eq!(Direction::between(origin, origin), None);
        assert_eq!(Direction::between(origin, Position::new(1, 1)), None);
        assert_eq!(Direction::between(origin, Position::new(2, 0)), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Position::new(-4, 12).to_string(), "-4,12");
    }
}
