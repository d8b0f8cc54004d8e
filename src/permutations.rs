//! Precomputed orderings of the direction set.
//!
//! A search that always tries directions in the same order drifts towards
//! one corner of the maze. Instead each cell picks one of the permutations
//! below, selected by a cheap hash of its coordinates, so the tried order
//! varies across the grid while staying deterministic.
//!
//! After the first step the direction leading straight back is dropped:
//! the cell we came from is already on the path. That leaves 4! orderings
//! for the start cell and 3! orderings per incoming direction.
//!
//! [`DIRECTED`] is the alternative for searches that know where they are
//! heading: it tries the directions pointing at the target first.

use crate::geometry::{Direction, Position};

/// Number of orderings of all four directions.
pub const FIRST_STEP_ORDERS: usize = 24;

/// Number of orderings of the three directions left after a move.
pub const LATER_STEP_ORDERS: usize = 6;

/// Lookup table keyed by the last direction taken.
pub struct PermutationTable {
    first: [[Direction; 4]; FIRST_STEP_ORDERS],
    later: [[[Direction; 3]; LATER_STEP_ORDERS]; 4],
}

/// The shared, read-only table.
pub static PERMUTATIONS: PermutationTable = PermutationTable::build();

/// Advances `items` to the next lexicographic permutation.
///
/// Returns `None` once `items` is the last (descending) permutation.
const fn next_permutation<const N: usize>(mut items: [u8; N]) -> Option<[u8; N]> {
    if N < 2 {
        return None;
    }

    // longest descending suffix starts at `head`
    let mut head = N - 1;
    while head > 0 && items[head - 1] >= items[head] {
        head -= 1;
    }
    if head == 0 {
        return None;
    }

    let pivot = head - 1;
    let mut successor = N - 1;
    while items[successor] <= items[pivot] {
        successor -= 1;
    }
    let swapped = items[pivot];
    items[pivot] = items[successor];
    items[successor] = swapped;

    let mut low = head;
    let mut high = N - 1;
    while low < high {
        let swapped = items[low];
        items[low] = items[high];
        items[high] = swapped;
        low += 1;
        high -= 1;
    }

    Some(items)
}

impl PermutationTable {
    const fn build() -> Self {
        let mut first = [[Direction::Up; 4]; FIRST_STEP_ORDERS];
        let mut order = [0u8, 1, 2, 3];
        let mut row = 0;
        loop {
            let mut i = 0;
            while i < 4 {
                first[row][i] = Direction::ALL[order[i] as usize];
                i += 1;
            }
            row += 1;
            match next_permutation(order) {
                Some(next) => order = next,
                None => break,
            }
        }
        assert!(row == FIRST_STEP_ORDERS);

        let mut later = [[[Direction::Up; 3]; LATER_STEP_ORDERS]; 4];
        let mut last = 0;
        while last < 4 {
            let banned = Direction::ALL[last].opposite().index();

            let mut order = [0u8; 3];
            let mut filled = 0;
            let mut candidate = 0;
            while candidate < 4 {
                if candidate != banned {
                    order[filled] = candidate as u8;
                    filled += 1;
                }
                candidate += 1;
            }

            let mut row = 0;
            loop {
                let mut i = 0;
                while i < 3 {
                    later[last][row][i] = Direction::ALL[order[i] as usize];
                    i += 1;
                }
                row += 1;
                match next_permutation(order) {
                    Some(next) => order = next,
                    None => break,
                }
            }
            assert!(row == LATER_STEP_ORDERS);
            last += 1;
        }

        Self { first, later }
    }

    /// Directions to try at `position`, given the move that led there.
    ///
    /// `None` means `position` is where the search started, so all four
    /// directions are candidates.
    #[inline]
    pub fn order(&self, last: Option<Direction>, position: Position) -> &[Direction] {
        let pick = position.spread() as usize;
        match last {
            None => &self.first[pick % FIRST_STEP_ORDERS],
            Some(direction) => &self.later[direction.index()][pick % LATER_STEP_ORDERS],
        }
    }
}

/// Number of headings towards a target: each axis is level, ahead or behind.
pub const HEADINGS: usize = 9;

/// Lookup table keyed by the last direction taken and the heading of the
/// target, best direction first.
pub struct DirectedTable {
    first: [[Direction; 4]; HEADINGS],
    later: [[[Direction; 3]; HEADINGS]; 4],
}

/// The shared, read-only table of target-directed orderings.
pub static DIRECTED: DirectedTable = DirectedTable::build();

/// 0 when level, 1 when the target lies ahead, 2 when behind.
const fn axis_heading(delta: i64) -> usize {
    if delta == 0 {
        0
    } else if delta > 0 {
        1
    } else {
        2
    }
}

/// Heading index of `to` as seen from `from`.
const fn heading(from: Position, to: Position) -> usize {
    let dx = to.x as i64 - from.x as i64;
    let dy = to.y as i64 - from.y as i64;
    axis_heading(dx) + 3 * axis_heading(dy)
}

/// Unit offset pointing along a heading.
const fn heading_offset(heading: usize) -> (i32, i32) {
    const UNIT: [i32; 3] = [0, 1, -1];
    (UNIT[heading % 3], UNIT[heading / 3])
}

/// Squared distance from the cell one step in `direction` to `offset`.
const fn miss(direction: Direction, offset: (i32, i32)) -> i32 {
    let (dx, dy) = direction.delta();
    let (ex, ey) = (offset.0 - dx, offset.1 - dy);
    ex * ex + ey * ey
}

/// Stable insertion sort of `order` by [`miss`].
const fn sort_toward<const N: usize>(
    mut order: [Direction; N],
    offset: (i32, i32),
) -> [Direction; N] {
    let mut i = 1;
    while i < N {
        let mut j = i;
        while j > 0 && miss(order[j - 1], offset) > miss(order[j], offset) {
            let swapped = order[j - 1];
            order[j - 1] = order[j];
            order[j] = swapped;
            j -= 1;
        }
        i += 1;
    }
    order
}

/// The directions other than the reverse of `last`, in declaration order.
const fn onward(last: Direction) -> [Direction; 3] {
    let banned = last.opposite().index();
    let mut onward = [Direction::Up; 3];
    let mut filled = 0;
    let mut candidate = 0;
    while candidate < 4 {
        if candidate != banned {
            onward[filled] = Direction::ALL[candidate];
            filled += 1;
        }
        candidate += 1;
    }
    onward
}

impl DirectedTable {
    const fn build() -> Self {
        let mut first = [Direction::ALL; HEADINGS];
        let mut later = [[[Direction::Up; 3]; HEADINGS]; 4];
        let mut heading = 0;
        while heading < HEADINGS {
            let offset = heading_offset(heading);
            first[heading] = sort_toward(Direction::ALL, offset);
            let mut last = 0;
            while last < 4 {
                later[last][heading] = sort_toward(onward(Direction::ALL[last]), offset);
                last += 1;
            }
            heading += 1;
        }
        Self { first, later }
    }

    /// Directions to try at `position` on the way to `target`, given the
    /// move that led there. Ties keep declaration order.
    #[inline]
    pub fn order(
        &self,
        last: Option<Direction>,
        position: Position,
        target: Position,
    ) -> &[Direction] {
        let heading = heading(position, target);
        match last {
            None => &self.first[heading],
            Some(direction) => &self.later[direction.index()][heading],
        }
    }
}
