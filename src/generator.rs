//! Loop-free maze generation using a randomized variant of Prim's algorithm.
//!
//! Starting from one random cell, the maze grows by merging frontier cells
//! (cells next to the maze but not yet part of it) into a random neighbour
//! that already belongs to the maze. Every merge knocks down exactly one
//! wall, so the result is a spanning tree of the grid: fully connected and
//! without loops. Any two cells are joined by exactly one simple path.

use std::collections::VecDeque;

use rand::Rng;

use crate::geometry::{Direction, Position};
use crate::maze::{GridError, GridMaze};

/// Generates a `width` x `height` maze.
///
/// The same dimensions and the same RNG state always produce the same maze.
pub fn generate<R: Rng + ?Sized>(
    width: usize,
    height: usize,
    rng: &mut R,
) -> Result<GridMaze, GridError> {
    let mut maze = GridMaze::closed(width, height)?;
    let mut merged = vec![false; maze.len()];
    let index = |position: Position| position.y as usize * width + position.x as usize;

    let seed = Position::new(
        rng.gen_range(0..width) as i32,
        rng.gen_range(0..height) as i32,
    );
    merged[index(seed)] = true;

    let mut frontier: VecDeque<Position> = VecDeque::new();
    push_frontier(&maze, seed, &merged, index, &mut frontier);

    let mut anchors: Vec<Direction> = Vec::with_capacity(Direction::ALL.len());
    while let Some(cell) = frontier.pop_front() {
        if merged[index(cell)] {
            continue;
        }
        // defer some merges so the tree does not grow in neat rings
        if !rng.gen_ratio(3, 4) {
            frontier.push_back(cell);
            continue;
        }

        anchors.clear();
        anchors.extend(Direction::ALL.into_iter().filter(|&direction| {
            let neighbor = cell.neighbor(direction);
            maze.contains(neighbor) && merged[index(neighbor)]
        }));
        let direction = anchors[rng.gen_range(0..anchors.len())];

        maze.carve(cell, direction);
        merged[index(cell)] = true;
        push_frontier(&maze, cell, &merged, index, &mut frontier);
    }

    Ok(maze)
}

/// Queues the in-grid neighbours of `cell` that are not part of the maze yet.
fn push_frontier(
    maze: &GridMaze,
    cell: Position,
    merged: &[bool],
    index: impl Fn(Position) -> usize,
    queue: &mut VecDeque<Position>,
) {
    for direction in Direction::ALL {
        let neighbor = cell.neighbor(direction);
        if maze.contains(neighbor) && !merged[index(neighbor)] {
            queue.push_back(neighbor);
        }
    }
}
