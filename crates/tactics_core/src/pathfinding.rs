//! Grid pathfinding: budget-bounded A* and movement-range flood fill.
//!
//! Movement is 4-directional with a uniform step cost of 1, so Manhattan
//! distance is an admissible heuristic. Both searches accept an extra
//! passability predicate on top of the grid's walkable flag, which the turn
//! controller uses to keep units from walking through each other.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};

use crate::grid::{Coord, TileGrid};

/// A node in the A* open set priority queue.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct AStarNode {
    at: Coord,
    /// Cost from the start.
    g_score: u32,
    /// g_score + heuristic.
    f_score: u32,
    /// Insertion sequence; equal f-scores pop first-in first-out.
    sequence: u64,
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so we reverse the comparison for min-heap behavior.
        match other.f_score.cmp(&self.f_score) {
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            ord => ord,
        }
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Manhattan distance heuristic (exact on an empty grid).
#[inline]
fn manhattan_heuristic(from: Coord, to: Coord) -> u32 {
    from.manhattan(to)
}

/// Movement cost of a path: one per step.
#[must_use]
pub fn path_cost(path: &[Coord]) -> u32 {
    path.len().saturating_sub(1) as u32
}

/// Find a path from `start` towards `goal` spending at most `budget` steps.
///
/// See [`find_path_with`].
#[must_use]
pub fn find_path(grid: &TileGrid, start: Coord, goal: Coord, budget: u32) -> Vec<Coord> {
    find_path_with(grid, start, goal, budget, |_| true)
}

/// Find a path from `start` towards `goal` spending at most `budget` steps.
///
/// Tiles are enterable when they are walkable and `passable` returns true.
/// The search stops when it pops `goal`, or when it pops a node whose cost
/// has reached `budget`; in the second case the returned path ends at that
/// frontier node instead of `goal`. Callers must compare the last element
/// with `goal` to know whether the destination was reached.
///
/// The path starts with `start`. It is empty when `goal` cannot be entered
/// or the reachable area runs out before the budget does.
#[must_use]
pub fn find_path_with<F>(
    grid: &TileGrid,
    start: Coord,
    goal: Coord,
    budget: u32,
    passable: F,
) -> Vec<Coord>
where
    F: Fn(Coord) -> bool,
{
    if !grid.in_bounds(start) || !grid.is_walkable(goal) {
        return Vec::new();
    }
    if start == goal {
        return vec![start];
    }
    if !passable(goal) {
        return Vec::new();
    }

    let mut open_set: BinaryHeap<AStarNode> = BinaryHeap::new();
    let mut came_from: HashMap<Coord, Coord> = HashMap::new();
    let mut g_score: HashMap<Coord, u32> = HashMap::new();
    let mut sequence = 0u64;

    g_score.insert(start, 0);
    open_set.push(AStarNode {
        at: start,
        g_score: 0,
        f_score: manhattan_heuristic(start, goal),
        sequence,
    });

    while let Some(current) = open_set.pop() {
        // Skip entries superseded by a cheaper route
        if g_score.get(&current.at).is_some_and(|&g| current.g_score > g) {
            continue;
        }

        if current.at == goal || current.g_score >= budget {
            tracing::trace!(
                from = %start,
                to = %current.at,
                reached_goal = current.at == goal,
                "path found"
            );
            return reconstruct_path(&came_from, current.at);
        }

        for next in grid.neighbors(current.at) {
            if !grid.is_walkable(next) || !passable(next) {
                continue;
            }

            let tentative_g = current.g_score + 1;
            let neighbor_g = g_score.get(&next).copied().unwrap_or(u32::MAX);

            if tentative_g < neighbor_g {
                came_from.insert(next, current.at);
                g_score.insert(next, tentative_g);
                sequence += 1;
                open_set.push(AStarNode {
                    at: next,
                    g_score: tentative_g,
                    f_score: tentative_g + manhattan_heuristic(next, goal),
                    sequence,
                });
            }
        }
    }

    Vec::new()
}

/// Reconstruct path from came_from map.
fn reconstruct_path(came_from: &HashMap<Coord, Coord>, end: Coord) -> Vec<Coord> {
    let mut path = vec![end];
    let mut current = end;

    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }

    path.reverse();
    path
}

/// Every tile reachable from `origin` within `budget` steps.
///
/// See [`find_tiles_in_range_with`].
#[must_use]
pub fn find_tiles_in_range(grid: &TileGrid, origin: Coord, budget: u32) -> Vec<Coord> {
    find_tiles_in_range_with(grid, origin, budget, |_| true)
}

/// Every tile reachable from `origin` within `budget` steps without
/// crossing an unwalkable or impassable tile.
///
/// Breadth-first, so tiles come out in order of distance. The origin itself
/// is included (distance 0) when it is on the grid.
#[must_use]
pub fn find_tiles_in_range_with<F>(
    grid: &TileGrid,
    origin: Coord,
    budget: u32,
    passable: F,
) -> Vec<Coord>
where
    F: Fn(Coord) -> bool,
{
    if !grid.in_bounds(origin) {
        return Vec::new();
    }

    let mut distance: HashMap<Coord, u32> = HashMap::new();
    let mut frontier = VecDeque::new();
    let mut reached = vec![origin];

    distance.insert(origin, 0);
    frontier.push_back(origin);

    while let Some(current) = frontier.pop_front() {
        let d = distance[&current];
        if d >= budget {
            continue;
        }
        for next in grid.neighbors(current) {
            if distance.contains_key(&next) || !grid.is_walkable(next) || !passable(next) {
                continue;
            }
            distance.insert(next, d + 1);
            reached.push(next);
            frontier.push_back(next);
        }
    }

    reached
}
