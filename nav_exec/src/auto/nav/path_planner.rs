//! Plans minimum step count paths through a [`BinaryMap`], using an A* algorithm.
//!
//! Movement is 4-connected with a cost of 1 per step, and the heuristic is the Manhattan distance
//! to the goal, which is admissible and consistent for this movement model, so any path returned
//! is a shortest one.
//!
//! Ties between equal priority nodes are broken first by preferring the node closer to the goal,
//! then by preferring the node that was queued earliest. Neighbours are always queued in the order
//! up, down, left, right. Together these make the planner fully deterministic.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::{debug, trace};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use util::raise_error;

use crate::auto::{
    map::{BinaryMap, GridCell},
    path::Path,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Summary of a single planning run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanReport {
    /// Number of nodes popped from the open set and expanded.
    pub nodes_expanded: usize,

    /// Number of nodes pushed into the open set, including the start.
    pub nodes_queued: usize,

    /// True if the goal was reached.
    pub goal_reached: bool,
}

/// An entry in the open set.
#[derive(Debug, Clone, Copy)]
struct Node {
    cell: GridCell,

    /// Cost from the start to this cell
    cost: usize,

    /// Manhattan distance from this cell to the goal
    heuristic: usize,

    /// Insertion sequence number, unique per node
    seq: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("The {0} cell {1} is outside the {2}x{3} map")]
    CellOutsideMap(&'static str, GridCell, usize, usize),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Plan a shortest 4-connected path from `start` to `goal` through the free cells of `map`.
///
/// Returns the empty path if the goal cannot be reached. A path from a cell to itself is that
/// single cell.
pub fn plan(map: &BinaryMap, start: GridCell, goal: GridCell) -> Result<Path, PlanError> {
    plan_with_report(map, start, goal).map(|(path, _)| path)
}

/// As [`plan`], but also returns a [`PlanReport`] describing the search.
pub fn plan_with_report(
    map: &BinaryMap,
    start: GridCell,
    goal: GridCell,
) -> Result<(Path, PlanReport), PlanError> {
    let (height, width) = (map.height(), map.width());

    // Check both start and goal are in the map
    if !map.contains(start) {
        return Err(PlanError::CellOutsideMap("start", start, width, height));
    }
    if !map.contains(goal) {
        return Err(PlanError::CellOutsideMap("goal", goal, width, height));
    }

    let mut report = PlanReport::default();

    // Best known cost to each cell, and the cell it was reached from
    let mut cost_so_far = Array2::from_elem((height, width), usize::MAX);
    let mut came_from: Array2<Option<GridCell>> = Array2::from_elem((height, width), None);

    // Create the priority queue (binary heap) for tracking nodes
    let mut heap = BinaryHeap::new();
    let mut seq = 0;

    cost_so_far[start.idx()] = 0;
    heap.push(Node {
        cell: start,
        cost: 0,
        heuristic: start.manhattan(&goal),
        seq,
    });
    report.nodes_queued += 1;

    // Main loop
    while let Some(node) = heap.pop() {
        // A cheaper route to this cell was found after this node was queued
        if node.cost > cost_so_far[node.cell.idx()] {
            continue;
        }

        report.nodes_expanded += 1;

        if node.cell == goal {
            report.goal_reached = true;
            break;
        }

        for next in node.cell.neighbours(height, width) {
            if !map.is_free(next) {
                continue;
            }

            let new_cost = node.cost + 1;
            if new_cost < cost_so_far[next.idx()] {
                cost_so_far[next.idx()] = new_cost;
                came_from[next.idx()] = Some(node.cell);

                seq += 1;
                heap.push(Node {
                    cell: next,
                    cost: new_cost,
                    heuristic: next.manhattan(&goal),
                    seq,
                });
                report.nodes_queued += 1;
            }
        }
    }

    if !report.goal_reached {
        debug!(
            "No path from {} to {} ({} nodes expanded)",
            start, goal, report.nodes_expanded
        );
        return Ok((Path::empty(), report));
    }

    // Work backwards from the goal to get the path
    let mut cells = vec![goal];
    let mut current = goal;
    while current != start {
        current = match came_from[current.idx()] {
            Some(c) => c,
            // Every reached cell other than the start has a parent
            None => raise_error!("Cell {} reached without a parent", current),
        };
        cells.push(current);
    }
    cells.reverse();

    trace!(
        "Planned path of {} cells from {} to {} ({} nodes expanded)",
        cells.len(),
        start,
        goal,
        report.nodes_expanded
    );

    Ok((Path::from_cells(cells), report))
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Node {
    fn priority(&self) -> usize {
        self.cost + self.heuristic
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for Node {}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Note that we flip the order here so that the heap will be a min-heap, not a max-heap
        other
            .priority()
            .cmp(&self.priority())
            .then_with(|| other.heuristic.cmp(&self.heuristic))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::VecDeque;

    /// Breadth first search for the true shortest path length, used to check optimality.
    fn bfs_len(map: &BinaryMap, start: GridCell, goal: GridCell) -> Option<usize> {
        let mut dist = Array2::from_elem((map.height(), map.width()), usize::MAX);
        let mut queue = VecDeque::new();
        dist[start.idx()] = 0;
        queue.push_back(start);

        while let Some(c) = queue.pop_front() {
            if c == goal {
                return Some(dist[c.idx()] + 1);
            }
            for n in c.neighbours(map.height(), map.width()) {
                if map.is_free(n) && dist[n.idx()] == usize::MAX {
                    dist[n.idx()] = dist[c.idx()] + 1;
                    queue.push_back(n);
                }
            }
        }

        None
    }

    /// Check that the path is a valid path through the map from start to goal
    fn check_valid(map: &BinaryMap, path: &Path, start: GridCell, goal: GridCell) {
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        assert!(path.is_four_connected());
        for c in path.cells.iter().skip(1) {
            assert!(map.is_free(*c), "Path passes through obstacle at {}", c);
        }
    }

    #[test]
    fn test_open_grid() {
        let map = BinaryMap::all_free(10, 10).unwrap();
        let start = GridCell::new(0, 0);
        let goal = GridCell::new(9, 9);

        let (path, report) = plan_with_report(&map, start, goal).unwrap();

        check_valid(&map, &path, start, goal);
        assert_eq!(path.len(), 19);
        assert_eq!(path.cost(), Some(18));
        assert!(report.goal_reached);
    }

    #[test]
    fn test_start_is_goal() {
        let map = BinaryMap::all_free(5, 5).unwrap();
        let cell = GridCell::new(2, 3);

        assert_eq!(plan(&map, cell, cell).unwrap().cells, vec![cell]);
    }

    #[test]
    fn test_wall_with_gap() {
        // A vertical wall in column 5 of a 10x10 map, with a single gap at row 9
        let map = BinaryMap::from_fn(10, 10, |c| c.col != 5 || c.row == 9).unwrap();
        let start = GridCell::new(0, 0);
        let goal = GridCell::new(0, 9);

        let path = plan(&map, start, goal).unwrap();

        check_valid(&map, &path, start, goal);
        assert!(path.cells.contains(&GridCell::new(9, 5)));
        assert_eq!(path.len(), bfs_len(&map, start, goal).unwrap());
        // Down 9, across 9, up 9
        assert_eq!(path.len(), 28);
    }

    #[test]
    fn test_default_grid_wall() {
        // Wall down the middle of the default grid with a gap half way up
        let map = BinaryMap::from_fn(256, 64, |c| c.col != 128 || c.row == 32).unwrap();
        let start = GridCell::new(63, 0);
        let goal = GridCell::new(63, 255);

        let path = plan(&map, start, goal).unwrap();

        check_valid(&map, &path, start, goal);
        assert!(path.cells.contains(&GridCell::new(32, 128)));
        assert!(path.len() >= 256);
        // 255 steps across plus 31 up to the gap and 31 back down
        assert_eq!(path.len(), 318);
    }

    #[test]
    fn test_unreachable() {
        // Full wall with no gap
        let map = BinaryMap::from_fn(10, 10, |c| c.col != 5).unwrap();

        let (path, report) =
            plan_with_report(&map, GridCell::new(0, 0), GridCell::new(0, 9)).unwrap();

        assert!(path.is_empty());
        assert!(!report.goal_reached);
        // The whole left side of the wall is explored before giving up
        assert_eq!(report.nodes_expanded, 50);
    }

    #[test]
    fn test_blocked_goal() {
        let map = BinaryMap::from_fn(5, 5, |c| c != GridCell::new(4, 4)).unwrap();

        assert!(plan(&map, GridCell::new(0, 0), GridCell::new(4, 4))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_blocked_start() {
        // The start cell itself is not checked, only the cells moved into
        let map = BinaryMap::from_fn(5, 5, |c| c != GridCell::new(0, 0)).unwrap();
        let start = GridCell::new(0, 0);
        let goal = GridCell::new(0, 4);

        let path = plan(&map, start, goal).unwrap();
        check_valid(&map, &path, start, goal);
        assert_eq!(path.len(), 5);
    }

    #[test]
    fn test_outside_map() {
        let map = BinaryMap::all_free(5, 5).unwrap();

        assert!(matches!(
            plan(&map, GridCell::new(5, 0), GridCell::new(0, 0)),
            Err(PlanError::CellOutsideMap("start", ..))
        ));
        assert!(matches!(
            plan(&map, GridCell::new(0, 0), GridCell::new(0, 5)),
            Err(PlanError::CellOutsideMap("goal", ..))
        ));
    }

    #[test]
    fn test_deterministic() {
        let map = BinaryMap::from_fn(16, 8, |c| (c.row * 7 + c.col * 3) % 5 != 0).unwrap();
        let start = GridCell::new(7, 0);
        let goal = GridCell::new(7, 15);

        let first = plan(&map, start, goal).unwrap();
        for _ in 0..5 {
            assert_eq!(plan(&map, start, goal).unwrap(), first);
        }
    }

    #[test]
    fn test_tie_break_prefers_goal() {
        // On an open grid going straight across the bottom row is one of many shortest paths,
        // preferring cells closer to the goal keeps the search on that row
        let map = BinaryMap::all_free(6, 4).unwrap();
        let (path, report) =
            plan_with_report(&map, GridCell::new(3, 0), GridCell::new(3, 5)).unwrap();

        let expected: Vec<_> = (0..6).map(|c| GridCell::new(3, c)).collect();
        assert_eq!(path.cells, expected);
        assert_eq!(report.nodes_expanded, 6);
    }

    #[test]
    fn test_optimal_on_mazes() {
        // A set of pseudo-random maps, compared against a BFS
        for seed in 0..20usize {
            let map = BinaryMap::from_fn(20, 12, |c| {
                let h = (c.row * 31 + c.col * 17 + seed * 13) % 7;
                h != 0 && h != 3
            })
            .unwrap();
            let start = GridCell::new(11, 0);
            let goal = GridCell::new(11, 19);

            let path = plan(&map, start, goal).unwrap();

            match bfs_len(&map, start, goal) {
                Some(len) => {
                    check_valid(&map, &path, start, goal);
                    assert_eq!(path.len(), len);
                }
                None => assert!(path.is_empty()),
            }
        }
    }
}
