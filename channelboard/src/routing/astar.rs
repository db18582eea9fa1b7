//! Grid A* with a turn penalty.
//!
//! Search state is (cell, incoming direction) so that direction changes can
//! be charged. Costs are integers: 1000 per orthogonal step, 1414 per diagonal.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::routing::grid::{Cell, ObstacleGrid};

/// 8 directions for octilinear routing
pub const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),   // East
    (1, -1),  // NE
    (0, -1),  // North
    (-1, -1), // NW
    (-1, 0),  // West
    (-1, 1),  // SW
    (0, 1),   // South
    (1, 1),   // SE
];

pub const ORTHO_COST: i64 = 1000;
pub const DIAG_COST: i64 = 1414;

const NO_DIRECTION: usize = 8;
const STATES_PER_CELL: usize = 9;

/// Open set entry, min-heap on f; ties go to fewer turns, then insertion order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct OpenEntry {
    f_score: i64,
    turns: u32,
    counter: u64,
    state: usize,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.turns.cmp(&self.turns))
            .then_with(|| other.counter.cmp(&self.counter))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Search settings for one query.
#[derive(Debug, Clone, Copy)]
pub struct SearchParams {
    /// Allow diagonal moves
    pub diagonal: bool,
    /// Extra cost per direction change
    pub turn_cost: i64,
}

fn heuristic(a: Cell, b: Cell, diagonal: bool) -> i64 {
    let dx = (a.col - b.col).abs() as i64;
    let dy = (a.row - b.row).abs() as i64;
    if diagonal {
        let (lo, hi) = (dx.min(dy), dx.max(dy));
        DIAG_COST * lo + ORTHO_COST * (hi - lo)
    } else {
        ORTHO_COST * (dx + dy)
    }
}

/// Cheapest cell path from `start` to `goal` (both inclusive), `None` when the
/// goal is unreachable. Diagonal moves may not cut blocked corners.
pub fn find_path(
    grid: &ObstacleGrid,
    start: Cell,
    goal: Cell,
    params: SearchParams,
) -> Option<Vec<Cell>> {
    if !grid.passable(start) || !grid.passable(goal) {
        return None;
    }

    let n = grid.len() * STATES_PER_CELL;
    let mut g_costs = vec![i64::MAX; n];
    let mut turns = vec![0u32; n];
    let mut parents = vec![usize::MAX; n];
    let mut closed = vec![false; n];
    let mut open = BinaryHeap::new();
    let mut counter: u64 = 0;

    let start_state = grid.index(start) * STATES_PER_CELL + NO_DIRECTION;
    g_costs[start_state] = 0;
    open.push(OpenEntry {
        f_score: heuristic(start, goal, params.diagonal),
        turns: 0,
        counter,
        state: start_state,
    });

    while let Some(entry) = open.pop() {
        let state = entry.state;
        if closed[state] {
            continue;
        }
        closed[state] = true;

        let cell = grid.cell_at(state / STATES_PER_CELL);
        let dir = state % STATES_PER_CELL;
        if cell == goal {
            return Some(reconstruct(grid, &parents, state));
        }

        for (d, &(dc, dr)) in DIRECTIONS.iter().enumerate() {
            let is_diag = dc != 0 && dr != 0;
            if is_diag && !params.diagonal {
                continue;
            }
            let next = cell.offset(dc, dr);
            if !grid.passable(next) {
                continue;
            }
            if is_diag
                && (!grid.passable(cell.offset(dc, 0))
                    || !grid.passable(cell.offset(0, dr)))
            {
                continue;
            }

            let turned = dir != NO_DIRECTION && dir != d;
            let step = if is_diag { DIAG_COST } else { ORTHO_COST };
            let g = g_costs[state] + step + if turned { params.turn_cost } else { 0 };
            let next_state = grid.index(next) * STATES_PER_CELL + d;
            if closed[next_state] || g >= g_costs[next_state] {
                continue;
            }
            g_costs[next_state] = g;
            turns[next_state] = turns[state] + u32::from(turned);
            parents[next_state] = state;
            counter += 1;
            open.push(OpenEntry {
                f_score: g + heuristic(next, goal, params.diagonal),
                turns: turns[next_state],
                counter,
                state: next_state,
            });
        }
    }
    None
}

fn reconstruct(grid: &ObstacleGrid, parents: &[usize], mut state: usize) -> Vec<Cell> {
    let mut path = vec![grid.cell_at(state / STATES_PER_CELL)];
    while parents[state] != usize::MAX {
        state = parents[state];
        path.push(grid.cell_at(state / STATES_PER_CELL));
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::model::Board;

    const PARAMS: SearchParams = SearchParams {
        diagonal: true,
        turn_cost: 500,
    };

    #[test]
    fn test_straight_line() {
        let grid = ObstacleGrid::build(&Board::rectangle(50.0, 50.0), &[], 5.0, 0.0);
        let path = find_path(&grid, Cell::new(0, 0), Cell::new(5, 0), PARAMS).unwrap();
        assert_eq!(path.len(), 6);
        assert!(path.iter().all(|c| c.row == 0));
    }

    #[test]
    fn test_detours_around_obstacle() {
        let wall = Rect::new(20.0, 0.0, 30.0, 40.0);
        let grid = ObstacleGrid::build(&Board::rectangle(50.0, 50.0), &[wall], 5.0, 0.0);
        let path = find_path(&grid, Cell::new(0, 0), Cell::new(9, 0), PARAMS).unwrap();
        assert!(path.iter().any(|c| c.row >= 8));
        assert!(path.iter().all(|c| grid.passable(*c)));
    }

    #[test]
    fn test_manhattan_moves_only() {
        let grid = ObstacleGrid::build(&Board::rectangle(50.0, 50.0), &[], 5.0, 0.0);
        let params = SearchParams { diagonal: false, turn_cost: 500 };
        let path = find_path(&grid, Cell::new(0, 0), Cell::new(3, 3), params).unwrap();
        for w in path.windows(2) {
            let step = (w[1].col - w[0].col).abs() + (w[1].row - w[0].row).abs();
            assert_eq!(step, 1);
        }
        // one turn is cheaper than a staircase
        let turns = path
            .windows(3)
            .filter(|w| {
                (w[1].col - w[0].col, w[1].row - w[0].row)
                    != (w[2].col - w[1].col, w[2].row - w[1].row)
            })
            .count();
        assert_eq!(turns, 1);
    }

    #[test]
    fn test_unreachable_goal() {
        let wall = Rect::new(20.0, 0.0, 30.0, 50.0);
        let grid = ObstacleGrid::build(&Board::rectangle(50.0, 50.0), &[wall], 5.0, 0.0);
        assert!(find_path(&grid, Cell::new(0, 0), Cell::new(9, 0), PARAMS).is_none());
    }
}
