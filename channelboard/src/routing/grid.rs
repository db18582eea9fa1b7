//! Uniform obstacle grid over the board's bounding rectangle.

use crate::geometry::{Point, Rect};
use crate::model::Board;

/// Grid coordinate (column, row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

impl Cell {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub fn offset(&self, dc: i32, dr: i32) -> Cell {
        Cell::new(self.col + dc, self.row + dr)
    }
}

/// Blocked state per cell center. A cell is blocked when its center is
/// outside the board or inside any instance body grown by `margin`. Endpoint
/// bodies are blocked too; channels leave them through pad escape stubs.
#[derive(Debug, Clone)]
pub struct ObstacleGrid {
    origin: Point,
    cell_size: f64,
    cols: i32,
    rows: i32,
    blocked: Vec<bool>,
}

impl ObstacleGrid {
    pub fn build(board: &Board, bodies: &[Rect], cell_size: f64, margin: f64) -> Self {
        let bounds = board.bounds();
        let cell_size = cell_size.max(0.1);
        let cols = ((bounds.width() / cell_size).ceil() as i32).max(1);
        let rows = ((bounds.height() / cell_size).ceil() as i32).max(1);
        let origin = Point::new(bounds.min_x, bounds.min_y);

        let grown: Vec<Rect> = bodies.iter().map(|r| r.expand(margin)).collect();
        let mut blocked = Vec::with_capacity((cols * rows) as usize);
        for row in 0..rows {
            for col in 0..cols {
                let c = Point::new(
                    origin.x + (col as f64 + 0.5) * cell_size,
                    origin.y + (row as f64 + 0.5) * cell_size,
                );
                blocked.push(!board.contains(&c) || grown.iter().any(|r| r.contains(&c)));
            }
        }

        Self {
            origin,
            cell_size,
            cols,
            rows,
            blocked,
        }
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn len(&self) -> usize {
        self.blocked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.col >= 0 && cell.row >= 0 && cell.col < self.cols && cell.row < self.rows
    }

    /// Dense index; callers check `in_bounds` first.
    pub fn index(&self, cell: Cell) -> usize {
        (cell.row * self.cols + cell.col) as usize
    }

    pub fn cell_at(&self, index: usize) -> Cell {
        let i = index as i32;
        Cell::new(i % self.cols, i / self.cols)
    }

    pub fn center(&self, cell: Cell) -> Point {
        Point::new(
            self.origin.x + (cell.col as f64 + 0.5) * self.cell_size,
            self.origin.y + (cell.row as f64 + 0.5) * self.cell_size,
        )
    }

    pub fn passable(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && !self.blocked[self.index(cell)]
    }

    /// Passable cell closest to `p` that `accept` allows; ties go to the one
    /// closer to `toward`.
    pub fn nearest_passable(
        &self,
        p: &Point,
        toward: &Point,
        accept: impl Fn(Cell) -> bool,
    ) -> Option<Cell> {
        let mut candidates: Vec<(f64, f64, Cell)> = (0..self.len())
            .map(|index| self.cell_at(index))
            .filter(|cell| self.passable(*cell))
            .map(|cell| {
                let c = self.center(cell);
                (c.distance(p), c.distance(toward), cell)
            })
            .collect();
        candidates.sort_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then_with(|| a.1.total_cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        });
        candidates
            .into_iter()
            .map(|(_, _, cell)| cell)
            .find(|cell| accept(*cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grown_bodies_are_blocked() {
        let board = Board::rectangle(50.0, 50.0);
        let body = Rect::new(20.0, 20.0, 30.0, 30.0);
        let grid = ObstacleGrid::build(&board, &[body], 5.0, 1.0);
        assert!(!grid.passable(Cell::new(5, 5)));
        // center (17.5, 22.5) clears a 1 mm margin but not a 2.5 mm one
        assert!(grid.passable(Cell::new(3, 4)));
        let wide = ObstacleGrid::build(&board, &[body], 5.0, 2.5);
        assert!(!wide.passable(Cell::new(3, 4)));
        assert!(grid.passable(Cell::new(0, 0)));
    }

    #[test]
    fn test_nearest_passable_honours_filter() {
        let board = Board::rectangle(100.0, 60.0);
        let grid = ObstacleGrid::build(&board, &[], 5.0, 1.0);
        let p = Point::new(40.0, 30.0);
        let cell = grid
            .nearest_passable(&p, &Point::new(60.0, 30.0), |c| grid.center(c).x < 40.0)
            .unwrap();
        assert_eq!(grid.center(cell).x, 37.5);
    }

    #[test]
    fn test_nearest_passable_prefers_target_side() {
        let board = Board::rectangle(100.0, 60.0);
        let grid = ObstacleGrid::build(&board, &[], 5.0, 1.0);
        let cell = grid
            .nearest_passable(&Point::new(40.0, 30.0), &Point::new(60.0, 30.0), |_| true)
            .unwrap();
        assert_eq!(grid.center(cell).x, 42.5);
    }

    #[test]
    fn test_cells_outside_round_board_blocked() {
        let board = Board::circle(50.0, 32);
        let grid = ObstacleGrid::build(&board, &[], 5.0, 0.0);
        assert!(!grid.passable(Cell::new(0, 0)));
        assert!(grid.passable(Cell::new(5, 5)));
    }
}
