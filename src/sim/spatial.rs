//! Uniform spatial hash for broad-phase neighbour queries

use std::collections::HashMap;

use glam::Vec2;

/// Widest query, in cells from the centre, that is walked cell by cell
const MAX_SCAN_RANGE: i32 = 256;

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialGrid {
    /// Non-positive or non-finite cell sizes fall back to one pixel
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            1.0
        };
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Empty every cell, keeping allocations
    pub fn clear(&mut self) {
        for cell in self.cells.values_mut() {
            cell.clear();
        }
    }

    fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, index: usize, pos: Vec2) {
        if !pos.is_finite() {
            return;
        }
        let cell = self.cell_of(pos);
        self.cells.entry(cell).or_default().push(index);
    }

    /// Candidates in every cell overlapping the query circle.
    ///
    /// May include entries slightly farther than `radius`; callers do the exact test.
    pub fn query_radius(&self, pos: Vec2, radius: f32) -> Vec<usize> {
        let mut neighbors = Vec::new();
        if !pos.is_finite() || !radius.is_finite() {
            return neighbors;
        }
        let (cx, cy) = self.cell_of(pos);
        let range = (radius.max(0.0) / self.cell_size).ceil() as i32;

        // Too many cells to walk: every entry is a candidate
        if range > MAX_SCAN_RANGE {
            for indices in self.cells.values() {
                neighbors.extend_from_slice(indices);
            }
            return neighbors;
        }

        for x in cx.saturating_sub(range)..=cx.saturating_add(range) {
            for y in cy.saturating_sub(range)..=cy.saturating_add(range) {
                if let Some(indices) = self.cells.get(&(x, y)) {
                    neighbors.extend_from_slice(indices);
                }
            }
        }
        neighbors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_finds_neighbours_only() {
        let mut grid = SpatialGrid::new(10.0);
        grid.insert(0, Vec2::new(5.0, 5.0));
        grid.insert(1, Vec2::new(12.0, 5.0));
        grid.insert(2, Vec2::new(200.0, 200.0));

        let mut found = grid.query_radius(Vec2::new(6.0, 6.0), 8.0);
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn test_negative_coordinates() {
        let mut grid = SpatialGrid::new(10.0);
        grid.insert(7, Vec2::new(-3.0, -3.0));
        assert_eq!(grid.query_radius(Vec2::new(-1.0, -1.0), 1.0), vec![7]);
    }

    #[test]
    fn test_far_positions_saturate_without_overflow() {
        let mut grid = SpatialGrid::new(10.0);
        grid.insert(0, Vec2::new(1e30, -1e30));
        grid.insert(1, Vec2::ZERO);
        grid.insert(2, Vec2::new(500.0, 500.0));
        assert_eq!(grid.query_radius(Vec2::new(1e30, -1e30), 5.0), vec![0]);
        assert!(grid.query_radius(Vec2::new(f32::MAX, 0.0), 1.0).is_empty());
    }

    #[test]
    fn test_huge_radius_returns_everything() {
        let mut grid = SpatialGrid::new(10.0);
        grid.insert(0, Vec2::ZERO);
        grid.insert(1, Vec2::new(900.0, 900.0));
        let mut found = grid.query_radius(Vec2::ZERO, 1e20);
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn test_clear_and_bad_input() {
        let mut grid = SpatialGrid::new(f32::NAN);
        assert_eq!(grid.cell_size(), 1.0);
        grid.insert(0, Vec2::new(f32::NAN, 0.0));
        grid.insert(1, Vec2::ZERO);
        grid.clear();
        assert!(grid.query_radius(Vec2::ZERO, 5.0).is_empty());
    }
}
