//! Dense per-cell storage for one region

use serde::{Deserialize, Serialize};

use crate::core::types::{Cell, RegionBounds};

/// Row-major grid indexed by `Cell`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellGrid<T> {
    pub width: i32,
    pub height: i32,
    data: Vec<T>,
}

impl<T: Clone> CellGrid<T> {
    pub fn filled(bounds: RegionBounds, value: T) -> Self {
        let len = (bounds.width.max(0) * bounds.height.max(0)) as usize;
        Self {
            width: bounds.width.max(0),
            height: bounds.height.max(0),
            data: vec![value; len],
        }
    }
}

impl<T> CellGrid<T> {
    #[inline]
    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.x >= 0 && cell.z >= 0 && cell.x < self.width && cell.z < self.height {
            Some((cell.z * self.width + cell.x) as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get(&self, cell: Cell) -> Option<&T> {
        self.index(cell).map(|i| &self.data[i])
    }

    #[inline]
    pub fn get_mut(&mut self, cell: Cell) -> Option<&mut T> {
        self.index(cell).map(move |i| &mut self.data[i])
    }

    /// Out-of-bounds writes are ignored
    #[inline]
    pub fn set(&mut self, cell: Cell, value: T) {
        if let Some(i) = self.index(cell) {
            self.data[i] = value;
        }
    }

    pub fn bounds(&self) -> RegionBounds {
        RegionBounds::new(self.width, self.height)
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let width = self.width;
        (0..self.data.len() as i32).map(move |i| Cell::new(i % width, i / width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_in_bounds() {
        let mut grid = CellGrid::filled(RegionBounds::new(4, 3), 0u8);
        grid.set(Cell::new(3, 2), 7);
        assert_eq!(grid.get(Cell::new(3, 2)), Some(&7));
        assert_eq!(grid.get(Cell::new(4, 0)), None);
        assert_eq!(grid.get(Cell::new(0, -1)), None);
    }

    #[test]
    fn test_out_of_bounds_write_ignored() {
        let mut grid = CellGrid::filled(RegionBounds::new(2, 2), false);
        grid.set(Cell::new(5, 5), true);
        assert!(grid.cells().all(|c| grid.get(c) == Some(&false)));
        assert_eq!(grid.cells().count(), 4);
    }
}
