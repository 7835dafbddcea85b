//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for agents (living or deceased)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Stable id built from a counter, used by hosts that need reproducible ids
    pub fn from_index(index: u64) -> Self {
        Self(Uuid::from_u128(index as u128 + 1))
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let short = self.0.as_u128() & 0xffff_ffff;
        write!(f, "agent#{:08x}", short)
    }
}

/// Simulation tick counter, owned by the host clock
pub type Tick = u64;

/// Identifier for a bounded simulated area (one settlement map)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionId(pub u32);

/// Opaque faction reference handed out by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactionId(pub u32);

/// Integer map cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub z: i32,
}

impl Cell {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        (self.distance_sq(other) as f32).sqrt()
    }

    pub fn distance_sq(&self, other: &Self) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dz * dz
    }

    pub fn offset(&self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }

    /// The eight surrounding cells
    pub fn neighbors(&self) -> [Cell; 8] {
        [
            self.offset(-1, -1),
            self.offset(0, -1),
            self.offset(1, -1),
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(-1, 1),
            self.offset(0, 1),
            self.offset(1, 1),
        ]
    }
}

/// Rectangular extent of a region, cells `0..width` by `0..height`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionBounds {
    pub width: i32,
    pub height: i32,
}

impl RegionBounds {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.z >= 0 && cell.x < self.width && cell.z < self.height
    }

    pub fn is_boundary(&self, cell: Cell) -> bool {
        self.contains(cell)
            && (cell.x == 0 || cell.z == 0 || cell.x == self.width - 1 || cell.z == self.height - 1)
    }

    /// Distance to the nearest map edge
    pub fn edge_distance(&self, cell: Cell) -> i32 {
        (cell.x.min(self.width - cell.x)).min(cell.z.min(self.height - cell.z))
    }
}

/// Temperature range in which an agent is comfortable (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComfortBand {
    pub min: f32,
    pub max: f32,
}

impl ComfortBand {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, temperature: f32) -> bool {
        temperature >= self.min && temperature <= self.max
    }
}

impl Default for ComfortBand {
    fn default() -> Self {
        Self { min: 16.0, max: 26.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_from_index_is_stable() {
        assert_eq!(AgentId::from_index(7), AgentId::from_index(7));
        assert_ne!(AgentId::from_index(7), AgentId::from_index(8));
    }

    #[test]
    fn test_cell_distance() {
        let a = Cell::new(0, 0);
        let b = Cell::new(3, 4);
        assert_eq!(a.distance_sq(&b), 25);
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_boundary_and_edge_distance() {
        let bounds = RegionBounds::new(10, 8);
        assert!(bounds.is_boundary(Cell::new(0, 3)));
        assert!(bounds.is_boundary(Cell::new(9, 3)));
        assert!(bounds.is_boundary(Cell::new(4, 7)));
        assert!(!bounds.is_boundary(Cell::new(4, 4)));
        assert!(!bounds.is_boundary(Cell::new(10, 0)));

        assert_eq!(bounds.edge_distance(Cell::new(0, 4)), 0);
        assert_eq!(bounds.edge_distance(Cell::new(4, 3)), 3);
        assert_eq!(bounds.edge_distance(Cell::new(8, 4)), 2);
    }

    #[test]
    fn test_comfort_band_contains_edges() {
        let band = ComfortBand::new(10.0, 20.0);
        assert!(band.contains(10.0));
        assert!(band.contains(20.0));
        assert!(!band.contains(9.99));
    }
}
