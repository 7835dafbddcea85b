//! Decaying scent map for one region
//!
//! Entries decay linearly with elapsed ticks. Reads settle pending decay on
//! the fly, so a trace never looks stronger than it is between passes.

use ahash::AHashMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::config::TraceConfig;
use crate::core::types::{Cell, Tick};
use crate::host::TerrainTag;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceCell {
    pub strength: f32,
    pub last_update: Tick,
    /// Left by a turned agent rather than living prey
    pub tainted: bool,
}

impl TraceCell {
    /// Strength after decaying from `last_update` to `now`
    #[inline]
    pub fn strength_at(&self, now: Tick, decay_per_tick: f32) -> f32 {
        let elapsed = now.saturating_sub(self.last_update) as f32;
        (self.strength - decay_per_tick * elapsed).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceField {
    #[serde(with = "cell_entries")]
    cells: AHashMap<Cell, TraceCell>,
    decay_per_tick: f32,
    floor: f32,
}

impl TraceField {
    pub fn new(config: &TraceConfig) -> Self {
        Self {
            cells: AHashMap::new(),
            decay_per_tick: config.decay_per_tick,
            floor: config.floor,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, cell: Cell) -> Option<&TraceCell> {
        self.cells.get(&cell)
    }

    /// Current strength at `cell`, 0.0 when nothing is there
    pub fn strength(&self, cell: Cell, now: Tick) -> f32 {
        self.cells
            .get(&cell)
            .map(|t| t.strength_at(now, self.decay_per_tick))
            .unwrap_or(0.0)
    }

    /// Write a trace; repeated writes keep the maximum instead of adding up
    ///
    /// Liquid terrain never holds a trace and erases anything stored there.
    /// Returns whether a trace is present after the write.
    pub fn deposit(&mut self, cell: Cell, strength: f32, tainted: bool, now: Tick, terrain: TerrainTag) -> bool {
        if terrain.is_liquid() {
            self.cells.remove(&cell);
            return false;
        }

        let rate = self.decay_per_tick;
        match self.cells.get_mut(&cell) {
            Some(existing) => {
                existing.strength = existing.strength_at(now, rate).max(strength);
                existing.last_update = now;
                existing.tainted |= tainted;
                true
            }
            None if strength > self.floor => {
                self.cells.insert(
                    cell,
                    TraceCell {
                        strength,
                        last_update: now,
                        tainted,
                    },
                );
                true
            }
            None => false,
        }
    }

    /// Settle decay on every entry and drop those at or below the floor
    ///
    /// Returns the number of removed entries.
    pub fn decay_pass(&mut self, now: Tick) -> usize {
        let before = self.cells.len();
        let (rate, floor) = (self.decay_per_tick, self.floor);
        self.cells.retain(|_, trace| {
            trace.strength = trace.strength_at(now, rate);
            trace.last_update = now;
            trace.strength > floor
        });
        before - self.cells.len()
    }

    /// Cells within `radius` that hold a live trace, nearest first
    pub fn query(&mut self, center: Cell, radius: f32, now: Tick) -> Vec<Cell> {
        self.query_valid(center, radius, now, |_| true)
    }

    /// Like `query`, but entries that decayed away or fail `valid` are pruned
    pub fn query_valid<F>(&mut self, center: Cell, radius: f32, now: Tick, mut valid: F) -> Vec<Cell>
    where
        F: FnMut(Cell) -> bool,
    {
        let radius_sq = (radius * radius) as i64;
        let (rate, floor) = (self.decay_per_tick, self.floor);

        let mut live = Vec::new();
        let mut stale = Vec::new();
        for (cell, trace) in &self.cells {
            if cell.distance_sq(&center) > radius_sq {
                continue;
            }
            if trace.strength_at(now, rate) > floor && valid(*cell) {
                live.push(*cell);
            } else {
                stale.push(*cell);
            }
        }
        for cell in stale {
            self.cells.remove(&cell);
        }

        live.sort_by_key(|c| (c.distance_sq(&center), *c));
        live
    }

    /// Strongest of `cells`, ties broken toward the smaller cell
    pub fn strongest(&self, cells: &[Cell], now: Tick) -> Option<Cell> {
        cells
            .iter()
            .filter(|c| self.cells.contains_key(*c))
            .max_by_key(|c| (OrderedFloat(self.strength(**c, now)), std::cmp::Reverse(**c)))
            .copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Cell, &TraceCell)> {
        self.cells.iter()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

/// JSON maps need string keys, so cells are stored as an ordered entry list
mod cell_entries {
    use ahash::AHashMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::TraceCell;
    use crate::core::types::Cell;

    pub fn serialize<S: Serializer>(cells: &AHashMap<Cell, TraceCell>, serializer: S) -> Result<S::Ok, S::Error> {
        let mut entries: Vec<(&Cell, &TraceCell)> = cells.iter().collect();
        entries.sort_by_key(|(c, _)| **c);
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<AHashMap<Cell, TraceCell>, D::Error> {
        let entries: Vec<(Cell, TraceCell)> = Vec::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> TraceField {
        TraceField::new(&TraceConfig {
            decay_per_tick: 0.01,
            floor: 0.1,
            ..TraceConfig::default()
        })
    }

    #[test]
    fn test_repeated_deposit_does_not_accumulate() {
        let mut field = field();
        let cell = Cell::new(3, 3);
        field.deposit(cell, 5.0, false, 100, TerrainTag::Soil);
        field.deposit(cell, 5.0, false, 100, TerrainTag::Soil);
        assert_eq!(field.strength(cell, 100), 5.0);
    }

    #[test]
    fn test_deposit_keeps_max_and_ors_taint() {
        let mut field = field();
        let cell = Cell::new(1, 1);
        field.deposit(cell, 5.0, true, 0, TerrainTag::Soil);
        field.deposit(cell, 2.0, false, 0, TerrainTag::Soil);
        let trace = field.get(cell).unwrap();
        assert_eq!(trace.strength, 5.0);
        assert!(trace.tainted);
    }

    #[test]
    fn test_decay_is_tick_proportional() {
        let mut sparse = field();
        let mut dense = field();
        let cell = Cell::new(0, 0);
        sparse.deposit(cell, 5.0, false, 0, TerrainTag::Soil);
        dense.deposit(cell, 5.0, false, 0, TerrainTag::Soil);

        for now in (50..=200).step_by(50) {
            dense.decay_pass(now);
        }
        sparse.decay_pass(200);

        let a = sparse.get(cell).unwrap().strength;
        let b = dense.get(cell).unwrap().strength;
        assert!((a - 3.0).abs() < 1e-4);
        assert!((a - b).abs() < 1e-4);
    }

    #[test]
    fn test_decay_removes_at_floor() {
        let mut field = field();
        field.deposit(Cell::new(0, 0), 1.0, false, 0, TerrainTag::Soil);
        field.deposit(Cell::new(1, 0), 5.0, false, 0, TerrainTag::Soil);
        assert_eq!(field.decay_pass(100), 1);
        assert!(field.get(Cell::new(0, 0)).is_none());
        assert!(field.get(Cell::new(1, 0)).is_some());
    }

    #[test]
    fn test_liquid_terrain_refuses_and_erases() {
        let mut field = field();
        let cell = Cell::new(2, 2);
        assert!(!field.deposit(cell, 5.0, false, 0, TerrainTag::Water));
        assert!(field.is_empty());

        field.deposit(cell, 5.0, false, 0, TerrainTag::Soil);
        field.deposit(cell, 5.0, false, 1, TerrainTag::Marshy);
        assert!(field.is_empty());
    }

    #[test]
    fn test_query_prunes_stale_entries() {
        let mut field = field();
        field.deposit(Cell::new(0, 0), 0.5, false, 0, TerrainTag::Soil);
        field.deposit(Cell::new(2, 0), 5.0, false, 0, TerrainTag::Soil);
        field.deposit(Cell::new(9, 9), 5.0, false, 0, TerrainTag::Soil);

        let found = field.query(Cell::new(0, 0), 3.0, 50);
        assert_eq!(found, vec![Cell::new(2, 0)]);
        // Decayed entry removed by the query itself
        assert_eq!(field.len(), 2);
    }

    #[test]
    fn test_strongest() {
        let mut field = field();
        field.deposit(Cell::new(0, 0), 2.0, false, 0, TerrainTag::Soil);
        field.deposit(Cell::new(1, 0), 4.0, false, 0, TerrainTag::Soil);
        let cells = [Cell::new(0, 0), Cell::new(1, 0), Cell::new(5, 5)];
        assert_eq!(field.strongest(&cells, 0), Some(Cell::new(1, 0)));
        assert_eq!(field.strongest(&[], 0), None);
    }

    #[test]
    fn test_json_round_trip() {
        let mut field = field();
        field.deposit(Cell::new(4, 1), 3.0, true, 7, TerrainTag::Soil);
        let json = serde_json::to_string(&field).unwrap();
        let back: TraceField = serde_json::from_str(&json).unwrap();
        assert_eq!(back, field);
    }
}
