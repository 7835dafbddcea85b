//! Map-edge cells used for spawning and for walking off the map

use serde::{Deserialize, Serialize};

use crate::core::clock::IntervalTimer;
use crate::core::types::{Cell, RegionBounds, RegionId, Tick};
use crate::host::query::nearest_reachable_cell;
use crate::host::Host;

/// Every cell on the outer ring of `bounds`
pub fn edge_cells(bounds: RegionBounds) -> Vec<Cell> {
    let (w, h) = (bounds.width, bounds.height);
    if w <= 0 || h <= 0 {
        return Vec::new();
    }
    let mut cells = Vec::with_capacity((2 * (w + h)) as usize);
    for x in 0..w {
        cells.push(Cell::new(x, 0));
        if h > 1 {
            cells.push(Cell::new(x, h - 1));
        }
    }
    for z in 1..h - 1 {
        cells.push(Cell::new(0, z));
        if w > 1 {
            cells.push(Cell::new(w - 1, z));
        }
    }
    cells
}

/// Edge cells a new group can appear on: walkable and not fogged
pub fn spawn_candidates<H: Host + ?Sized>(host: &H, region: RegionId) -> Vec<Cell> {
    let Some(bounds) = host.bounds(region) else {
        return Vec::new();
    };
    edge_cells(bounds)
        .into_iter()
        .filter(|c| host.is_walkable(region, *c) && !host.is_fogged(region, *c))
        .collect()
}

/// Nearest reachable edge cell an agent at `from` can walk off through
pub fn nearest_exit<H: Host + ?Sized>(host: &H, region: RegionId, from: Cell) -> Option<Cell> {
    let bounds = host.bounds(region)?;
    nearest_reachable_cell(host, region, from, edge_cells(bounds))
}

/// Cached spawn points, refreshed on their own slower interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPointCache {
    points: Vec<Cell>,
    timer: IntervalTimer,
    primed: bool,
}

impl SpawnPointCache {
    pub fn new(now: Tick) -> Self {
        Self {
            points: Vec::new(),
            timer: IntervalTimer::armed_at(now),
            primed: false,
        }
    }

    pub fn points(&self) -> &[Cell] {
        &self.points
    }

    /// Refresh when due or never filled; returns whether it refreshed
    pub fn refresh<H: Host + ?Sized>(&mut self, host: &H, region: RegionId, now: Tick, interval: Tick) -> bool {
        if self.primed && !self.timer.is_due(now) {
            return false;
        }
        self.points = spawn_candidates(host, region);
        self.timer.rearm(now, interval);
        self.primed = true;
        tracing::debug!("region {:?}: {} spawn points", region, self.points.len());
        true
    }
}
