//! Worth of a turned agent, used to pick who leaves first

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::config::PopulationConfig;
use crate::core::types::AgentId;

/// `round((base + market) × body_size × (1 + level × level_multiplier))`
pub fn agent_value(market_value: f32, body_size: f32, level: u32, config: &PopulationConfig) -> f32 {
    ((config.base_value + market_value) * body_size * (1.0 + level as f32 * config.level_multiplier)).round()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvictionCandidate {
    pub agent: AgentId,
    pub value: f32,
    /// Cells to the nearest map edge
    pub edge_distance: i32,
    pub locked: bool,
}

/// Cheapest first, then closest to the edge
pub fn rank(candidates: &mut [EvictionCandidate]) {
    candidates.sort_by_key(|c| (OrderedFloat(c.value), c.edge_distance, c.agent));
}
