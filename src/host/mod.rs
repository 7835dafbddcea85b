//! Collaborator contracts the blight core calls out to
//!
//! The host owns agents, terrain, temperature, pathing and factions. The core
//! reads and mutates them only through these traits, so any world model can
//! drive it. `sandbox` provides an in-memory implementation for tests and the
//! demo binary.

pub mod events;
pub mod grid;
pub mod query;
pub mod sandbox;

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::{AgentId, Cell, ComfortBand, FactionId, RegionBounds, RegionId, Tick};

pub use events::{BlightEvent, BlightObserver, EventTally};
pub use grid::CellGrid;
pub use sandbox::SandboxHost;

/// Host-side conditions the core strips on transformation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostCondition {
    Malnutrition,
    BloodLoss,
    Hypothermia,
    Heatstroke,
}

impl HostCondition {
    /// Conditions that make no sense on a turned body
    pub const DISQUALIFYING: [HostCondition; 4] = [
        HostCondition::Malnutrition,
        HostCondition::BloodLoss,
        HostCondition::Hypothermia,
        HostCondition::Heatstroke,
    ];
}

/// Terrain classification at a cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainTag {
    #[default]
    Soil,
    Sand,
    Stony,
    Metallic,
    Marshy,
    Water,
    Other,
}

impl TerrainTag {
    /// Liquid and marsh cells never hold traces or residue
    pub fn is_liquid(&self) -> bool {
        matches!(self, Self::Marshy | Self::Water)
    }
}

/// Atmospheric condition reported by the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherKind {
    #[default]
    Clear,
    Fog,
    Rain,
    Thunderstorm,
    Snow,
}

/// Combat range class used by the level capability check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionRange {
    Melee,
    Ranged,
}

/// Snapshot of one agent's host-side state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub region: RegionId,
    pub position: Cell,
    pub deceased: bool,
    /// Downed, stunned or otherwise unable to act
    pub incapacitated: bool,
    pub faction: Option<FactionId>,
    pub comfort: ComfortBand,
    pub body_size: f32,
    pub market_value: f32,
    pub moving: bool,
    pub bleeding: bool,
    /// Organic bodies can be infected and leave scent
    pub flesh: bool,
    /// Already walking off the map
    pub exiting: bool,
    /// Busy with an action that must not be interrupted
    pub locked: bool,
}

impl AgentStatus {
    pub fn new(region: RegionId, position: Cell) -> Self {
        Self {
            region,
            position,
            deceased: false,
            incapacitated: false,
            faction: None,
            comfort: ComfortBand::default(),
            body_size: 1.0,
            market_value: 0.0,
            moving: false,
            bleeding: false,
            flesh: true,
            exiting: false,
            locked: false,
        }
    }

    /// Alive, conscious and able to act on its own
    pub fn is_capable(&self) -> bool {
        !self.deceased && !self.incapacitated
    }
}

/// Agent-facing half of the host contract
pub trait AgentDirectory {
    fn agents_in_region(&self, region: RegionId) -> Vec<AgentId>;
    fn status(&self, agent: AgentId) -> Option<AgentStatus>;

    fn set_faction(&mut self, agent: AgentId, faction: Option<FactionId>) -> Result<()>;
    /// Whether `agent` would fight members of `faction`
    fn is_hostile_to(&self, agent: AgentId, faction: FactionId) -> bool;

    /// Bring a corpse back up as a turned body
    fn reanimate(&mut self, agent: AgentId) -> Result<()>;

    fn has_condition(&self, agent: AgentId, condition: HostCondition) -> bool;
    fn remove_condition(&mut self, agent: AgentId, condition: HostCondition) -> Result<()>;

    /// Severity of each open injury, in host order
    fn injuries(&self, agent: AgentId) -> Vec<f32>;
    fn set_injury_severity(&mut self, agent: AgentId, index: usize, severity: f32) -> Result<()>;

    fn current_target(&self, agent: AgentId) -> Option<AgentId>;
    fn set_target(&mut self, agent: AgentId, target: Option<AgentId>) -> Result<()>;

    /// Start walking toward `exit`, leaving the map at `depart_at`
    fn begin_exit(&mut self, agent: AgentId, exit: Cell, depart_at: Tick) -> Result<()>;

    /// Place a new turned body near `near`; `None` when no free cell exists
    fn spawn_agent(&mut self, region: RegionId, near: Cell, radius: i32) -> Option<AgentId>;
}

/// Map-facing half of the host contract
pub trait SpatialQuery {
    fn regions(&self) -> Vec<RegionId>;
    fn bounds(&self, region: RegionId) -> Option<RegionBounds>;
    /// Settlement maps get a population scheduler; transient maps do not
    fn is_home(&self, region: RegionId) -> bool;

    fn terrain(&self, region: RegionId, cell: Cell) -> TerrainTag;
    fn temperature(&self, region: RegionId, cell: Cell) -> Option<f32>;
    fn outdoor_temperature(&self, region: RegionId) -> Option<f32>;
    fn weather(&self, region: RegionId) -> WeatherKind;
    fn toxic_fallout(&self, region: RegionId) -> bool;

    fn is_walkable(&self, region: RegionId, cell: Cell) -> bool;
    fn is_fogged(&self, region: RegionId, cell: Cell) -> bool;
    fn can_reach(&self, region: RegionId, from: Cell, to: Cell) -> bool;

    fn has_residue(&self, region: RegionId, cell: Cell) -> bool;
    /// Returns false when the cell cannot hold residue
    fn place_residue(&mut self, region: RegionId, cell: Cell) -> bool;
}

/// Everything the core needs from its host
pub trait Host: AgentDirectory + SpatialQuery {}

impl<T: AgentDirectory + SpatialQuery> Host for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liquid_terrain() {
        assert!(TerrainTag::Marshy.is_liquid());
        assert!(TerrainTag::Water.is_liquid());
        assert!(!TerrainTag::Soil.is_liquid());
        assert!(!TerrainTag::Metallic.is_liquid());
    }

    #[test]
    fn test_status_capability() {
        let mut status = AgentStatus::new(RegionId(0), Cell::new(1, 1));
        assert!(status.is_capable());
        status.incapacitated = true;
        assert!(!status.is_capable());
    }
}
