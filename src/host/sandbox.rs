//! In-memory host used by the integration tests and the demo binary
//!
//! Regions are dense cell grids; reachability is answered from connected
//! components of walkable cells, relabelled whenever walkability changes.

use std::collections::VecDeque;

use ahash::{AHashMap, AHashSet};

use crate::core::error::{BlightError, Result};
use crate::core::types::{AgentId, Cell, FactionId, RegionBounds, RegionId, Tick};
use crate::host::grid::CellGrid;
use crate::host::{AgentDirectory, AgentStatus, HostCondition, SpatialQuery, TerrainTag, WeatherKind};

#[derive(Debug, Clone)]
struct SandboxRegion {
    bounds: RegionBounds,
    home: bool,
    terrain: CellGrid<TerrainTag>,
    walkable: CellGrid<bool>,
    fogged: CellGrid<bool>,
    residue: CellGrid<bool>,
    /// Connected component id per cell, 0 for blocked cells
    components: CellGrid<u32>,
    outdoor_temperature: f32,
    cell_temperature: AHashMap<Cell, f32>,
    weather: WeatherKind,
    toxic_fallout: bool,
    spawn_faction: Option<FactionId>,
}

impl SandboxRegion {
    fn new(bounds: RegionBounds, home: bool) -> Self {
        let mut region = Self {
            bounds,
            home,
            terrain: CellGrid::filled(bounds, TerrainTag::Soil),
            walkable: CellGrid::filled(bounds, true),
            fogged: CellGrid::filled(bounds, false),
            residue: CellGrid::filled(bounds, false),
            components: CellGrid::filled(bounds, 0),
            outdoor_temperature: 20.0,
            cell_temperature: AHashMap::new(),
            weather: WeatherKind::Clear,
            toxic_fallout: false,
            spawn_faction: None,
        };
        region.relabel();
        region
    }

    fn walkable(&self, cell: Cell) -> bool {
        self.walkable.get(cell).copied().unwrap_or(false)
    }

    /// Flood-fill walkable cells into connected components
    fn relabel(&mut self) {
        let mut labels = CellGrid::filled(self.bounds, 0u32);
        let mut next = 1u32;
        let mut queue = VecDeque::new();

        for start in self.walkable.cells().collect::<Vec<_>>() {
            if !self.walkable(start) || labels.get(start).copied().unwrap_or(0) != 0 {
                continue;
            }
            labels.set(start, next);
            queue.push_back(start);
            while let Some(cell) = queue.pop_front() {
                for n in cell.neighbors() {
                    if self.walkable(n) && labels.get(n) == Some(&0) {
                        labels.set(n, next);
                        queue.push_back(n);
                    }
                }
            }
            next += 1;
        }

        self.components = labels;
    }
}

#[derive(Debug, Clone)]
struct SandboxAgent {
    id: AgentId,
    status: AgentStatus,
    conditions: AHashSet<HostCondition>,
    injuries: Vec<f32>,
    target: Option<AgentId>,
    exit: Option<(Cell, Tick)>,
    /// Cleared to make `reanimate` fail
    revivable: bool,
}

/// Simple host with flat terrain, per-region weather and connected-component pathing
#[derive(Debug, Clone, Default)]
pub struct SandboxHost {
    regions: AHashMap<RegionId, SandboxRegion>,
    region_order: Vec<RegionId>,
    agents: Vec<SandboxAgent>,
    index: AHashMap<AgentId, usize>,
    next_agent: u64,
}

impl SandboxHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_region(&mut self, bounds: RegionBounds, home: bool) -> RegionId {
        let id = RegionId(self.region_order.len() as u32);
        self.regions.insert(id, SandboxRegion::new(bounds, home));
        self.region_order.push(id);
        id
    }

    fn region_mut(&mut self, region: RegionId) -> Option<&mut SandboxRegion> {
        self.regions.get_mut(&region)
    }

    pub fn set_walkable(&mut self, region: RegionId, cell: Cell, walkable: bool) {
        if let Some(r) = self.region_mut(region) {
            r.walkable.set(cell, walkable);
            r.relabel();
        }
    }

    /// Water also blocks movement
    pub fn set_terrain(&mut self, region: RegionId, cell: Cell, terrain: TerrainTag) {
        if let Some(r) = self.region_mut(region) {
            r.terrain.set(cell, terrain);
            if terrain == TerrainTag::Water {
                r.walkable.set(cell, false);
                r.relabel();
            }
        }
    }

    pub fn set_fogged(&mut self, region: RegionId, cell: Cell, fogged: bool) {
        if let Some(r) = self.region_mut(region) {
            r.fogged.set(cell, fogged);
        }
    }

    pub fn set_outdoor_temperature(&mut self, region: RegionId, temperature: f32) {
        if let Some(r) = self.region_mut(region) {
            r.outdoor_temperature = temperature;
        }
    }

    /// Indoor or otherwise sheltered cell with its own temperature
    pub fn set_cell_temperature(&mut self, region: RegionId, cell: Cell, temperature: f32) {
        if let Some(r) = self.region_mut(region) {
            r.cell_temperature.insert(cell, temperature);
        }
    }

    pub fn set_weather(&mut self, region: RegionId, weather: WeatherKind) {
        if let Some(r) = self.region_mut(region) {
            r.weather = weather;
        }
    }

    pub fn set_toxic_fallout(&mut self, region: RegionId, active: bool) {
        if let Some(r) = self.region_mut(region) {
            r.toxic_fallout = active;
        }
    }

    /// Faction given to agents placed by `spawn_agent`
    pub fn set_spawn_faction(&mut self, region: RegionId, faction: Option<FactionId>) {
        if let Some(r) = self.region_mut(region) {
            r.spawn_faction = faction;
        }
    }

    pub fn add_agent(&mut self, region: RegionId, position: Cell) -> AgentId {
        let id = AgentId::from_index(self.next_agent);
        self.next_agent += 1;
        self.index.insert(id, self.agents.len());
        self.agents.push(SandboxAgent {
            id,
            status: AgentStatus::new(region, position),
            conditions: AHashSet::new(),
            injuries: Vec::new(),
            target: None,
            exit: None,
            revivable: true,
        });
        id
    }

    fn agent(&self, id: AgentId) -> Option<&SandboxAgent> {
        self.index.get(&id).map(|&i| &self.agents[i])
    }

    fn agent_mut(&mut self, id: AgentId) -> Result<&mut SandboxAgent> {
        match self.index.get(&id) {
            Some(&i) => Ok(&mut self.agents[i]),
            None => Err(BlightError::AgentNotFound(id)),
        }
    }

    pub fn status_mut(&mut self, id: AgentId) -> Option<&mut AgentStatus> {
        self.agent_mut(id).ok().map(|a| &mut a.status)
    }

    pub fn kill(&mut self, id: AgentId) -> Result<()> {
        let agent = self.agent_mut(id)?;
        agent.status.deceased = true;
        agent.status.moving = false;
        agent.target = None;
        Ok(())
    }

    /// Refuse later `reanimate` calls for this agent
    pub fn set_revivable(&mut self, id: AgentId, revivable: bool) -> Result<()> {
        self.agent_mut(id)?.revivable = revivable;
        Ok(())
    }

    pub fn move_agent(&mut self, id: AgentId, to: Cell) -> Result<()> {
        self.agent_mut(id)?.status.position = to;
        Ok(())
    }

    pub fn add_injury(&mut self, id: AgentId, severity: f32) -> Result<()> {
        self.agent_mut(id)?.injuries.push(severity.max(0.0));
        Ok(())
    }

    pub fn add_condition(&mut self, id: AgentId, condition: HostCondition) -> Result<()> {
        self.agent_mut(id)?.conditions.insert(condition);
        Ok(())
    }

    pub fn exit_plan(&self, id: AgentId) -> Option<(Cell, Tick)> {
        self.agent(id).and_then(|a| a.exit)
    }

    /// Remove an agent entirely; ids of other agents stay valid
    pub fn remove_agent(&mut self, id: AgentId) -> Result<()> {
        let idx = self.index.remove(&id).ok_or(BlightError::AgentNotFound(id))?;
        self.agents.swap_remove(idx);
        if idx < self.agents.len() {
            let moved = self.agents[idx].id;
            self.index.insert(moved, idx);
        }
        Ok(())
    }

    /// Remove every exiting agent whose departure tick has passed
    pub fn depart_due(&mut self, now: Tick) -> Vec<AgentId> {
        let due: Vec<AgentId> = self
            .agents
            .iter()
            .filter(|a| matches!(a.exit, Some((_, at)) if at <= now))
            .map(|a| a.id)
            .collect();
        for id in &due {
            // Ids come from the live agent list
            let _ = self.remove_agent(*id);
        }
        due
    }

    pub fn residue_count(&self, region: RegionId) -> usize {
        self.regions
            .get(&region)
            .map(|r| r.residue.cells().filter(|c| r.residue.get(*c) == Some(&true)).count())
            .unwrap_or(0)
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }
}

impl AgentDirectory for SandboxHost {
    fn agents_in_region(&self, region: RegionId) -> Vec<AgentId> {
        self.agents
            .iter()
            .filter(|a| a.status.region == region)
            .map(|a| a.id)
            .collect()
    }

    fn status(&self, agent: AgentId) -> Option<AgentStatus> {
        self.agent(agent).map(|a| a.status.clone())
    }

    fn set_faction(&mut self, agent: AgentId, faction: Option<FactionId>) -> Result<()> {
        self.agent_mut(agent)?.status.faction = faction;
        Ok(())
    }

    fn is_hostile_to(&self, agent: AgentId, faction: FactionId) -> bool {
        self.agent(agent)
            .and_then(|a| a.status.faction)
            .map(|f| f != faction)
            .unwrap_or(false)
    }

    fn reanimate(&mut self, agent: AgentId) -> Result<()> {
        let agent = self.agent_mut(agent)?;
        if !agent.revivable {
            return Err(BlightError::HostRefused(format!("{} cannot be revived", agent.id)));
        }
        agent.status.deceased = false;
        agent.status.incapacitated = false;
        Ok(())
    }

    fn has_condition(&self, agent: AgentId, condition: HostCondition) -> bool {
        self.agent(agent).map(|a| a.conditions.contains(&condition)).unwrap_or(false)
    }

    fn remove_condition(&mut self, agent: AgentId, condition: HostCondition) -> Result<()> {
        self.agent_mut(agent)?.conditions.remove(&condition);
        Ok(())
    }

    fn injuries(&self, agent: AgentId) -> Vec<f32> {
        self.agent(agent).map(|a| a.injuries.clone()).unwrap_or_default()
    }

    fn set_injury_severity(&mut self, agent: AgentId, index: usize, severity: f32) -> Result<()> {
        let agent = self.agent_mut(agent)?;
        if let Some(injury) = agent.injuries.get_mut(index) {
            *injury = severity.max(0.0);
        }
        agent.injuries.retain(|s| *s > 0.0);
        Ok(())
    }

    fn current_target(&self, agent: AgentId) -> Option<AgentId> {
        self.agent(agent).and_then(|a| a.target)
    }

    fn set_target(&mut self, agent: AgentId, target: Option<AgentId>) -> Result<()> {
        self.agent_mut(agent)?.target = target;
        Ok(())
    }

    fn begin_exit(&mut self, agent: AgentId, exit: Cell, depart_at: Tick) -> Result<()> {
        let agent = self.agent_mut(agent)?;
        agent.exit = Some((exit, depart_at));
        agent.status.exiting = true;
        agent.status.moving = true;
        agent.target = None;
        Ok(())
    }

    fn spawn_agent(&mut self, region: RegionId, near: Cell, radius: i32) -> Option<AgentId> {
        let r = self.regions.get(&region)?;
        let mut candidates: Vec<Cell> = (-radius..=radius)
            .flat_map(|dx| (-radius..=radius).map(move |dz| near.offset(dx, dz)))
            .filter(|c| r.walkable(*c))
            .collect();
        if candidates.is_empty() {
            return None;
        }
        candidates.sort_by_key(|c| (c.distance_sq(&near), *c));
        let cell = candidates[(self.next_agent as usize) % candidates.len()];
        let faction = r.spawn_faction;

        let id = self.add_agent(region, cell);
        if let Some(status) = self.status_mut(id) {
            status.faction = faction;
        }
        Some(id)
    }
}

impl SpatialQuery for SandboxHost {
    fn regions(&self) -> Vec<RegionId> {
        self.region_order.clone()
    }

    fn bounds(&self, region: RegionId) -> Option<RegionBounds> {
        self.regions.get(&region).map(|r| r.bounds)
    }

    fn is_home(&self, region: RegionId) -> bool {
        self.regions.get(&region).map(|r| r.home).unwrap_or(false)
    }

    fn terrain(&self, region: RegionId, cell: Cell) -> TerrainTag {
        self.regions
            .get(&region)
            .and_then(|r| r.terrain.get(cell).copied())
            .unwrap_or(TerrainTag::Other)
    }

    fn temperature(&self, region: RegionId, cell: Cell) -> Option<f32> {
        let r = self.regions.get(&region)?;
        if !r.bounds.contains(cell) {
            return None;
        }
        Some(r.cell_temperature.get(&cell).copied().unwrap_or(r.outdoor_temperature))
    }

    fn outdoor_temperature(&self, region: RegionId) -> Option<f32> {
        self.regions.get(&region).map(|r| r.outdoor_temperature)
    }

    fn weather(&self, region: RegionId) -> WeatherKind {
        self.regions.get(&region).map(|r| r.weather).unwrap_or_default()
    }

    fn toxic_fallout(&self, region: RegionId) -> bool {
        self.regions.get(&region).map(|r| r.toxic_fallout).unwrap_or(false)
    }

    fn is_walkable(&self, region: RegionId, cell: Cell) -> bool {
        self.regions.get(&region).map(|r| r.walkable(cell)).unwrap_or(false)
    }

    fn is_fogged(&self, region: RegionId, cell: Cell) -> bool {
        self.regions
            .get(&region)
            .and_then(|r| r.fogged.get(cell).copied())
            .unwrap_or(true)
    }

    fn can_reach(&self, region: RegionId, from: Cell, to: Cell) -> bool {
        let Some(r) = self.regions.get(&region) else {
            return false;
        };
        match (r.components.get(from), r.components.get(to)) {
            (Some(&a), Some(&b)) => a != 0 && a == b,
            _ => false,
        }
    }

    fn has_residue(&self, region: RegionId, cell: Cell) -> bool {
        self.regions
            .get(&region)
            .and_then(|r| r.residue.get(cell).copied())
            .unwrap_or(false)
    }

    fn place_residue(&mut self, region: RegionId, cell: Cell) -> bool {
        let Some(r) = self.regions.get_mut(&region) else {
            return false;
        };
        let holds = r.bounds.contains(cell) && !r.terrain.get(cell).map(|t| t.is_liquid()).unwrap_or(true);
        if holds {
            r.residue.set(cell, true);
        }
        holds
    }
}
