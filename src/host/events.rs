//! Lifecycle events emitted by the core
//!
//! Returned from every world tick in emission order and also pushed to any
//! registered observers.

use serde::{Deserialize, Serialize};

use crate::affliction::starvation::StarvationEffect;
use crate::core::types::{AgentId, Cell, FactionId, RegionId, Tick};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlightEvent {
    /// A new infection track was attached
    Infected {
        agent: AgentId,
        severity: f32,
    },
    /// Infection completed on a corpse; the agent is now turned
    Transformed {
        agent: AgentId,
        region: RegionId,
    },
    /// Protection pushed the infection below the cure threshold
    Cured {
        agent: AgentId,
        faction: Option<FactionId>,
    },
    /// A turned agent died for good and its faction was restored
    PermanentDeath {
        agent: AgentId,
        region: RegionId,
    },
    SpawnRequested {
        region: RegionId,
        near: Cell,
        count: u32,
    },
    EvictRequested {
        agent: AgentId,
        exit: Cell,
        depart_at: Tick,
    },
    HibernationChanged {
        agent: AgentId,
        hibernating: bool,
    },
    /// `alerted` lists neighbours that adopted the same target
    TargetAcquired {
        agent: AgentId,
        target: AgentId,
        alerted: Vec<AgentId>,
    },
    ResidueDropped {
        region: RegionId,
        cell: Cell,
    },
    StarvationEffect {
        agent: AgentId,
        effect: StarvationEffect,
    },
    /// Residue extraction used up the last of a corpse's taint
    TaintDepleted {
        agent: AgentId,
    },
}

/// Explicitly registered listener for core events
pub trait BlightObserver {
    fn on_event(&mut self, event: &BlightEvent);
}

/// Counts events by type; used by the demo binary and tests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTally {
    pub infected: u32,
    pub transformed: u32,
    pub cured: u32,
    pub permanent_deaths: u32,
    pub spawn_requests: u32,
    pub spawned_agents: u32,
    pub evictions: u32,
    pub hibernation_changes: u32,
    pub targets_acquired: u32,
    pub alerts: u32,
    pub residue_dropped: u32,
    pub starvation_effects: u32,
    pub taint_depleted: u32,
}

impl EventTally {
    pub fn record(&mut self, event: &BlightEvent) {
        match event {
            BlightEvent::Infected { .. } => self.infected += 1,
            BlightEvent::Transformed { .. } => self.transformed += 1,
            BlightEvent::Cured { .. } => self.cured += 1,
            BlightEvent::PermanentDeath { .. } => self.permanent_deaths += 1,
            BlightEvent::SpawnRequested { count, .. } => {
                self.spawn_requests += 1;
                self.spawned_agents += count;
            }
            BlightEvent::EvictRequested { .. } => self.evictions += 1,
            BlightEvent::HibernationChanged { .. } => self.hibernation_changes += 1,
            BlightEvent::TargetAcquired { alerted, .. } => {
                self.targets_acquired += 1;
                self.alerts += alerted.len() as u32;
            }
            BlightEvent::ResidueDropped { .. } => self.residue_dropped += 1,
            BlightEvent::StarvationEffect { .. } => self.starvation_effects += 1,
            BlightEvent::TaintDepleted { .. } => self.taint_depleted += 1,
        }
    }
}

impl BlightObserver for EventTally {
    fn on_event(&mut self, event: &BlightEvent) {
        self.record(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_counts_spawned_agents() {
        let mut tally = EventTally::default();
        tally.on_event(&BlightEvent::SpawnRequested {
            region: RegionId(0),
            near: Cell::new(0, 0),
            count: 3,
        });
        tally.on_event(&BlightEvent::TargetAcquired {
            agent: AgentId::from_index(0),
            target: AgentId::from_index(1),
            alerted: vec![AgentId::from_index(2), AgentId::from_index(3)],
        });
        assert_eq!(tally.spawn_requests, 1);
        assert_eq!(tally.spawned_agents, 3);
        assert_eq!(tally.targets_acquired, 1);
        assert_eq!(tally.alerts, 2);
    }
}
