//! Walking a trail of traces toward its source
//!
//! The follower heads for the strongest nearby trace, and on arrival picks the
//! strongest one it has not visited yet. It succeeds when the trail runs out
//! and fails after a bounded number of steps.

use serde::{Deserialize, Serialize};

use crate::core::config::TurnedConfig;
use crate::core::types::{Cell, Tick};
use crate::trace::field::TraceField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowStep {
    MoveTo(Cell),
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFollower {
    target: Cell,
    visited: Vec<Cell>,
    steps: u32,
}

impl TraceFollower {
    /// Begin following if a strong enough trace is within reach
    pub fn start(field: &mut TraceField, from: Cell, now: Tick, config: &TurnedConfig) -> Option<Self> {
        let nearby = field.query(from, config.trace_search_radius, now);
        let best = field.strongest(&nearby, now)?;
        if field.strength(best, now) < config.min_follow_strength {
            return None;
        }
        Some(Self {
            target: best,
            visited: Vec::new(),
            steps: 0,
        })
    }

    pub fn target(&self) -> Cell {
        self.target
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Advance one step from `position`
    pub fn step(&mut self, field: &mut TraceField, position: Cell, now: Tick, config: &TurnedConfig) -> FollowStep {
        self.steps += 1;
        if self.steps > config.max_follow_ticks {
            return FollowStep::Failed;
        }

        if position.distance_sq(&self.target) > 2 {
            return FollowStep::MoveTo(self.target);
        }

        self.visited.push(self.target);
        let candidates: Vec<Cell> = field
            .query(position, config.trace_search_radius, now)
            .into_iter()
            .filter(|c| !self.visited.contains(c))
            .collect();

        match field.strongest(&candidates, now) {
            Some(next) => {
                self.target = next;
                FollowStep::MoveTo(next)
            }
            None => FollowStep::Succeeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::TraceConfig;
    use crate::host::TerrainTag;

    fn trail() -> TraceField {
        let mut field = TraceField::new(&TraceConfig::default());
        for (x, strength) in [(3, 8.0), (6, 12.0), (9, 16.0)] {
            field.deposit(Cell::new(x, 0), strength, false, 0, TerrainTag::Soil);
        }
        field
    }

    #[test]
    fn test_no_trace_no_follow() {
        let config = TurnedConfig::default();
        let mut field = TraceField::new(&TraceConfig::default());
        assert!(TraceFollower::start(&mut field, Cell::new(0, 0), 0, &config).is_none());

        field.deposit(Cell::new(1, 0), 2.0, false, 0, TerrainTag::Soil);
        assert!(TraceFollower::start(&mut field, Cell::new(0, 0), 0, &config).is_none());
    }

    #[test]
    fn test_follows_trail_to_the_end() {
        let config = TurnedConfig::default();
        let mut field = trail();
        let mut follower = TraceFollower::start(&mut field, Cell::new(0, 0), 1, &config).unwrap();
        assert_eq!(follower.target(), Cell::new(3, 0));

        let mut position = Cell::new(0, 0);
        let mut reached = Vec::new();
        loop {
            match follower.step(&mut field, position, 1, &config) {
                FollowStep::MoveTo(cell) => {
                    if position == cell {
                        panic!("stuck at {:?}", cell);
                    }
                    // Teleport onto the target to stand in for pathing
                    position = cell;
                    reached.push(cell);
                }
                FollowStep::Succeeded => break,
                FollowStep::Failed => panic!("follower failed"),
            }
        }
        assert_eq!(reached, vec![Cell::new(3, 0), Cell::new(6, 0), Cell::new(9, 0)]);
    }

    #[test]
    fn test_gives_up_after_max_steps() {
        let config = TurnedConfig {
            max_follow_ticks: 3,
            ..TurnedConfig::default()
        };
        let mut field = trail();
        let mut follower = TraceFollower::start(&mut field, Cell::new(0, 0), 0, &config).unwrap();
        let far = Cell::new(0, 30);
        for _ in 0..3 {
            assert!(matches!(follower.step(&mut field, far, 0, &config), FollowStep::MoveTo(_)));
        }
        assert_eq!(follower.step(&mut field, far, 0, &config), FollowStep::Failed);
    }
}
