//! What a turned agent should do next
//!
//! Priority: attack the current target, follow a trail, wander, hold still.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::TurnedConfig;
use crate::core::types::{AgentId, Cell, RegionId, Tick};
use crate::host::query::random_reachable_cell;
use crate::host::Host;
use crate::trace::field::TraceField;
use crate::trace::follow::{FollowStep, TraceFollower};
use crate::turned::behavior::TurnedBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    Attack(AgentId),
    FollowTrace(Cell),
    Wander(Cell),
    Hold,
}

impl Directive {
    /// Cell the movement executor should head for, if any
    pub fn destination<H: Host + ?Sized>(&self, host: &H) -> Option<Cell> {
        match self {
            Self::Attack(target) => host.status(*target).map(|s| s.position),
            Self::FollowTrace(cell) | Self::Wander(cell) => Some(*cell),
            Self::Hold => None,
        }
    }
}

/// Everything `think` needs besides the host
pub struct ThinkContext<'a, R: Rng> {
    pub behavior: &'a TurnedBehavior,
    pub follower: &'a mut Option<TraceFollower>,
    pub field: &'a mut TraceField,
    pub config: &'a TurnedConfig,
    pub rng: &'a mut R,
}

pub fn think<H, R>(host: &mut H, region: RegionId, agent: AgentId, now: Tick, ctx: ThinkContext<'_, R>) -> Directive
where
    H: Host + ?Sized,
    R: Rng,
{
    let Some(status) = host.status(agent) else {
        return Directive::Hold;
    };
    if !status.is_capable() || status.exiting || ctx.behavior.is_hibernating() {
        return Directive::Hold;
    }

    if let Some(target) = host.current_target(agent) {
        let alive = host.status(target).map(|s| !s.deceased).unwrap_or(false);
        if alive {
            *ctx.follower = None;
            return Directive::Attack(target);
        }
        if let Err(e) = host.set_target(agent, None) {
            tracing::debug!("could not clear target of {}: {}", agent, e);
        }
    }

    if ctx.follower.is_none() {
        *ctx.follower = TraceFollower::start(ctx.field, status.position, now, ctx.config);
    }
    if let Some(follower) = ctx.follower.as_mut() {
        match follower.step(ctx.field, status.position, now, ctx.config) {
            FollowStep::MoveTo(cell) => return Directive::FollowTrace(cell),
            FollowStep::Succeeded | FollowStep::Failed => *ctx.follower = None,
        }
    }

    match random_reachable_cell(&*host, region, status.position, ctx.config.wander_radius, ctx.rng) {
        Some(cell) => Directive::Wander(cell),
        None => Directive::Hold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::TraceConfig;
    use crate::core::types::{FactionId, RegionBounds};
    use crate::host::sandbox::SandboxHost;
    use crate::host::{AgentDirectory, TerrainTag};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct Fixture {
        host: SandboxHost,
        region: RegionId,
        zombie: AgentId,
        behavior: TurnedBehavior,
        follower: Option<TraceFollower>,
        field: TraceField,
        rng: ChaCha8Rng,
        config: TurnedConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let mut host = SandboxHost::new();
            let region = host.add_region(RegionBounds::new(30, 30), true);
            let zombie = host.add_agent(region, Cell::new(10, 10));
            let config = TurnedConfig::default();
            let mut rng = ChaCha8Rng::seed_from_u64(11);
            let behavior = TurnedBehavior::new(Some(FactionId(1)), 0, &config, &mut rng);
            Self {
                host,
                region,
                zombie,
                behavior,
                follower: None,
                field: TraceField::new(&TraceConfig::default()),
                rng,
                config,
            }
        }

        fn think(&mut self) -> Directive {
            let ctx = ThinkContext {
                behavior: &self.behavior,
                follower: &mut self.follower,
                field: &mut self.field,
                config: &self.config,
                rng: &mut self.rng,
            };
            think(&mut self.host, self.region, self.zombie, 5, ctx)
        }
    }

    #[test]
    fn test_attack_live_target() {
        let mut f = Fixture::new();
        let prey = f.host.add_agent(f.region, Cell::new(12, 10));
        f.host.set_target(f.zombie, Some(prey)).unwrap();
        assert_eq!(f.think(), Directive::Attack(prey));
    }

    #[test]
    fn test_dead_target_cleared() {
        let mut f = Fixture::new();
        let prey = f.host.add_agent(f.region, Cell::new(12, 10));
        f.host.set_target(f.zombie, Some(prey)).unwrap();
        f.host.kill(prey).unwrap();
        assert!(matches!(f.think(), Directive::Wander(_) | Directive::Hold));
        assert_eq!(f.host.current_target(f.zombie), None);
    }

    #[test]
    fn test_follow_strong_trace() {
        let mut f = Fixture::new();
        f.field.deposit(Cell::new(13, 10), 20.0, false, 0, TerrainTag::Soil);
        assert_eq!(f.think(), Directive::FollowTrace(Cell::new(13, 10)));
        assert!(f.follower.is_some());
    }

    #[test]
    fn test_hibernating_holds() {
        let mut f = Fixture::new();
        let comfort = crate::core::types::ComfortBand::default();
        f.behavior.update_hibernation(-40.0, comfort, &f.config);
        assert_eq!(f.think(), Directive::Hold);
    }
}
