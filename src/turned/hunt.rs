//! Victim search and pack alerting

use crate::core::types::{AgentId, Cell, FactionId, RegionId};
use crate::host::query::{agents_within, nearest_reachable_agent};
use crate::host::Host;

/// Nearest living, hostile, reachable agent within `radius`
///
/// `excluded` rules out other turned agents and anyone currently immune.
pub fn find_victim<H, F>(
    host: &H,
    region: RegionId,
    hunter: AgentId,
    from: Cell,
    hostile_faction: FactionId,
    radius: f32,
    excluded: F,
) -> Option<AgentId>
where
    H: Host + ?Sized,
    F: Fn(AgentId) -> bool,
{
    nearest_reachable_agent(host, region, from, radius, |id, status| {
        id != hunter
            && !status.deceased
            && status.flesh
            && !excluded(id)
            && host.is_hostile_to(id, hostile_faction)
    })
}

/// Hand `target` to idle pack members near `center`
///
/// One hop only: alerted agents do not alert their own neighbours.
pub fn alert_nearby<H, F>(
    host: &mut H,
    region: RegionId,
    source: AgentId,
    center: Cell,
    target: AgentId,
    radius: f32,
    is_active_turned: F,
) -> Vec<AgentId>
where
    H: Host + ?Sized,
    F: Fn(AgentId) -> bool,
{
    let idle: Vec<AgentId> = agents_within(&*host, region, center, radius)
        .into_iter()
        .filter(|(id, status)| {
            *id != source
                && *id != target
                && status.is_capable()
                && is_active_turned(*id)
                && host.current_target(*id).is_none()
        })
        .map(|(id, _)| id)
        .collect();

    idle.into_iter()
        .filter(|id| match host.set_target(*id, Some(target)) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("alert skipped for {}: {}", id, e);
                false
            }
        })
        .collect()
}
