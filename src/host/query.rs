//! Spatial query helpers built on the host traits

use rand::Rng;

use crate::core::types::{AgentId, Cell, RegionId};
use crate::host::{AgentStatus, Host};

/// Agents whose position lies within `radius` of `center`, nearest first
pub fn agents_within<H: Host + ?Sized>(
    host: &H,
    region: RegionId,
    center: Cell,
    radius: f32,
) -> Vec<(AgentId, AgentStatus)> {
    let radius_sq = (radius * radius) as i64;
    let mut found: Vec<(AgentId, AgentStatus)> = host
        .agents_in_region(region)
        .into_iter()
        .filter_map(|id| host.status(id).map(|status| (id, status)))
        .filter(|(_, status)| status.position.distance_sq(&center) <= radius_sq)
        .collect();
    found.sort_by_key(|(id, status)| (status.position.distance_sq(&center), *id));
    found
}

/// Nearest agent within `radius` that matches `predicate` and can be reached on foot
///
/// Reachability is only checked for candidates that pass the predicate, in
/// distance order, so the expensive path test runs as rarely as possible.
pub fn nearest_reachable_agent<H, F>(
    host: &H,
    region: RegionId,
    from: Cell,
    radius: f32,
    mut predicate: F,
) -> Option<AgentId>
where
    H: Host + ?Sized,
    F: FnMut(AgentId, &AgentStatus) -> bool,
{
    agents_within(host, region, from, radius)
        .into_iter()
        .filter(|(id, status)| predicate(*id, status))
        .find(|(_, status)| host.can_reach(region, from, status.position))
        .map(|(id, _)| id)
}

/// Nearest walkable candidate cell reachable from `from`
pub fn nearest_reachable_cell<H, I>(host: &H, region: RegionId, from: Cell, candidates: I) -> Option<Cell>
where
    H: Host + ?Sized,
    I: IntoIterator<Item = Cell>,
{
    let mut cells: Vec<Cell> = candidates
        .into_iter()
        .filter(|c| host.is_walkable(region, *c))
        .collect();
    cells.sort_by_key(|c| (c.distance_sq(&from), *c));
    cells.into_iter().find(|c| host.can_reach(region, from, *c))
}

/// Random walkable, reachable cell within `radius`; gives up after a few draws
pub fn random_reachable_cell<H: Host + ?Sized>(
    host: &H,
    region: RegionId,
    from: Cell,
    radius: i32,
    rng: &mut impl Rng,
) -> Option<Cell> {
    const ATTEMPTS: usize = 12;
    let bounds = host.bounds(region)?;
    if radius <= 0 {
        return None;
    }
    for _ in 0..ATTEMPTS {
        let cell = from.offset(rng.gen_range(-radius..=radius), rng.gen_range(-radius..=radius));
        if cell != from
            && bounds.contains(cell)
            && host.is_walkable(region, cell)
            && host.can_reach(region, from, cell)
        {
            return Some(cell);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RegionBounds;
    use crate::host::sandbox::SandboxHost;
    use crate::host::SpatialQuery;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn host_with_wall() -> (SandboxHost, RegionId) {
        let mut host = SandboxHost::new();
        let region = host.add_region(RegionBounds::new(12, 12), true);
        // Vertical wall at x = 6
        for z in 0..12 {
            host.set_walkable(region, Cell::new(6, z), false);
        }
        (host, region)
    }

    #[test]
    fn test_nearest_reachable_skips_unreachable() {
        let (mut host, region) = host_with_wall();
        let behind_wall = host.add_agent(region, Cell::new(7, 5));
        let far_side = host.add_agent(region, Cell::new(1, 9));

        let found = nearest_reachable_agent(&host, region, Cell::new(5, 5), 10.0, |_, _| true);
        assert_eq!(found, Some(far_side));
        assert_ne!(found, Some(behind_wall));
    }

    #[test]
    fn test_nearest_reachable_respects_predicate() {
        let (mut host, region) = host_with_wall();
        let a = host.add_agent(region, Cell::new(4, 5));
        let b = host.add_agent(region, Cell::new(2, 5));

        let found = nearest_reachable_agent(&host, region, Cell::new(5, 5), 10.0, |id, _| id != a);
        assert_eq!(found, Some(b));
    }

    #[test]
    fn test_nearest_reachable_cell() {
        let (host, region) = host_with_wall();
        let candidates = [Cell::new(7, 5), Cell::new(0, 5), Cell::new(6, 5)];
        let found = nearest_reachable_cell(&host, region, Cell::new(5, 5), candidates);
        assert_eq!(found, Some(Cell::new(0, 5)));
    }

    #[test]
    fn test_random_reachable_cell_stays_on_side() {
        let (host, region) = host_with_wall();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..20 {
            if let Some(cell) = random_reachable_cell(&host, region, Cell::new(2, 2), 5, &mut rng) {
                assert!(cell.x < 6);
                assert!(host.is_walkable(region, cell));
            }
        }
    }
}
