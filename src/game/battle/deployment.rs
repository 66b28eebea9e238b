//! Spawn controllers: swarm deployment from the stockpile, hostile waves and
//! checkpoint garrisons, plus the home-base wanderers.

use bevy::prelude::*;
use rand::Rng;

use crate::game::economy::Colony;
use crate::game::pool::{EntityPool, UnitState};
use crate::game::simulation::SimConfig;
use crate::game::unit::{Faction, UnitKind, UnitStats};
use crate::game::world::RegionDef;

use super::{Battle, RunModifiers};

/// Deployed units appear this far behind the camera's left edge.
pub const DEPLOY_OFFSET: f32 = 100.0;
pub const DEPLOY_JITTER: f32 = 50.0;
/// Spacing between a deployed unit and its budded twin.
pub const TWIN_OFFSET: f32 = 20.0;
/// Waves appear this far past the right edge of the view.
pub const WAVE_OFFSET: f32 = 150.0;
pub const WAVE_JITTER: f32 = 200.0;
/// Half-width of the strip a garrison is scattered over.
pub const GARRISON_SPREAD: f32 = 60.0;

/// Symmetric triangular sample in `(-1, 1)`.
pub fn triangular<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.random::<f32>() - rng.random::<f32>()
}

fn lane_y<R: Rng + ?Sized>(rng: &mut R, config: &SimConfig) -> f32 {
    config.lane_y + triangular(rng) * config.lane_height * 0.5
}

/// Pick a kind from `kinds` with probability proportional to its stockpile.
fn pick_by_stock<R: Rng + ?Sized>(colony: &Colony, kinds: &[UnitKind], rng: &mut R) -> Option<UnitKind> {
    let total: u32 = kinds.iter().map(|k| colony.hatchery.stockpile(*k)).sum();
    if total == 0 {
        return None;
    }
    let mut roll = rng.random_range(0..total);
    for kind in kinds {
        let stock = colony.hatchery.stockpile(*kind);
        if roll < stock {
            return Some(*kind);
        }
        roll -= stock;
    }
    None
}

// ============================================================================
// Engaged Mode
// ============================================================================

/// Send at most one stockpiled unit into the lane per deploy interval.
/// Returns the number of bodies spawned.
pub fn deploy_swarm<R: Rng + ?Sized>(
    battle: &mut Battle,
    pool: &mut EntityPool,
    colony: &mut Colony,
    config: &SimConfig,
    rng: &mut R,
    dt: f32,
) -> u32 {
    battle.deploy_timer += dt;
    if battle.deploy_timer < config.deploy_interval {
        return 0;
    }
    battle.deploy_timer = 0.0;

    if pool.count_alive(Faction::Swarm) >= config.max_deployed {
        return 0;
    }
    let Some(kind) = pick_by_stock(colony, &UnitKind::DEPLOYABLE, rng) else {
        return 0;
    };

    let stats = colony.unit_stats(kind, &battle.run);
    let position = Vec2::new(
        battle.camera.x - DEPLOY_OFFSET - rng.random::<f32>() * DEPLOY_JITTER,
        lane_y(rng, config),
    );
    if pool.spawn(Faction::Swarm, kind, position, &stats).is_none() {
        return 0;
    }
    colony.hatchery.take(kind);

    let mut spawned = 1;
    if rng.random::<f32>() < battle.run.double_spawn_chance {
        let twin = position - Vec2::new(TWIN_OFFSET, 0.0);
        if pool.spawn(Faction::Swarm, kind, twin, &stats).is_some() {
            spawned += 1;
        }
    }
    spawned
}

/// Difficulty-scaled hostile waves from the region's spawn table.
pub fn spawn_wave<R: Rng + ?Sized>(
    battle: &mut Battle,
    pool: &mut EntityPool,
    region: &RegionDef,
    config: &SimConfig,
    rng: &mut R,
    dt: f32,
) -> u32 {
    let difficulty = battle.difficulty(region, config);
    let interval = (config.wave_base_interval / difficulty).max(config.wave_min_interval);

    battle.wave_timer += dt;
    if battle.wave_timer < interval {
        return 0;
    }
    battle.wave_timer = 0.0;

    let size = 2 + (rng.random::<f32>() * difficulty).floor() as u32;
    let base_x = battle.camera.x + config.view_width + WAVE_OFFSET;
    let mut spawned = 0;
    for _ in 0..size {
        let Some(kind) = region.pick_hostile(rng.random()) else { break };
        let position = Vec2::new(base_x + rng.random::<f32>() * WAVE_JITTER, lane_y(rng, config));
        if pool.spawn(Faction::Human, kind, position, &UnitStats::base(kind)).is_none() {
            break;
        }
        spawned += 1;
    }
    if spawned > 0 {
        debug!("[DEPLOY] wave of {} at difficulty {:.2}", spawned, difficulty);
    }
    spawned
}

/// Man every checkpoint that has just come within reach of the view.
pub fn spawn_garrisons<R: Rng + ?Sized>(
    battle: &mut Battle,
    pool: &mut EntityPool,
    region: &RegionDef,
    config: &SimConfig,
    rng: &mut R,
) -> u32 {
    let reveal = battle.camera.x + config.view_width + config.garrison_reveal_margin;
    let difficulty = battle.difficulty(region, config);
    let mut spawned = 0;

    for (index, checkpoint) in region.checkpoints.iter().enumerate() {
        if checkpoint.x > reveal || battle.is_garrisoned(index) {
            continue;
        }
        battle.mark_garrisoned(index);

        let count = (checkpoint.garrison as f32 * difficulty).ceil() as u32;
        let mut manned = 0;
        for _ in 0..count {
            let Some(kind) = region.pick_hostile(rng.random()) else { break };
            let position = Vec2::new(
                checkpoint.x + triangular(rng) * GARRISON_SPREAD,
                lane_y(rng, config),
            );
            if pool.spawn(Faction::Human, kind, position, &UnitStats::base(kind)).is_some() {
                manned += 1;
            }
        }
        info!("[DEPLOY] checkpoint {} garrisoned with {} defenders", index, manned);
        spawned += manned;
    }
    spawned
}

// ============================================================================
// Stockpile Mode
// ============================================================================

/// Keep the home base populated with up to `max_wanderers` idle units
/// mirroring the stockpile. Adds or removes at most one body per call.
pub fn maintain_wanderers<R: Rng + ?Sized>(
    pool: &mut EntityPool,
    colony: &Colony,
    run: &RunModifiers,
    config: &SimConfig,
    rng: &mut R,
) {
    let stored: u32 = UnitKind::DEPLOYABLE.iter().map(|k| colony.hatchery.stockpile(*k)).sum();
    let target = stored.min(config.max_wanderers) as usize;
    let live = pool.count_alive(Faction::Swarm);

    if live < target {
        let Some(kind) = pick_by_stock(colony, &UnitKind::DEPLOYABLE, rng) else { return };
        let position = Vec2::new(rng.random::<f32>() * config.view_width, lane_y(rng, config));
        let stats = colony.unit_stats(kind, run);
        if let Some(id) = pool.spawn(Faction::Swarm, kind, position, &stats) {
            if let Some(c) = pool.get_mut(id) {
                c.state = UnitState::Wander;
            }
        }
    } else if live > target {
        let surplus = pool
            .iter_active()
            .find(|(_, c)| c.faction == Faction::Swarm && c.is_alive())
            .map(|(i, _)| i);
        if let Some(index) = surplus {
            pool.recycle_index(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::world::RegionTable;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn engaged(region: u32) -> (Battle, EntityPool, RegionTable) {
        let table = RegionTable::default();
        let mut pool = EntityPool::new(128);
        let mut battle = Battle::default();
        if let Some(def) = table.get(region) {
            battle.enter(def, &mut pool);
        }
        (battle, pool, table)
    }

    #[test]
    fn test_deploy_is_throttled_and_consumes_stockpile() {
        let config = SimConfig::default();
        let (mut battle, mut pool, _) = engaged(1);
        let mut colony = Colony::default();
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(deploy_swarm(&mut battle, &mut pool, &mut colony, &config, &mut rng, 0.1), 0);
        assert_eq!(deploy_swarm(&mut battle, &mut pool, &mut colony, &config, &mut rng, 0.1), 1);
        assert_eq!(colony.hatchery.stockpile(UnitKind::Melee), 4);
        assert_eq!(pool.count_alive(Faction::Swarm), 1);

        let unit = pool.iter_active().map(|(_, c)| c.position.x).next();
        assert!(unit.is_some_and(|x| (-150.0..=-100.0).contains(&x)));
    }

    #[test]
    fn test_deploy_with_empty_stockpile_is_noop() {
        let config = SimConfig::default();
        let (mut battle, mut pool, _) = engaged(1);
        let mut colony = Colony::default();
        for entry in colony.hatchery.entries.iter_mut() {
            entry.stockpile = 0;
        }
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(deploy_swarm(&mut battle, &mut pool, &mut colony, &config, &mut rng, 1.0), 0);
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn test_queens_never_deploy() {
        let config = SimConfig::default();
        let (mut battle, mut pool, _) = engaged(1);
        let mut colony = Colony::default();
        for entry in colony.hatchery.entries.iter_mut() {
            entry.stockpile = if entry.kind == UnitKind::Queen { 5 } else { 0 };
        }
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(deploy_swarm(&mut battle, &mut pool, &mut colony, &config, &mut rng, 1.0), 0);
        assert_eq!(colony.hatchery.stockpile(UnitKind::Queen), 5);
    }

    #[test]
    fn test_wave_spawns_past_view_from_table() {
        let config = SimConfig::default();
        let (mut battle, mut pool, table) = engaged(1);
        let Some(region) = table.get(1) else { panic!("region 1 missing") };
        let mut rng = StdRng::seed_from_u64(9);

        assert_eq!(spawn_wave(&mut battle, &mut pool, region, &config, &mut rng, 1.0), 0);
        let spawned = spawn_wave(&mut battle, &mut pool, region, &config, &mut rng, 3.0);
        // Difficulty 1 at the origin: exactly two marines.
        assert_eq!(spawned, 2);
        for (_, c) in pool.iter_active() {
            assert_eq!(c.kind, UnitKind::Marine);
            assert!(c.position.x >= config.view_width + WAVE_OFFSET);
            assert!(c.position.y >= config.lane_min() && c.position.y <= config.lane_max());
        }
    }

    #[test]
    fn test_garrison_spawns_once_per_checkpoint() {
        let config = SimConfig::default();
        let (mut battle, mut pool, table) = engaged(1);
        let Some(region) = table.get(1) else { panic!("region 1 missing") };
        let mut rng = StdRng::seed_from_u64(2);

        assert_eq!(spawn_garrisons(&mut battle, &mut pool, region, &config, &mut rng), 0);

        battle.camera.x = region.checkpoints[0].x - config.view_width;
        let first = spawn_garrisons(&mut battle, &mut pool, region, &config, &mut rng);
        assert!(first >= region.checkpoints[0].garrison);
        assert_eq!(spawn_garrisons(&mut battle, &mut pool, region, &config, &mut rng), 0);
    }

    #[test]
    fn test_wanderers_track_stockpile() {
        let config = SimConfig::default();
        let mut pool = EntityPool::new(64);
        let mut colony = Colony::default();
        let run = RunModifiers::default();
        let mut rng = StdRng::seed_from_u64(4);

        for _ in 0..20 {
            maintain_wanderers(&mut pool, &colony, &run, &config, &mut rng);
        }
        assert_eq!(pool.count_alive(Faction::Swarm), 5);
        assert!(pool.iter_active().all(|(_, c)| c.state == UnitState::Wander));

        for entry in colony.hatchery.entries.iter_mut() {
            entry.stockpile = 0;
        }
        for _ in 0..20 {
            maintain_wanderers(&mut pool, &colony, &run, &config, &mut rng);
        }
        assert_eq!(pool.active_count(), 0);
    }
}
