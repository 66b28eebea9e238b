//! Core simulation systems.
//!
//! Each system is a thin shell: it borrows the resources it needs and hands
//! them to the plain functions in `combat`, `battle` and `economy`.

use bevy::prelude::*;
use swarmfront_macros::profile;

use crate::game::battle::{cleanup, deployment, Battle, BattleMode, CameraTransition};
use crate::game::combat::{self, CombatScratch};
use crate::game::config::InitialConfig;
use crate::game::economy::Colony;
use crate::game::pool::EntityPool;
use crate::game::unit::Faction;
use crate::game::world::RegionTable;

use super::commands::{apply_command, CommandTarget};
use super::events::*;
use super::resources::*;

// ============================================================================
// Startup
// ============================================================================

/// Copy [`InitialConfig`] into [`SimConfig`] and size everything that
/// depends on it.
pub fn init_sim_config_from_initial(
    mut fixed_time: ResMut<Time<Fixed>>,
    mut sim_config: ResMut<SimConfig>,
    mut rng: ResMut<SimRng>,
    mut pool: ResMut<EntityPool>,
    initial_config: Option<Res<InitialConfig>>,
) {
    let default_config;
    let config = match &initial_config {
        Some(cfg) => cfg.as_ref(),
        None => {
            warn!("[CONFIG] InitialConfig not found, using defaults");
            default_config = InitialConfig::default();
            &default_config
        }
    };

    config.apply(&mut sim_config);
    fixed_time.set_timestep_seconds(1.0 / sim_config.tick_rate);
    *rng = SimRng::seeded(sim_config.rng_seed);
    if pool.capacity() != sim_config.pool_capacity {
        *pool = EntityPool::new(sim_config.pool_capacity);
    }
    info!(
        "[CONFIG] simulation at {} Hz, pool capacity {}",
        sim_config.tick_rate, sim_config.pool_capacity
    );
}

// ============================================================================
// Input
// ============================================================================

pub fn increment_sim_tick(mut tick: ResMut<SimTick>) {
    tick.0 += 1;
}

/// Apply queued player commands in arrival order and answer each one.
pub fn process_commands(
    mut commands: MessageReader<PlayerCommand>,
    mut outcomes: MessageWriter<CommandOutcome>,
    mut colony: ResMut<Colony>,
    mut battle: ResMut<Battle>,
    mut pool: ResMut<EntityPool>,
    mut paused: ResMut<SimPaused>,
    regions: Res<RegionTable>,
) {
    for command in commands.read() {
        let accepted = apply_command(
            *command,
            CommandTarget {
                colony: &mut colony,
                battle: &mut battle,
                pool: &mut pool,
                paused: &mut paused,
                regions: &regions,
            },
        );
        if accepted {
            debug!("[COMMAND] {:?} applied", command);
        } else {
            debug!("[COMMAND] {:?} rejected", command);
        }
        outcomes.write(CommandOutcome { command: *command, accepted });
    }
}

// ============================================================================
// Frame Step
// ============================================================================

fn flush_events(scratch: &mut CombatScratch, writer: &mut MessageWriter<SimEvent>) {
    for event in scratch.events.drain(..) {
        writer.write(event);
    }
}

/// Damage over time and decay, before anyone acts.
pub fn update_statuses(
    config: Res<SimConfig>,
    mut pool: ResMut<EntityPool>,
    mut scratch: ResMut<CombatScratch>,
    mut colony: ResMut<Colony>,
    battle: Res<Battle>,
    mut events: MessageWriter<SimEvent>,
) {
    let scratch = &mut *scratch;
    combat::step_statuses(&mut pool, scratch, config.dt());
    combat::process_deaths(&mut pool, &mut scratch.deaths, &mut colony, &battle.run, &mut scratch.events);
    flush_events(scratch, &mut events);
}

pub fn update_economy(
    config: Res<SimConfig>,
    mut colony: ResMut<Colony>,
    battle: Res<Battle>,
    mut events: MessageWriter<SimEvent>,
) {
    let report = colony.step(config.dt(), battle.run.resource_rate_multiplier);
    for kind in report.produced {
        events.write(SimEvent::UnitProduced { kind });
    }
    for facility in report.overheated {
        events.write(SimEvent::FacilityOverheated { facility });
    }
}

/// Friendly deployment, hostile waves and garrisons while engaged; idle
/// wanderers at the home base.
pub fn update_deployment(
    config: Res<SimConfig>,
    regions: Res<RegionTable>,
    mut battle: ResMut<Battle>,
    mut pool: ResMut<EntityPool>,
    mut colony: ResMut<Colony>,
    mut rng: ResMut<SimRng>,
) {
    let dt = config.dt();
    let rng = &mut rng.0;
    let mode = battle.mode;
    match mode {
        BattleMode::Stockpile => {
            let run = battle.run;
            deployment::maintain_wanderers(&mut pool, &colony, &run, &config, rng);
        }
        BattleMode::Engaged(id) => {
            let Some(region) = regions.get(id) else {
                warn!("[DEPLOY] engaged region {} is not in the table", id);
                return;
            };
            deployment::deploy_swarm(&mut battle, &mut pool, &mut colony, &config, rng, dt);
            deployment::spawn_garrisons(&mut battle, &mut pool, region, &config, rng);
            deployment::spawn_wave(&mut battle, &mut pool, region, &config, rng, dt);
        }
    }
}

/// Targeting, movement and attacks, then death settlement.
#[profile(4)]
pub fn update_combat(
    #[allow(unused_variables)] tick: Res<SimTick>,
    config: Res<SimConfig>,
    battle: Res<Battle>,
    mut pool: ResMut<EntityPool>,
    mut scratch: ResMut<CombatScratch>,
    mut colony: ResMut<Colony>,
    mut rng: ResMut<SimRng>,
    mut events: MessageWriter<SimEvent>,
) {
    let scratch = &mut *scratch;
    combat::step_movement(&mut pool, &battle.obstacles, &config, &mut rng.0, scratch, config.dt());
    combat::process_deaths(&mut pool, &mut scratch.deaths, &mut colony, &battle.run, &mut scratch.events);
    flush_events(scratch, &mut events);

    crate::profile_log!(
        tick,
        "[COMBAT] tick {}: {} swarm, {} hostile alive",
        tick.0,
        pool.count_alive(Faction::Swarm),
        pool.count_alive(Faction::Human)
    );
}

/// Siege camera and region progress.
pub fn update_camera(
    config: Res<SimConfig>,
    regions: Res<RegionTable>,
    pool: Res<EntityPool>,
    mut battle: ResMut<Battle>,
    mut colony: ResMut<Colony>,
    mut events: MessageWriter<SimEvent>,
) {
    let Some(id) = battle.region_id() else { return };
    let Some(region) = regions.get(id) else { return };

    let transition = battle.step_camera(&pool, &region.checkpoints, &config);
    match transition {
        Some(CameraTransition::Locked(index)) => {
            info!("[CAMERA] locked at checkpoint {} (x = {:.0})", index, battle.camera.x);
            events.write(SimEvent::CheckpointLocked { index });
        }
        Some(CameraTransition::Cleared(index)) => {
            info!("[CAMERA] checkpoint {} cleared", index);
            events.write(SimEvent::CheckpointCleared { index });
        }
        None => {}
    }

    let cleared = matches!(transition, Some(CameraTransition::Cleared(_)));
    if let Some(region) = battle.record_progress(cleared, &mut colony.world, &regions) {
        info!("[CAMERA] region {} unlocked", region);
        events.write(SimEvent::RegionUnlocked { region });
    }
}

pub fn cleanup_pool(config: Res<SimConfig>, battle: Res<Battle>, mut pool: ResMut<EntityPool>) {
    cleanup(
        &mut pool,
        battle.camera.x,
        battle.is_engaged(),
        config.cleanup_margin,
        config.dt(),
    );
}
