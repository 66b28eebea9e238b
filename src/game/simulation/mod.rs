//! Simulation layer: the fixed-tick frame step.
//!
//! This module is organized into:
//! - **resources**: runtime config, tick counter, RNG, pause flag
//! - **events**: player commands in, simulation events out
//! - **commands**: command application
//! - **systems**: the thin Bevy systems of each frame phase
//! - **snapshot**: read-only state for a UI

use bevy::prelude::*;

use crate::game::battle::Battle;
use crate::game::combat::CombatScratch;
use crate::game::economy::Colony;
use crate::game::pool::EntityPool;
use crate::game::world::RegionTable;

pub mod commands;
pub mod events;
pub mod resources;
pub mod snapshot;
pub mod systems;

pub use commands::{apply_command, CommandTarget};
pub use events::*;
pub use resources::*;
pub use snapshot::{SimSnapshot, StockpileCount};
pub use systems::init_sim_config_from_initial;

/// Frame phases, run in this order every fixed tick.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum SimSet {
    Input,      // Player commands
    Status,     // Damage over time, decay
    Economy,    // Converters, hatchery
    Deployment, // Friendly deploys, waves, garrisons
    Combat,     // Targeting, movement, attacks, deaths
    Camera,     // Siege camera, region progress
    Cleanup,    // Corpse fade, off-screen recycling
}

/// Main simulation plugin
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Overwritten from the config at startup
        app.insert_resource(Time::<Fixed>::from_hz(SimConfig::default().tick_rate));

        app.init_resource::<SimConfig>();
        app.init_resource::<SimTick>();
        app.init_resource::<SimRng>();
        app.init_resource::<SimPaused>();
        app.init_resource::<EntityPool>();
        app.init_resource::<CombatScratch>();
        app.init_resource::<Colony>();
        app.init_resource::<Battle>();
        app.init_resource::<RegionTable>();

        app.add_message::<PlayerCommand>();
        app.add_message::<CommandOutcome>();
        app.add_message::<SimEvent>();

        app.configure_sets(
            FixedUpdate,
            (
                SimSet::Input,
                SimSet::Status,
                SimSet::Economy,
                SimSet::Deployment,
                SimSet::Combat,
                SimSet::Camera,
                SimSet::Cleanup,
            )
                .chain(),
        );
        app.configure_sets(
            FixedUpdate,
            (
                SimSet::Status,
                SimSet::Economy,
                SimSet::Deployment,
                SimSet::Combat,
                SimSet::Camera,
                SimSet::Cleanup,
            )
                .run_if(simulation_running),
        );

        app.add_systems(Startup, systems::init_sim_config_from_initial);

        app.add_systems(
            FixedUpdate,
            (
                systems::process_commands.in_set(SimSet::Input),
                (systems::increment_sim_tick, systems::update_statuses)
                    .chain()
                    .in_set(SimSet::Status),
                systems::update_economy.in_set(SimSet::Economy),
                systems::update_deployment.in_set(SimSet::Deployment),
                systems::update_combat.in_set(SimSet::Combat),
                systems::update_camera.in_set(SimSet::Camera),
                systems::cleanup_pool.in_set(SimSet::Cleanup),
            ),
        );
    }
}
