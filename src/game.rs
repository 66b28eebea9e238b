use bevy::prelude::*;

pub mod battle;
pub mod combat;
pub mod config;
pub mod economy;
pub mod pool;
pub mod save;
pub mod simulation;
pub mod unit;
pub mod world;

use config::GameConfigPlugin;
use simulation::SimulationPlugin;

/// The whole game core. Needs `AssetPlugin` for the region table asset;
/// persistence is added separately with [`save::PersistencePlugin`].
pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((SimulationPlugin, GameConfigPlugin));
    }
}
