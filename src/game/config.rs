use bevy::prelude::*;
use bevy_common_assets::ron::RonAssetPlugin;
use serde::{Deserialize, Serialize};

use crate::game::simulation::SimConfig;
use crate::game::world::RegionTable;

pub const INITIAL_CONFIG_PATH: &str = "assets/initial_config.ron";
pub const REGION_TABLE_ASSET: &str = "campaign.regions.ron";

/// Static configuration read once at startup and copied into [`SimConfig`].
/// Fields missing from the file keep their defaults.
#[derive(Resource, Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InitialConfig {
    pub tick_rate: f64,
    pub pool_capacity: usize,
    pub rng_seed: u64,

    // Lane
    pub view_width: f32,
    pub lane_y: f32,
    pub lane_height: f32,

    // Movement & targeting
    pub aggro_radius: f32,
    pub behind_slack: f32,
    pub contact_buffer: f32,
    pub neighbor_radius: f32,
    pub separation_strength: f32,
    pub obstacle_flow: f32,

    // Deployment & waves
    pub deploy_interval: f32,
    pub max_deployed: usize,
    pub max_wanderers: u32,
    pub wave_base_interval: f32,
    pub wave_min_interval: f32,
    pub difficulty_distance: f32,

    // Camera
    pub camera_follow_lerp: f32,
    pub camera_return_lerp: f32,
    pub camera_lead: f32,
    pub lock_trigger_distance: f32,
    pub lock_radius: f32,
    pub cleanup_margin: f32,
    pub garrison_reveal_margin: f32,

    // Persistence
    pub autosave_interval: f32,
}

impl Default for InitialConfig {
    fn default() -> Self {
        let sim = SimConfig::default();
        Self {
            tick_rate: sim.tick_rate,
            pool_capacity: sim.pool_capacity,
            rng_seed: sim.rng_seed,
            view_width: sim.view_width,
            lane_y: sim.lane_y,
            lane_height: sim.lane_height,
            aggro_radius: sim.aggro_radius,
            behind_slack: sim.behind_slack,
            contact_buffer: sim.contact_buffer,
            neighbor_radius: sim.neighbor_radius,
            separation_strength: sim.separation_strength,
            obstacle_flow: sim.obstacle_flow,
            deploy_interval: sim.deploy_interval,
            max_deployed: sim.max_deployed,
            max_wanderers: sim.max_wanderers,
            wave_base_interval: sim.wave_base_interval,
            wave_min_interval: sim.wave_min_interval,
            difficulty_distance: sim.difficulty_distance,
            camera_follow_lerp: sim.camera_follow_lerp,
            camera_return_lerp: sim.camera_return_lerp,
            camera_lead: sim.camera_lead,
            lock_trigger_distance: sim.lock_trigger_distance,
            lock_radius: sim.lock_radius,
            cleanup_margin: sim.cleanup_margin,
            garrison_reveal_margin: sim.garrison_reveal_margin,
            autosave_interval: sim.autosave_interval,
        }
    }
}

impl InitialConfig {
    /// Parse a RON document. Absent fields fall back to their defaults.
    pub fn from_ron(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config = ron::from_str::<InitialConfig>(contents)?;
        if !(config.tick_rate > 0.0) {
            return Err(format!("tick_rate must be positive, got {}", config.tick_rate).into());
        }
        Ok(config)
    }

    /// Copy every value into the runtime config.
    pub fn apply(&self, sim: &mut SimConfig) {
        sim.tick_rate = self.tick_rate;
        sim.pool_capacity = self.pool_capacity;
        sim.rng_seed = self.rng_seed;
        sim.view_width = self.view_width;
        sim.lane_y = self.lane_y;
        sim.lane_height = self.lane_height;
        sim.aggro_radius = self.aggro_radius;
        sim.behind_slack = self.behind_slack;
        sim.contact_buffer = self.contact_buffer;
        sim.neighbor_radius = self.neighbor_radius;
        sim.separation_strength = self.separation_strength;
        sim.obstacle_flow = self.obstacle_flow;
        sim.deploy_interval = self.deploy_interval;
        sim.max_deployed = self.max_deployed;
        sim.max_wanderers = self.max_wanderers;
        sim.wave_base_interval = self.wave_base_interval;
        sim.wave_min_interval = self.wave_min_interval;
        sim.difficulty_distance = self.difficulty_distance;
        sim.camera_follow_lerp = self.camera_follow_lerp;
        sim.camera_return_lerp = self.camera_return_lerp;
        sim.camera_lead = self.camera_lead;
        sim.lock_trigger_distance = self.lock_trigger_distance;
        sim.lock_radius = self.lock_radius;
        sim.cleanup_margin = self.cleanup_margin;
        sim.garrison_reveal_margin = self.garrison_reveal_margin;
        sim.autosave_interval = self.autosave_interval;
    }
}

#[derive(Resource)]
pub struct RegionTableHandle(pub Handle<RegionTable>);

/// Reads `initial_config.ron` and watches the region table asset.
///
/// Needs `AssetPlugin`. Without this plugin the simulation runs on
/// `InitialConfig::default()` and the built-in campaign.
pub struct GameConfigPlugin;

impl Plugin for GameConfigPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RonAssetPlugin::<RegionTable>::new(&["regions.ron"]))
            .add_systems(
                Startup,
                (
                    load_initial_config.before(crate::game::simulation::init_sim_config_from_initial),
                    setup_region_table,
                ),
            )
            .add_systems(Update, update_region_table);
    }
}

/// Load static initial configuration synchronously at startup.
fn load_initial_config(mut commands: Commands) {
    let config = match std::fs::read_to_string(INITIAL_CONFIG_PATH) {
        Ok(contents) => match InitialConfig::from_ron(&contents) {
            Ok(config) => {
                info!("[CONFIG] loaded initial config from {}", INITIAL_CONFIG_PATH);
                config
            }
            Err(e) => {
                error!("[CONFIG] failed to parse initial config: {}", e);
                error!("[CONFIG] using default InitialConfig");
                InitialConfig::default()
            }
        },
        Err(e) => {
            error!("[CONFIG] failed to read {}: {}", INITIAL_CONFIG_PATH, e);
            error!("[CONFIG] using default InitialConfig");
            InitialConfig::default()
        }
    };
    commands.insert_resource(config);
}

fn setup_region_table(mut commands: Commands, asset_server: Res<AssetServer>) {
    let handle = asset_server.load(REGION_TABLE_ASSET);
    commands.insert_resource(RegionTableHandle(handle));
}

/// Copy the region table asset into the live resource whenever it loads or
/// changes on disk.
fn update_region_table(
    mut events: MessageReader<AssetEvent<RegionTable>>,
    assets: Res<Assets<RegionTable>>,
    handle: Option<Res<RegionTableHandle>>,
    mut table: ResMut<RegionTable>,
) {
    let Some(handle) = handle else { return };
    for event in events.read() {
        if !(event.is_modified(handle.0.id()) || event.is_loaded_with_dependencies(handle.0.id())) {
            continue;
        }
        let Some(loaded) = assets.get(&handle.0) else { continue };
        if loaded.regions.is_empty() {
            warn!("[CONFIG] region table asset is empty, keeping {} regions", table.regions.len());
            continue;
        }
        *table = loaded.clone();
        info!("[CONFIG] region table updated: {} regions", table.regions.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_sim_config() {
        let mut sim = SimConfig::default();
        sim.tick_rate = 1.0;
        InitialConfig::default().apply(&mut sim);
        assert_eq!(sim, SimConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = InitialConfig::from_ron("(tick_rate: 60.0, max_deployed: 12)").unwrap();
        assert_eq!(config.tick_rate, 60.0);
        assert_eq!(config.max_deployed, 12);
        assert_eq!(config.view_width, InitialConfig::default().view_width);
    }

    #[test]
    fn test_rejects_zero_tick_rate() {
        assert!(InitialConfig::from_ron("(tick_rate: 0.0)").is_err());
        assert!(InitialConfig::from_ron("not ron at all").is_err());
    }
}
