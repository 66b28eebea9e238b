use bevy::prelude::*;
use swarmfront::game::config::InitialConfig;
use swarmfront::game::simulation::{SimConfig, SimulationPlugin};
use swarmfront::game::world::RegionTable;

#[test]
fn test_shipped_initial_config_matches_defaults() {
    let text = std::fs::read_to_string("assets/initial_config.ron").unwrap();
    let config = InitialConfig::from_ron(&text).unwrap();
    assert_eq!(config, InitialConfig::default());
}

#[test]
fn test_shipped_campaign_matches_builtin_table() {
    let text = std::fs::read_to_string("assets/campaign.regions.ron").unwrap();
    let table: RegionTable = ron::from_str(&text).unwrap();
    assert_eq!(table, RegionTable::default());
}

#[test]
fn test_initial_config_resource_drives_sim_config() {
    let mut app = App::new();
    app.insert_resource(InitialConfig { tick_rate: 60.0, max_deployed: 12, ..Default::default() });
    app.add_plugins(SimulationPlugin);
    app.update();

    let config = app.world().resource::<SimConfig>();
    assert_eq!(config.tick_rate, 60.0);
    assert_eq!(config.max_deployed, 12);
    let fixed = app.world().resource::<Time<Fixed>>();
    assert!((fixed.timestep().as_secs_f64() - 1.0 / 60.0).abs() < 1e-9);
}
