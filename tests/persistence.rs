use bevy::prelude::*;
use std::path::PathBuf;
use swarmfront::game::economy::{Colony, FacilityKind};
use swarmfront::game::save::{self, PersistencePlugin, SaveRecord};
use swarmfront::game::simulation::{SimConfig, SimulationPlugin};
use swarmfront::game::unit::UnitKind;

fn temp_save(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("swarmfront_it_{}", std::process::id()))
        .join(format!("{name}.sav.z"))
}

fn app_with_save(path: &PathBuf) -> App {
    let mut app = App::new();
    app.add_plugins(SimulationPlugin);
    app.add_plugins(PersistencePlugin { path: path.clone() });
    app.update();
    app
}

#[test]
fn test_startup_loads_existing_save() {
    let path = temp_save("load");
    let mut colony = Colony::default();
    colony.resources.biomass = 77.0;
    colony.facilities.tier_mut(FacilityKind::Storage).count = 3;
    save::save_colony(&path, &colony, save::now_ms()).unwrap();

    let app = app_with_save(&path);
    let loaded = app.world().resource::<Colony>();
    assert_eq!(loaded.resources.biomass, 77.0);
    assert_eq!(loaded.facilities.storage.count, 3);
    assert_eq!(loaded.hatchery.stockpile(UnitKind::Melee), 5);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_missing_save_starts_fresh() {
    let path = temp_save("missing");
    let _ = std::fs::remove_file(&path);
    let app = app_with_save(&path);
    assert_eq!(*app.world().resource::<Colony>(), Colony::default());
}

#[test]
fn test_corrupt_file_starts_fresh() {
    let path = temp_save("corrupt");
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).unwrap();
    }
    std::fs::write(&path, b"\x00\x01garbage").unwrap();

    let app = app_with_save(&path);
    assert_eq!(*app.world().resource::<Colony>(), Colony::default());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_offline_time_is_credited_on_load() {
    let path = temp_save("offline");
    let colony = Colony::default();
    // Saved ten minutes ago.
    save::save_colony(&path, &colony, save::now_ms() - 600_000).unwrap();

    let app = app_with_save(&path);
    let loaded = app.world().resource::<Colony>();
    // One mine at 5/s, half rate, 600 s.
    assert!((loaded.resources.minerals - 1500.0).abs() < 5.0, "minerals = {}", loaded.resources.minerals);
    assert_eq!(loaded.resources.larva, loaded.caps().larva);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_autosave_writes_on_interval() {
    let path = temp_save("autosave");
    let _ = std::fs::remove_file(&path);
    let mut app = app_with_save(&path);
    app.world_mut().resource_mut::<SimConfig>().autosave_interval = 0.5;

    for _ in 0..10 {
        app.world_mut().run_schedule(FixedUpdate);
    }
    assert!(!path.exists(), "saved before the interval elapsed");

    for _ in 0..10 {
        app.world_mut().run_schedule(FixedUpdate);
    }
    let record: SaveRecord = save::load_record(&path).unwrap();
    assert!(record.profile.last_save_ms > 0);
    assert_eq!(app.world().resource::<Colony>().profile.last_save_ms, record.profile.last_save_ms);
    let _ = std::fs::remove_file(&path);
}
