use bevy::asset::AssetPlugin;
use bevy::ecs::message::Messages;
use bevy::prelude::*;

use swarmfront::game::config::RegionTableHandle;
use swarmfront::game::economy::Colony;
use swarmfront::game::save::{self, PersistencePlugin, SaveSettings};
use swarmfront::game::simulation::{PlayerCommand, SimEvent, SimSnapshot};
use swarmfront::game::GamePlugin;

use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_TICKS: u64 = 2000;
const SNAPSHOT_EVERY: u64 = 200;
const ASSET_PUMP_LIMIT: usize = 100;

fn setup_file_logging() -> Option<String> {
    let log_dir = PathBuf::from("logs");
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("Failed to create logs directory: {}", e);
        return None;
    }

    // Clean up old log files, keeping only the last 25
    cleanup_old_logs(&log_dir, 25);

    let now = chrono::Local::now();
    let log_filename = format!("swarmfront_{}.log", now.format("%Y%m%d_%H%M%S"));
    let log_path_str = log_dir.join(&log_filename).to_string_lossy().to_string();

    let file_appender = RollingFileAppender::new(Rotation::NEVER, &log_dir, &log_filename);
    let file_layer = fmt::layer().with_writer(file_appender).with_ansi(false);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("swarmfront=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Some(log_path_str)
}

fn cleanup_old_logs(log_dir: &Path, keep_count: usize) {
    let Ok(entries) = fs::read_dir(log_dir) else { return };
    let mut log_files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|s| s.starts_with("swarmfront") && s.ends_with(".log"))
        })
        .collect();

    // Oldest first
    log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

    if log_files.len() > keep_count {
        for file in log_files.iter().take(log_files.len() - keep_count) {
            let _ = fs::remove_file(file.path());
        }
    }
}

/// Let the asset server finish the region table before the run starts.
fn pump_assets(app: &mut App) {
    for _ in 0..ASSET_PUMP_LIMIT {
        app.update();
        let world = app.world();
        let (Some(handle), Some(server)) =
            (world.get_resource::<RegionTableHandle>(), world.get_resource::<AssetServer>())
        else {
            return;
        };
        if server.is_loaded_with_dependencies(&handle.0) || server.load_state(&handle.0).is_failed() {
            return;
        }
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    warn!("[CONFIG] region table still loading, running on the built-in campaign");
}

/// Tick count from the first argument. A value that does not parse falls
/// back to the default with a warning.
fn parse_ticks(arg: Option<String>) -> u64 {
    let Some(arg) = arg else { return DEFAULT_TICKS };
    arg.parse::<u64>().unwrap_or_else(|e| {
        warn!("[SIM] ignoring tick count {:?} ({}), running {} ticks", arg, e, DEFAULT_TICKS);
        DEFAULT_TICKS
    })
}

fn main() {
    let log_file = setup_file_logging();

    let mut args = std::env::args().skip(1);
    let ticks = parse_ticks(args.next());
    let save_path = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from(save::DEFAULT_SAVE_PATH));

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║  Swarmfront - headless run                              ║");
    println!("╠══════════════════════════════════════════════════════════╣");
    println!("║  Log file: {:<45} ║", log_file.as_deref().unwrap_or("-"));
    println!("║  Ticks:    {:<45} ║", ticks);
    println!("╚══════════════════════════════════════════════════════════╝");

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, AssetPlugin::default()))
        .add_plugins(GamePlugin)
        .add_plugins(PersistencePlugin { path: save_path });
    app.finish();
    app.cleanup();
    pump_assets(&mut app);

    app.world_mut().write_message(PlayerCommand::EnterRegion(1));

    let mut kills = 0usize;
    for tick in 1..=ticks {
        app.world_mut().run_schedule(FixedUpdate);
        kills += app
            .world_mut()
            .resource_mut::<Messages<SimEvent>>()
            .drain()
            .filter(|e| matches!(e, SimEvent::UnitKilled { .. }))
            .count();

        if tick % SNAPSHOT_EVERY == 0 {
            if let Some(snapshot) = SimSnapshot::from_world(app.world()) {
                info!(
                    "[SIM] tick {} | {:.0} m | swarm {} vs {} | stock {} | biomass {:.0} minerals {:.0} | kills {}",
                    tick,
                    snapshot.distance,
                    snapshot.swarm_alive,
                    snapshot.hostile_alive,
                    snapshot.stockpile_total,
                    snapshot.resources.biomass,
                    snapshot.resources.minerals,
                    kills
                );
            }
        }
    }

    let world = app.world();
    let (Some(colony), Some(settings)) = (world.get_resource::<Colony>(), world.get_resource::<SaveSettings>())
    else {
        return;
    };
    match save::save_colony(&settings.path, colony, save::now_ms()) {
        Ok(()) => info!("[SAVE] saved colony to {}", settings.path.display()),
        Err(e) => error!("[SAVE] failed to save {}: {}", settings.path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_argument_parses_or_falls_back() {
        assert_eq!(parse_ticks(None), DEFAULT_TICKS);
        assert_eq!(parse_ticks(Some("450".to_string())), 450);
        assert_eq!(parse_ticks(Some("lots".to_string())), DEFAULT_TICKS);
        assert_eq!(parse_ticks(Some("-3".to_string())), DEFAULT_TICKS);
    }
}
