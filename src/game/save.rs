//! Colony persistence: a zlib-compressed JSON record.
//!
//! Each top-level section loads independently. A section that is missing
//! takes its default; one that fails to parse is logged and replaced by its
//! default while the rest of the record still loads.

use bevy::prelude::*;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::game::economy::{
    Colony, ColonyResources, Hatchery, ModifierInventory, PlayerProfile, ProductionGraph,
};
use crate::game::simulation::{SimConfig, SimSet};
use crate::game::world::WorldProgress;

pub const SAVE_VERSION: u32 = 1;
pub const DEFAULT_SAVE_PATH: &str = "saves/colony.sav.z";

// ============================================================================
// Record
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SaveRecord {
    pub version: u32,
    #[serde(deserialize_with = "lenient")]
    pub resources: ColonyResources,
    #[serde(deserialize_with = "lenient")]
    pub facilities: ProductionGraph,
    #[serde(deserialize_with = "lenient")]
    pub units: Hatchery,
    #[serde(deserialize_with = "lenient")]
    pub inventory: ModifierInventory,
    #[serde(deserialize_with = "lenient")]
    pub world: WorldProgress,
    #[serde(deserialize_with = "lenient")]
    pub profile: PlayerProfile,
}

impl Default for SaveRecord {
    fn default() -> Self {
        SaveRecord::from_colony(&Colony::default())
    }
}

/// Parse a section, or log and fall back to its default.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_else(|e| {
        warn!(
            "[SAVE] discarding corrupt {} section: {}",
            std::any::type_name::<T>().rsplit("::").next().unwrap_or("unknown"),
            e
        );
        T::default()
    }))
}

impl SaveRecord {
    pub fn from_colony(colony: &Colony) -> Self {
        SaveRecord {
            version: SAVE_VERSION,
            resources: colony.resources,
            facilities: colony.facilities.clone(),
            units: colony.hatchery.clone(),
            inventory: colony.inventory.clone(),
            world: colony.world.clone(),
            profile: colony.profile,
        }
    }

    /// Rebuild a colony, repairing anything an older record left out of range.
    pub fn into_colony(self) -> Colony {
        let mut colony = Colony {
            resources: self.resources,
            facilities: self.facilities,
            hatchery: self.units,
            inventory: self.inventory,
            world: self.world,
            profile: self.profile,
        };
        colony.normalize();
        colony
    }
}

// ============================================================================
// Encoding
// ============================================================================

pub fn encode(record: &SaveRecord) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    serde_json::to_writer(&mut encoder, record)?;
    Ok(encoder.finish()?)
}

pub fn decode(bytes: &[u8]) -> Result<SaveRecord, Box<dyn std::error::Error>> {
    let decoder = ZlibDecoder::new(bytes);
    Ok(serde_json::from_reader(decoder)?)
}

/// Write `colony` to `path`, stamped with `now_ms`.
pub fn save_colony(path: &Path, colony: &Colony, now_ms: i64) -> Result<(), Box<dyn std::error::Error>> {
    let mut record = SaveRecord::from_colony(colony);
    record.profile.last_save_ms = now_ms;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&encode(&record)?)?;
    writer.flush()?;
    Ok(())
}

pub fn load_record(path: &Path) -> Result<SaveRecord, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let decoder = ZlibDecoder::new(BufReader::new(file));
    Ok(serde_json::from_reader(decoder)?)
}

/// Restore a colony and credit the time since it was saved.
pub fn restore(record: SaveRecord, now_ms: i64) -> Colony {
    let last_save_ms = record.profile.last_save_ms;
    let mut colony = record.into_colony();
    if last_save_ms > 0 && now_ms > last_save_ms {
        colony.apply_offline((now_ms - last_save_ms) as f64 / 1000.0);
    }
    colony
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ============================================================================
// Plugin
// ============================================================================

#[derive(Resource, Debug, Clone)]
pub struct SaveSettings {
    pub path: PathBuf,
    /// Seconds of simulated time since the last autosave.
    pub since_save: f32,
}

/// Loads the colony at startup and autosaves it on a fixed interval.
pub struct PersistencePlugin {
    pub path: PathBuf,
}

impl Default for PersistencePlugin {
    fn default() -> Self {
        PersistencePlugin { path: PathBuf::from(DEFAULT_SAVE_PATH) }
    }
}

impl Plugin for PersistencePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(SaveSettings { path: self.path.clone(), since_save: 0.0 })
            .add_systems(Startup, load_colony_system)
            .add_systems(FixedUpdate, autosave.after(SimSet::Cleanup));
    }
}

fn load_colony_system(settings: Res<SaveSettings>, mut colony: ResMut<Colony>) {
    if !settings.path.exists() {
        info!("[SAVE] no save at {}, starting a fresh colony", settings.path.display());
        return;
    }
    match load_record(&settings.path) {
        Ok(record) => {
            if record.version > SAVE_VERSION {
                warn!("[SAVE] record version {} is newer than {}", record.version, SAVE_VERSION);
            }
            *colony = restore(record, now_ms());
            info!("[SAVE] loaded colony from {}", settings.path.display());
        }
        Err(e) => {
            error!("[SAVE] failed to load {}: {}", settings.path.display(), e);
            error!("[SAVE] starting a fresh colony");
        }
    }
}

fn autosave(config: Res<SimConfig>, mut settings: ResMut<SaveSettings>, mut colony: ResMut<Colony>) {
    settings.since_save += config.dt();
    if settings.since_save < config.autosave_interval {
        return;
    }
    settings.since_save = 0.0;

    let now = now_ms();
    match save_colony(&settings.path, &colony, now) {
        Ok(()) => {
            colony.profile.last_save_ms = now;
            debug!("[SAVE] autosaved to {}", settings.path.display());
        }
        Err(e) => error!("[SAVE] autosave to {} failed: {}", settings.path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::economy::{FacilityKind, ModifierKind};
    use crate::game::unit::UnitKind;
    use std::io::Read;

    fn json_of(bytes: &[u8]) -> serde_json::Value {
        let mut text = String::new();
        let _ = ZlibDecoder::new(bytes).read_to_string(&mut text);
        serde_json::from_str(&text).unwrap()
    }

    fn encode_json(value: &serde_json::Value) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        serde_json::to_writer(&mut encoder, value).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_colony_survives_encode_decode() {
        let mut colony = Colony::default();
        colony.resources.biomass = 321.5;
        colony.facilities.tier_mut(FacilityKind::Reactor).count = 2;
        colony.add_modifier(ModifierKind::CryoVessels);
        colony.world.unlock(2);

        let bytes = encode(&SaveRecord::from_colony(&colony)).unwrap();
        let restored = decode(&bytes).unwrap().into_colony();
        assert_eq!(restored, colony);
    }

    #[test]
    fn test_missing_sections_and_fields_take_defaults() {
        let value = serde_json::json!({
            "resources": { "biomass": 40.0 },
        });
        let colony = decode(&encode_json(&value)).unwrap().into_colony();
        assert_eq!(colony.resources.biomass, 40.0);
        assert_eq!(colony.resources.larva, 3.0);
        assert_eq!(colony.hatchery, Hatchery::default());
        assert!(colony.world.is_unlocked(1));
    }

    #[test]
    fn test_corrupt_section_does_not_abort_load() {
        let mut colony = Colony::default();
        colony.resources.minerals = 99.0;
        let mut value = json_of(&encode(&SaveRecord::from_colony(&colony)).unwrap());
        value["units"] = serde_json::json!("definitely not a roster");

        let restored = decode(&encode_json(&value)).unwrap().into_colony();
        assert_eq!(restored.resources.minerals, 99.0);
        assert_eq!(restored.hatchery.stockpile(UnitKind::Melee), 5);
    }

    #[test]
    fn test_garbage_bytes_are_an_error() {
        assert!(decode(b"not zlib").is_err());
    }

    #[test]
    fn test_offline_credit_on_restore() {
        let mut record = SaveRecord::default();
        record.profile.last_save_ms = 1_000;
        let colony = restore(record.clone(), 1_000 + 120_000);
        assert_eq!(colony.resources.minerals, 300.0);

        let colony = restore(record, 1_000 + 30_000);
        assert_eq!(colony.resources.minerals, 0.0);
    }

    #[test]
    fn test_save_to_disk_and_back() {
        let path = std::env::temp_dir().join(format!("swarmfront_save_{}.sav.z", std::process::id()));
        let mut colony = Colony::default();
        colony.resources.energy = 12.0;
        save_colony(&path, &colony, 5_000).unwrap();

        let record = load_record(&path).unwrap();
        assert_eq!(record.profile.last_save_ms, 5_000);
        assert_eq!(record.resources.energy, 12.0);
        let _ = std::fs::remove_file(&path);
    }
}
