//! Campaign regions: the static table the battle reads and the per-region
//! unlock/progress state the colony persists.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use crate::game::unit::UnitKind;

pub const MAX_REGION_PROGRESS: f32 = 100.0;
/// Progress granted for clearing a checkpoint.
pub const CHECKPOINT_PROGRESS: f32 = 10.0;
/// Progress per 10 px of camera advance.
pub const ADVANCE_PROGRESS_PER_METER: f32 = 0.05;
/// Camera advance between progress updates, in px.
pub const ADVANCE_STEP: f32 = 100.0;

// ============================================================================
// Static Region Table
// ============================================================================

/// Circular terrain blocker in lane coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl Obstacle {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// A defended position that halts the camera until cleared.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub x: f32,
    /// Defenders at difficulty 1.
    pub garrison: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnWeight {
    pub kind: UnitKind,
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDef {
    pub id: u32,
    pub name: String,
    pub difficulty: f32,
    pub spawn_table: SmallVec<[SpawnWeight; 5]>,
    #[serde(default)]
    pub checkpoints: Vec<Checkpoint>,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
}

impl RegionDef {
    /// Weighted pick from the spawn table. `roll` is uniform in `[0, 1)`.
    /// `None` when the table is empty or all weights are zero.
    pub fn pick_hostile(&self, roll: f32) -> Option<UnitKind> {
        let total: f32 = self.spawn_table.iter().map(|s| s.weight.max(0.0)).sum();
        if total <= 0.0 {
            return None;
        }
        let mut remaining = roll * total;
        for entry in &self.spawn_table {
            let weight = entry.weight.max(0.0);
            if remaining < weight {
                return Some(entry.kind);
            }
            remaining -= weight;
        }
        self.spawn_table.iter().rev().find(|s| s.weight > 0.0).map(|s| s.kind)
    }
}

/// Ordered campaign. Loaded from `campaign.regions.ron` when the asset
/// plugin is present; otherwise the built-in campaign below.
#[derive(Resource, Asset, TypePath, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionTable {
    pub regions: Vec<RegionDef>,
}

impl RegionTable {
    pub fn get(&self, id: u32) -> Option<&RegionDef> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// The region after `id` in campaign order.
    pub fn next_after(&self, id: u32) -> Option<&RegionDef> {
        let index = self.regions.iter().position(|r| r.id == id)?;
        self.regions.get(index + 1)
    }
}

impl Default for RegionTable {
    fn default() -> Self {
        use UnitKind::*;
        let w = |kind, weight| SpawnWeight { kind, weight };
        let region = |id: u32, name: &str, difficulty: f32, spawn_table: SmallVec<[SpawnWeight; 5]>| {
            // Strongholds every 1500 px, each a little larger than the last.
            let checkpoints = (0..3)
                .map(|i| Checkpoint { x: 1500.0 + i as f32 * 1500.0, garrison: 2 + id / 2 + i })
                .collect();
            let obstacles = vec![
                Obstacle { x: 900.0 + id as f32 * 40.0, y: 260.0, radius: 40.0 },
                Obstacle { x: 2300.0, y: 360.0, radius: 55.0 },
                Obstacle { x: 3700.0 - id as f32 * 30.0, y: 300.0, radius: 45.0 },
            ];
            RegionDef { id, name: name.to_string(), difficulty, spawn_table, checkpoints, obstacles }
        };

        RegionTable {
            regions: vec![
                region(1, "Sector 7 Slums", 1.0, smallvec![w(Marine, 1.0)]),
                region(2, "Industrial Wastes", 1.2, smallvec![w(Marine, 0.7), w(Pyro, 0.3)]),
                region(3, "Metro Junction", 1.3, smallvec![w(Marine, 0.5), w(Riot, 0.5)]),
                region(4, "Central Park", 1.5, smallvec![w(Marine, 0.4), w(Riot, 0.3), w(Sniper, 0.3)]),
                region(5, "Highway 99", 1.8, smallvec![w(Riot, 0.4), w(Pyro, 0.4), w(Marine, 0.2)]),
                region(6, "Bio Laboratory", 2.0, smallvec![w(Marine, 0.5), w(Sniper, 0.4), w(Tank, 0.1)]),
                region(7, "Military Outpost", 2.5, smallvec![w(Riot, 0.3), w(Tank, 0.2), w(Marine, 0.5)]),
                region(8, "Inner City", 3.0, smallvec![w(Pyro, 0.4), w(Tank, 0.3), w(Sniper, 0.3)]),
                region(9, "Joint Command", 4.0, smallvec![w(Tank, 0.6), w(Riot, 0.4)]),
                region(
                    10,
                    "The Last Ark",
                    5.0,
                    smallvec![w(Marine, 0.1), w(Riot, 0.1), w(Pyro, 0.1), w(Sniper, 0.1), w(Tank, 0.6)],
                ),
            ],
        }
    }
}

// ============================================================================
// World Progress (persisted)
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionProgress {
    pub id: u32,
    pub unlocked: bool,
    /// Percent in `[0, 100]`.
    pub progress: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldProgress {
    pub regions: Vec<RegionProgress>,
}

impl Default for WorldProgress {
    fn default() -> Self {
        WorldProgress {
            regions: vec![RegionProgress { id: 1, unlocked: true, progress: 0.0 }],
        }
    }
}

impl WorldProgress {
    pub fn get(&self, id: u32) -> Option<&RegionProgress> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn is_unlocked(&self, id: u32) -> bool {
        self.get(id).is_some_and(|r| r.unlocked)
    }

    pub fn progress(&self, id: u32) -> f32 {
        self.get(id).map_or(0.0, |r| r.progress)
    }

    /// Unlock `id`. Returns `true` if it was locked before.
    pub fn unlock(&mut self, id: u32) -> bool {
        match self.regions.iter_mut().find(|r| r.id == id) {
            Some(r) if r.unlocked => false,
            Some(r) => {
                r.unlocked = true;
                true
            }
            None => {
                self.regions.push(RegionProgress { id, unlocked: true, progress: 0.0 });
                true
            }
        }
    }

    /// Add progress to an unlocked region, capped at 100. When the region is
    /// complete the next one in `table` is unlocked; its id is returned the
    /// first time that happens.
    pub fn advance(&mut self, id: u32, amount: f32, table: &RegionTable) -> Option<u32> {
        let region = self.regions.iter_mut().find(|r| r.id == id && r.unlocked)?;
        region.progress = (region.progress + amount.max(0.0)).min(MAX_REGION_PROGRESS);
        if region.progress < MAX_REGION_PROGRESS {
            return None;
        }
        let next = table.next_after(id)?.id;
        self.unlock(next).then_some(next)
    }

    /// Repair a loaded record: clamp progress and keep region 1 unlocked.
    pub fn normalize(&mut self) {
        for region in self.regions.iter_mut() {
            region.progress = if region.progress.is_nan() {
                0.0
            } else {
                region.progress.clamp(0.0, MAX_REGION_PROGRESS)
            };
        }
        self.unlock(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_campaign_has_ten_ordered_regions() {
        let table = RegionTable::default();
        assert_eq!(table.regions.len(), 10);
        for (i, region) in table.regions.iter().enumerate() {
            assert_eq!(region.id, i as u32 + 1);
            assert!(!region.spawn_table.is_empty());
        }
        assert_eq!(table.get(6).map(|r| r.difficulty), Some(2.0));
        assert!(table.next_after(10).is_none());
    }

    #[test]
    fn test_pick_hostile_follows_weights() {
        let table = RegionTable::default();
        let Some(region) = table.get(2) else { panic!("region 2 missing") };
        assert_eq!(region.pick_hostile(0.0), Some(UnitKind::Marine));
        assert_eq!(region.pick_hostile(0.69), Some(UnitKind::Marine));
        assert_eq!(region.pick_hostile(0.71), Some(UnitKind::Pyro));
        assert_eq!(region.pick_hostile(0.999), Some(UnitKind::Pyro));
    }

    #[test]
    fn test_empty_spawn_table_yields_nothing() {
        let region = RegionDef {
            id: 99,
            name: "Void".into(),
            difficulty: 1.0,
            spawn_table: SmallVec::new(),
            checkpoints: Vec::new(),
            obstacles: Vec::new(),
        };
        assert_eq!(region.pick_hostile(0.5), None);
    }

    #[test]
    fn test_full_progress_unlocks_next_once() {
        let table = RegionTable::default();
        let mut world = WorldProgress::default();
        assert!(!world.is_unlocked(2));

        assert_eq!(world.advance(1, 60.0, &table), None);
        assert_eq!(world.advance(1, 60.0, &table), Some(2));
        assert_eq!(world.progress(1), 100.0);
        assert!(world.is_unlocked(2));
        assert_eq!(world.advance(1, 5.0, &table), None);
    }

    #[test]
    fn test_locked_region_gains_nothing() {
        let table = RegionTable::default();
        let mut world = WorldProgress::default();
        assert_eq!(world.advance(3, 50.0, &table), None);
        assert_eq!(world.progress(3), 0.0);
    }

    #[test]
    fn test_region_table_parses_from_ron() {
        let text = r#"(
            regions: [
                (id: 1, name: "Test", difficulty: 1.5,
                 spawn_table: [(kind: Marine, weight: 1.0)],
                 checkpoints: [(x: 800.0, garrison: 2)]),
            ],
        )"#;
        let table: RegionTable = match ron::from_str(text) {
            Ok(t) => t,
            Err(e) => panic!("parse failed: {e}"),
        };
        assert_eq!(table.regions[0].checkpoints.len(), 1);
        assert!(table.regions[0].obstacles.is_empty());
    }
}
