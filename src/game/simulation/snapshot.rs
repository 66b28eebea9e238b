//! Read-only view of the simulation for a UI to poll every frame.

use bevy::prelude::*;
use serde::Serialize;

use crate::game::battle::{Battle, CameraMode};
use crate::game::economy::{Colony, ColonyResources};
use crate::game::pool::EntityPool;
use crate::game::unit::{Faction, UnitKind};

use super::resources::SimPaused;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StockpileCount {
    pub kind: UnitKind,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimSnapshot {
    pub resources: ColonyResources,
    pub swarm_alive: usize,
    pub hostile_alive: usize,
    pub stockpile: Vec<StockpileCount>,
    pub stockpile_total: u32,
    pub population_cap: u32,
    pub paused: bool,
    /// Camera advance in meters.
    pub distance: f32,
    pub camera_mode: CameraMode,
    pub checkpoint_index: usize,
    pub region: Option<u32>,
    pub region_progress: f32,
}

impl SimSnapshot {
    pub fn capture(colony: &Colony, pool: &EntityPool, battle: &Battle, paused: bool) -> Self {
        let region = battle.region_id();
        SimSnapshot {
            resources: colony.resources,
            swarm_alive: pool.count_alive(Faction::Swarm),
            hostile_alive: pool.count_alive(Faction::Human),
            stockpile: colony
                .hatchery
                .entries
                .iter()
                .map(|e| StockpileCount { kind: e.kind, count: e.stockpile })
                .collect(),
            stockpile_total: colony.hatchery.total_stockpile(),
            population_cap: colony.facilities.population_cap(),
            paused,
            distance: battle.camera.x / 10.0,
            camera_mode: battle.camera.mode,
            checkpoint_index: battle.camera.checkpoint_index,
            region,
            region_progress: region.map_or(0.0, |id| colony.world.progress(id)),
        }
    }

    /// Capture from an app's world. `None` until the simulation resources exist.
    pub fn from_world(world: &World) -> Option<Self> {
        let colony = world.get_resource::<Colony>()?;
        let pool = world.get_resource::<EntityPool>()?;
        let battle = world.get_resource::<Battle>()?;
        let paused = world.get_resource::<SimPaused>().is_some_and(|p| p.0);
        Some(SimSnapshot::capture(colony, pool, battle, paused))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_counts_and_serializes() {
        let colony = Colony::default();
        let pool = EntityPool::new(4);
        let mut battle = Battle::default();
        battle.camera.x = 420.0;

        let snapshot = SimSnapshot::capture(&colony, &pool, &battle, true);
        assert_eq!(snapshot.stockpile_total, 5);
        assert_eq!(snapshot.stockpile.len(), 3);
        assert_eq!(snapshot.distance, 42.0);
        assert_eq!(snapshot.region, None);
        assert!(snapshot.paused);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["stockpile"][0]["kind"], "Melee");
        assert_eq!(json["camera_mode"], "Following");
    }
}
