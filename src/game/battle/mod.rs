//! Battle state: which lane the swarm is fighting in, the siege camera, spawn
//! timers and the run's roguelike modifiers.

use bevy::prelude::*;
use fixedbitset::FixedBitSet;
use serde::{Deserialize, Serialize};

use crate::game::pool::EntityPool;
use crate::game::simulation::SimConfig;
use crate::game::world::{
    Checkpoint, Obstacle, RegionDef, RegionTable, WorldProgress, ADVANCE_PROGRESS_PER_METER, ADVANCE_STEP,
    CHECKPOINT_PROGRESS,
};

pub mod camera;
pub mod cards;
pub mod deployment;

pub use camera::{CameraMode, CameraTransition, SiegeCamera};
pub use cards::{RunCard, RunModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BattleMode {
    /// Home base: wanderers mirror the stockpile, nothing fights.
    #[default]
    Stockpile,
    /// Pushing into the region with this id.
    Engaged(u32),
}

#[derive(Resource, Debug, Clone, Default)]
pub struct Battle {
    pub mode: BattleMode,
    pub camera: SiegeCamera,
    pub run: RunModifiers,
    /// Obstacles of the engaged region.
    pub obstacles: Vec<Obstacle>,
    pub deploy_timer: f32,
    pub wave_timer: f32,
    garrisoned: FixedBitSet,
    /// Camera x at the last progress award.
    progress_anchor: f32,
}

impl Battle {
    /// Start a fresh push into `region`. The pool is emptied.
    pub fn enter(&mut self, region: &RegionDef, pool: &mut EntityPool) {
        pool.clear();
        *self = Battle {
            mode: BattleMode::Engaged(region.id),
            obstacles: region.obstacles.clone(),
            garrisoned: FixedBitSet::with_capacity(region.checkpoints.len()),
            ..Default::default()
        };
        info!("[DEPLOY] entering region {} ({})", region.id, region.name);
    }

    /// Back to the home base. Run modifiers are discarded.
    pub fn exit(&mut self, pool: &mut EntityPool) {
        pool.clear();
        *self = Battle::default();
    }

    pub fn region_id(&self) -> Option<u32> {
        match self.mode {
            BattleMode::Engaged(id) => Some(id),
            BattleMode::Stockpile => None,
        }
    }

    pub fn is_engaged(&self) -> bool {
        self.region_id().is_some()
    }

    /// Hostile pressure at the current camera position.
    pub fn difficulty(&self, region: &RegionDef, config: &SimConfig) -> f32 {
        1.0 + self.camera.x / config.difficulty_distance * region.difficulty
    }

    pub fn is_garrisoned(&self, checkpoint: usize) -> bool {
        self.garrisoned.contains(checkpoint)
    }

    /// Step the siege camera against the engaged region's checkpoints.
    pub fn step_camera(
        &mut self,
        pool: &EntityPool,
        checkpoints: &[Checkpoint],
        config: &SimConfig,
    ) -> Option<CameraTransition> {
        let garrisoned = &self.garrisoned;
        self.camera.step(pool, checkpoints, |index| garrisoned.contains(index), config)
    }

    pub fn mark_garrisoned(&mut self, checkpoint: usize) {
        self.garrisoned.grow(checkpoint + 1);
        self.garrisoned.insert(checkpoint);
    }

    /// Award region progress for camera advance and cleared checkpoints.
    /// Returns a region id unlocked as a result.
    pub fn record_progress(
        &mut self,
        cleared: bool,
        world: &mut WorldProgress,
        table: &RegionTable,
    ) -> Option<u32> {
        let id = self.region_id()?;
        let mut gained = 0.0;
        let advance = self.camera.x - self.progress_anchor;
        if advance > ADVANCE_STEP {
            gained += advance / 10.0 * ADVANCE_PROGRESS_PER_METER;
            self.progress_anchor = self.camera.x;
        }
        if cleared {
            gained += CHECKPOINT_PROGRESS;
        }
        if gained <= 0.0 {
            return None;
        }
        world.advance(id, gained, table)
    }
}

/// Recycle faded corpses and, while engaged, anything left behind the
/// camera. Returns the number of slots freed.
pub fn cleanup(pool: &mut EntityPool, camera_x: f32, engaged: bool, margin: f32, dt: f32) -> usize {
    let limit = camera_x - margin;
    let mut stale: Vec<usize> = Vec::new();
    for index in pool.active_indices().collect::<Vec<_>>() {
        let Some(c) = pool.slot_mut(index) else { continue };
        if !c.is_alive() {
            c.decay_timer -= dt;
            if c.decay_timer <= 0.0 {
                stale.push(index);
            }
        } else if engaged && c.position.x < limit {
            stale.push(index);
        }
    }
    let freed = stale.len();
    for index in stale {
        pool.recycle_index(index);
    }
    freed
}
