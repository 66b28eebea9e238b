//! Siege camera: follows the swarm's front line and locks in front of each
//! defended checkpoint until its garrison is dead.

use serde::{Deserialize, Serialize};

use crate::game::pool::{EntityPool, UnitState};
use crate::game::simulation::SimConfig;
use crate::game::unit::Faction;
use crate::game::world::Checkpoint;

/// Assumed lead when no swarm unit is on the field.
pub const EMPTY_FRONT_LEAD: f32 = 200.0;
/// Units averaged to find the leading edge.
pub const FRONT_SAMPLE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CameraMode {
    #[default]
    Following,
    Locked,
}

/// Mode change reported by [`SiegeCamera::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraTransition {
    Locked(usize),
    Cleared(usize),
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SiegeCamera {
    /// Left edge of the view in lane coordinates.
    pub x: f32,
    pub mode: CameraMode,
    /// Next unresolved checkpoint.
    pub checkpoint_index: usize,
}

/// Mean x of the front-most living swarm units.
pub fn leading_edge(pool: &EntityPool) -> Option<f32> {
    let mut front = [f32::NEG_INFINITY; FRONT_SAMPLE];
    let mut seen = 0usize;
    for (_, c) in pool.iter_active() {
        if c.faction != Faction::Swarm || !c.is_alive() || c.state == UnitState::Wander {
            continue;
        }
        seen += 1;
        let mut x = c.position.x;
        for slot in front.iter_mut() {
            if x > *slot {
                std::mem::swap(slot, &mut x);
            }
        }
    }
    let n = seen.min(FRONT_SAMPLE);
    (n > 0).then(|| front[..n].iter().sum::<f32>() / n as f32)
}

/// Any living defender within `radius` of the checkpoint line.
pub fn checkpoint_defended(pool: &EntityPool, checkpoint_x: f32, radius: f32) -> bool {
    pool.iter_active().any(|(_, c)| {
        c.faction == Faction::Human && c.is_alive() && (c.position.x - checkpoint_x).abs() <= radius
    })
}

impl SiegeCamera {
    /// Advance one tick. `garrisoned` reports whether a checkpoint's
    /// defenders have already been placed; an empty garrisoned checkpoint
    /// the front has reached is passed without locking.
    pub fn step(
        &mut self,
        pool: &EntityPool,
        checkpoints: &[Checkpoint],
        garrisoned: impl Fn(usize) -> bool,
        config: &SimConfig,
    ) -> Option<CameraTransition> {
        let edge = leading_edge(pool).unwrap_or(self.x + EMPTY_FRONT_LEAD);
        let lead = config.camera_lead * config.view_width;
        let checkpoint = checkpoints.get(self.checkpoint_index);

        match (self.mode, checkpoint) {
            (CameraMode::Locked, Some(cp)) => {
                if checkpoint_defended(pool, cp.x, config.lock_radius) {
                    let hold = (cp.x - lead).max(0.0);
                    self.x += (hold - self.x) * config.camera_follow_lerp;
                    return None;
                }
                Some(self.clear())
            }
            (CameraMode::Locked, None) => {
                self.mode = CameraMode::Following;
                None
            }
            (CameraMode::Following, Some(cp)) if edge >= cp.x - config.lock_trigger_distance => {
                if checkpoint_defended(pool, cp.x, config.lock_radius) {
                    self.mode = CameraMode::Locked;
                    return Some(CameraTransition::Locked(self.checkpoint_index));
                }
                if garrisoned(self.checkpoint_index) {
                    return Some(self.clear());
                }
                self.follow(edge, lead, config);
                None
            }
            (CameraMode::Following, _) => {
                self.follow(edge, lead, config);
                None
            }
        }
    }

    fn follow(&mut self, edge: f32, lead: f32, config: &SimConfig) {
        let goal = (edge - lead).max(0.0);
        let diff = goal - self.x;
        let lerp = if diff > 0.0 { config.camera_follow_lerp } else { config.camera_return_lerp };
        self.x += diff * lerp;
    }

    fn clear(&mut self) -> CameraTransition {
        let cleared = self.checkpoint_index;
        self.mode = CameraMode::Following;
        self.checkpoint_index += 1;
        CameraTransition::Cleared(cleared)
    }
}
