//! Resource definitions for the simulation.
//!
//! Runtime configuration, the tick counter, the seeded RNG and the pause flag.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::game::pool::DEFAULT_POOL_CAPACITY;

// ============================================================================
// Simulation Configuration
// ============================================================================

/// Runtime simulation configuration.
///
/// Copied from [`InitialConfig`](crate::game::config::InitialConfig) once at
/// startup. Systems read from here, never from the config file.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub tick_rate: f64,
    pub pool_capacity: usize,
    pub rng_seed: u64,

    // Lane geometry
    pub view_width: f32,
    pub lane_y: f32,
    pub lane_height: f32,

    // Movement & targeting
    pub aggro_radius: f32,
    /// How far behind itself an advancing unit still looks for targets.
    pub behind_slack: f32,
    /// Extra gap added to the sum of radii for melee contact.
    pub contact_buffer: f32,
    pub neighbor_radius: f32,
    pub separation_strength: f32,
    /// Sideways speed applied while sliding around an obstacle.
    pub obstacle_flow: f32,

    // Deployment & waves
    pub deploy_interval: f32,
    pub max_deployed: usize,
    pub max_wanderers: u32,
    pub wave_base_interval: f32,
    pub wave_min_interval: f32,
    /// Camera distance over which difficulty grows by one region step.
    pub difficulty_distance: f32,

    // Camera
    pub camera_follow_lerp: f32,
    pub camera_return_lerp: f32,
    /// Fraction of the view kept ahead of the camera's left edge.
    pub camera_lead: f32,
    pub lock_trigger_distance: f32,
    pub lock_radius: f32,
    pub cleanup_margin: f32,
    pub garrison_reveal_margin: f32,

    // Persistence
    pub autosave_interval: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30.0,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            rng_seed: 0x5EED,
            view_width: 800.0,
            lane_y: 300.0,
            lane_height: 300.0,
            aggro_radius: 600.0,
            behind_slack: 30.0,
            contact_buffer: 5.0,
            neighbor_radius: 40.0,
            separation_strength: 6.0,
            obstacle_flow: 40.0,
            deploy_interval: 0.2,
            max_deployed: 30,
            max_wanderers: 50,
            wave_base_interval: 3.5,
            wave_min_interval: 0.8,
            difficulty_distance: 1500.0,
            camera_follow_lerp: 0.05,
            camera_return_lerp: 0.02,
            camera_lead: 0.6,
            lock_trigger_distance: 150.0,
            lock_radius: 300.0,
            cleanup_margin: 200.0,
            garrison_reveal_margin: 150.0,
            autosave_interval: 30.0,
        }
    }
}

impl SimConfig {
    /// Fixed step length in seconds.
    pub fn dt(&self) -> f32 {
        (1.0 / self.tick_rate) as f32
    }

    pub fn lane_min(&self) -> f32 {
        self.lane_y - self.lane_height * 0.5
    }

    pub fn lane_max(&self) -> f32 {
        self.lane_y + self.lane_height * 0.5
    }
}

// ============================================================================
// Tick, RNG & Pause
// ============================================================================

/// Number of fixed ticks simulated so far.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimTick(pub u64);

/// The only randomness source the simulation draws from.
#[derive(Resource, Debug, Clone)]
pub struct SimRng(pub StdRng);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        SimRng(StdRng::seed_from_u64(seed))
    }
}

impl Default for SimRng {
    fn default() -> Self {
        SimRng::seeded(SimConfig::default().rng_seed)
    }
}

/// While set, every set after `SimSet::Input` is skipped.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimPaused(pub bool);

/// Run condition for the simulation sets.
pub fn simulation_running(paused: Res<SimPaused>) -> bool {
    !paused.0
}
