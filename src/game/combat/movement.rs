//! Per-frame targeting, steering and melee/ranged exchange.
//!
//! Target search is a linear scan over the pool with squared distances; at
//! the pool's fixed size that is cheaper than maintaining a broad phase.

use bevy::prelude::*;
use rand::Rng;

use crate::game::pool::{Combatant, EntityPool, UnitState};
use crate::game::simulation::{SimConfig, SimEvent};
use crate::game::unit::Faction;
use crate::game::world::Obstacle;

use super::damage::{resolve_attack, AttackProfile};
use super::status::SHOCK_STUN_CHANCE;
use super::CombatScratch;

/// Wanderers amble at a fraction of their marching speed.
pub const WANDER_SPEED_FACTOR: f32 = 0.3;

// ============================================================================
// Queries
// ============================================================================

/// Closest living opponent within `aggro_radius`, with its squared distance.
///
/// Swarm units advance to the right and ignore anything more than
/// `behind_slack` behind them.
pub fn nearest_enemy(
    pool: &EntityPool,
    index: usize,
    aggro_radius: f32,
    behind_slack: f32,
) -> Option<(usize, f32)> {
    let me = pool.slot(index)?;
    let foe = me.faction.opponent();
    let heading = me.faction.heading();
    let limit = aggro_radius * aggro_radius;

    let mut best: Option<(usize, f32)> = None;
    for (j, other) in pool.iter_active() {
        if other.faction != foe || !other.is_alive() {
            continue;
        }
        let delta = other.position - me.position;
        if me.faction == Faction::Swarm && delta.x * heading < -behind_slack {
            continue;
        }
        let dist_sq = delta.length_squared();
        if dist_sq <= limit && best.is_none_or(|(_, d)| dist_sq < d) {
            best = Some((j, dist_sq));
        }
    }
    best
}

/// Push away from overlapping allies, proportional to overlap.
pub fn separation(pool: &EntityPool, index: usize, neighbor_radius: f32, strength: f32) -> Vec2 {
    let Some(me) = pool.slot(index) else {
        return Vec2::ZERO;
    };
    let neighbor_sq = neighbor_radius * neighbor_radius;
    let mut push = Vec2::ZERO;

    for (j, other) in pool.iter_active() {
        if j == index || other.faction != me.faction || !other.is_alive() {
            continue;
        }
        let delta = me.position - other.position;
        let dist_sq = delta.length_squared();
        let min_dist = me.radius + other.radius;
        if dist_sq > neighbor_sq || dist_sq >= min_dist * min_dist {
            continue;
        }
        let dist = dist_sq.sqrt();
        let normal = if dist > f32::EPSILON {
            delta / dist
        } else if index > j {
            Vec2::Y
        } else {
            Vec2::NEG_Y
        };
        push += normal * (min_dist - dist) * strength;
    }
    push
}

/// Project `position` out of every obstacle it overlaps and slide it along
/// the surface in the direction of travel.
pub fn avoid_obstacles(mut position: Vec2, radius: f32, heading: f32, obstacles: &[Obstacle], nudge: f32) -> Vec2 {
    for obstacle in obstacles {
        let center = obstacle.center();
        let delta = position - center;
        let min_dist = obstacle.radius + radius;
        let dist_sq = delta.length_squared();
        if dist_sq >= min_dist * min_dist {
            continue;
        }
        let dist = dist_sq.sqrt();
        let normal = if dist > f32::EPSILON { delta / dist } else { Vec2::Y };
        let mut tangent = normal.perp();
        if tangent.x * heading < 0.0 {
            tangent = -tangent;
        }
        position = center + normal * min_dist + tangent * nudge;
    }
    position
}

// ============================================================================
// Frame Step
// ============================================================================

/// Run one movement/targeting/attack pass over every active combatant.
///
/// Kills are queued in `scratch.deaths` for the caller to settle.
pub fn step_movement<R: Rng + ?Sized>(
    pool: &mut EntityPool,
    obstacles: &[Obstacle],
    config: &SimConfig,
    rng: &mut R,
    scratch: &mut CombatScratch,
    dt: f32,
) {
    let mut order = std::mem::take(&mut scratch.order);
    order.clear();
    order.extend(pool.active_indices());

    for &index in &order {
        act(index, pool, obstacles, config, rng, scratch, dt);
    }

    scratch.order = order;
}

fn act<R: Rng + ?Sized>(
    index: usize,
    pool: &mut EntityPool,
    obstacles: &[Obstacle],
    config: &SimConfig,
    rng: &mut R,
    scratch: &mut CombatScratch,
    dt: f32,
) {
    let Some(me) = pool.slot(index) else { return };
    if !me.is_alive() {
        return;
    }
    if me.state == UnitState::Wander {
        if let Some(me) = pool.slot_mut(index) {
            wander(me, config, rng, dt);
        }
        return;
    }
    if me.statuses.can_stun() && rng.random::<f32>() < SHOCK_STUN_CHANCE {
        return;
    }

    let faction = me.faction;
    let position = me.position;
    let radius = me.radius;
    let range = me.range;
    let speed = me.speed;

    let nearest = nearest_enemy(pool, index, config.aggro_radius, config.behind_slack);
    let in_reach = nearest.and_then(|(j, dist_sq)| {
        let other = pool.slot(j)?;
        let dist = dist_sq.sqrt();
        let contact = radius + other.radius + config.contact_buffer;
        (dist <= range || dist <= contact).then_some(j)
    });

    if let Some(j) = in_reach {
        strike(index, j, pool, rng, scratch, dt);
        return;
    }

    let pursuit = nearest.and_then(|(j, _)| pool.slot(j).map(|o| (pool.handle(j), o.position)));
    let next = if speed > 0.0 {
        let desired = match pursuit {
            Some((_, goal)) => (goal - position).normalize_or_zero() * speed,
            None if faction == Faction::Swarm => Vec2::new(speed, 0.0),
            None => Vec2::ZERO,
        };
        let push = separation(pool, index, config.neighbor_radius, config.separation_strength);
        let moved = position + (desired + push) * dt;
        let mut next = avoid_obstacles(moved, radius, faction.heading(), obstacles, config.obstacle_flow * dt);
        next.y = next.y.clamp(config.lane_min(), config.lane_max());
        next
    } else {
        position
    };

    let Some(me) = pool.slot_mut(index) else { return };
    me.state = match faction {
        Faction::Swarm => UnitState::Move,
        Faction::Human => UnitState::Idle,
    };
    me.target = pursuit.map(|(handle, _)| handle);
    me.position = next;
}

/// Tick the attacker's cooldown and land a hit when it is ready.
fn strike<R: Rng + ?Sized>(
    attacker: usize,
    defender: usize,
    pool: &mut EntityPool,
    rng: &mut R,
    scratch: &mut CombatScratch,
    dt: f32,
) {
    let handle = pool.handle(defender);
    let Some(me) = pool.slot_mut(attacker) else { return };
    me.state = UnitState::Attack;
    me.target = Some(handle);
    me.attack_cooldown -= dt;
    if me.attack_cooldown > 0.0 {
        return;
    }
    me.attack_cooldown = me.attack_interval;
    me.since_attack = 0.0;
    let attack = AttackProfile::of(me);

    // Ranged hits land at launch; projectiles are cosmetic.
    let Some(target) = pool.slot_mut(defender) else { return };
    let outcome = resolve_attack(&attack, target, rng);
    let at = target.position;

    if let Some(reaction) = outcome.reaction {
        scratch.events.push(SimEvent::ReactionTriggered { reaction, position: at });
    }
    if outcome.armor_broken {
        scratch.events.push(SimEvent::ArmorBroken { position: at });
    }
    if outcome.killed {
        scratch.deaths.push(defender);
    }
}

fn wander<R: Rng + ?Sized>(me: &mut Combatant, config: &SimConfig, rng: &mut R, dt: f32) {
    me.wander_timer -= dt;
    if me.wander_timer <= 0.0 {
        me.wander_heading = Vec2::from_angle(rng.random_range(0.0..std::f32::consts::TAU));
        me.wander_timer = rng.random_range(1.0..3.0);
    }
    let next = me.position + me.wander_heading * me.speed * WANDER_SPEED_FACTOR * dt;
    me.position = Vec2::new(
        next.x.clamp(0.0, config.view_width),
        next.y.clamp(config.lane_min(), config.lane_max()),
    );
}
