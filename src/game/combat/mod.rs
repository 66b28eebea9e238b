//! Battlefield combat: status chemistry, attack resolution, movement and
//! death handling over the [`EntityPool`].

use bevy::prelude::*;

use crate::game::pool::EntityPool;
use crate::game::simulation::SimEvent;
use crate::game::unit::Element;

pub mod damage;
pub mod death;
pub mod movement;
pub mod status;

pub use damage::{resolve_attack, AttackOutcome, AttackProfile, Reaction};
pub use death::process_deaths;
pub use movement::step_movement;
pub use status::{StatusKind, StatusTable};

/// Reusable per-frame buffers so combat passes do not allocate once warm.
#[derive(Resource, Debug, Default)]
pub struct CombatScratch {
    /// Snapshot of active indices for the current pass.
    pub order: Vec<usize>,
    /// Slots killed this frame and not yet settled.
    pub deaths: Vec<usize>,
    pub events: Vec<SimEvent>,
}

/// Advance status effects on every living combatant: damage over time,
/// then decay, then refresh speed from the remaining frost.
///
/// Runs before movement so an expired freeze no longer slows the unit's own
/// action this frame. DoT kills are queued in `scratch.deaths`.
pub fn step_statuses(pool: &mut EntityPool, scratch: &mut CombatScratch, dt: f32) {
    let mut order = std::mem::take(&mut scratch.order);
    order.clear();
    order.extend(pool.active_indices());

    for &index in &order {
        let Some(c) = pool.slot_mut(index) else { continue };
        c.since_hit += dt;
        c.since_attack += dt;
        if !c.is_alive() {
            continue;
        }

        let dot = c.statuses.tick(dt);
        c.speed = c.base_speed * (1.0 - c.statuses.slow());
        if dot.is_zero() {
            continue;
        }
        let burn = damage::mitigate(dot.mitigable, c.armor, &c.statuses, Element::Thermal);
        if damage::apply_damage(c, burn + dot.piercing) {
            scratch.deaths.push(index);
        }
    }

    scratch.order = order;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::pool::UnitState;
    use crate::game::unit::{Faction, UnitKind, UnitStats};

    #[test]
    fn test_poison_ticks_through_armor() {
        let mut pool = EntityPool::new(2);
        let stats = UnitStats { armor: 1000.0, ..UnitStats::base(UnitKind::Riot) };
        let Some(id) = pool.spawn(Faction::Human, UnitKind::Riot, Vec2::ZERO, &stats) else {
            panic!("spawn failed");
        };
        if let Some(c) = pool.get_mut(id) {
            c.statuses.apply(StatusKind::Poisoned, 10, 4.0);
        }
        let mut scratch = CombatScratch::default();
        step_statuses(&mut pool, &mut scratch, 1.0);

        // 10 stacks × 0.3 for one second, no mitigation.
        assert_eq!(pool.get(id).map(|c| c.health), Some(247.0));
    }

    #[test]
    fn test_dot_kill_is_queued_once() {
        let mut pool = EntityPool::new(2);
        let stats = UnitStats { max_health: 1.0, armor: 0.0, ..UnitStats::base(UnitKind::Marine) };
        let Some(id) = pool.spawn(Faction::Human, UnitKind::Marine, Vec2::ZERO, &stats) else {
            panic!("spawn failed");
        };
        if let Some(c) = pool.get_mut(id) {
            c.statuses.apply(StatusKind::Burning, 100, 4.0);
        }
        let mut scratch = CombatScratch::default();
        step_statuses(&mut pool, &mut scratch, 0.1);
        step_statuses(&mut pool, &mut scratch, 0.1);

        assert_eq!(scratch.deaths, vec![id.index as usize]);
        assert_eq!(pool.get(id).map(|c| c.state), Some(UnitState::Dead));
    }

    #[test]
    fn test_thaw_restores_speed() {
        let mut pool = EntityPool::new(2);
        let Some(id) = pool.spawn(Faction::Swarm, UnitKind::Melee, Vec2::ZERO, &UnitStats::base(UnitKind::Melee)) else {
            panic!("spawn failed");
        };
        if let Some(c) = pool.get_mut(id) {
            c.statuses.apply(StatusKind::Frozen, 50, 0.05);
        }
        let mut scratch = CombatScratch::default();
        step_statuses(&mut pool, &mut scratch, 0.1);
        assert_eq!(pool.get(id).map(|c| c.speed), Some(180.0));
    }
}
