//! Death bookkeeping: rewards, corpse fade and on-death area effects.

use bevy::prelude::*;

use crate::game::battle::RunModifiers;
use crate::game::economy::{Colony, ResourceKind};
use crate::game::pool::EntityPool;
use crate::game::simulation::SimEvent;
use crate::game::unit::{Element, Faction};

use super::damage::{apply_damage, mitigate};
use super::status::{StatusKind, STATUS_DURATION};

/// Seconds a corpse stays in its slot before it is recycled.
pub const CORPSE_DECAY_SECONDS: f32 = 2.0;
/// Biomass recovered when a swarm unit falls.
pub const SWARM_DEATH_REFUND: f64 = 2.5;

pub const BLAST_RADIUS: f32 = 80.0;
pub const BLAST_DAMAGE: f32 = 40.0;
pub const CLOUD_RADIUS: f32 = 80.0;

/// Settle every death in `queue`.
///
/// Area effects can kill again, so the queue is drained until empty; each
/// victim is pushed exactly once because [`apply_damage`] only reports the
/// killing blow.
pub fn process_deaths(
    pool: &mut EntityPool,
    queue: &mut Vec<usize>,
    colony: &mut Colony,
    run: &RunModifiers,
    events: &mut Vec<SimEvent>,
) {
    while let Some(index) = queue.pop() {
        let Some(corpse) = pool.slot_mut(index) else { continue };
        let faction = corpse.faction;
        let kind = corpse.kind;
        let position = corpse.position;
        let poison = corpse.statuses.stacks(StatusKind::Poisoned);
        corpse.statuses.clear();
        corpse.target = None;

        events.push(SimEvent::UnitKilled { faction, kind, position });

        match faction {
            Faction::Human => {
                let reward = kind.kill_reward();
                colony.credit(ResourceKind::Biomass, reward.biomass);
                colony.credit(ResourceKind::Minerals, reward.minerals);
            }
            Faction::Swarm => {
                colony.credit(ResourceKind::Biomass, SWARM_DEATH_REFUND);
            }
        }

        if poison > 1 {
            spread_poison(pool, index, faction, position, poison / 2);
        }

        if faction == Faction::Swarm && run.explode_on_death {
            let victims = blast(pool, position);
            debug!("[COMBAT] volatile blood at {:.0} killed {}", position.x, victims.len());
            queue.extend(victims);
        }
    }
}

/// Burst a poisoned corpse into a cloud that seeps into nearby enemies.
fn spread_poison(pool: &mut EntityPool, corpse: usize, faction: Faction, at: Vec2, stacks: u32) {
    let reach = CLOUD_RADIUS * CLOUD_RADIUS;
    let indices: Vec<usize> = pool
        .iter_active()
        .filter(|(i, c)| {
            *i != corpse && c.is_alive() && c.faction != faction && c.position.distance_squared(at) <= reach
        })
        .map(|(i, _)| i)
        .collect();
    for i in indices {
        if let Some(c) = pool.slot_mut(i) {
            c.statuses.apply(StatusKind::Poisoned, stacks, STATUS_DURATION);
        }
    }
}

/// Damage hostiles around `at`. Returns the ones it killed.
fn blast(pool: &mut EntityPool, at: Vec2) -> Vec<usize> {
    let reach = BLAST_RADIUS * BLAST_RADIUS;
    let indices: Vec<usize> = pool
        .iter_active()
        .filter(|(_, c)| c.is_alive() && c.faction == Faction::Human && c.position.distance_squared(at) <= reach)
        .map(|(i, _)| i)
        .collect();

    let mut killed = Vec::new();
    for i in indices {
        let Some(c) = pool.slot_mut(i) else { continue };
        let amount = mitigate(BLAST_DAMAGE, c.armor, &c.statuses, Element::Physical);
        if apply_damage(c, amount) {
            killed.push(i);
        }
    }
    killed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::pool::UnitState;
    use crate::game::unit::{UnitKind, UnitStats};

    fn spawn(pool: &mut EntityPool, faction: Faction, kind: UnitKind, x: f32, hp: f32) -> usize {
        let stats = UnitStats { max_health: hp, armor: 0.0, ..UnitStats::base(kind) };
        match pool.spawn(faction, kind, Vec2::new(x, 0.0), &stats) {
            Some(id) => id.index as usize,
            None => panic!("pool full"),
        }
    }

    fn kill(pool: &mut EntityPool, index: usize) {
        if let Some(c) = pool.slot_mut(index) {
            assert!(apply_damage(c, f32::MAX));
        }
    }

    #[test]
    fn test_hostile_kill_pays_reward() {
        let mut pool = EntityPool::new(8);
        let mut colony = Colony::default();
        let mut events = Vec::new();
        let tank = spawn(&mut pool, Faction::Human, UnitKind::Tank, 0.0, 10.0);
        kill(&mut pool, tank);

        let mut queue = vec![tank];
        process_deaths(&mut pool, &mut queue, &mut colony, &RunModifiers::default(), &mut events);

        assert_eq!(colony.resources.biomass, 50.0);
        assert_eq!(colony.resources.minerals, 30.0);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SimEvent::UnitKilled { kind: UnitKind::Tank, .. }));
        assert_eq!(pool.slot(tank).map(|c| c.state), Some(UnitState::Dead));
    }

    #[test]
    fn test_swarm_death_refunds_biomass() {
        let mut pool = EntityPool::new(8);
        let mut colony = Colony::default();
        let melee = spawn(&mut pool, Faction::Swarm, UnitKind::Melee, 0.0, 10.0);
        kill(&mut pool, melee);

        process_deaths(&mut pool, &mut vec![melee], &mut colony, &RunModifiers::default(), &mut Vec::new());
        assert_eq!(colony.resources.biomass, SWARM_DEATH_REFUND);
    }

    #[test]
    fn test_poison_cloud_spreads_half_to_nearby_enemies() {
        let mut pool = EntityPool::new(8);
        let mut colony = Colony::default();
        let victim = spawn(&mut pool, Faction::Human, UnitKind::Marine, 0.0, 10.0);
        let ally = spawn(&mut pool, Faction::Human, UnitKind::Marine, 20.0, 100.0);
        let foe = spawn(&mut pool, Faction::Swarm, UnitKind::Melee, 10.0, 100.0);
        let far_foe = spawn(&mut pool, Faction::Swarm, UnitKind::Melee, 500.0, 100.0);

        if let Some(c) = pool.slot_mut(victim) {
            c.statuses.apply(StatusKind::Poisoned, 40, 4.0);
        }
        kill(&mut pool, victim);
        process_deaths(&mut pool, &mut vec![victim], &mut colony, &RunModifiers::default(), &mut Vec::new());

        let stacks = |i: usize| pool.slot(i).map_or(0, |c| c.statuses.stacks(StatusKind::Poisoned));
        assert_eq!(stacks(foe), 20);
        assert_eq!(stacks(ally), 0);
        assert_eq!(stacks(far_foe), 0);
    }

    #[test]
    fn test_volatile_blood_chains_through_queue() {
        let mut pool = EntityPool::new(8);
        let mut colony = Colony::default();
        let run = RunModifiers { explode_on_death: true, ..Default::default() };
        let bomber = spawn(&mut pool, Faction::Swarm, UnitKind::Melee, 0.0, 10.0);
        let weak = spawn(&mut pool, Faction::Human, UnitKind::Marine, 40.0, 30.0);
        let sturdy = spawn(&mut pool, Faction::Human, UnitKind::Marine, 60.0, 300.0);
        let mut events = Vec::new();

        kill(&mut pool, bomber);
        process_deaths(&mut pool, &mut vec![bomber], &mut colony, &run, &mut events);

        assert_eq!(pool.slot(weak).map(|c| c.state), Some(UnitState::Dead));
        assert_eq!(pool.slot(sturdy).map(|c| c.health), Some(260.0));
        let kills = events.iter().filter(|e| matches!(e, SimEvent::UnitKilled { .. })).count();
        assert_eq!(kills, 2);
        assert_eq!(colony.resources.biomass, SWARM_DEATH_REFUND + 10.0);
    }
}
