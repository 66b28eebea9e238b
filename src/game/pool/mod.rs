//! Fixed-capacity combatant arena.
//!
//! Every battlefield body lives in a pre-sized slot. Spawning overwrites the
//! first free slot in place and recycling flips its active bit back off, so
//! steady-state play never allocates. Slots are addressed through [`SlotId`],
//! an index plus a generation counter; a handle to a recycled slot simply
//! stops resolving.

use bevy::prelude::*;
use fixedbitset::FixedBitSet;

use crate::game::combat::status::StatusTable;
use crate::game::unit::{Element, Faction, UnitKind, UnitStats};

pub const DEFAULT_POOL_CAPACITY: usize = 400;

// ============================================================================
// Handles & Slots
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId {
    pub index: u32,
    pub generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitState {
    #[default]
    Move,
    Attack,
    Idle,
    Wander,
    Dead,
}

/// One pool slot. Every field is rewritten on spawn.
#[derive(Debug, Clone, Default)]
pub struct Combatant {
    /// Monotonic spawn serial, unique for the lifetime of the pool.
    pub serial: u64,
    pub faction: Faction,
    pub kind: UnitKind,
    pub position: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub damage: f32,
    pub range: f32,
    pub base_speed: f32,
    /// Base speed after frost.
    pub speed: f32,
    pub armor: f32,
    pub attack_cooldown: f32,
    pub attack_interval: f32,
    pub crit_chance: f32,
    pub crit_multiplier: f32,
    pub element: Element,
    pub status_power: u32,
    pub state: UnitState,
    /// Seconds left before a corpse is recycled.
    pub decay_timer: f32,
    pub target: Option<SlotId>,
    pub statuses: StatusTable,
    pub wander_timer: f32,
    pub wander_heading: Vec2,
    /// Seconds since this combatant last took a hit.
    pub since_hit: f32,
    /// Seconds since this combatant last attacked.
    pub since_attack: f32,
    pub last_hit_crit: bool,
}

impl Combatant {
    pub fn is_alive(&self) -> bool {
        self.state != UnitState::Dead
    }

    fn reset(&mut self, serial: u64, faction: Faction, kind: UnitKind, position: Vec2, stats: &UnitStats) {
        *self = Combatant {
            serial,
            faction,
            kind,
            position,
            radius: stats.radius,
            health: stats.max_health,
            max_health: stats.max_health,
            damage: stats.damage,
            range: stats.range,
            base_speed: stats.speed,
            speed: stats.speed,
            armor: stats.armor,
            attack_cooldown: 0.0,
            attack_interval: stats.attack_interval,
            crit_chance: stats.crit_chance,
            crit_multiplier: stats.crit_multiplier,
            element: stats.element,
            status_power: stats.status_power,
            state: match faction {
                Faction::Swarm => UnitState::Move,
                Faction::Human => UnitState::Idle,
            },
            since_hit: f32::MAX,
            since_attack: f32::MAX,
            ..Default::default()
        };
    }
}

// ============================================================================
// Entity Pool
// ============================================================================

#[derive(Resource, Debug)]
pub struct EntityPool {
    slots: Vec<Combatant>,
    generations: Vec<u32>,
    active: FixedBitSet,
    next_serial: u64,
}

impl Default for EntityPool {
    fn default() -> Self {
        EntityPool::new(DEFAULT_POOL_CAPACITY)
    }
}

impl EntityPool {
    pub fn new(capacity: usize) -> Self {
        EntityPool {
            slots: vec![Combatant::default(); capacity],
            generations: vec![0; capacity],
            active: FixedBitSet::with_capacity(capacity),
            next_serial: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.count_ones(..)
    }

    /// Claim the first inactive slot. `None` means the pool is full; callers
    /// skip the spawn and try again on a later tick.
    pub fn spawn(&mut self, faction: Faction, kind: UnitKind, position: Vec2, stats: &UnitStats) -> Option<SlotId> {
        let index = self.active.zeroes().next()?;
        self.active.insert(index);
        self.generations[index] = self.generations[index].wrapping_add(1);
        let serial = self.next_serial;
        self.next_serial += 1;
        self.slots[index].reset(serial, faction, kind, position, stats);
        Some(self.handle(index))
    }

    /// Return a slot to the free list. Stale or already-free handles are ignored.
    pub fn recycle(&mut self, id: SlotId) -> bool {
        if !self.is_live(id) {
            return false;
        }
        self.recycle_index(id.index as usize)
    }

    pub fn recycle_index(&mut self, index: usize) -> bool {
        if index >= self.capacity() || !self.active.contains(index) {
            return false;
        }
        self.active.set(index, false);
        self.slots[index].target = None;
        true
    }

    /// Recycle every active slot.
    pub fn clear(&mut self) {
        let indices: Vec<usize> = self.active.ones().collect();
        for index in indices {
            self.recycle_index(index);
        }
    }

    pub fn handle(&self, index: usize) -> SlotId {
        SlotId {
            index: index as u32,
            generation: self.generations.get(index).copied().unwrap_or(0),
        }
    }

    /// The handle still refers to the occupant it was issued for.
    pub fn is_live(&self, id: SlotId) -> bool {
        let index = id.index as usize;
        self.active.contains(index) && self.generations.get(index) == Some(&id.generation)
    }

    pub fn get(&self, id: SlotId) -> Option<&Combatant> {
        if self.is_live(id) {
            self.slots.get(id.index as usize)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut Combatant> {
        if self.is_live(id) {
            self.slots.get_mut(id.index as usize)
        } else {
            None
        }
    }

    /// Active slot by raw index.
    pub fn slot(&self, index: usize) -> Option<&Combatant> {
        if self.active.contains(index) {
            self.slots.get(index)
        } else {
            None
        }
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut Combatant> {
        if self.active.contains(index) {
            self.slots.get_mut(index)
        } else {
            None
        }
    }

    /// Indices of active slots in ascending order.
    pub fn active_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.active.ones()
    }

    pub fn iter_active(&self) -> impl Iterator<Item = (usize, &Combatant)> + '_ {
        self.active.ones().map(move |i| (i, &self.slots[i]))
    }

    /// Living (not yet dead) combatants of `faction`.
    pub fn count_alive(&self, faction: Faction) -> usize {
        self.iter_active()
            .filter(|(_, c)| c.is_alive() && c.faction == faction)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(hp: f32) -> UnitStats {
        UnitStats { max_health: hp, ..UnitStats::base(UnitKind::Melee) }
    }

    #[test]
    fn test_spawn_fills_first_free_slot() {
        let mut pool = EntityPool::new(4);
        let a = pool.spawn(Faction::Swarm, UnitKind::Melee, Vec2::ZERO, &stats(50.0));
        let b = pool.spawn(Faction::Swarm, UnitKind::Melee, Vec2::ZERO, &stats(50.0));
        assert_eq!(a.map(|h| h.index), Some(0));
        assert_eq!(b.map(|h| h.index), Some(1));

        assert!(a.is_some_and(|h| pool.recycle(h)));
        let c = pool.spawn(Faction::Human, UnitKind::Marine, Vec2::ZERO, &stats(80.0));
        assert_eq!(c.map(|h| h.index), Some(0));
    }

    #[test]
    fn test_full_pool_refuses_spawn() {
        let mut pool = EntityPool::new(2);
        assert!(pool.spawn(Faction::Swarm, UnitKind::Melee, Vec2::ZERO, &stats(1.0)).is_some());
        assert!(pool.spawn(Faction::Swarm, UnitKind::Melee, Vec2::ZERO, &stats(1.0)).is_some());
        assert!(pool.spawn(Faction::Swarm, UnitKind::Melee, Vec2::ZERO, &stats(1.0)).is_none());
        assert_eq!(pool.active_count(), 2);
    }

    #[test]
    fn test_recycle_is_idempotent() {
        let mut pool = EntityPool::new(3);
        let Some(id) = pool.spawn(Faction::Swarm, UnitKind::Melee, Vec2::ZERO, &stats(10.0)) else {
            panic!("spawn failed");
        };
        assert!(pool.recycle(id));
        assert!(!pool.recycle(id));
        assert!(!pool.recycle_index(id.index as usize));
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn test_stale_handle_does_not_resolve_after_reuse() {
        let mut pool = EntityPool::new(1);
        let Some(old) = pool.spawn(Faction::Swarm, UnitKind::Melee, Vec2::ZERO, &stats(10.0)) else {
            panic!("spawn failed");
        };
        pool.recycle(old);
        let Some(new) = pool.spawn(Faction::Human, UnitKind::Marine, Vec2::ZERO, &stats(10.0)) else {
            panic!("spawn failed");
        };

        assert_eq!(old.index, new.index);
        assert!(pool.get(old).is_none());
        assert!(!pool.recycle(old), "stale handle must not free the new occupant");
        assert!(pool.get(new).is_some());
    }

    #[test]
    fn test_respawn_overwrites_every_field() {
        let mut pool = EntityPool::new(1);
        let Some(id) = pool.spawn(Faction::Swarm, UnitKind::Melee, Vec2::ZERO, &stats(10.0)) else {
            panic!("spawn failed");
        };
        if let Some(c) = pool.get_mut(id) {
            c.health = 1.0;
            c.state = UnitState::Dead;
            c.statuses.apply(crate::game::combat::status::StatusKind::Frozen, 50, 4.0);
        }
        pool.recycle(id);

        let Some(id) = pool.spawn(Faction::Human, UnitKind::Riot, Vec2::new(5.0, 0.0), &stats(250.0)) else {
            panic!("spawn failed");
        };
        let c = pool.get(id).cloned().unwrap_or_default();
        assert_eq!(c.health, 250.0);
        assert_eq!(c.state, UnitState::Idle);
        assert_eq!(c.statuses, StatusTable::default());
        assert_eq!(c.kind, UnitKind::Riot);
    }
}
