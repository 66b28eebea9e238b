use crate::game::battle::RunModifiers;
use crate::game::economy::grafting::LoadoutBonus;

use super::kinds::{Element, UnitKind, DEFAULT_CRIT_CHANCE, DEFAULT_CRIT_MULTIPLIER, DEFAULT_STATUS_POWER};

/// Fully resolved combat stats written into a pool slot on spawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitStats {
    pub max_health: f32,
    pub damage: f32,
    pub range: f32,
    pub speed: f32,
    pub attack_interval: f32,
    pub radius: f32,
    pub armor: f32,
    pub element: Element,
    pub crit_chance: f32,
    pub crit_multiplier: f32,
    /// Status stacks applied per elemental hit.
    pub status_power: u32,
}

/// Prestige bonus per point of mutagen.
pub const MUTAGEN_BONUS: f32 = 0.1;
pub const MIN_ATTACK_INTERVAL: f32 = 0.1;

impl UnitStats {
    /// Table stats with no progression applied.
    pub fn base(kind: UnitKind) -> Self {
        let b = kind.base_stats();
        UnitStats {
            max_health: b.health,
            damage: b.damage,
            range: b.range,
            speed: b.speed,
            attack_interval: b.attack_interval,
            radius: b.width * 0.5,
            armor: b.armor,
            element: b.element,
            crit_chance: b.crit_chance,
            crit_multiplier: b.crit_multiplier,
            status_power: DEFAULT_STATUS_POWER,
        }
    }

    /// Stats of a swarm unit at `level` carrying `bonus`, under the current
    /// run modifiers and prestige mutagen.
    pub fn for_swarm(
        kind: UnitKind,
        level: u32,
        bonus: &LoadoutBonus,
        run: &RunModifiers,
        mutagen: f64,
    ) -> Self {
        let b = kind.base_stats();
        let lvl = level.saturating_sub(1) as f32;
        let mutagen_mult = 1.0 + mutagen as f32 * MUTAGEN_BONUS;

        let max_health = b.health
            * (1.0 + lvl * b.health_growth)
            * run.max_hp_multiplier
            * (1.0 + bonus.health)
            * mutagen_mult;
        let damage = b.damage
            * (1.0 + lvl * b.damage_growth)
            * run.damage_multiplier
            * (1.0 + bonus.damage)
            * mutagen_mult;

        UnitStats {
            max_health,
            damage,
            speed: b.speed * (1.0 + bonus.speed),
            attack_interval: (b.attack_interval / (1.0 + bonus.attack_speed)).max(MIN_ATTACK_INTERVAL),
            crit_chance: DEFAULT_CRIT_CHANCE * (1.0 + bonus.crit_chance),
            crit_multiplier: DEFAULT_CRIT_MULTIPLIER + bonus.crit_damage,
            element: bonus.element.unwrap_or(b.element),
            ..UnitStats::base(kind)
        }
    }
}
