//! Attack resolution: crit roll, elemental reaction, armor mitigation and
//! primer application, in that order.

use rand::Rng;

use crate::game::pool::{Combatant, UnitState};
use crate::game::unit::{Element, Faction};

use super::death::CORPSE_DECAY_SECONDS;
use super::status::{StatusKind, StatusTable, FREEZE_MAJOR, FREEZE_MINOR, STATUS_DURATION};

/// Armor constant in `armor / (armor + K)`.
pub const ARMOR_K: f32 = 100.0;
pub const MELT_MULTIPLIER: f32 = 2.5;
/// Shatter burst as a fraction of the target's max health.
pub const SHATTER_FRACTION: f32 = 0.2;
pub const SUPERCONDUCT_STACKS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reaction {
    /// Frost + thermal: multiplied hit, freeze consumed.
    Melt,
    /// Deep frost + physical: burst of max health, freeze consumed.
    Shatter,
    /// Poison + voltaic: armor broken.
    Corrode,
    /// Shock + cryo: heavy freeze applied.
    Superconduct,
}

/// The attacker's side of an exchange, copied out so the defender can be
/// borrowed mutably from the same pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackProfile {
    pub faction: Faction,
    pub damage: f32,
    pub element: Element,
    pub crit_chance: f32,
    pub crit_multiplier: f32,
    pub status_power: u32,
}

impl AttackProfile {
    pub fn of(attacker: &Combatant) -> Self {
        AttackProfile {
            faction: attacker.faction,
            damage: attacker.damage,
            element: attacker.element,
            crit_chance: attacker.crit_chance,
            crit_multiplier: attacker.crit_multiplier,
            status_power: attacker.status_power,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AttackOutcome {
    /// Health actually removed.
    pub damage: f32,
    pub crit: bool,
    pub reaction: Option<Reaction>,
    /// Armor-broken was applied by this hit.
    pub armor_broken: bool,
    pub killed: bool,
}

/// The single reaction a hit of `element` sets off against `statuses`.
///
/// Each incoming element keys at most one reaction, so at most one can fire.
pub fn find_reaction(statuses: &StatusTable, element: Element) -> Option<Reaction> {
    match element {
        Element::Thermal if statuses.stacks(StatusKind::Frozen) >= FREEZE_MINOR => Some(Reaction::Melt),
        Element::Physical if statuses.stacks(StatusKind::Frozen) >= FREEZE_MAJOR => Some(Reaction::Shatter),
        Element::Voltaic if statuses.is_active(StatusKind::Poisoned) => Some(Reaction::Corrode),
        Element::Cryo if statuses.is_active(StatusKind::Shocked) => Some(Reaction::Superconduct),
        _ => None,
    }
}

/// Reduce `amount` by armor. Toxin and broken armor pass straight through.
pub fn mitigate(amount: f32, armor: f32, statuses: &StatusTable, element: Element) -> f32 {
    if element == Element::Toxin || statuses.is_active(StatusKind::ArmorBroken) || armor <= 0.0 {
        return amount;
    }
    amount * (1.0 - armor / (armor + ARMOR_K))
}

/// Subtract health, keeping it in `[0, max]`. A lethal hit marks the slot
/// dead and starts its fade in the same call. Returns `true` only for the
/// killing blow.
pub fn apply_damage(target: &mut Combatant, amount: f32) -> bool {
    if !target.is_alive() || amount <= 0.0 {
        return false;
    }
    target.health = (target.health - amount).clamp(0.0, target.max_health);
    target.since_hit = 0.0;
    if target.health <= 0.0 {
        target.health = 0.0;
        target.state = UnitState::Dead;
        target.decay_timer = CORPSE_DECAY_SECONDS;
        target.target = None;
        return true;
    }
    false
}

/// Resolve one attack against a live defender.
pub fn resolve_attack<R: Rng + ?Sized>(
    attack: &AttackProfile,
    defender: &mut Combatant,
    rng: &mut R,
) -> AttackOutcome {
    if !defender.is_alive() {
        return AttackOutcome::default();
    }

    let crit = attack.crit_chance > 0.0 && rng.random::<f32>() < attack.crit_chance;
    let mut raw = attack.damage * if crit { attack.crit_multiplier } else { 1.0 };
    let mut burst = 0.0;
    let mut armor_broken = false;

    let reaction = find_reaction(&defender.statuses, attack.element);
    match reaction {
        Some(Reaction::Melt) => {
            raw *= MELT_MULTIPLIER;
            defender.statuses.consume(StatusKind::Frozen);
        }
        Some(Reaction::Shatter) => {
            burst = defender.max_health * SHATTER_FRACTION;
            defender.statuses.consume(StatusKind::Frozen);
        }
        Some(Reaction::Corrode) => {
            defender.statuses.break_armor();
            armor_broken = true;
        }
        Some(Reaction::Superconduct) => {
            defender.statuses.apply(StatusKind::Frozen, SUPERCONDUCT_STACKS, STATUS_DURATION);
        }
        None => {}
    }

    let dealt = mitigate(raw, defender.armor, &defender.statuses, attack.element) + burst;
    let before = defender.health;
    let killed = apply_damage(defender, dealt);
    defender.last_hit_crit = crit;

    if !killed {
        armor_broken |= defender.statuses.afflict(attack.element, attack.status_power);
    }

    AttackOutcome {
        damage: before - defender.health,
        crit,
        reaction,
        armor_broken,
        killed,
    }
}

#[cfg(test)]
#[path = "damage_tests.rs"]
mod tests;
