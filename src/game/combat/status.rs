//! Per-combatant elemental afflictions.
//!
//! A [`StatusTable`] is a fixed array with one optional [`StatusEffect`] per
//! [`StatusKind`], so it lives inline in a pool slot and never allocates.

use crate::game::unit::Element;

pub const MAX_STACKS: u32 = 100;
/// Duration granted (or refreshed to) by each application.
pub const STATUS_DURATION: f32 = 4.0;
pub const DECAY_PER_SECOND: f32 = 5.0;

pub const BURN_DPS_PER_STACK: f32 = 0.5;
pub const POISON_DPS_PER_STACK: f32 = 0.3;

pub const SHOCK_STUN_THRESHOLD: u32 = 30;
pub const SHOCK_STUN_CHANCE: f32 = 0.05;

/// Burning at or above this melts armor.
pub const BURN_ARMOR_BREAK_THRESHOLD: u32 = 50;
pub const ARMOR_BREAK_DURATION: f32 = 5.0;

pub const FREEZE_MINOR: u32 = 20;
pub const FREEZE_MAJOR: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Burning,
    Frozen,
    Shocked,
    Poisoned,
    ArmorBroken,
}

impl StatusKind {
    pub const ALL: [StatusKind; 5] = [
        StatusKind::Burning,
        StatusKind::Frozen,
        StatusKind::Shocked,
        StatusKind::Poisoned,
        StatusKind::ArmorBroken,
    ];

    /// The primer a hit of `element` leaves behind.
    pub fn primed_by(element: Element) -> Option<StatusKind> {
        match element {
            Element::Thermal => Some(StatusKind::Burning),
            Element::Cryo => Some(StatusKind::Frozen),
            Element::Voltaic => Some(StatusKind::Shocked),
            Element::Toxin => Some(StatusKind::Poisoned),
            Element::Physical => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatusEffect {
    pub stacks: u32,
    pub duration: f32,
    /// Fractional stacks decayed but not yet removed.
    pub decay_accumulator: f32,
}

/// Damage over time produced by one status tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DotDamage {
    /// Burning; reduced by armor.
    pub mitigable: f32,
    /// Poison; ignores armor.
    pub piercing: f32,
}

impl DotDamage {
    pub fn is_zero(&self) -> bool {
        self.mitigable <= 0.0 && self.piercing <= 0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatusTable {
    effects: [Option<StatusEffect>; 5],
}

impl StatusTable {
    pub fn get(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.effects[kind.index()].as_ref()
    }

    pub fn stacks(&self, kind: StatusKind) -> u32 {
        self.get(kind).map_or(0, |e| e.stacks)
    }

    pub fn is_active(&self, kind: StatusKind) -> bool {
        self.stacks(kind) > 0
    }

    pub fn clear(&mut self) {
        self.effects = [None; 5];
    }

    /// Add stacks (capped) and extend the duration. Returns the stack count
    /// before and after.
    pub fn apply(&mut self, kind: StatusKind, stacks: u32, duration: f32) -> (u32, u32) {
        let slot = &mut self.effects[kind.index()];
        let effect = slot.get_or_insert_with(StatusEffect::default);
        let before = effect.stacks;
        effect.stacks = (effect.stacks + stacks).min(MAX_STACKS);
        effect.duration = effect.duration.max(duration);
        (before, effect.stacks)
    }

    /// Remove an effect, returning it.
    pub fn consume(&mut self, kind: StatusKind) -> Option<StatusEffect> {
        self.effects[kind.index()].take()
    }

    /// Leave the primer for an elemental hit.
    ///
    /// Returns `true` when this application pushed burning across the melt
    /// threshold, which breaks the target's armor.
    pub fn afflict(&mut self, element: Element, power: u32) -> bool {
        let Some(kind) = StatusKind::primed_by(element) else {
            return false;
        };
        let (before, after) = self.apply(kind, power, STATUS_DURATION);
        if kind == StatusKind::Burning
            && before < BURN_ARMOR_BREAK_THRESHOLD
            && after >= BURN_ARMOR_BREAK_THRESHOLD
        {
            self.break_armor();
            return true;
        }
        false
    }

    pub fn break_armor(&mut self) {
        self.apply(StatusKind::ArmorBroken, MAX_STACKS, ARMOR_BREAK_DURATION);
    }

    /// Fraction of base speed lost to frost, in `[0, 1]`.
    pub fn slow(&self) -> f32 {
        (self.stacks(StatusKind::Frozen) as f32 / MAX_STACKS as f32).min(1.0)
    }

    /// Heavy enough shock that the carrier may lose its action this frame.
    pub fn can_stun(&self) -> bool {
        self.stacks(StatusKind::Shocked) >= SHOCK_STUN_THRESHOLD
    }

    /// Advance every effect by `dt`: report damage over time from the
    /// current stacks, then decay stacks and expire finished effects.
    pub fn tick(&mut self, dt: f32) -> DotDamage {
        let dot = DotDamage {
            mitigable: self.stacks(StatusKind::Burning) as f32 * BURN_DPS_PER_STACK * dt,
            piercing: self.stacks(StatusKind::Poisoned) as f32 * POISON_DPS_PER_STACK * dt,
        };

        for slot in self.effects.iter_mut() {
            let Some(effect) = slot else { continue };
            effect.duration -= dt;
            effect.decay_accumulator += DECAY_PER_SECOND * dt;
            let whole = effect.decay_accumulator.floor();
            effect.decay_accumulator -= whole;
            effect.stacks = effect.stacks.saturating_sub(whole as u32);
            if effect.duration <= 0.0 || effect.stacks == 0 {
                *slot = None;
            }
        }
        dot
    }
}
