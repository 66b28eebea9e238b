use super::*;
use crate::game::combat::status::{StatusKind, BURN_ARMOR_BREAK_THRESHOLD, MAX_STACKS};
use crate::game::pool::EntityPool;
use crate::game::unit::{UnitKind, UnitStats};
use bevy::math::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

fn target(health: f32, armor: f32) -> Combatant {
    Combatant {
        faction: Faction::Human,
        kind: UnitKind::Marine,
        health,
        max_health: health,
        armor,
        ..Default::default()
    }
}

fn hit(damage: f32, element: Element) -> AttackProfile {
    AttackProfile {
        faction: Faction::Swarm,
        damage,
        element,
        crit_chance: 0.0,
        crit_multiplier: 1.5,
        status_power: 10,
    }
}

#[test]
fn test_plain_hit_on_pooled_unit() {
    let mut pool = EntityPool::new(16);
    let stats = UnitStats { max_health: 50.0, armor: 0.0, ..UnitStats::base(UnitKind::Melee) };
    let ids: Vec<_> = (0..10)
        .filter_map(|i| pool.spawn(Faction::Swarm, UnitKind::Melee, Vec2::new(i as f32 * 30.0, 0.0), &stats))
        .collect();
    assert_eq!(ids.len(), 10);

    let outcome = pool
        .get_mut(ids[3])
        .map(|c| resolve_attack(&hit(20.0, Element::Physical), c, &mut rng()));

    let Some(outcome) = outcome else { panic!("slot vanished") };
    assert!(!outcome.killed);
    let c = pool.get(ids[3]).cloned().unwrap_or_default();
    assert_eq!(c.health, 30.0);
    assert!(matches!(c.state, UnitState::Move | UnitState::Attack));
}

#[test]
fn test_armor_mitigation_and_toxin_bypass() {
    let mut armored = target(1000.0, 100.0);
    let outcome = resolve_attack(&hit(100.0, Element::Physical), &mut armored, &mut rng());
    assert!((outcome.damage - 50.0).abs() < 1e-4, "K = armor halves the hit");

    let mut armored = target(1000.0, 100.0);
    let outcome = resolve_attack(&hit(100.0, Element::Toxin), &mut armored, &mut rng());
    assert!((outcome.damage - 100.0).abs() < 1e-4);
}

#[test]
fn test_armor_broken_removes_mitigation() {
    let mut armored = target(1000.0, 60.0);
    armored.statuses.break_armor();
    let outcome = resolve_attack(&hit(40.0, Element::Physical), &mut armored, &mut rng());
    assert!((outcome.damage - 40.0).abs() < 1e-4);
}

#[test]
fn test_lethal_hit_marks_dead_and_clamps_health() {
    let mut weak = target(10.0, 0.0);
    let outcome = resolve_attack(&hit(500.0, Element::Physical), &mut weak, &mut rng());
    assert!(outcome.killed);
    assert_eq!(weak.health, 0.0);
    assert_eq!(weak.state, UnitState::Dead);
    assert!(weak.decay_timer > 0.0);

    // A corpse takes no further hits.
    let again = resolve_attack(&hit(500.0, Element::Physical), &mut weak, &mut rng());
    assert_eq!(again, AttackOutcome::default());
}

#[test]
fn test_melt_multiplies_and_consumes_freeze() {
    let mut t = target(1000.0, 0.0);
    t.statuses.apply(StatusKind::Frozen, 30, 4.0);
    let outcome = resolve_attack(&hit(10.0, Element::Thermal), &mut t, &mut rng());
    assert_eq!(outcome.reaction, Some(Reaction::Melt));
    assert!((outcome.damage - 25.0).abs() < 1e-4);
    assert!(!t.statuses.is_active(StatusKind::Frozen));
    assert_eq!(t.statuses.stacks(StatusKind::Burning), 10);
}

#[test]
fn test_shatter_is_true_damage_of_max_health() {
    let mut t = target(500.0, 1000.0);
    t.statuses.apply(StatusKind::Frozen, 70, 4.0);
    let outcome = resolve_attack(&hit(0.0, Element::Physical), &mut t, &mut rng());
    assert_eq!(outcome.reaction, Some(Reaction::Shatter));
    assert!((outcome.damage - 100.0).abs() < 1e-3);
    assert!(!t.statuses.is_active(StatusKind::Frozen));
}

#[test]
fn test_only_one_reaction_fires_per_hit() {
    let mut t = target(1000.0, 0.0);
    t.statuses.apply(StatusKind::Frozen, 80, 4.0);
    t.statuses.apply(StatusKind::Poisoned, 20, 4.0);

    let outcome = resolve_attack(&hit(10.0, Element::Physical), &mut t, &mut rng());
    assert_eq!(outcome.reaction, Some(Reaction::Shatter));
    assert!(!outcome.armor_broken);
    assert!(!t.statuses.is_active(StatusKind::ArmorBroken));
    assert!(t.statuses.is_active(StatusKind::Poisoned));
}

#[test]
fn test_corrode_breaks_armor() {
    let mut t = target(1000.0, 60.0);
    t.statuses.apply(StatusKind::Poisoned, 10, 4.0);
    let outcome = resolve_attack(&hit(10.0, Element::Voltaic), &mut t, &mut rng());
    assert_eq!(outcome.reaction, Some(Reaction::Corrode));
    assert!(outcome.armor_broken);
    assert!((outcome.damage - 10.0).abs() < 1e-4, "the breaking hit already lands unmitigated");
}

#[test]
fn test_superconduct_applies_heavy_freeze() {
    let mut t = target(1000.0, 0.0);
    t.statuses.apply(StatusKind::Shocked, 10, 4.0);
    let outcome = resolve_attack(&hit(10.0, Element::Cryo), &mut t, &mut rng());
    assert_eq!(outcome.reaction, Some(Reaction::Superconduct));
    // 60 from the reaction, then the cryo primer itself.
    assert_eq!(t.statuses.stacks(StatusKind::Frozen), 70);
}

#[test]
fn test_burn_threshold_breaks_armor_exactly_once() {
    let mut t = target(100_000.0, 0.0);
    let attack = hit(1.0, Element::Thermal);
    let mut breaks = 0;
    let mut rng = rng();

    // Ten thermal hits over one second, with statuses ticking in between.
    for _ in 0..10 {
        t.statuses.tick(0.1);
        let outcome = resolve_attack(&attack, &mut t, &mut rng);
        if outcome.armor_broken {
            breaks += 1;
            assert!(t.statuses.stacks(StatusKind::Burning) >= BURN_ARMOR_BREAK_THRESHOLD);
        }
    }
    assert_eq!(breaks, 1);
    assert!(t.statuses.is_active(StatusKind::ArmorBroken));
    assert!(t.statuses.stacks(StatusKind::Burning) <= MAX_STACKS);
}

#[test]
fn test_guaranteed_crit_uses_multiplier() {
    let mut t = target(1000.0, 0.0);
    let attack = AttackProfile { crit_chance: 1.0, crit_multiplier: 2.5, ..hit(10.0, Element::Physical) };
    let outcome = resolve_attack(&attack, &mut t, &mut rng());
    assert!(outcome.crit);
    assert!((outcome.damage - 25.0).abs() < 1e-4);
    assert!(t.last_hit_crit);
}
