//! Bio-modifier grafting: the modifier catalogue, owned instances, and
//! per-kind loadouts with polarity-discounted load budgets.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::game::unit::{Element, UnitKind};

use super::hatchery::UnitEntry;

// ============================================================================
// Catalogue
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    Attack,
    Defense,
    Function,
    /// Accepts every modifier at the discounted load.
    Universal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stat {
    Health,
    Damage,
    Speed,
    AttackSpeed,
    CritChance,
    CritDamage,
    /// Converts the carrier's attacks to `Element` and adds the value as damage.
    Elemental(Element),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatLine {
    pub stat: Stat,
    /// Fractional bonus at rank 0.
    pub value: f32,
}

#[derive(Debug)]
pub struct ModifierDef {
    pub kind: ModifierKind,
    pub name: &'static str,
    pub polarity: Polarity,
    pub base_cost: u32,
    pub stats: &'static [StatLine],
}

pub const COST_PER_RANK: u32 = 1;
pub const MAX_RANK: u8 = 5;
pub const STAT_GROWTH: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierKind {
    ChitinGrowth,
    GiantVentricle,
    AdiposeBuffer,
    BoneDensification,
    CrystalMembrane,
    AdrenalGland,
    TwitchFibers,
    SerratedClaws,
    BerserkPituitary,
    CheetahTendon,
    CompoundEyes,
    HyperSecretion,
    WeakpointScan,
    SynapticAccel,
    VenomSac,
    CombustionLung,
    CryoVessels,
    VoltaicSpines,
    PlagueTouch,
    HighVoltage,
}

const fn line(stat: Stat, value: f32) -> StatLine {
    StatLine { stat, value }
}

const fn def(
    kind: ModifierKind,
    name: &'static str,
    polarity: Polarity,
    base_cost: u32,
    stats: &'static [StatLine],
) -> ModifierDef {
    ModifierDef { kind, name, polarity, base_cost, stats }
}

/// Indexed by `ModifierKind as usize`.
static MODIFIER_TABLE: [ModifierDef; 20] = {
    use ModifierKind::*;
    use Polarity::*;
    [
        def(ChitinGrowth, "chitin_growth", Defense, 6, &[line(Stat::Health, 0.2)]),
        def(GiantVentricle, "giant_ventricle", Defense, 6, &[line(Stat::Health, 0.3)]),
        def(AdiposeBuffer, "adipose_buffer", Defense, 8, &[line(Stat::Health, 0.075)]),
        def(BoneDensification, "bone_densification", Defense, 9, &[line(Stat::Health, 0.2)]),
        def(CrystalMembrane, "crystal_membrane", Defense, 10, &[line(Stat::Health, 0.15)]),
        def(AdrenalGland, "adrenal_gland", Attack, 10, &[line(Stat::Damage, 0.275)]),
        def(TwitchFibers, "twitch_fibers", Attack, 8, &[line(Stat::AttackSpeed, 0.1)]),
        def(SerratedClaws, "serrated_claws", Attack, 9, &[line(Stat::CritDamage, 0.2)]),
        def(
            BerserkPituitary,
            "berserk_pituitary",
            Attack,
            12,
            &[line(Stat::Damage, 0.33), line(Stat::AttackSpeed, -0.05)],
        ),
        def(CheetahTendon, "cheetah_tendon", Attack, 7, &[line(Stat::Speed, 0.066)]),
        def(CompoundEyes, "compound_eyes", Function, 9, &[line(Stat::CritChance, 0.25)]),
        def(
            HyperSecretion,
            "hyper_secretion",
            Function,
            7,
            &[line(Stat::Elemental(Element::Toxin), 0.15)],
        ),
        def(
            WeakpointScan,
            "weakpoint_scan",
            Function,
            11,
            &[line(Stat::CritChance, 0.1), line(Stat::CritDamage, 0.1)],
        ),
        def(
            SynapticAccel,
            "synaptic_accel",
            Function,
            8,
            &[line(Stat::AttackSpeed, 0.066), line(Stat::Speed, 0.033)],
        ),
        def(VenomSac, "venom_sac", Function, 7, &[line(Stat::Elemental(Element::Toxin), 0.15)]),
        def(
            CombustionLung,
            "combustion_lung",
            Attack,
            7,
            &[line(Stat::Elemental(Element::Thermal), 0.15)],
        ),
        def(CryoVessels, "cryo_vessels", Defense, 7, &[line(Stat::Elemental(Element::Cryo), 0.15)]),
        def(
            VoltaicSpines,
            "voltaic_spines",
            Function,
            7,
            &[line(Stat::Elemental(Element::Voltaic), 0.15)],
        ),
        def(PlagueTouch, "plague_touch", Function, 9, &[line(Stat::Elemental(Element::Toxin), 0.1)]),
        def(
            HighVoltage,
            "high_voltage",
            Function,
            9,
            &[line(Stat::Elemental(Element::Voltaic), 0.1)],
        ),
    ]
};

impl ModifierKind {
    pub fn def(self) -> &'static ModifierDef {
        &MODIFIER_TABLE[self as usize]
    }
}

// ============================================================================
// Instances & Inventory
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifierId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModifierInstance {
    pub id: ModifierId,
    pub kind: ModifierKind,
    pub rank: u8,
}

impl ModifierInstance {
    /// Load this instance costs in a slot of the given polarity.
    pub fn load_in(&self, slot: Polarity) -> u32 {
        let def = self.kind.def();
        let raw = def.base_cost + self.rank as u32 * COST_PER_RANK;
        if slot == Polarity::Universal || slot == def.polarity {
            raw.div_ceil(2)
        } else {
            raw
        }
    }

    fn rank_multiplier(&self) -> f32 {
        1.0 + self.rank as f32 * STAT_GROWTH
    }
}

/// Every modifier the colony owns, equipped or not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierInventory {
    instances: FxHashMap<ModifierId, ModifierInstance>,
    next_id: u32,
}

impl ModifierInventory {
    /// Mint a fresh rank-0 instance.
    pub fn add(&mut self, kind: ModifierKind) -> ModifierId {
        // Skip ids an older record may already hold.
        while self.instances.contains_key(&ModifierId(self.next_id)) {
            self.next_id += 1;
        }
        let id = ModifierId(self.next_id);
        self.next_id += 1;
        self.instances.insert(id, ModifierInstance { id, kind, rank: 0 });
        id
    }

    pub fn get(&self, id: ModifierId) -> Option<&ModifierInstance> {
        self.instances.get(&id)
    }

    pub fn contains(&self, id: ModifierId) -> bool {
        self.instances.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Instances ordered by id.
    pub fn sorted(&self) -> Vec<ModifierInstance> {
        let mut all: Vec<_> = self.instances.values().copied().collect();
        all.sort_by_key(|m| m.id);
        all
    }

    /// Raise an instance's rank. Returns the new rank, or `None` at max rank.
    pub(crate) fn rank_up(&mut self, id: ModifierId) -> Option<u8> {
        let instance = self.instances.get_mut(&id)?;
        if instance.rank >= MAX_RANK {
            return None;
        }
        instance.rank += 1;
        Some(instance.rank)
    }
}

/// Biomass needed to fuse an instance currently at `rank`.
pub fn fuse_cost(rank: u8) -> f64 {
    50.0 * (rank as f64 + 1.0)
}

// ============================================================================
// Loadouts
// ============================================================================

pub fn slot_layout(kind: UnitKind) -> &'static [Polarity] {
    use Polarity::*;
    match kind {
        UnitKind::Melee => &[Attack, Defense, Attack, Function, Universal],
        UnitKind::Ranged => &[Attack, Defense, Function, Function, Universal],
        UnitKind::Queen => &[Universal, Function, Defense],
        _ => &[],
    }
}

pub fn load_capacity(kind: UnitKind) -> u32 {
    match kind {
        UnitKind::Queen => 50,
        UnitKind::Melee | UnitKind::Ranged => 30,
        _ => 0,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Loadout(pub SmallVec<[Option<ModifierId>; 5]>);

impl Loadout {
    pub fn for_kind(kind: UnitKind) -> Self {
        Loadout(SmallVec::from_elem(None, slot_layout(kind).len()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pad or truncate to the kind's slot layout.
    pub fn normalize(&mut self, kind: UnitKind) {
        self.0.resize(slot_layout(kind).len(), None);
    }

    pub fn remove(&mut self, id: ModifierId) {
        for slot in self.0.iter_mut() {
            if *slot == Some(id) {
                *slot = None;
            }
        }
    }

    pub fn contains(&self, id: ModifierId) -> bool {
        self.0.iter().any(|s| *s == Some(id))
    }

    /// Total load of equipped instances. Dangling ids cost nothing.
    pub fn load(&self, kind: UnitKind, inventory: &ModifierInventory) -> u32 {
        self.0
            .iter()
            .zip(slot_layout(kind))
            .filter_map(|(slot, polarity)| {
                let instance = inventory.get((*slot)?)?;
                Some(instance.load_in(*polarity))
            })
            .sum()
    }

    pub fn equipped<'a>(
        &'a self,
        inventory: &'a ModifierInventory,
    ) -> impl Iterator<Item = &'a ModifierInstance> + 'a {
        self.0.iter().filter_map(move |slot| inventory.get((*slot)?))
    }
}

/// Put `id` (or nothing) into `slot` of `kind`'s loadout.
///
/// The instance is pulled out of any other slot first. The whole candidate
/// set of loadouts is validated against load capacity before anything is
/// committed, so a rejected equip leaves every loadout untouched.
pub fn equip(
    entries: &mut [UnitEntry],
    inventory: &ModifierInventory,
    kind: UnitKind,
    slot: usize,
    id: Option<ModifierId>,
) -> bool {
    if let Some(id) = id {
        if !inventory.contains(id) {
            return false;
        }
    }
    let Some(target) = entries.iter().position(|e| e.kind == kind) else {
        return false;
    };

    let mut candidate: Vec<Loadout> = entries.iter().map(|e| e.loadout.clone()).collect();
    if let Some(id) = id {
        for loadout in candidate.iter_mut() {
            loadout.remove(id);
        }
    }
    let Some(cell) = candidate.get_mut(target).and_then(|l| l.0.get_mut(slot)) else {
        return false;
    };
    *cell = id;

    let fits = entries
        .iter()
        .zip(&candidate)
        .all(|(entry, loadout)| loadout.load(entry.kind, inventory) <= load_capacity(entry.kind));
    if !fits {
        return false;
    }

    for (entry, loadout) in entries.iter_mut().zip(candidate) {
        entry.loadout = loadout;
    }
    true
}

// ============================================================================
// Stat Bonuses
// ============================================================================

/// Summed fractional bonuses of a loadout.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadoutBonus {
    pub health: f32,
    pub damage: f32,
    pub speed: f32,
    pub attack_speed: f32,
    pub crit_chance: f32,
    pub crit_damage: f32,
    pub element: Option<Element>,
}

impl LoadoutBonus {
    pub fn from_instances<'a>(instances: impl IntoIterator<Item = &'a ModifierInstance>) -> Self {
        let mut bonus = LoadoutBonus::default();
        for instance in instances {
            let mult = instance.rank_multiplier();
            for line in instance.kind.def().stats {
                let value = line.value * mult;
                match line.stat {
                    Stat::Health => bonus.health += value,
                    Stat::Damage => bonus.damage += value,
                    Stat::Speed => bonus.speed += value,
                    Stat::AttackSpeed => bonus.attack_speed += value,
                    Stat::CritChance => bonus.crit_chance += value,
                    Stat::CritDamage => bonus.crit_damage += value,
                    Stat::Elemental(element) => {
                        bonus.element = Some(element);
                        bonus.damage += value;
                    }
                }
            }
        }
        bonus
    }
}

#[cfg(test)]
#[path = "grafting_tests.rs"]
mod tests;
