//! Unit production queue: per-kind timed builds gated by resource costs,
//! build caps and the colony population cap.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::game::unit::UnitKind;

use super::grafting::Loadout;
use super::resources::{ColonyResources, Cost, ResourceCaps, ResourceKind};

pub const BASE_BUILD_CAP: u32 = 10;
pub const BUILD_CAP_PER_LEVEL: u32 = 5;
pub const EFFICIENCY_STEP: f64 = 0.05;
pub const MIN_EFFICIENCY_FACTOR: f64 = 0.5;
pub const MAX_EFFICIENCY_LEVEL: u32 = 10;
/// Fraction of matter costs returned when a stockpile is digested.
pub const REFUND_RATE: f64 = 0.8;

/// Undiscounted cost and build time of one unit.
pub fn build_spec(kind: UnitKind) -> (Cost, f32) {
    let cost = |biomass, minerals, energy| Cost { biomass, minerals, energy, dna: 0.0, larva: 1.0 };
    match kind {
        UnitKind::Melee => (cost(15.0, 0.0, 0.0), 2.0),
        UnitKind::Ranged => (cost(25.0, 15.0, 0.0), 3.0),
        UnitKind::Queen => (cost(150.0, 50.0, 20.0), 10.0),
        _ => (Cost::default(), 0.0),
    }
}

// ============================================================================
// Unit Entries
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitEntry {
    pub kind: UnitKind,
    /// Stat level, starting at 1.
    pub level: u32,
    pub cap_level: u32,
    pub efficiency_level: u32,
    pub producing: bool,
    /// Seconds of build time accumulated toward the next unit.
    pub progress: f32,
    /// Production ratio in `[0, 1]`; scales build speed.
    pub weight: f32,
    /// Units held at the hive, not yet deployed.
    pub stockpile: u32,
    pub loadout: Loadout,
}

impl Default for UnitEntry {
    fn default() -> Self {
        UnitEntry::new(UnitKind::Melee)
    }
}

impl UnitEntry {
    pub fn new(kind: UnitKind) -> Self {
        UnitEntry {
            kind,
            level: 1,
            cap_level: 0,
            efficiency_level: 0,
            producing: true,
            progress: 0.0,
            weight: 1.0,
            stockpile: 0,
            loadout: Loadout::for_kind(kind),
        }
    }

    pub fn build_cap(&self) -> u32 {
        BASE_BUILD_CAP + self.cap_level * BUILD_CAP_PER_LEVEL
    }

    pub fn discount(&self) -> f64 {
        (1.0 - EFFICIENCY_STEP * self.efficiency_level as f64).max(MIN_EFFICIENCY_FACTOR)
    }

    pub fn unit_cost(&self) -> Cost {
        build_spec(self.kind).0.discounted(self.discount())
    }

    pub fn build_time(&self) -> f32 {
        build_spec(self.kind).1 * self.discount() as f32
    }

    pub fn level_cost(&self) -> Cost {
        Cost::biomass((100.0 * 1.5f64.powi(self.level as i32 - 1)).floor())
    }

    pub fn cap_upgrade_cost(&self) -> Cost {
        Cost::dna(5.0 * 2f64.powi(self.cap_level as i32))
    }

    pub fn efficiency_upgrade_cost(&self) -> Option<Cost> {
        (self.efficiency_level < MAX_EFFICIENCY_LEVEL)
            .then(|| Cost::dna(10.0 * 2f64.powi(self.efficiency_level as i32)))
    }
}

// ============================================================================
// Hatchery
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hatchery {
    pub entries: Vec<UnitEntry>,
}

impl Default for Hatchery {
    fn default() -> Self {
        let mut entries: Vec<UnitEntry> = UnitKind::SWARM.iter().map(|k| UnitEntry::new(*k)).collect();
        if let Some(melee) = entries.first_mut() {
            melee.stockpile = 5;
        }
        Hatchery { entries }
    }
}

impl Hatchery {
    pub fn entry(&self, kind: UnitKind) -> Option<&UnitEntry> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    pub fn entry_mut(&mut self, kind: UnitKind) -> Option<&mut UnitEntry> {
        self.entries.iter_mut().find(|e| e.kind == kind)
    }

    pub fn stockpile(&self, kind: UnitKind) -> u32 {
        self.entry(kind).map_or(0, |e| e.stockpile)
    }

    pub fn total_stockpile(&self) -> u32 {
        self.entries.iter().map(|e| e.stockpile).sum()
    }

    /// Take one unit out of the stockpile for deployment.
    pub fn take(&mut self, kind: UnitKind) -> bool {
        match self.entry_mut(kind) {
            Some(entry) if entry.stockpile > 0 => {
                entry.stockpile -= 1;
                true
            }
            _ => false,
        }
    }

    /// Repair a loaded roster: one entry per swarm kind in canonical order,
    /// loadouts sized to their slot layouts.
    pub fn normalize(&mut self) {
        let mut entries = Vec::with_capacity(UnitKind::SWARM.len());
        for kind in UnitKind::SWARM {
            let mut entry = self
                .entries
                .iter()
                .find(|e| e.kind == kind)
                .cloned()
                .unwrap_or_else(|| UnitEntry::new(kind));
            entry.loadout.normalize(kind);
            entry.level = entry.level.max(1);
            entry.weight = entry.weight.clamp(0.0, 1.0);
            entry.progress = entry.progress.max(0.0);
            entry.stockpile = entry.stockpile.min(entry.build_cap());
            entries.push(entry);
        }
        self.entries = entries;
    }

    /// Advance every producing entry by `dt` seconds.
    ///
    /// An entry whose cost is not currently affordable keeps its progress and
    /// waits. Costs are deducted in full only when a unit completes.
    pub fn step(
        &mut self,
        resources: &mut ColonyResources,
        caps: &ResourceCaps,
        population_cap: u32,
        dt: f32,
    ) -> SmallVec<[UnitKind; 3]> {
        let mut produced = SmallVec::new();
        let mut total = self.total_stockpile();

        for entry in self.entries.iter_mut() {
            if !entry.producing || entry.weight <= 0.0 {
                continue;
            }
            if entry.stockpile >= entry.build_cap() || total >= population_cap {
                continue;
            }
            let cost = entry.unit_cost();
            if !resources.can_afford(&cost) {
                continue;
            }

            entry.progress += dt * entry.weight;
            if entry.progress >= entry.build_time() && resources.spend(&cost, caps) {
                entry.stockpile += 1;
                entry.progress = 0.0;
                total += 1;
                produced.push(entry.kind);
            }
        }
        produced
    }

    /// Liquidate every stockpile for a partial refund of matter costs.
    /// Returns the refund that was credited.
    pub fn digest(&mut self, resources: &mut ColonyResources, caps: &ResourceCaps) -> Cost {
        let mut refund = Cost::default();
        for entry in self.entries.iter_mut() {
            let n = entry.stockpile as f64;
            if n == 0.0 {
                continue;
            }
            let (base, _) = build_spec(entry.kind);
            refund.biomass += n * base.biomass * REFUND_RATE;
            refund.minerals += n * base.minerals * REFUND_RATE;
            refund.energy += n * base.energy * REFUND_RATE;
            entry.stockpile = 0;
        }
        resources.modify(ResourceKind::Biomass, refund.biomass, caps);
        resources.modify(ResourceKind::Minerals, refund.minerals, caps);
        resources.modify(ResourceKind::Energy, refund.energy, caps);
        refund
    }
}
