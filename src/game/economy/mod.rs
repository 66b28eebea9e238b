//! Colony economy: resources, the production graph, the hatchery and the
//! modifier inventory, owned together as the [`Colony`] resource.
//!
//! Every operation here is a plain method that returns `bool` (or an
//! outcome) instead of failing, so the command layer can forward the
//! result straight back to the caller.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::game::battle::RunModifiers;
use crate::game::unit::{UnitKind, UnitStats};
use crate::game::world::WorldProgress;

pub mod grafting;
pub mod hatchery;
pub mod production;
pub mod resources;

pub use grafting::{LoadoutBonus, ModifierId, ModifierInventory, ModifierKind};
pub use hatchery::{Hatchery, UnitEntry};
pub use production::{FacilityKind, ProductionGraph};
pub use resources::{ColonyResources, Cost, ResourceCaps, ResourceKind};

/// Offline time below this is ignored.
pub const OFFLINE_THRESHOLD_SECS: f64 = 60.0;
/// Share of full mining output granted while away.
pub const OFFLINE_MINING_RATE: f64 = 0.5;

// ============================================================================
// Player Profile
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub music: bool,
    pub sfx: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings { music: true, sfx: true }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerProfile {
    /// Unix milliseconds of the last save.
    pub last_save_ms: i64,
    pub prestige_level: u32,
    pub settings: Settings,
}

// ============================================================================
// Colony
// ============================================================================

/// What one economy tick did, for logging and events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EconomyReport {
    pub produced: SmallVec<[UnitKind; 3]>,
    pub overheated: SmallVec<[FacilityKind; 2]>,
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct Colony {
    pub resources: ColonyResources,
    pub facilities: ProductionGraph,
    pub hatchery: Hatchery,
    pub inventory: ModifierInventory,
    pub world: WorldProgress,
    pub profile: PlayerProfile,
}

impl Default for Colony {
    fn default() -> Self {
        let mut inventory = ModifierInventory::default();
        inventory.add(ModifierKind::ChitinGrowth);
        Colony {
            resources: ColonyResources::default(),
            facilities: ProductionGraph::default(),
            hatchery: Hatchery::default(),
            inventory,
            world: WorldProgress::default(),
            profile: PlayerProfile::default(),
        }
    }
}

impl Colony {
    pub fn caps(&self) -> ResourceCaps {
        self.facilities.caps()
    }

    /// Add to a resource within its cap. Returns the change applied.
    pub fn credit(&mut self, kind: ResourceKind, amount: f64) -> f64 {
        let caps = self.caps();
        self.resources.modify(kind, amount, &caps)
    }

    fn pay(&mut self, cost: &Cost) -> bool {
        let caps = self.caps();
        self.resources.spend(cost, &caps)
    }

    /// Run converters, then the hatchery, for `dt` seconds scaled by `rate`.
    pub fn step(&mut self, dt: f32, rate: f32) -> EconomyReport {
        let dt = (dt * rate.max(0.0)) as f64;
        let queens = self.hatchery.stockpile(UnitKind::Queen);
        let conversions = self.facilities.step(&mut self.resources, queens, dt);

        let caps = self.caps();
        let population_cap = self.facilities.population_cap();
        let produced = self.hatchery.step(&mut self.resources, &caps, population_cap, dt as f32);

        EconomyReport {
            produced,
            overheated: conversions
                .iter()
                .filter(|(_, c)| c.overheated)
                .map(|(kind, _)| *kind)
                .collect(),
        }
    }

    // ------------------------------------------------------------------------
    // Production settings
    // ------------------------------------------------------------------------

    pub fn set_weight(&mut self, kind: UnitKind, weight: f32) -> bool {
        if weight.is_nan() {
            return false;
        }
        let Some(entry) = self.hatchery.entry_mut(kind) else { return false };
        entry.weight = weight.clamp(0.0, 1.0);
        true
    }

    pub fn set_producing(&mut self, kind: UnitKind, producing: bool) -> bool {
        let Some(entry) = self.hatchery.entry_mut(kind) else { return false };
        entry.producing = producing;
        true
    }

    // ------------------------------------------------------------------------
    // Upgrades
    // ------------------------------------------------------------------------

    pub fn upgrade_unit(&mut self, kind: UnitKind) -> bool {
        let Some(cost) = self.hatchery.entry(kind).map(UnitEntry::level_cost) else { return false };
        if !self.pay(&cost) {
            return false;
        }
        if let Some(entry) = self.hatchery.entry_mut(kind) {
            entry.level += 1;
            info!("[ECONOMY] {:?} upgraded to level {}", kind, entry.level);
        }
        true
    }

    pub fn upgrade_unit_cap(&mut self, kind: UnitKind) -> bool {
        let Some(cost) = self.hatchery.entry(kind).map(UnitEntry::cap_upgrade_cost) else { return false };
        if !self.pay(&cost) {
            return false;
        }
        if let Some(entry) = self.hatchery.entry_mut(kind) {
            entry.cap_level += 1;
        }
        true
    }

    pub fn upgrade_efficiency(&mut self, kind: UnitKind) -> bool {
        let Some(cost) = self.hatchery.entry(kind).and_then(UnitEntry::efficiency_upgrade_cost) else {
            return false;
        };
        if !self.pay(&cost) {
            return false;
        }
        if let Some(entry) = self.hatchery.entry_mut(kind) {
            entry.efficiency_level += 1;
        }
        true
    }

    pub fn upgrade_facility(&mut self, kind: FacilityKind) -> bool {
        let count = self.facilities.tier(kind).count;
        let cost = Cost::biomass(kind.next_cost(count));
        if !self.pay(&cost) {
            return false;
        }
        self.facilities.tier_mut(kind).count += 1;
        info!("[ECONOMY] built {:?} #{} for {:.0} biomass", kind, count + 1, cost.biomass);
        true
    }

    // ------------------------------------------------------------------------
    // Stockpile, prestige
    // ------------------------------------------------------------------------

    /// Liquidate every stockpile. Returns the refund.
    pub fn digest(&mut self) -> Cost {
        let caps = self.caps();
        let refund = self.hatchery.digest(&mut self.resources, &caps);
        info!(
            "[ECONOMY] digested stockpile for {:.1} biomass, {:.1} minerals, {:.1} energy",
            refund.biomass, refund.minerals, refund.energy
        );
        refund
    }

    /// Mutagen a prestige would pay right now.
    pub fn prestige_reward(&self) -> f64 {
        (self.resources.biomass / 10.0).sqrt().floor()
    }

    /// Reset to a fresh colony, keeping mutagen (plus the reward), the
    /// modifier inventory and settings. A zero reward does nothing.
    pub fn prestige(&mut self) -> bool {
        let reward = self.prestige_reward();
        if reward <= 0.0 {
            return false;
        }

        let mut next = Colony {
            inventory: std::mem::take(&mut self.inventory),
            ..Colony::default()
        };
        next.resources.mutagen = self.resources.mutagen + reward;
        next.profile = PlayerProfile {
            prestige_level: self.profile.prestige_level + 1,
            ..self.profile
        };
        info!(
            "[ECONOMY] prestige {} for {} mutagen (total {})",
            next.profile.prestige_level, reward, next.resources.mutagen
        );
        *self = next;
        true
    }

    // ------------------------------------------------------------------------
    // Grafting
    // ------------------------------------------------------------------------

    pub fn add_modifier(&mut self, kind: ModifierKind) -> ModifierId {
        self.inventory.add(kind)
    }

    pub fn equip(&mut self, kind: UnitKind, slot: usize, id: Option<ModifierId>) -> bool {
        grafting::equip(&mut self.hatchery.entries, &self.inventory, kind, slot, id)
    }

    /// Spend biomass to raise an instance one rank.
    pub fn fuse(&mut self, id: ModifierId) -> bool {
        let Some(instance) = self.inventory.get(id).copied() else { return false };
        if instance.rank >= grafting::MAX_RANK {
            return false;
        }
        if !self.pay(&Cost::biomass(grafting::fuse_cost(instance.rank))) {
            return false;
        }
        self.inventory.rank_up(id).is_some()
    }

    /// Spawn stats for `kind` under the current levels, loadouts and run.
    pub fn unit_stats(&self, kind: UnitKind, run: &RunModifiers) -> UnitStats {
        let Some(entry) = self.hatchery.entry(kind) else {
            return UnitStats::base(kind);
        };
        let bonus = LoadoutBonus::from_instances(entry.loadout.equipped(&self.inventory));
        UnitStats::for_swarm(kind, entry.level, &bonus, run, self.resources.mutagen)
    }

    // ------------------------------------------------------------------------
    // Persistence hooks
    // ------------------------------------------------------------------------

    /// Credit time spent away. Returns the minerals granted, if any.
    pub fn apply_offline(&mut self, elapsed_secs: f64) -> Option<f64> {
        if !(elapsed_secs > OFFLINE_THRESHOLD_SECS) {
            return None;
        }
        let minerals = self.facilities.mining_rate() * elapsed_secs * OFFLINE_MINING_RATE;
        let gained = self.credit(ResourceKind::Minerals, minerals);
        let larva_cap = self.caps().larva;
        self.resources.larva = larva_cap;
        info!("[ECONOMY] offline for {:.0}s: +{:.0} minerals, larva refilled", elapsed_secs, gained);
        Some(gained)
    }

    /// Repair a freshly loaded colony so every invariant holds again.
    pub fn normalize(&mut self) {
        self.hatchery.normalize();
        self.world.normalize();
        let caps = self.caps();
        self.resources.clamp_all(&caps);
    }
}
