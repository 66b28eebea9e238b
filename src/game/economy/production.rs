//! Production graph: tiered converters that turn one colony resource into
//! another at a bounded, facility-scaled rate.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::resources::{ColonyResources, ResourceCaps, ResourceKind};

pub const BASE_STORAGE_CAP: f64 = 2000.0;
pub const STORAGE_PER_FACILITY: f64 = 2000.0;
pub const LARVA_CAP: f64 = 10.0;
pub const BASE_POPULATION_CAP: u32 = 200;
pub const POPULATION_PER_FACILITY: u32 = 50;
/// Larva per second contributed by every queen held in the stockpile.
pub const QUEEN_LARVA_RATE: f64 = 0.2;

// ============================================================================
// Facility Catalogue
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacilityKind {
    Mining,
    Digestion,
    Centrifuge,
    Reactor,
    HiveCore,
    Storage,
    Supply,
}

/// Heat model for converters that overheat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatSpec {
    pub gain_per_sec: f64,
    pub threshold: f64,
    pub cool_per_sec: f64,
}

/// Per-facility conversion rates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flow {
    pub input: Option<(ResourceKind, f64)>,
    pub output: (ResourceKind, f64),
    /// Emit only whole units, carrying the fraction forward.
    pub discrete: bool,
    pub heat: Option<HeatSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacilitySpec {
    pub base_cost: f64,
    pub growth: f64,
    /// Facilities every colony starts with. They are free and not counted in pricing.
    pub starter: u32,
    pub flow: Option<Flow>,
}

impl FacilityKind {
    /// Converters in the order they run each tick.
    pub const CONVERTERS: [FacilityKind; 5] = [
        FacilityKind::Mining,
        FacilityKind::Digestion,
        FacilityKind::Centrifuge,
        FacilityKind::Reactor,
        FacilityKind::HiveCore,
    ];

    pub fn spec(self) -> FacilitySpec {
        use ResourceKind::*;
        let flow = |input, output| Flow { input, output, discrete: false, heat: None };
        match self {
            FacilityKind::Mining => FacilitySpec {
                base_cost: 50.0,
                growth: 1.5,
                starter: 1,
                flow: Some(flow(None, (Minerals, 5.0))),
            },
            FacilityKind::Digestion => FacilitySpec {
                base_cost: 100.0,
                growth: 1.6,
                starter: 1,
                flow: Some(flow(Some((Minerals, 4.0)), (Biomass, 3.0))),
            },
            FacilityKind::Centrifuge => FacilitySpec {
                base_cost: 500.0,
                growth: 2.0,
                starter: 0,
                flow: Some(Flow { discrete: true, ..flow(Some((Biomass, 10.0)), (Dna, 0.1)) }),
            },
            FacilityKind::Reactor => FacilitySpec {
                base_cost: 150.0,
                growth: 1.7,
                starter: 0,
                flow: Some(Flow {
                    heat: Some(HeatSpec { gain_per_sec: 8.0, threshold: 100.0, cool_per_sec: 20.0 }),
                    ..flow(Some((Biomass, 2.0)), (Energy, 1.0))
                }),
            },
            FacilityKind::HiveCore => FacilitySpec {
                base_cost: 200.0,
                growth: 1.8,
                starter: 1,
                flow: Some(flow(Some((Biomass, 1.0)), (Larva, 0.2))),
            },
            FacilityKind::Storage => FacilitySpec { base_cost: 100.0, growth: 1.5, starter: 0, flow: None },
            FacilityKind::Supply => FacilitySpec { base_cost: 250.0, growth: 1.5, starter: 0, flow: None },
        }
    }

    /// Biomass price of the next facility when `count` are owned.
    pub fn next_cost(self, count: u32) -> f64 {
        let spec = self.spec();
        let purchased = count.saturating_sub(spec.starter);
        (spec.base_cost * spec.growth.powi(purchased as i32)).floor()
    }
}

// ============================================================================
// Facility State
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacilityTier {
    pub count: u32,
    /// Fractional output not yet emitted (discrete converters).
    pub accumulator: f64,
    pub heat: f64,
    pub overheated: bool,
}

impl FacilityTier {
    fn starter(kind: FacilityKind) -> Self {
        FacilityTier { count: kind.spec().starter, ..Default::default() }
    }
}

/// What one converter did during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Conversion {
    pub efficiency: f64,
    pub consumed: f64,
    pub produced: f64,
    /// True on the tick the converter crossed its heat threshold.
    pub overheated: bool,
}

/// Run one converter for `dt` seconds.
///
/// Output is bounded by `count × rate × dt` and scaled by the fraction of the
/// required input that is actually available, and by the room left in the
/// output store. Nothing is consumed while that store is already full.
pub fn run_converter(
    kind: FacilityKind,
    tier: &mut FacilityTier,
    resources: &mut ColonyResources,
    caps: &ResourceCaps,
    dt: f64,
) -> Conversion {
    let Some(flow) = kind.spec().flow else {
        return Conversion::default();
    };
    if tier.count == 0 || dt <= 0.0 {
        return Conversion::default();
    }

    if tier.overheated {
        let cool = flow.heat.map_or(f64::INFINITY, |h| h.cool_per_sec);
        tier.heat = (tier.heat - cool * dt).max(0.0);
        if tier.heat <= 0.0 {
            tier.overheated = false;
            debug!("[ECONOMY] {:?} cooled down", kind);
        }
        return Conversion::default();
    }

    let (out_kind, out_rate) = flow.output;
    if resources.get(out_kind) >= caps.cap(out_kind) {
        return Conversion::default();
    }

    let count = tier.count as f64;
    let starved = match flow.input {
        Some((in_kind, in_rate)) => {
            let required = in_rate * count * dt;
            if required > 0.0 {
                (resources.get(in_kind) / required).min(1.0)
            } else {
                1.0
            }
        }
        None => 1.0,
    };
    // Near the cap, only draw the input the remaining headroom can hold.
    let headroom = caps.cap(out_kind) - resources.get(out_kind);
    let full_output = out_rate * count * dt;
    let efficiency = if full_output > 0.0 {
        starved.min(headroom / full_output)
    } else {
        starved
    };
    if efficiency <= 0.0 {
        return Conversion::default();
    }

    let consumed = match flow.input {
        Some((in_kind, in_rate)) => -resources.modify(in_kind, -(in_rate * count * dt * efficiency), caps),
        None => 0.0,
    };

    let nominal = out_rate * count * dt * efficiency;
    let emitted = if flow.discrete {
        tier.accumulator += nominal;
        let whole = tier.accumulator.floor();
        tier.accumulator -= whole;
        whole
    } else {
        nominal
    };
    let produced = if emitted > 0.0 {
        resources.modify(out_kind, emitted, caps)
    } else {
        0.0
    };

    let mut overheated = false;
    if let Some(heat) = flow.heat {
        tier.heat += heat.gain_per_sec * dt * efficiency;
        if tier.heat >= heat.threshold {
            tier.overheated = true;
            overheated = true;
            info!("[ECONOMY] {:?} overheated at {:.1} heat", kind, tier.heat);
        }
    }

    Conversion { efficiency, consumed, produced, overheated }
}

// ============================================================================
// Production Graph
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionGraph {
    pub mining: FacilityTier,
    pub digestion: FacilityTier,
    pub centrifuge: FacilityTier,
    pub reactor: FacilityTier,
    pub hive_core: FacilityTier,
    pub storage: FacilityTier,
    pub supply: FacilityTier,
}

impl Default for ProductionGraph {
    fn default() -> Self {
        Self {
            mining: FacilityTier::starter(FacilityKind::Mining),
            digestion: FacilityTier::starter(FacilityKind::Digestion),
            centrifuge: FacilityTier::starter(FacilityKind::Centrifuge),
            reactor: FacilityTier::starter(FacilityKind::Reactor),
            hive_core: FacilityTier::starter(FacilityKind::HiveCore),
            storage: FacilityTier::starter(FacilityKind::Storage),
            supply: FacilityTier::starter(FacilityKind::Supply),
        }
    }
}

impl ProductionGraph {
    pub fn tier(&self, kind: FacilityKind) -> &FacilityTier {
        match kind {
            FacilityKind::Mining => &self.mining,
            FacilityKind::Digestion => &self.digestion,
            FacilityKind::Centrifuge => &self.centrifuge,
            FacilityKind::Reactor => &self.reactor,
            FacilityKind::HiveCore => &self.hive_core,
            FacilityKind::Storage => &self.storage,
            FacilityKind::Supply => &self.supply,
        }
    }

    pub fn tier_mut(&mut self, kind: FacilityKind) -> &mut FacilityTier {
        match kind {
            FacilityKind::Mining => &mut self.mining,
            FacilityKind::Digestion => &mut self.digestion,
            FacilityKind::Centrifuge => &mut self.centrifuge,
            FacilityKind::Reactor => &mut self.reactor,
            FacilityKind::HiveCore => &mut self.hive_core,
            FacilityKind::Storage => &mut self.storage,
            FacilityKind::Supply => &mut self.supply,
        }
    }

    pub fn caps(&self) -> ResourceCaps {
        ResourceCaps {
            storage: BASE_STORAGE_CAP + self.storage.count as f64 * STORAGE_PER_FACILITY,
            larva: LARVA_CAP,
        }
    }

    pub fn population_cap(&self) -> u32 {
        BASE_POPULATION_CAP + self.supply.count * POPULATION_PER_FACILITY
    }

    /// Minerals per second at full efficiency.
    pub fn mining_rate(&self) -> f64 {
        let rate = FacilityKind::Mining
            .spec()
            .flow
            .map_or(0.0, |f| f.output.1);
        self.mining.count as f64 * rate
    }

    /// Run every converter once, in tier order. `queens` is the number of
    /// queens held in the stockpile.
    pub fn step(
        &mut self,
        resources: &mut ColonyResources,
        queens: u32,
        dt: f64,
    ) -> SmallVec<[(FacilityKind, Conversion); 5]> {
        let caps = self.caps();
        let mut report = SmallVec::new();
        for kind in FacilityKind::CONVERTERS {
            let conversion = run_converter(kind, self.tier_mut(kind), resources, &caps, dt);
            report.push((kind, conversion));
        }
        if queens > 0 {
            resources.modify(ResourceKind::Larva, queens as f64 * QUEEN_LARVA_RATE * dt, &caps);
        }
        report
    }
}

#[cfg(test)]
#[path = "production_tests.rs"]
mod tests;
