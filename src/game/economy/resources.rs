use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Raw matter pulled from the ground.
    Minerals,
    /// Refined matter, the main spending currency.
    Biomass,
    Energy,
    /// Advanced currency for cap and efficiency research.
    Dna,
    /// Population-limiting spawn stock.
    Larva,
    /// Permanent meta-currency earned by prestige.
    Mutagen,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Minerals,
        ResourceKind::Biomass,
        ResourceKind::Energy,
        ResourceKind::Dna,
        ResourceKind::Larva,
        ResourceKind::Mutagen,
    ];
}

/// Upper bounds for each resource, derived from storage facilities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceCaps {
    /// Shared cap for minerals, biomass and energy.
    pub storage: f64,
    pub larva: f64,
}

impl ResourceCaps {
    pub fn cap(&self, kind: ResourceKind) -> f64 {
        match kind {
            ResourceKind::Minerals | ResourceKind::Biomass | ResourceKind::Energy => self.storage,
            ResourceKind::Larva => self.larva,
            ResourceKind::Dna | ResourceKind::Mutagen => f64::INFINITY,
        }
    }
}

// ============================================================================
// Costs
// ============================================================================

/// A bundle of resource amounts paid together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    pub biomass: f64,
    pub minerals: f64,
    pub energy: f64,
    pub dna: f64,
    pub larva: f64,
}

impl Cost {
    pub fn biomass(amount: f64) -> Self {
        Cost { biomass: amount, ..Default::default() }
    }

    pub fn dna(amount: f64) -> Self {
        Cost { dna: amount, ..Default::default() }
    }

    pub fn entries(&self) -> [(ResourceKind, f64); 5] {
        [
            (ResourceKind::Biomass, self.biomass),
            (ResourceKind::Minerals, self.minerals),
            (ResourceKind::Energy, self.energy),
            (ResourceKind::Dna, self.dna),
            (ResourceKind::Larva, self.larva),
        ]
    }

    /// Scale every matter cost by `factor`. Larva is a head count and stays whole.
    pub fn discounted(&self, factor: f64) -> Self {
        Cost {
            biomass: self.biomass * factor,
            minerals: self.minerals * factor,
            energy: self.energy * factor,
            dna: self.dna * factor,
            larva: self.larva,
        }
    }
}

// ============================================================================
// Colony Resources
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColonyResources {
    pub minerals: f64,
    pub biomass: f64,
    pub energy: f64,
    pub dna: f64,
    pub larva: f64,
    pub mutagen: f64,
}

impl Default for ColonyResources {
    fn default() -> Self {
        Self {
            minerals: 0.0,
            biomass: 0.0,
            energy: 0.0,
            dna: 0.0,
            larva: 3.0,
            mutagen: 0.0,
        }
    }
}

impl ColonyResources {
    pub fn get(&self, kind: ResourceKind) -> f64 {
        match kind {
            ResourceKind::Minerals => self.minerals,
            ResourceKind::Biomass => self.biomass,
            ResourceKind::Energy => self.energy,
            ResourceKind::Dna => self.dna,
            ResourceKind::Larva => self.larva,
            ResourceKind::Mutagen => self.mutagen,
        }
    }

    fn value_mut(&mut self, kind: ResourceKind) -> &mut f64 {
        match kind {
            ResourceKind::Minerals => &mut self.minerals,
            ResourceKind::Biomass => &mut self.biomass,
            ResourceKind::Energy => &mut self.energy,
            ResourceKind::Dna => &mut self.dna,
            ResourceKind::Larva => &mut self.larva,
            ResourceKind::Mutagen => &mut self.mutagen,
        }
    }

    /// Add `amount` (negative to spend) and clamp into `[0, cap]`.
    /// Returns the change actually applied.
    pub fn modify(&mut self, kind: ResourceKind, amount: f64, caps: &ResourceCaps) -> f64 {
        let cap = caps.cap(kind);
        let value = self.value_mut(kind);
        let before = *value;
        let next = before + amount;
        *value = if next.is_nan() { before } else { next.clamp(0.0, cap) };
        *value - before
    }

    /// Re-apply caps to every resource, e.g. after storage shrank on reset.
    pub fn clamp_all(&mut self, caps: &ResourceCaps) {
        for kind in ResourceKind::ALL {
            let cap = caps.cap(kind);
            let value = self.value_mut(kind);
            *value = if value.is_nan() { 0.0 } else { value.clamp(0.0, cap) };
        }
    }

    pub fn can_afford(&self, cost: &Cost) -> bool {
        cost.entries().iter().all(|(kind, amount)| self.get(*kind) >= *amount)
    }

    /// Deduct every part of `cost`, or nothing at all.
    pub fn spend(&mut self, cost: &Cost, caps: &ResourceCaps) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        for (kind, amount) in cost.entries() {
            if amount > 0.0 {
                self.modify(kind, -amount, caps);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPS: ResourceCaps = ResourceCaps { storage: 100.0, larva: 10.0 };

    #[test]
    fn test_modify_clamps_to_cap_and_zero() {
        let mut res = ColonyResources::default();
        let applied = res.modify(ResourceKind::Biomass, 250.0, &CAPS);
        assert_eq!(res.biomass, 100.0);
        assert_eq!(applied, 100.0);

        let applied = res.modify(ResourceKind::Biomass, -400.0, &CAPS);
        assert_eq!(res.biomass, 0.0);
        assert_eq!(applied, -100.0);
    }

    #[test]
    fn test_larva_uses_its_own_cap() {
        let mut res = ColonyResources::default();
        res.modify(ResourceKind::Larva, 50.0, &CAPS);
        assert_eq!(res.larva, 10.0);
    }

    #[test]
    fn test_dna_is_unbounded() {
        let mut res = ColonyResources::default();
        res.modify(ResourceKind::Dna, 1.0e6, &CAPS);
        assert_eq!(res.dna, 1.0e6);
    }

    #[test]
    fn test_spend_is_all_or_nothing() {
        let mut res = ColonyResources { biomass: 50.0, minerals: 5.0, ..Default::default() };
        let cost = Cost { biomass: 20.0, minerals: 10.0, ..Default::default() };

        assert!(!res.spend(&cost, &CAPS));
        assert_eq!(res.biomass, 50.0, "failed spend must not touch biomass");
        assert_eq!(res.minerals, 5.0);

        res.minerals = 10.0;
        assert!(res.spend(&cost, &CAPS));
        assert_eq!(res.biomass, 30.0);
        assert_eq!(res.minerals, 0.0);
    }

    #[test]
    fn test_discount_keeps_larva_whole() {
        let cost = Cost { biomass: 100.0, larva: 1.0, ..Default::default() };
        let cheap = cost.discounted(0.5);
        assert_eq!(cheap.biomass, 50.0);
        assert_eq!(cheap.larva, 1.0);
    }
}
