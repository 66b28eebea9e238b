use serde::{Deserialize, Serialize};

// ============================================================================
// Factions & Elements
// ============================================================================

/// Which side of the lane a combatant fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Faction {
    /// The player's swarm, advancing left to right.
    #[default]
    Swarm,
    /// Entrenched defenders holding the lane.
    Human,
}

impl Faction {
    pub fn opponent(self) -> Self {
        match self {
            Faction::Swarm => Faction::Human,
            Faction::Human => Faction::Swarm,
        }
    }

    /// Sign of the x axis this faction faces.
    pub fn heading(self) -> f32 {
        match self {
            Faction::Swarm => 1.0,
            Faction::Human => -1.0,
        }
    }
}

/// Damage element carried by an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Element {
    #[default]
    Physical,
    Toxin,
    Thermal,
    Cryo,
    Voltaic,
}

// ============================================================================
// Unit Kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitKind {
    #[default]
    Melee,
    Ranged,
    Queen,
    Marine,
    Riot,
    Pyro,
    Sniper,
    Tank,
}

/// Static per-kind stat line, before levels, loadouts or run modifiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseStats {
    pub health: f32,
    pub damage: f32,
    pub range: f32,
    pub speed: f32,
    /// Seconds between attacks.
    pub attack_interval: f32,
    pub width: f32,
    pub armor: f32,
    pub element: Element,
    pub crit_chance: f32,
    pub crit_multiplier: f32,
    /// Per-level health growth for swarm kinds.
    pub health_growth: f32,
    /// Per-level damage growth for swarm kinds.
    pub damage_growth: f32,
}

/// Resources a hostile kill pays into the colony.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KillReward {
    pub biomass: f64,
    pub minerals: f64,
}

pub const DEFAULT_CRIT_CHANCE: f32 = 0.05;
pub const DEFAULT_CRIT_MULTIPLIER: f32 = 1.5;
/// Stacks applied per elemental hit.
pub const DEFAULT_STATUS_POWER: u32 = 10;

const fn stats(
    health: f32,
    damage: f32,
    range: f32,
    speed: f32,
    attack_interval: f32,
    width: f32,
    armor: f32,
    element: Element,
) -> BaseStats {
    BaseStats {
        health,
        damage,
        range,
        speed,
        attack_interval,
        width,
        armor,
        element,
        crit_chance: DEFAULT_CRIT_CHANCE,
        crit_multiplier: DEFAULT_CRIT_MULTIPLIER,
        health_growth: 0.0,
        damage_growth: 0.0,
    }
}

impl UnitKind {
    /// Swarm kinds in production order.
    pub const SWARM: [UnitKind; 3] = [UnitKind::Melee, UnitKind::Ranged, UnitKind::Queen];

    /// Kinds the deployment controller sends into a lane. Queens stay home.
    pub const DEPLOYABLE: [UnitKind; 2] = [UnitKind::Melee, UnitKind::Ranged];

    pub const HUMAN: [UnitKind; 5] = [
        UnitKind::Marine,
        UnitKind::Riot,
        UnitKind::Pyro,
        UnitKind::Sniper,
        UnitKind::Tank,
    ];

    pub fn faction(self) -> Faction {
        match self {
            UnitKind::Melee | UnitKind::Ranged | UnitKind::Queen => Faction::Swarm,
            _ => Faction::Human,
        }
    }

    pub fn base_stats(self) -> BaseStats {
        use Element::*;
        match self {
            UnitKind::Melee => BaseStats {
                health_growth: 0.2,
                damage_growth: 0.2,
                ..stats(60.0, 20.0, 30.0, 180.0, 0.5, 24.0, 0.0, Physical)
            },
            UnitKind::Ranged => BaseStats {
                health_growth: 0.15,
                damage_growth: 0.25,
                ..stats(45.0, 35.0, 220.0, 130.0, 1.0, 20.0, 0.0, Physical)
            },
            UnitKind::Queen => BaseStats {
                health_growth: 0.1,
                damage_growth: 0.1,
                ..stats(300.0, 10.0, 100.0, 50.0, 1.0, 32.0, 10.0, Physical)
            },
            UnitKind::Marine => stats(80.0, 20.0, 200.0, 0.0, 1.2, 20.0, 5.0, Physical),
            UnitKind::Riot => stats(250.0, 12.0, 50.0, 0.0, 1.5, 30.0, 40.0, Physical),
            UnitKind::Pyro => stats(120.0, 8.0, 100.0, 0.0, 0.2, 24.0, 5.0, Thermal),
            UnitKind::Sniper => BaseStats {
                crit_chance: 0.5,
                crit_multiplier: 2.5,
                ..stats(50.0, 90.0, 500.0, 0.0, 4.0, 18.0, 0.0, Physical)
            },
            UnitKind::Tank => stats(1200.0, 50.0, 250.0, 0.0, 2.0, 50.0, 60.0, Voltaic),
        }
    }

    pub fn kill_reward(self) -> KillReward {
        match self {
            UnitKind::Riot => KillReward { biomass: 15.0, minerals: 5.0 },
            UnitKind::Tank => KillReward { biomass: 50.0, minerals: 30.0 },
            _ => KillReward { biomass: 10.0, minerals: 2.0 },
        }
    }

    /// Position in [`UnitKind::SWARM`], used to index per-kind production state.
    pub fn swarm_index(self) -> Option<usize> {
        UnitKind::SWARM.iter().position(|k| *k == self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factions_partition_kinds() {
        for kind in UnitKind::SWARM {
            assert_eq!(kind.faction(), Faction::Swarm);
            assert!(kind.swarm_index().is_some());
        }
        for kind in UnitKind::HUMAN {
            assert_eq!(kind.faction(), Faction::Human);
            assert!(kind.swarm_index().is_none());
        }
    }

    #[test]
    fn test_defenders_do_not_walk() {
        for kind in UnitKind::HUMAN {
            assert_eq!(kind.base_stats().speed, 0.0, "{:?} should hold position", kind);
        }
    }

    #[test]
    fn test_heading_opposes() {
        assert_eq!(Faction::Swarm.heading(), -Faction::Human.heading());
        assert_eq!(Faction::Swarm.opponent(), Faction::Human);
    }
}
