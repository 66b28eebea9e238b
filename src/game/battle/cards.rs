//! Run-scoped modifiers picked up between waves. They last until the swarm
//! leaves the region.

use serde::{Deserialize, Serialize};

pub const MAX_DOUBLE_SPAWN_CHANCE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunModifiers {
    pub damage_multiplier: f32,
    pub max_hp_multiplier: f32,
    /// Scales the economy's time step while a run is active.
    pub resource_rate_multiplier: f32,
    pub explode_on_death: bool,
    /// Chance that a deployed unit brings a free twin.
    pub double_spawn_chance: f32,
}

impl Default for RunModifiers {
    fn default() -> Self {
        Self {
            damage_multiplier: 1.0,
            max_hp_multiplier: 1.0,
            resource_rate_multiplier: 1.0,
            explode_on_death: false,
            double_spawn_chance: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunCard {
    Frenzy,
    Carapace,
    Bounty,
    VolatileBlood,
    Budding,
}

impl RunCard {
    pub const ALL: [RunCard; 5] = [
        RunCard::Frenzy,
        RunCard::Carapace,
        RunCard::Bounty,
        RunCard::VolatileBlood,
        RunCard::Budding,
    ];

    pub fn apply(self, run: &mut RunModifiers) {
        match self {
            RunCard::Frenzy => run.damage_multiplier *= 1.2,
            RunCard::Carapace => run.max_hp_multiplier *= 1.2,
            RunCard::Bounty => run.resource_rate_multiplier *= 1.25,
            RunCard::VolatileBlood => run.explode_on_death = true,
            RunCard::Budding => {
                run.double_spawn_chance = (run.double_spawn_chance + 0.1).min(MAX_DOUBLE_SPAWN_CHANCE)
            }
        }
    }
}
