//! Unit catalogue: factions, kinds, elements and stat resolution.

pub mod kinds;
pub mod stats;

pub use kinds::{BaseStats, Element, Faction, KillReward, UnitKind};
pub use stats::UnitStats;
