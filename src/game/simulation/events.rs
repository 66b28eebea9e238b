//! Messages in and out of the simulation.
//!
//! [`PlayerCommand`]s are read once per tick in `SimSet::Input`; each one is
//! answered with a [`CommandOutcome`]. Everything the step itself reports
//! goes out as a [`SimEvent`].

use bevy::prelude::*;

use crate::game::battle::RunCard;
use crate::game::combat::Reaction;
use crate::game::economy::{FacilityKind, ModifierId};
use crate::game::unit::{Faction, UnitKind};

// ============================================================================
// Player Commands
// ============================================================================

#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    /// Leave the home base and push into an unlocked region.
    EnterRegion(u32),
    /// Back to the home base.
    ExitRegion,
    SetProductionWeight { kind: UnitKind, weight: f32 },
    SetProducing { kind: UnitKind, producing: bool },
    UpgradeUnit(UnitKind),
    UpgradeFacility(FacilityKind),
    UpgradeUnitCap(UnitKind),
    UpgradeEfficiency(UnitKind),
    /// Put a modifier (or nothing) into a loadout slot.
    Equip { kind: UnitKind, slot: usize, modifier: Option<ModifierId> },
    Fuse(ModifierId),
    /// Liquidate the whole stockpile.
    Digest,
    Prestige,
    ApplyCard(RunCard),
    Pause,
    Resume,
}

/// Whether a command took effect. Rejected commands changed nothing.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct CommandOutcome {
    pub command: PlayerCommand,
    pub accepted: bool,
}

// ============================================================================
// Simulation Events
// ============================================================================

#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    UnitKilled { faction: Faction, kind: UnitKind, position: Vec2 },
    ReactionTriggered { reaction: Reaction, position: Vec2 },
    ArmorBroken { position: Vec2 },
    UnitProduced { kind: UnitKind },
    FacilityOverheated { facility: FacilityKind },
    CheckpointLocked { index: usize },
    CheckpointCleared { index: usize },
    RegionUnlocked { region: u32 },
}
