//! Player command handling.

use bevy::prelude::*;

use crate::game::battle::Battle;
use crate::game::economy::Colony;
use crate::game::pool::EntityPool;
use crate::game::world::RegionTable;

use super::events::PlayerCommand;
use super::resources::SimPaused;

/// Everything a command may touch.
pub struct CommandTarget<'a> {
    pub colony: &'a mut Colony,
    pub battle: &'a mut Battle,
    pub pool: &'a mut EntityPool,
    pub paused: &'a mut SimPaused,
    pub regions: &'a RegionTable,
}

/// Apply one command. Returns `false`, with nothing changed, when the
/// command is not allowed or not affordable right now.
pub fn apply_command(command: PlayerCommand, target: CommandTarget) -> bool {
    let CommandTarget { colony, battle, pool, paused, regions } = target;
    match command {
        PlayerCommand::EnterRegion(id) => {
            if !colony.world.is_unlocked(id) {
                return false;
            }
            let Some(region) = regions.get(id) else {
                warn!("[COMMAND] region {} is unlocked but missing from the table", id);
                return false;
            };
            battle.enter(region, pool);
            true
        }
        PlayerCommand::ExitRegion => {
            if !battle.is_engaged() {
                return false;
            }
            battle.exit(pool);
            true
        }
        PlayerCommand::SetProductionWeight { kind, weight } => colony.set_weight(kind, weight),
        PlayerCommand::SetProducing { kind, producing } => colony.set_producing(kind, producing),
        PlayerCommand::UpgradeUnit(kind) => colony.upgrade_unit(kind),
        PlayerCommand::UpgradeFacility(kind) => colony.upgrade_facility(kind),
        PlayerCommand::UpgradeUnitCap(kind) => colony.upgrade_unit_cap(kind),
        PlayerCommand::UpgradeEfficiency(kind) => colony.upgrade_efficiency(kind),
        PlayerCommand::Equip { kind, slot, modifier } => colony.equip(kind, slot, modifier),
        PlayerCommand::Fuse(id) => colony.fuse(id),
        PlayerCommand::Digest => {
            if colony.hatchery.total_stockpile() == 0 {
                return false;
            }
            colony.digest();
            true
        }
        PlayerCommand::Prestige => {
            if !colony.prestige() {
                return false;
            }
            // The stockpile the field was showing no longer exists.
            battle.exit(pool);
            true
        }
        PlayerCommand::ApplyCard(card) => {
            if !battle.is_engaged() {
                return false;
            }
            card.apply(&mut battle.run);
            info!("[COMMAND] run card {:?} applied", card);
            true
        }
        PlayerCommand::Pause => !std::mem::replace(&mut paused.0, true),
        PlayerCommand::Resume => std::mem::replace(&mut paused.0, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::battle::{BattleMode, RunCard};
    use crate::game::economy::FacilityKind;
    use crate::game::unit::UnitKind;

    struct Fixture {
        colony: Colony,
        battle: Battle,
        pool: EntityPool,
        paused: SimPaused,
        regions: RegionTable,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                colony: Colony::default(),
                battle: Battle::default(),
                pool: EntityPool::new(16),
                paused: SimPaused::default(),
                regions: RegionTable::default(),
            }
        }

        fn run(&mut self, command: PlayerCommand) -> bool {
            apply_command(
                command,
                CommandTarget {
                    colony: &mut self.colony,
                    battle: &mut self.battle,
                    pool: &mut self.pool,
                    paused: &mut self.paused,
                    regions: &self.regions,
                },
            )
        }
    }

    #[test]
    fn test_locked_region_is_rejected() {
        let mut f = Fixture::new();
        assert!(!f.run(PlayerCommand::EnterRegion(2)));
        assert_eq!(f.battle.mode, BattleMode::Stockpile);
        assert!(f.run(PlayerCommand::EnterRegion(1)));
        assert_eq!(f.battle.mode, BattleMode::Engaged(1));
        assert!(f.run(PlayerCommand::ExitRegion));
        assert!(!f.run(PlayerCommand::ExitRegion));
    }

    #[test]
    fn test_cards_need_an_engagement() {
        let mut f = Fixture::new();
        assert!(!f.run(PlayerCommand::ApplyCard(RunCard::Frenzy)));
        f.run(PlayerCommand::EnterRegion(1));
        assert!(f.run(PlayerCommand::ApplyCard(RunCard::VolatileBlood)));
        assert!(f.battle.run.explode_on_death);
    }

    #[test]
    fn test_pause_and_resume_report_state_changes() {
        let mut f = Fixture::new();
        assert!(f.run(PlayerCommand::Pause));
        assert!(!f.run(PlayerCommand::Pause));
        assert!(f.paused.0);
        assert!(f.run(PlayerCommand::Resume));
        assert!(!f.run(PlayerCommand::Resume));
    }

    #[test]
    fn test_unaffordable_upgrade_is_rejected() {
        let mut f = Fixture::new();
        assert!(!f.run(PlayerCommand::UpgradeFacility(FacilityKind::Centrifuge)));
        f.colony.resources.biomass = 500.0;
        assert!(f.run(PlayerCommand::UpgradeFacility(FacilityKind::Centrifuge)));
        assert_eq!(f.colony.facilities.centrifuge.count, 1);
    }

    #[test]
    fn test_digest_empty_stockpile_is_rejected() {
        let mut f = Fixture::new();
        assert!(f.run(PlayerCommand::Digest));
        assert_eq!(f.colony.hatchery.stockpile(UnitKind::Melee), 0);
        assert!(!f.run(PlayerCommand::Digest));
    }
}
