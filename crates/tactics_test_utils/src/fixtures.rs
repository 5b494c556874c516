//! Test fixtures and helpers.
//!
//! Pre-built maps, a scenario builder for placing extra units, and a
//! scripted AI policy for driving opponent turns.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tactics_core::ai::AiPolicy;
use tactics_core::commands::Command;
use tactics_core::components::{EntityId, PlayerId, UnitKind};
use tactics_core::config::EngineConfig;
use tactics_core::economy::ResourcePool;
use tactics_core::factions::FactionId;
use tactics_core::grid::Coord;
use tactics_core::map::MapDefinition;
use tactics_core::setup::{GameSetup, PlayerSetup};
use tactics_core::snapshot::GameSnapshot;
use tactics_core::turn::TurnController;

/// 8x6 two-player map with a forest and a hill.
pub const DUEL_MAP: &str = "
    0.......
    ..f.....
    ........
    .....h..
    ........
    .......1
";

/// 5x1 corridor, starts at both ends.
pub const CORRIDOR_MAP: &str = "0...1";

/// 12x12 open field with four starts, used by benches.
pub const FIELD_MAP: &str = "
    0..........1
    ............
    ....f.......
    ........h...
    ............
    ...##.......
    .......##...
    ............
    ...h........
    .......f....
    ............
    2..........3
";

/// Parse one of the ASCII fixtures.
///
/// # Panics
///
/// Panics if the map is malformed.
#[must_use]
pub fn map(ascii: &str) -> MapDefinition {
    MapDefinition::from_ascii(ascii).unwrap_or_else(|e| panic!("fixture map: {e}"))
}

/// Two human seats on [`DUEL_MAP`].
#[must_use]
pub fn hot_seat_duel() -> TurnController {
    ScenarioBuilder::new(DUEL_MAP).build()
}

/// A human on seat 0 against a passive AI on seat 1, on [`DUEL_MAP`].
#[must_use]
pub fn duel_vs_ai() -> TurnController {
    ScenarioBuilder::new(DUEL_MAP)
        .players(vec![
            PlayerSetup::human(FactionId::Verdant),
            PlayerSetup::ai(FactionId::Ironhold),
        ])
        .build()
}

/// Builds games with extra units or adjusted stockpiles.
///
/// Extra units are placed ready to act, after the normal setup.
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    map: String,
    config: EngineConfig,
    players: Vec<PlayerSetup>,
    units: Vec<(PlayerId, UnitKind, Coord)>,
    resources: Vec<(PlayerId, ResourcePool)>,
}

impl ScenarioBuilder {
    /// Two human seats with the default configuration.
    #[must_use]
    pub fn new(map: &str) -> Self {
        Self {
            map: map.to_string(),
            config: EngineConfig::default(),
            players: vec![
                PlayerSetup::human(FactionId::Verdant),
                PlayerSetup::human(FactionId::Ironhold),
            ],
            units: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// Replace the seats.
    #[must_use]
    pub fn players(mut self, players: Vec<PlayerSetup>) -> Self {
        self.players = players;
        self
    }

    /// Replace the configuration.
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Start without the ruleset's starting units.
    #[must_use]
    pub fn without_starting_units(mut self) -> Self {
        self.config.ruleset.starting_units.clear();
        self
    }

    /// Place an extra unit.
    #[must_use]
    pub fn unit(mut self, owner: PlayerId, kind: UnitKind, at: Coord) -> Self {
        self.units.push((owner, kind, at));
        self
    }

    /// Override a player's stockpile.
    #[must_use]
    pub fn resources(mut self, owner: PlayerId, pool: ResourcePool) -> Self {
        self.resources.push((owner, pool));
        self
    }

    /// Set up the game.
    ///
    /// # Panics
    ///
    /// Panics if the map, setup or any extra unit is invalid.
    #[must_use]
    pub fn build(self) -> TurnController {
        let setup = GameSetup::new(self.players);
        let game = TurnController::new(self.config.clone(), &map(&self.map), &setup)
            .unwrap_or_else(|e| panic!("fixture setup: {e}"));
        if self.units.is_empty() && self.resources.is_empty() {
            return game;
        }

        let mut snapshot = game.snapshot();
        for (owner, kind, at) in self.units {
            snapshot
                .registry
                .spawn_unit(&self.config.ruleset, owner, kind, at, true)
                .unwrap_or_else(|v| panic!("fixture unit {kind:?} at {at}: {v}"));
        }
        for (owner, pool) in self.resources {
            if let Some(player) = snapshot.registry.player_mut(owner) {
                player.resources = pool;
            }
        }
        TurnController::restore(self.config, snapshot)
    }
}

/// The entity standing on a tile.
#[must_use]
pub fn entity_at(game: &TurnController, at: Coord) -> Option<EntityId> {
    game.registry().occupant(at)
}

/// Ids of a player's units of one kind, in id order.
#[must_use]
pub fn units_of_kind(game: &TurnController, owner: PlayerId, kind: UnitKind) -> Vec<EntityId> {
    game.registry()
        .units_of(owner)
        .filter(|u| u.kind == kind)
        .map(|u| u.id)
        .collect()
}

/// A player's starting city.
///
/// # Panics
///
/// Panics if the player has none.
#[must_use]
pub fn starting_city(game: &TurnController, owner: PlayerId) -> EntityId {
    game.player(owner)
        .and_then(|p| p.starting_city)
        .unwrap_or_else(|| panic!("player {owner} has no starting city"))
}

/// AI policy that replays a fixed list of turns.
///
/// Each call to `plan_turn` takes the next entry; once the list runs out it
/// passes. Every call records the seat it planned for.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAi {
    turns: VecDeque<Vec<Command>>,
    planned: Rc<RefCell<Vec<PlayerId>>>,
}

impl ScriptedAi {
    /// Policy playing these turns in order.
    #[must_use]
    pub fn new(turns: Vec<Vec<Command>>) -> Self {
        Self {
            turns: turns.into(),
            planned: Rc::default(),
        }
    }

    /// Shared record of the seats planned for so far.
    #[must_use]
    pub fn planned(&self) -> Rc<RefCell<Vec<PlayerId>>> {
        Rc::clone(&self.planned)
    }
}

impl AiPolicy for ScriptedAi {
    fn name(&self) -> &str {
        "scripted"
    }

    fn plan_turn(&mut self, player: PlayerId, _view: &GameSnapshot) -> Vec<Command> {
        self.planned.borrow_mut().push(player);
        self.turns.pop_front().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_maps_parse() {
        assert_eq!(map(DUEL_MAP).starts.len(), 2);
        assert_eq!(map(CORRIDOR_MAP).starts.len(), 2);
        assert_eq!(map(FIELD_MAP).starts.len(), 4);
    }

    #[test]
    fn test_builder_places_extra_units() {
        let game = ScenarioBuilder::new(DUEL_MAP)
            .without_starting_units()
            .unit(PlayerId(0), UnitKind::Melee, Coord::new(3, 3))
            .resources(PlayerId(1), ResourcePool::new(1, 2))
            .build();

        assert!(units_of_kind(&game, PlayerId(0), UnitKind::Worker).is_empty());
        let melee = units_of_kind(&game, PlayerId(0), UnitKind::Melee);
        assert_eq!(melee.len(), 1);
        assert_eq!(entity_at(&game, Coord::new(3, 3)), Some(melee[0]));
        assert_eq!(
            game.player(PlayerId(1)).unwrap().resources,
            ResourcePool::new(1, 2)
        );
        assert!(game.is_visible(PlayerId(0), Coord::new(3, 4)));
    }

    #[test]
    fn test_scripted_ai_runs_out() {
        let mut ai = ScriptedAi::new(vec![vec![Command::EndTurn]]);
        let view = hot_seat_duel().snapshot();
        assert_eq!(ai.plan_turn(PlayerId(1), &view), vec![Command::EndTurn]);
        assert!(ai.plan_turn(PlayerId(1), &view).is_empty());
        assert_eq!(ai.planned().borrow().len(), 2);
    }
}
