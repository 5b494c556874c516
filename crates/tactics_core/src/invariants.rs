//! Whole-game consistency checks.
//!
//! [`check_invariants`] scans a game and lists everything that should never
//! happen. With the `debug-validation` feature the turn controller runs it
//! after every committed command; tests call it directly.

use std::collections::{BTreeSet, HashMap};

use crate::components::EntityId;
use crate::error::InvariantViolation;
use crate::grid::Coord;
use crate::turn::TurnController;

/// Every broken invariant in the game, empty when consistent.
#[must_use]
pub fn check_invariants(game: &TurnController) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let grid = game.grid();
    let registry = game.registry();
    let state = game.state();

    let mut push = |message: String| violations.push(InvariantViolation::new(message));

    if state.turn == 0 {
        push("turn counter is 0".into());
    }
    if state.active_player.index() >= registry.player_count() {
        push(format!(
            "active player {} out of {} players",
            state.active_player,
            registry.player_count()
        ));
    }

    let mut holders: HashMap<Coord, EntityId> = HashMap::new();
    let mut claim = |at: Coord, id: EntityId, push: &mut dyn FnMut(String)| {
        if let Some(other) = holders.insert(at, id) {
            push(format!("entities {other} and {id} share tile {at}"));
        }
    };

    for unit in registry.units() {
        if unit.moves_left > unit.speed {
            push(format!(
                "unit {} has {} moves left with speed {}",
                unit.id, unit.moves_left, unit.speed
            ));
        }
        if unit.actions_left > 1 {
            push(format!("unit {} has {} actions", unit.id, unit.actions_left));
        }
        if unit.health.current == 0 || unit.health.current > unit.health.max {
            push(format!(
                "unit {} health {}/{}",
                unit.id, unit.health.current, unit.health.max
            ));
        }
        if !grid.in_bounds(unit.position) {
            push(format!("unit {} outside the map at {}", unit.id, unit.position));
        } else if !grid.is_walkable(unit.position) {
            push(format!(
                "unit {} stands on unwalkable {}",
                unit.id, unit.position
            ));
        }
        claim(unit.position, unit.id, &mut push);
    }

    for building in registry.buildings() {
        if building.health.current == 0 || building.health.current > building.health.max {
            push(format!(
                "building {} health {}/{}",
                building.id, building.health.current, building.health.max
            ));
        }
        if !grid.in_bounds(building.position) {
            push(format!(
                "building {} outside the map at {}",
                building.id, building.position
            ));
        } else if grid.is_walkable(building.position) {
            push(format!(
                "tile {} under building {} is walkable",
                building.position, building.id
            ));
        }
        if building.queue.is_empty() != building.queue.countdown().is_none() {
            push(format!(
                "building {} queue has {} entries but countdown {:?}",
                building.id,
                building.queue.len(),
                building.queue.countdown()
            ));
        }
        claim(building.position, building.id, &mut push);
    }

    for player in registry.players() {
        let units: BTreeSet<EntityId> = registry.units_of(player.id).map(|u| u.id).collect();
        if units != player.units {
            push(format!("player {} unit set out of sync", player.id));
        }
        let buildings: BTreeSet<EntityId> =
            registry.buildings_of(player.id).map(|b| b.id).collect();
        if buildings != player.buildings {
            push(format!("player {} building set out of sync", player.id));
        }
        match player.starting_city {
            Some(city) if !player.eliminated && registry.building(city).is_none() => {
                push(format!(
                    "player {} lost starting city {city} without being eliminated",
                    player.id
                ));
            }
            None if !player.eliminated => {
                push(format!("player {} has no starting city", player.id));
            }
            _ => {}
        }
    }

    violations
}
