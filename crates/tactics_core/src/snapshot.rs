//! Read-only copies of the whole game and a deterministic state hash.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::error::Result;
use crate::grid::TileGrid;
use crate::registry::EntityRegistry;
use crate::state::GameState;
use crate::visibility::VisibilityEngine;

/// Everything the turn controller owns, copied out.
///
/// Presenters and AI policies read snapshots; they never touch the live
/// state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Turn, active player and phase.
    pub state: GameState,
    /// The map.
    pub grid: TileGrid,
    /// Units, buildings and players.
    pub registry: EntityRegistry,
    /// Fog of war per player.
    pub visibility: VisibilityEngine,
    /// Currently selected entity.
    pub selection: Option<EntityId>,
}

impl GameSnapshot {
    /// Encode with bincode.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bincode.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Hash of the simulation state. See [`state_hash`].
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        state_hash(&self.state, &self.grid, &self.registry)
    }
}

/// Hash the parts of a game that affect future play.
///
/// Two games fed the same commands produce the same hash. Selection and
/// fog of war are presentation state and are left out.
#[must_use]
pub fn state_hash(state: &GameState, grid: &TileGrid, registry: &EntityRegistry) -> u64 {
    let mut hasher = DefaultHasher::new();

    state.turn.hash(&mut hasher);
    state.active_player.hash(&mut hasher);
    state.phase.hash(&mut hasher);

    // Tiles in row-major order
    for (at, tile) in grid.iter() {
        at.hash(&mut hasher);
        tile.walkable.hash(&mut hasher);
        tile.resources.hash(&mut hasher);
    }

    // Registry iteration is already in ascending id order
    registry.unit_count().hash(&mut hasher);
    for unit in registry.units() {
        unit.id.hash(&mut hasher);
        unit.owner.hash(&mut hasher);
        unit.kind.hash(&mut hasher);
        unit.position.hash(&mut hasher);
        unit.health.current.hash(&mut hasher);
        unit.moves_left.hash(&mut hasher);
        unit.actions_left.hash(&mut hasher);
    }

    registry.building_count().hash(&mut hasher);
    for building in registry.buildings() {
        building.id.hash(&mut hasher);
        building.owner.hash(&mut hasher);
        building.kind.hash(&mut hasher);
        building.position.hash(&mut hasher);
        building.health.current.hash(&mut hasher);
        building.queue.countdown().hash(&mut hasher);
        for kind in building.queue.iter() {
            kind.hash(&mut hasher);
        }
    }

    for player in registry.players() {
        player.id.hash(&mut hasher);
        player.resources.food.hash(&mut hasher);
        player.resources.production.hash(&mut hasher);
        player.eliminated.hash(&mut hasher);
    }

    hasher.finish()
}
