//! The typed command surface.
//!
//! Every way of changing a game goes through one of these. Presenters call
//! the matching [`crate::turn::TurnController`] method directly; AI
//! policies, tools and scripted tests build `Command` values and hand them
//! to [`crate::turn::TurnController::apply`].

use serde::{Deserialize, Serialize};

use crate::components::{BuildingKind, EntityId, UnitKind};
use crate::grid::Coord;

/// A single player command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Select an entity for inspection.
    Select {
        /// Entity to select.
        entity: EntityId,
    },
    /// Move, attack or gather depending on what is at the target tile.
    MoveOrAct {
        /// Acting unit.
        unit: EntityId,
        /// Target tile.
        to: Coord,
    },
    /// Move to a tile.
    Move {
        /// Moving unit.
        unit: EntityId,
        /// Destination.
        to: Coord,
    },
    /// Attack an entity.
    Attack {
        /// Attacking unit.
        unit: EntityId,
        /// Target entity.
        target: EntityId,
    },
    /// Gather from a tile, walking next to it first if needed.
    Gather {
        /// Gathering worker.
        unit: EntityId,
        /// Resource tile.
        at: Coord,
    },
    /// Place a building for the active player.
    Build {
        /// Building type.
        kind: BuildingKind,
        /// Tile to build on.
        at: Coord,
    },
    /// Queue a unit at a building.
    Train {
        /// Producing building.
        building: EntityId,
        /// Unit type.
        unit: UnitKind,
    },
    /// End the active player's turn.
    EndTurn,
}

impl Command {
    /// Whether the command ends the turn.
    #[must_use]
    pub const fn is_end_turn(&self) -> bool {
        matches!(self, Self::EndTurn)
    }
}
