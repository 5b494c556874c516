//! Error types for the game simulation.
//!
//! Three kinds of failure exist:
//! - [`GameError`] for construction and configuration problems (bad maps,
//!   malformed rule files, snapshot encoding).
//! - [`Rejection`] for commands whose preconditions do not hold. A rejected
//!   command never changes state.
//! - [`InvariantViolation`] for states that should be structurally impossible.
//!   These assert in debug builds and are logged and clamped in release.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::{BuildingKind, EntityId, PlayerId, UnitKind};
use crate::grid::Coord;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for setup and configuration failures.
#[derive(Debug, Error)]
pub enum GameError {
    /// Failed to parse a RON data file.
    #[error("Failed to parse {what}: {source}")]
    DataParseError {
        /// What was being parsed (e.g. "ruleset").
        what: &'static str,
        /// Underlying RON error.
        #[source]
        source: ron::error::SpannedError,
    },

    /// Rule data failed validation.
    #[error("Invalid ruleset: {0}")]
    InvalidRuleset(String),

    /// The supplied map is malformed.
    #[error("Invalid map: {0}")]
    InvalidMap(String),

    /// A starting position cannot host a starting city.
    #[error("Invalid start position {position} for player {player}: {reason}")]
    InvalidStartPosition {
        /// Player the start belongs to.
        player: PlayerId,
        /// Offending coordinate.
        position: Coord,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Player setup does not match the map.
    #[error("Invalid player setup: {0}")]
    InvalidSetup(String),

    /// Snapshot encoding or decoding failed.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),
}

/// Reason a command was rejected.
///
/// Rejections are always non-fatal: the command is a no-op and the
/// simulation state is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Rejection {
    /// The game has already ended.
    #[error("The game is over")]
    GameOver,

    /// The game has not started yet.
    #[error("The game has not started")]
    NotStarted,

    /// The acting entity belongs to a player whose turn it is not.
    #[error("It is not player {owner}'s turn")]
    NotYourTurn {
        /// Owner of the entity the command tried to use.
        owner: PlayerId,
    },

    /// No entity with this id exists.
    #[error("Entity not found: {0}")]
    UnknownEntity(EntityId),

    /// The entity is not a unit.
    #[error("Entity {0} is not a unit")]
    NotAUnit(EntityId),

    /// The entity is not a building.
    #[error("Entity {0} is not a building")]
    NotABuilding(EntityId),

    /// The unit has no movement left this turn.
    #[error("No moves left")]
    NoMovesLeft,

    /// The unit has already acted this turn.
    #[error("No actions left")]
    NoActionsLeft,

    /// The coordinate lies outside the map.
    #[error("Tile {0} is out of bounds")]
    OutOfBounds(Coord),

    /// The tile cannot be entered or built on.
    #[error("Tile {0} is not walkable")]
    TileNotWalkable(Coord),

    /// Another entity already stands on the tile.
    #[error("Tile {0} is occupied")]
    TileOccupied(Coord),

    /// The unit is already standing on the destination.
    #[error("Unit is already at {0}")]
    AlreadyThere(Coord),

    /// No path reaches the destination within the remaining moves.
    #[error("Tile {0} cannot be reached this turn")]
    DestinationOutOfReach(Coord),

    /// The target is further away than the attack range.
    #[error("Target at distance {distance} is beyond range {range}")]
    TargetOutOfRange {
        /// Manhattan distance to the target.
        distance: u32,
        /// Attacker's range.
        range: u32,
    },

    /// The target belongs to the acting player.
    #[error("Cannot attack a friendly entity")]
    FriendlyTarget,

    /// Only workers can gather.
    #[error("Only workers can gather resources")]
    NotAWorker,

    /// The tile's terrain yields nothing.
    #[error("Tile {0} is not a resource tile")]
    NotAResourceTile(Coord),

    /// The tile has no resources left.
    #[error("Tile {0} is depleted")]
    ResourceDepleted(Coord),

    /// The worker is not next to the tile and cannot get there this turn.
    #[error("Tile {0} is not adjacent to the worker")]
    NotAdjacent(Coord),

    /// The active player cannot pay for this.
    #[error("Insufficient resources: need {food_needed} food and {production_needed} production")]
    InsufficientResources {
        /// Food the cost requires.
        food_needed: u32,
        /// Production the cost requires.
        production_needed: u32,
    },

    /// This building cannot train this unit.
    #[error("{building:?} cannot train {unit:?}")]
    InvalidPairing {
        /// Building type asked to train.
        building: BuildingKind,
        /// Requested unit type.
        unit: UnitKind,
    },

    /// The production queue is at capacity.
    #[error("Production queue is full")]
    QueueFull,
}

/// An internal consistency failure.
///
/// Produced by [`crate::invariants::check_invariants`] and by the registry
/// when it refuses a structurally impossible mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl InvariantViolation {
    /// Create a violation from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Raise an invariant violation.
///
/// Panics in debug builds. In release builds the violation is logged and the
/// caller is expected to clamp or skip the offending mutation.
pub fn report_violation(violation: &InvariantViolation) {
    tracing::error!(message = %violation.message, "invariant violated");
    if cfg!(debug_assertions) {
        panic!("{violation}");
    }
}
