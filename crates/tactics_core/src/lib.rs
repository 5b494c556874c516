//! # Tactics Core
//!
//! Deterministic simulation core for a grid-based, turn-based tactics game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No randomness
//! - No floating-point math (line-of-sight slopes use fixed-point)
//!
//! This separation enables:
//! - Headless simulation and tooling
//! - Snapshot-based save and restore
//! - Determinism testing via [`turn::TurnController::state_hash`]
//!
//! ## Crate Structure
//!
//! - [`grid`] - Tiles, terrain and coordinates
//! - [`registry`] - Units, buildings and players
//! - [`pathfinding`] - Budgeted A* and range flood fill
//! - [`visibility`] - Shadowcast field of view and fog of war
//! - [`combat`], [`economy`], [`production`] - Rules for the three action kinds
//! - [`turn`] - The turn controller that owns all mutable state
//! - [`data`] - Data-driven ruleset loaded from RON

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod combat;
pub mod commands;
pub mod components;
pub mod config;
pub mod data;
pub mod economy;
pub mod error;
pub mod events;
pub mod factions;
pub mod grid;
pub mod invariants;
pub mod map;
pub mod math;
pub mod pathfinding;
pub mod production;
pub mod registry;
pub mod setup;
pub mod snapshot;
pub mod state;
pub mod turn;
pub mod visibility;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ai::{AiPolicy, PassiveAi};
    pub use crate::combat::{calculate_damage, AttackOutcome};
    pub use crate::commands::Command;
    pub use crate::components::*;
    pub use crate::config::EngineConfig;
    pub use crate::data::Ruleset;
    pub use crate::economy::{GatherOutcome, ResourceKind, ResourcePool};
    pub use crate::error::{GameError, InvariantViolation, Rejection, Result};
    pub use crate::events::{EventLog, GameEvent, GameObserver};
    pub use crate::factions::FactionId;
    pub use crate::grid::{Coord, Terrain, Tile, TileGrid};
    pub use crate::map::MapDefinition;
    pub use crate::math::Fixed;
    pub use crate::production::{ProductionQueue, TrainOrder};
    pub use crate::registry::EntityRegistry;
    pub use crate::setup::{GameSetup, PlayerSetup};
    pub use crate::snapshot::GameSnapshot;
    pub use crate::state::{GameOutcome, GamePhase, GameState};
    pub use crate::turn::{ActionOutcome, TurnController};
    pub use crate::visibility::VisibilityEngine;
}
