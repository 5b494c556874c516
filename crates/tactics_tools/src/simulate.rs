//! Headless match runner.
//!
//! Seats every player with the engine's AI policy and plays a fixed number
//! of rounds without any presenter.

use serde::Serialize;
use tactics_core::components::PlayerId;
use tactics_core::config::EngineConfig;
use tactics_core::factions::FactionId;
use tactics_core::map::MapDefinition;
use tactics_core::setup::{GameSetup, PlayerSetup};
use tactics_core::state::GamePhase;
use tactics_core::turn::TurnController;

use crate::error::Result;

/// Per-player state at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerSummary {
    /// Seat.
    pub player: u8,
    /// Faction short name.
    pub faction: String,
    /// Food stockpile.
    pub food: u32,
    /// Production stockpile.
    pub production: u32,
    /// Units owned.
    pub units: usize,
    /// Buildings owned.
    pub buildings: usize,
    /// Whether the player lost their starting city.
    pub eliminated: bool,
}

/// Result of a headless run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    /// Round counter when the run stopped.
    pub turn: u32,
    /// Final phase.
    pub phase: String,
    /// Deterministic state hash, for comparing runs.
    pub state_hash: u64,
    /// One entry per seat.
    pub players: Vec<PlayerSummary>,
}

impl MatchSummary {
    /// Summarise a game.
    #[must_use]
    pub fn of(game: &TurnController) -> Self {
        Self {
            turn: game.turn(),
            phase: format!("{:?}", game.phase()),
            state_hash: game.state_hash(),
            players: game
                .registry()
                .players()
                .iter()
                .map(|p| PlayerSummary {
                    player: p.id.0,
                    faction: p.faction.short_name().to_string(),
                    food: p.resources.food,
                    production: p.resources.production,
                    units: p.units.len(),
                    buildings: p.buildings.len(),
                    eliminated: p.eliminated,
                })
                .collect(),
        }
    }

    /// Pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Seat `players` AI players, cycling through the factions.
#[must_use]
pub fn all_ai_setup(players: usize) -> GameSetup {
    GameSetup::new(
        FactionId::ALL
            .iter()
            .cycle()
            .take(players)
            .map(|&faction| PlayerSetup::ai(faction))
            .collect(),
    )
}

/// Play `rounds` full rounds with every seat AI-controlled.
///
/// Stops early if the game ends.
pub fn run_match(
    config: EngineConfig,
    map: &MapDefinition,
    players: usize,
    rounds: u32,
) -> Result<TurnController> {
    let mut game = TurnController::new(config, map, &all_ai_setup(players))?;
    let last = game.turn() + rounds;

    while game.turn() < last && game.phase() == GamePhase::Playing {
        game.play_ai_turn();
    }

    tracing::info!(
        turn = game.turn(),
        phase = ?game.phase(),
        hash = game.state_hash(),
        "match finished"
    );
    Ok(game)
}

/// Seats that took part in a run.
#[must_use]
pub fn seats(game: &TurnController) -> Vec<PlayerId> {
    game.registry().players().iter().map(|p| p.id).collect()
}
