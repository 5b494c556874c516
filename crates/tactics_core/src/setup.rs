//! Player seating handed to the turn controller.

use serde::{Deserialize, Serialize};

use crate::components::Controller;
use crate::factions::FactionId;

/// Minimum number of players in a game.
pub const MIN_PLAYERS: usize = 2;

/// One seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSetup {
    /// Faction played.
    pub faction: FactionId,
    /// Who issues commands.
    pub controller: Controller,
}

impl PlayerSetup {
    /// A human-controlled seat.
    #[must_use]
    pub const fn human(faction: FactionId) -> Self {
        Self {
            faction,
            controller: Controller::Human,
        }
    }

    /// An AI-controlled seat.
    #[must_use]
    pub const fn ai(faction: FactionId) -> Self {
        Self {
            faction,
            controller: Controller::Ai,
        }
    }
}

/// All seats in turn order. Seat `i` starts at the map's `i`-th start.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameSetup {
    /// Seats in turn order.
    pub players: Vec<PlayerSetup>,
}

impl GameSetup {
    /// Setup from a list of seats.
    #[must_use]
    pub fn new(players: Vec<PlayerSetup>) -> Self {
        Self { players }
    }

    /// One human against `ai_count` AI seats, factions assigned in order.
    #[must_use]
    pub fn human_vs_ai(human: FactionId, ai_count: usize) -> Self {
        let mut players = vec![PlayerSetup::human(human)];
        players.extend(
            FactionId::ALL
                .iter()
                .copied()
                .filter(|f| *f != human)
                .cycle()
                .take(ai_count)
                .map(PlayerSetup::ai),
        );
        Self { players }
    }

    /// Number of seats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether there are no seats.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_vs_ai() {
        let setup = GameSetup::human_vs_ai(FactionId::Sylvan, 2);
        assert_eq!(setup.len(), 3);
        assert_eq!(setup.players[0], PlayerSetup::human(FactionId::Sylvan));
        assert_eq!(setup.players[1], PlayerSetup::ai(FactionId::Verdant));
        assert_eq!(setup.players[2], PlayerSetup::ai(FactionId::Ironhold));
    }
}
