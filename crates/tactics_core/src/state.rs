//! Turn counter, active seat and game phase.

use serde::{Deserialize, Serialize};

use crate::components::PlayerId;

/// Top-level game phase. `Victory` and `Defeat` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Players and map are being placed.
    #[default]
    Setup,
    /// Commands are accepted.
    Playing,
    /// The game ended in favour of the human side.
    Victory,
    /// The game ended against the human side.
    Defeat,
}

impl GamePhase {
    /// Whether the game has ended.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Victory | Self::Defeat)
    }
}

/// How a finished game ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    /// Every player that was not eliminated.
    pub winners: Vec<PlayerId>,
    /// The player whose starting city fell.
    pub eliminated: PlayerId,
}

/// Turn bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Round counter, starting at 1.
    pub turn: u32,
    /// Seat whose turn it is.
    pub active_player: PlayerId,
    /// Current phase.
    pub phase: GamePhase,
    outcome: Option<GameOutcome>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Fresh state: turn 1, seat 0, setup phase.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            turn: 1,
            active_player: PlayerId(0),
            phase: GamePhase::Setup,
            outcome: None,
        }
    }

    /// Leave setup.
    pub fn start(&mut self) {
        if self.phase == GamePhase::Setup {
            self.phase = GamePhase::Playing;
        }
    }

    /// Whether commands are accepted.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// Whether the game has ended.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Pass the turn to the next seat. Returns true when play wrapped
    /// back to seat 0 and the turn counter advanced.
    pub fn advance(&mut self, player_count: usize) -> bool {
        let count = player_count.max(1);
        let next = (self.active_player.index() + 1) % count;
        self.active_player = PlayerId(next as u8);
        if next == 0 {
            self.turn += 1;
            true
        } else {
            false
        }
    }

    /// End the game.
    ///
    /// The global phase is `Victory` when a human is among the winners or no
    /// human is playing at all, `Defeat` otherwise. Has no effect once the
    /// game is already over.
    pub fn finish(&mut self, outcome: GameOutcome, humans: &[PlayerId]) {
        if self.is_over() {
            return;
        }
        let human_won =
            humans.is_empty() || outcome.winners.iter().any(|w| humans.contains(w));
        self.phase = if human_won {
            GamePhase::Victory
        } else {
            GamePhase::Defeat
        };
        self.outcome = Some(outcome);
    }

    /// How the game ended, once it has.
    #[must_use]
    pub fn outcome(&self) -> Option<&GameOutcome> {
        self.outcome.as_ref()
    }

    /// The phase as seen by one player.
    #[must_use]
    pub fn phase_for(&self, player: PlayerId) -> GamePhase {
        match &self.outcome {
            Some(outcome) if outcome.winners.contains(&player) => GamePhase::Victory,
            Some(_) => GamePhase::Defeat,
            None => self.phase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_wraps_and_counts() {
        let mut state = GameState::new();
        state.start();
        assert!(!state.advance(3));
        assert_eq!(state.active_player, PlayerId(1));
        assert!(!state.advance(3));
        assert!(state.advance(3));
        assert_eq!(state.active_player, PlayerId(0));
        assert_eq!(state.turn, 2);
    }

    #[test]
    fn test_finish_from_human_perspective() {
        let mut state = GameState::new();
        state.start();
        state.finish(
            GameOutcome {
                winners: vec![PlayerId(1)],
                eliminated: PlayerId(0),
            },
            &[PlayerId(0)],
        );
        assert_eq!(state.phase, GamePhase::Defeat);
        assert_eq!(state.phase_for(PlayerId(1)), GamePhase::Victory);
        assert_eq!(state.phase_for(PlayerId(0)), GamePhase::Defeat);

        // A second finish is ignored
        state.finish(
            GameOutcome {
                winners: vec![PlayerId(0)],
                eliminated: PlayerId(1),
            },
            &[PlayerId(0)],
        );
        assert_eq!(state.outcome().unwrap().eliminated, PlayerId(0));
    }

    #[test]
    fn test_no_humans_is_victory() {
        let mut state = GameState::new();
        state.start();
        state.finish(
            GameOutcome {
                winners: vec![PlayerId(0)],
                eliminated: PlayerId(1),
            },
            &[],
        );
        assert_eq!(state.phase, GamePhase::Victory);
        assert!(state.is_over());
    }
}
