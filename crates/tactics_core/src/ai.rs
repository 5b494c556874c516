//! Opponent policy hook.
//!
//! When an AI-controlled seat becomes active the turn controller asks its
//! policy for commands, applies them in order, then ends the turn. The
//! shipped [`PassiveAi`] issues nothing, so AI seats pass immediately.

use crate::commands::Command;
use crate::components::PlayerId;
use crate::snapshot::GameSnapshot;

/// Decides an AI seat's commands for one turn.
pub trait AiPolicy {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Commands for `player`'s turn, given a read-only view of the game.
    ///
    /// `EndTurn` need not be included; the turn ends after the list runs
    /// out. Rejected commands are skipped.
    fn plan_turn(&mut self, player: PlayerId, view: &GameSnapshot) -> Vec<Command>;
}

/// Ends its turn without acting.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassiveAi;

impl AiPolicy for PassiveAi {
    fn name(&self) -> &str {
        "passive"
    }

    fn plan_turn(&mut self, player: PlayerId, _view: &GameSnapshot) -> Vec<Command> {
        tracing::trace!(player = %player, "passive ai passes");
        Vec::new()
    }
}
