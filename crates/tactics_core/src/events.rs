//! Outbound notifications.
//!
//! The turn controller emits exactly one [`GameEvent`] per committed state
//! change, after the change is complete. Observers receive shared references
//! and cannot veto or roll anything back.

use serde::{Deserialize, Serialize};

use crate::components::{BuildingKind, EntityId, PlayerId, UnitKind};
use crate::economy::ResourceKind;
use crate::grid::Coord;

/// A committed state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A unit moved along a path.
    EntityMoved {
        /// The unit.
        unit: EntityId,
        /// Tile it left.
        from: Coord,
        /// Tile it stopped on.
        to: Coord,
        /// Moves left after the move.
        moves_left: u32,
    },
    /// An attack landed.
    AttackResolved {
        /// Attacking unit.
        attacker: EntityId,
        /// Target entity.
        target: EntityId,
        /// Damage applied.
        damage: u32,
        /// Target health afterwards.
        remaining_health: u32,
        /// Whether the target was removed.
        destroyed: bool,
    },
    /// A worker gathered from a tile.
    ResourceGathered {
        /// The worker.
        worker: EntityId,
        /// Player credited.
        player: PlayerId,
        /// Tile gathered from.
        tile: Coord,
        /// Resource credited.
        resource: ResourceKind,
        /// Amount credited.
        amount: u32,
        /// Resource units left on the tile.
        remaining: u32,
    },
    /// A building was placed.
    BuildingCreated {
        /// The new building.
        building: EntityId,
        /// Owner.
        owner: PlayerId,
        /// Building type.
        kind: BuildingKind,
        /// Its tile.
        position: Coord,
    },
    /// A unit entered a production queue.
    UnitQueued {
        /// Producing building.
        building: EntityId,
        /// Queued type.
        unit: UnitKind,
        /// Queue length afterwards.
        queue_len: usize,
    },
    /// Production finished and a unit appeared.
    UnitSpawned {
        /// Producing building.
        building: EntityId,
        /// The new unit.
        unit: EntityId,
        /// Unit type.
        kind: UnitKind,
        /// Spawn tile.
        position: Coord,
    },
    /// The active player changed.
    TurnChanged {
        /// Turn counter after the change.
        turn: u32,
        /// New active player.
        active_player: PlayerId,
    },
    /// The game reached a terminal phase.
    GameOver {
        /// Surviving players.
        winners: Vec<PlayerId>,
        /// Player whose starting city fell.
        eliminated: PlayerId,
    },
}

/// Receives post-commit notifications.
pub trait GameObserver {
    /// Called once per committed event, in commit order.
    fn on_event(&mut self, event: &GameEvent);
}

/// Observer that records every event, for tests and tools.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<GameEvent>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far.
    #[must_use]
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Take the recorded events, leaving the log empty.
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl GameObserver for EventLog {
    fn on_event(&mut self, event: &GameEvent) {
        self.events.push(event.clone());
    }
}

/// Shared handle to an observer owned elsewhere.
///
/// Lets a caller keep reading an [`EventLog`] after handing it to the engine.
impl<T: GameObserver> GameObserver for std::rc::Rc<std::cell::RefCell<T>> {
    fn on_event(&mut self, event: &GameEvent) {
        self.borrow_mut().on_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_event_log_records_in_order() {
        let mut log = EventLog::new();
        log.on_event(&GameEvent::TurnChanged {
            turn: 1,
            active_player: PlayerId(1),
        });
        log.on_event(&GameEvent::TurnChanged {
            turn: 2,
            active_player: PlayerId(0),
        });
        assert_eq!(log.events().len(), 2);
        let drained = log.drain();
        assert!(matches!(drained[1], GameEvent::TurnChanged { turn: 2, .. }));
        assert!(log.events().is_empty());
    }

    #[test]
    fn test_shared_observer() {
        let log = Rc::new(RefCell::new(EventLog::new()));
        let mut handle = Rc::clone(&log);
        handle.on_event(&GameEvent::GameOver {
            winners: vec![PlayerId(0)],
            eliminated: PlayerId(1),
        });
        assert_eq!(log.borrow().events().len(), 1);
    }
}
