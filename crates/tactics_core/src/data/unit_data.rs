//! Unit data structures for data-driven unit definitions.

use serde::{Deserialize, Serialize};

use crate::components::UnitKind;
use crate::economy::ResourcePool;

/// Data-driven unit definition.
///
/// # Example RON
///
/// ```ron
/// UnitData(
///     health: 12,
///     attack: 4,
///     defense: 2,
///     speed: 2,
///     attack_range: 1,
///     sight: 2,
///     cost: ResourcePool(food: 2, production: 6),
///     build_turns: 2,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitData {
    /// Maximum health points.
    pub health: u32,

    /// Attack strength.
    pub attack: u32,

    /// Defense strength.
    pub defense: u32,

    /// Tiles of movement per turn.
    pub speed: u32,

    /// Manhattan attack range.
    pub attack_range: u32,

    /// Field of view radius.
    pub sight: u32,

    /// Resources spent to queue this unit.
    pub cost: ResourcePool,

    /// End-turns between queueing and spawning.
    pub build_turns: u32,

    /// Whether a freshly produced unit may move and act before its owner's
    /// next turn starts.
    #[serde(default)]
    pub can_act_on_spawn: bool,
}

/// One [`UnitData`] per [`UnitKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTable {
    /// Worker stats.
    pub worker: UnitData,
    /// Melee stats.
    pub melee: UnitData,
    /// Ranged stats.
    pub ranged: UnitData,
}

impl UnitTable {
    /// Stats for a unit type.
    #[must_use]
    pub const fn get(&self, kind: UnitKind) -> &UnitData {
        match kind {
            UnitKind::Worker => &self.worker,
            UnitKind::Melee => &self.melee,
            UnitKind::Ranged => &self.ranged,
        }
    }
}

impl Default for UnitTable {
    fn default() -> Self {
        Self {
            worker: UnitData {
                health: 8,
                attack: 1,
                defense: 1,
                speed: 3,
                attack_range: 1,
                sight: 2,
                cost: ResourcePool::new(4, 0),
                build_turns: 2,
                can_act_on_spawn: false,
            },
            melee: UnitData {
                health: 12,
                attack: 4,
                defense: 2,
                speed: 2,
                attack_range: 1,
                sight: 2,
                cost: ResourcePool::new(2, 6),
                build_turns: 2,
                can_act_on_spawn: false,
            },
            ranged: UnitData {
                health: 8,
                attack: 3,
                defense: 1,
                speed: 2,
                attack_range: 2,
                sight: 3,
                cost: ResourcePool::new(2, 8),
                build_turns: 3,
                can_act_on_spawn: false,
            },
        }
    }
}
