//! Building data structures for data-driven building definitions.

use serde::{Deserialize, Serialize};

use crate::components::{BuildingKind, UnitKind};
use crate::economy::ResourcePool;

/// Data-driven building definition.
///
/// # Example RON
///
/// ```ron
/// BuildingData(
///     health: 15,
///     defense: 2,
///     sight: 2,
///     cost: ResourcePool(food: 0, production: 10),
///     trains: [Melee, Ranged],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingData {
    /// Maximum health points.
    pub health: u32,

    /// Defense strength.
    pub defense: u32,

    /// Field of view radius.
    pub sight: u32,

    /// Resources spent by the build command.
    pub cost: ResourcePool,

    /// Unit types this building can train.
    #[serde(default)]
    pub trains: Vec<UnitKind>,
}

impl BuildingData {
    /// Check if this building can train a unit type.
    #[must_use]
    pub fn can_train(&self, unit: UnitKind) -> bool {
        self.trains.contains(&unit)
    }
}

/// One [`BuildingData`] per [`BuildingKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingTable {
    /// City stats.
    pub city: BuildingData,
    /// Barracks stats.
    pub barracks: BuildingData,
}

impl BuildingTable {
    /// Stats for a building type.
    #[must_use]
    pub const fn get(&self, kind: BuildingKind) -> &BuildingData {
        match kind {
            BuildingKind::City => &self.city,
            BuildingKind::Barracks => &self.barracks,
        }
    }
}

impl Default for BuildingTable {
    fn default() -> Self {
        Self {
            city: BuildingData {
                health: 25,
                defense: 3,
                sight: 3,
                cost: ResourcePool::new(10, 15),
                trains: vec![UnitKind::Worker],
            },
            barracks: BuildingData {
                health: 15,
                defense: 2,
                sight: 2,
                cost: ResourcePool::new(0, 10),
                trains: vec![UnitKind::Melee, UnitKind::Ranged],
            },
        }
    }
}
