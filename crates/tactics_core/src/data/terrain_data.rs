//! Per-terrain combat and yield numbers.

use serde::{Deserialize, Serialize};

use crate::economy::ResourceKind;
use crate::grid::Terrain;

/// Rules attached to one terrain type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainData {
    /// Added to a defender's defense before halving.
    pub defense_bonus: u32,
    /// Resource gathered here, if any.
    pub resource: Option<ResourceKind>,
    /// Amount gathered per action before faction bonuses.
    pub base_yield: u32,
}

/// One [`TerrainData`] per [`Terrain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainTable {
    /// Grass rules.
    pub grass: TerrainData,
    /// Forest rules.
    pub forest: TerrainData,
    /// Hill rules.
    pub hill: TerrainData,
}

impl TerrainTable {
    /// Rules for a terrain type.
    #[must_use]
    pub const fn get(&self, terrain: Terrain) -> &TerrainData {
        match terrain {
            Terrain::Grass => &self.grass,
            Terrain::Forest => &self.forest,
            Terrain::Hill => &self.hill,
        }
    }
}

impl Default for TerrainTable {
    fn default() -> Self {
        Self {
            grass: TerrainData {
                defense_bonus: 0,
                resource: Some(ResourceKind::Food),
                base_yield: 2,
            },
            forest: TerrainData {
                defense_bonus: 1,
                resource: Some(ResourceKind::Production),
                base_yield: 2,
            },
            hill: TerrainData {
                defense_bonus: 2,
                resource: Some(ResourceKind::Production),
                base_yield: 1,
            },
        }
    }
}
