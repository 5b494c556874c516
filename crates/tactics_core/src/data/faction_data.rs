//! Faction-specific gathering bonuses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::factions::FactionId;
use crate::grid::Terrain;

/// Bonus table for one faction.
///
/// # Example RON
///
/// ```ron
/// FactionData(
///     id: Verdant,
///     yield_bonus: { Grass: 1 },
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionData {
    /// Faction identifier.
    pub id: FactionId,

    /// Extra yield per gather, keyed by terrain.
    #[serde(default)]
    pub yield_bonus: BTreeMap<Terrain, u32>,
}

impl FactionData {
    /// Bonus yield on a terrain (0 when none).
    #[must_use]
    pub fn bonus_on(&self, terrain: Terrain) -> u32 {
        self.yield_bonus.get(&terrain).copied().unwrap_or(0)
    }

    /// The standard bonus table for every faction.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        let single = |id, terrain| Self {
            id,
            yield_bonus: BTreeMap::from([(terrain, 1)]),
        };
        vec![
            single(FactionId::Verdant, Terrain::Grass),
            single(FactionId::Ironhold, Terrain::Hill),
            single(FactionId::Sylvan, Terrain::Forest),
            Self {
                id: FactionId::Nomads,
                yield_bonus: BTreeMap::new(),
            },
        ]
    }
}
