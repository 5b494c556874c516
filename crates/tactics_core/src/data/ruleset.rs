//! The complete rule table handed to the engine at construction.

use serde::{Deserialize, Serialize};

use super::building_data::{BuildingData, BuildingTable};
use super::faction_data::FactionData;
use super::terrain_data::{TerrainData, TerrainTable};
use super::unit_data::{UnitData, UnitTable};
use crate::components::{BuildingKind, UnitKind};
use crate::economy::ResourcePool;
use crate::error::{GameError, Result};
use crate::factions::FactionId;
use crate::grid::Terrain;

/// Every number the simulation consults.
///
/// `Ruleset::default()` is the standard game. Overrides are loaded with
/// [`Ruleset::from_ron_str`], which also validates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruleset {
    /// Unit stats.
    #[serde(default)]
    pub units: UnitTable,

    /// Building stats.
    #[serde(default)]
    pub buildings: BuildingTable,

    /// Terrain combat and yield numbers.
    #[serde(default)]
    pub terrain: TerrainTable,

    /// Faction gathering bonuses.
    #[serde(default = "FactionData::defaults")]
    pub factions: Vec<FactionData>,

    /// Resources each player starts with.
    #[serde(default = "default_starting_resources")]
    pub starting_resources: ResourcePool,

    /// Units placed next to each starting city.
    #[serde(default = "default_starting_units")]
    pub starting_units: Vec<UnitKind>,
}

/// Default starting stockpile.
const fn default_starting_resources() -> ResourcePool {
    ResourcePool::new(10, 10)
}

/// Every player starts with a single worker.
fn default_starting_units() -> Vec<UnitKind> {
    vec![UnitKind::Worker]
}

impl Default for Ruleset {
    fn default() -> Self {
        Self {
            units: UnitTable::default(),
            buildings: BuildingTable::default(),
            terrain: TerrainTable::default(),
            factions: FactionData::defaults(),
            starting_resources: default_starting_resources(),
            starting_units: default_starting_units(),
        }
    }
}

impl Ruleset {
    /// Parse and validate a ruleset from RON.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let rules: Self = ron::from_str(source).map_err(|source| GameError::DataParseError {
            what: "ruleset",
            source,
        })?;
        let errors = rules.validate();
        if errors.is_empty() {
            Ok(rules)
        } else {
            Err(GameError::InvalidRuleset(errors.join("; ")))
        }
    }

    /// Serialize to pretty RON.
    pub fn to_ron_string(&self) -> std::result::Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Stats for a unit type.
    #[must_use]
    pub const fn unit(&self, kind: UnitKind) -> &UnitData {
        self.units.get(kind)
    }

    /// Stats for a building type.
    #[must_use]
    pub const fn building(&self, kind: BuildingKind) -> &BuildingData {
        self.buildings.get(kind)
    }

    /// Rules for a terrain type.
    #[must_use]
    pub const fn terrain(&self, terrain: Terrain) -> &TerrainData {
        self.terrain.get(terrain)
    }

    /// Faction bonus on a terrain.
    #[must_use]
    pub fn faction_bonus(&self, faction: FactionId, terrain: Terrain) -> u32 {
        self.factions
            .iter()
            .find(|f| f.id == faction)
            .map_or(0, |f| f.bonus_on(terrain))
    }

    /// Validate internal consistency.
    ///
    /// Checks that:
    /// - Every unit has positive health, speed, range and build time
    /// - Every building has positive health and trains something
    /// - Faction entries are unique
    ///
    /// Returns a list of validation errors.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for kind in UnitKind::ALL {
            let unit = self.unit(kind);
            if unit.health == 0 {
                errors.push(format!("Unit {kind:?} has zero health"));
            }
            if unit.speed == 0 {
                errors.push(format!("Unit {kind:?} has zero speed"));
            }
            if unit.attack_range == 0 {
                errors.push(format!("Unit {kind:?} has zero attack range"));
            }
            if unit.build_turns == 0 {
                errors.push(format!("Unit {kind:?} has zero build turns"));
            }
        }

        for kind in BuildingKind::ALL {
            let building = self.building(kind);
            if building.health == 0 {
                errors.push(format!("Building {kind:?} has zero health"));
            }
            if building.trains.is_empty() {
                errors.push(format!("Building {kind:?} trains nothing"));
            }
        }

        for (i, faction) in self.factions.iter().enumerate() {
            if self.factions[..i].iter().any(|f| f.id == faction.id) {
                errors.push(format!("Faction {:?} listed twice", faction.id));
            }
        }

        for terrain in Terrain::ALL {
            let data = self.terrain(terrain);
            if data.resource.is_some() && data.base_yield == 0 {
                errors.push(format!("Terrain {terrain:?} yields a resource but zero base yield"));
            }
        }

        errors
    }
}
