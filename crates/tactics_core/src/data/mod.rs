//! Data structures for rule configuration.
//!
//! This module contains pure data structures that define unit, building,
//! terrain and faction numbers. All structs deserialize from RON.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `tactics_tools`.

mod building_data;
mod faction_data;
mod ruleset;
mod terrain_data;
mod unit_data;

pub use building_data::{BuildingData, BuildingTable};
pub use faction_data::FactionData;
pub use ruleset::Ruleset;
pub use terrain_data::{TerrainData, TerrainTable};
pub use unit_data::{UnitData, UnitTable};
