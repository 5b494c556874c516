//! Map supplier format.
//!
//! The engine does not generate terrain. It consumes a finished
//! [`MapDefinition`]: a row-major tile list plus one starting coordinate per
//! player. Definitions load from RON or from a small ASCII notation used by
//! tests and the developer tools:
//!
//! | char | tile |
//! |---|---|
//! | `.` | grass, 8 food |
//! | `,` | barren grass, no resources |
//! | `f` | forest, 6 production |
//! | `h` | hill, 4 production |
//! | `#` | impassable rock |
//! | `0`-`7` | barren grass, starting position of that player |

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::{Coord, Terrain, Tile, TileGrid};

/// Resources on a `.` tile.
pub const ASCII_GRASS_RESOURCES: u32 = 8;
/// Resources on an `f` tile.
pub const ASCII_FOREST_RESOURCES: u32 = 6;
/// Resources on an `h` tile.
pub const ASCII_HILL_RESOURCES: u32 = 4;

/// A finished map handed to the turn controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDefinition {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Row-major tiles.
    pub tiles: Vec<Tile>,
    /// Starting city position per player, in seat order.
    pub starts: Vec<Coord>,
}

impl MapDefinition {
    /// Parse and validate a map from RON.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let map: Self = ron::from_str(source)
            .map_err(|source| GameError::DataParseError { what: "map", source })?;
        map.check()?;
        Ok(map)
    }

    /// Serialize to pretty RON.
    pub fn to_ron_string(&self) -> std::result::Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Parse the ASCII notation described in the module docs.
    ///
    /// Blank lines and surrounding whitespace are ignored. Every row must
    /// have the same length and start digits must run from `0` without gaps.
    pub fn from_ascii(text: &str) -> Result<Self> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.chars().count());
        if width == 0 {
            return Err(GameError::InvalidMap("empty ascii map".into()));
        }

        let mut tiles = Vec::with_capacity(width * height);
        let mut numbered: Vec<(u32, Coord)> = Vec::new();

        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(GameError::InvalidMap(format!(
                    "row {y} has {} columns, expected {width}",
                    row.chars().count()
                )));
            }
            for (x, ch) in row.chars().enumerate() {
                let tile = match ch {
                    '.' => Tile::new(Terrain::Grass, true, ASCII_GRASS_RESOURCES),
                    ',' => Tile::new(Terrain::Grass, true, 0),
                    'f' => Tile::new(Terrain::Forest, true, ASCII_FOREST_RESOURCES),
                    'h' => Tile::new(Terrain::Hill, true, ASCII_HILL_RESOURCES),
                    '#' => Tile::new(Terrain::Grass, false, 0),
                    '0'..='7' => {
                        let seat = ch.to_digit(10).unwrap_or(0);
                        numbered.push((seat, Coord::new(x as i32, y as i32)));
                        Tile::new(Terrain::Grass, true, 0)
                    }
                    other => {
                        return Err(GameError::InvalidMap(format!(
                            "unknown map character {other:?} at ({x}, {y})"
                        )));
                    }
                };
                tiles.push(tile);
            }
        }

        numbered.sort_by_key(|(seat, _)| *seat);
        for (expected, (seat, _)) in numbered.iter().enumerate() {
            if *seat as usize != expected {
                return Err(GameError::InvalidMap(format!(
                    "start markers must be numbered 0.. without gaps or repeats, found {seat}"
                )));
            }
        }

        let map = Self {
            width: width as u32,
            height: height as u32,
            tiles,
            starts: numbered.into_iter().map(|(_, at)| at).collect(),
        };
        map.check()?;
        Ok(map)
    }

    /// Validate shape and start positions.
    ///
    /// Returns a list of validation errors.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.width == 0 || self.height == 0 {
            errors.push(format!("map is {}x{}", self.width, self.height));
        }
        let expected = (self.width as usize) * (self.height as usize);
        if self.tiles.len() != expected {
            errors.push(format!(
                "map has {} tiles, expected {expected}",
                self.tiles.len()
            ));
        }
        errors
    }

    fn check(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(GameError::InvalidMap(errors.join("; ")))
        }
    }

    /// Build the grid.
    pub fn to_grid(&self) -> Result<TileGrid> {
        self.check()?;
        TileGrid::from_tiles(self.width, self.height, self.tiles.clone())
            .ok_or_else(|| GameError::InvalidMap("tile count does not match dimensions".into()))
    }
}
