//! The tile grid shared by every subsystem.
//!
//! A [`TileGrid`] has a fixed shape for the lifetime of a game. Tiles store
//! terrain, walkability and remaining resources. Occupancy is never stored
//! here; it is derived from the entity registry.

use serde::{Deserialize, Serialize};

/// Orthogonal neighbour offsets, in the fixed order north, east, south, west.
///
/// Pathfinding expansion and production spawn placement both enumerate
/// neighbours in this order.
pub const ORTHOGONAL: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Integer tile coordinate. `y` grows downwards.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Coord {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Coord {
    /// Create a coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Coordinate shifted by an offset.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Manhattan (4-neighbour) distance.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The four orthogonal neighbours in [`ORTHOGONAL`] order.
    ///
    /// May include coordinates outside any grid.
    #[must_use]
    pub fn neighbors(self) -> [Self; 4] {
        ORTHOGONAL.map(|(dx, dy)| self.offset(dx, dy))
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Terrain type of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Terrain {
    /// Open plain. Yields food.
    #[default]
    Grass,
    /// Woodland. Yields production, gives light cover.
    Forest,
    /// High ground. Yields production, gives heavy cover and blocks sight.
    Hill,
}

impl Terrain {
    /// Every terrain type.
    pub const ALL: [Self; 3] = [Self::Grass, Self::Forest, Self::Hill];

    /// Whether this terrain stops line of sight.
    #[must_use]
    pub const fn blocks_sight(self) -> bool {
        matches!(self, Self::Hill)
    }
}

/// One cell of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tile {
    /// Terrain type.
    pub terrain: Terrain,
    /// Whether units may enter (false under buildings and impassable ground).
    pub walkable: bool,
    /// Remaining resource units. Only ever decreases.
    pub resources: u32,
}

impl Tile {
    /// Create a tile.
    #[must_use]
    pub const fn new(terrain: Terrain, walkable: bool, resources: u32) -> Self {
        Self {
            terrain,
            walkable,
            resources,
        }
    }
}

/// Rectangular grid of tiles stored in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Create a grid filled with one tile.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn filled(width: u32, height: u32, tile: Tile) -> Self {
        assert!(width > 0, "TileGrid width must be positive");
        assert!(height > 0, "TileGrid height must be positive");
        Self {
            width,
            height,
            tiles: vec![tile; (width as usize) * (height as usize)],
        }
    }

    /// Create a grid from row-major tiles.
    ///
    /// Returns `None` if the tile count does not match the dimensions or a
    /// dimension is zero.
    #[must_use]
    pub fn from_tiles(width: u32, height: u32, tiles: Vec<Tile>) -> Option<Self> {
        if width == 0 || height == 0 || tiles.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
            width,
            height,
            tiles,
        })
    }

    /// Grid width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Always false; grids have at least one tile.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Check if coordinates are within grid bounds.
    #[must_use]
    pub fn in_bounds(&self, at: Coord) -> bool {
        at.x >= 0 && at.y >= 0 && (at.x as u32) < self.width && (at.y as u32) < self.height
    }

    /// Row-major index of a coordinate, `None` when out of bounds.
    #[inline]
    #[must_use]
    pub fn index(&self, at: Coord) -> Option<usize> {
        if self.in_bounds(at) {
            Some((at.y as usize) * (self.width as usize) + (at.x as usize))
        } else {
            None
        }
    }

    /// Coordinate for a row-major index.
    #[must_use]
    pub fn coord_of(&self, index: usize) -> Coord {
        let w = self.width as usize;
        Coord::new((index % w) as i32, (index / w) as i32)
    }

    /// Get a tile. Returns `None` if out of bounds.
    #[must_use]
    pub fn get(&self, at: Coord) -> Option<&Tile> {
        self.index(at).map(|i| &self.tiles[i])
    }

    fn get_mut(&mut self, at: Coord) -> Option<&mut Tile> {
        self.index(at).map(move |i| &mut self.tiles[i])
    }

    /// Terrain at a coordinate.
    #[must_use]
    pub fn terrain(&self, at: Coord) -> Option<Terrain> {
        self.get(at).map(|t| t.terrain)
    }

    /// Check if a tile is in bounds and walkable.
    #[must_use]
    pub fn is_walkable(&self, at: Coord) -> bool {
        self.get(at).is_some_and(|t| t.walkable)
    }

    /// Whether the tile stops line of sight. Out-of-bounds tiles are opaque.
    #[must_use]
    pub fn blocks_sight(&self, at: Coord) -> bool {
        self.get(at).map_or(true, |t| t.terrain.blocks_sight())
    }

    /// Remaining resources at a coordinate (0 when out of bounds).
    #[must_use]
    pub fn resources(&self, at: Coord) -> u32 {
        self.get(at).map_or(0, |t| t.resources)
    }

    /// Set the walkable flag. Returns `false` if out of bounds.
    pub fn set_walkable(&mut self, at: Coord, walkable: bool) -> bool {
        match self.get_mut(at) {
            Some(tile) => {
                tile.walkable = walkable;
                true
            }
            None => false,
        }
    }

    /// Remove one resource unit from a tile.
    ///
    /// Returns the amount left, or `None` when the tile is out of bounds or
    /// already depleted (in which case nothing changes).
    pub fn take_resource(&mut self, at: Coord) -> Option<u32> {
        let tile = self.get_mut(at)?;
        if tile.resources == 0 {
            return None;
        }
        tile.resources -= 1;
        Some(tile.resources)
    }

    /// In-bounds orthogonal neighbours in [`ORTHOGONAL`] order.
    pub fn neighbors(&self, at: Coord) -> impl Iterator<Item = Coord> + '_ {
        at.neighbors().into_iter().filter(|n| self.in_bounds(*n))
    }

    /// Every coordinate in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.tiles.len()).map(|i| self.coord_of(i))
    }

    /// Iterate over all tiles with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, &Tile)> {
        let w = self.width as usize;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, t)| (Coord::new((i % w) as i32, (i / w) as i32), t))
    }

    /// Total resources left on the map.
    #[must_use]
    pub fn total_resources(&self) -> u64 {
        self.tiles.iter().map(|t| u64::from(t.resources)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grass(resources: u32) -> Tile {
        Tile::new(Terrain::Grass, true, resources)
    }

    #[test]
    fn test_grid_creation() {
        let grid = TileGrid::filled(4, 3, grass(0));
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.len(), 12);
    }

    #[test]
    fn test_from_tiles_rejects_bad_shape() {
        assert!(TileGrid::from_tiles(2, 2, vec![grass(0); 3]).is_none());
        assert!(TileGrid::from_tiles(0, 2, Vec::new()).is_none());
        assert!(TileGrid::from_tiles(2, 2, vec![grass(0); 4]).is_some());
    }

    #[test]
    fn test_bounds_and_index() {
        let grid = TileGrid::filled(3, 2, grass(0));
        assert_eq!(grid.index(Coord::new(0, 0)), Some(0));
        assert_eq!(grid.index(Coord::new(2, 1)), Some(5));
        assert_eq!(grid.index(Coord::new(3, 0)), None);
        assert_eq!(grid.index(Coord::new(-1, 0)), None);
        assert_eq!(grid.coord_of(4), Coord::new(1, 1));
    }

    #[test]
    fn test_take_resource_never_negative() {
        let mut grid = TileGrid::filled(1, 1, grass(2));
        let at = Coord::new(0, 0);
        assert_eq!(grid.take_resource(at), Some(1));
        assert_eq!(grid.take_resource(at), Some(0));
        assert_eq!(grid.take_resource(at), None);
        assert_eq!(grid.resources(at), 0);
    }

    #[test]
    fn test_neighbors_order_and_clipping() {
        let grid = TileGrid::filled(3, 3, grass(0));
        let n: Vec<_> = grid.neighbors(Coord::new(1, 1)).collect();
        assert_eq!(
            n,
            vec![
                Coord::new(1, 0),
                Coord::new(2, 1),
                Coord::new(1, 2),
                Coord::new(0, 1)
            ]
        );
        let corner: Vec<_> = grid.neighbors(Coord::new(0, 0)).collect();
        assert_eq!(corner, vec![Coord::new(1, 0), Coord::new(0, 1)]);
    }

    #[test]
    fn test_blocks_sight() {
        let mut tiles = vec![grass(0); 2];
        tiles[1].terrain = Terrain::Hill;
        let grid = TileGrid::from_tiles(2, 1, tiles).unwrap();
        assert!(!grid.blocks_sight(Coord::new(0, 0)));
        assert!(grid.blocks_sight(Coord::new(1, 0)));
        assert!(grid.blocks_sight(Coord::new(5, 5)));
    }

    #[test]
    fn test_manhattan() {
        assert_eq!(Coord::new(0, 0).manhattan(Coord::new(3, -2)), 5);
        assert_eq!(Coord::new(2, 2).manhattan(Coord::new(2, 2)), 0);
    }
}
