//! Fog of war.
//!
//! Each player owns a [`FogLayer`] with two same-shaped bitmaps:
//! - `explored`: every tile the player has ever seen. Never cleared.
//! - `visible`: tiles seen right now. Rebuilt from scratch on every update.
//!
//! Field of view uses recursive shadowcasting. Each of the eight octants is
//! scanned row by row away from the viewer while a start/end slope pair
//! narrows as sight-blocking terrain (hills) is found. Slopes are fixed-point
//! so the lit set is identical on every platform.

use serde::{Deserialize, Serialize};

use crate::components::PlayerId;
use crate::grid::{Coord, TileGrid};
use crate::math::{ratio, Fixed};

/// Octant transforms `(xx, xy, yx, yy)`.
///
/// A cell at row `j`, column offset `dx` maps to
/// `(cx + dx*xx + dy*xy, cy + dx*yx + dy*yy)` with `dy = -j`.
const OCTANTS: [(i32, i32, i32, i32); 8] = [
    (1, 0, 0, 1),
    (0, 1, 1, 0),
    (0, -1, 1, 0),
    (-1, 0, 0, 1),
    (-1, 0, 0, -1),
    (0, -1, -1, 0),
    (0, 1, -1, 0),
    (1, 0, 0, -1),
];

/// Something that sees: a tile and a sight radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SightSource {
    /// Viewer position.
    pub origin: Coord,
    /// Sight radius in tiles (compared against squared distance).
    pub range: u32,
}

/// One player's explored/visible bitmaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FogLayer {
    width: u32,
    height: u32,
    explored: Vec<bool>,
    visible: Vec<bool>,
    /// Debug override: everything stays visible.
    revealed: bool,
}

impl FogLayer {
    /// Create a layer with nothing seen.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let total = (width as usize) * (height as usize);
        Self {
            width,
            height,
            explored: vec![false; total],
            visible: vec![false; total],
            revealed: false,
        }
    }

    #[inline]
    fn index(&self, at: Coord) -> Option<usize> {
        if at.x >= 0 && at.y >= 0 && (at.x as u32) < self.width && (at.y as u32) < self.height {
            Some((at.y as usize) * (self.width as usize) + (at.x as usize))
        } else {
            None
        }
    }

    /// Whether the tile is seen right now.
    #[must_use]
    pub fn is_visible(&self, at: Coord) -> bool {
        self.index(at).is_some_and(|i| self.visible[i])
    }

    /// Whether the tile has ever been seen.
    #[must_use]
    pub fn is_explored(&self, at: Coord) -> bool {
        self.index(at).is_some_and(|i| self.explored[i])
    }

    /// Number of currently visible tiles.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|v| **v).count()
    }

    /// Number of explored tiles.
    #[must_use]
    pub fn explored_count(&self) -> usize {
        self.explored.iter().filter(|v| **v).count()
    }

    /// Raw visible bitmap in row-major order.
    #[must_use]
    pub fn visible(&self) -> &[bool] {
        &self.visible
    }

    /// Raw explored bitmap in row-major order.
    #[must_use]
    pub fn explored(&self) -> &[bool] {
        &self.explored
    }

    fn mark_visible(&mut self, at: Coord) {
        if let Some(i) = self.index(at) {
            self.visible[i] = true;
        }
    }

    /// Recompute `visible` from the given sources, then fold it into `explored`.
    pub fn update<I>(&mut self, grid: &TileGrid, sources: I)
    where
        I: IntoIterator<Item = SightSource>,
    {
        if self.revealed {
            return;
        }
        self.visible.fill(false);
        for source in sources {
            cast_field_of_view(grid, source.origin, source.range, |at| {
                self.mark_visible(at);
            });
        }
        for (explored, visible) in self.explored.iter_mut().zip(&self.visible) {
            *explored |= *visible;
        }
    }

    /// Make every tile explored and keep every tile visible from now on.
    pub fn reveal_all(&mut self) {
        self.revealed = true;
        self.visible.fill(true);
        self.explored.fill(true);
    }

    /// Mark a disc of tiles visible and explored, ignoring terrain.
    ///
    /// The visible part lasts until the next [`FogLayer::update`].
    pub fn reveal_area(&mut self, center: Coord, radius: u32) {
        let r = clamp_radius(radius, self.width, self.height);
        let r_sq = i64::from(r).pow(2);
        for dy in -r..=r {
            for dx in -r..=r {
                if i64::from(dx).pow(2) + i64::from(dy).pow(2) > r_sq {
                    continue;
                }
                if let Some(i) = self.index(center.offset(dx, dy)) {
                    self.visible[i] = true;
                    self.explored[i] = true;
                }
            }
        }
    }
}

/// Per-player fog of war.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityEngine {
    layers: Vec<FogLayer>,
}

impl VisibilityEngine {
    /// Create unexplored layers for `player_count` players.
    #[must_use]
    pub fn new(player_count: usize, width: u32, height: u32) -> Self {
        Self {
            layers: vec![FogLayer::new(width, height); player_count],
        }
    }

    /// One player's layer.
    #[must_use]
    pub fn layer(&self, player: PlayerId) -> Option<&FogLayer> {
        self.layers.get(player.index())
    }

    /// Recompute a player's visibility from their units and buildings.
    pub fn update<I>(&mut self, player: PlayerId, grid: &TileGrid, sources: I)
    where
        I: IntoIterator<Item = SightSource>,
    {
        if let Some(layer) = self.layers.get_mut(player.index()) {
            layer.update(grid, sources);
        }
    }

    /// Whether a player sees a tile right now.
    #[must_use]
    pub fn is_visible(&self, player: PlayerId, at: Coord) -> bool {
        self.layer(player).is_some_and(|l| l.is_visible(at))
    }

    /// Whether a player has ever seen a tile.
    #[must_use]
    pub fn is_explored(&self, player: PlayerId, at: Coord) -> bool {
        self.layer(player).is_some_and(|l| l.is_explored(at))
    }

    /// Reveal the whole map to a player.
    pub fn reveal_all(&mut self, player: PlayerId) {
        if let Some(layer) = self.layers.get_mut(player.index()) {
            layer.reveal_all();
        }
    }

    /// Reveal a disc of the map to a player.
    pub fn reveal_area(&mut self, player: PlayerId, center: Coord, radius: u32) {
        if let Some(layer) = self.layers.get_mut(player.index()) {
            layer.reveal_area(center, radius);
        }
    }
}

/// Call `mark` for every tile visible from `origin` within `range`.
///
/// The origin is always marked. Sight-blocking tiles are marked themselves
/// but shadow whatever lies behind them. Tiles outside the grid are opaque
/// and never marked.
pub fn cast_field_of_view<F>(grid: &TileGrid, origin: Coord, range: u32, mut mark: F)
where
    F: FnMut(Coord),
{
    if !grid.in_bounds(origin) {
        return;
    }
    mark(origin);
    let radius = clamp_radius(range, grid.width(), grid.height());
    for transform in OCTANTS {
        cast_octant(
            grid,
            origin,
            1,
            Fixed::ONE,
            Fixed::ZERO,
            radius,
            transform,
            &mut mark,
        );
    }
}

/// A radius reaching past the grid lights the same tiles as one that just
/// spans it.
fn clamp_radius(radius: u32, width: u32, height: u32) -> i32 {
    i32::try_from(radius.min(width.saturating_add(height))).unwrap_or(i32::MAX)
}

/// Scan one octant from `row` outwards between slopes `start` and `end`.
fn cast_octant<F>(
    grid: &TileGrid,
    origin: Coord,
    row: i32,
    mut start: Fixed,
    end: Fixed,
    radius: i32,
    (xx, xy, yx, yy): (i32, i32, i32, i32),
    mark: &mut F,
) where
    F: FnMut(Coord),
{
    if start < end {
        return;
    }
    let radius_sq = i64::from(radius).pow(2);
    let mut new_start = Fixed::ZERO;

    for j in row..=radius {
        let dy = -j;
        let mut blocked = false;
        let mut dx = -j - 1;

        while dx <= 0 {
            dx += 1;
            let at = Coord::new(
                origin.x + dx * xx + dy * xy,
                origin.y + dx * yx + dy * yy,
            );
            // Slopes through the cell's two outer corners
            let left_slope = ratio(2 * dx - 1, 2 * dy + 1);
            let right_slope = ratio(2 * dx + 1, 2 * dy - 1);

            if start < right_slope {
                continue;
            }
            if end > left_slope {
                break;
            }

            if i64::from(dx).pow(2) + i64::from(dy).pow(2) <= radius_sq && grid.in_bounds(at) {
                mark(at);
            }

            let opaque = grid.blocks_sight(at);
            if blocked {
                if opaque {
                    new_start = right_slope;
                    continue;
                }
                blocked = false;
                start = new_start;
            } else if opaque && j < radius {
                blocked = true;
                cast_octant(
                    grid,
                    origin,
                    j + 1,
                    start,
                    left_slope,
                    radius,
                    (xx, xy, yx, yy),
                    mark,
                );
                new_start = right_slope;
            }
        }

        if blocked {
            break;
        }
    }
}
