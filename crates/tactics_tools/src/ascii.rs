//! ASCII views of a game from one player's perspective.
//!
//! | glyph | meaning |
//! |---|---|
//! | `?` | never explored |
//! | `.` `f` `h` `#` | grass, forest, hill, impassable |
//! | `W` `M` `R` / `w` `m` `r` | own / enemy worker, melee, ranged |
//! | `C` `B` / `c` `b` | own / enemy city, barracks |
//! | `*` | tile the highlighted unit can reach this turn |
//!
//! Entities only show on tiles the player currently sees.

use std::collections::HashSet;
use std::fmt::Write as _;

use tactics_core::components::{BuildingKind, EntityId, PlayerId, UnitKind};
use tactics_core::grid::{Coord, Terrain};
use tactics_core::turn::TurnController;

/// Render the map as seen by `viewer`, optionally marking where `highlight`
/// can move.
#[must_use]
pub fn render_view(game: &TurnController, viewer: PlayerId, highlight: Option<EntityId>) -> String {
    let reach: HashSet<Coord> = highlight
        .map(|unit| game.reachable_tiles(unit).into_iter().collect())
        .unwrap_or_default();
    let grid = game.grid();
    let mut out = String::with_capacity(((grid.width() + 1) * grid.height()) as usize);

    for y in 0..grid.height() as i32 {
        for x in 0..grid.width() as i32 {
            let at = Coord::new(x, y);
            out.push(glyph(game, viewer, at, &reach));
        }
        out.push('\n');
    }
    out
}

fn glyph(game: &TurnController, viewer: PlayerId, at: Coord, reach: &HashSet<Coord>) -> char {
    if !game.is_explored(viewer, at) {
        return '?';
    }
    if game.is_visible(viewer, at) {
        if let Some(entity) = game.registry().occupant(at).and_then(|id| game.registry().entity(id)) {
            let own = entity.owner() == viewer;
            let letter = match (game.unit(entity.id()), game.building(entity.id())) {
                (Some(unit), _) => unit_letter(unit.kind),
                (None, Some(building)) => building_letter(building.kind),
                (None, None) => '!',
            };
            return if own { letter } else { letter.to_ascii_lowercase() };
        }
    }
    if reach.contains(&at) {
        return '*';
    }
    let Some(tile) = game.grid().get(at) else {
        return ' ';
    };
    if !tile.walkable {
        return '#';
    }
    match tile.terrain {
        Terrain::Grass => '.',
        Terrain::Forest => 'f',
        Terrain::Hill => 'h',
    }
}

const fn unit_letter(kind: UnitKind) -> char {
    match kind {
        UnitKind::Worker => 'W',
        UnitKind::Melee => 'M',
        UnitKind::Ranged => 'R',
    }
}

const fn building_letter(kind: BuildingKind) -> char {
    match kind {
        BuildingKind::City => 'C',
        BuildingKind::Barracks => 'B',
    }
}

/// One line per player: resources and entity counts.
#[must_use]
pub fn render_players(game: &TurnController) -> String {
    let mut out = String::new();
    for player in game.registry().players() {
        let _ = writeln!(
            out,
            "{} {:<8} food {:>3}  production {:>3}  units {:>2}  buildings {:>2}{}",
            player.id,
            player.faction.short_name(),
            player.resources.food,
            player.resources.production,
            player.units.len(),
            player.buildings.len(),
            if player.eliminated { "  (eliminated)" } else { "" },
        );
    }
    out
}
