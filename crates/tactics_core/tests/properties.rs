//! Property tests for the search, sight and command rules.

use std::collections::{HashSet, VecDeque};

use tactics_core::combat::calculate_damage;
use tactics_core::grid::{Coord, Terrain, Tile, TileGrid};
use tactics_core::invariants::check_invariants;
use tactics_core::pathfinding::{find_path, find_tiles_in_range, path_cost};
use tactics_core::visibility::{FogLayer, SightSource};
use tactics_test_utils::determinism::strategies::arb_script;
use tactics_test_utils::fixtures::hot_seat_duel;
use tactics_test_utils::proptest::prelude::*;

const W: u32 = 10;
const H: u32 = 8;

/// Random 10x8 grid: mostly open grass, some rock, forests and hills.
fn arb_grid() -> impl Strategy<Value = TileGrid> {
    proptest::collection::vec(0u8..10, (W * H) as usize).prop_map(|cells| {
        let tiles = cells
            .into_iter()
            .map(|c| match c {
                0 => Tile::new(Terrain::Grass, false, 0),
                1 => Tile::new(Terrain::Forest, true, 6),
                2 => Tile::new(Terrain::Hill, true, 4),
                _ => Tile::new(Terrain::Grass, true, 8),
            })
            .collect();
        TileGrid::from_tiles(W, H, tiles).unwrap()
    })
}

fn arb_coord() -> impl Strategy<Value = Coord> {
    (0..W as i32, 0..H as i32).prop_map(|(x, y)| Coord::new(x, y))
}

/// Reference flood fill.
fn brute_force_range(grid: &TileGrid, origin: Coord, budget: u32) -> HashSet<Coord> {
    let mut seen = HashSet::from([origin]);
    let mut queue = VecDeque::from([(origin, 0)]);
    while let Some((at, d)) = queue.pop_front() {
        if d == budget {
            continue;
        }
        for (dx, dy) in [(0, -1), (1, 0), (0, 1), (-1, 0)] {
            let next = Coord::new(at.x + dx, at.y + dy);
            if grid.is_walkable(next) && seen.insert(next) {
                queue.push_back((next, d + 1));
            }
        }
    }
    seen
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_paths_are_walkable_chains(
        grid in arb_grid(),
        start in arb_coord(),
        goal in arb_coord(),
        budget in 0u32..20,
    ) {
        let path = find_path(&grid, start, goal, budget);
        if let Some(first) = path.first() {
            prop_assert_eq!(*first, start);
            prop_assert!(path_cost(&path) <= budget);
            for pair in path.windows(2) {
                prop_assert_eq!(pair[0].manhattan(pair[1]), 1);
                prop_assert!(grid.is_walkable(pair[1]));
            }
            let unique: HashSet<_> = path.iter().collect();
            prop_assert_eq!(unique.len(), path.len());
        }
    }

    #[test]
    fn prop_paths_reaching_goal_are_shortest(
        grid in arb_grid(),
        start in arb_coord(),
        goal in arb_coord(),
    ) {
        prop_assume!(grid.is_walkable(start) && grid.is_walkable(goal));
        let budget = W * H;
        let path = find_path(&grid, start, goal, budget);
        let reachable = brute_force_range(&grid, start, budget).contains(&goal);
        prop_assert_eq!(path.last() == Some(&goal), reachable);
        if reachable && start != goal {
            // Every tile reachable within cost - 1 excludes the goal
            let cost = path_cost(&path);
            prop_assert!(!brute_force_range(&grid, start, cost - 1).contains(&goal));
        }
    }

    #[test]
    fn prop_range_matches_brute_force(
        grid in arb_grid(),
        origin in arb_coord(),
        budget in 0u32..8,
    ) {
        prop_assume!(grid.is_walkable(origin));
        let fast: HashSet<Coord> = find_tiles_in_range(&grid, origin, budget).into_iter().collect();
        prop_assert_eq!(fast, brute_force_range(&grid, origin, budget));
    }

    #[test]
    fn prop_neighbours_of_sources_are_visible(
        grid in arb_grid(),
        origin in arb_coord(),
        range in 2u32..6,
    ) {
        let mut fog = FogLayer::new(W, H);
        fog.update(&grid, [SightSource { origin, range }]);
        prop_assert!(fog.is_visible(origin));
        for dy in -1..=1 {
            for dx in -1..=1 {
                let at = Coord::new(origin.x + dx, origin.y + dy);
                if grid.in_bounds(at) {
                    prop_assert!(fog.is_visible(at), "{} not visible from {}", at, origin);
                }
            }
        }
    }

    #[test]
    fn prop_explored_is_monotonic(
        grid in arb_grid(),
        origins in proptest::collection::vec(arb_coord(), 1..8),
        range in 1u32..5,
    ) {
        let mut fog = FogLayer::new(W, H);
        let mut explored_before = fog.explored().to_vec();
        for origin in origins {
            fog.update(&grid, [SightSource { origin, range }]);
            let explored = fog.explored();
            for (before, now) in explored_before.iter().zip(explored) {
                prop_assert!(!before || *now);
            }
            for (visible, explored) in fog.visible().iter().zip(explored) {
                prop_assert!(!visible || *explored);
            }
            explored_before = explored.to_vec();
        }
    }

    #[test]
    fn prop_damage_formula(attack in 0u32..40, defense in 0u32..40, bonus in 0u32..4) {
        let damage = calculate_damage(attack, defense, bonus);
        prop_assert!(damage >= 1);
        let raw = (2 * i64::from(attack) - i64::from(defense) - i64::from(bonus)).div_euclid(2);
        prop_assert_eq!(i64::from(damage), raw.max(1));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_random_commands_keep_invariants(script in arb_script(60, 10, 8, 6)) {
        let mut game = hot_seat_duel();
        let mut resources: Vec<u32> = game.grid().iter().map(|(_, t)| t.resources).collect();

        for command in script {
            let before = game.state_hash();
            let result = game.apply(command);
            if result.is_err() {
                prop_assert_eq!(game.state_hash(), before, "rejected {:?} changed state", command);
            }

            prop_assert!(check_invariants(&game).is_empty());
            for unit in game.registry().units() {
                prop_assert!(unit.moves_left <= unit.speed);
                prop_assert!(unit.actions_left <= 1);
            }
            for ((_, tile), last) in game.grid().iter().zip(resources.iter_mut()) {
                prop_assert!(tile.resources <= *last);
                *last = tile.resources;
            }
        }
    }
}
