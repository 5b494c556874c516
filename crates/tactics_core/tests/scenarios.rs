//! End-to-end scenarios driven through the turn controller.

use std::cell::RefCell;
use std::rc::Rc;

use tactics_core::prelude::*;
use tactics_core::invariants::check_invariants;
use tactics_test_utils::fixtures::{
    entity_at, map, starting_city, units_of_kind, ScenarioBuilder, ScriptedAi, CORRIDOR_MAP,
    DUEL_MAP,
};

fn observed(game: &mut TurnController) -> Rc<RefCell<EventLog>> {
    let log = Rc::new(RefCell::new(EventLog::new()));
    game.add_observer(Box::new(Rc::clone(&log)));
    log
}

/// Melee strong enough to one-shot a city.
fn siege_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.ruleset.units.melee.attack = 40;
    config
}

// =========================================================================
// Scenario A: opening state and a first gather
// =========================================================================

#[test]
fn scenario_a_opening_and_gather() {
    let mut game = ScenarioBuilder::new(DUEL_MAP)
        .players(vec![
            PlayerSetup::human(FactionId::Nomads),
            PlayerSetup::human(FactionId::Ironhold),
        ])
        .build();

    for player in [PlayerId(0), PlayerId(1)] {
        let city = game.building(starting_city(&game, player)).unwrap();
        assert_eq!(city.kind, BuildingKind::City);
        assert_eq!(city.health, Health::new(25));
        assert_eq!(city.defense, 3);

        let workers = units_of_kind(&game, player, UnitKind::Worker);
        assert_eq!(workers.len(), 1);
        assert_eq!(game.unit(workers[0]).unwrap().health, Health::new(8));
    }

    let worker = units_of_kind(&game, PlayerId(0), UnitKind::Worker)[0];
    let grass = Coord::new(2, 0);
    assert_eq!(game.grid().resources(grass), 8);
    let food_before = game.player(PlayerId(0)).unwrap().resources.food;

    let outcome = game.gather(worker, grass).unwrap();
    assert_eq!(outcome.resource, ResourceKind::Food);
    assert_eq!(outcome.amount, 2);
    assert_eq!(game.grid().resources(grass), 7);
    assert_eq!(
        game.player(PlayerId(0)).unwrap().resources.food,
        food_before + 2
    );
    assert!(!game.unit(worker).unwrap().has_action());
}

#[test]
fn scenario_a_faction_bonus_applies() {
    // Seat 0 plays Verdant, who get +1 on grass
    let mut game = ScenarioBuilder::new(DUEL_MAP).build();
    let worker = units_of_kind(&game, PlayerId(0), UnitKind::Worker)[0];
    let food_before = game.player(PlayerId(0)).unwrap().resources.food;

    game.gather(worker, Coord::new(2, 0)).unwrap();
    assert_eq!(
        game.player(PlayerId(0)).unwrap().resources.food,
        food_before + 3
    );
}

// =========================================================================
// Scenario B: damage on plain terrain
// =========================================================================

#[test]
fn scenario_b_melee_hits_for_three() {
    let mut game = ScenarioBuilder::new(DUEL_MAP)
        .without_starting_units()
        .unit(PlayerId(0), UnitKind::Melee, Coord::new(3, 2))
        .unit(PlayerId(1), UnitKind::Worker, Coord::new(4, 2))
        .build();
    let melee = units_of_kind(&game, PlayerId(0), UnitKind::Melee)[0];
    let worker = units_of_kind(&game, PlayerId(1), UnitKind::Worker)[0];
    let log = observed(&mut game);

    assert_eq!(game.attack_targets(melee), vec![worker]);
    let outcome = game.attack(melee, worker).unwrap();
    assert_eq!(outcome.damage, 3);
    assert_eq!(outcome.remaining_health, 5);
    assert!(!outcome.destroyed);
    assert!(game.attack_targets(melee).is_empty());
    assert_eq!(
        log.borrow().events(),
        &[GameEvent::AttackResolved {
            attacker: melee,
            target: worker,
            damage: 3,
            remaining_health: 5,
            destroyed: false,
        }]
    );

    // One action per turn
    assert_eq!(game.attack(melee, worker), Err(Rejection::NoActionsLeft));
}

#[test]
fn test_kill_frees_tile_and_clears_selection() {
    let mut game = ScenarioBuilder::new(DUEL_MAP)
        .config(siege_config())
        .without_starting_units()
        .unit(PlayerId(0), UnitKind::Melee, Coord::new(3, 2))
        .unit(PlayerId(1), UnitKind::Worker, Coord::new(4, 2))
        .build();
    let melee = units_of_kind(&game, PlayerId(0), UnitKind::Melee)[0];
    let worker = units_of_kind(&game, PlayerId(1), UnitKind::Worker)[0];
    game.select_entity(worker).unwrap();

    let result = game.move_or_act(melee, Coord::new(4, 2)).unwrap();
    let ActionOutcome::Attacked(outcome) = result else {
        panic!("expected an attack, got {result:?}");
    };
    assert!(outcome.destroyed);
    assert!(game.unit(worker).is_none());
    assert_eq!(entity_at(&game, Coord::new(4, 2)), None);
    assert_eq!(game.selection(), None);
    assert!(check_invariants(&game).is_empty());
}

#[test]
fn test_ranged_reaches_two_tiles() {
    let mut game = ScenarioBuilder::new(DUEL_MAP)
        .without_starting_units()
        .unit(PlayerId(0), UnitKind::Ranged, Coord::new(2, 2))
        .unit(PlayerId(1), UnitKind::Melee, Coord::new(4, 2))
        .unit(PlayerId(1), UnitKind::Worker, Coord::new(5, 2))
        .build();
    let ranged = units_of_kind(&game, PlayerId(0), UnitKind::Ranged)[0];
    let melee = units_of_kind(&game, PlayerId(1), UnitKind::Melee)[0];
    let worker = units_of_kind(&game, PlayerId(1), UnitKind::Worker)[0];

    assert_eq!(
        game.attack(ranged, worker),
        Err(Rejection::TargetOutOfRange {
            distance: 3,
            range: 2
        })
    );
    // attack 3 vs defense 2 on grass: (6 - 2) / 2
    assert_eq!(game.attack(ranged, melee).unwrap().damage, 2);
}

// =========================================================================
// Scenario C: production countdown and spawn
// =========================================================================

#[test]
fn scenario_c_barracks_spawns_one_unit() {
    let mut game = ScenarioBuilder::new(DUEL_MAP)
        .resources(PlayerId(0), ResourcePool::new(20, 40))
        .build();
    let log = observed(&mut game);

    let barracks = game.build(BuildingKind::Barracks, Coord::new(3, 3)).unwrap();
    assert!(!game.grid().is_walkable(Coord::new(3, 3)));
    assert_eq!(
        game.player(PlayerId(0)).unwrap().resources,
        ResourcePool::new(20, 30)
    );

    let order = game.train_unit(barracks, UnitKind::Melee).unwrap();
    assert_eq!(order.countdown, 2);
    game.train_unit(barracks, UnitKind::Ranged).unwrap();
    assert_eq!(
        game.player(PlayerId(0)).unwrap().resources,
        ResourcePool::new(16, 16)
    );

    // Seat 0 ends: 2 -> 1
    game.end_turn().unwrap();
    game.end_turn().unwrap();
    assert!(units_of_kind(&game, PlayerId(0), UnitKind::Melee).is_empty());

    // Seat 0 ends again: 1 -> 0, spawn north of the barracks
    game.end_turn().unwrap();
    let melee = units_of_kind(&game, PlayerId(0), UnitKind::Melee);
    assert_eq!(melee.len(), 1);
    let spawned = game.unit(melee[0]).unwrap();
    assert_eq!(spawned.position, Coord::new(3, 2));
    assert_eq!(spawned.moves_left, 0);

    let queue = &game.building(barracks).unwrap().queue;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.front(), Some(UnitKind::Ranged));
    assert_eq!(queue.countdown(), Some(3));

    let spawns: Vec<_> = log
        .borrow()
        .events()
        .iter()
        .filter(|e| matches!(e, GameEvent::UnitSpawned { .. }))
        .cloned()
        .collect();
    assert_eq!(
        spawns,
        vec![GameEvent::UnitSpawned {
            building: barracks,
            unit: melee[0],
            kind: UnitKind::Melee,
            position: Coord::new(3, 2),
        }]
    );

    // Refreshed when seat 0's next turn begins
    game.end_turn().unwrap();
    assert_eq!(game.unit(melee[0]).unwrap().moves_left, 2);
}

#[test]
fn scenario_c_last_entry_clears_countdown() {
    let mut game = ScenarioBuilder::new(DUEL_MAP)
        .resources(PlayerId(0), ResourcePool::new(20, 0))
        .build();
    let city = starting_city(&game, PlayerId(0));
    game.train_unit(city, UnitKind::Worker).unwrap();

    for _ in 0..4 {
        game.end_turn().unwrap();
    }
    assert_eq!(units_of_kind(&game, PlayerId(0), UnitKind::Worker).len(), 2);
    let queue = &game.building(city).unwrap().queue;
    assert!(queue.is_empty());
    assert_eq!(queue.countdown(), None);
}

#[test]
fn test_training_rejections() {
    let mut game = ScenarioBuilder::new(DUEL_MAP)
        .resources(PlayerId(0), ResourcePool::new(100, 100))
        .config(EngineConfig {
            max_queue_len: 2,
            ..EngineConfig::default()
        })
        .build();
    let city = starting_city(&game, PlayerId(0));
    let worker = units_of_kind(&game, PlayerId(0), UnitKind::Worker)[0];

    assert_eq!(
        game.train_unit(city, UnitKind::Melee),
        Err(Rejection::InvalidPairing {
            building: BuildingKind::City,
            unit: UnitKind::Melee,
        })
    );
    assert_eq!(
        game.train_unit(worker, UnitKind::Worker),
        Err(Rejection::NotABuilding(worker))
    );
    game.train_unit(city, UnitKind::Worker).unwrap();
    game.train_unit(city, UnitKind::Worker).unwrap();
    let before = game.state_hash();
    assert_eq!(
        game.train_unit(city, UnitKind::Worker),
        Err(Rejection::QueueFull)
    );
    assert_eq!(game.state_hash(), before);
}

#[test]
fn test_build_rejections() {
    let mut game = ScenarioBuilder::new(DUEL_MAP).build();
    let before = game.state_hash();

    assert!(matches!(
        game.build(BuildingKind::City, Coord::new(3, 3)),
        Err(Rejection::InsufficientResources { .. })
    ));
    assert_eq!(
        game.build(BuildingKind::Barracks, Coord::new(1, 0)),
        Err(Rejection::TileOccupied(Coord::new(1, 0)))
    );
    assert_eq!(
        game.build(BuildingKind::Barracks, Coord::new(0, 0)),
        Err(Rejection::TileNotWalkable(Coord::new(0, 0)))
    );
    assert_eq!(
        game.build(BuildingKind::Barracks, Coord::new(8, 0)),
        Err(Rejection::OutOfBounds(Coord::new(8, 0)))
    );
    assert_eq!(game.state_hash(), before);
}

// =========================================================================
// Scenario D: losing the starting city ends the game
// =========================================================================

#[test]
fn scenario_d_destroying_city_ends_game() {
    let mut game = ScenarioBuilder::new(DUEL_MAP)
        .config(siege_config())
        .players(vec![
            PlayerSetup::human(FactionId::Verdant),
            PlayerSetup::ai(FactionId::Ironhold),
        ])
        .unit(PlayerId(0), UnitKind::Melee, Coord::new(6, 5))
        .build();
    let log = observed(&mut game);
    let melee = units_of_kind(&game, PlayerId(0), UnitKind::Melee)[0];
    let enemy_city = starting_city(&game, PlayerId(1));

    let outcome = game.attack(melee, enemy_city).unwrap();
    assert!(outcome.destroyed);
    assert_eq!(outcome.eliminated, Some(PlayerId(1)));

    assert_eq!(game.phase(), GamePhase::Victory);
    assert_eq!(game.phase_for(PlayerId(0)), GamePhase::Victory);
    assert_eq!(game.phase_for(PlayerId(1)), GamePhase::Defeat);
    assert!(game.player(PlayerId(1)).unwrap().eliminated);
    assert!(game.grid().is_walkable(Coord::new(7, 5)));
    assert_eq!(
        game.outcome(),
        Some(&GameOutcome {
            winners: vec![PlayerId(0)],
            eliminated: PlayerId(1),
        })
    );
    assert_eq!(
        log.borrow().events().last(),
        Some(&GameEvent::GameOver {
            winners: vec![PlayerId(0)],
            eliminated: PlayerId(1),
        })
    );

    let frozen = game.state_hash();
    let worker = units_of_kind(&game, PlayerId(0), UnitKind::Worker)[0];
    assert_eq!(game.end_turn(), Err(Rejection::GameOver));
    assert_eq!(
        game.move_unit(worker, Coord::new(2, 0)),
        Err(Rejection::GameOver)
    );
    assert_eq!(
        game.build(BuildingKind::Barracks, Coord::new(3, 3)),
        Err(Rejection::GameOver)
    );
    assert_eq!(game.select_entity(worker), Err(Rejection::GameOver));
    assert_eq!(game.apply(Command::EndTurn), Err(Rejection::GameOver));
    assert_eq!(game.state_hash(), frozen);
}

#[test]
fn scenario_d_ai_takes_the_human_city() {
    let mut game = ScenarioBuilder::new(DUEL_MAP)
        .config(siege_config())
        .players(vec![
            PlayerSetup::human(FactionId::Verdant),
            PlayerSetup::ai(FactionId::Ironhold),
        ])
        .unit(PlayerId(1), UnitKind::Melee, Coord::new(0, 1))
        .build();
    let raider = units_of_kind(&game, PlayerId(1), UnitKind::Melee)[0];
    let home = starting_city(&game, PlayerId(0));

    let ai = ScriptedAi::new(vec![vec![Command::Attack {
        unit: raider,
        target: home,
    }]]);
    let planned = ai.planned();
    game.set_ai_policy(Box::new(ai));

    game.end_turn().unwrap();
    assert_eq!(planned.borrow().as_slice(), &[PlayerId(1)]);
    assert_eq!(game.phase(), GamePhase::Defeat);
    assert_eq!(game.phase_for(PlayerId(1)), GamePhase::Victory);
    assert_eq!(game.active_player(), PlayerId(1));
}

#[test]
fn test_ai_policy_opens_the_game_from_first_seat() {
    let setup = GameSetup::new(vec![
        PlayerSetup::ai(FactionId::Ironhold),
        PlayerSetup::human(FactionId::Verdant),
    ]);
    let ai = ScriptedAi::new(Vec::new());
    let planned = ai.planned();

    let game = TurnController::with_ai_policy(
        EngineConfig::default(),
        &map(DUEL_MAP),
        &setup,
        Box::new(ai),
    )
    .unwrap();
    assert_eq!(planned.borrow().as_slice(), &[PlayerId(0)]);
    assert_eq!(game.phase(), GamePhase::Playing);
    assert_eq!(game.active_player(), PlayerId(1));
    assert_eq!(game.turn(), 1);
    assert!(check_invariants(&game).is_empty());
}

// =========================================================================
// Command surface
// =========================================================================

#[test]
fn test_move_or_act_gathers_with_approach() {
    let mut game = ScenarioBuilder::new(DUEL_MAP).build();
    let worker = units_of_kind(&game, PlayerId(0), UnitKind::Worker)[0];
    let forest = Coord::new(2, 1);
    let log = observed(&mut game);

    let result = game.move_or_act(worker, forest).unwrap();
    let ActionOutcome::Gathered(outcome) = result else {
        panic!("expected a gather, got {result:?}");
    };
    assert_eq!(outcome.resource, ResourceKind::Production);
    assert_eq!(game.grid().resources(forest), 5);

    let unit = game.unit(worker).unwrap();
    assert_eq!(unit.position, Coord::new(2, 0));
    assert_eq!(unit.moves_left, 2);
    assert!(!unit.has_action());

    let events = log.borrow();
    assert!(matches!(
        events.events(),
        [GameEvent::EntityMoved { .. }, GameEvent::ResourceGathered { .. }]
    ));
}

#[test]
fn test_composite_gather_is_all_or_nothing() {
    let mut game = ScenarioBuilder::new(DUEL_MAP).build();
    let worker = units_of_kind(&game, PlayerId(0), UnitKind::Worker)[0];
    let before = game.state_hash();

    // The hill is walkable but no standing tile is within three moves
    assert_eq!(
        game.move_or_act(worker, Coord::new(5, 3)),
        Err(Rejection::NotAdjacent(Coord::new(5, 3)))
    );
    assert_eq!(game.unit(worker).unwrap().position, Coord::new(1, 0));
    assert_eq!(game.state_hash(), before);
}

#[test]
fn test_move_or_act_moves_worker_after_its_action() {
    let mut game = ScenarioBuilder::new(DUEL_MAP).build();
    let worker = units_of_kind(&game, PlayerId(0), UnitKind::Worker)[0];
    game.gather(worker, Coord::new(2, 0)).unwrap();
    assert_eq!(game.grid().resources(Coord::new(1, 1)), 8);

    let result = game.move_or_act(worker, Coord::new(1, 1)).unwrap();
    assert_eq!(
        result,
        ActionOutcome::Moved(vec![Coord::new(1, 0), Coord::new(1, 1)])
    );
    let unit = game.unit(worker).unwrap();
    assert_eq!(unit.position, Coord::new(1, 1));
    assert_eq!(unit.moves_left, 2);
    assert_eq!(game.grid().resources(Coord::new(1, 1)), 8);

    // Forest with production left is just another tile to walk onto now
    let result = game.move_or_act(worker, Coord::new(2, 1)).unwrap();
    assert!(matches!(result, ActionOutcome::Moved(_)));
    assert_eq!(game.grid().resources(Coord::new(2, 1)), 6);
}

#[test]
fn test_gather_out_of_reach() {
    let mut game = ScenarioBuilder::new(DUEL_MAP).build();
    let worker = units_of_kind(&game, PlayerId(0), UnitKind::Worker)[0];
    assert_eq!(
        game.gather(worker, Coord::new(5, 3)),
        Err(Rejection::NotAdjacent(Coord::new(5, 3)))
    );
}

#[test]
fn test_move_or_act_on_friendly_tile() {
    let mut game = ScenarioBuilder::new(DUEL_MAP)
        .unit(PlayerId(0), UnitKind::Melee, Coord::new(2, 0))
        .build();
    let melee = units_of_kind(&game, PlayerId(0), UnitKind::Melee)[0];
    assert_eq!(
        game.move_or_act(melee, Coord::new(1, 0)),
        Err(Rejection::TileOccupied(Coord::new(1, 0)))
    );
    assert_eq!(
        game.move_or_act(melee, Coord::new(0, 0)),
        Err(Rejection::TileOccupied(Coord::new(0, 0)))
    );
}

#[test]
fn test_units_block_paths() {
    // Corridor: the enemy worker stands in the only lane
    let mut game = ScenarioBuilder::new(CORRIDOR_MAP)
        .without_starting_units()
        .unit(PlayerId(0), UnitKind::Worker, Coord::new(1, 0))
        .unit(PlayerId(1), UnitKind::Worker, Coord::new(2, 0))
        .build();
    let worker = units_of_kind(&game, PlayerId(0), UnitKind::Worker)[0];
    assert!(game.reachable_tiles(worker).is_empty());
    assert_eq!(
        game.move_unit(worker, Coord::new(3, 0)),
        Err(Rejection::DestinationOutOfReach(Coord::new(3, 0)))
    );
}

#[test]
fn test_move_refreshes_fog() {
    let mut game = ScenarioBuilder::new(DUEL_MAP)
        .without_starting_units()
        .unit(PlayerId(0), UnitKind::Melee, Coord::new(3, 2))
        .build();
    let melee = units_of_kind(&game, PlayerId(0), UnitKind::Melee)[0];
    let far = Coord::new(6, 2);
    assert!(!game.is_visible(PlayerId(0), far));

    game.move_unit(melee, Coord::new(5, 2)).unwrap();
    assert!(game.is_visible(PlayerId(0), far));

    game.move_unit(melee, Coord::new(4, 1)).unwrap_err();
    game.end_turn().unwrap();
    game.end_turn().unwrap();
    game.move_unit(melee, Coord::new(3, 2)).unwrap();
    assert!(!game.is_visible(PlayerId(0), Coord::new(7, 2)));
    assert!(game.is_explored(PlayerId(0), Coord::new(7, 2)));
}

#[test]
fn test_end_turn_refreshes_only_the_new_player() {
    let mut game = ScenarioBuilder::new(DUEL_MAP).build();
    let mine = units_of_kind(&game, PlayerId(0), UnitKind::Worker)[0];
    let theirs = units_of_kind(&game, PlayerId(1), UnitKind::Worker)[0];
    game.move_unit(mine, Coord::new(1, 2)).unwrap();
    let log = observed(&mut game);

    game.end_turn().unwrap();
    assert_eq!(game.unit(mine).unwrap().moves_left, 1);
    assert_eq!(game.unit(theirs).unwrap().moves_left, 3);
    assert_eq!(
        log.borrow().events(),
        &[GameEvent::TurnChanged {
            turn: 1,
            active_player: PlayerId(1),
        }]
    );

    game.end_turn().unwrap();
    assert_eq!(game.unit(mine).unwrap().moves_left, 3);
    assert_eq!(game.turn(), 2);
}

#[test]
fn test_apply_dispatches_commands() {
    let mut game = ScenarioBuilder::new(DUEL_MAP).build();
    let worker = units_of_kind(&game, PlayerId(0), UnitKind::Worker)[0];

    game.apply(Command::Select { entity: worker }).unwrap();
    game.apply(Command::Move {
        unit: worker,
        to: Coord::new(1, 1),
    })
    .unwrap();
    assert_eq!(game.selection(), Some(worker));
    assert_eq!(game.unit(worker).unwrap().position, Coord::new(1, 1));
    game.apply(Command::EndTurn).unwrap();
    assert_eq!(game.active_player(), PlayerId(1));
    assert_eq!(game.selection(), None);
}
