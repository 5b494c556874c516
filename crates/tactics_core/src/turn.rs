//! The turn controller: the only owner of mutable game state.
//!
//! Every command follows the same shape:
//! 1. Gate on the game phase and the active player.
//! 2. Validate every precondition without touching state.
//! 3. Commit through the registry, grid and economy helpers.
//! 4. Refresh fog of war and notify observers.
//!
//! A rejected command returns a [`Rejection`] and leaves the game exactly as
//! it was.

use std::collections::HashSet;
use std::time::Duration;

use crate::ai::{AiPolicy, PassiveAi};
use crate::combat::{resolve_attack, targets_in_range, AttackOutcome};
use crate::commands::Command;
use crate::components::{Building, BuildingKind, EntityId, Player, PlayerId, Unit, UnitKind};
use crate::config::EngineConfig;
use crate::economy::{gather_yield, plan_gather, GatherOutcome};
use crate::error::{report_violation, GameError, InvariantViolation, Rejection, Result};
use crate::events::{GameEvent, GameObserver};
use crate::grid::{Coord, TileGrid};
use crate::invariants::check_invariants;
use crate::map::MapDefinition;
use crate::pathfinding::{find_path_with, find_tiles_in_range_with, path_cost};
use crate::production::{
    advance_production, construct_building, find_spawn_tile, queue_training, ProductionReport,
    TrainOrder,
};
use crate::registry::EntityRegistry;
use crate::setup::{GameSetup, MIN_PLAYERS};
use crate::snapshot::{state_hash, GameSnapshot};
use crate::state::{GameOutcome, GamePhase, GameState};
use crate::visibility::{SightSource, VisibilityEngine};

/// What a [`TurnController::move_or_act`] call ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The unit moved along this path.
    Moved(Vec<Coord>),
    /// The unit attacked whatever stood on the tile.
    Attacked(AttackOutcome),
    /// The worker gathered from the tile, walking next to it first if needed.
    Gathered(GatherOutcome),
}

/// Orchestrates turns and commands over the whole simulation.
pub struct TurnController {
    config: EngineConfig,
    grid: TileGrid,
    registry: EntityRegistry,
    visibility: VisibilityEngine,
    state: GameState,
    selection: Option<EntityId>,
    ai: Box<dyn AiPolicy>,
    observers: Vec<Box<dyn GameObserver>>,
}

impl std::fmt::Debug for TurnController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnController")
            .field("state", &self.state)
            .field("units", &self.registry.unit_count())
            .field("buildings", &self.registry.building_count())
            .field("selection", &self.selection)
            .field("ai", &self.ai.name())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl TurnController {
    /// Set up a game.
    ///
    /// Seat `i` gets a starting city on the map's `i`-th start and the
    /// ruleset's starting units on the first free tiles around it. The game
    /// begins in the playing phase on turn 1 with seat 0 active, unless AI
    /// seats open the game. AI seats use [`PassiveAi`]; see
    /// [`TurnController::with_ai_policy`].
    pub fn new(config: EngineConfig, map: &MapDefinition, setup: &GameSetup) -> Result<Self> {
        Self::with_ai_policy(config, map, setup, Box::new(PassiveAi))
    }

    /// Set up a game whose AI seats are played by `policy`.
    ///
    /// If seat 0 is AI-controlled and a human is seated, the opening AI
    /// turns are played before this returns, so the first human seat is
    /// active.
    pub fn with_ai_policy(
        config: EngineConfig,
        map: &MapDefinition,
        setup: &GameSetup,
        policy: Box<dyn AiPolicy>,
    ) -> Result<Self> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(GameError::InvalidRuleset(errors.join("; ")));
        }
        let mut grid = map.to_grid()?;

        if setup.len() < MIN_PLAYERS {
            return Err(GameError::InvalidSetup(format!(
                "need at least {MIN_PLAYERS} players, got {}",
                setup.len()
            )));
        }
        if setup.len() > usize::from(u8::MAX) {
            return Err(GameError::InvalidSetup(format!(
                "too many players: {}",
                setup.len()
            )));
        }
        if setup.len() > map.starts.len() {
            return Err(GameError::InvalidSetup(format!(
                "map has {} start positions for {} players",
                map.starts.len(),
                setup.len()
            )));
        }

        let rules = &config.ruleset;
        let players = setup
            .players
            .iter()
            .enumerate()
            .map(|(seat, p)| {
                Player::new(
                    PlayerId(seat as u8),
                    p.faction,
                    p.controller,
                    rules.starting_resources,
                )
            })
            .collect();
        let mut registry = EntityRegistry::new(players);

        // Every city first, so starting units never take another player's start
        for (seat, &at) in map.starts.iter().take(setup.len()).enumerate() {
            let player = PlayerId(seat as u8);
            let invalid = |reason| GameError::InvalidStartPosition {
                player,
                position: at,
                reason,
            };
            if !grid.in_bounds(at) {
                return Err(invalid("outside the map"));
            }
            if !grid.is_walkable(at) {
                return Err(invalid("not walkable"));
            }
            let city = registry
                .spawn_building(rules, player, BuildingKind::City, at)
                .map_err(|_| invalid("shared with another player"))?;
            grid.set_walkable(at, false);
            if let Some(p) = registry.player_mut(player) {
                p.starting_city = Some(city);
            }
        }

        for (seat, &at) in map.starts.iter().take(setup.len()).enumerate() {
            let player = PlayerId(seat as u8);
            for &kind in &rules.starting_units {
                let spot = find_spawn_tile(&registry, &grid, at).ok_or(
                    GameError::InvalidStartPosition {
                        player,
                        position: at,
                        reason: "no room for starting units",
                    },
                )?;
                registry
                    .spawn_unit(rules, player, kind, spot, true)
                    .map_err(|v| GameError::InvalidSetup(v.message))?;
            }
        }

        let mut visibility = VisibilityEngine::new(setup.len(), grid.width(), grid.height());
        if config.reveal_map {
            for seat in 0..setup.len() {
                visibility.reveal_all(PlayerId(seat as u8));
            }
        }

        let mut controller = Self {
            config,
            grid,
            registry,
            visibility,
            state: GameState::new(),
            selection: None,
            ai: policy,
            observers: Vec::new(),
        };
        controller.state.start();
        controller.refresh_visibility();

        tracing::info!(
            players = controller.registry.player_count(),
            width = controller.grid.width(),
            height = controller.grid.height(),
            "game started"
        );
        controller.run_ai_turns();
        Ok(controller)
    }

    /// Rebuild a controller from a snapshot.
    ///
    /// Observers are not part of a snapshot and the AI policy resets to
    /// [`PassiveAi`]. Fog of war is recomputed for the restored positions;
    /// explored tiles carry over.
    #[must_use]
    pub fn restore(config: EngineConfig, snapshot: GameSnapshot) -> Self {
        let mut controller = Self {
            config,
            grid: snapshot.grid,
            registry: snapshot.registry,
            visibility: snapshot.visibility,
            state: snapshot.state,
            selection: snapshot.selection,
            ai: Box::new(PassiveAi),
            observers: Vec::new(),
        };
        controller.refresh_visibility();
        controller
    }

    /// Register an observer for post-commit events.
    pub fn add_observer(&mut self, observer: Box<dyn GameObserver>) {
        self.observers.push(observer);
    }

    /// Replace the policy used for AI seats.
    pub fn set_ai_policy(&mut self, policy: Box<dyn AiPolicy>) {
        self.ai = policy;
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Turn bookkeeping.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Global phase.
    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    /// Phase as seen by one player.
    #[must_use]
    pub fn phase_for(&self, player: PlayerId) -> GamePhase {
        self.state.phase_for(player)
    }

    /// How the game ended, once it has.
    #[must_use]
    pub fn outcome(&self) -> Option<&GameOutcome> {
        self.state.outcome()
    }

    /// Round counter.
    #[must_use]
    pub fn turn(&self) -> u32 {
        self.state.turn
    }

    /// Seat whose turn it is.
    #[must_use]
    pub fn active_player(&self) -> PlayerId {
        self.state.active_player
    }

    /// Whether `player` may issue commands right now.
    #[must_use]
    pub fn is_current_player_turn(&self, player: PlayerId) -> bool {
        self.state.is_playing() && self.state.active_player == player
    }

    /// The map.
    #[must_use]
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// All entities and players.
    #[must_use]
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Fog of war.
    #[must_use]
    pub fn visibility(&self) -> &VisibilityEngine {
        &self.visibility
    }

    /// A unit by id.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.registry.unit(id)
    }

    /// A building by id.
    #[must_use]
    pub fn building(&self, id: EntityId) -> Option<&Building> {
        self.registry.building(id)
    }

    /// A player by id.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.registry.player(id)
    }

    /// Whether a player sees a tile right now.
    #[must_use]
    pub fn is_visible(&self, player: PlayerId, at: Coord) -> bool {
        self.visibility.is_visible(player, at)
    }

    /// Whether a player has ever seen a tile.
    #[must_use]
    pub fn is_explored(&self, player: PlayerId, at: Coord) -> bool {
        self.visibility.is_explored(player, at)
    }

    /// Currently selected entity.
    #[must_use]
    pub fn selection(&self) -> Option<EntityId> {
        self.selection
    }

    /// How long presenters should pause before showing an AI turn.
    #[must_use]
    pub fn ai_turn_delay(&self) -> Duration {
        Duration::from_millis(self.config.ai_turn_delay_ms)
    }

    /// Tiles a unit could move to with its remaining moves.
    ///
    /// Excludes the unit's own tile and tiles held by other entities.
    #[must_use]
    pub fn reachable_tiles(&self, unit: EntityId) -> Vec<Coord> {
        let Some(unit) = self.registry.unit(unit) else {
            return Vec::new();
        };
        let blocked = self.blocked_tiles();
        find_tiles_in_range_with(&self.grid, unit.position, unit.moves_left, |at| {
            !blocked.contains(&at)
        })
        .into_iter()
        .filter(|at| *at != unit.position)
        .collect()
    }

    /// Enemy entities a unit could attack right now, in id order.
    #[must_use]
    pub fn attack_targets(&self, unit: EntityId) -> Vec<EntityId> {
        targets_in_range(&self.registry, unit)
    }

    /// Copy out the whole game.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            state: self.state.clone(),
            grid: self.grid.clone(),
            registry: self.registry.clone(),
            visibility: self.visibility.clone(),
            selection: self.selection,
        }
    }

    /// Snapshot encoded with bincode.
    pub fn encode_snapshot(&self) -> Result<Vec<u8>> {
        self.snapshot().encode()
    }

    /// Decode a snapshot produced by [`TurnController::encode_snapshot`].
    pub fn decode_snapshot(bytes: &[u8]) -> Result<GameSnapshot> {
        GameSnapshot::decode(bytes)
    }

    /// Deterministic hash of everything that affects future play.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        state_hash(&self.state, &self.grid, &self.registry)
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Run any command.
    pub fn apply(&mut self, command: Command) -> std::result::Result<(), Rejection> {
        match command {
            Command::Select { entity } => self.select_entity(entity),
            Command::MoveOrAct { unit, to } => self.move_or_act(unit, to).map(drop),
            Command::Move { unit, to } => self.move_unit(unit, to).map(drop),
            Command::Attack { unit, target } => self.attack(unit, target).map(drop),
            Command::Gather { unit, at } => self.gather(unit, at).map(drop),
            Command::Build { kind, at } => self.build(kind, at).map(drop),
            Command::Train { building, unit } => self.train_unit(building, unit).map(drop),
            Command::EndTurn => self.end_turn(),
        }
    }

    /// Select any entity for inspection.
    pub fn select_entity(&mut self, id: EntityId) -> std::result::Result<(), Rejection> {
        self.gate()?;
        if !self.registry.contains(id) {
            return Err(Rejection::UnknownEntity(id));
        }
        self.selection = Some(id);
        Ok(())
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Move, attack or gather depending on the target tile.
    ///
    /// - An enemy entity on the tile is attacked.
    /// - A friendly entity on the tile rejects the command.
    /// - A worker with its action left, targeting a tile that yields, gathers
    ///   from it.
    /// - Anything else is a move.
    pub fn move_or_act(
        &mut self,
        unit_id: EntityId,
        to: Coord,
    ) -> std::result::Result<ActionOutcome, Rejection> {
        let unit = self.active_unit(unit_id)?;
        if !self.grid.in_bounds(to) {
            return Err(Rejection::OutOfBounds(to));
        }
        let (owner, kind, has_action) = (unit.owner, unit.kind, unit.has_action());

        if let Some(occupant) = self.registry.occupant(to).filter(|id| *id != unit_id) {
            let occupant_owner = self.registry.entity(occupant).map(|e| e.owner());
            if occupant_owner == Some(owner) {
                return Err(Rejection::TileOccupied(to));
            }
            return self.attack(unit_id, occupant).map(ActionOutcome::Attacked);
        }

        let has_resources = self.grid.resources(to) > 0
            && gather_yield(
                &self.config.ruleset,
                &self.grid,
                owner,
                &self.registry,
                to,
            )
            .is_some();
        if kind == UnitKind::Worker && has_action && has_resources {
            return self.gather(unit_id, to).map(ActionOutcome::Gathered);
        }

        self.move_unit(unit_id, to).map(ActionOutcome::Moved)
    }

    /// Move a unit to a free tile within its remaining moves.
    ///
    /// Returns the path taken, starting at the unit's old tile.
    pub fn move_unit(
        &mut self,
        unit_id: EntityId,
        to: Coord,
    ) -> std::result::Result<Vec<Coord>, Rejection> {
        let path = self.plan_move(unit_id, to)?;
        self.commit_move(unit_id, &path);
        self.after_commit();
        Ok(path)
    }

    /// Attack an entity.
    pub fn attack(
        &mut self,
        unit_id: EntityId,
        target: EntityId,
    ) -> std::result::Result<AttackOutcome, Rejection> {
        self.active_unit(unit_id)?;
        let outcome = resolve_attack(
            &mut self.registry,
            &mut self.grid,
            &self.config.ruleset,
            unit_id,
            target,
        )?;

        self.emit(&GameEvent::AttackResolved {
            attacker: unit_id,
            target,
            damage: outcome.damage,
            remaining_health: outcome.remaining_health,
            destroyed: outcome.destroyed,
        });
        if outcome.destroyed && self.selection == Some(target) {
            self.selection = None;
        }
        if let Some(loser) = outcome.eliminated {
            self.finish_game(loser);
        }
        self.after_commit();
        Ok(outcome)
    }

    /// Gather with a worker, walking next to the tile first if it is not
    /// adjacent but a standing tile is reachable this turn.
    pub fn gather(
        &mut self,
        unit_id: EntityId,
        at: Coord,
    ) -> std::result::Result<GatherOutcome, Rejection> {
        let approach = self.plan_gather_approach(unit_id, at)?;
        if let Some(path) = &approach {
            self.commit_move(unit_id, path);
        }

        let outcome = match crate::economy::gather(
            &mut self.registry,
            &mut self.grid,
            &self.config.ruleset,
            unit_id,
            at,
        ) {
            Ok(outcome) => outcome,
            Err(reason) => {
                if approach.is_some() {
                    report_violation(&InvariantViolation::new(format!(
                        "gather rejected after approach move: {reason}"
                    )));
                    self.after_commit();
                }
                return Err(reason);
            }
        };

        self.emit(&GameEvent::ResourceGathered {
            worker: outcome.worker,
            player: outcome.player,
            tile: outcome.tile,
            resource: outcome.resource,
            amount: outcome.amount,
            remaining: outcome.remaining,
        });
        self.after_commit();
        Ok(outcome)
    }

    /// Place a building for the active player. No unit action is spent.
    pub fn build(
        &mut self,
        kind: BuildingKind,
        at: Coord,
    ) -> std::result::Result<EntityId, Rejection> {
        self.gate()?;
        let owner = self.state.active_player;
        let id = construct_building(
            &mut self.registry,
            &mut self.grid,
            &self.config.ruleset,
            owner,
            kind,
            at,
        )?;
        self.emit(&GameEvent::BuildingCreated {
            building: id,
            owner,
            kind,
            position: at,
        });
        self.after_commit();
        Ok(id)
    }

    /// Queue a unit at one of the active player's buildings.
    pub fn train_unit(
        &mut self,
        building: EntityId,
        unit: UnitKind,
    ) -> std::result::Result<TrainOrder, Rejection> {
        self.gate()?;
        if let Some(record) = self.registry.building(building) {
            if record.owner != self.state.active_player {
                return Err(Rejection::NotYourTurn {
                    owner: record.owner,
                });
            }
        }
        let order = queue_training(
            &mut self.registry,
            &self.config.ruleset,
            building,
            unit,
            self.config.max_queue_len,
        )?;
        self.emit(&GameEvent::UnitQueued {
            building,
            unit,
            queue_len: order.queue_len,
        });
        self.after_commit();
        Ok(order)
    }

    /// End the active player's turn.
    ///
    /// Advances the active player's production, passes the turn, refreshes
    /// the new active player's units, plays any AI seats that follow and
    /// clears the selection.
    pub fn end_turn(&mut self) -> std::result::Result<(), Rejection> {
        self.gate()?;
        self.pass_turn();
        self.run_ai_turns();
        self.selection = None;
        Ok(())
    }

    /// Play AI seats until a human is active or the game ends.
    ///
    /// Does nothing in a game without human players; drive those with
    /// [`TurnController::play_ai_turn`].
    pub fn run_ai_turns(&mut self) {
        if !self.registry.players().iter().any(|p| !p.is_ai()) {
            return;
        }
        while self.state.is_playing() && self.active_is_ai() {
            self.play_ai_turn();
        }
    }

    /// Let the policy play the active seat once, then pass the turn.
    ///
    /// Does nothing unless the active seat is AI-controlled.
    pub fn play_ai_turn(&mut self) {
        if !self.state.is_playing() || !self.active_is_ai() {
            return;
        }
        let player = self.state.active_player;
        let view = self.snapshot();
        let commands = self.ai.plan_turn(player, &view);
        tracing::debug!(
            player = %player,
            policy = self.ai.name(),
            commands = commands.len(),
            "ai turn"
        );

        for command in commands {
            if command.is_end_turn() || !self.state.is_playing() {
                break;
            }
            if let Err(reason) = self.apply(command) {
                tracing::debug!(player = %player, ?command, %reason, "ai command rejected");
            }
        }
        if self.state.is_playing() {
            self.pass_turn();
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn gate(&self) -> std::result::Result<(), Rejection> {
        match self.state.phase {
            GamePhase::Setup => Err(Rejection::NotStarted),
            GamePhase::Playing => Ok(()),
            GamePhase::Victory | GamePhase::Defeat => Err(Rejection::GameOver),
        }
    }

    /// A unit owned by the active player.
    fn active_unit(&self, id: EntityId) -> std::result::Result<&Unit, Rejection> {
        self.gate()?;
        let unit = self.registry.unit(id).ok_or(if self.registry.contains(id) {
            Rejection::NotAUnit(id)
        } else {
            Rejection::UnknownEntity(id)
        })?;
        if unit.owner != self.state.active_player {
            return Err(Rejection::NotYourTurn { owner: unit.owner });
        }
        Ok(unit)
    }

    fn active_is_ai(&self) -> bool {
        self.registry
            .player(self.state.active_player)
            .is_some_and(Player::is_ai)
    }

    /// Tiles held by any entity.
    fn blocked_tiles(&self) -> HashSet<Coord> {
        self.registry
            .units()
            .map(|u| u.position)
            .chain(self.registry.buildings().map(|b| b.position))
            .collect()
    }

    fn plan_move(&self, unit_id: EntityId, to: Coord) -> std::result::Result<Vec<Coord>, Rejection> {
        let unit = self.active_unit(unit_id)?;
        if !self.grid.in_bounds(to) {
            return Err(Rejection::OutOfBounds(to));
        }
        if unit.position == to {
            return Err(Rejection::AlreadyThere(to));
        }
        if unit.moves_left == 0 {
            return Err(Rejection::NoMovesLeft);
        }
        if !self.grid.is_walkable(to) {
            return Err(Rejection::TileNotWalkable(to));
        }
        if self.registry.is_occupied(to) {
            return Err(Rejection::TileOccupied(to));
        }

        let blocked = self.blocked_tiles();
        let path = find_path_with(&self.grid, unit.position, to, unit.moves_left, |at| {
            !blocked.contains(&at)
        });
        if path.last() != Some(&to) {
            return Err(Rejection::DestinationOutOfReach(to));
        }
        Ok(path)
    }

    /// Validate a gather and, when the worker is not adjacent, find the
    /// shortest walk to a tile next to the target.
    fn plan_gather_approach(
        &self,
        unit_id: EntityId,
        at: Coord,
    ) -> std::result::Result<Option<Vec<Coord>>, Rejection> {
        let unit = self.active_unit(unit_id)?;
        let plan = plan_gather(
            &self.registry,
            &self.grid,
            &self.config.ruleset,
            unit_id,
            at,
        )?;
        if plan.adjacent {
            return Ok(None);
        }
        if unit.moves_left == 0 {
            return Err(Rejection::NotAdjacent(at));
        }

        let blocked = self.blocked_tiles();
        let passable = |c: Coord| !blocked.contains(&c);
        // Breadth-first order, so the first match is a closest standing tile
        let stand = find_tiles_in_range_with(&self.grid, unit.position, unit.moves_left, passable)
            .into_iter()
            .find(|c| c.manhattan(at) <= 1)
            .ok_or(Rejection::NotAdjacent(at))?;
        let path = find_path_with(&self.grid, unit.position, stand, unit.moves_left, passable);
        if path.last() != Some(&stand) {
            return Err(Rejection::NotAdjacent(at));
        }
        Ok(Some(path))
    }

    fn commit_move(&mut self, unit_id: EntityId, path: &[Coord]) {
        let (Some(&from), Some(&to)) = (path.first(), path.last()) else {
            return;
        };
        let Some(unit) = self.registry.unit_mut(unit_id) else {
            return;
        };
        unit.position = to;
        unit.spend_moves(path_cost(path));
        let moves_left = unit.moves_left;

        tracing::debug!(unit = %unit_id, from = %from, to = %to, moves_left, "unit moved");
        self.emit(&GameEvent::EntityMoved {
            unit: unit_id,
            from,
            to,
            moves_left,
        });
    }

    /// Steps 1 to 4 of ending a turn.
    fn pass_turn(&mut self) {
        let ending = self.state.active_player;
        let reports = advance_production(
            &mut self.registry,
            &self.grid,
            &self.config.ruleset,
            ending,
        );
        for report in reports {
            if let ProductionReport::Spawned {
                building,
                unit,
                kind,
                position,
            } = report
            {
                self.emit(&GameEvent::UnitSpawned {
                    building,
                    unit,
                    kind,
                    position,
                });
            }
        }

        self.state.advance(self.registry.player_count());
        let active = self.state.active_player;
        for unit in self.registry.units_of_mut(active) {
            unit.refresh();
        }

        tracing::debug!(turn = self.state.turn, player = %active, "turn changed");
        self.emit(&GameEvent::TurnChanged {
            turn: self.state.turn,
            active_player: active,
        });
        self.after_commit();
    }

    fn finish_game(&mut self, eliminated: PlayerId) {
        let winners: Vec<PlayerId> = self
            .registry
            .players()
            .iter()
            .filter(|p| !p.eliminated)
            .map(|p| p.id)
            .collect();
        let humans: Vec<PlayerId> = self
            .registry
            .players()
            .iter()
            .filter(|p| !p.is_ai())
            .map(|p| p.id)
            .collect();

        self.state.finish(
            GameOutcome {
                winners: winners.clone(),
                eliminated,
            },
            &humans,
        );
        tracing::info!(
            eliminated = %eliminated,
            phase = ?self.state.phase,
            turn = self.state.turn,
            "game over"
        );
        self.emit(&GameEvent::GameOver {
            winners,
            eliminated,
        });
    }

    fn refresh_visibility(&mut self) {
        let Self {
            registry,
            grid,
            visibility,
            ..
        } = self;
        for player in registry.players() {
            let sources = registry
                .units_of(player.id)
                .map(|u| SightSource {
                    origin: u.position,
                    range: u.sight,
                })
                .chain(registry.buildings_of(player.id).map(|b| SightSource {
                    origin: b.position,
                    range: b.sight,
                }));
            visibility.update(player.id, grid, sources);
        }
    }

    fn after_commit(&mut self) {
        self.refresh_visibility();
        if cfg!(feature = "debug-validation") {
            for violation in check_invariants(self) {
                report_violation(&violation);
            }
        }
    }

    fn emit(&mut self, event: &GameEvent) {
        for observer in &mut self.observers {
            observer.on_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;
    use crate::factions::FactionId;
    use crate::setup::PlayerSetup;
    use std::cell::RefCell;
    use std::rc::Rc;

    const MAP: &str = "
        0......
        .......
        .......
        ......1
    ";

    fn game(second: PlayerSetup) -> TurnController {
        let map = MapDefinition::from_ascii(MAP).unwrap();
        let setup = GameSetup::new(vec![PlayerSetup::human(FactionId::Nomads), second]);
        TurnController::new(EngineConfig::default(), &map, &setup).unwrap()
    }

    fn hot_seat() -> TurnController {
        game(PlayerSetup::human(FactionId::Verdant))
    }

    fn worker_of(game: &TurnController, player: PlayerId) -> EntityId {
        game.registry()
            .units_of(player)
            .next()
            .map(|u| u.id)
            .unwrap()
    }

    #[test]
    fn test_setup_places_cities_and_workers() {
        let game = hot_seat();
        assert_eq!(game.phase(), GamePhase::Playing);
        assert_eq!(game.turn(), 1);
        assert_eq!(game.active_player(), PlayerId(0));

        let p0 = game.player(PlayerId(0)).unwrap();
        let city = game.building(p0.starting_city.unwrap()).unwrap();
        assert_eq!(city.position, Coord::new(0, 0));
        assert_eq!(city.health.max, 25);
        assert!(!game.grid().is_walkable(Coord::new(0, 0)));

        let worker = game.unit(worker_of(&game, PlayerId(0))).unwrap();
        assert_eq!(worker.position, Coord::new(1, 0));
        let enemy = game.unit(worker_of(&game, PlayerId(1))).unwrap();
        assert_eq!(enemy.position, Coord::new(6, 2));
        assert!(check_invariants(&game).is_empty());
    }

    #[test]
    fn test_too_few_players() {
        let map = MapDefinition::from_ascii(MAP).unwrap();
        let setup = GameSetup::new(vec![PlayerSetup::human(FactionId::Nomads)]);
        assert!(matches!(
            TurnController::new(EngineConfig::default(), &map, &setup),
            Err(GameError::InvalidSetup(_))
        ));
    }

    #[test]
    fn test_start_on_rock_rejected() {
        let mut map = MapDefinition::from_ascii(MAP).unwrap();
        map.tiles[0].walkable = false;
        let setup = GameSetup::human_vs_ai(FactionId::Nomads, 1);
        assert!(matches!(
            TurnController::new(EngineConfig::default(), &map, &setup),
            Err(GameError::InvalidStartPosition { .. })
        ));
    }

    #[test]
    fn test_ai_in_first_seat_plays_opening_turn() {
        let map = MapDefinition::from_ascii(MAP).unwrap();
        let setup = GameSetup::new(vec![
            PlayerSetup::ai(FactionId::Ironhold),
            PlayerSetup::human(FactionId::Nomads),
        ]);
        let mut game = TurnController::new(EngineConfig::default(), &map, &setup).unwrap();
        assert_eq!(game.active_player(), PlayerId(1));
        assert_eq!(game.turn(), 1);
        assert!(game.is_current_player_turn(PlayerId(1)));

        let worker = worker_of(&game, PlayerId(1));
        let path = game.move_unit(worker, Coord::new(5, 2)).unwrap();
        assert_eq!(path.last(), Some(&Coord::new(5, 2)));
    }

    #[test]
    fn test_all_ai_game_waits_for_driver() {
        let map = MapDefinition::from_ascii(MAP).unwrap();
        let setup = GameSetup::new(vec![
            PlayerSetup::ai(FactionId::Ironhold),
            PlayerSetup::ai(FactionId::Sylvan),
        ]);
        let mut game = TurnController::new(EngineConfig::default(), &map, &setup).unwrap();
        assert_eq!(game.active_player(), PlayerId(0));
        game.play_ai_turn();
        assert_eq!(game.active_player(), PlayerId(1));
    }

    #[test]
    fn test_end_turn_cycles_players() {
        let mut game = hot_seat();
        game.end_turn().unwrap();
        assert_eq!(game.active_player(), PlayerId(1));
        assert_eq!(game.turn(), 1);
        game.end_turn().unwrap();
        assert_eq!(game.active_player(), PlayerId(0));
        assert_eq!(game.turn(), 2);
    }

    #[test]
    fn test_ai_turn_runs_inside_end_turn() {
        let mut game = game(PlayerSetup::ai(FactionId::Ironhold));
        let log = Rc::new(RefCell::new(EventLog::new()));
        game.add_observer(Box::new(Rc::clone(&log)));

        game.end_turn().unwrap();
        assert_eq!(game.active_player(), PlayerId(0));
        assert_eq!(game.turn(), 2);
        let turns = log
            .borrow()
            .events()
            .iter()
            .filter(|e| matches!(e, GameEvent::TurnChanged { .. }))
            .count();
        assert_eq!(turns, 2);
    }

    #[test]
    fn test_commands_gated_by_turn() {
        let mut game = hot_seat();
        let enemy = worker_of(&game, PlayerId(1));
        assert_eq!(
            game.move_unit(enemy, Coord::new(5, 2)),
            Err(Rejection::NotYourTurn {
                owner: PlayerId(1)
            })
        );
        let enemy_city = game.player(PlayerId(1)).unwrap().starting_city.unwrap();
        assert_eq!(
            game.train_unit(enemy_city, UnitKind::Worker),
            Err(Rejection::NotYourTurn {
                owner: PlayerId(1)
            })
        );
    }

    #[test]
    fn test_move_spends_moves() {
        let mut game = hot_seat();
        let worker = worker_of(&game, PlayerId(0));
        let before = game.state_hash();

        assert_eq!(
            game.move_unit(worker, Coord::new(5, 0)),
            Err(Rejection::DestinationOutOfReach(Coord::new(5, 0)))
        );
        assert_eq!(game.state_hash(), before);

        let path = game.move_unit(worker, Coord::new(3, 1)).unwrap();
        assert_eq!(path_cost(&path), 3);
        let unit = game.unit(worker).unwrap();
        assert_eq!(unit.position, Coord::new(3, 1));
        assert_eq!(unit.moves_left, 0);
        assert_eq!(
            game.move_unit(worker, Coord::new(3, 2)),
            Err(Rejection::NoMovesLeft)
        );
    }

    #[test]
    fn test_move_rejections() {
        let mut game = hot_seat();
        let worker = worker_of(&game, PlayerId(0));
        assert_eq!(
            game.move_unit(worker, Coord::new(1, 0)),
            Err(Rejection::AlreadyThere(Coord::new(1, 0)))
        );
        assert_eq!(
            game.move_unit(worker, Coord::new(0, 0)),
            Err(Rejection::TileNotWalkable(Coord::new(0, 0)))
        );
        assert_eq!(
            game.move_unit(worker, Coord::new(-1, 0)),
            Err(Rejection::OutOfBounds(Coord::new(-1, 0)))
        );
        assert_eq!(
            game.move_unit(EntityId(99), Coord::new(2, 0)),
            Err(Rejection::UnknownEntity(EntityId(99)))
        );
    }

    #[test]
    fn test_selection_cleared_on_end_turn() {
        let mut game = hot_seat();
        let worker = worker_of(&game, PlayerId(0));
        game.select_entity(worker).unwrap();
        assert_eq!(game.selection(), Some(worker));
        assert_eq!(
            game.select_entity(EntityId(99)),
            Err(Rejection::UnknownEntity(EntityId(99)))
        );
        game.end_turn().unwrap();
        assert_eq!(game.selection(), None);
    }

    #[test]
    fn test_reachable_tiles_excludes_occupied() {
        let game = hot_seat();
        let worker = worker_of(&game, PlayerId(0));
        let tiles = game.reachable_tiles(worker);
        assert!(!tiles.contains(&Coord::new(1, 0)));
        assert!(!tiles.contains(&Coord::new(0, 0)));
        assert!(tiles.contains(&Coord::new(4, 0)));
        assert!(tiles.iter().all(|t| t.manhattan(Coord::new(1, 0)) <= 3));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut game = hot_seat();
        let worker = worker_of(&game, PlayerId(0));
        game.move_unit(worker, Coord::new(2, 1)).unwrap();

        let bytes = game.encode_snapshot().unwrap();
        let snapshot = TurnController::decode_snapshot(&bytes).unwrap();
        assert_eq!(snapshot, game.snapshot());
        assert_eq!(snapshot.state_hash(), game.state_hash());

        let restored = TurnController::restore(EngineConfig::default(), snapshot);
        assert_eq!(restored.state_hash(), game.state_hash());
    }

    #[test]
    fn test_reveal_map() {
        let map = MapDefinition::from_ascii(MAP).unwrap();
        let config = EngineConfig {
            reveal_map: true,
            ..EngineConfig::default()
        };
        let setup = GameSetup::human_vs_ai(FactionId::Nomads, 1);
        let game = TurnController::new(config, &map, &setup).unwrap();
        assert!(game.is_visible(PlayerId(0), Coord::new(6, 3)));
        assert!(game.is_explored(PlayerId(1), Coord::new(0, 0)));
    }

    #[test]
    fn test_fog_hides_far_corner() {
        let game = hot_seat();
        assert!(game.is_visible(PlayerId(0), Coord::new(1, 1)));
        assert!(!game.is_visible(PlayerId(0), Coord::new(6, 3)));
        assert!(!game.is_explored(PlayerId(0), Coord::new(6, 3)));
    }
}
