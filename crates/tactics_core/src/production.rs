//! Production queues, unit training and building construction.
//!
//! Every building owns a FIFO [`ProductionQueue`]. Queueing a unit pays its
//! full cost up front; the front entry counts down once per end of its
//! owner's turn and spawns on the first free walkable orthogonal neighbour
//! of the building when the countdown reaches zero. If every neighbour is
//! blocked the entry stays queued with its countdown at zero and is retried
//! at the next end of turn.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::components::{BuildingKind, EntityId, PlayerId, UnitKind};
use crate::data::Ruleset;
use crate::economy::ResourcePool;
use crate::error::{report_violation, Rejection};
use crate::grid::{Coord, TileGrid};
use crate::registry::EntityRegistry;

/// Default maximum number of entries per queue.
pub const DEFAULT_MAX_QUEUE_LEN: usize = 5;

/// A building's queue of unit types waiting to be produced.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductionQueue {
    queue: VecDeque<UnitKind>,
    /// End-turns left for the front entry. `None` while the queue is empty.
    countdown: Option<u32>,
}

impl ProductionQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of queued entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// The entry currently being produced.
    #[must_use]
    pub fn front(&self) -> Option<UnitKind> {
        self.queue.front().copied()
    }

    /// End-turns left for the front entry.
    #[must_use]
    pub const fn countdown(&self) -> Option<u32> {
        self.countdown
    }

    /// Queued entries, front first.
    pub fn iter(&self) -> impl Iterator<Item = UnitKind> + '_ {
        self.queue.iter().copied()
    }

    /// Append an entry. Starts the countdown if the queue was empty.
    pub fn push(&mut self, kind: UnitKind, build_turns: u32) {
        if self.queue.is_empty() {
            self.countdown = Some(build_turns);
        }
        self.queue.push_back(kind);
    }

    /// Count one end of turn. Returns true when the front entry is due.
    pub fn advance(&mut self) -> bool {
        match self.countdown.as_mut() {
            Some(left) if !self.queue.is_empty() => {
                *left = left.saturating_sub(1);
                *left == 0
            }
            _ => false,
        }
    }

    /// Remove the front entry and start the next one's countdown.
    pub fn complete<F>(&mut self, build_turns: F) -> Option<UnitKind>
    where
        F: Fn(UnitKind) -> u32,
    {
        let done = self.queue.pop_front()?;
        self.countdown = self.queue.front().map(|next| build_turns(*next));
        Some(done)
    }
}

/// A unit accepted into a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainOrder {
    /// Building that will produce the unit.
    pub building: EntityId,
    /// Queued unit type.
    pub unit: UnitKind,
    /// Queue length after the push.
    pub queue_len: usize,
    /// Countdown of the front entry after the push.
    pub countdown: u32,
}

/// What happened to one queue at the end of its owner's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionReport {
    /// A unit was produced.
    Spawned {
        /// Producing building.
        building: EntityId,
        /// The new unit.
        unit: EntityId,
        /// Its type.
        kind: UnitKind,
        /// Tile it appeared on.
        position: Coord,
    },
    /// The front entry is due but every neighbour is blocked.
    Stalled {
        /// Producing building.
        building: EntityId,
        /// Waiting unit type.
        kind: UnitKind,
    },
}

/// Check that `building` can queue `unit` and return the cost.
pub fn plan_training(
    registry: &EntityRegistry,
    rules: &Ruleset,
    building: EntityId,
    unit: UnitKind,
    max_queue_len: usize,
) -> Result<ResourcePool, Rejection> {
    let record = registry.building(building).ok_or(if registry.contains(building) {
        Rejection::NotABuilding(building)
    } else {
        Rejection::UnknownEntity(building)
    })?;

    if !rules.building(record.kind).can_train(unit) {
        return Err(Rejection::InvalidPairing {
            building: record.kind,
            unit,
        });
    }
    if record.queue.len() >= max_queue_len {
        return Err(Rejection::QueueFull);
    }

    let cost = rules.unit(unit).cost;
    let player = registry
        .player(record.owner)
        .ok_or(Rejection::UnknownEntity(building))?;
    if !player.resources.can_afford(&cost) {
        return Err(Rejection::InsufficientResources {
            food_needed: cost.food,
            production_needed: cost.production,
        });
    }
    Ok(cost)
}

/// Pay for `unit` and append it to `building`'s queue.
pub fn queue_training(
    registry: &mut EntityRegistry,
    rules: &Ruleset,
    building: EntityId,
    unit: UnitKind,
    max_queue_len: usize,
) -> Result<TrainOrder, Rejection> {
    let cost = plan_training(registry, rules, building, unit, max_queue_len)?;
    let owner = registry
        .building(building)
        .map(|b| b.owner)
        .ok_or(Rejection::UnknownEntity(building))?;

    registry
        .player_mut(owner)
        .ok_or(Rejection::UnknownEntity(building))?
        .resources
        .spend(&cost)?;

    let record = registry
        .building_mut(building)
        .ok_or(Rejection::UnknownEntity(building))?;
    record.queue.push(unit, rules.unit(unit).build_turns);

    let order = TrainOrder {
        building,
        unit,
        queue_len: record.queue.len(),
        countdown: record.queue.countdown().unwrap_or(0),
    };
    tracing::debug!(
        building = %building,
        unit = ?unit,
        queue_len = order.queue_len,
        "unit queued"
    );
    Ok(order)
}

/// Check that `owner` can place a `kind` building at `at` and return the cost.
pub fn plan_construction(
    registry: &EntityRegistry,
    grid: &TileGrid,
    rules: &Ruleset,
    owner: PlayerId,
    kind: BuildingKind,
    at: Coord,
) -> Result<ResourcePool, Rejection> {
    if !grid.in_bounds(at) {
        return Err(Rejection::OutOfBounds(at));
    }
    if !grid.is_walkable(at) {
        return Err(Rejection::TileNotWalkable(at));
    }
    if registry.is_occupied(at) {
        return Err(Rejection::TileOccupied(at));
    }
    let cost = rules.building(kind).cost;
    let pool = registry
        .player(owner)
        .map(|p| p.resources)
        .unwrap_or_default();
    if !pool.can_afford(&cost) {
        return Err(Rejection::InsufficientResources {
            food_needed: cost.food,
            production_needed: cost.production,
        });
    }
    Ok(cost)
}

/// Pay for and place a building. Its tile becomes unwalkable.
pub fn construct_building(
    registry: &mut EntityRegistry,
    grid: &mut TileGrid,
    rules: &Ruleset,
    owner: PlayerId,
    kind: BuildingKind,
    at: Coord,
) -> Result<EntityId, Rejection> {
    let cost = plan_construction(registry, grid, rules, owner, kind, at)?;
    if let Some(player) = registry.player_mut(owner) {
        player.resources.spend(&cost)?;
    }

    let id = match registry.spawn_building(rules, owner, kind, at) {
        Ok(id) => id,
        Err(violation) => {
            report_violation(&violation);
            if let Some(player) = registry.player_mut(owner) {
                player.resources.credit(&cost);
            }
            return Err(Rejection::TileOccupied(at));
        }
    };
    grid.set_walkable(at, false);

    tracing::debug!(building = %id, player = %owner, kind = ?kind, at = %at, "building created");
    Ok(id)
}

/// First in-bounds, walkable, unoccupied orthogonal neighbour of `around`.
#[must_use]
pub fn find_spawn_tile(registry: &EntityRegistry, grid: &TileGrid, around: Coord) -> Option<Coord> {
    grid.neighbors(around)
        .find(|&at| grid.is_walkable(at) && !registry.is_occupied(at))
}

/// Advance every queue owned by `player` by one end of turn.
///
/// Buildings are processed in id order. Produced units start exhausted
/// unless their type may act on the turn it spawns.
pub fn advance_production(
    registry: &mut EntityRegistry,
    grid: &TileGrid,
    rules: &Ruleset,
    player: PlayerId,
) -> Vec<ProductionReport> {
    let mut reports = Vec::new();

    for building_id in registry.building_ids_of(player) {
        let Some(building) = registry.building_mut(building_id) else {
            continue;
        };
        if !building.queue.advance() {
            continue;
        }
        let origin = building.position;
        let Some(kind) = building.queue.front() else {
            continue;
        };

        let Some(spawn_at) = find_spawn_tile(registry, grid, origin) else {
            tracing::warn!(building = %building_id, unit = ?kind, "production stalled, no free tile");
            reports.push(ProductionReport::Stalled {
                building: building_id,
                kind,
            });
            continue;
        };

        let ready = rules.unit(kind).can_act_on_spawn;
        let unit = match registry.spawn_unit(rules, player, kind, spawn_at, ready) {
            Ok(unit) => unit,
            Err(violation) => {
                report_violation(&violation);
                continue;
            }
        };
        if let Some(building) = registry.building_mut(building_id) {
            building
                .queue
                .complete(|next| rules.unit(next).build_turns);
        }

        tracing::debug!(building = %building_id, unit = %unit, kind = ?kind, at = %spawn_at, "unit spawned");
        reports.push(ProductionReport::Spawned {
            building: building_id,
            unit,
            kind,
            position: spawn_at,
        });
    }

    reports
}
