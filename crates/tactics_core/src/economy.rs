//! Economy and resource management.
//!
//! Workers gather from resource tiles: grass yields food, forest and hill
//! yield production. Each gather removes one unit from the tile and pays
//! the terrain's base yield plus the player's faction bonus.
//!
//! All calculations use integer math for deterministic simulation.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, PlayerId, UnitKind};
use crate::data::Ruleset;
use crate::error::Rejection;
use crate::grid::{Coord, TileGrid};
use crate::registry::EntityRegistry;

/// The two stockpiled resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Gathered from grass.
    Food,
    /// Gathered from forests and hills.
    Production,
}

/// A player's stockpile, also used for costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourcePool {
    /// Food stock.
    pub food: u32,
    /// Production stock.
    pub production: u32,
}

impl ResourcePool {
    /// Create a pool.
    #[must_use]
    pub const fn new(food: u32, production: u32) -> Self {
        Self { food, production }
    }

    /// Amount of one resource.
    #[must_use]
    pub const fn get(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Food => self.food,
            ResourceKind::Production => self.production,
        }
    }

    /// Add to one resource, saturating.
    pub fn add(&mut self, kind: ResourceKind, amount: u32) {
        match kind {
            ResourceKind::Food => self.food = self.food.saturating_add(amount),
            ResourceKind::Production => {
                self.production = self.production.saturating_add(amount);
            }
        }
    }

    /// Add a whole pool, saturating.
    pub fn credit(&mut self, amount: &Self) {
        self.add(ResourceKind::Food, amount.food);
        self.add(ResourceKind::Production, amount.production);
    }

    /// Check if this pool covers a cost.
    #[must_use]
    pub const fn can_afford(&self, cost: &Self) -> bool {
        self.food >= cost.food && self.production >= cost.production
    }

    /// Deduct a cost.
    ///
    /// Returns `InsufficientResources` and leaves the pool untouched if the
    /// cost is not covered, so a pool can never go negative.
    pub fn spend(&mut self, cost: &Self) -> Result<(), Rejection> {
        if !self.can_afford(cost) {
            return Err(Rejection::InsufficientResources {
                food_needed: cost.food,
                production_needed: cost.production,
            });
        }
        self.food -= cost.food;
        self.production -= cost.production;
        Ok(())
    }
}

/// What a gather on a tile would pay out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatherPlan {
    /// Resource credited.
    pub resource: ResourceKind,
    /// Amount credited.
    pub amount: u32,
    /// Whether the worker already stands on or next to the tile.
    pub adjacent: bool,
}

/// A committed gather.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatherOutcome {
    /// The worker that gathered.
    pub worker: EntityId,
    /// Player credited.
    pub player: PlayerId,
    /// Tile gathered from.
    pub tile: Coord,
    /// Resource credited.
    pub resource: ResourceKind,
    /// Amount credited.
    pub amount: u32,
    /// Resource units left on the tile.
    pub remaining: u32,
}

/// Yield for a faction gathering on a tile, `None` if the terrain yields nothing.
#[must_use]
pub fn gather_yield(
    rules: &Ruleset,
    grid: &TileGrid,
    player: PlayerId,
    registry: &EntityRegistry,
    at: Coord,
) -> Option<(ResourceKind, u32)> {
    let terrain = grid.terrain(at)?;
    let data = rules.terrain(terrain);
    let resource = data.resource?;
    let faction = registry.player(player)?.faction;
    Some((
        resource,
        data.base_yield + rules.faction_bonus(faction, terrain),
    ))
}

/// Check every gather precondition.
///
/// Adjacency is reported in the plan rather than enforced, so a caller can
/// decide to walk the worker over first.
pub fn plan_gather(
    registry: &EntityRegistry,
    grid: &TileGrid,
    rules: &Ruleset,
    worker: EntityId,
    target: Coord,
) -> Result<GatherPlan, Rejection> {
    let unit = registry
        .unit(worker)
        .ok_or(Rejection::UnknownEntity(worker))?;
    if unit.kind != UnitKind::Worker {
        return Err(Rejection::NotAWorker);
    }
    if !unit.has_action() {
        return Err(Rejection::NoActionsLeft);
    }
    let tile = grid.get(target).ok_or(Rejection::OutOfBounds(target))?;
    let (resource, amount) = gather_yield(rules, grid, unit.owner, registry, target)
        .ok_or(Rejection::NotAResourceTile(target))?;
    if tile.resources == 0 {
        return Err(Rejection::ResourceDepleted(target));
    }
    Ok(GatherPlan {
        resource,
        amount,
        adjacent: unit.position.manhattan(target) <= 1,
    })
}

/// Gather from a tile next to (or under) the worker.
///
/// On success the tile loses one resource unit, the owner's pool gains the
/// yield and the worker's action is spent. Any rejection leaves everything
/// untouched.
pub fn gather(
    registry: &mut EntityRegistry,
    grid: &mut TileGrid,
    rules: &Ruleset,
    worker: EntityId,
    target: Coord,
) -> Result<GatherOutcome, Rejection> {
    let plan = plan_gather(registry, grid, rules, worker, target)?;
    if !plan.adjacent {
        return Err(Rejection::NotAdjacent(target));
    }

    let remaining = grid
        .take_resource(target)
        .ok_or(Rejection::ResourceDepleted(target))?;

    let unit = registry
        .unit_mut(worker)
        .ok_or(Rejection::UnknownEntity(worker))?;
    unit.spend_action();
    let player = unit.owner;

    if let Some(owner) = registry.player_mut(player) {
        owner.resources.add(plan.resource, plan.amount);
    }

    tracing::debug!(
        worker = %worker,
        player = %player,
        tile = %target,
        amount = plan.amount,
        remaining,
        "gathered"
    );

    Ok(GatherOutcome {
        worker,
        player,
        tile: target,
        resource: plan.resource,
        amount: plan.amount,
        remaining,
    })
}
