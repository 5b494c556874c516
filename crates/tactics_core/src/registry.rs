//! Storage for all units, buildings and players.
//!
//! The registry is the sole owner of entity records. It offers id-based
//! lookup and CRUD, and refuses mutations that would break its invariants
//! (duplicate ids, unknown owners, two blocking entities on one tile).
//! It has no game behaviour of its own.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{
    Building, BuildingKind, EntityId, EntityRef, Player, PlayerId, Unit, UnitKind,
};
use crate::data::Ruleset;
use crate::error::InvariantViolation;
use crate::grid::Coord;

/// An entity taken out of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovedEntity {
    /// A removed unit.
    Unit(Unit),
    /// A removed building.
    Building(Building),
}

impl RemovedEntity {
    /// Tile the entity stood on.
    #[must_use]
    pub fn position(&self) -> Coord {
        match self {
            Self::Unit(u) => u.position,
            Self::Building(b) => b.position,
        }
    }
}

/// Id-indexed entity storage.
///
/// Uses `BTreeMap` so iteration is always in ascending id order, which keeps
/// every system that walks entities deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRegistry {
    units: BTreeMap<EntityId, Unit>,
    buildings: BTreeMap<EntityId, Building>,
    players: Vec<Player>,
    next_id: u32,
}

impl EntityRegistry {
    /// Create a registry holding the given players and no entities.
    #[must_use]
    pub fn new(players: Vec<Player>) -> Self {
        Self {
            units: BTreeMap::new(),
            buildings: BTreeMap::new(),
            players,
            next_id: 1,
        }
    }

    /// Reserve a fresh entity id.
    pub fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    fn check_insert(
        &self,
        id: EntityId,
        owner: PlayerId,
        at: Coord,
    ) -> Result<(), InvariantViolation> {
        if self.contains(id) {
            return Err(InvariantViolation::new(format!("duplicate entity id {id}")));
        }
        if self.player(owner).is_none() {
            return Err(InvariantViolation::new(format!(
                "entity {id} owned by unknown player {owner}"
            )));
        }
        if let Some(other) = self.occupant(at) {
            return Err(InvariantViolation::new(format!(
                "entity {id} placed on {at} already occupied by {other}"
            )));
        }
        Ok(())
    }

    /// Insert a unit record.
    pub fn insert_unit(&mut self, unit: Unit) -> Result<EntityId, InvariantViolation> {
        self.check_insert(unit.id, unit.owner, unit.position)?;
        let id = unit.id;
        self.next_id = self.next_id.max(id.0 + 1);
        self.players[unit.owner.index()].units.insert(id);
        self.units.insert(id, unit);
        Ok(id)
    }

    /// Insert a building record.
    pub fn insert_building(&mut self, building: Building) -> Result<EntityId, InvariantViolation> {
        self.check_insert(building.id, building.owner, building.position)?;
        let id = building.id;
        self.next_id = self.next_id.max(id.0 + 1);
        self.players[building.owner.index()].buildings.insert(id);
        self.buildings.insert(id, building);
        Ok(id)
    }

    /// Create and insert a unit built from the ruleset.
    pub fn spawn_unit(
        &mut self,
        rules: &Ruleset,
        owner: PlayerId,
        kind: UnitKind,
        at: Coord,
        ready: bool,
    ) -> Result<EntityId, InvariantViolation> {
        let id = self.allocate_id();
        self.insert_unit(Unit::from_data(id, owner, kind, rules.unit(kind), at, ready))
    }

    /// Create and insert a building built from the ruleset.
    pub fn spawn_building(
        &mut self,
        rules: &Ruleset,
        owner: PlayerId,
        kind: BuildingKind,
        at: Coord,
    ) -> Result<EntityId, InvariantViolation> {
        let id = self.allocate_id();
        self.insert_building(Building::from_data(
            id,
            owner,
            kind,
            rules.building(kind),
            at,
        ))
    }

    /// Remove an entity by id, detaching it from its owner.
    pub fn remove(&mut self, id: EntityId) -> Option<RemovedEntity> {
        if let Some(unit) = self.units.remove(&id) {
            if let Some(owner) = self.players.get_mut(unit.owner.index()) {
                owner.units.remove(&id);
            }
            return Some(RemovedEntity::Unit(unit));
        }
        let building = self.buildings.remove(&id)?;
        if let Some(owner) = self.players.get_mut(building.owner.index()) {
            owner.buildings.remove(&id);
        }
        Some(RemovedEntity::Building(building))
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.units.contains_key(&id) || self.buildings.contains_key(&id)
    }

    /// Get a unit by id.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Get a mutable unit by id.
    pub fn unit_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Get a building by id.
    #[must_use]
    pub fn building(&self, id: EntityId) -> Option<&Building> {
        self.buildings.get(&id)
    }

    /// Get a mutable building by id.
    pub fn building_mut(&mut self, id: EntityId) -> Option<&mut Building> {
        self.buildings.get_mut(&id)
    }

    /// Get either kind of entity by id.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<EntityRef<'_>> {
        self.units
            .get(&id)
            .map(EntityRef::Unit)
            .or_else(|| self.buildings.get(&id).map(EntityRef::Building))
    }

    /// The entity blocking a tile, if any.
    ///
    /// Derived on demand from entity positions; tiles never store it.
    #[must_use]
    pub fn occupant(&self, at: Coord) -> Option<EntityId> {
        self.buildings
            .values()
            .find(|b| b.position == at)
            .map(|b| b.id)
            .or_else(|| self.units.values().find(|u| u.position == at).map(|u| u.id))
    }

    /// Whether any entity stands on a tile.
    #[must_use]
    pub fn is_occupied(&self, at: Coord) -> bool {
        self.occupant(at).is_some()
    }

    /// All units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// All buildings in id order.
    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    /// Units owned by a player, in id order.
    pub fn units_of(&self, owner: PlayerId) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |u| u.owner == owner)
    }

    /// Buildings owned by a player, in id order.
    pub fn buildings_of(&self, owner: PlayerId) -> impl Iterator<Item = &Building> {
        self.buildings.values().filter(move |b| b.owner == owner)
    }

    /// Mutable units owned by a player, in id order.
    pub fn units_of_mut(&mut self, owner: PlayerId) -> impl Iterator<Item = &mut Unit> {
        self.units.values_mut().filter(move |u| u.owner == owner)
    }

    /// Ids of a player's buildings, in id order.
    #[must_use]
    pub fn building_ids_of(&self, owner: PlayerId) -> Vec<EntityId> {
        self.buildings_of(owner).map(|b| b.id).collect()
    }

    /// Number of units.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Number of buildings.
    #[must_use]
    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    /// All players in seat order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Number of players.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Get a player by id.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.index())
    }

    /// Get a mutable player by id.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id.index())
    }
}
