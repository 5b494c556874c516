//! Entity records: units, buildings and players.
//!
//! Records are plain data addressed by id. The [`crate::registry::EntityRegistry`]
//! owns them; every other component refers to them by [`EntityId`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::data::{BuildingData, UnitData};
use crate::economy::ResourcePool;
use crate::factions::FactionId;
use crate::grid::Coord;
use crate::production::ProductionQueue;

/// Unique identifier for units and buildings (one shared id space).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Player identifier; also the player's seat index in turn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Seat index in turn order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Unit types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Gathers resources. Weak in combat.
    Worker,
    /// Close-combat fighter.
    Melee,
    /// Attacks from two tiles away.
    Ranged,
}

impl UnitKind {
    /// Every unit type.
    pub const ALL: [Self; 3] = [Self::Worker, Self::Melee, Self::Ranged];
}

/// Building types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Settlement. Trains workers; a player's first city is their starting city.
    City,
    /// Trains combat units.
    Barracks,
}

impl BuildingKind {
    /// Every building type.
    pub const ALL: [Self; 2] = [Self::City, Self::Barracks];
}

/// Who issues a player's commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Controller {
    /// Commands come from outside the engine.
    #[default]
    Human,
    /// Commands come from the engine's [`crate::ai::AiPolicy`].
    Ai,
}

/// Health points for damageable entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create new health at full.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Check if the entity is dead (health == 0).
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Apply damage, returning actual damage dealt.
    /// Uses saturating subtraction so health clamps at zero.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current -= actual;
        actual
    }
}

/// A mobile unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Entity id.
    pub id: EntityId,
    /// Owning player.
    pub owner: PlayerId,
    /// Unit type.
    pub kind: UnitKind,
    /// Health points.
    pub health: Health,
    /// Attack strength.
    pub attack: u32,
    /// Defense strength.
    pub defense: u32,
    /// Maximum tiles moved per turn.
    pub speed: u32,
    /// Manhattan attack range.
    pub attack_range: u32,
    /// Field of view radius.
    pub sight: u32,
    /// Tiles of movement left this turn (`0..=speed`).
    pub moves_left: u32,
    /// Actions left this turn (0 or 1).
    pub actions_left: u8,
    /// Whether the unit may act on the turn it is produced.
    pub can_act_on_spawn: bool,
    /// Current tile.
    pub position: Coord,
}

impl Unit {
    /// Create a unit from its type data.
    ///
    /// `ready` decides whether it starts with full moves and an action.
    #[must_use]
    pub fn from_data(
        id: EntityId,
        owner: PlayerId,
        kind: UnitKind,
        data: &UnitData,
        position: Coord,
        ready: bool,
    ) -> Self {
        let mut unit = Self {
            id,
            owner,
            kind,
            health: Health::new(data.health),
            attack: data.attack,
            defense: data.defense,
            speed: data.speed,
            attack_range: data.attack_range,
            sight: data.sight,
            moves_left: 0,
            actions_left: 0,
            can_act_on_spawn: data.can_act_on_spawn,
            position,
        };
        if ready {
            unit.refresh();
        }
        unit
    }

    /// Restore full movement and one action.
    pub fn refresh(&mut self) {
        self.moves_left = self.speed;
        self.actions_left = 1;
    }

    /// Remove all movement and actions.
    pub fn exhaust(&mut self) {
        self.moves_left = 0;
        self.actions_left = 0;
    }

    /// Whether the unit can still attack or gather this turn.
    #[must_use]
    pub const fn has_action(&self) -> bool {
        self.actions_left > 0
    }

    /// Spend movement, clamping at zero.
    pub fn spend_moves(&mut self, cost: u32) {
        self.moves_left = self.moves_left.saturating_sub(cost);
    }

    /// Spend the turn's action.
    pub fn spend_action(&mut self) {
        self.actions_left = 0;
    }
}

/// A stationary structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    /// Entity id.
    pub id: EntityId,
    /// Owning player.
    pub owner: PlayerId,
    /// Building type.
    pub kind: BuildingKind,
    /// Health points.
    pub health: Health,
    /// Defense strength.
    pub defense: u32,
    /// Field of view radius.
    pub sight: u32,
    /// Tile the building stands on.
    pub position: Coord,
    /// Units waiting to be produced.
    pub queue: ProductionQueue,
}

impl Building {
    /// Create a building from its type data.
    #[must_use]
    pub fn from_data(
        id: EntityId,
        owner: PlayerId,
        kind: BuildingKind,
        data: &BuildingData,
        position: Coord,
    ) -> Self {
        Self {
            id,
            owner,
            kind,
            health: Health::new(data.health),
            defense: data.defense,
            sight: data.sight,
            position,
            queue: ProductionQueue::new(),
        }
    }
}

/// A participant in the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player id (seat index).
    pub id: PlayerId,
    /// Faction, which selects gathering bonuses.
    pub faction: FactionId,
    /// Who drives this player's turns.
    pub controller: Controller,
    /// Stockpiled resources.
    pub resources: ResourcePool,
    /// Owned units.
    pub units: BTreeSet<EntityId>,
    /// Owned buildings.
    pub buildings: BTreeSet<EntityId>,
    /// The building whose loss eliminates this player.
    pub starting_city: Option<EntityId>,
    /// Set once the starting city falls.
    pub eliminated: bool,
}

impl Player {
    /// Create a player with no entities.
    #[must_use]
    pub fn new(
        id: PlayerId,
        faction: FactionId,
        controller: Controller,
        resources: ResourcePool,
    ) -> Self {
        Self {
            id,
            faction,
            controller,
            resources,
            units: BTreeSet::new(),
            buildings: BTreeSet::new(),
            starting_city: None,
            eliminated: false,
        }
    }

    /// Whether the engine drives this player.
    #[must_use]
    pub const fn is_ai(&self) -> bool {
        matches!(self.controller, Controller::Ai)
    }
}

/// Borrowed view of either kind of entity.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    /// A unit.
    Unit(&'a Unit),
    /// A building.
    Building(&'a Building),
}

impl EntityRef<'_> {
    /// Entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        match self {
            Self::Unit(u) => u.id,
            Self::Building(b) => b.id,
        }
    }

    /// Owning player.
    #[must_use]
    pub fn owner(&self) -> PlayerId {
        match self {
            Self::Unit(u) => u.owner,
            Self::Building(b) => b.owner,
        }
    }

    /// Tile the entity occupies.
    #[must_use]
    pub fn position(&self) -> Coord {
        match self {
            Self::Unit(u) => u.position,
            Self::Building(b) => b.position,
        }
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> Health {
        match self {
            Self::Unit(u) => u.health,
            Self::Building(b) => b.health,
        }
    }

    /// Defense before terrain.
    #[must_use]
    pub fn defense(&self) -> u32 {
        match self {
            Self::Unit(u) => u.defense,
            Self::Building(b) => b.defense,
        }
    }

    /// Sight radius.
    #[must_use]
    pub fn sight(&self) -> u32 {
        match self {
            Self::Unit(u) => u.sight,
            Self::Building(b) => b.sight,
        }
    }
}
