//! Deterministic attack resolution.
//!
//! Damage uses integer math only:
//!
//! ```text
//! damage = max(1, floor(attack - (defense + terrain_bonus) / 2))
//! ```
//!
//! computed as `(2 * attack - defense - bonus).div_euclid(2)` so the halving
//! of the defense term is exact before flooring. The terrain bonus is read
//! from the tile under the defender (grass 0, forest 1, hill 2 by default).

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, PlayerId};
use crate::data::Ruleset;
use crate::error::Rejection;
use crate::grid::{Coord, TileGrid};
use crate::math::half_floor;
use crate::registry::{EntityRegistry, RemovedEntity};

/// Minimum damage any successful attack deals.
pub const MIN_DAMAGE: u32 = 1;

/// Defense bonus granted by the terrain at `at`. Zero off the map.
#[must_use]
pub fn terrain_bonus(rules: &Ruleset, grid: &TileGrid, at: Coord) -> u32 {
    grid.terrain(at)
        .map_or(0, |terrain| rules.terrain(terrain).defense_bonus)
}

/// Damage dealt by `attack` against `defense` standing on `bonus` terrain.
#[must_use]
pub fn calculate_damage(attack: u32, defense: u32, bonus: u32) -> u32 {
    let raw = 2 * i64::from(attack) - i64::from(defense) - i64::from(bonus);
    let halved = half_floor(raw.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32);
    (halved.max(0) as u32).max(MIN_DAMAGE)
}

/// Result of a committed attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// Attacking unit.
    pub attacker: EntityId,
    /// Target entity.
    pub target: EntityId,
    /// Owner of the target.
    pub target_owner: PlayerId,
    /// Tile the target stood on.
    pub target_position: Coord,
    /// Damage applied after clamping to the target's remaining health.
    pub damage: u32,
    /// Target health after the attack.
    pub remaining_health: u32,
    /// Whether the target was destroyed and removed.
    pub destroyed: bool,
    /// Set when the destroyed target was this player's starting city.
    pub eliminated: Option<PlayerId>,
}

/// Validate an attack and compute its damage without changing anything.
pub fn plan_attack(
    registry: &EntityRegistry,
    grid: &TileGrid,
    rules: &Ruleset,
    attacker: EntityId,
    target: EntityId,
) -> Result<u32, Rejection> {
    let unit = registry.unit(attacker).ok_or(if registry.contains(attacker) {
        Rejection::NotAUnit(attacker)
    } else {
        Rejection::UnknownEntity(attacker)
    })?;
    let defender = registry
        .entity(target)
        .ok_or(Rejection::UnknownEntity(target))?;

    if defender.owner() == unit.owner {
        return Err(Rejection::FriendlyTarget);
    }
    if !unit.has_action() {
        return Err(Rejection::NoActionsLeft);
    }
    let distance = unit.position.manhattan(defender.position());
    if distance > unit.attack_range {
        return Err(Rejection::TargetOutOfRange {
            distance,
            range: unit.attack_range,
        });
    }

    let bonus = terrain_bonus(rules, grid, defender.position());
    Ok(calculate_damage(unit.attack, defender.defense(), bonus))
}

/// Resolve an attack.
///
/// On success the attacker's action is spent, the target loses health and,
/// at zero health, is removed from the registry. A removed building's tile
/// becomes walkable again. If the removed building was a player's starting
/// city that player is marked eliminated.
pub fn resolve_attack(
    registry: &mut EntityRegistry,
    grid: &mut TileGrid,
    rules: &Ruleset,
    attacker: EntityId,
    target: EntityId,
) -> Result<AttackOutcome, Rejection> {
    let damage = plan_attack(registry, grid, rules, attacker, target)?;

    if let Some(unit) = registry.unit_mut(attacker) {
        unit.spend_action();
    }

    let (dealt, remaining_health, target_owner, target_position) =
        if let Some(unit) = registry.unit_mut(target) {
            let dealt = unit.health.apply_damage(damage);
            (dealt, unit.health.current, unit.owner, unit.position)
        } else if let Some(building) = registry.building_mut(target) {
            let dealt = building.health.apply_damage(damage);
            (dealt, building.health.current, building.owner, building.position)
        } else {
            return Err(Rejection::UnknownEntity(target));
        };

    let destroyed = remaining_health == 0;
    let mut eliminated = None;
    if destroyed {
        if let Some(RemovedEntity::Building(building)) = registry.remove(target) {
            grid.set_walkable(building.position, true);
            if let Some(owner) = registry.player_mut(building.owner) {
                if owner.starting_city == Some(target) {
                    owner.eliminated = true;
                    eliminated = Some(owner.id);
                }
            }
        }
    }

    tracing::debug!(
        attacker = %attacker,
        target = %target,
        damage = dealt,
        remaining = remaining_health,
        destroyed,
        "attack resolved"
    );

    Ok(AttackOutcome {
        attacker,
        target,
        target_owner,
        target_position,
        damage: dealt,
        remaining_health,
        destroyed,
        eliminated,
    })
}

/// Enemy entities a unit could attack right now, in id order.
///
/// Empty if the unit is unknown or has no action left.
#[must_use]
pub fn targets_in_range(registry: &EntityRegistry, attacker: EntityId) -> Vec<EntityId> {
    let Some(unit) = registry.unit(attacker) else {
        return Vec::new();
    };
    if !unit.has_action() {
        return Vec::new();
    }
    let in_range = |owner: PlayerId, at: Coord| {
        owner != unit.owner && unit.position.manhattan(at) <= unit.attack_range
    };

    let mut targets: Vec<EntityId> = registry
        .units()
        .filter(|u| in_range(u.owner, u.position))
        .map(|u| u.id)
        .chain(
            registry
                .buildings()
                .filter(|b| in_range(b.owner, b.position))
                .map(|b| b.id),
        )
        .collect();
    targets.sort_unstable();
    targets
}
