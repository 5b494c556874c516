//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a game produces identical results
//! given identical commands.
//!
//! # Testing Strategy
//!
//! The simulation must be fully deterministic so that command scripts,
//! snapshots and tooling all agree. Sources of non-determinism include:
//!
//! - **Floating-point math**: Line-of-sight slopes use
//!   [`tactics_core::math::Fixed`] instead.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   The registry iterates in ascending entity id order and hash sets are
//!   only used for membership tests.
//!
//! - **Randomness**: The core has none.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual rules (damage, pathing, fog)
//! 2. **Property tests**: Random command scripts still replay identically
//! 3. **Integration tests**: Full scenarios are reproducible

use tactics_core::commands::Command;
use tactics_core::error::Rejection;
use tactics_core::turn::TurnController;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps applied per run.
    pub steps: usize,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic game).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Game is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine several times and verify the final hashes agree.
///
/// # Arguments
///
/// * `runs` - Number of runs
/// * `steps` - Number of steps per run
/// * `setup` - Creates the initial state
/// * `step` - Advances the state by one step
/// * `hash` - Hashes the state
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: usize,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, usize),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for index in 0..steps {
            step(&mut state, index);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Apply every command in order, collecting each result.
pub fn run_script(game: &mut TurnController, script: &[Command]) -> Vec<Result<(), Rejection>> {
    script
        .iter()
        .map(|command| {
            let result = game.apply(*command);
            if let Err(reason) = &result {
                tracing::trace!(?command, %reason, "scripted command rejected");
            }
            result
        })
        .collect()
}

/// Replay a command script on fresh games and compare final state hashes.
pub fn verify_script_determinism<F>(runs: usize, setup: F, script: &[Command]) -> DeterminismResult
where
    F: Fn() -> TurnController,
{
    verify_determinism(
        runs,
        script.len(),
        setup,
        |game, index| {
            let _ = game.apply(script[index]);
        },
        TurnController::state_hash,
    )
}

/// Replay a script on two games in lockstep, finding the first divergence.
///
/// # Returns
///
/// `None` if the games never differ, `Some(0)` if they differ before any
/// command, `Some(n)` if they differ after the `n`-th command.
pub fn find_first_divergence<F>(setup: F, script: &[Command]) -> Option<usize>
where
    F: Fn() -> TurnController,
{
    let mut first = setup();
    let mut second = setup();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for (index, command) in script.iter().enumerate() {
        let a = first.apply(*command);
        let b = second.apply(*command);
        if a != b || first.state_hash() != second.state_hash() {
            return Some(index + 1);
        }
    }

    None
}

/// Verify that encoding and decoding a snapshot preserves the game exactly.
pub fn verify_snapshot_round_trip(game: &TurnController) -> bool {
    let Ok(bytes) = game.encode_snapshot() else {
        return false;
    };
    let Ok(snapshot) = TurnController::decode_snapshot(&bytes) else {
        return false;
    };
    snapshot == game.snapshot() && snapshot.state_hash() == game.state_hash()
}

/// Proptest strategies for command scripts.
///
/// Scripts are built from small entity ids and in-bounds coordinates so
/// that a useful share of commands is accepted.
pub mod strategies {
    use proptest::prelude::*;
    use tactics_core::commands::Command;
    use tactics_core::components::{BuildingKind, EntityId, UnitKind};
    use tactics_core::grid::Coord;

    /// Coordinate inside a `width` x `height` map, plus a one-tile border
    /// outside it.
    pub fn arb_coord(width: i32, height: i32) -> impl Strategy<Value = Coord> {
        (-1..=width, -1..=height).prop_map(|(x, y)| Coord::new(x, y))
    }

    /// Entity id in `1..=max_id`.
    pub fn arb_entity_id(max_id: u32) -> impl Strategy<Value = EntityId> {
        (1..=max_id).prop_map(EntityId)
    }

    /// Any unit type.
    pub fn arb_unit_kind() -> impl Strategy<Value = UnitKind> {
        prop_oneof![
            Just(UnitKind::Worker),
            Just(UnitKind::Melee),
            Just(UnitKind::Ranged),
        ]
    }

    /// Any constructible building type.
    pub fn arb_building_kind() -> impl Strategy<Value = BuildingKind> {
        prop_oneof![Just(BuildingKind::City), Just(BuildingKind::Barracks)]
    }

    /// Any command over a `width` x `height` map.
    pub fn arb_command(max_id: u32, width: i32, height: i32) -> impl Strategy<Value = Command> {
        prop_oneof![
            arb_entity_id(max_id).prop_map(|entity| Command::Select { entity }),
            (arb_entity_id(max_id), arb_coord(width, height))
                .prop_map(|(unit, to)| Command::MoveOrAct { unit, to }),
            (arb_entity_id(max_id), arb_coord(width, height))
                .prop_map(|(unit, to)| Command::Move { unit, to }),
            (arb_entity_id(max_id), arb_entity_id(max_id))
                .prop_map(|(unit, target)| Command::Attack { unit, target }),
            (arb_entity_id(max_id), arb_coord(width, height))
                .prop_map(|(unit, at)| Command::Gather { unit, at }),
            (arb_building_kind(), arb_coord(width, height))
                .prop_map(|(kind, at)| Command::Build { kind, at }),
            (arb_entity_id(max_id), arb_unit_kind())
                .prop_map(|(building, unit)| Command::Train { building, unit }),
            Just(Command::EndTurn),
        ]
    }

    /// A script of up to `max_len` commands.
    pub fn arb_script(
        max_len: usize,
        max_id: u32,
        width: i32,
        height: i32,
    ) -> impl Strategy<Value = Vec<Command>> {
        proptest::collection::vec(arb_command(max_id, width, height), 0..max_len)
    }
}
