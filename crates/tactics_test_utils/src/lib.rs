//! # Tactics Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Determinism harness driven by command scripts
//! - Map and game fixtures, including a scripted AI
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
