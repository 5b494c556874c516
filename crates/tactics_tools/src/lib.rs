//! # Tactics Development Tools
//!
//! Command-line tools for development:
//! - Data validators for rulesets, engine configs and maps
//! - A headless match runner
//! - ASCII fog-of-war and movement-range views
//!
//! All file IO lives here; the core never touches the filesystem.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ascii;
pub mod error;
pub mod simulate;
pub mod validate;

pub use error::{Result, ToolError};
