//! Data validation utilities.
//!
//! The kind of a data file is decided by its name:
//!
//! | pattern | kind |
//! |---|---|
//! | `*.map.ron` | [`MapDefinition`] in RON |
//! | `*.txt` | ASCII map |
//! | `*config.ron` | [`EngineConfig`] |
//! | any other `*.ron` | [`Ruleset`] |

use std::path::{Path, PathBuf};

use tactics_core::config::EngineConfig;
use tactics_core::data::Ruleset;
use tactics_core::map::MapDefinition;

use crate::error::{read_file, Result, ToolError};

/// What a data file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    /// Rule tables.
    Ruleset,
    /// Engine configuration.
    Config,
    /// Map in RON.
    Map,
    /// Map drawn in ASCII.
    AsciiMap,
}

impl DataKind {
    /// Classify a file by name, `None` for files that are not data.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.ends_with(".map.ron") {
            Some(Self::Map)
        } else if name.ends_with(".txt") {
            Some(Self::AsciiMap)
        } else if name.ends_with("config.ron") {
            Some(Self::Config)
        } else if name.ends_with(".ron") {
            Some(Self::Ruleset)
        } else {
            None
        }
    }
}

/// Validation result for one file.
#[derive(Debug, Clone)]
pub struct FileReport {
    /// File checked.
    pub path: PathBuf,
    /// How it was interpreted.
    pub kind: DataKind,
    /// Problems found, empty when valid.
    pub errors: Vec<String>,
}

impl FileReport {
    /// Whether the file is valid.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse a map file, RON or ASCII depending on its name.
pub fn load_map(path: &Path) -> Result<MapDefinition> {
    let source = read_file(path)?;
    let map = match DataKind::from_path(path) {
        Some(DataKind::Map) => MapDefinition::from_ron_str(&source)?,
        _ => MapDefinition::from_ascii(&source)?,
    };
    Ok(map)
}

/// Parse and validate an engine config file.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    Ok(EngineConfig::from_ron_str(&read_file(path)?)?)
}

/// Check one file of a known kind.
///
/// Parse and semantic errors end up in the report; only unreadable files
/// are returned as errors.
pub fn validate_file(path: &Path, kind: DataKind) -> Result<FileReport> {
    let source = read_file(path)?;
    let outcome = match kind {
        DataKind::Ruleset => Ruleset::from_ron_str(&source).map(drop),
        DataKind::Config => EngineConfig::from_ron_str(&source).map(drop),
        DataKind::Map => MapDefinition::from_ron_str(&source).map(drop),
        DataKind::AsciiMap => MapDefinition::from_ascii(&source).map(drop),
    };
    let errors = match outcome {
        Ok(()) => Vec::new(),
        Err(e) => vec![e.to_string()],
    };
    if errors.is_empty() {
        tracing::debug!(path = %path.display(), ?kind, "valid");
    } else {
        tracing::warn!(path = %path.display(), ?kind, errors = errors.len(), "invalid");
    }
    Ok(FileReport {
        path: path.to_path_buf(),
        kind,
        errors,
    })
}

/// Validate a single data file or every data file in a directory tree.
///
/// Files are visited in sorted path order.
pub fn validate_path(path: &Path) -> Result<Vec<FileReport>> {
    let mut files = Vec::new();
    collect_data_files(path, &mut files)?;
    files.sort();
    files
        .into_iter()
        .filter_map(|file| DataKind::from_path(&file).map(|kind| (file, kind)))
        .map(|(file, kind)| validate_file(&file, kind))
        .collect()
}

fn collect_data_files(path: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    if !path.is_dir() {
        out.push(path.to_path_buf());
        return Ok(());
    }
    let entries = std::fs::read_dir(path).map_err(|source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| ToolError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        collect_data_files(&entry.path(), out)?;
    }
    Ok(())
}
