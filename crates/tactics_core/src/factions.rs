//! Faction definitions and identifiers.

use serde::{Deserialize, Serialize};

/// Unique identifier for factions.
///
/// Factions differ only in the gathering bonuses listed in
/// [`crate::data::FactionData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FactionId {
    /// Farmers of the river plains.
    Verdant,
    /// Mountain smiths.
    Ironhold,
    /// Forest wardens.
    Sylvan,
    /// Wanderers with no home terrain.
    Nomads,
}

impl FactionId {
    /// Every faction, in declaration order.
    pub const ALL: [Self; 4] = [Self::Verdant, Self::Ironhold, Self::Sylvan, Self::Nomads];

    /// Get the display name for this faction.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Verdant => "The Verdant Reach",
            Self::Ironhold => "Ironhold",
            Self::Sylvan => "The Sylvan Compact",
            Self::Nomads => "The Free Nomads",
        }
    }

    /// Get the short name for this faction.
    #[must_use]
    pub const fn short_name(&self) -> &'static str {
        match self {
            Self::Verdant => "Verdant",
            Self::Ironhold => "Ironhold",
            Self::Sylvan => "Sylvan",
            Self::Nomads => "Nomads",
        }
    }
}

impl std::fmt::Display for FactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}
