// Position categories and their rating-table rows.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Number of skill slots carried by an outfield player.
pub const OUTFIELD_SKILL_COUNT: usize = 14;

/// Number of skill slots carried by a goalkeeper.
pub const GOALKEEPER_SKILL_COUNT: usize = 11;

/// Positional categories used to pick a row from the rating weight tables.
///
/// Left/right variants share a category (DR and DL both map to `FullBack`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionCategory {
    CentreBack,
    FullBack,
    DefensiveMidfield,
    DefensiveWing,
    CentralMidfield,
    Winger,
    AttackingMidfield,
    AttackingWing,
    Forward,
    Goalkeeper,
}

/// All categories in weight-table row order.
pub const ALL_POSITIONS: [PositionCategory; 10] = [
    PositionCategory::CentreBack,
    PositionCategory::FullBack,
    PositionCategory::DefensiveMidfield,
    PositionCategory::DefensiveWing,
    PositionCategory::CentralMidfield,
    PositionCategory::Winger,
    PositionCategory::AttackingMidfield,
    PositionCategory::AttackingWing,
    PositionCategory::Forward,
    PositionCategory::Goalkeeper,
];

impl PositionCategory {
    /// Parse a position tag as the game writes it.
    ///
    /// Handles lower/upper case and the side-specific variants:
    /// - "dr"/"dl" -> FullBack, "dmr"/"dml" -> DefensiveWing
    /// - "mr"/"ml" -> Winger, "omr"/"oml" -> AttackingWing
    pub fn from_tag(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gk" => Some(PositionCategory::Goalkeeper),
            "dc" => Some(PositionCategory::CentreBack),
            "dr" | "dl" => Some(PositionCategory::FullBack),
            "dmc" => Some(PositionCategory::DefensiveMidfield),
            "dmr" | "dml" => Some(PositionCategory::DefensiveWing),
            "mc" => Some(PositionCategory::CentralMidfield),
            "mr" | "ml" => Some(PositionCategory::Winger),
            "omc" => Some(PositionCategory::AttackingMidfield),
            "omr" | "oml" => Some(PositionCategory::AttackingWing),
            "fc" => Some(PositionCategory::Forward),
            _ => None,
        }
    }

    /// Look up a category by its weight-table row.
    pub fn from_index(index: usize) -> Option<Self> {
        ALL_POSITIONS.get(index).copied()
    }

    /// Row of this category in the rating weight tables.
    pub fn index(&self) -> usize {
        match self {
            PositionCategory::CentreBack => 0,
            PositionCategory::FullBack => 1,
            PositionCategory::DefensiveMidfield => 2,
            PositionCategory::DefensiveWing => 3,
            PositionCategory::CentralMidfield => 4,
            PositionCategory::Winger => 5,
            PositionCategory::AttackingMidfield => 6,
            PositionCategory::AttackingWing => 7,
            PositionCategory::Forward => 8,
            PositionCategory::Goalkeeper => 9,
        }
    }

    pub fn is_goalkeeper(&self) -> bool {
        matches!(self, PositionCategory::Goalkeeper)
    }

    /// Number of skill slots a player of this category carries.
    pub fn skill_count(&self) -> usize {
        if self.is_goalkeeper() {
            GOALKEEPER_SKILL_COUNT
        } else {
            OUTFIELD_SKILL_COUNT
        }
    }

    /// Return the display string for this category.
    pub fn display_str(&self) -> &'static str {
        match self {
            PositionCategory::CentreBack => "DC",
            PositionCategory::FullBack => "DR/L",
            PositionCategory::DefensiveMidfield => "DMC",
            PositionCategory::DefensiveWing => "DMR/L",
            PositionCategory::CentralMidfield => "MC",
            PositionCategory::Winger => "MR/L",
            PositionCategory::AttackingMidfield => "OMC",
            PositionCategory::AttackingWing => "OMR/L",
            PositionCategory::Forward => "FC",
            PositionCategory::Goalkeeper => "GK",
        }
    }
}

impl fmt::Display for PositionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

/// Parse a comma-separated favourite-position list ("dmc, mc").
///
/// Unknown tags are dropped. The caller decides what an empty result means.
pub fn parse_position_list(s: &str) -> Vec<PositionCategory> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .filter_map(|t| {
            let parsed = PositionCategory::from_tag(t);
            if parsed.is_none() {
                warn!("ignoring unknown position tag '{}'", t);
            }
            parsed
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_variants_share_a_category() {
        assert_eq!(PositionCategory::from_tag("dr"), Some(PositionCategory::FullBack));
        assert_eq!(PositionCategory::from_tag("DL"), Some(PositionCategory::FullBack));
        assert_eq!(PositionCategory::from_tag("oml"), Some(PositionCategory::AttackingWing));
        assert_eq!(PositionCategory::from_tag(" GK "), Some(PositionCategory::Goalkeeper));
        assert_eq!(PositionCategory::from_tag("sw"), None);
    }

    #[test]
    fn index_round_trips_through_from_index() {
        for pos in ALL_POSITIONS {
            assert_eq!(PositionCategory::from_index(pos.index()), Some(pos));
        }
        assert_eq!(PositionCategory::from_index(10), None);
    }

    #[test]
    fn goalkeeper_has_eleven_slots() {
        assert_eq!(PositionCategory::Goalkeeper.skill_count(), 11);
        assert_eq!(PositionCategory::Forward.skill_count(), 14);
    }

    #[test]
    fn position_list_drops_unknown_tags() {
        let parsed = parse_position_list("dmc, xx,mc,");
        assert_eq!(
            parsed,
            vec![PositionCategory::DefensiveMidfield, PositionCategory::CentralMidfield]
        );
        assert!(parse_position_list("").is_empty());
    }
}
