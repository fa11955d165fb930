use serde::{Deserialize, Serialize};
use std::fmt;

/// Difficulty bucket selecting which problem archetypes are eligible.
///
/// Anything that is not a recognised grade falls back to [`GradeTier::Eight`],
/// so tier selection never fails.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(from = "u8", into = "u8")]
pub enum GradeTier {
    #[default]
    Four,
    Five,
    Six,
    Seven,
    Eight,
}

impl GradeTier {
    pub const ALL: [GradeTier; 5] = [
        GradeTier::Four,
        GradeTier::Five,
        GradeTier::Six,
        GradeTier::Seven,
        GradeTier::Eight,
    ];

    #[must_use]
    pub fn from_number(grade: u8) -> Self {
        match grade {
            4 => Self::Four,
            5 => Self::Five,
            6 => Self::Six,
            7 => Self::Seven,
            _ => Self::Eight,
        }
    }

    /// Parses user or storage input such as `"6"` or `" 7 "`.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        raw.trim()
            .parse::<u8>()
            .map_or(Self::Eight, Self::from_number)
    }

    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Self::Four => 4,
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
        }
    }
}

impl From<u8> for GradeTier {
    fn from(grade: u8) -> Self {
        Self::from_number(grade)
    }
}

impl From<GradeTier> for u8 {
    fn from(tier: GradeTier) -> Self {
        tier.number()
    }
}

impl fmt::Display for GradeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Grade {}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_grades_map_to_their_tier() {
        for tier in GradeTier::ALL {
            assert_eq!(GradeTier::from_number(tier.number()), tier);
        }
    }

    #[test]
    fn unknown_input_falls_back_to_grade_eight() {
        assert_eq!(GradeTier::from_number(3), GradeTier::Eight);
        assert_eq!(GradeTier::from_number(12), GradeTier::Eight);
        assert_eq!(GradeTier::parse_lenient("grade six"), GradeTier::Eight);
        assert_eq!(GradeTier::parse_lenient(""), GradeTier::Eight);
        assert_eq!(GradeTier::parse_lenient(" 6 "), GradeTier::Six);
    }

    #[test]
    fn serializes_as_plain_number() {
        let json = serde_json::to_string(&GradeTier::Seven).unwrap();
        assert_eq!(json, "7");
        let back: GradeTier = serde_json::from_str("5").unwrap();
        assert_eq!(back, GradeTier::Five);
        let fallback: GradeTier = serde_json::from_str("99").unwrap();
        assert_eq!(fallback, GradeTier::Eight);
    }
}
