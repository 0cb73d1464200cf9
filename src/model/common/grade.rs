use std::cmp::Ordering;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Named result band derived from the percentage score via fixed thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    Excellent,
    #[serde(rename = "Very Good")]
    VeryGood,
    Good,
    Fair,
    Pass,
    #[serde(rename = "Try Again")]
    TryAgain,
}

impl Grade {
    /// Map a percentage to its band, evaluated highest-first.
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            90..=u32::MAX => Self::Excellent,
            80..=89 => Self::VeryGood,
            70..=79 => Self::Good,
            60..=69 => Self::Fair,
            50..=59 => Self::Pass,
            _ => Self::TryAgain,
        }
    }

    /// Band rank; higher is better.
    fn rank(self) -> u8 {
        match self {
            Self::TryAgain => 0,
            Self::Pass => 1,
            Self::Fair => 2,
            Self::Good => 3,
            Self::VeryGood => 4,
            Self::Excellent => 5,
        }
    }
}

impl Ord for Grade {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Grade {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Excellent => "Excellent",
            Self::VeryGood => "Very Good",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Pass => "Pass",
            Self::TryAgain => "Try Again",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds() {
        assert_eq!(Grade::from_percentage(100), Grade::Excellent);
        assert_eq!(Grade::from_percentage(90), Grade::Excellent);
        assert_eq!(Grade::from_percentage(89), Grade::VeryGood);
        assert_eq!(Grade::from_percentage(80), Grade::VeryGood);
        assert_eq!(Grade::from_percentage(79), Grade::Good);
        assert_eq!(Grade::from_percentage(70), Grade::Good);
        assert_eq!(Grade::from_percentage(69), Grade::Fair);
        assert_eq!(Grade::from_percentage(60), Grade::Fair);
        assert_eq!(Grade::from_percentage(59), Grade::Pass);
        assert_eq!(Grade::from_percentage(50), Grade::Pass);
        assert_eq!(Grade::from_percentage(49), Grade::TryAgain);
        assert_eq!(Grade::from_percentage(0), Grade::TryAgain);
    }

    #[test]
    fn bands_are_monotonic_in_percentage() {
        for p in 1..=100 {
            assert!(
                Grade::from_percentage(p - 1) <= Grade::from_percentage(p),
                "band regressed between {} and {}",
                p - 1,
                p
            );
        }
    }
}
