//! Confidence tiers derived from the enhanced score.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rating {
    A,
    B,
    C,
}

impl Rating {
    pub const A_MIN_SCORE: u32 = 30;
    pub const B_MIN_SCORE: u32 = 20;

    pub fn from_score(enhanced_score: u32) -> Self {
        if enhanced_score >= Self::A_MIN_SCORE {
            Rating::A
        } else if enhanced_score >= Self::B_MIN_SCORE {
            Rating::B
        } else {
            Rating::C
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rating::A => "A",
            Rating::B => "B",
            Rating::C => "C",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries() {
        assert_eq!(Rating::from_score(0), Rating::C);
        assert_eq!(Rating::from_score(19), Rating::C);
        assert_eq!(Rating::from_score(20), Rating::B);
        assert_eq!(Rating::from_score(29), Rating::B);
        assert_eq!(Rating::from_score(30), Rating::A);
        assert_eq!(Rating::from_score(60), Rating::A);
    }

    #[test]
    fn ordering_puts_a_first() {
        let mut ratings = vec![Rating::C, Rating::A, Rating::B];
        ratings.sort();
        assert_eq!(ratings, vec![Rating::A, Rating::B, Rating::C]);
    }
}
