use serde::{Deserialize, Serialize};

use super::super::domain::{Score, UrgencyTier};
use super::super::error::ValidationError;

/// Lower inclusive cutoffs of the three upper tiers; everything below `moderate` is `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierBoundaries {
    critical: u8,
    high: u8,
    moderate: u8,
}

impl TierBoundaries {
    pub const STANDARD: TierBoundaries = TierBoundaries {
        critical: 9,
        high: 7,
        moderate: 4,
    };

    /// Every tier must own at least one score, so `2 <= moderate < high < critical <= 10`.
    pub fn new(critical: u8, high: u8, moderate: u8) -> Result<Self, ValidationError> {
        let ordered = moderate < high && high < critical;
        let in_range = moderate > Score::MIN && critical <= Score::MAX;
        if !(ordered && in_range) {
            return Err(ValidationError::InvalidBoundaries {
                critical,
                high,
                moderate,
            });
        }

        Ok(Self {
            critical,
            high,
            moderate,
        })
    }

    pub const fn critical(&self) -> u8 {
        self.critical
    }

    pub const fn high(&self) -> u8 {
        self.high
    }

    pub const fn moderate(&self) -> u8 {
        self.moderate
    }

    pub fn classify(&self, score: Score) -> UrgencyTier {
        let value = score.value();
        if value >= self.critical {
            UrgencyTier::Critical
        } else if value >= self.high {
            UrgencyTier::High
        } else if value >= self.moderate {
            UrgencyTier::Moderate
        } else {
            UrgencyTier::Low
        }
    }

    /// Scores at or above the high cutoff are urgent and bypass the normal circuit.
    pub fn is_urgent(&self, score: Score) -> bool {
        score.value() >= self.high
    }

    pub fn urgent_threshold(&self) -> Score {
        Score::clamped(self.high)
    }

    /// Inclusive score range covered by `tier`.
    pub fn range_of(&self, tier: UrgencyTier) -> (u8, u8) {
        match tier {
            UrgencyTier::Critical => (self.critical, Score::MAX),
            UrgencyTier::High => (self.high, self.critical - 1),
            UrgencyTier::Moderate => (self.moderate, self.high - 1),
            UrgencyTier::Low => (Score::MIN, self.moderate - 1),
        }
    }
}

impl Default for TierBoundaries {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Classification with the department's standard boundaries.
pub fn classify(score: Score) -> UrgencyTier {
    TierBoundaries::STANDARD.classify(score)
}

/// Where the patient goes after triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareCircuit {
    /// Urgent: handed directly to reception for immediate placement.
    DirectToReception,
    Normal,
}

impl CareCircuit {
    pub fn for_score(score: Score, boundaries: &TierBoundaries) -> Self {
        if boundaries.is_urgent(score) {
            CareCircuit::DirectToReception
        } else {
            CareCircuit::Normal
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            CareCircuit::DirectToReception => "Transfert direct à la réceptionniste",
            CareCircuit::Normal => "Circuit normal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(value: u8) -> Score {
        Score::new(value).expect("valid score")
    }

    #[test]
    fn standard_tiers_partition_the_score_range() {
        let boundaries = TierBoundaries::STANDARD;
        for candidate in Score::all() {
            let matching: Vec<UrgencyTier> = UrgencyTier::ordered()
                .into_iter()
                .filter(|tier| {
                    let (low, high) = boundaries.range_of(*tier);
                    (low..=high).contains(&candidate.value())
                })
                .collect();
            assert_eq!(matching.len(), 1, "score {candidate} matched {matching:?}");
            assert_eq!(matching[0], classify(candidate));
        }
    }

    #[test]
    fn standard_boundaries_are_inclusive() {
        assert_eq!(classify(score(10)), UrgencyTier::Critical);
        assert_eq!(classify(score(9)), UrgencyTier::Critical);
        assert_eq!(classify(score(8)), UrgencyTier::High);
        assert_eq!(classify(score(7)), UrgencyTier::High);
        assert_eq!(classify(score(6)), UrgencyTier::Moderate);
        assert_eq!(classify(score(4)), UrgencyTier::Moderate);
        assert_eq!(classify(score(3)), UrgencyTier::Low);
        assert_eq!(classify(score(1)), UrgencyTier::Low);
    }

    #[test]
    fn rejects_overlapping_or_out_of_range_boundaries() {
        assert!(TierBoundaries::new(7, 7, 4).is_err());
        assert!(TierBoundaries::new(9, 7, 8).is_err());
        assert!(TierBoundaries::new(11, 7, 4).is_err());
        assert!(TierBoundaries::new(9, 7, 1).is_err());
        assert!(TierBoundaries::new(10, 9, 2).is_ok());
    }

    #[test]
    fn custom_boundaries_still_partition() {
        let boundaries = TierBoundaries::new(10, 6, 3).expect("valid boundaries");
        let mut counts = [0usize; 4];
        for candidate in Score::all() {
            let tier = boundaries.classify(candidate);
            let index = UrgencyTier::ordered()
                .iter()
                .position(|known| *known == tier)
                .expect("tier is one of the four");
            counts[index] += 1;
        }
        assert_eq!(counts, [1, 4, 3, 2]);
    }

    #[test]
    fn urgent_scores_route_directly_to_reception() {
        let boundaries = TierBoundaries::STANDARD;
        assert_eq!(
            CareCircuit::for_score(score(7), &boundaries),
            CareCircuit::DirectToReception
        );
        assert_eq!(
            CareCircuit::for_score(score(6), &boundaries),
            CareCircuit::Normal
        );
    }
}
