//! Qualitative status buckets

use crease_core::{CreaseError, CreaseResult};

/// Qualitative status of one metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScoreStatus {
    Poor,
    Average,
    Good,
}

impl ScoreStatus {
    pub fn label(self) -> &'static str {
        match self {
            ScoreStatus::Good => "good",
            ScoreStatus::Average => "average",
            ScoreStatus::Poor => "poor",
        }
    }
}

/// Bucket thresholds: `score >= good` is Good, `score >= average` is Average
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdPolicy {
    pub good: u8,
    pub average: u8,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        ThresholdPolicy {
            good: 85,
            average: 60,
        }
    }
}

impl ThresholdPolicy {
    pub fn new(good: u8, average: u8) -> CreaseResult<Self> {
        let policy = ThresholdPolicy { good, average };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> CreaseResult<()> {
        if self.average >= self.good || self.good > 100 {
            return Err(CreaseError::InvalidConfig(format!(
                "thresholds must satisfy average < good <= 100, got average={} good={}",
                self.average, self.good
            )));
        }
        Ok(())
    }

    /// Map a score to its status
    pub fn bucket(&self, score: u8) -> ScoreStatus {
        if score >= self.good {
            ScoreStatus::Good
        } else if score >= self.average {
            ScoreStatus::Average
        } else {
            ScoreStatus::Poor
        }
    }
}
