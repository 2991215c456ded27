//! Letter grades for the overall efficiency

use crease_core::{CreaseError, CreaseResult};

/// One grade step: percentages at or above `min` earn `label`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeStep {
    pub min: u8,
    pub label: String,
}

/// Monotone percentage-to-grade mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeScale {
    /// Steps ordered by strictly descending `min`
    steps: Vec<GradeStep>,
    /// Grade below the lowest step
    floor: String,
}

impl GradeScale {
    /// Build a scale. Steps may be given in any order but their minimums
    /// must be distinct.
    pub fn new<S: Into<String>>(steps: Vec<(u8, S)>, floor: impl Into<String>) -> CreaseResult<Self> {
        let mut steps: Vec<GradeStep> = steps
            .into_iter()
            .map(|(min, label)| GradeStep {
                min,
                label: label.into(),
            })
            .collect();
        steps.sort_by(|a, b| b.min.cmp(&a.min));

        if steps.windows(2).any(|w| w[0].min == w[1].min) {
            return Err(CreaseError::InvalidConfig(
                "grade steps must have distinct minimums".into(),
            ));
        }
        if steps.iter().any(|s| s.min > 100) {
            return Err(CreaseError::InvalidConfig(
                "grade minimums must not exceed 100".into(),
            ));
        }

        Ok(GradeScale {
            steps,
            floor: floor.into(),
        })
    }

    pub fn steps(&self) -> &[GradeStep] {
        &self.steps
    }

    /// Grade for a percentage
    pub fn grade(&self, percent: u8) -> &str {
        self.steps
            .iter()
            .find(|s| percent >= s.min)
            .map_or(self.floor.as_str(), |s| s.label.as_str())
    }

    /// Rank of the grade for a percentage (0 = floor). Non-decreasing in
    /// the percentage.
    pub fn rank(&self, percent: u8) -> usize {
        self.steps.len() - self.steps.iter().position(|s| percent >= s.min).unwrap_or(self.steps.len())
    }
}

impl Default for GradeScale {
    fn default() -> Self {
        GradeScale {
            steps: vec![
                GradeStep { min: 85, label: "A+".into() },
                GradeStep { min: 75, label: "A".into() },
                GradeStep { min: 65, label: "B".into() },
                GradeStep { min: 50, label: "C".into() },
            ],
            floor: "D".into(),
        }
    }
}
