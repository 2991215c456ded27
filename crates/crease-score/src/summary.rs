//! Score entries, corrections and the overall efficiency

use crease_core::{CreaseError, CreaseResult};

use crate::{GradeScale, ScoreStatus, ThresholdPolicy};

/// One scored metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreEntry {
    pub label: String,
    /// 0..=100
    pub score: u8,
    pub status: ScoreStatus,
    pub feedback: String,
    /// Relative weight for `EfficiencyRule::Weighted`
    pub weight: u32,
}

impl ScoreEntry {
    /// Entry whose status is derived from the policy. Scores above 100 are
    /// clamped.
    pub fn new(
        label: impl Into<String>,
        score: u8,
        feedback: impl Into<String>,
        policy: &ThresholdPolicy,
    ) -> Self {
        let score = score.min(100);
        ScoreEntry {
            label: label.into(),
            score,
            status: policy.bucket(score),
            feedback: feedback.into(),
            weight: 1,
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }
}

/// Correction priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "High Priority",
            Priority::Medium => "Medium Priority",
            Priority::Low => "Low Priority",
        }
    }
}

/// Actionable coaching correction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

impl Correction {
    pub fn new(title: impl Into<String>, description: impl Into<String>, priority: Priority) -> Self {
        Correction {
            title: title.into(),
            description: description.into(),
            priority,
        }
    }
}

/// How the overall efficiency percentage is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EfficiencyRule {
    /// Rounded mean of the entry scores
    Mean,
    /// Rounded weighted mean using `ScoreEntry::weight`
    Weighted,
    /// Fixed figure from the analysis source
    Supplied(u8),
}

impl Default for EfficiencyRule {
    fn default() -> Self {
        EfficiencyRule::Supplied(87)
    }
}

impl EfficiencyRule {
    /// Evaluate against a set of entries. Means over an empty set (or zero
    /// total weight) are 0.
    pub fn evaluate(&self, entries: &[ScoreEntry]) -> u8 {
        match *self {
            EfficiencyRule::Supplied(percent) => percent.min(100),
            EfficiencyRule::Mean => {
                rounded_mean(entries.iter().map(|e| (u64::from(e.score), 1)))
            }
            EfficiencyRule::Weighted => {
                rounded_mean(entries.iter().map(|e| (u64::from(e.score), u64::from(e.weight))))
            }
        }
    }
}

fn rounded_mean(values: impl Iterator<Item = (u64, u64)>) -> u8 {
    let (sum, weight) = values.fold((0u64, 0u64), |(s, w), (v, vw)| (s + v * vw, w + vw));
    if weight == 0 {
        return 0;
    }
    ((sum + weight / 2) / weight).min(100) as u8
}

/// Headline efficiency figure with its grade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverallEfficiency {
    pub percent: u8,
    pub grade: String,
}

impl OverallEfficiency {
    pub fn compute(rule: EfficiencyRule, entries: &[ScoreEntry], scale: &GradeScale) -> Self {
        let percent = rule.evaluate(entries);
        OverallEfficiency {
            percent,
            grade: scale.grade(percent).to_string(),
        }
    }

    /// Text for the headline ring, e.g. `87% (A+)`
    pub fn label(&self) -> String {
        format!("{}% ({})", self.percent, self.grade)
    }
}

/// Scoring policy bundle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoringConfig {
    pub thresholds: ThresholdPolicy,
    pub grades: GradeScale,
    pub efficiency: EfficiencyRule,
}

impl ScoringConfig {
    pub fn validate(&self) -> CreaseResult<()> {
        self.thresholds.validate()?;
        if let EfficiencyRule::Supplied(percent) = self.efficiency {
            if percent > 100 {
                return Err(CreaseError::InvalidConfig(format!(
                    "supplied efficiency must be at most 100, got {}",
                    percent
                )));
            }
        }
        Ok(())
    }
}

/// Everything the results panel shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSummary {
    pub entries: Vec<ScoreEntry>,
    pub corrections: Vec<Correction>,
    pub headline: String,
    pub efficiency: OverallEfficiency,
}

impl ScoreSummary {
    pub fn new(
        entries: Vec<ScoreEntry>,
        corrections: Vec<Correction>,
        headline: impl Into<String>,
        config: &ScoringConfig,
    ) -> Self {
        let efficiency = OverallEfficiency::compute(config.efficiency, &entries, &config.grades);
        ScoreSummary {
            entries,
            corrections,
            headline: headline.into(),
            efficiency,
        }
    }

    /// Corrections ordered highest priority first, stable within a priority
    pub fn corrections_by_priority(&self) -> Vec<&Correction> {
        let mut sorted: Vec<&Correction> = self.corrections.iter().collect();
        sorted.sort_by(|a, b| b.priority.cmp(&a.priority));
        sorted
    }

    pub fn entry(&self, label: &str) -> Option<&ScoreEntry> {
        self.entries.iter().find(|e| e.label == label)
    }
}
