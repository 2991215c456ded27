//! Where score summaries come from

use crate::{Correction, Priority, ScoreEntry, ScoreSummary, ScoringConfig};

/// Supplier of the results for an analysed swing
pub trait ScoreSource: Send {
    /// Produce the summary shown once analysis completes
    fn summary(&mut self, config: &ScoringConfig) -> ScoreSummary;
}

/// Fixed demonstration data
#[derive(Debug, Clone, Copy, Default)]
pub struct MockScoreSource;

impl MockScoreSource {
    pub const HEADLINE: &'static str =
        "Your posture alignment is in the top 5% of all amateur analysis.";
}

impl ScoreSource for MockScoreSource {
    fn summary(&mut self, config: &ScoringConfig) -> ScoreSummary {
        let policy = &config.thresholds;
        let entries = vec![
            ScoreEntry::new(
                "Shoulder Line",
                94,
                "Excellent level shoulders through impact.",
                policy,
            ),
            ScoreEntry::new(
                "Hip Rotation",
                72,
                "Rotation is slightly early. Focus on delayed release.",
                policy,
            ),
            ScoreEntry::new(
                "Knee Flexion",
                88,
                "Solid base with good weight distribution.",
                policy,
            ),
        ];
        let corrections = vec![
            Correction::new(
                "Top Hand Grip",
                "The neural engine detected excessive tension in your right wrist. \
                 Loosen by 15% for better swing arc.",
                Priority::High,
            ),
            Correction::new(
                "Elbow Extension",
                "Raise your lead elbow during the backlift to create a straighter \
                 bat path on impact.",
                Priority::High,
            ),
        ];
        ScoreSummary::new(entries, corrections, Self::HEADLINE, config)
    }
}
