//! End-to-end Scenario Suite
//!
//! Scenarios that walk the complete session workflow:
//! - Upload, hand-off and results
//! - Rejection and cancellation paths
//! - Media failure recovery
//! - Resource balance across repeated sessions
//! - Playback controls and post-teardown silence

use std::time::Duration;

use crease_core::{CreaseError, CreaseResult, MediaFile};
use crease_runtime::{SessionEvent, SessionIntent, SessionStage};

use crate::{SessionSimulator, SimulatorConfig};

// ============================================================================
// SCENARIO RESULT
// ============================================================================

/// Outcome of one scenario: every failed check, by description
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub name: &'static str,
    pub failures: Vec<String>,
}

impl ScenarioResult {
    fn new(name: &'static str) -> Self {
        ScenarioResult {
            name,
            failures: Vec::new(),
        }
    }

    fn check(&mut self, ok: bool, what: impl Into<String>) {
        if !ok {
            self.failures.push(what.into());
        }
    }

    fn expect_ok<T>(&mut self, result: CreaseResult<T>, what: &str) {
        if let Err(e) = result {
            self.failures.push(format!("{}: {}", what, e));
        }
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Nominal upload time with default progress settings
pub const UPLOAD_TIME: Duration = Duration::from_millis(2500);

/// The reference clip
pub fn swing_clip() -> MediaFile {
    MediaFile::declared("swing.mp4", "video/mp4", 20 * 1024 * 1024)
}

fn simulator(result: &mut ScenarioResult, config: SimulatorConfig) -> Option<SessionSimulator> {
    match SessionSimulator::new(config) {
        Ok(sim) => Some(sim),
        Err(e) => {
            result.failures.push(format!("simulator: {}", e));
            None
        }
    }
}

fn upload(result: &mut ScenarioResult, sim: &mut SessionSimulator) {
    result.expect_ok(sim.select(swing_clip()), "select");
    result.expect_ok(sim.intent(SessionIntent::Start), "start");
    sim.run_for(UPLOAD_TIME);
}

// ============================================================================
// SCENARIOS
// ============================================================================

/// Select, upload, view results, start over
pub fn scenario_full_flow() -> ScenarioResult {
    let mut result = ScenarioResult::new("full flow");
    let Some(mut sim) = simulator(&mut result, SimulatorConfig::seeded(1)) else {
        return result;
    };

    result.expect_ok(sim.select(swing_clip()), "select");
    result.check(sim.stage() == SessionStage::Selected, "selected after select");
    result.expect_ok(sim.intent(SessionIntent::Start), "start");
    sim.run_for(UPLOAD_TIME);

    result.check(sim.stage() == SessionStage::Results, "results after upload");
    let expected: Vec<u8> = (0..=100).step_by(5).collect();
    result.check(sim.progress_trace() == expected, "progress 0..=100 in steps of 5");
    result.check(
        sim.first_at(|e| matches!(e, SessionEvent::ResultsReady { .. })) == Some(UPLOAD_TIME),
        "hand-off at 2.5s",
    );
    result.check(
        sim.count(|e| matches!(e, SessionEvent::ResultsReady { .. })) == 1,
        "exactly one hand-off",
    );

    let view = sim.view();
    match view.results() {
        Some(results) => {
            result.check(results.file.name == "swing.mp4", "file carried into results");
            result.check(results.scores.grade == "A+", "grade A+");
            let overlay = results.overlay.as_ref();
            result.check(overlay.map_or(0, |o| o.keypoints.len()) == 13, "13 keypoints");
            result.check(
                overlay.map_or(false, |o| o.readouts.iter().any(|r| r.name == "ELBOW")),
                "elbow readout",
            );
        }
        None => result.check(false, "results view"),
    }

    let before = sim.clock();
    sim.run_for(Duration::from_secs(1));
    result.check(
        sim.events_after(before)
            .filter(|e| matches!(e.event, SessionEvent::OverlayFrame(_)))
            .count()
            == 10,
        "ten overlay ticks per second",
    );

    result.expect_ok(sim.intent(SessionIntent::NewSession), "new session");
    result.check(sim.stage() == SessionStage::Empty, "empty after new session");
    result.check(sim.ledger().is_balanced(), "media ledger balanced");

    let reset_at = sim.clock();
    sim.run_for(Duration::from_secs(3));
    result.check(sim.events_after(reset_at).count() == 0, "silent after new session");
    result
}

/// Unsupported file is refused and nothing changes
pub fn scenario_rejected_upload() -> ScenarioResult {
    let mut result = ScenarioResult::new("rejected upload");
    let Some(mut sim) = simulator(&mut result, SimulatorConfig::seeded(2)) else {
        return result;
    };

    let outcome = sim.select(MediaFile::declared("notes.pdf", "application/pdf", 4096));
    result.check(matches!(outcome, Err(CreaseError::Rejected(_))), "pdf rejected");
    result.check(sim.stage() == SessionStage::Empty, "still empty");
    result.check(sim.view().last_error.is_some(), "inline error shown");
    result.check(
        matches!(sim.intent(SessionIntent::Start), Err(CreaseError::InvalidTransition { .. })),
        "cannot start without a file",
    );

    sim.run_for(Duration::from_secs(3));
    result.check(sim.ledger().created() == 0, "no media allocated");
    result
}

/// Removing mid-upload stops the driver; no stale completion
pub fn scenario_cancelled_upload() -> ScenarioResult {
    let mut result = ScenarioResult::new("cancelled upload");
    let Some(mut sim) = simulator(&mut result, SimulatorConfig::seeded(3)) else {
        return result;
    };

    result.expect_ok(sim.select(swing_clip()), "select");
    result.expect_ok(sim.intent(SessionIntent::Start), "start");
    sim.run_for(Duration::from_millis(2200));
    result.expect_ok(sim.intent(SessionIntent::Remove), "remove");
    result.check(sim.stage() == SessionStage::Empty, "empty after remove");

    let removed_at = sim.clock();
    sim.run_for(Duration::from_secs(5));
    result.check(sim.events_after(removed_at).count() == 0, "no events after remove");
    result.check(
        sim.count(|e| matches!(e, SessionEvent::UploadComplete { .. })) == 0,
        "no completion",
    );
    result.check(sim.ledger().created() == 0, "no media allocated");
    result
}

/// First allocation fails; the session falls back to `Selected` and a retry succeeds
pub fn scenario_media_failure_recovery() -> ScenarioResult {
    let mut result = ScenarioResult::new("media failure recovery");
    let config = SimulatorConfig::seeded(4).with_refused_allocations(1);
    let Some(mut sim) = simulator(&mut result, config) else {
        return result;
    };

    upload(&mut result, &mut sim);
    result.check(sim.stage() == SessionStage::Selected, "back to selected");
    result.check(
        matches!(sim.controller().last_error(), Some(CreaseError::MediaUnavailable(_))),
        "media error reported",
    );

    result.expect_ok(sim.intent(SessionIntent::Start), "retry");
    sim.run_for(UPLOAD_TIME);
    result.check(sim.stage() == SessionStage::Results, "results after retry");
    result.check(sim.controller().last_error().is_none(), "error cleared");

    sim.teardown();
    result.check(sim.ledger().failed() == 1, "one refused allocation");
    result.check(sim.ledger().is_balanced(), "media ledger balanced");
    result
}

/// Many sessions back to back leave nothing live
pub fn scenario_repeated_sessions(cycles: usize) -> ScenarioResult {
    let mut result = ScenarioResult::new("repeated sessions");
    let Some(mut sim) = simulator(&mut result, SimulatorConfig::seeded(5)) else {
        return result;
    };

    for cycle in 0..cycles {
        upload(&mut result, &mut sim);
        result.check(
            sim.stage() == SessionStage::Results,
            format!("results in cycle {}", cycle),
        );
        sim.run_for(Duration::from_millis(300));
        result.check(sim.ledger().live().len() == 1, format!("one live URL in cycle {}", cycle));
        result.expect_ok(sim.intent(SessionIntent::NewSession), "new session");
        result.check(sim.ledger().live().is_empty(), format!("released in cycle {}", cycle));
    }

    sim.teardown();
    result.check(sim.ledger().created() == cycles, "one URL per cycle");
    result.check(sim.ledger().is_balanced(), "media ledger balanced");
    result
}

/// Pause, reset and overlay visibility on the results view
pub fn scenario_playback_controls() -> ScenarioResult {
    let mut result = ScenarioResult::new("playback controls");
    let Some(mut sim) = simulator(&mut result, SimulatorConfig::seeded(6)) else {
        return result;
    };

    upload(&mut result, &mut sim);
    sim.run_for(Duration::from_millis(700));

    result.expect_ok(sim.intent(SessionIntent::TogglePlay), "pause");
    let frame = sim.view().results().map(|r| r.frame);
    let paused_at = sim.clock();
    sim.run_for(Duration::from_secs(2));
    result.check(
        sim.events_after(paused_at)
            .all(|e| !matches!(e.event, SessionEvent::OverlayFrame(_))),
        "overlay frozen while paused",
    );
    result.check(sim.view().results().map(|r| r.frame) == frame, "frame counter frozen");
    result.check(
        sim.view().results().map(|r| r.hud.status.clone()).as_deref() == Some("PAUSED"),
        "hud paused",
    );

    result.expect_ok(sim.intent(SessionIntent::TogglePlay), "resume");
    result.expect_ok(sim.intent(SessionIntent::ResetView), "reset");
    let view = sim.view();
    let results = view.results();
    result.check(results.map(|r| r.frame) == Some(0), "rewound");
    result.check(
        results
            .and_then(|r| r.overlay.as_ref())
            .map_or(false, |o| o.readouts.iter().any(|r| r.text == "ELBOW: 173°")),
        "overlay back in the seed pose",
    );

    result.expect_ok(sim.intent(SessionIntent::SetOverlayVisible(false)), "hide overlay");
    let view = sim.view();
    result.check(
        view.results().map_or(false, |r| r.overlay.is_none() && r.hud.status == "IDLE"),
        "overlay hidden",
    );

    sim.teardown();
    let closed_at = sim.clock();
    result.check(
        matches!(sim.intent(SessionIntent::TogglePlay), Err(CreaseError::InvalidTransition { .. })),
        "intents refused after teardown",
    );
    sim.run_for(Duration::from_secs(2));
    result.check(sim.events_after(closed_at).count() == 0, "silent after teardown");
    result.check(sim.ledger().is_balanced(), "media ledger balanced");
    result
}

/// Run every scenario
pub fn run_all() -> Vec<ScenarioResult> {
    vec![
        scenario_full_flow(),
        scenario_rejected_upload(),
        scenario_cancelled_upload(),
        scenario_media_failure_recovery(),
        scenario_repeated_sessions(5),
        scenario_playback_controls(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_passed(result: ScenarioResult) {
        assert!(result.passed(), "{} failed: {:?}", result.name, result.failures);
    }

    #[test]
    fn test_full_flow() {
        assert_passed(scenario_full_flow());
    }

    #[test]
    fn test_rejected_upload() {
        assert_passed(scenario_rejected_upload());
    }

    #[test]
    fn test_cancelled_upload() {
        assert_passed(scenario_cancelled_upload());
    }

    #[test]
    fn test_media_failure_recovery() {
        assert_passed(scenario_media_failure_recovery());
    }

    #[test]
    fn test_repeated_sessions() {
        assert_passed(scenario_repeated_sessions(10));
    }

    #[test]
    fn test_playback_controls() {
        assert_passed(scenario_playback_controls());
    }

    #[test]
    fn test_run_all() {
        let results = run_all();
        assert_eq!(results.len(), 6);
        assert!(results.iter().all(ScenarioResult::passed));
    }

    fn intent() -> impl Strategy<Value = SessionIntent> {
        prop_oneof![
            Just(SessionIntent::Select(vec![swing_clip()])),
            Just(SessionIntent::Select(vec![MediaFile::declared(
                "clip.pdf",
                "application/pdf",
                10
            )])),
            Just(SessionIntent::Remove),
            Just(SessionIntent::Start),
            Just(SessionIntent::TogglePlay),
            Just(SessionIntent::ResetView),
            Just(SessionIntent::NewSession),
            any::<bool>().prop_map(SessionIntent::SetOverlayVisible),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_any_intent_sequence_stays_balanced(
            steps in prop::collection::vec((intent(), 0u64..3000), 1..30),
            seed in any::<u64>(),
        ) {
            let mut sim = SessionSimulator::new(SimulatorConfig::seeded(seed)).unwrap();
            for (intent, wait_ms) in steps {
                let _ = sim.intent(intent);
                sim.run_for(Duration::from_millis(wait_ms));

                // The handle exists exactly while results are shown
                let live = sim.ledger().live().len();
                prop_assert_eq!(live, usize::from(sim.stage() == SessionStage::Results));
            }

            sim.teardown();
            prop_assert!(sim.ledger().is_balanced());

            let closed_at = sim.clock();
            sim.run_for(Duration::from_secs(3));
            prop_assert_eq!(sim.events_after(closed_at).count(), 0);
        }
    }
}
