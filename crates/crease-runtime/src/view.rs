//! Serializable snapshot of a session for the display surface

use serde::{Deserialize, Serialize};

use crease_core::MediaFile;
use crease_pose::{measure_all, OverlayHud, Skeleton, SKELETON_EDGES};
use crease_score::ScoreSummary;

use crate::{ResultsStage, SessionController, SessionState};

/// Everything a display needs to draw the current session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    /// Report id, e.g. `AI-BAT-1A2B3C4D`
    pub session: String,
    pub stage: String,
    pub last_error: Option<String>,
    pub overlay_visible: bool,
    #[serde(flatten)]
    pub phase: PhaseView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PhaseView {
    Upload(UploadView),
    Results(ResultsView),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadView {
    pub file: Option<FileView>,
    pub progress: u8,
    pub accepted_extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileView {
    pub name: String,
    pub media_type: String,
    /// Size as shown, e.g. `20.00 MB`
    pub size: String,
}

impl From<&MediaFile> for FileView {
    fn from(file: &MediaFile) -> Self {
        FileView {
            name: file.name.clone(),
            media_type: file.media_type.clone(),
            size: file.display_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsView {
    pub file: FileView,
    pub media_url: String,
    pub playing: bool,
    pub looping: bool,
    pub muted: bool,
    pub frame: u64,
    pub overlay: Option<OverlayView>,
    pub hud: HudView,
    pub timeline: TimelineView,
    pub scores: ScoresView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeypointView {
    pub label: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadoutView {
    pub name: String,
    pub degrees: f32,
    pub text: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayView {
    pub keypoints: Vec<KeypointView>,
    /// Segment endpoints by keypoint label
    pub segments: Vec<(String, String)>,
    pub readouts: Vec<ReadoutView>,
    pub ticks: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudView {
    pub status: String,
    pub target: String,
    pub engine: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerView {
    pub label: String,
    pub at: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineView {
    pub position: f32,
    pub current: Option<String>,
    pub markers: Vec<MarkerView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreView {
    pub label: String,
    pub score: u8,
    pub status: String,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionView {
    pub title: String,
    pub description: String,
    pub priority: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoresView {
    pub entries: Vec<ScoreView>,
    pub corrections: Vec<CorrectionView>,
    pub headline: String,
    pub efficiency: u8,
    pub grade: String,
}

impl From<&ScoreSummary> for ScoresView {
    fn from(summary: &ScoreSummary) -> Self {
        ScoresView {
            entries: summary
                .entries
                .iter()
                .map(|e| ScoreView {
                    label: e.label.clone(),
                    score: e.score,
                    status: e.status.label().to_string(),
                    feedback: e.feedback.clone(),
                })
                .collect(),
            corrections: summary
                .corrections_by_priority()
                .into_iter()
                .map(|c| CorrectionView {
                    title: c.title.clone(),
                    description: c.description.clone(),
                    priority: c.priority.label().to_string(),
                })
                .collect(),
            headline: summary.headline.clone(),
            efficiency: summary.efficiency.percent,
            grade: summary.efficiency.grade.clone(),
        }
    }
}

impl SessionView {
    /// Snapshot the controller
    pub fn capture(controller: &SessionController) -> Self {
        let phase = match controller.state() {
            SessionState::Upload(intake) => PhaseView::Upload(UploadView {
                file: intake.ticket().map(|t| FileView::from(t.file())),
                progress: intake.ticket().map_or(0, |t| t.progress()),
                accepted_extensions: intake.config().accepted_extensions.clone(),
            }),
            SessionState::Results(results) => {
                PhaseView::Results(results_view(results, controller))
            }
            SessionState::Closed => PhaseView::Closed,
        };

        SessionView {
            session: controller.id().report_id(),
            stage: controller.stage().name().to_string(),
            last_error: controller.last_error().map(|e| e.to_string()),
            overlay_visible: controller.overlay_visible(),
            phase,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn results(&self) -> Option<&ResultsView> {
        match &self.phase {
            PhaseView::Results(results) => Some(results),
            _ => None,
        }
    }
}

fn overlay_view(skeleton: &Skeleton, ticks: u64, controller: &SessionController) -> OverlayView {
    OverlayView {
        keypoints: skeleton
            .keypoints()
            .map(|k| KeypointView {
                label: k.label.name().to_string(),
                x: k.position.x,
                y: k.position.y,
            })
            .collect(),
        segments: SKELETON_EDGES
            .iter()
            .map(|(a, b)| (a.name().to_string(), b.name().to_string()))
            .collect(),
        readouts: measure_all(&controller.config().readouts, skeleton)
            .into_iter()
            .map(|r| ReadoutView {
                text: r.label(),
                name: r.name,
                degrees: r.degrees,
                x: r.anchor.x,
                y: r.anchor.y,
            })
            .collect(),
        ticks,
    }
}

fn results_view(results: &ResultsStage, controller: &SessionController) -> ResultsView {
    let surface = results.surface();
    let cadence = results.cadence();
    let timeline = results.timeline();
    let hud = OverlayHud::for_cadence(cadence);

    ResultsView {
        file: FileView::from(results.file()),
        media_url: results.url().to_string(),
        playing: surface.is_playing(),
        looping: surface.config().looping,
        muted: surface.config().muted,
        frame: surface.frame_index(),
        overlay: cadence
            .skeleton()
            .map(|s| overlay_view(s, cadence.ticks(), controller)),
        hud: HudView {
            status: hud.status.label().to_string(),
            target: hud.target.to_string(),
            engine: hud.engine.to_string(),
        },
        timeline: TimelineView {
            position: timeline.position(),
            current: timeline.current_marker().map(|p| p.label().to_string()),
            markers: timeline
                .markers()
                .iter()
                .map(|m| MarkerView {
                    label: m.phase.label().to_string(),
                    at: m.at,
                })
                .collect(),
        },
        scores: ScoresView::from(results.summary()),
    }
}
