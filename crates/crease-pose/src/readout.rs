//! Live angle readouts and the tracking HUD

use crate::{joint_angle, KeypointLabel, OverlayCadence, Point2, Skeleton};

/// Which three keypoints an angle readout is taken from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AngleReadoutSpec {
    pub name: String,
    pub proximal: KeypointLabel,
    pub joint: KeypointLabel,
    pub distal: KeypointLabel,
}

impl AngleReadoutSpec {
    pub fn new(
        name: impl Into<String>,
        proximal: KeypointLabel,
        joint: KeypointLabel,
        distal: KeypointLabel,
    ) -> Self {
        Self {
            name: name.into(),
            proximal,
            joint,
            distal,
        }
    }

    /// Lead elbow: shoulder, elbow, hand
    pub fn elbow() -> Self {
        Self::new(
            "ELBOW",
            KeypointLabel::RightShoulder,
            KeypointLabel::RightElbow,
            KeypointLabel::RightHand,
        )
    }

    /// Front knee: hips, knee, ankle
    pub fn knee() -> Self {
        Self::new(
            "KNEE",
            KeypointLabel::Hips,
            KeypointLabel::RightKnee,
            KeypointLabel::RightAnkle,
        )
    }

    /// Evaluate against a keypoint set
    pub fn measure(&self, skeleton: &Skeleton) -> AngleReadout {
        AngleReadout {
            name: self.name.clone(),
            degrees: joint_angle(
                skeleton.get(self.proximal),
                skeleton.get(self.joint),
                skeleton.get(self.distal),
            ),
            anchor: skeleton.get(self.joint),
        }
    }
}

/// Readouts shown by default
pub fn default_readouts() -> Vec<AngleReadoutSpec> {
    vec![AngleReadoutSpec::elbow(), AngleReadoutSpec::knee()]
}

/// A measured angle, pinned to its joint on the overlay
#[derive(Debug, Clone, PartialEq)]
pub struct AngleReadout {
    pub name: String,
    pub degrees: f32,
    pub anchor: Point2,
}

impl AngleReadout {
    /// Text as drawn next to the joint, e.g. `ELBOW: 142°`
    pub fn label(&self) -> String {
        format!("{}: {:.0}°", self.name, self.degrees)
    }
}

/// Measure every readout
pub fn measure_all(specs: &[AngleReadoutSpec], skeleton: &Skeleton) -> Vec<AngleReadout> {
    specs.iter().map(|spec| spec.measure(skeleton)).collect()
}

/// HUD tracking status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingStatus {
    Tracking,
    Paused,
    Idle,
}

impl TrackingStatus {
    pub fn label(self) -> &'static str {
        match self {
            TrackingStatus::Tracking => "TRACKING",
            TrackingStatus::Paused => "PAUSED",
            TrackingStatus::Idle => "IDLE",
        }
    }
}

/// Heads-up panel drawn in the overlay corner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayHud {
    pub status: TrackingStatus,
    pub target: &'static str,
    pub engine: &'static str,
}

impl OverlayHud {
    pub const TARGET: &'static str = "CRICKET_BATTER";
    pub const ENGINE: &'static str = "POSE_V3_ALPHA";

    /// HUD reflecting a cadence: tracking while it ticks, paused while a
    /// pose is shown but frozen, idle when hidden
    pub fn for_cadence(cadence: &OverlayCadence) -> Self {
        let status = match (cadence.is_running(), cadence.skeleton().is_some()) {
            (true, _) => TrackingStatus::Tracking,
            (false, true) => TrackingStatus::Paused,
            (false, false) => TrackingStatus::Idle,
        };
        OverlayHud {
            status,
            target: Self::TARGET,
            engine: Self::ENGINE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CadenceConfig;
    use std::time::Duration;

    #[test]
    fn test_default_readouts_on_seed() {
        let seed = Skeleton::seed();
        let readouts = measure_all(&default_readouts(), &seed);
        assert_eq!(readouts.len(), 2);

        let elbow = &readouts[0];
        assert_eq!(elbow.anchor, seed.get(KeypointLabel::RightElbow));
        assert_eq!(elbow.label(), "ELBOW: 173°");

        let knee = &readouts[1];
        assert!(knee.degrees > 0.0 && knee.degrees <= 180.0);
    }

    #[test]
    fn test_readout_follows_drift() {
        let mut cadence = OverlayCadence::new(CadenceConfig::seeded(3));
        cadence.start();
        let before = AngleReadoutSpec::elbow().measure(&Skeleton::seed());
        cadence.advance(Duration::from_millis(1000));
        let after = AngleReadoutSpec::elbow().measure(cadence.skeleton().unwrap());
        assert_ne!(before.anchor, after.anchor);
    }

    #[test]
    fn test_hud_status() {
        let mut cadence = OverlayCadence::new(CadenceConfig::seeded(3));
        assert_eq!(OverlayHud::for_cadence(&cadence).status, TrackingStatus::Idle);
        cadence.start();
        assert_eq!(OverlayHud::for_cadence(&cadence).status, TrackingStatus::Tracking);
        cadence.stop();
        assert_eq!(OverlayHud::for_cadence(&cadence).status, TrackingStatus::Paused);
        cadence.hide();
        assert_eq!(OverlayHud::for_cadence(&cadence).status, TrackingStatus::Idle);
    }
}
