//! Stroke mechanics timeline
//!
//! A fixed set of phase markers laid over the clip plus a scrubber that
//! sweeps left to right on a fixed period, wrapping at the end. The
//! scrubber only moves while the session advances it, which the controller
//! does only while playback runs.

use std::time::Duration;

use crease_core::{CreaseError, CreaseResult};

/// Phase of the batting stroke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrokePhase {
    Stance,
    Backlift,
    Impact,
}

impl StrokePhase {
    pub fn label(self) -> &'static str {
        match self {
            StrokePhase::Stance => "STANCE",
            StrokePhase::Backlift => "BACKLIFT",
            StrokePhase::Impact => "IMPACT",
        }
    }
}

/// A phase marker at a fraction of the timeline (0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeMarker {
    pub phase: StrokePhase,
    pub at: f32,
}

impl StrokeMarker {
    pub const fn new(phase: StrokePhase, at: f32) -> Self {
        Self { phase, at }
    }
}

/// Timeline configuration
#[derive(Clone, Debug)]
pub struct TimelineConfig {
    /// Time for the scrubber to cross the whole timeline
    pub sweep_period: Duration,
    /// Markers, in ascending position
    pub markers: Vec<StrokeMarker>,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        TimelineConfig {
            sweep_period: Duration::from_secs(5),
            markers: vec![
                StrokeMarker::new(StrokePhase::Stance, 0.20),
                StrokeMarker::new(StrokePhase::Backlift, 0.45),
                StrokeMarker::new(StrokePhase::Impact, 0.75),
            ],
        }
    }
}

impl TimelineConfig {
    pub fn validate(&self) -> CreaseResult<()> {
        if self.sweep_period.is_zero() {
            return Err(CreaseError::InvalidConfig(
                "timeline sweep period must be non-zero".into(),
            ));
        }
        if self.markers.iter().any(|m| !(0.0..=1.0).contains(&m.at)) {
            return Err(CreaseError::InvalidConfig(
                "timeline markers must lie within 0.0..=1.0".into(),
            ));
        }
        if self.markers.windows(2).any(|w| w[0].at > w[1].at) {
            return Err(CreaseError::InvalidConfig(
                "timeline markers must be in ascending order".into(),
            ));
        }
        Ok(())
    }
}

/// Timeline with its scrubber
#[derive(Debug, Clone)]
pub struct Timeline {
    config: TimelineConfig,
    /// Elapsed time within the current sweep
    elapsed: Duration,
    /// Completed sweeps
    sweeps: u64,
}

impl Timeline {
    pub fn new(config: TimelineConfig) -> Self {
        Timeline {
            config,
            elapsed: Duration::ZERO,
            sweeps: 0,
        }
    }

    pub fn markers(&self) -> &[StrokeMarker] {
        &self.config.markers
    }

    /// Move the scrubber forward, wrapping at the end of the sweep
    pub fn advance(&mut self, dt: Duration) {
        let period = self.config.sweep_period.as_nanos();
        if period == 0 {
            return;
        }
        let elapsed = self.elapsed.saturating_add(dt).as_nanos();
        let sweeps = u64::try_from(elapsed / period).unwrap_or(u64::MAX);
        self.sweeps = self.sweeps.saturating_add(sweeps);
        self.elapsed = Duration::from_nanos(u64::try_from(elapsed % period).unwrap_or(u64::MAX));
    }

    /// Scrubber position as a fraction of the timeline, in [0, 1)
    pub fn position(&self) -> f32 {
        if self.config.sweep_period.is_zero() {
            return 0.0;
        }
        (self.elapsed.as_secs_f64() / self.config.sweep_period.as_secs_f64()) as f32
    }

    /// Last marker at or before the scrubber
    pub fn current_marker(&self) -> Option<StrokePhase> {
        let pos = self.position();
        self.config
            .markers
            .iter()
            .take_while(|m| m.at <= pos)
            .last()
            .map(|m| m.phase)
    }

    pub fn sweeps(&self) -> u64 {
        self.sweeps
    }

    /// Return the scrubber to the start
    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        self.sweeps = 0;
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(TimelineConfig::default())
    }
}
