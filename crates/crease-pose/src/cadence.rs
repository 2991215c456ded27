//! Overlay drift cadence
//!
//! An owned, explicitly started and stopped timer that nudges every
//! keypoint on a fixed period. Time only enters through `advance`; once
//! `stop` or `hide` returns, nothing in here changes again until `start`.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crease_core::{CreaseError, CreaseResult};

use crate::{Skeleton, PLANE_MAX, PLANE_MIN};

/// Most ticks replayed by one `advance`. Longer gaps are skipped, not caught up.
pub const MAX_CATCH_UP_TICKS: u32 = 10;

/// Cadence configuration
#[derive(Clone, Debug)]
pub struct CadenceConfig {
    /// Tick period
    pub period: Duration,
    /// Per-axis perturbation bound, in plane units
    pub jitter: f32,
    /// Seed for the perturbation source (`None` draws from entropy)
    pub seed: Option<u64>,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        CadenceConfig {
            period: Duration::from_millis(100),
            jitter: 0.25,
            seed: None,
        }
    }
}

impl CadenceConfig {
    /// Deterministic configuration for tests and replays
    pub fn seeded(seed: u64) -> Self {
        CadenceConfig {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> CreaseResult<()> {
        if self.period.is_zero() {
            return Err(CreaseError::InvalidConfig(
                "overlay period must be non-zero".into(),
            ));
        }
        let max_jitter = PLANE_MAX - PLANE_MIN;
        if !self.jitter.is_finite() || !(0.0..=max_jitter).contains(&self.jitter) {
            return Err(CreaseError::InvalidConfig(format!(
                "overlay jitter must be within 0..={}, got {}",
                max_jitter, self.jitter
            )));
        }
        Ok(())
    }
}

/// One tick's worth of overlay
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayFrame {
    /// Tick sequence number, starting at 1 for each shown overlay
    pub seq: u64,
    pub skeleton: Skeleton,
}

/// Keypoint drift cadence
pub struct OverlayCadence {
    config: CadenceConfig,
    rng: StdRng,
    /// Current keypoints; `None` while the overlay is hidden
    skeleton: Option<Skeleton>,
    running: bool,
    pending: Duration,
    seq: u64,
}

impl OverlayCadence {
    pub fn new(config: CadenceConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    /// Cadence drawing from a caller-supplied random source
    pub fn with_rng(config: CadenceConfig, rng: StdRng) -> Self {
        OverlayCadence {
            config,
            rng,
            skeleton: None,
            running: false,
            pending: Duration::ZERO,
            seq: 0,
        }
    }

    pub fn config(&self) -> &CadenceConfig {
        &self.config
    }

    /// Begin ticking. Shows the seed pose if the overlay was hidden.
    /// Returns `false` if already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.show();
        self.running = true;
        self.pending = Duration::ZERO;
        tracing::trace!(period_ms = self.config.period.as_millis() as u64, "overlay cadence started");
        true
    }

    /// Show the seed pose without ticking. No-op if already shown.
    pub fn show(&mut self) {
        if self.skeleton.is_none() {
            self.skeleton = Some(Skeleton::seed());
            self.seq = 0;
        }
    }

    /// Halt ticking; keypoints stay where they are
    pub fn stop(&mut self) {
        if self.running {
            tracing::trace!(ticks = self.seq, "overlay cadence stopped");
        }
        self.running = false;
        self.pending = Duration::ZERO;
    }

    /// Halt ticking and discard the keypoints
    pub fn hide(&mut self) {
        self.stop();
        self.skeleton = None;
        self.seq = 0;
    }

    /// Put the keypoints back into the seed pose
    pub fn reseed(&mut self) {
        if self.skeleton.is_some() {
            self.skeleton = Some(Skeleton::seed());
        }
        self.pending = Duration::ZERO;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn skeleton(&self) -> Option<&Skeleton> {
        self.skeleton.as_ref()
    }

    /// Ticks since the overlay was shown
    pub fn ticks(&self) -> u64 {
        self.seq
    }

    /// Let `dt` elapse. Returns one frame per tick that fell within `dt`,
    /// at most `MAX_CATCH_UP_TICKS` of them.
    pub fn advance(&mut self, dt: Duration) -> Vec<OverlayFrame> {
        let mut frames = Vec::new();
        let period = self.config.period.as_nanos();
        if !self.running || period == 0 {
            return frames;
        }
        let Some(skeleton) = self.skeleton.as_mut() else {
            return frames;
        };

        let pending = self.pending.saturating_add(dt).as_nanos();
        let due = (pending / period).min(u128::from(MAX_CATCH_UP_TICKS));
        self.pending = Duration::from_nanos(u64::try_from(pending % period).unwrap_or(u64::MAX));
        if pending / period > due {
            tracing::debug!(skipped = (pending / period - due) as u64, "overlay ticks skipped");
        }

        for _ in 0..due {
            skeleton.perturb(&mut self.rng, self.config.jitter);
            self.seq += 1;
            frames.push(OverlayFrame {
                seq: self.seq,
                skeleton: skeleton.clone(),
            });
        }
        frames
    }
}
