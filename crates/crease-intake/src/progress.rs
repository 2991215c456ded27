//! Synthetic progress driver
//!
//! Stands in for a real upload/analysis pipeline: the percentage climbs by a
//! fixed step on a fixed interval, and once it reads 100 one more fixed
//! delay elapses before completion is reported. Time enters only through
//! `advance`, so the driver stops the instant its owner stops calling it or
//! drops it.

use std::time::Duration;

use crease_core::{CreaseError, CreaseResult};

/// Progress driver configuration
#[derive(Clone, Debug)]
pub struct ProgressConfig {
    /// Percent added per interval
    pub step: u8,
    /// Interval between steps
    pub interval: Duration,
    /// Pause between reaching 100 and completion
    pub completion_delay: Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        ProgressConfig {
            step: 5,
            interval: Duration::from_millis(100),
            completion_delay: Duration::from_millis(500),
        }
    }
}

impl ProgressConfig {
    /// Fast settings for demos
    pub fn quick() -> Self {
        ProgressConfig {
            step: 20,
            interval: Duration::from_millis(50),
            completion_delay: Duration::from_millis(100),
        }
    }

    pub fn validate(&self) -> CreaseResult<()> {
        if self.step == 0 || self.step > 100 {
            return Err(CreaseError::InvalidConfig(format!(
                "progress step must be within 1..=100, got {}",
                self.step
            )));
        }
        if self.interval.is_zero() {
            return Err(CreaseError::InvalidConfig(
                "progress interval must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Wall time from start to completion
    pub fn total_duration(&self) -> Duration {
        let steps = (100 + u32::from(self.step.max(1)) - 1) / u32::from(self.step.max(1));
        self.interval * steps + self.completion_delay
    }
}

/// What the driver reported during one advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Progress(u8),
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverPhase {
    Stepping,
    Settling,
    Finished,
}

/// Fixed-step progress driver
#[derive(Debug)]
pub struct ProgressDriver {
    config: ProgressConfig,
    percent: u8,
    phase: DriverPhase,
    /// Time accumulated towards the next step or the completion
    pending: Duration,
}

impl ProgressDriver {
    /// Start at 0%
    pub fn start(config: ProgressConfig) -> Self {
        ProgressDriver {
            config,
            percent: 0,
            phase: DriverPhase::Stepping,
            pending: Duration::ZERO,
        }
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn is_finished(&self) -> bool {
        self.phase == DriverPhase::Finished
    }

    /// Time that elapsed past completion; zero until finished
    pub fn overrun(&self) -> Duration {
        match self.phase {
            DriverPhase::Finished => self.pending,
            _ => Duration::ZERO,
        }
    }

    /// Let `dt` elapse. Every step that falls within `dt` is reported in
    /// order; `Completed` is reported once over the driver's lifetime.
    pub fn advance(&mut self, dt: Duration) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        self.pending = self.pending.saturating_add(dt);

        loop {
            match self.phase {
                DriverPhase::Stepping => {
                    if self.pending < self.config.interval {
                        break;
                    }
                    self.pending -= self.config.interval;
                    self.percent = self.percent.saturating_add(self.config.step.max(1)).min(100);
                    events.push(ProgressEvent::Progress(self.percent));
                    if self.percent == 100 {
                        self.phase = DriverPhase::Settling;
                    }
                }
                DriverPhase::Settling => {
                    if self.pending < self.config.completion_delay {
                        break;
                    }
                    self.pending -= self.config.completion_delay;
                    self.phase = DriverPhase::Finished;
                    events.push(ProgressEvent::Completed);
                }
                DriverPhase::Finished => break,
            }
        }

        events
    }
}
