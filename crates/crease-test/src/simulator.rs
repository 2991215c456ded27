//! Session Simulator - Deterministic, clock-stepped session driver
//!
//! Drives one `SessionController` with a fixed tick and records every
//! event with the simulated time it was observed at.

use std::time::Duration;

use crease_core::{CreaseResult, MediaFile};
use crease_media::MediaManager;
use crease_runtime::{
    CreaseConfig, SessionController, SessionEvent, SessionIntent, SessionStage, SessionView,
};
use crease_score::MockScoreSource;

use crate::{Ledger, RecordingAllocator};

/// Simulator configuration
#[derive(Clone, Debug)]
pub struct SimulatorConfig {
    pub session: CreaseConfig,
    /// Simulated time per step
    pub tick: Duration,
    /// Number of initial URL allocations that fail
    pub refused_allocations: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::seeded(1)
    }
}

impl SimulatorConfig {
    pub fn seeded(seed: u64) -> Self {
        SimulatorConfig {
            session: CreaseConfig::deterministic(seed),
            tick: Duration::from_millis(10),
            refused_allocations: 0,
        }
    }

    pub fn with_refused_allocations(mut self, n: usize) -> Self {
        self.refused_allocations = n;
        self
    }
}

/// An event and the simulated time it surfaced at
#[derive(Debug, Clone)]
pub struct TimedEvent {
    pub at: Duration,
    pub event: SessionEvent,
}

/// Deterministic session driver
pub struct SessionSimulator {
    controller: SessionController,
    ledger: Ledger,
    tick: Duration,
    clock: Duration,
    log: Vec<TimedEvent>,
}

impl SessionSimulator {
    pub fn new(config: SimulatorConfig) -> CreaseResult<Self> {
        let ledger = Ledger::new();
        let allocator =
            RecordingAllocator::new(ledger.clone()).refusing_first(config.refused_allocations);
        let controller = SessionController::with_parts(
            config.session,
            MediaManager::with_allocator(Box::new(allocator)),
            Box::new(MockScoreSource),
        )?;

        Ok(SessionSimulator {
            controller,
            ledger,
            tick: config.tick.max(Duration::from_millis(1)),
            clock: Duration::ZERO,
            log: Vec::new(),
        })
    }

    /// Apply an intent at the current simulated time
    pub fn intent(&mut self, intent: SessionIntent) -> CreaseResult<()> {
        let result = self.controller.apply(intent);
        self.collect();
        result
    }

    /// Shorthand for selecting one file
    pub fn select(&mut self, file: MediaFile) -> CreaseResult<()> {
        self.intent(SessionIntent::Select(vec![file]))
    }

    /// Step the clock forward by `duration` in ticks
    pub fn run_for(&mut self, duration: Duration) {
        let mut remaining = duration;
        while !remaining.is_zero() {
            let dt = remaining.min(self.tick);
            self.step(dt);
            remaining -= dt;
        }
    }

    /// Step until `done` holds or `limit` elapses. Returns whether it held.
    pub fn run_until<F>(&mut self, limit: Duration, done: F) -> bool
    where
        F: Fn(&SessionController) -> bool,
    {
        let deadline = self.clock + limit;
        while !done(&self.controller) {
            if self.clock >= deadline {
                return false;
            }
            self.step(self.tick);
        }
        true
    }

    fn step(&mut self, dt: Duration) {
        self.clock += dt;
        self.controller.advance(dt);
        self.collect();
    }

    fn collect(&mut self) {
        let at = self.clock;
        self.log.extend(
            self.controller
                .drain_events()
                .into_iter()
                .map(|event| TimedEvent { at, event }),
        );
    }

    pub fn teardown(&mut self) {
        self.controller.teardown();
        self.collect();
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn stage(&self) -> SessionStage {
        self.controller.stage()
    }

    pub fn view(&self) -> SessionView {
        SessionView::capture(&self.controller)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.log
    }

    /// Events observed strictly after `at`
    pub fn events_after(&self, at: Duration) -> impl Iterator<Item = &TimedEvent> + '_ {
        self.log.iter().filter(move |e| e.at > at)
    }

    pub fn count<F>(&self, f: F) -> usize
    where
        F: Fn(&SessionEvent) -> bool,
    {
        self.log.iter().filter(|e| f(&e.event)).count()
    }

    /// Every reported upload percentage, in order
    pub fn progress_trace(&self) -> Vec<u8> {
        self.log
            .iter()
            .filter_map(|e| match e.event {
                SessionEvent::UploadProgress { percent, .. } => Some(percent),
                _ => None,
            })
            .collect()
    }

    /// Time at which the first event matching `f` surfaced
    pub fn first_at<F>(&self, f: F) -> Option<Duration>
    where
        F: Fn(&SessionEvent) -> bool,
    {
        self.log.iter().find(|e| f(&e.event)).map(|e| e.at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swing() -> MediaFile {
        MediaFile::declared("swing.mp4", "video/mp4", 20 * 1024 * 1024)
    }

    #[test]
    fn test_clock_steps() {
        let mut sim = SessionSimulator::new(SimulatorConfig::default()).unwrap();
        sim.run_for(Duration::from_millis(25));
        assert_eq!(sim.clock(), Duration::from_millis(25));
        assert!(sim.events().is_empty());
    }

    #[test]
    fn test_events_are_timestamped() {
        let mut sim = SessionSimulator::new(SimulatorConfig::default()).unwrap();
        sim.select(swing()).unwrap();
        sim.intent(SessionIntent::Start).unwrap();
        sim.run_for(Duration::from_millis(250));

        let five = sim.first_at(|e| matches!(e, SessionEvent::UploadProgress { percent: 5, .. }));
        let ten = sim.first_at(|e| matches!(e, SessionEvent::UploadProgress { percent: 10, .. }));
        assert_eq!(five, Some(Duration::from_millis(100)));
        assert_eq!(ten, Some(Duration::from_millis(200)));
        assert_eq!(sim.progress_trace(), vec![0, 5, 10]);
    }

    #[test]
    fn test_run_until() {
        let mut sim = SessionSimulator::new(SimulatorConfig::default()).unwrap();
        sim.select(swing()).unwrap();
        sim.intent(SessionIntent::Start).unwrap();

        let reached = sim.run_until(Duration::from_secs(5), |c| c.stage() == SessionStage::Results);
        assert!(reached);
        assert_eq!(sim.clock(), Duration::from_millis(2500));

        let mut idle = SessionSimulator::new(SimulatorConfig::default()).unwrap();
        assert!(!idle.run_until(Duration::from_millis(100), |c| c.stage() == SessionStage::Results));
    }
}
