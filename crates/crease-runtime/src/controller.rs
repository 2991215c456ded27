//! Session workflow controller
//!
//! State machine: `Upload { Empty | Selected | InProgress }` then `Results`.
//! The `Results` state owns the media handle, the playback surface, the
//! overlay cadence, the scrubber and the score summary, so leaving it is
//! the only way to release them and nothing outlives it.

use std::collections::VecDeque;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crease_core::{CreaseError, CreaseResult, MediaFile, MediaId, Rejection, SessionId, TicketId};
use crease_intake::{IntakeEvent, IntakeStage, UploadIntake, UploadTicket};
use crease_media::{MediaHandle, MediaManager, MediaStats, PlaybackSurface, PlaybackUrl, Timeline};
use crease_pose::{OverlayCadence, OverlayFrame};
use crease_score::{MockScoreSource, ScoreSource, ScoreSummary};

use crate::CreaseConfig;

/// Flattened session stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStage {
    Empty,
    Selected,
    InProgress,
    Results,
    Closed,
}

impl SessionStage {
    pub fn name(self) -> &'static str {
        match self {
            SessionStage::Empty => IntakeStage::Empty.name(),
            SessionStage::Selected => IntakeStage::Selected.name(),
            SessionStage::InProgress => IntakeStage::InProgress.name(),
            SessionStage::Results => "showing results",
            SessionStage::Closed => "closed",
        }
    }

    pub fn is_upload(self) -> bool {
        matches!(
            self,
            SessionStage::Empty | SessionStage::Selected | SessionStage::InProgress
        )
    }
}

fn invalid(intent: &'static str, stage: SessionStage) -> CreaseError {
    CreaseError::InvalidTransition {
        intent,
        stage: stage.name(),
    }
}

/// Observable session changes, in the order they happened
#[derive(Debug, Clone)]
pub enum SessionEvent {
    FileSelected { ticket: TicketId, name: String, size: u64 },
    SelectionRejected(Rejection),
    FileRemoved { ticket: TicketId },
    UploadStarted { ticket: TicketId },
    UploadProgress { ticket: TicketId, percent: u8 },
    UploadComplete { ticket: TicketId },
    ResultsReady { media: MediaId, url: PlaybackUrl },
    /// Hand-off failed; the session is back in `Selected`
    MediaFailed(CreaseError),
    MediaReleased { media: MediaId, url: PlaybackUrl },
    OverlayFrame(OverlayFrame),
    PlaybackToggled { playing: bool },
    ViewReset,
    OverlayVisibility { visible: bool },
    SessionReset { session: SessionId },
    TornDown,
}

/// User intents, as sent by a display surface
#[derive(Debug, Clone)]
pub enum SessionIntent {
    Select(Vec<MediaFile>),
    Remove,
    Start,
    TogglePlay,
    ResetView,
    NewSession,
    SetOverlayVisible(bool),
    /// Tear the session down and stop the loop
    Shutdown,
}

impl SessionIntent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionIntent::Select(_) => "select",
            SessionIntent::Remove => "remove",
            SessionIntent::Start => "start",
            SessionIntent::TogglePlay => "toggle-play",
            SessionIntent::ResetView => "reset-view",
            SessionIntent::NewSession => "new-session",
            SessionIntent::SetOverlayVisible(_) => "set-overlay-visible",
            SessionIntent::Shutdown => "shutdown",
        }
    }
}

/// Everything alive while results are shown
pub struct ResultsStage {
    file: MediaFile,
    handle: MediaHandle,
    surface: PlaybackSurface,
    cadence: OverlayCadence,
    timeline: Timeline,
    summary: ScoreSummary,
}

impl ResultsStage {
    pub fn file(&self) -> &MediaFile {
        &self.file
    }

    pub fn media_id(&self) -> MediaId {
        self.handle.id()
    }

    pub fn url(&self) -> &PlaybackUrl {
        self.handle.url()
    }

    pub fn surface(&self) -> &PlaybackSurface {
        &self.surface
    }

    pub fn cadence(&self) -> &OverlayCadence {
        &self.cadence
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn summary(&self) -> &ScoreSummary {
        &self.summary
    }
}

/// Session state; each variant owns exactly the resources valid in it
pub enum SessionState {
    Upload(UploadIntake),
    Results(ResultsStage),
    Closed,
}

/// Session workflow controller
pub struct SessionController {
    config: CreaseConfig,
    id: SessionId,
    rng: StdRng,
    media: MediaManager,
    scores: Box<dyn ScoreSource>,
    state: SessionState,
    overlay_visible: bool,
    events: VecDeque<SessionEvent>,
    last_error: Option<CreaseError>,
}

impl SessionController {
    /// Controller with the blob allocator and the mock score source
    pub fn new(config: CreaseConfig) -> CreaseResult<Self> {
        Self::with_parts(config, MediaManager::new(), Box::new(MockScoreSource))
    }

    pub fn with_parts(
        config: CreaseConfig,
        media: MediaManager,
        scores: Box<dyn ScoreSource>,
    ) -> CreaseResult<Self> {
        config.validate()?;

        let mut rng = match config.runtime.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let id = SessionId::random(&mut rng);
        let intake = UploadIntake::new(config.intake.clone(), config.progress.clone());
        tracing::info!(session = %id.report_id(), "session opened");

        Ok(SessionController {
            overlay_visible: config.overlay_visible,
            config,
            id,
            rng,
            media,
            scores,
            state: SessionState::Upload(intake),
            events: VecDeque::new(),
            last_error: None,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> &CreaseConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn stage(&self) -> SessionStage {
        match &self.state {
            SessionState::Upload(intake) => match intake.stage() {
                IntakeStage::Empty => SessionStage::Empty,
                IntakeStage::Selected => SessionStage::Selected,
                IntakeStage::InProgress => SessionStage::InProgress,
            },
            SessionState::Results(_) => SessionStage::Results,
            SessionState::Closed => SessionStage::Closed,
        }
    }

    pub fn intake(&self) -> Option<&UploadIntake> {
        match &self.state {
            SessionState::Upload(intake) => Some(intake),
            _ => None,
        }
    }

    pub fn results(&self) -> Option<&ResultsStage> {
        match &self.state {
            SessionState::Results(results) => Some(results),
            _ => None,
        }
    }

    /// Error of the most recent failed attempt, cleared by the next success
    pub fn last_error(&self) -> Option<&CreaseError> {
        self.last_error.as_ref()
    }

    pub fn overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    pub fn media_stats(&self) -> &MediaStats {
        self.media.stats()
    }

    /// Take every queued event
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    /// Dispatch an intent to the matching operation
    pub fn apply(&mut self, intent: SessionIntent) -> CreaseResult<()> {
        match intent {
            SessionIntent::Select(files) => self.select(files).map(drop),
            SessionIntent::Remove => self.remove(),
            SessionIntent::Start => self.start().map(drop),
            SessionIntent::TogglePlay => self.toggle_play().map(drop),
            SessionIntent::ResetView => self.reset_view(),
            SessionIntent::NewSession => self.new_session(),
            SessionIntent::SetOverlayVisible(visible) => self.set_overlay_visible(visible),
            SessionIntent::Shutdown => {
                self.teardown();
                Ok(())
            }
        }
    }

    // ========================================================================
    // Upload intents
    // ========================================================================

    /// Submit files. The first accepted one becomes the selection.
    pub fn select(&mut self, files: Vec<MediaFile>) -> CreaseResult<TicketId> {
        let stage = self.stage();
        let SessionState::Upload(intake) = &mut self.state else {
            return Err(invalid("select", stage));
        };

        match intake.select(files) {
            Ok(ticket) => {
                let (id, name, size) = (ticket.id(), ticket.file().name.clone(), ticket.file().size);
                self.last_error = None;
                self.events.push_back(SessionEvent::FileSelected { ticket: id, name, size });
                Ok(id)
            }
            Err(CreaseError::Rejected(reason)) => {
                tracing::info!(session = %self.id, %reason, "submission rejected");
                self.events.push_back(SessionEvent::SelectionRejected(reason.clone()));
                let err = CreaseError::Rejected(reason);
                self.last_error = Some(err.clone());
                Err(err)
            }
            Err(e) => Err(e),
        }
    }

    /// Clear the selection, stopping a running upload first
    pub fn remove(&mut self) -> CreaseResult<()> {
        let stage = self.stage();
        match &mut self.state {
            SessionState::Upload(intake) if stage != SessionStage::Empty => {
                if let Some(ticket) = intake.remove() {
                    self.events.push_back(SessionEvent::FileRemoved { ticket: ticket.id() });
                }
                self.last_error = None;
                Ok(())
            }
            _ => Err(invalid("remove", stage)),
        }
    }

    /// Start the upload. Returns `false` if it was already running.
    pub fn start(&mut self) -> CreaseResult<bool> {
        let stage = self.stage();
        let SessionState::Upload(intake) = &mut self.state else {
            return Err(invalid("start", stage));
        };

        let started = intake.begin_progress()?;
        if started {
            if let Some(ticket) = intake.ticket().map(UploadTicket::id) {
                self.events.push_back(SessionEvent::UploadStarted { ticket });
                self.events.push_back(SessionEvent::UploadProgress { ticket, percent: 0 });
            }
            self.last_error = None;
        }
        Ok(started)
    }

    // ========================================================================
    // Results intents
    // ========================================================================

    /// Pause or resume playback; overlay and scrubber follow
    pub fn toggle_play(&mut self) -> CreaseResult<bool> {
        let stage = self.stage();
        let visible = self.overlay_visible;
        let SessionState::Results(results) = &mut self.state else {
            return Err(invalid("toggle playback", stage));
        };

        let playing = results.surface.toggle_play();
        if playing {
            if visible {
                results.cadence.start();
            }
        } else {
            results.cadence.stop();
        }
        self.events.push_back(SessionEvent::PlaybackToggled { playing });
        Ok(playing)
    }

    /// Rewind playback and scrubber, put the overlay back in the seed pose
    pub fn reset_view(&mut self) -> CreaseResult<()> {
        let stage = self.stage();
        let SessionState::Results(results) = &mut self.state else {
            return Err(invalid("reset the view", stage));
        };

        results.surface.rewind();
        results.timeline.reset();
        results.cadence.reseed();
        self.events.push_back(SessionEvent::ViewReset);
        Ok(())
    }

    /// Show or hide the keypoint overlay. Remembered across sessions.
    pub fn set_overlay_visible(&mut self, visible: bool) -> CreaseResult<()> {
        let stage = self.stage();
        if stage == SessionStage::Closed {
            return Err(invalid("change the overlay", stage));
        }
        if self.overlay_visible == visible {
            return Ok(());
        }

        self.overlay_visible = visible;
        if let SessionState::Results(results) = &mut self.state {
            if visible {
                results.cadence.show();
                if results.surface.is_playing() {
                    results.cadence.start();
                }
            } else {
                results.cadence.hide();
            }
        }
        self.events.push_back(SessionEvent::OverlayVisibility { visible });
        Ok(())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Discard everything and return to an empty upload
    pub fn new_session(&mut self) -> CreaseResult<()> {
        let stage = self.stage();
        if stage == SessionStage::Closed {
            return Err(invalid("start a new session", stage));
        }

        let fresh = SessionState::Upload(self.fresh_intake());
        match std::mem::replace(&mut self.state, fresh) {
            SessionState::Upload(mut intake) => {
                intake.remove();
            }
            SessionState::Results(results) => self.close_results(results),
            SessionState::Closed => {}
        }

        let previous = self.id;
        self.id = SessionId::random(&mut self.rng);
        self.last_error = None;
        self.events.push_back(SessionEvent::SessionReset { session: self.id });
        tracing::info!(
            previous = %previous.report_id(),
            session = %self.id.report_id(),
            "new session"
        );
        Ok(())
    }

    /// Release everything; every later intent is rejected. Idempotent.
    pub fn teardown(&mut self) {
        match std::mem::replace(&mut self.state, SessionState::Closed) {
            SessionState::Closed => return,
            SessionState::Upload(mut intake) => {
                intake.remove();
            }
            SessionState::Results(results) => self.close_results(results),
        }

        self.events.push_back(SessionEvent::TornDown);
        let stats = self.media.stats();
        tracing::info!(
            session = %self.id.report_id(),
            created = stats.created,
            revoked = stats.revoked,
            "session torn down"
        );
    }

    /// Let `dt` elapse on whichever timers the current state owns
    pub fn advance(&mut self, dt: Duration) {
        let intake_events = match &mut self.state {
            SessionState::Upload(intake) => intake.advance(dt),
            SessionState::Results(results) => {
                Self::advance_results(results, dt, &mut self.events);
                return;
            }
            SessionState::Closed => return,
        };

        for event in intake_events {
            match event {
                IntakeEvent::Progress { ticket, percent } => {
                    self.events.push_back(SessionEvent::UploadProgress { ticket, percent });
                }
                IntakeEvent::Completed { ticket, overrun } => {
                    self.events.push_back(SessionEvent::UploadComplete { ticket: ticket.id() });
                    self.enter_results(ticket);
                    // The rest of this step belongs to the results timers
                    if let SessionState::Results(results) = &mut self.state {
                        Self::advance_results(results, overrun, &mut self.events);
                    }
                }
            }
        }
    }

    fn advance_results(results: &mut ResultsStage, dt: Duration, events: &mut VecDeque<SessionEvent>) {
        results.surface.advance(dt);
        if results.surface.is_playing() {
            results.timeline.advance(dt);
        }
        for frame in results.cadence.advance(dt) {
            events.push_back(SessionEvent::OverlayFrame(frame));
        }
    }

    fn enter_results(&mut self, ticket: UploadTicket) {
        let handle = match self.media.acquire(ticket.file()) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "hand-off failed, back to selection");
                if let SessionState::Upload(intake) = &mut self.state {
                    intake.reinstate(ticket);
                }
                self.events.push_back(SessionEvent::MediaFailed(e.clone()));
                self.last_error = Some(e);
                return;
            }
        };

        let mut surface = PlaybackSurface::new(self.config.playback.clone());
        surface.attach(handle.url().clone());

        let mut cadence = self.new_cadence();
        if self.overlay_visible {
            if surface.is_playing() {
                cadence.start();
            } else {
                cadence.show();
            }
        }

        let summary = self.scores.summary(&self.config.scoring);
        let (media, url) = (handle.id(), handle.url().clone());
        tracing::info!(
            session = %self.id.report_id(),
            %media,
            file = %ticket.file().name,
            efficiency = summary.efficiency.percent,
            "results ready"
        );

        self.state = SessionState::Results(ResultsStage {
            file: ticket.into_file(),
            handle,
            surface,
            cadence,
            timeline: Timeline::new(self.config.timeline.clone()),
            summary,
        });
        self.last_error = None;
        self.events.push_back(SessionEvent::ResultsReady { media, url });
    }

    fn close_results(&mut self, results: ResultsStage) {
        let ResultsStage {
            handle,
            mut surface,
            mut cadence,
            ..
        } = results;

        cadence.hide();
        let (media, url) = (handle.id(), handle.url().clone());
        self.media.release(handle, &mut surface);
        if self.media.live_count() > 0 {
            tracing::warn!(live = self.media.live_count(), "stray media after release");
            self.media.release_all(&mut surface);
        }
        self.events.push_back(SessionEvent::MediaReleased { media, url });
    }

    fn fresh_intake(&self) -> UploadIntake {
        UploadIntake::new(self.config.intake.clone(), self.config.progress.clone())
    }

    fn new_cadence(&mut self) -> OverlayCadence {
        let config = self.config.cadence.clone();
        match config.seed {
            Some(_) => OverlayCadence::new(config),
            None => OverlayCadence::with_rng(config, StdRng::seed_from_u64(self.rng.gen())),
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crease_media::{BlobUrlAllocator, SourceWatch, UrlAllocator};
    use crease_pose::Skeleton;
    use parking_lot::Mutex;

    fn swing() -> MediaFile {
        MediaFile::declared("swing.mp4", "video/mp4", 20 * 1024 * 1024)
    }

    fn controller() -> SessionController {
        SessionController::new(CreaseConfig::deterministic(7)).unwrap()
    }

    fn into_results(c: &mut SessionController) {
        c.select(vec![swing()]).unwrap();
        c.start().unwrap();
        c.advance(Duration::from_millis(2500));
        assert_eq!(c.stage(), SessionStage::Results);
        c.drain_events();
    }

    fn progress_of(events: &[SessionEvent]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::UploadProgress { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect()
    }

    fn frames_in(events: &[SessionEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, SessionEvent::OverlayFrame(_)))
            .count()
    }

    /// Records allocator calls; once a surface watch is installed, notes
    /// any URL revoked while that surface still played it
    struct Recording {
        inner: BlobUrlAllocator,
        log: Arc<Mutex<Vec<String>>>,
        watch: Arc<Mutex<Option<SourceWatch>>>,
    }

    impl UrlAllocator for Recording {
        fn create(&mut self, file: &MediaFile) -> CreaseResult<PlaybackUrl> {
            let url = self.inner.create(file)?;
            self.log.lock().push(format!("create {}", url));
            Ok(url)
        }

        fn revoke(&mut self, url: &PlaybackUrl) {
            let bound = self.watch.lock().as_ref().map_or(false, |w| w.is_bound_to(url));
            self.inner.revoke(url);
            let suffix = if bound { " while bound" } else { "" };
            self.log.lock().push(format!("revoke {}{}", url, suffix));
        }
    }

    type Log = Arc<Mutex<Vec<String>>>;
    type WatchSlot = Arc<Mutex<Option<SourceWatch>>>;

    fn recorded() -> (SessionController, Log, WatchSlot) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let watch: WatchSlot = Arc::new(Mutex::new(None));
        let media = MediaManager::with_allocator(Box::new(Recording {
            inner: BlobUrlAllocator::new(),
            log: log.clone(),
            watch: watch.clone(),
        }));
        let c = SessionController::with_parts(
            CreaseConfig::deterministic(3),
            media,
            Box::new(MockScoreSource),
        )
        .unwrap();
        (c, log, watch)
    }

    fn watch_results(c: &SessionController, slot: &WatchSlot) {
        *slot.lock() = Some(c.results().unwrap().surface().watch());
    }

    #[test]
    fn test_happy_path() {
        let mut c = controller();
        assert_eq!(c.stage(), SessionStage::Empty);

        c.select(vec![swing()]).unwrap();
        assert_eq!(c.stage(), SessionStage::Selected);
        assert!(c.start().unwrap());
        assert_eq!(c.stage(), SessionStage::InProgress);

        c.advance(Duration::from_millis(2499));
        assert_eq!(c.stage(), SessionStage::InProgress);
        c.advance(Duration::from_millis(1));
        assert_eq!(c.stage(), SessionStage::Results);

        let events = c.drain_events();
        let expected: Vec<u8> = (0..=100).step_by(5).collect();
        assert_eq!(progress_of(&events), expected);
        let ready = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::ResultsReady { .. }))
            .count();
        assert_eq!(ready, 1);

        let results = c.results().unwrap();
        assert_eq!(results.file().name, "swing.mp4");
        assert!(results.surface().is_playing());
        assert!(results.cadence().is_running());
        assert_eq!(results.summary().efficiency.label(), "87% (A+)");
        assert_eq!(c.media_stats().created, 1);
    }

    #[test]
    fn test_completion_forwards_rest_of_step() {
        let mut c = controller();
        c.select(vec![swing()]).unwrap();
        c.start().unwrap();
        c.advance(Duration::from_millis(2800));
        assert_eq!(c.stage(), SessionStage::Results);

        assert_eq!(frames_in(&c.drain_events()), 3);
        let results = c.results().unwrap();
        assert_eq!(results.surface().position(), Duration::from_millis(300));
        assert_eq!(results.cadence().ticks(), 3);
    }

    #[test]
    fn test_rejected_file_leaves_empty() {
        let mut c = controller();
        let err = c
            .select(vec![MediaFile::declared("notes.pdf", "application/pdf", 1024)])
            .unwrap_err();
        assert!(matches!(err, CreaseError::Rejected(Rejection::UnsupportedType { .. })));
        assert_eq!(c.stage(), SessionStage::Empty);
        assert_eq!(c.last_error(), Some(&err));
        assert!(matches!(
            c.drain_events().as_slice(),
            [SessionEvent::SelectionRejected(_)]
        ));

        // A later success clears the inline error
        c.select(vec![swing()]).unwrap();
        assert!(c.last_error().is_none());
    }

    #[test]
    fn test_double_start_is_noop() {
        let mut c = controller();
        c.select(vec![swing()]).unwrap();
        assert!(c.start().unwrap());
        c.advance(Duration::from_millis(300));
        assert!(!c.start().unwrap());
        c.advance(Duration::from_millis(2200));

        let events = c.drain_events();
        let expected: Vec<u8> = (0..=100).step_by(5).collect();
        assert_eq!(progress_of(&events), expected);
        assert_eq!(c.stage(), SessionStage::Results);
    }

    #[test]
    fn test_remove_during_upload_is_silent() {
        let mut c = controller();
        c.select(vec![swing()]).unwrap();
        c.start().unwrap();
        c.advance(Duration::from_millis(2100));
        c.remove().unwrap();
        assert_eq!(c.stage(), SessionStage::Empty);
        c.drain_events();

        c.advance(Duration::from_secs(10));
        assert!(c.drain_events().is_empty());
        assert_eq!(c.stage(), SessionStage::Empty);
        assert_eq!(c.media_stats().created, 0);
    }

    #[test]
    fn test_new_session_releases_and_silences() {
        let mut c = controller();
        into_results(&mut c);
        let first = c.id();
        let url = c.results().unwrap().url().clone();

        c.new_session().unwrap();
        assert_eq!(c.stage(), SessionStage::Empty);
        assert_ne!(c.id(), first);
        assert!(c.media_stats().is_balanced());

        let events = c.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::MediaReleased { url: u, .. } if *u == url)));

        c.advance(Duration::from_secs(5));
        assert!(c.drain_events().is_empty());
    }

    #[test]
    fn test_toggle_play_pauses_overlay_and_scrubber() {
        let mut c = controller();
        into_results(&mut c);

        c.advance(Duration::from_millis(300));
        assert_eq!(frames_in(&c.drain_events()), 3);

        assert!(!c.toggle_play().unwrap());
        let scrubber = c.results().unwrap().timeline().position();
        let position = c.results().unwrap().surface().position();
        c.advance(Duration::from_secs(2));
        assert_eq!(frames_in(&c.drain_events()), 0);
        assert_eq!(c.results().unwrap().timeline().position(), scrubber);
        assert_eq!(c.results().unwrap().surface().position(), position);

        assert!(c.toggle_play().unwrap());
        c.advance(Duration::from_millis(200));
        assert_eq!(frames_in(&c.drain_events()), 2);
    }

    #[test]
    fn test_long_gap_yields_bounded_frames() {
        let mut c = controller();
        into_results(&mut c);

        c.advance(Duration::from_secs(3600));
        let frames = frames_in(&c.drain_events());
        assert_eq!(frames, crease_pose::MAX_CATCH_UP_TICKS as usize);

        c.advance(Duration::from_millis(100));
        assert_eq!(frames_in(&c.drain_events()), 1);
    }

    #[test]
    fn test_reset_view() {
        let mut c = controller();
        into_results(&mut c);
        c.advance(Duration::from_millis(1200));

        c.reset_view().unwrap();
        let results = c.results().unwrap();
        assert_eq!(results.surface().position(), Duration::ZERO);
        assert_eq!(results.timeline().position(), 0.0);
        assert_eq!(results.cadence().skeleton(), Some(&Skeleton::seed()));
    }

    #[test]
    fn test_overlay_visibility() {
        let mut c = controller();
        into_results(&mut c);

        c.set_overlay_visible(false).unwrap();
        assert!(c.results().unwrap().cadence().skeleton().is_none());
        c.advance(Duration::from_secs(1));
        assert_eq!(frames_in(&c.drain_events()), 0);

        c.set_overlay_visible(true).unwrap();
        assert_eq!(c.results().unwrap().cadence().skeleton(), Some(&Skeleton::seed()));
        assert!(c.results().unwrap().cadence().is_running());

        // Hidden preference carries into the next results view
        c.set_overlay_visible(false).unwrap();
        c.new_session().unwrap();
        into_results(&mut c);
        assert!(c.results().unwrap().cadence().skeleton().is_none());
    }

    #[test]
    fn test_invalid_transitions_change_nothing() {
        let mut c = controller();
        assert!(matches!(
            c.toggle_play(),
            Err(CreaseError::InvalidTransition { intent: "toggle playback", stage: "empty" })
        ));
        assert!(c.remove().is_err());
        assert!(c.start().is_err());
        assert_eq!(c.stage(), SessionStage::Empty);

        into_results(&mut c);
        assert!(c.select(vec![swing()]).is_err());
        assert!(c.start().is_err());
        assert!(c.remove().is_err());
        assert_eq!(c.stage(), SessionStage::Results);
        assert!(c.last_error().is_none());
    }

    #[test]
    fn test_media_failure_returns_to_selected() {
        let media = MediaManager::with_allocator(Box::new(BlobUrlAllocator::new().with_capacity(0)));
        let mut c = SessionController::with_parts(
            CreaseConfig::deterministic(1),
            media,
            Box::new(MockScoreSource),
        )
        .unwrap();

        c.select(vec![swing()]).unwrap();
        c.start().unwrap();
        c.advance(Duration::from_millis(2500));

        assert_eq!(c.stage(), SessionStage::Selected);
        assert!(matches!(c.last_error(), Some(CreaseError::MediaUnavailable(_))));
        assert_eq!(c.intake().unwrap().ticket().unwrap().progress(), 0);
        assert!(c
            .drain_events()
            .iter()
            .any(|e| matches!(e, SessionEvent::MediaFailed(_))));
    }

    #[test]
    fn test_teardown_closes_everything() {
        let mut c = controller();
        into_results(&mut c);

        c.teardown();
        assert_eq!(c.stage(), SessionStage::Closed);
        assert!(c.media_stats().is_balanced());
        assert!(matches!(
            c.drain_events().last(),
            Some(SessionEvent::TornDown)
        ));

        c.advance(Duration::from_secs(5));
        assert!(c.drain_events().is_empty());
        assert!(c.new_session().is_err());
        assert!(c.set_overlay_visible(false).is_err());

        c.teardown();
        assert!(c.drain_events().is_empty());
    }

    #[test]
    fn test_drop_revokes() {
        let (mut c, log, slot) = recorded();
        into_results(&mut c);
        watch_results(&c, &slot);
        drop(c);
        assert_eq!(
            *log.lock(),
            vec![
                "create blob:crease/1".to_string(),
                "revoke blob:crease/1".to_string()
            ]
        );
    }

    #[test]
    fn test_surface_detached_before_revoke() {
        let (mut c, log, slot) = recorded();
        into_results(&mut c);
        watch_results(&c, &slot);
        c.new_session().unwrap();

        into_results(&mut c);
        watch_results(&c, &slot);
        c.teardown();

        assert_eq!(
            *log.lock(),
            vec![
                "create blob:crease/1".to_string(),
                "revoke blob:crease/1".to_string(),
                "create blob:crease/2".to_string(),
                "revoke blob:crease/2".to_string(),
            ]
        );
    }

    #[test]
    fn test_seeded_sessions_agree() {
        let mut a = controller();
        let mut b = controller();
        assert_eq!(a.id(), b.id());
        into_results(&mut a);
        into_results(&mut b);
        a.advance(Duration::from_millis(800));
        b.advance(Duration::from_millis(800));
        assert_eq!(
            a.results().unwrap().cadence().skeleton(),
            b.results().unwrap().cadence().skeleton()
        );
    }

    #[test]
    fn test_shutdown_intent_tears_down() {
        let mut c = controller();
        into_results(&mut c);
        c.drain_events();

        c.apply(SessionIntent::Shutdown).unwrap();
        assert_eq!(c.stage(), SessionStage::Closed);
        let events = c.drain_events();
        assert!(matches!(events.last(), Some(SessionEvent::TornDown)));

        // Repeated shutdown is harmless
        c.apply(SessionIntent::Shutdown).unwrap();
        assert!(c.drain_events().is_empty());
    }
}
