//! Async session runtime
//!
//! One tokio task owns one `SessionController`. Every intent and every
//! tick is serialized through a single `select!` loop, so the controller
//! never sees concurrent access and needs no locking of its own.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crease_core::{CreaseError, CreaseResult, MediaFile};

use crate::{RuntimeConfig, SessionController, SessionEvent, SessionIntent, SessionView};

struct Command {
    intent: SessionIntent,
    reply: Option<oneshot::Sender<CreaseResult<()>>>,
}

/// Cloneable handle to a running session
#[derive(Clone)]
pub struct RuntimeHandle {
    commands: mpsc::Sender<Command>,
    view: Arc<RwLock<SessionView>>,
}

impl RuntimeHandle {
    /// Send an intent and wait for the controller's verdict
    pub async fn send(&self, intent: SessionIntent) -> CreaseResult<()> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command {
                intent,
                reply: Some(tx),
            })
            .await
            .map_err(|_| CreaseError::RuntimeClosed)?;
        rx.await.map_err(|_| CreaseError::RuntimeClosed)?
    }

    /// Queue an intent without waiting for the outcome
    pub fn try_post(&self, intent: SessionIntent) -> CreaseResult<()> {
        self.commands
            .try_send(Command { intent, reply: None })
            .map_err(|_| CreaseError::RuntimeClosed)
    }

    pub async fn shutdown(&self) -> CreaseResult<()> {
        self.send(SessionIntent::Shutdown).await
    }

    /// Latest published snapshot
    pub fn view(&self) -> SessionView {
        self.view.read().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

/// Tokio driver for a session controller
pub struct SessionRuntime {
    controller: SessionController,
    config: RuntimeConfig,
    commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedSender<SessionEvent>,
    view: Arc<RwLock<SessionView>>,
}

impl SessionRuntime {
    /// Wire up a runtime without starting it
    pub fn new(
        controller: SessionController,
        config: RuntimeConfig,
    ) -> (Self, RuntimeHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let (command_tx, command_rx) = mpsc::channel(config.intent_capacity.max(1));
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let view = Arc::new(RwLock::new(SessionView::capture(&controller)));

        let runtime = SessionRuntime {
            controller,
            config,
            commands: command_rx,
            events: event_tx,
            view: view.clone(),
        };
        let handle = RuntimeHandle {
            commands: command_tx,
            view,
        };
        (runtime, handle, event_rx)
    }

    /// Start the loop on the current tokio runtime
    pub fn spawn(
        controller: SessionController,
        config: RuntimeConfig,
    ) -> (RuntimeHandle, mpsc::UnboundedReceiver<SessionEvent>, JoinHandle<()>) {
        let (runtime, handle, events) = Self::new(controller, config);
        let task = tokio::spawn(runtime.run());
        (handle, events, task)
    }

    /// Run until a shutdown intent arrives or every handle is dropped
    pub async fn run(mut self) {
        let mut ticker = time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = Instant::now();
        let mut shutdown_reply = None;

        tracing::info!(
            session = %self.controller.id().report_id(),
            tick_ms = self.config.tick_interval.as_millis() as u64,
            "session runtime started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = Instant::now();
                    self.controller.advance(now - last);
                    last = now;
                    self.publish();
                }

                command = self.commands.recv() => {
                    let Some(command) = command else {
                        tracing::debug!("all handles dropped");
                        break;
                    };
                    if let SessionIntent::Shutdown = command.intent {
                        shutdown_reply = command.reply;
                        break;
                    }

                    let name = command.intent.name();
                    let result = self.controller.apply(command.intent);
                    if let Err(e) = &result {
                        tracing::debug!(intent = name, error = %e, "intent refused");
                    }
                    self.publish();
                    if let Some(reply) = command.reply {
                        let _ = reply.send(result);
                    }
                }
            }
        }

        self.controller.teardown();
        self.publish();
        self.commands.close();
        tracing::info!(session = %self.controller.id().report_id(), "session runtime stopped");

        if let Some(reply) = shutdown_reply {
            let _ = reply.send(Ok(()));
        }
    }

    fn publish(&mut self) {
        for event in self.controller.drain_events() {
            // A dropped receiver only means nobody is listening
            let _ = self.events.send(event);
        }
        *self.view.write() = SessionView::capture(&self.controller);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::{CreaseConfig, PhaseView, SessionStage};

    fn swing() -> MediaFile {
        MediaFile::declared("swing.mp4", "video/mp4", 20 * 1024 * 1024)
    }

    fn spawn() -> (RuntimeHandle, mpsc::UnboundedReceiver<SessionEvent>, JoinHandle<()>) {
        let config = CreaseConfig::deterministic(11);
        let runtime = config.runtime.clone();
        SessionRuntime::spawn(SessionController::new(config).unwrap(), runtime)
    }

    fn drain(events: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut out = Vec::new();
        while let Ok(event) = events.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_to_results() {
        let (handle, mut events, task) = spawn();
        assert_eq!(handle.view().stage, SessionStage::Empty.name());

        handle.send(SessionIntent::Select(vec![swing()])).await.unwrap();
        handle.send(SessionIntent::Start).await.unwrap();
        assert_eq!(handle.view().stage, SessionStage::InProgress.name());

        time::sleep(Duration::from_millis(3000)).await;

        let view = handle.view();
        let results = view.results().expect("results after upload");
        assert_eq!(results.file.name, "swing.mp4");
        assert_eq!(results.hud.status, "TRACKING");

        let progress: Vec<u8> = drain(&mut events)
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::UploadProgress { percent, .. } => Some(percent),
                _ => None,
            })
            .collect();
        let expected: Vec<u8> = (0..=100).step_by(5).collect();
        assert_eq!(progress, expected);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
        assert_eq!(handle.view().phase, PhaseView::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refused_intent_reported() {
        let (handle, _events, task) = spawn();
        let err = handle.send(SessionIntent::TogglePlay).await.unwrap_err();
        assert!(matches!(err, CreaseError::InvalidTransition { .. }));

        let err = handle
            .send(SessionIntent::Select(vec![MediaFile::declared("x.pdf", "application/pdf", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, CreaseError::Rejected(_)));
        assert_eq!(
            handle.view().last_error.as_deref(),
            Some("Rejected: unsupported type")
        );

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_after_shutdown() {
        let (handle, mut events, task) = spawn();
        handle.send(SessionIntent::Select(vec![swing()])).await.unwrap();
        handle.send(SessionIntent::Start).await.unwrap();
        time::sleep(Duration::from_millis(2600)).await;

        handle.shutdown().await.unwrap();
        task.await.unwrap();

        assert!(handle.is_closed());
        assert_eq!(
            handle.send(SessionIntent::NewSession).await,
            Err(CreaseError::RuntimeClosed)
        );
        assert!(handle.try_post(SessionIntent::TogglePlay).is_err());

        let tail = drain(&mut events);
        assert!(tail
            .iter()
            .any(|e| matches!(e, SessionEvent::MediaReleased { .. })));
        assert!(matches!(tail.last(), Some(SessionEvent::TornDown)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handles_stops_loop() {
        let (handle, _events, task) = spawn();
        drop(handle);
        task.await.unwrap();
    }
}
