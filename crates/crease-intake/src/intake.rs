//! Upload intake component
//!
//! Holds at most one ticket and at most one progress driver.
//! INVARIANT: a driver exists iff the ticket is `InProgress`.

use std::time::Duration;

use crease_core::{CreaseError, CreaseResult, MediaFile, Rejection, TicketId};

use crate::{IntakeConfig, ProgressConfig, ProgressDriver, ProgressEvent, TicketStatus, UploadTicket};

/// Where the intake is in its own small lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeStage {
    Empty,
    Selected,
    InProgress,
}

impl IntakeStage {
    pub fn name(self) -> &'static str {
        match self {
            IntakeStage::Empty => "empty",
            IntakeStage::Selected => "selected",
            IntakeStage::InProgress => "in progress",
        }
    }
}

/// Observable intake changes
#[derive(Debug, Clone)]
pub enum IntakeEvent {
    /// Progress moved
    Progress { ticket: TicketId, percent: u8 },
    /// The driver finished; the ticket leaves the intake. `overrun` is the
    /// part of the advance that fell after completion.
    Completed { ticket: UploadTicket, overrun: Duration },
}

/// Upload intake
pub struct UploadIntake {
    config: IntakeConfig,
    progress: ProgressConfig,
    ticket: Option<UploadTicket>,
    driver: Option<ProgressDriver>,
    last_ticket: TicketId,
}

impl UploadIntake {
    pub fn new(config: IntakeConfig, progress: ProgressConfig) -> Self {
        UploadIntake {
            config,
            progress,
            ticket: None,
            driver: None,
            last_ticket: TicketId::default(),
        }
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    pub fn stage(&self) -> IntakeStage {
        match (&self.ticket, &self.driver) {
            (None, _) => IntakeStage::Empty,
            (Some(_), None) => IntakeStage::Selected,
            (Some(_), Some(_)) => IntakeStage::InProgress,
        }
    }

    pub fn ticket(&self) -> Option<&UploadTicket> {
        self.ticket.as_ref()
    }

    /// Check a single file without changing state
    pub fn validate(&self, file: &MediaFile) -> Result<(), Rejection> {
        self.config.validate(file)
    }

    /// Take a submission. The first accepted file becomes the ticket,
    /// replacing any selected one; on rejection nothing changes.
    pub fn select(&mut self, files: Vec<MediaFile>) -> CreaseResult<&UploadTicket> {
        if self.driver.is_some() {
            return Err(CreaseError::InvalidTransition {
                intent: "select",
                stage: IntakeStage::InProgress.name(),
            });
        }

        let file = self.config.pick(files)?;
        self.last_ticket = self.last_ticket.next();
        tracing::debug!(ticket = %self.last_ticket, file = %file.name, size = file.size, "file selected");
        Ok(self.ticket.insert(UploadTicket::new(self.last_ticket, file)))
    }

    /// Start the progress driver. Returns `false` when one is already running.
    pub fn begin_progress(&mut self) -> CreaseResult<bool> {
        if self.driver.is_some() {
            return Ok(false);
        }
        let Some(ticket) = self.ticket.as_mut() else {
            return Err(CreaseError::InvalidTransition {
                intent: "start",
                stage: IntakeStage::Empty.name(),
            });
        };

        ticket.reset();
        ticket.set_status(TicketStatus::InProgress);
        self.driver = Some(ProgressDriver::start(self.progress.clone()));
        tracing::debug!(ticket = %ticket.id(), "progress started");
        Ok(true)
    }

    /// Stop the driver and return the ticket to `Selected` at 0%
    pub fn cancel(&mut self) {
        if self.driver.take().is_some() {
            if let Some(ticket) = self.ticket.as_mut() {
                ticket.reset();
                tracing::debug!(ticket = %ticket.id(), "progress cancelled");
            }
        }
    }

    /// Drop the selected file. The driver is stopped before the ticket goes.
    pub fn remove(&mut self) -> Option<UploadTicket> {
        self.cancel();
        let ticket = self.ticket.take();
        if let Some(t) = &ticket {
            tracing::debug!(ticket = %t.id(), "file removed");
        }
        ticket
    }

    /// Put a completed ticket back as freshly selected (hand-off failed)
    pub fn reinstate(&mut self, mut ticket: UploadTicket) {
        self.driver = None;
        ticket.reset();
        self.ticket = Some(ticket);
    }

    /// Let `dt` elapse on the running driver
    pub fn advance(&mut self, dt: Duration) -> Vec<IntakeEvent> {
        let Some(driver) = self.driver.as_mut() else {
            return Vec::new();
        };
        let progress = driver.advance(dt);

        let mut events = Vec::with_capacity(progress.len());
        for event in progress {
            match event {
                ProgressEvent::Progress(percent) => {
                    if let Some(ticket) = self.ticket.as_mut() {
                        ticket.record_progress(percent);
                        events.push(IntakeEvent::Progress {
                            ticket: ticket.id(),
                            percent: ticket.progress(),
                        });
                    }
                }
                ProgressEvent::Completed => {
                    let overrun = driver.overrun();
                    self.driver = None;
                    if let Some(mut ticket) = self.ticket.take() {
                        ticket.set_status(TicketStatus::Complete);
                        tracing::debug!(ticket = %ticket.id(), "upload complete");
                        events.push(IntakeEvent::Completed { ticket, overrun });
                    }
                    break;
                }
            }
        }
        events
    }
}

impl Default for UploadIntake {
    fn default() -> Self {
        Self::new(IntakeConfig::default(), ProgressConfig::default())
    }
}
