//! Upload tickets

use crease_core::{MediaFile, TicketId};

/// Ticket lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketStatus {
    Selected,
    InProgress,
    Complete,
}

/// Progress of one upload in flight
#[derive(Debug, Clone)]
pub struct UploadTicket {
    id: TicketId,
    file: MediaFile,
    progress: u8,
    status: TicketStatus,
}

impl UploadTicket {
    pub fn new(id: TicketId, file: MediaFile) -> Self {
        UploadTicket {
            id,
            file,
            progress: 0,
            status: TicketStatus::Selected,
        }
    }

    pub fn id(&self) -> TicketId {
        self.id
    }

    pub fn file(&self) -> &MediaFile {
        &self.file
    }

    pub fn into_file(self) -> MediaFile {
        self.file
    }

    /// Percent complete, 0 - 100
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn status(&self) -> TicketStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: TicketStatus) {
        self.status = status;
    }

    /// Record a progress value. Never moves backwards while active.
    pub(crate) fn record_progress(&mut self, percent: u8) {
        self.progress = self.progress.max(percent.min(100));
    }

    /// Back to a freshly selected ticket
    pub(crate) fn reset(&mut self) {
        self.progress = 0;
        self.status = TicketStatus::Selected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_monotone() {
        let mut ticket = UploadTicket::new(
            TicketId::new(1),
            MediaFile::declared("swing.mp4", "video/mp4", 1),
        );
        ticket.record_progress(40);
        ticket.record_progress(10);
        assert_eq!(ticket.progress(), 40);
        ticket.record_progress(250);
        assert_eq!(ticket.progress(), 100);

        ticket.reset();
        assert_eq!(ticket.progress(), 0);
        assert_eq!(ticket.status(), TicketStatus::Selected);
    }
}
