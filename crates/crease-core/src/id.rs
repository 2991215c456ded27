//! Identity types for CREASE sessions
//!
//! All identifiers are 64-bit. Tickets and media handles are minted from
//! per-session counters, sessions from a random source.

use std::fmt;

use rand::Rng;

/// Session identity - one end-to-end upload/results interaction
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SessionId(pub u64);

impl SessionId {
    pub const ZERO: SessionId = SessionId(0);

    #[inline]
    pub fn new(id: u64) -> Self {
        SessionId(id)
    }

    /// Draw a fresh session id from the given random source
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        SessionId(rng.gen())
    }

    /// Human-facing analysis report identifier
    pub fn report_id(self) -> String {
        format!("AI-BAT-{:08X}", (self.0 >> 32) as u32 ^ self.0 as u32)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Session({:016x})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Upload ticket identity - one upload-in-flight
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct TicketId(pub u64);

impl TicketId {
    #[inline]
    pub fn new(id: u64) -> Self {
        TicketId(id)
    }

    #[inline]
    pub fn next(self) -> Self {
        TicketId(self.0.wrapping_add(1))
    }
}

impl fmt::Debug for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ticket({})", self.0)
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Media resource identity - one acquired playback URL
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct MediaId(pub u64);

impl MediaId {
    #[inline]
    pub fn new(id: u64) -> Self {
        MediaId(id)
    }
}

impl fmt::Debug for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Media({})", self.0)
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
