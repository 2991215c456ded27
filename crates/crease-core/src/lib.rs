//! CREASE Core - Fundamental types shared by every session component
//!
//! This crate defines:
//! - Identifiers (SessionId, TicketId, MediaId)
//! - The user-supplied media file value
//! - The error taxonomy for intake, media and workflow failures

pub mod id;
pub mod file;
pub mod error;

pub use id::*;
pub use file::*;
pub use error::*;
