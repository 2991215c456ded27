//! CREASE Media - Ownership of the user's video and everything bound to it
//!
//! This crate implements:
//! - Playback URL allocation behind a platform seam
//! - The media manager with its create/revoke ledger
//! - The playback surface the URL is attached to
//! - The stroke-mechanics timeline and its scrubber

pub mod allocator;
pub mod manager;
pub mod surface;
pub mod timeline;

pub use allocator::*;
pub use manager::*;
pub use surface::*;
pub use timeline::*;
