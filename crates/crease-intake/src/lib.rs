//! CREASE Intake - From a dropped file to a completed upload
//!
//! This crate implements the upload intake:
//! - Type / size validation with first-accepted-wins selection
//! - Upload tickets with monotone progress
//! - The fixed-step synthetic progress driver
//! - The intake component tying them together

pub mod validate;
pub mod ticket;
pub mod progress;
pub mod intake;

pub use validate::*;
pub use ticket::*;
pub use progress::*;
pub use intake::*;
