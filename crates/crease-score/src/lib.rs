//! CREASE Score - Results panel data
//!
//! Pure data: no timers, no side effects. The summary shape is the contract
//! a real analysis engine would fill; this version ships a mock source.

pub mod status;
pub mod grade;
pub mod summary;
pub mod source;

pub use status::*;
pub use grade::*;
pub use summary::*;
pub use source::*;
