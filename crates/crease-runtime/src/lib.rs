//! CREASE Runtime - Session workflow and its async driver
//!
//! The `SessionController` is the single owner of every lifecycle in a
//! session: upload intake, media resource, playback, overlay cadence and
//! score summary. It is synchronous and tick-driven. `SessionRuntime`
//! wraps one controller in a tokio task.

pub mod config;
pub mod controller;
pub mod view;
pub mod telemetry;
pub mod runtime;

pub use config::*;
pub use controller::*;
pub use view::*;
pub use telemetry::*;
pub use runtime::*;
