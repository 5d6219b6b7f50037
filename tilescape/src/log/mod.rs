//! Diagnostics context.
//!
//! Components that report diagnostics take an `Arc<dyn Logger>` when they
//! are built. Nothing in the crate logs through hidden global state; pick
//! [`TracingLogger`] for production, [`NoOpLogger`] for silence, or
//! [`MemoryLogger`] to inspect messages.
//!
//! The `log_trace!` .. `log_error!` macros wrap `format_args!` so call sites
//! read like the `tracing` macros.

mod logger;
mod sinks;

pub use logger::{LogLevel, Logger};
pub use sinks::{MemoryLogger, NoOpLogger, TracingLogger};

use std::sync::Arc;

/// Logger used when a component is built without one.
pub fn default_logger() -> Arc<dyn Logger> {
    Arc::new(TracingLogger)
}
