//! Observer traits for aggregator changes.

use super::model::{TasksProgressInfo, TiledLayerError};

/// Notified with the full error set whenever it changes.
pub trait ErrorStateListener {
    fn on_error_state_changed(&self, _errors: &[TiledLayerError]) {}
}

/// Notified on every outstanding-task update with the combined progress and
/// the per-layer breakdown.
pub trait ProgressListener {
    fn on_progress_changed(&self, _progress: f32, _layers: &[TasksProgressInfo]) {}
}

/// What the aggregator stores. Implemented for every type that implements
/// both listener traits; override only the callbacks you need.
pub trait ActivityListener: ErrorStateListener + ProgressListener + Send + Sync {}

impl<T> ActivityListener for T where T: ErrorStateListener + ProgressListener + Send + Sync {}
