//! Network and error activity aggregation.
//!
//! Tile sources report failed requests and their outstanding task counts to
//! an [`ActivityAggregator`]; status views subscribe with an
//! [`ActivityListener`] to show errors and combined loading progress.

mod aggregator;
mod listener;
mod model;

pub use aggregator::ActivityAggregator;
pub use listener::{ActivityListener, ErrorStateListener, ProgressListener};
pub use model::{LoaderStatus, TasksProgressInfo, TiledLayerError};
