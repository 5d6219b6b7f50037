//! Error and progress bookkeeping for all tiled layers.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::ReentrantMutex;

use crate::log::{default_logger, Logger};
use crate::{log_debug, log_warn};

use super::listener::ActivityListener;
use super::model::{TasksProgressInfo, TiledLayerError};

#[derive(Default)]
struct State {
    errors: BTreeMap<String, TiledLayerError>,
    progress: Vec<TasksProgressInfo>,
    global_max: usize,
    total_progress: f32,
    listeners: Vec<Arc<dyn ActivityListener>>,
}

impl State {
    fn error_snapshot(&self) -> Vec<TiledLayerError> {
        self.errors.values().cloned().collect()
    }
}

/// Collects load errors (latest per URL) and outstanding task counts per
/// layer, and fans changes out to registered listeners.
///
/// Listeners run synchronously on the calling thread while the aggregator's
/// re-entrant lock is held, so every listener sees the state produced by the
/// call that triggered it. The internal state is not borrowed while callbacks
/// run; a listener may read from or write to the aggregator on the same
/// thread.
///
/// # Example
///
/// ```
/// use tilescape::activity::{ActivityAggregator, LoaderStatus, TiledLayerError};
///
/// let activity = ActivityAggregator::new();
/// activity.add_error(TiledLayerError::new(LoaderStatus::ErrorTimeout, "osm", "https://x/1/0/0.png"));
/// activity.add_error(TiledLayerError::new(LoaderStatus::Error404, "osm", "https://x/1/0/0.png"));
///
/// let errors = activity.errors();
/// assert_eq!(errors.len(), 1);
/// assert_eq!(errors[0].status, LoaderStatus::Error404);
/// ```
pub struct ActivityAggregator {
    state: ReentrantMutex<RefCell<State>>,
    logger: Arc<dyn Logger>,
}

impl Default for ActivityAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ActivityAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.state.lock();
        let state = guard.borrow();
        f.debug_struct("ActivityAggregator")
            .field("errors", &state.errors.len())
            .field("layers", &state.progress.len())
            .field("global_max", &state.global_max)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

impl ActivityAggregator {
    pub fn new() -> Self {
        Self::with_logger(default_logger())
    }

    pub fn with_logger(logger: Arc<dyn Logger>) -> Self {
        Self {
            state: ReentrantMutex::new(RefCell::new(State {
                total_progress: 1.0,
                ..State::default()
            })),
            logger,
        }
    }

    /// Record `error`, replacing any earlier error for the same URL, and
    /// notify listeners.
    pub fn add_error(&self, error: TiledLayerError) {
        let guard = self.state.lock();
        log_warn!(self.logger, "tile error {}", error);
        guard.borrow_mut().errors.insert(error.url.clone(), error);
        self.notify_errors(&guard);
    }

    /// Remove the error recorded for `url`. Returns whether one was removed;
    /// listeners are notified only in that case.
    pub fn remove_error(&self, url: &str) -> bool {
        let guard = self.state.lock();
        let removed = guard.borrow_mut().errors.remove(url).is_some();
        if removed {
            log_debug!(self.logger, "cleared tile error for {}", url);
            self.notify_errors(&guard);
        }
        removed
    }

    /// Remove every error reported by `layer_name`. Returns how many were
    /// removed.
    pub fn remove_all_errors_for_layer(&self, layer_name: &str) -> usize {
        let guard = self.state.lock();
        let removed = {
            let mut state = guard.borrow_mut();
            let before = state.errors.len();
            state.errors.retain(|_, error| error.layer_name != layer_name);
            before - state.errors.len()
        };
        if removed > 0 {
            log_debug!(self.logger, "cleared {} tile errors of layer {}", removed, layer_name);
            self.notify_errors(&guard);
        }
        removed
    }

    /// Remove all errors. Returns how many were removed.
    pub fn clear_all_errors(&self) -> usize {
        let guard = self.state.lock();
        let removed = {
            let mut state = guard.borrow_mut();
            let removed = state.errors.len();
            state.errors.clear();
            removed
        };
        if removed > 0 {
            self.notify_errors(&guard);
        }
        removed
    }

    /// Set the number of outstanding tasks of `layer_name`, recompute the
    /// combined progress and notify progress listeners.
    ///
    /// A layer reporting 0 is complete (`progress == 1.0`) and its maximum is
    /// reset. Otherwise its maximum is the highest count seen since then and
    /// `progress = (max - count) / max`.
    ///
    /// The combined progress is `(global_max - total_remaining) / global_max`,
    /// where `global_max` is a running maximum of the summed per-layer maxima.
    /// It never shrinks; only [`reset`](Self::reset) clears it.
    pub fn update_remaining_tasks(&self, layer_name: &str, count: usize) {
        let guard = self.state.lock();
        let (listeners, total, layers) = {
            let mut state = guard.borrow_mut();
            let state = &mut *state;
            match state.progress.iter_mut().find(|info| info.layer_name == layer_name) {
                Some(info) => {
                    info.remaining_count = count;
                    if count == 0 {
                        info.max_count = 0;
                        info.progress = 1.0;
                    } else {
                        info.max_count = info.max_count.max(count);
                        info.progress = (info.max_count - count) as f32 / info.max_count as f32;
                    }
                }
                None => state.progress.push(TasksProgressInfo {
                    layer_name: layer_name.to_string(),
                    max_count: count,
                    remaining_count: count,
                    progress: if count == 0 { 1.0 } else { 0.0 },
                }),
            }

            let total_remaining: usize = state.progress.iter().map(|info| info.remaining_count).sum();
            let total_max: usize = state.progress.iter().map(|info| info.max_count).sum();
            state.global_max = state.global_max.max(total_max);
            state.total_progress = if state.global_max == 0 {
                1.0
            } else {
                (state.global_max - total_remaining) as f32 / state.global_max as f32
            };
            (state.listeners.clone(), state.total_progress, state.progress.clone())
        };

        for listener in &listeners {
            listener.on_progress_changed(total, &layers);
        }
        drop(guard);
    }

    pub fn add_listener(&self, listener: Arc<dyn ActivityListener>) {
        let guard = self.state.lock();
        guard.borrow_mut().listeners.push(listener);
    }

    /// Unregister `listener` (compared by pointer). Returns whether it was
    /// registered.
    pub fn remove_listener(&self, listener: &Arc<dyn ActivityListener>) -> bool {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        let before = state.listeners.len();
        let target = Arc::as_ptr(listener) as *const ();
        state.listeners.retain(|l| Arc::as_ptr(l) as *const () != target);
        state.listeners.len() != before
    }

    /// Current errors ordered by URL.
    pub fn errors(&self) -> Vec<TiledLayerError> {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.error_snapshot()
    }

    pub fn error_for_url(&self, url: &str) -> Option<TiledLayerError> {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.errors.get(url).cloned()
    }

    /// Per-layer progress in the order layers first reported.
    pub fn progress(&self) -> Vec<TasksProgressInfo> {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.progress.clone()
    }

    pub fn layer_progress(&self, layer_name: &str) -> Option<TasksProgressInfo> {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.progress.iter().find(|info| info.layer_name == layer_name).cloned()
    }

    /// Combined progress as last computed; 1.0 when idle.
    pub fn total_progress(&self) -> f32 {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.total_progress
    }

    pub fn global_max(&self) -> usize {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.global_max
    }

    /// Forget all errors and progress. Error listeners are told if errors
    /// were present; progress listeners receive `1.0` with an empty
    /// breakdown if any layer was tracked.
    pub fn reset(&self) {
        let guard = self.state.lock();
        let (had_errors, had_progress, listeners) = {
            let mut state = guard.borrow_mut();
            let had_errors = !state.errors.is_empty();
            let had_progress = !state.progress.is_empty();
            state.errors.clear();
            state.progress.clear();
            state.global_max = 0;
            state.total_progress = 1.0;
            (had_errors, had_progress, state.listeners.clone())
        };
        for listener in &listeners {
            if had_errors {
                listener.on_error_state_changed(&[]);
            }
            if had_progress {
                listener.on_progress_changed(1.0, &[]);
            }
        }
        drop(guard);
    }

    fn notify_errors(&self, state: &RefCell<State>) {
        let (listeners, errors) = {
            let state = state.borrow();
            (state.listeners.clone(), state.error_snapshot())
        };
        for listener in &listeners {
            listener.on_error_state_changed(&errors);
        }
    }
}
