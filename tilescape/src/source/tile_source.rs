//! Per-layer tile loading state.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use parking_lot::Mutex;
use rayon::prelude::*;
use thiserror::Error;

use crate::activity::{ActivityAggregator, LoaderStatus, TiledLayerError};
use crate::cache::{EvictionCache, TileFingerprint};
use crate::coord::{ConversionHelper, CoordError, RectCoord};
use crate::log::{default_logger, Logger};
use crate::tiling::{draw_order, visible_tiles, LayerTilingConfig, PrioritizedTile, TileInfo};
use crate::{log_debug, log_error, log_trace};

use super::loader::{LoaderResult, TileLoader};
use super::retry::RetryState;

/// `(level, x, y, t)`.
pub type TileAddress = (i32, u32, u32, u32);

/// Cached payload of one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedTile {
    pub data: Bytes,
    pub etag: Option<String>,
}

/// The cache shared by tile sources; keys carry the layer name.
pub type TileCache = EvictionCache<TileFingerprint, CachedTile>;

/// A visible tile whose data is available.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTile {
    pub tile: TileInfo,
    pub data: Bytes,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Cannot express visible bounds in the layer system: {0}")]
    Coord(#[from] CoordError),
}

#[derive(Debug, Default)]
struct SourceState {
    visible: HashMap<TileAddress, TileInfo>,
    /// Tiles waiting for a first attempt, most urgent first.
    queue: Vec<PrioritizedTile>,
    loading: HashSet<TileAddress>,
    ready: BTreeMap<TileAddress, LoadedTile>,
    retry: HashMap<TileAddress, (TileInfo, RetryState)>,
    not_found: HashSet<TileAddress>,
    /// Queued ready tiles to be requested again with their cached etag.
    revalidating: HashSet<TileAddress>,
}

impl SourceState {
    fn outstanding(&self) -> usize {
        let loading_first_attempts = self.loading.iter().filter(|a| !self.retry.contains_key(*a)).count();
        self.queue.len() + loading_first_attempts + self.retry.len()
    }
}

/// What to tell the aggregator once the state lock is released.
enum Report {
    Cleared(String),
    Failed(TiledLayerError),
}

/// Keeps track of which tiles of one layer are visible, queued, loading,
/// failed or ready, and drives loads through a [`TileLoader`].
///
/// The source does not own a thread. Callers update the visible area with
/// [`on_visible_bounds_changed`](Self::on_visible_bounds_changed) and run
/// due loads with [`load_due`](Self::load_due) (or the parallel variant) from
/// a worker. Results are published through [`ready_tiles`](Self::ready_tiles).
///
/// Load outcomes:
///
/// - success: stored in the cache, previous error for the URL cleared
/// - success without a body (not modified): the cached copy is kept; with
///   nothing cached it counts as a recoverable failure
/// - 400/404: remembered as not found and never requested again
/// - timeout, network or other failure: retried with exponential backoff
///   (1 s doubling to 32 s) while the tile stays visible
///
/// Failures and outstanding counts are reported to the
/// [`ActivityAggregator`] when one is attached.
pub struct TileSource {
    config: Arc<LayerTilingConfig>,
    loader: Arc<dyn TileLoader>,
    cache: Arc<TileCache>,
    conversion: Arc<ConversionHelper>,
    activity: Option<Arc<ActivityAggregator>>,
    logger: Arc<dyn Logger>,
    state: Mutex<SourceState>,
    paused: AtomicBool,
    generation: AtomicU64,
}

impl fmt::Debug for TileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileSource")
            .field("layer", &self.config.layer_name())
            .field("paused", &self.is_paused())
            .field("generation", &self.generation())
            .finish()
    }
}

impl TileSource {
    pub fn new(config: Arc<LayerTilingConfig>, loader: Arc<dyn TileLoader>, cache: Arc<TileCache>) -> Self {
        Self {
            config,
            loader,
            cache,
            conversion: Arc::new(ConversionHelper::with_defaults()),
            activity: None,
            logger: default_logger(),
            state: Mutex::new(SourceState::default()),
            paused: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    pub fn with_activity(mut self, activity: Arc<ActivityAggregator>) -> Self {
        self.activity = Some(activity);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_conversion(mut self, conversion: Arc<ConversionHelper>) -> Self {
        self.conversion = conversion;
        self
    }

    pub fn config(&self) -> &LayerTilingConfig {
        &self.config
    }

    pub fn layer_name(&self) -> &str {
        self.config.layer_name()
    }

    /// Recompute the visible tiles for a view given in any convertible
    /// system. Returns the number of visible tiles.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Coord`] if no converter to the layer system is
    /// registered.
    pub fn on_visible_bounds_changed(&self, visible_bounds: &RectCoord, camera_zoom: f64) -> Result<usize, SourceError> {
        let bounds = self
            .conversion
            .convert_rect(self.config.system_identifier(), visible_bounds)?;
        let tiles = visible_tiles(&self.config, &bounds, camera_zoom);
        let count = tiles.len();
        self.set_visible_tiles(&tiles);
        Ok(count)
    }

    /// Replace the visible set.
    ///
    /// Ready tiles, queued tiles and retry state of tiles that are no longer
    /// visible are dropped. Newly visible tiles are served from the cache
    /// when possible and queued otherwise.
    pub fn set_visible_tiles(&self, tiles: &[PrioritizedTile]) {
        let mut ready_changed = false;
        let outstanding = {
            let mut state = self.state.lock();
            let state = &mut *state;

            state.visible = tiles.iter().map(|p| (p.tile.address(), p.tile)).collect();
            let visible = &state.visible;

            let before = state.ready.len();
            state.ready.retain(|address, _| visible.contains_key(address));
            ready_changed |= state.ready.len() != before;
            state.retry.retain(|address, _| visible.contains_key(address));
            let loading = &state.loading;
            state.revalidating.retain(|address| loading.contains(address));

            let mut queue = Vec::new();
            for prioritized in tiles {
                let address = prioritized.tile.address();
                if state.ready.contains_key(&address)
                    || state.loading.contains(&address)
                    || state.retry.contains_key(&address)
                    || state.not_found.contains(&address)
                {
                    continue;
                }
                let fingerprint = TileFingerprint::for_tile(self.config.layer_name(), &prioritized.tile);
                if let Some(cached) = self.cache.get(&fingerprint) {
                    log_trace!(self.logger, "cache hit for {}", fingerprint);
                    state.ready.insert(
                        address,
                        LoadedTile {
                            tile: prioritized.tile,
                            data: cached.data,
                        },
                    );
                    ready_changed = true;
                    continue;
                }
                queue.push(*prioritized);
            }
            queue.sort_by(|a, b| {
                a.priority
                    .cmp(&b.priority)
                    .then_with(|| a.tile.address().cmp(&b.tile.address()))
            });
            queue.dedup_by_key(|p| p.tile.address());
            state.queue = queue;
            state.outstanding()
        };

        if ready_changed {
            self.generation.fetch_add(1, Ordering::AcqRel);
        }
        self.publish_outstanding(outstanding);
    }

    /// Claim the next tile to load: the most urgent queued tile, otherwise a
    /// failed tile whose backoff has elapsed at `now`. Returns `None` while
    /// paused.
    pub fn next_task(&self, now: Instant) -> Option<TileInfo> {
        if self.is_paused() {
            return None;
        }
        let mut state = self.state.lock();
        if !state.queue.is_empty() {
            let next = state.queue.remove(0);
            state.loading.insert(next.tile.address());
            return Some(next.tile);
        }

        let due = state
            .retry
            .iter()
            .filter(|(address, (_, retry))| retry.is_due(now) && !state.loading.contains(*address))
            .min_by_key(|(address, (_, retry))| (retry.due_at(), **address))
            .map(|(address, (tile, _))| (*address, *tile));
        let (address, tile) = due?;
        state.loading.insert(address);
        Some(tile)
    }

    /// Load `tile` (claimed with [`next_task`](Self::next_task)) and record
    /// the outcome. Returns the resulting status.
    pub fn perform_load(&self, tile: TileInfo, now: Instant) -> LoaderStatus {
        let fingerprint = TileFingerprint::for_tile(self.config.layer_name(), &tile);

        let url = match self.config.tile_url(tile.x, tile.y, tile.t, tile.level_identifier) {
            Ok(url) => url,
            Err(e) => {
                log_error!(self.logger, "cannot resolve URL of {}: {}", fingerprint, e);
                let failure = LoaderResult::failed(LoaderStatus::Error400).with_error_code("template");
                return self.finish(tile, &fingerprint, fingerprint.to_string(), failure, now);
            }
        };

        let revalidating = self.state.lock().revalidating.remove(&tile.address());
        let result = match self.cache.get(&fingerprint) {
            Some(cached) if !revalidating => LoaderResult {
                status: LoaderStatus::Ok,
                data: Some(cached.data),
                etag: cached.etag,
                error_code: None,
            },
            cached => {
                let etag = cached.and_then(|c| c.etag);
                log_trace!(self.logger, "loading {} (etag {:?})", url, etag);
                self.loader.load(&url, etag.as_deref())
            }
        };
        self.finish(tile, &fingerprint, url, result, now)
    }

    /// Queue every ready tile for a conditional request carrying its cached
    /// etag. Ready data stays visible until the new response arrives. Returns
    /// how many tiles were queued.
    pub fn revalidate(&self) -> usize {
        let (count, outstanding) = {
            let mut state = self.state.lock();
            let state = &mut *state;
            let mut count = 0;
            for (address, loaded) in &state.ready {
                if state.loading.contains(address) || state.queue.iter().any(|p| p.tile.address() == *address) {
                    continue;
                }
                state.queue.push(PrioritizedTile {
                    tile: loaded.tile,
                    priority: i32::MAX,
                });
                state.revalidating.insert(*address);
                count += 1;
            }
            (count, state.outstanding())
        };
        log_debug!(self.logger, "revalidating {} tiles of {}", count, self.config.layer_name());
        self.publish_outstanding(outstanding);
        count
    }

    /// Entry to cache for a successful load. A load without a body confirms
    /// the cached copy; `None` when there is none.
    fn ok_payload(&self, fingerprint: &TileFingerprint, data: Option<Bytes>, etag: Option<String>) -> Option<CachedTile> {
        match data {
            Some(data) => Some(CachedTile { data, etag }),
            None => self.cache.get(fingerprint).map(|cached| CachedTile {
                data: cached.data,
                etag: etag.or(cached.etag),
            }),
        }
    }

    fn finish(
        &self,
        tile: TileInfo,
        fingerprint: &TileFingerprint,
        url: String,
        result: LoaderResult,
        now: Instant,
    ) -> LoaderStatus {
        let address = tile.address();
        let mut status = match result.status {
            LoaderStatus::Noop => LoaderStatus::ErrorOther,
            status => status,
        };
        let mut error_code = result.error_code;
        let payload = if status.is_ok() {
            let payload = self.ok_payload(fingerprint, result.data, result.etag);
            if payload.is_none() {
                status = LoaderStatus::ErrorOther;
                error_code = Some("not modified, but nothing cached".to_string());
            }
            payload
        } else {
            None
        };

        let mut ready_changed = false;
        let (report, outstanding) = {
            let mut state = self.state.lock();
            state.loading.remove(&address);

            let report = if let Some(payload) = payload {
                state.retry.remove(&address);
                let data = payload.data.clone();
                self.cache.store(fingerprint.clone(), payload);
                if state.visible.contains_key(&address) {
                    let unchanged = state.ready.get(&address).is_some_and(|loaded| loaded.data == data);
                    if !unchanged {
                        state.ready.insert(address, LoadedTile { tile, data });
                        ready_changed = true;
                    }
                }
                log_debug!(self.logger, "loaded {}", fingerprint);
                Some(Report::Cleared(url))
            } else {
                let mut error = TiledLayerError::new(status, self.config.layer_name(), url.clone()).with_bounds(tile.bounds);
                error.error_code = error_code;
                if status.is_not_found() {
                    state.retry.remove(&address);
                    state.not_found.insert(address);
                    log_debug!(self.logger, "{} not found ({})", fingerprint, status);
                } else if state.visible.contains_key(&address) {
                    match state.retry.get_mut(&address) {
                        Some((_, retry)) => retry.failed_again(now),
                        None => {
                            state.retry.insert(address, (tile, RetryState::first(now)));
                        }
                    }
                }
                Some(Report::Failed(error))
            };
            (report, state.outstanding())
        };

        if ready_changed {
            self.generation.fetch_add(1, Ordering::AcqRel);
        }
        if let Some(activity) = &self.activity {
            match report {
                Some(Report::Cleared(url)) => {
                    activity.remove_error(&url);
                }
                Some(Report::Failed(error)) => activity.add_error(error),
                None => {}
            }
        }
        self.publish_outstanding(outstanding);
        status
    }

    /// Load every tile that is due now, one after another. Returns how many
    /// loads ran.
    pub fn load_due(&self) -> usize {
        let mut count = 0;
        while let Some(tile) = self.next_task(Instant::now()) {
            self.perform_load(tile, Instant::now());
            count += 1;
        }
        count
    }

    /// Claim every tile that is due now and load them on the rayon pool.
    /// Returns how many loads ran.
    pub fn load_due_parallel(&self) -> usize {
        let now = Instant::now();
        let mut tasks = Vec::new();
        while let Some(tile) = self.next_task(now) {
            tasks.push(tile);
        }
        tasks.par_iter().for_each(|tile| {
            self.perform_load(*tile, Instant::now());
        });
        tasks.len()
    }

    /// Visible tiles with data, coarsest level first.
    pub fn ready_tiles(&self) -> Vec<LoadedTile> {
        let state = self.state.lock();
        let mut tiles: Vec<LoadedTile> = state.ready.values().cloned().collect();
        tiles.sort_by(|a, b| draw_order(&a.tile, &b.tile));
        tiles
    }

    /// Changes whenever the set of ready tiles changes.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Queued, loading and backing-off tiles.
    pub fn outstanding(&self) -> usize {
        self.state.lock().outstanding()
    }

    pub fn is_not_found(&self, address: TileAddress) -> bool {
        self.state.lock().not_found.contains(&address)
    }

    /// Backoff state of a failed tile.
    pub fn retry_state(&self, address: TileAddress) -> Option<RetryState> {
        self.state.lock().retry.get(&address).map(|(_, retry)| *retry)
    }

    /// Stop handing out tasks. Loads already claimed still complete.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Forget visible, queued, ready and failed tiles. The cache is kept.
    pub fn clear(&self) {
        {
            let mut state = self.state.lock();
            let loading = std::mem::take(&mut state.loading);
            *state = SourceState {
                loading,
                ..SourceState::default()
            };
        }
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Some(activity) = &self.activity {
            activity.remove_all_errors_for_layer(self.config.layer_name());
        }
        let outstanding = self.outstanding();
        self.publish_outstanding(outstanding);
    }

    fn publish_outstanding(&self, outstanding: usize) {
        if let Some(activity) = &self.activity {
            activity.update_remaining_tasks(self.config.layer_name(), outstanding);
        }
    }
}
