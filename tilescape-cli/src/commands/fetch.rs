//! Download the tiles covering an area into a directory.
//!
//! Tiles are written as `<output>/<layer>/<level>/<x>/<y>.<ext>`. Failed
//! tiles are retried with the loader backoff for a limited number of rounds.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::json;
use tilescape::activity::{
    ActivityAggregator, ErrorStateListener, ProgressListener, TasksProgressInfo, TiledLayerError,
};
use tilescape::config::ConfigFile;
use tilescape::log::TracingLogger;
use tilescape::source::{HttpTileLoader, LoadedTile, TileCache, TileLoader, TileSource, MAX_RETRY_DELAY, MIN_RETRY_DELAY};
use tilescape::tiling::LayerTilingConfig;
use tracing::{info, warn};

use super::common::{print_json, GlobalOptions};
use super::cover::{check_tile_count, CoverArgs};
use crate::error::CliError;

/// Reports load progress and failures through tracing.
struct ConsoleStatus;

impl ErrorStateListener for ConsoleStatus {
    fn on_error_state_changed(&self, errors: &[TiledLayerError]) {
        if let Some(last) = errors.last() {
            warn!(failed = errors.len(), "latest failure: {}", last);
        }
    }
}

impl ProgressListener for ConsoleStatus {
    fn on_progress_changed(&self, progress: f32, _layers: &[TasksProgressInfo]) {
        info!("progress {:.0}%", progress * 100.0);
    }
}

/// Outcome of a fetch.
#[derive(Debug, Default)]
pub struct FetchSummary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<TiledLayerError>,
}

/// Where tile `tile` of `layer` is written below `output`.
pub fn tile_path(output: &Path, layer: &str, tile: &LoadedTile, extension: &str) -> PathBuf {
    let t = &tile.tile;
    let mut path = output
        .join(layer)
        .join(t.level_identifier.to_string())
        .join(t.x.to_string());
    if t.t > 0 {
        path = path.join(format!("t{}", t.t));
    }
    path.join(format!("{}.{}", t.y, extension))
}

/// File extension taken from the URL template, `tile` when there is none.
pub fn extension_of(template: &str) -> String {
    let path = template.split(['?', '#']).next().unwrap_or_default();
    let last = path.rsplit('/').next().unwrap_or_default();
    match last.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => ext.to_string(),
        _ => "tile".to_string(),
    }
}

/// Load the tiles selected by `area` with `loader` and write them below
/// `output`. Runs at most `retries` extra rounds for failed tiles.
pub fn fetch_tiles(
    tiling: LayerTilingConfig,
    loader: Arc<dyn TileLoader>,
    cache_capacity: usize,
    area: &CoverArgs,
    output: &Path,
    retries: u32,
) -> Result<FetchSummary, CliError> {
    let zoom = area.camera_zoom(&tiling)?;
    let bounds = area.layer_bounds(&tiling)?;
    check_tile_count(&tiling, &bounds, zoom)?;
    let extension = extension_of(tiling.url_template().as_str());

    let activity = Arc::new(ActivityAggregator::with_logger(Arc::new(TracingLogger::new())));
    activity.add_listener(Arc::new(ConsoleStatus));
    let cache = Arc::new(TileCache::new(cache_capacity.max(1)).map_err(|e| CliError::Argument(e.to_string()))?);
    let layer = tiling.layer_name().to_string();
    let source = TileSource::new(Arc::new(tiling), loader, cache)
        .with_activity(Arc::clone(&activity))
        .with_logger(Arc::new(TracingLogger::new()));

    let visible = source.on_visible_bounds_changed(&bounds, zoom)?;
    info!(layer = %layer, tiles = visible, "fetching");

    let mut delay = MIN_RETRY_DELAY;
    for round in 0..=retries {
        source.load_due_parallel();
        if source.outstanding() == 0 || round == retries {
            break;
        }
        thread::sleep(delay);
        delay = (delay * 2).min(MAX_RETRY_DELAY);
    }

    let mut summary = FetchSummary {
        failed: activity.errors(),
        ..FetchSummary::default()
    };
    for tile in source.ready_tiles() {
        let path = tile_path(output, &layer, &tile, &extension);
        write_tile(&path, &tile.data)?;
        summary.written.push(path);
    }
    Ok(summary)
}

fn write_tile(path: &Path, data: &[u8]) -> Result<(), CliError> {
    let to_error = |error| CliError::FileWrite {
        path: path.to_path_buf(),
        error,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(to_error)?;
    }
    std::fs::write(path, data).map_err(to_error)
}

pub fn run(
    options: &GlobalOptions,
    layer: &str,
    area: &CoverArgs,
    output: &Path,
    retries: u32,
) -> Result<(), CliError> {
    let config: ConfigFile = options.load_config()?;
    let tiling = config.layer(layer)?;
    let loader = Arc::new(HttpTileLoader::with_timeout(config.loader.timeout_secs)?);

    let summary = fetch_tiles(tiling, loader, config.cache.capacity, area, output, retries)?;

    if options.json {
        return print_json(&json!({
            "written": summary.written,
            "failed": summary.failed,
        }));
    }

    println!("Wrote {} tiles to {}", summary.written.len(), output.display());
    if !summary.failed.is_empty() {
        println!("{} tiles failed:", summary.failed.len());
        for error in &summary.failed {
            println!("  {}", error);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilescape::activity::LoaderStatus;
    use tilescape::source::LoaderResult;

    fn area(level: f64) -> CoverArgs {
        CoverArgs {
            level: Some(level),
            crs: "EPSG:4326".to_string(),
            ..CoverArgs::default()
        }
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("https://x/{z}/{x}/{y}.png"), "png");
        assert_eq!(extension_of("https://x/{z}/{x}/{y}.jpeg?key=abc"), "jpeg");
        assert_eq!(extension_of("https://x/{z}/{x}/{y}"), "tile");
        assert_eq!(extension_of("https://x/wms?bbox={bbox-epsg-3857}"), "tile");
    }

    #[test]
    fn test_fetch_writes_tiles() {
        let dir = tempfile::tempdir().unwrap();
        let tiling = LayerTilingConfig::web_mercator("osm", "https://x/{z}/{x}/{y}.png");
        let loader: Arc<dyn TileLoader> = Arc::new(|url: &str, _: Option<&str>| LoaderResult::ok(url.as_bytes().to_vec()));

        let summary = fetch_tiles(tiling, loader, 16, &area(1.0), dir.path(), 0).unwrap();

        assert_eq!(summary.written.len(), 4);
        assert!(summary.failed.is_empty());
        let path = dir.path().join("osm/1/1/0.png");
        assert_eq!(std::fs::read(path).unwrap(), b"https://x/1/1/0.png");
    }

    #[test]
    fn test_fetch_refuses_oversized_area() {
        let dir = tempfile::tempdir().unwrap();
        let tiling = LayerTilingConfig::web_mercator("osm", "https://x/{z}/{x}/{y}.png");
        let loader: Arc<dyn TileLoader> = Arc::new(|_: &str, _: Option<&str>| -> LoaderResult {
            panic!("no tile should be requested")
        });

        let result = fetch_tiles(tiling, loader, 16, &area(10.0), dir.path(), 0);

        assert!(matches!(result, Err(CliError::Argument(_))));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_fetch_reports_missing_tiles() {
        let dir = tempfile::tempdir().unwrap();
        let tiling = LayerTilingConfig::web_mercator("osm", "https://x/{z}/{x}/{y}.png");
        let loader: Arc<dyn TileLoader> = Arc::new(|url: &str, _: Option<&str>| {
            if url.ends_with("/0/0.png") {
                LoaderResult::failed(LoaderStatus::Error404)
            } else {
                LoaderResult::ok(vec![1u8])
            }
        });

        let summary = fetch_tiles(tiling, loader, 16, &area(1.0), dir.path(), 0).unwrap();

        assert_eq!(summary.written.len(), 3);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].url, "https://x/1/0/0.png");
        assert!(!dir.path().join("osm/1/0/0.png").exists());
    }
}
