//! List the tiles covering an area.

use serde_json::json;
use tilescape::coord::{ConversionHelper, RectCoord};
use tilescape::tiling::{sorted_by_zoom, target_level_index, visible_tiles, LayerTilingConfig, PrioritizedTile};

use super::common::{parse_bbox, print_json, GlobalOptions};
use crate::error::CliError;

/// Largest number of tiles `cover` and `fetch` enumerate.
pub const MAX_COVER_TILES: u64 = 10_000;

/// Area and zoom to cover.
#[derive(Debug, Clone, Default)]
pub struct CoverArgs {
    /// `x1,y1,x2,y2`; the layer system bounds when absent.
    pub bbox: Option<String>,
    /// CRS of `bbox`.
    pub crs: String,
    /// Camera zoom value.
    pub zoom: Option<f64>,
    /// Fractional level identifier, converted to a camera zoom.
    pub level: Option<f64>,
}

impl CoverArgs {
    /// Camera zoom for `tiling`: `zoom` as given, else derived from `level`.
    pub fn camera_zoom(&self, tiling: &LayerTilingConfig) -> Result<f64, CliError> {
        match (self.zoom, self.level) {
            (Some(zoom), _) => Ok(zoom),
            // a hair coarser than the level so that level itself is selected
            (None, Some(level)) => Ok(tiling.zoom_for_identifier(level) * 1.001),
            (None, None) => Err(CliError::Argument("either --zoom or --level is required".to_string())),
        }
    }

    /// Visible bounds expressed in the layer system.
    pub fn layer_bounds(&self, tiling: &LayerTilingConfig) -> Result<RectCoord, CliError> {
        let Some(bbox) = &self.bbox else {
            return Ok(tiling.coordinate_system().bounds);
        };
        let rect = parse_bbox(bbox, &self.crs)?;
        let conversion = ConversionHelper::with_defaults();
        Ok(conversion.convert_rect(tiling.system_identifier(), &rect)?)
    }
}

/// Upper bound for the number of tiles covering `bounds` at `camera_zoom`.
pub fn estimated_tile_count(tiling: &LayerTilingConfig, bounds: &RectCoord, camera_zoom: f64) -> u64 {
    let zoom_info = tiling.zoom_info();
    let levels = sorted_by_zoom(&tiling.zoom_level_infos());
    let Some(target) = target_level_index(&levels, zoom_info, camera_zoom) else {
        return 0;
    };
    let start = target.saturating_sub(zoom_info.num_draw_previous_layers as usize);

    levels[start..=target]
        .iter()
        .filter(|level| level.tile_width > 0.0)
        .map(|level| {
            let columns = (bounds.width() / level.tile_width).ceil() as u64 + 1;
            let rows = (bounds.height() / level.tile_width).ceil() as u64 + 1;
            columns.min(u64::from(level.tile_count_x))
                * rows.min(u64::from(level.tile_count_y))
                * u64::from(level.tile_count_t.max(1))
        })
        .sum()
}

/// Refuse areas that would enumerate more than [`MAX_COVER_TILES`] tiles.
pub fn check_tile_count(tiling: &LayerTilingConfig, bounds: &RectCoord, camera_zoom: f64) -> Result<(), CliError> {
    let estimate = estimated_tile_count(tiling, bounds, camera_zoom);
    if estimate > MAX_COVER_TILES {
        return Err(CliError::Argument(format!(
            "area covers up to {} tiles at this zoom (limit {}); use a smaller --bbox or a coarser --level",
            estimate, MAX_COVER_TILES
        )));
    }
    Ok(())
}

/// Tiles of `tiling` for the requested area, most urgent first.
pub fn compute(tiling: &LayerTilingConfig, args: &CoverArgs) -> Result<Vec<PrioritizedTile>, CliError> {
    let bounds = args.layer_bounds(tiling)?;
    let zoom = args.camera_zoom(tiling)?;
    check_tile_count(tiling, &bounds, zoom)?;
    Ok(visible_tiles(tiling, &bounds, zoom))
}

pub fn run(options: &GlobalOptions, layer: &str, args: &CoverArgs) -> Result<(), CliError> {
    let config = options.load_config()?;
    let tiling = config.layer(layer)?;
    let tiles = compute(&tiling, args)?;

    if options.json {
        let entries = tiles
            .iter()
            .map(|p| {
                let tile = &p.tile;
                let url = tiling.tile_url(tile.x, tile.y, tile.t, tile.level_identifier)?;
                Ok(json!({
                    "level": tile.level_identifier,
                    "x": tile.x,
                    "y": tile.y,
                    "t": tile.t,
                    "priority": p.priority,
                    "bounds": tile.bounds,
                    "url": url,
                }))
            })
            .collect::<Result<Vec<_>, CliError>>()?;
        return print_json(&entries);
    }

    if tiles.is_empty() {
        println!("No tiles visible at this zoom");
        return Ok(());
    }
    for p in &tiles {
        let tile = &p.tile;
        let url = tiling.tile_url(tile.x, tile.y, tile.t, tile.level_identifier)?;
        println!("{:>3} {:>6} {:>6}  {}", tile.level_identifier, tile.x, tile.y, url);
    }
    println!("{} tiles", tiles.len());
    Ok(())
}
