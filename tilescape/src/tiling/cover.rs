//! Visible tile selection.
//!
//! Given the visible area and a camera zoom value, picks the level that
//! should be drawn (plus a configurable number of coarser fallback levels)
//! and enumerates the tiles of those levels that overlap the view. Tiles
//! closer to the view center and on coarser levels get lower (more urgent)
//! priority values.

use std::cmp::Ordering;

use serde::Serialize;

use crate::coord::{Coord, RectCoord};

use super::config::{tile_bounds, LayerTilingConfig};
use super::zoom::{sorted_by_zoom, ZoomInfo, ZoomLevelInfo};

/// Priority span reserved for one level; distances map into `0..=20`.
pub const PRIORITY_RANGE: i32 = 20;

/// Address and extent of a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TileInfo {
    pub bounds: RectCoord,
    pub x: u32,
    pub y: u32,
    pub t: u32,
    pub level_identifier: i32,
    /// Position of the level in the coarsest-first level list.
    pub level_index: usize,
}

impl TileInfo {
    /// `(level, x, y, t)`, the ordering key used for deterministic output.
    pub fn address(&self) -> (i32, u32, u32, u32) {
        (self.level_identifier, self.x, self.y, self.t)
    }
}

/// A tile together with its load priority (lower loads first).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrioritizedTile {
    pub tile: TileInfo,
    pub priority: i32,
}

/// Index of the level to draw for `camera_zoom` within `levels` (coarsest
/// first): the first level whose scaled zoom is finer than the camera, or the
/// finest level if none is.
pub fn target_level_index(levels: &[ZoomLevelInfo], zoom_info: &ZoomInfo, camera_zoom: f64) -> Option<usize> {
    if levels.is_empty() {
        return None;
    }
    let index = levels
        .iter()
        .position(|level| zoom_info.zoom_level_scale_factor * level.zoom < camera_zoom)
        .unwrap_or(levels.len() - 1);
    Some(index)
}

/// Tiles of `config` to show for `visible_bounds` at `camera_zoom`.
///
/// `visible_bounds` must already be expressed in the layer's coordinate
/// system. The result is sorted by priority, then by tile address.
///
/// An empty result means nothing should be drawn: either the view does not
/// touch the layer, or the camera is past the coarsest level without
/// `underzoom` or past the finest level without `overzoom`.
///
/// # Panics
///
/// Panics if `visible_bounds` is in a different system than the layer.
pub fn visible_tiles(config: &LayerTilingConfig, visible_bounds: &RectCoord, camera_zoom: f64) -> Vec<PrioritizedTile> {
    assert_eq!(
        visible_bounds.system_identifier(),
        config.system_identifier(),
        "coordinate system mismatch: convert the visible bounds to the layer system first"
    );

    let zoom_info = config.zoom_info();
    let levels = sorted_by_zoom(&config.zoom_level_infos());
    let Some(finest) = levels.last() else {
        return Vec::new();
    };

    if !zoom_info.overzoom && zoom_info.zoom_level_scale_factor * finest.zoom >= camera_zoom {
        return Vec::new();
    }

    if !zoom_info.underzoom {
        let virtual_levels = sorted_by_zoom(&config.virtual_zoom_level_infos());
        let mut all_levels = virtual_levels.clone();
        all_levels.extend(levels.iter().copied());
        if let Some(index) = target_level_index(&all_levels, zoom_info, camera_zoom) {
            if index < virtual_levels.len() {
                return Vec::new();
            }
        }
    }

    let Some(target) = target_level_index(&levels, zoom_info, camera_zoom) else {
        return Vec::new();
    };
    let start = target.saturating_sub(zoom_info.num_draw_previous_layers as usize);
    let center = visible_bounds.center();

    let mut tiles = Vec::new();
    for (zoom_index, level_index) in (start..=target).enumerate() {
        let level = &levels[level_index];
        collect_level(
            config,
            level,
            level_index,
            visible_bounds,
            &center,
            zoom_index as i32 * PRIORITY_RANGE,
            &mut tiles,
        );
    }

    tiles.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.tile.address().cmp(&b.tile.address()))
    });
    tiles
}

fn collect_level(
    config: &LayerTilingConfig,
    level: &ZoomLevelInfo,
    level_index: usize,
    visible: &RectCoord,
    center: &Coord,
    base_priority: i32,
    out: &mut Vec<PrioritizedTile>,
) {
    let tile_width = level.tile_width;
    if tile_width <= 0.0 || level.tile_count_x == 0 || level.tile_count_y == 0 {
        return;
    }
    let bounds = level.bounds;
    let left_to_right = bounds.top_left.x < bounds.bottom_right.x;
    let top_to_bottom = bounds.top_left.y < bounds.bottom_right.y;

    let offset_x = if left_to_right {
        visible.min_x() - bounds.top_left.x
    } else {
        bounds.top_left.x - visible.max_x()
    };
    let offset_y = if top_to_bottom {
        visible.min_y() - bounds.top_left.y
    } else {
        bounds.top_left.y - visible.max_y()
    };

    let start_x = (offset_x.max(0.0) / tile_width).floor() as u32;
    let start_y = (offset_y.max(0.0) / tile_width).floor() as u32;
    let end_x = start_x.saturating_add((visible.width() / tile_width).ceil() as u32);
    let end_y = start_y.saturating_add((visible.height() / tile_width).ceil() as u32);

    let max_distance_x = visible.width() * 0.5 + tile_width;
    let max_distance_y = visible.height() * 0.5 + tile_width;
    let max_distance = (max_distance_x * max_distance_x + max_distance_y * max_distance_y).sqrt();

    for x in start_x..=end_x.min(level.tile_count_x - 1) {
        for y in start_y..=end_y.min(level.tile_count_y - 1) {
            let rect = tile_bounds(level, x, y);
            if !rect.intersects(visible) {
                continue;
            }
            if let Some(layer_bounds) = config.bounds() {
                if !rect.intersects(layer_bounds) {
                    continue;
                }
            }

            let distance = rect.center().distance_2d(center);
            let priority = (distance / max_distance * f64::from(PRIORITY_RANGE)).ceil() as i32 + base_priority;

            for t in 0..level.tile_count_t.max(1) {
                out.push(PrioritizedTile {
                    tile: TileInfo {
                        bounds: rect,
                        x,
                        y,
                        t,
                        level_identifier: level.level_identifier,
                        level_index,
                    },
                    priority,
                });
            }
        }
    }
}

/// Order tiles coarsest level first, then by address. Used for draw order.
pub fn draw_order(a: &TileInfo, b: &TileInfo) -> Ordering {
    a.level_index
        .cmp(&b.level_index)
        .then_with(|| a.address().cmp(&b.address()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{CoordinateSystem, EPSG_3857, WEB_MERCATOR_EXTENT};
    use crate::tiling::regular::WEB_MERCATOR_BASE_ZOOM;

    const OSM: &str = "https://x/{z}/{x}/{y}.png";

    fn world() -> RectCoord {
        CoordinateSystem::epsg3857().bounds
    }

    fn quadrant() -> RectCoord {
        // North-west quarter of the world.
        RectCoord::new(
            Coord::flat(EPSG_3857, -WEB_MERCATOR_EXTENT, WEB_MERCATOR_EXTENT),
            Coord::flat(EPSG_3857, -1.0, 1.0),
        )
    }

    #[test]
    fn test_target_level_picks_first_finer_level() {
        let config = LayerTilingConfig::web_mercator("osm", OSM);
        let levels = config.zoom_level_infos();
        let info = ZoomInfo::default();

        // Camera just coarser than level 3.
        let camera = levels[3].zoom * 1.01;
        assert_eq!(target_level_index(&levels, &info, camera), Some(3));
        assert_eq!(target_level_index(&levels, &info, 1e12), Some(0));
        assert_eq!(target_level_index(&levels, &info, 1.0), Some(20));
        assert_eq!(target_level_index(&[], &info, 1.0), None);
    }

    #[test]
    fn test_scale_factor_shifts_target() {
        let config = LayerTilingConfig::web_mercator("osm", OSM);
        let levels = config.zoom_level_infos();
        let camera = levels[3].zoom * 1.01;
        let info = ZoomInfo {
            zoom_level_scale_factor: 0.5,
            ..ZoomInfo::default()
        };
        assert_eq!(target_level_index(&levels, &info, camera), Some(2));
    }

    #[test]
    fn test_level_zero_covers_world_with_one_tile() {
        let config = LayerTilingConfig::web_mercator("osm", OSM);
        let tiles = visible_tiles(&config, &world(), WEB_MERCATOR_BASE_ZOOM * 2.0);
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].tile.address(), (0, 0, 0, 0));
    }

    #[test]
    fn test_quadrant_at_level_two() {
        let config = LayerTilingConfig::web_mercator("osm", OSM);
        let camera = WEB_MERCATOR_BASE_ZOOM / 4.0 * 1.01;
        let tiles = visible_tiles(&config, &quadrant(), camera);

        let mut addresses: Vec<(u32, u32)> = tiles.iter().map(|p| (p.tile.x, p.tile.y)).collect();
        addresses.sort_unstable();
        assert_eq!(addresses, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
        assert!(tiles.iter().all(|p| p.tile.level_identifier == 2));
    }

    #[test]
    fn test_previous_layers_get_lower_priority() {
        let info = ZoomInfo {
            num_draw_previous_layers: 1,
            ..ZoomInfo::default()
        };
        let config = LayerTilingConfig::web_mercator("osm", OSM).with_zoom_info(info);
        let camera = WEB_MERCATOR_BASE_ZOOM / 4.0 * 1.01;
        let tiles = visible_tiles(&config, &quadrant(), camera);

        let coarse: Vec<&PrioritizedTile> = tiles.iter().filter(|p| p.tile.level_identifier == 1).collect();
        let fine: Vec<&PrioritizedTile> = tiles.iter().filter(|p| p.tile.level_identifier == 2).collect();
        assert_eq!(coarse.len(), 1);
        assert_eq!(fine.len(), 4);
        assert!(coarse.iter().all(|c| fine.iter().all(|f| c.priority < f.priority)));
    }

    #[test]
    fn test_priorities_are_sorted() {
        let config = LayerTilingConfig::web_mercator("osm", OSM);
        let tiles = visible_tiles(&config, &world(), WEB_MERCATOR_BASE_ZOOM / 8.0 * 1.01);
        assert_eq!(tiles.len(), 64);
        assert!(tiles.windows(2).all(|w| w[0].priority <= w[1].priority));
    }

    #[test]
    fn test_layer_bounds_filter_tiles() {
        let config = LayerTilingConfig::web_mercator("osm", OSM).with_bounds(quadrant());
        let tiles = visible_tiles(&config, &world(), WEB_MERCATOR_BASE_ZOOM / 4.0 * 1.01);
        assert_eq!(tiles.len(), 4);
    }

    #[test]
    fn test_overzoom_disabled_hides_layer() {
        let info = ZoomInfo {
            overzoom: false,
            ..ZoomInfo::default()
        };
        let config = LayerTilingConfig::web_mercator("osm", OSM).with_zoom_info(info);
        assert!(visible_tiles(&config, &quadrant(), 1.0).is_empty());
    }

    #[test]
    fn test_underzoom_disabled_hides_layer() {
        let config = LayerTilingConfig::regular("osm", OSM, CoordinateSystem::epsg3857(), 4, 10).unwrap();
        let camera = WEB_MERCATOR_BASE_ZOOM * 2.0;
        assert!(visible_tiles(&config, &world(), camera).is_empty());

        let info = ZoomInfo {
            underzoom: true,
            ..ZoomInfo::default()
        };
        let config = config.with_zoom_info(info);
        let tiles = visible_tiles(&config, &world(), camera);
        assert_eq!(tiles.len(), 256);
    }

    #[test]
    fn test_swiss_cover() {
        let config = LayerTilingConfig::swiss_lv95("swiss", OSM);
        let view = CoordinateSystem::epsg2056().bounds;
        let level16 = config.level(16).unwrap();
        let tiles = visible_tiles(&config, &view, level16.zoom * 1.01);
        assert!(!tiles.is_empty());
        assert!(tiles.iter().all(|p| p.tile.level_identifier == 16));
        assert!(tiles.iter().all(|p| p.tile.x < 8 && p.tile.y < 5));
    }

    #[test]
    #[should_panic(expected = "coordinate system mismatch")]
    fn test_visible_bounds_must_match_layer_system() {
        let config = LayerTilingConfig::swiss_lv95("swiss", OSM);
        visible_tiles(&config, &world(), 1000.0);
    }
}
