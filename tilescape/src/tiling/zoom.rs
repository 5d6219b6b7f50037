//! Zoom level descriptors and the per-layer zoom policy.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::coord::{Coord, RectCoord};

/// One discrete resolution step of a tiling scheme.
///
/// `zoom` is the scale denominator of the level (larger means coarser).
/// `tile_width` is the edge length of one (square) tile in layer system units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLevelInfo {
    pub zoom: f64,
    pub tile_width: f64,
    pub tile_count_x: u32,
    pub tile_count_y: u32,
    /// Number of time steps; values above 1 require a `{t}` URL token.
    pub tile_count_t: u32,
    pub level_identifier: i32,
    pub bounds: RectCoord,
}

impl ZoomLevelInfo {
    /// Build a level whose bounds extend from `top_left` by the tile grid,
    /// with y decreasing downwards (tile matrix convention).
    pub fn from_top_left(
        top_left: Coord,
        zoom: f64,
        tile_width: f64,
        tile_count_x: u32,
        tile_count_y: u32,
        tile_count_t: u32,
        level_identifier: i32,
    ) -> Self {
        let bottom_right = Coord::flat(
            top_left.system_identifier,
            top_left.x + tile_width * f64::from(tile_count_x),
            top_left.y - tile_width * f64::from(tile_count_y),
        );
        Self {
            zoom,
            tile_width,
            tile_count_x,
            tile_count_y,
            tile_count_t,
            level_identifier,
            bounds: RectCoord::new(top_left, bottom_right),
        }
    }

    /// Total number of tiles in one time step of this level.
    pub fn tile_count(&self) -> u64 {
        u64::from(self.tile_count_x) * u64::from(self.tile_count_y)
    }

    /// Whether this level carries more than one time step.
    pub fn is_multi_time(&self) -> bool {
        self.tile_count_t > 1
    }
}

/// Sort levels coarsest first (descending `zoom`).
pub fn sorted_by_zoom(levels: &[ZoomLevelInfo]) -> Vec<ZoomLevelInfo> {
    let mut sorted = levels.to_vec();
    sorted.sort_by(|a, b| b.zoom.partial_cmp(&a.zoom).unwrap_or(Ordering::Equal));
    sorted
}

/// Sort levels by ascending `level_identifier`.
pub fn sorted_by_identifier(levels: &[ZoomLevelInfo]) -> Vec<ZoomLevelInfo> {
    let mut sorted = levels.to_vec();
    sorted.sort_by_key(|level| level.level_identifier);
    sorted
}

/// Per-layer policy controlling how levels are chosen and drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomInfo {
    /// Multiplier applied to a level's `zoom` before comparing it to the
    /// camera zoom. Values above 1 switch to finer levels earlier.
    pub zoom_level_scale_factor: f64,
    /// Coarser levels drawn underneath the target level.
    pub num_draw_previous_layers: u32,
    /// Draw each tile in its own pass, masked to the tile bounds.
    pub mask_tile: bool,
    /// Allow drawing finer levels when zoomed out beyond the coarsest level.
    pub underzoom: bool,
    /// Allow stretching the finest level when zoomed in beyond it.
    pub overzoom: bool,
}

impl Default for ZoomInfo {
    fn default() -> Self {
        Self {
            zoom_level_scale_factor: 1.0,
            num_draw_previous_layers: 0,
            mask_tile: false,
            underzoom: false,
            overzoom: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::EPSG_2056;

    fn level(zoom: f64, id: i32) -> ZoomLevelInfo {
        ZoomLevelInfo::from_top_left(Coord::flat(EPSG_2056, 0.0, 0.0), zoom, 1.0, 1, 1, 1, id)
    }

    #[test]
    fn test_from_top_left_extends_down_and_right() {
        let top_left = Coord::flat(EPSG_2056, 2_420_000.0, 1_350_000.0);
        let info = ZoomLevelInfo::from_top_left(top_left, 1000.0, 64_000.0, 8, 5, 1, 16);

        assert_eq!(info.bounds.top_left, top_left);
        assert_eq!(info.bounds.bottom_right.x, 2_420_000.0 + 8.0 * 64_000.0);
        assert_eq!(info.bounds.bottom_right.y, 1_350_000.0 - 5.0 * 64_000.0);
        assert_eq!(info.tile_count(), 40);
        assert!(!info.is_multi_time());
    }

    #[test]
    fn test_sorting_helpers() {
        let levels = vec![level(10.0, 2), level(40.0, 0), level(20.0, 1)];

        let by_zoom: Vec<i32> = sorted_by_zoom(&levels)
            .iter()
            .map(|l| l.level_identifier)
            .collect();
        assert_eq!(by_zoom, vec![0, 1, 2]);

        let by_id: Vec<f64> = sorted_by_identifier(&levels).iter().map(|l| l.zoom).collect();
        assert_eq!(by_id, vec![40.0, 20.0, 10.0]);
    }

    #[test]
    fn test_zoom_info_default() {
        let info = ZoomInfo::default();
        assert_eq!(info.zoom_level_scale_factor, 1.0);
        assert_eq!(info.num_draw_previous_layers, 0);
        assert!(info.overzoom);
        assert!(!info.underzoom);
        assert!(!info.mask_tile);
    }
}
