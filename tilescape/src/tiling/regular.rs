//! Power-of-two tile pyramids.
//!
//! Level `i` splits the system bounds into `2^i x 2^i` tiles. Zoom (scale
//! denominator) and tile width both halve with every level.

use crate::coord::{CoordinateSystem, EPSG_3857, EPSG_4326};

use super::zoom::ZoomLevelInfo;

/// Scale denominator of level 0 for Web Mercator and custom systems.
pub const WEB_MERCATOR_BASE_ZOOM: f64 = 559_082_264.029;

/// Width of the Web Mercator world square at level 0, in meters.
pub const WEB_MERCATOR_BASE_WIDTH: f64 = 40_075_016.0;

/// Scale denominator of level 0 for WGS84 pyramids.
pub const WGS84_BASE_ZOOM: f64 = 500_000_000.0;

/// Width of the WGS84 world at level 0, in degrees.
pub const WGS84_BASE_WIDTH: f64 = 360.0;

/// Deepest level a regular pyramid can describe with `u32` tile counts.
pub const MAX_REGULAR_LEVEL: u32 = 30;

/// Level-0 zoom and tile width for a coordinate system.
pub fn base_for(system: &CoordinateSystem) -> (f64, f64) {
    match system.identifier {
        EPSG_3857 => (WEB_MERCATOR_BASE_ZOOM, WEB_MERCATOR_BASE_WIDTH),
        EPSG_4326 => (WGS84_BASE_ZOOM, WGS84_BASE_WIDTH),
        _ => (WEB_MERCATOR_BASE_ZOOM, system.bounds.width()),
    }
}

/// Describe a single level of the pyramid.
///
/// Callers must keep `level <= MAX_REGULAR_LEVEL`.
pub fn regular_level(system: &CoordinateSystem, level: u32) -> ZoomLevelInfo {
    let (base_zoom, base_width) = base_for(system);
    let tile_count = 1u32 << level;
    let divisor = f64::from(tile_count);
    ZoomLevelInfo {
        zoom: base_zoom / divisor,
        tile_width: base_width / divisor,
        tile_count_x: tile_count,
        tile_count_y: tile_count,
        tile_count_t: 1,
        level_identifier: level as i32,
        bounds: system.bounds,
    }
}

/// Describe levels `min_level..=max_level` (coarsest first).
pub fn regular_levels(system: &CoordinateSystem, min_level: u32, max_level: u32) -> Vec<ZoomLevelInfo> {
    (min_level..=max_level)
        .map(|level| regular_level(system, level))
        .collect()
}
