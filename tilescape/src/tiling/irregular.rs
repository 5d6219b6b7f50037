//! Explicit tile matrix tables.
//!
//! Some national grids publish tile matrices whose scale steps are not powers
//! of two. These are described as a literal table of levels, and zoom values
//! between two table rows are interpolated linearly.

use crate::coord::{Coord, EPSG_2056, EPSG_21781};

use super::zoom::ZoomLevelInfo;

/// Top-left corner of the Swiss tile matrix in LV95.
pub const SWISS_LV95_ORIGIN: (f64, f64) = (2_420_000.0, 1_350_000.0);

/// Top-left corner of the Swiss tile matrix in LV03.
pub const SWISS_LV03_ORIGIN: (f64, f64) = (420_000.0, 350_000.0);

/// Highest level identifier of the Swiss pyramid.
pub const SWISS_MAX_LEVEL: i32 = 28;

/// `(zoom, tile_width, tiles_x, tiles_y)` per level, level 0 first.
const SWISS_PYRAMID: [(f64, f64, u32, u32); 29] = [
    (14_285_714.2857, 1_024_000.0, 1, 1),
    (13_392_857.1429, 960_000.0, 1, 1),
    (12_500_000.0, 896_000.0, 1, 1),
    (11_607_142.8571, 832_000.0, 1, 1),
    (10_714_285.7143, 768_000.0, 1, 1),
    (9_821_428.571_43, 704_000.0, 1, 1),
    (8_928_571.428_57, 640_000.0, 1, 1),
    (8_035_714.285_71, 576_000.0, 1, 1),
    (7_142_857.142_86, 512_000.0, 1, 1),
    (6_250_000.0, 448_000.0, 2, 1),
    (5_357_142.857_14, 384_000.0, 2, 1),
    (4_464_285.714_29, 320_000.0, 2, 1),
    (3_571_428.571_43, 256_000.0, 2, 2),
    (2_678_571.428_57, 192_000.0, 3, 2),
    (2_321_428.571_43, 166_400.0, 3, 2),
    (1_785_714.285_71, 128_000.0, 4, 3),
    (892_857.142_857, 64_000.0, 8, 5),
    (357_142.857_143, 25_600.0, 19, 13),
    (178_571.428_571, 12_800.0, 38, 25),
    (71_428.571_428_6, 5_120.0, 94, 63),
    (35_714.285_714_3, 2_560.0, 188, 125),
    (17_857.142_857_1, 1_280.0, 375, 250),
    (8_928.571_428_57, 640.0, 750, 500),
    (7_142.857_142_86, 512.0, 938, 625),
    (5_357.142_857_14, 384.0, 1_250, 834),
    (3_571.428_571_43, 256.0, 1_875, 1_250),
    (1_785.714_285_71, 128.0, 3_750, 2_500),
    (892.857_142_857, 64.0, 7_500, 5_000),
    (357.142_857_143, 25.6, 18_750, 12_500),
];

fn swiss_pyramid(system_identifier: i32, origin: (f64, f64)) -> Vec<ZoomLevelInfo> {
    let top_left = Coord::flat(system_identifier, origin.0, origin.1);
    SWISS_PYRAMID
        .iter()
        .enumerate()
        .map(|(id, &(zoom, width, nx, ny))| {
            ZoomLevelInfo::from_top_left(top_left, zoom, width, nx, ny, 1, id as i32)
        })
        .collect()
}

/// The Swiss national tile matrix in LV95 (EPSG:2056).
pub fn swiss_lv95() -> Vec<ZoomLevelInfo> {
    swiss_pyramid(EPSG_2056, SWISS_LV95_ORIGIN)
}

/// The Swiss national tile matrix in LV03 (EPSG:21781). Same pyramid as LV95,
/// shifted origin.
pub fn swiss_lv03() -> Vec<ZoomLevelInfo> {
    swiss_pyramid(EPSG_21781, SWISS_LV03_ORIGIN)
}

/// Interpolated level identifier for a zoom value.
///
/// `levels` must be ordered coarsest first. Zoom values outside the table
/// clamp to the first or last identifier.
pub fn zoom_identifier_for(levels: &[ZoomLevelInfo], zoom: f64) -> Option<f64> {
    interpolate(levels, zoom, |l| l.zoom, |l| f64::from(l.level_identifier))
}

/// Interpolated zoom value for a (fractional) level identifier.
///
/// The inverse of [`zoom_identifier_for`] within the table range.
pub fn zoom_for_identifier(levels: &[ZoomLevelInfo], identifier: f64) -> Option<f64> {
    interpolate(levels, identifier, |l| f64::from(l.level_identifier), |l| l.zoom)
}

fn interpolate(
    levels: &[ZoomLevelInfo],
    value: f64,
    input: impl Fn(&ZoomLevelInfo) -> f64,
    output: impl Fn(&ZoomLevelInfo) -> f64,
) -> Option<f64> {
    let first = levels.first()?;
    let last = levels.last()?;

    // Input may run ascending (identifiers) or descending (zoom).
    let ascending = input(first) <= input(last);
    let before = |a: f64, b: f64| if ascending { a <= b } else { a >= b };

    if before(value, input(first)) {
        return Some(output(first));
    }

    for pair in levels.windows(2) {
        let (x0, x1) = (input(&pair[0]), input(&pair[1]));
        if before(value, x1) {
            if value == x1 || x1 == x0 {
                return Some(output(&pair[1]));
            }
            let (y0, y1) = (output(&pair[0]), output(&pair[1]));
            return Some(y0 + (value - x0) * (y1 - y0) / (x1 - x0));
        }
    }

    Some(output(last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swiss_table_shape() {
        let levels = swiss_lv95();
        assert_eq!(levels.len(), 29);
        assert_eq!(levels[0].level_identifier, 0);
        assert_eq!(levels[28].level_identifier, SWISS_MAX_LEVEL);
        assert_eq!(levels[28].tile_width, 25.6);
        assert_eq!(levels[16].tile_count_x, 8);
        assert_eq!(levels[16].tile_count_y, 5);
    }

    #[test]
    fn test_swiss_bounds_extend_from_origin() {
        let level = swiss_lv95()[16];
        assert_eq!(level.bounds.top_left.x, 2_420_000.0);
        assert_eq!(level.bounds.top_left.y, 1_350_000.0);
        assert_eq!(level.bounds.bottom_right.x, 2_420_000.0 + 8.0 * 64_000.0);
        assert_eq!(level.bounds.bottom_right.y, 1_350_000.0 - 5.0 * 64_000.0);
    }

    #[test]
    fn test_lv03_shares_pyramid() {
        let lv95 = swiss_lv95();
        let lv03 = swiss_lv03();
        for (a, b) in lv95.iter().zip(lv03.iter()) {
            assert_eq!(a.zoom, b.zoom);
            assert_eq!(a.tile_count_x, b.tile_count_x);
            assert_eq!(b.bounds.system_identifier(), EPSG_21781);
        }
        assert_eq!(lv03[0].bounds.top_left.x, 420_000.0);
    }

    #[test]
    fn test_zoom_strictly_decreases() {
        let levels = swiss_lv95();
        assert!(levels.windows(2).all(|w| w[0].zoom > w[1].zoom));
    }

    #[test]
    fn test_identifier_interpolation() {
        let levels = swiss_lv95();
        assert_eq!(zoom_identifier_for(&levels, levels[5].zoom), Some(5.0));

        let mid = (levels[16].zoom + levels[17].zoom) / 2.0;
        let id = zoom_identifier_for(&levels, mid).unwrap();
        assert!((id - 16.5).abs() < 1e-9, "got {}", id);
    }

    #[test]
    fn test_identifier_interpolation_clamps() {
        let levels = swiss_lv95();
        assert_eq!(zoom_identifier_for(&levels, 1e12), Some(0.0));
        assert_eq!(zoom_identifier_for(&levels, 1.0), Some(28.0));
        assert_eq!(zoom_identifier_for(&[], 1.0), None);
    }

    #[test]
    fn test_zoom_for_identifier_inverts() {
        let levels = swiss_lv95();
        assert_eq!(zoom_for_identifier(&levels, 20.0), Some(levels[20].zoom));

        let zoom = zoom_for_identifier(&levels, 16.5).unwrap();
        let back = zoom_identifier_for(&levels, zoom).unwrap();
        assert!((back - 16.5).abs() < 1e-9);
        assert_eq!(zoom_for_identifier(&levels, 40.0), Some(levels[28].zoom));
    }
}
