//! Layer tiling configuration.
//!
//! A [`LayerTilingConfig`] ties a URL template to a coordinate system and a
//! tiling scheme, and answers the two questions every tile source asks:
//! "which levels exist?" and "where do I fetch tile (x, y, t) of level n?".

use serde::Serialize;
use thiserror::Error;

use crate::coord::{resolve_identifier, Coord, CoordError, CoordinateSystem, RectCoord};
use crate::coord::{EPSG_2056, EPSG_21781, EPSG_3857};

use super::irregular::{self, SWISS_MAX_LEVEL};
use super::regular::{self, MAX_REGULAR_LEVEL};
use super::template::{TemplateError, UrlTemplate};
use super::zoom::{ZoomInfo, ZoomLevelInfo};

/// Token replaced by the tile's bounding box (`minx,miny,maxx,maxy`) in Web
/// Mercator layers, for WMS style endpoints.
pub const TOKEN_BBOX_3857: &str = "{bbox-epsg-3857}";

/// Default deepest level of a Web Mercator pyramid.
pub const DEFAULT_MAX_LEVEL: u32 = 20;

/// Errors raised while building or querying a tiling configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TilingError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Requested level is not part of the configured range.
    #[error("Level {level} is outside the configured range {min}..={max}")]
    LevelOutOfRange { level: i32, min: i32, max: i32 },

    /// `min_level > max_level` or `max_level` too deep for a regular pyramid.
    #[error("Invalid level range {min}..={max}")]
    InvalidLevelRange { min: i32, max: i32 },

    /// An irregular scheme was given no levels.
    #[error("Tiling scheme has no levels")]
    EmptyLevels,

    #[error(transparent)]
    Coord(#[from] CoordError),
}

/// How the levels of a layer are produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TilingScheme {
    /// Power-of-two pyramid over the system bounds.
    Regular { min_level: u32, max_level: u32 },
    /// Explicit table; `levels` selects table rows by index, ascending.
    Irregular {
        levels: Vec<i32>,
        table: Vec<ZoomLevelInfo>,
    },
}

/// Everything needed to address the tiles of one layer.
#[derive(Debug, Clone, Serialize)]
pub struct LayerTilingConfig {
    layer_name: String,
    url_template: UrlTemplate,
    bounds: Option<RectCoord>,
    zoom_info: ZoomInfo,
    coordinate_system: CoordinateSystem,
    scheme: TilingScheme,
}

impl LayerTilingConfig {
    /// Regular pyramid for levels `min_level..=max_level` of `system`.
    ///
    /// # Errors
    ///
    /// Returns [`TilingError::InvalidLevelRange`] if `min_level > max_level`
    /// or `max_level` exceeds the deepest supported level.
    pub fn regular(
        layer_name: impl Into<String>,
        url_template: impl Into<UrlTemplate>,
        coordinate_system: CoordinateSystem,
        min_level: u32,
        max_level: u32,
    ) -> Result<Self, TilingError> {
        if min_level > max_level || max_level > MAX_REGULAR_LEVEL {
            return Err(TilingError::InvalidLevelRange {
                min: min_level as i32,
                max: max_level as i32,
            });
        }
        Ok(Self::new(
            layer_name.into(),
            url_template.into(),
            coordinate_system,
            TilingScheme::Regular {
                min_level,
                max_level,
            },
        ))
    }

    /// Web Mercator pyramid, levels 0 to 20.
    pub fn web_mercator(layer_name: impl Into<String>, url_template: impl Into<UrlTemplate>) -> Self {
        Self::new(
            layer_name.into(),
            url_template.into(),
            CoordinateSystem::epsg3857(),
            TilingScheme::Regular {
                min_level: 0,
                max_level: DEFAULT_MAX_LEVEL,
            },
        )
    }

    /// WGS84 pyramid, levels 0 to 20.
    pub fn epsg4326(layer_name: impl Into<String>, url_template: impl Into<UrlTemplate>) -> Self {
        Self::new(
            layer_name.into(),
            url_template.into(),
            CoordinateSystem::epsg4326(),
            TilingScheme::Regular {
                min_level: 0,
                max_level: DEFAULT_MAX_LEVEL,
            },
        )
    }

    /// Explicit level table.
    ///
    /// `levels` are indices into `table`; they are sorted and deduplicated.
    ///
    /// # Errors
    ///
    /// - [`TilingError::EmptyLevels`] if `table` or `levels` is empty
    /// - [`TilingError::LevelOutOfRange`] if a level does not index `table`
    pub fn irregular(
        layer_name: impl Into<String>,
        url_template: impl Into<UrlTemplate>,
        coordinate_system: CoordinateSystem,
        table: Vec<ZoomLevelInfo>,
        mut levels: Vec<i32>,
    ) -> Result<Self, TilingError> {
        if table.is_empty() || levels.is_empty() {
            return Err(TilingError::EmptyLevels);
        }
        levels.sort_unstable();
        levels.dedup();

        let max = table.len() as i32 - 1;
        if let Some(&level) = levels.iter().find(|&&l| l < 0 || l > max) {
            return Err(TilingError::LevelOutOfRange { level, min: 0, max });
        }

        Ok(Self::new(
            layer_name.into(),
            url_template.into(),
            coordinate_system,
            TilingScheme::Irregular { levels, table },
        ))
    }

    /// Swiss national grid (LV95), all 29 levels.
    pub fn swiss_lv95(layer_name: impl Into<String>, url_template: impl Into<UrlTemplate>) -> Self {
        Self::new(
            layer_name.into(),
            url_template.into(),
            CoordinateSystem::epsg2056(),
            TilingScheme::Irregular {
                levels: (0..=SWISS_MAX_LEVEL).collect(),
                table: irregular::swiss_lv95(),
            },
        )
    }

    /// Swiss national grid (LV03), all 29 levels.
    pub fn swiss_lv03(layer_name: impl Into<String>, url_template: impl Into<UrlTemplate>) -> Self {
        Self::new(
            layer_name.into(),
            url_template.into(),
            CoordinateSystem::epsg21781(),
            TilingScheme::Irregular {
                levels: (0..=SWISS_MAX_LEVEL).collect(),
                table: irregular::swiss_lv03(),
            },
        )
    }

    /// Default scheme for a CRS string: the Swiss pyramid for LV95/LV03 and a
    /// regular pyramid (levels 0-20) otherwise.
    pub fn for_crs(
        layer_name: impl Into<String>,
        url_template: impl Into<UrlTemplate>,
        crs: &str,
    ) -> Result<Self, TilingError> {
        let identifier = resolve_identifier(crs)?;
        let config = match identifier {
            EPSG_2056 => Self::swiss_lv95(layer_name, url_template),
            EPSG_21781 => Self::swiss_lv03(layer_name, url_template),
            _ => Self::regular(
                layer_name,
                url_template,
                CoordinateSystem::for_identifier(identifier)?,
                0,
                DEFAULT_MAX_LEVEL,
            )?,
        };
        Ok(config)
    }

    fn new(
        layer_name: String,
        url_template: UrlTemplate,
        coordinate_system: CoordinateSystem,
        scheme: TilingScheme,
    ) -> Self {
        Self {
            layer_name,
            url_template,
            bounds: None,
            zoom_info: ZoomInfo::default(),
            coordinate_system,
            scheme,
        }
    }

    /// Restrict tile loading to `bounds` (layer system).
    ///
    /// # Panics
    ///
    /// Panics if `bounds` is not in the layer's coordinate system.
    #[track_caller]
    pub fn with_bounds(mut self, bounds: RectCoord) -> Self {
        assert_eq!(
            bounds.system_identifier(),
            self.coordinate_system.identifier,
            "coordinate system mismatch: layer bounds must use the layer system"
        );
        self.bounds = Some(bounds);
        self
    }

    pub fn with_zoom_info(mut self, zoom_info: ZoomInfo) -> Self {
        self.zoom_info = zoom_info;
        self
    }

    pub fn layer_name(&self) -> &str {
        &self.layer_name
    }

    pub fn url_template(&self) -> &UrlTemplate {
        &self.url_template
    }

    pub fn bounds(&self) -> Option<&RectCoord> {
        self.bounds.as_ref()
    }

    pub fn zoom_info(&self) -> &ZoomInfo {
        &self.zoom_info
    }

    pub fn coordinate_system(&self) -> &CoordinateSystem {
        &self.coordinate_system
    }

    pub fn system_identifier(&self) -> i32 {
        self.coordinate_system.identifier
    }

    pub fn scheme(&self) -> &TilingScheme {
        &self.scheme
    }

    /// Smallest and largest level identifier served by this layer.
    pub fn level_range(&self) -> (i32, i32) {
        match &self.scheme {
            TilingScheme::Regular {
                min_level,
                max_level,
            } => (*min_level as i32, *max_level as i32),
            TilingScheme::Irregular { levels, table } => {
                let first = levels.first().map_or(0, |&i| table[i as usize].level_identifier);
                let last = levels.last().map_or(0, |&i| table[i as usize].level_identifier);
                (first, last)
            }
        }
    }

    /// Levels served by this layer, coarsest first.
    pub fn zoom_level_infos(&self) -> Vec<ZoomLevelInfo> {
        match &self.scheme {
            TilingScheme::Regular {
                min_level,
                max_level,
            } => regular::regular_levels(&self.coordinate_system, *min_level, *max_level),
            TilingScheme::Irregular { levels, table } => {
                levels.iter().map(|&i| table[i as usize]).collect()
            }
        }
    }

    /// Levels coarser than the first served level. They are never fetched
    /// but let a renderer tell how far the camera is zoomed out.
    pub fn virtual_zoom_level_infos(&self) -> Vec<ZoomLevelInfo> {
        match &self.scheme {
            TilingScheme::Regular { min_level, .. } if *min_level > 0 => {
                regular::regular_levels(&self.coordinate_system, 0, min_level - 1)
            }
            TilingScheme::Regular { .. } => Vec::new(),
            TilingScheme::Irregular { levels, table } => {
                let first = levels.first().copied().unwrap_or(0).max(0) as usize;
                table[..first].to_vec()
            }
        }
    }

    /// Look up a served level by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TilingError::LevelOutOfRange`]; levels are never clamped.
    pub fn level(&self, level_identifier: i32) -> Result<ZoomLevelInfo, TilingError> {
        let (min, max) = self.level_range();
        let out_of_range = TilingError::LevelOutOfRange {
            level: level_identifier,
            min,
            max,
        };

        match &self.scheme {
            TilingScheme::Regular { .. } => {
                if level_identifier < min || level_identifier > max {
                    return Err(out_of_range);
                }
                Ok(regular::regular_level(
                    &self.coordinate_system,
                    level_identifier as u32,
                ))
            }
            TilingScheme::Irregular { levels, table } => levels
                .iter()
                .map(|&i| table[i as usize])
                .find(|info| info.level_identifier == level_identifier)
                .ok_or(out_of_range),
        }
    }

    /// Resolve the fetch URL of tile `(x, y, t)` at `level_identifier`.
    ///
    /// # Errors
    ///
    /// - [`TilingError::LevelOutOfRange`] for an unknown level
    /// - [`TilingError::Template`] if the template lacks a required token
    pub fn tile_url(&self, x: u32, y: u32, t: u32, level_identifier: i32) -> Result<String, TilingError> {
        let level = self.level(level_identifier)?;

        if self.system_identifier() == EPSG_3857 && self.url_template.as_str().contains(TOKEN_BBOX_3857) {
            let tile = tile_bounds(&level, x, y);
            let bbox = format!(
                "{},{},{},{}",
                tile.min_x(),
                tile.min_y(),
                tile.max_x(),
                tile.max_y()
            );
            return Ok(self.url_template.as_str().replacen(TOKEN_BBOX_3857, &bbox, 1));
        }

        let url = if level.is_multi_time() || self.url_template.has_time_token() {
            self.url_template
                .resolve_with_time(x, y, t, level.level_identifier)?
        } else {
            self.url_template.resolve(x, y, level.level_identifier)?
        };
        Ok(url)
    }

    /// Fractional level identifier matching a camera zoom value.
    pub fn zoom_identifier(&self, zoom: f64) -> f64 {
        match &self.scheme {
            TilingScheme::Regular {
                min_level,
                max_level,
            } => {
                let (base_zoom, _) = regular::base_for(&self.coordinate_system);
                (base_zoom / zoom)
                    .log2()
                    .clamp(f64::from(*min_level), f64::from(*max_level))
            }
            TilingScheme::Irregular { .. } => {
                let levels = self.zoom_level_infos();
                irregular::zoom_identifier_for(&levels, zoom).unwrap_or(0.0)
            }
        }
    }

    /// Camera zoom value matching a fractional level identifier.
    pub fn zoom_for_identifier(&self, identifier: f64) -> f64 {
        match &self.scheme {
            TilingScheme::Regular { .. } => {
                let (base_zoom, _) = regular::base_for(&self.coordinate_system);
                base_zoom / identifier.exp2()
            }
            TilingScheme::Irregular { .. } => {
                let levels = self.zoom_level_infos();
                irregular::zoom_for_identifier(&levels, identifier).unwrap_or(0.0)
            }
        }
    }
}

/// Bounds of tile `(x, y)` within `level`, following the direction of the
/// level bounds.
pub fn tile_bounds(level: &ZoomLevelInfo, x: u32, y: u32) -> RectCoord {
    let bounds = level.bounds;
    let system = bounds.system_identifier();
    let width = if bounds.top_left.x < bounds.bottom_right.x {
        level.tile_width
    } else {
        -level.tile_width
    };
    let height = if bounds.top_left.y < bounds.bottom_right.y {
        level.tile_width
    } else {
        -level.tile_width
    };

    let left = bounds.top_left.x + f64::from(x) * width;
    let top = bounds.top_left.y + f64::from(y) * height;
    RectCoord::new(
        Coord::flat(system, left, top),
        Coord::flat(system, left + width, top + height),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{EPSG_4326, WEB_MERCATOR_EXTENT};

    const OSM: &str = "https://tile.example.org/{z}/{x}/{y}.png";

    #[test]
    fn test_web_mercator_defaults() {
        let config = LayerTilingConfig::web_mercator("osm", OSM);
        let levels = config.zoom_level_infos();
        assert_eq!(levels.len(), 21);
        assert_eq!(config.level_range(), (0, 20));
        assert_eq!(config.system_identifier(), EPSG_3857);
        assert!(config.virtual_zoom_level_infos().is_empty());
    }

    #[test]
    fn test_regular_rejects_inverted_range() {
        let result = LayerTilingConfig::regular("a", OSM, CoordinateSystem::epsg3857(), 5, 2);
        assert_eq!(result.unwrap_err(), TilingError::InvalidLevelRange { min: 5, max: 2 });

        let too_deep = LayerTilingConfig::regular("a", OSM, CoordinateSystem::epsg3857(), 0, 31);
        assert!(matches!(too_deep, Err(TilingError::InvalidLevelRange { .. })));
    }

    #[test]
    fn test_regular_virtual_levels() {
        let config = LayerTilingConfig::regular("a", OSM, CoordinateSystem::epsg3857(), 3, 8).unwrap();
        let virtual_ids: Vec<i32> = config
            .virtual_zoom_level_infos()
            .iter()
            .map(|l| l.level_identifier)
            .collect();
        assert_eq!(virtual_ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_level_out_of_range() {
        let config = LayerTilingConfig::regular("a", OSM, CoordinateSystem::epsg3857(), 3, 8).unwrap();
        assert_eq!(
            config.level(9).unwrap_err(),
            TilingError::LevelOutOfRange {
                level: 9,
                min: 3,
                max: 8
            }
        );
        assert!(config.level(2).is_err());
        assert_eq!(config.level(5).unwrap().tile_count_x, 32);
    }

    #[test]
    fn test_tile_url_resolution() {
        let config = LayerTilingConfig::web_mercator("osm", "https://x/{z}/{x}/{y}.png");
        assert_eq!(config.tile_url(7, 9, 0, 4).unwrap(), "https://x/4/7/9.png");
        assert!(matches!(config.tile_url(0, 0, 0, 21), Err(TilingError::LevelOutOfRange { .. })));
    }

    #[test]
    fn test_bad_template_fails_only_on_resolution() {
        let config = LayerTilingConfig::web_mercator("broken", "https://x/{z}/{x}.png");
        assert_eq!(config.zoom_level_infos().len(), 21);
        assert!(matches!(
            config.tile_url(0, 0, 0, 0),
            Err(TilingError::Template(TemplateError::MissingToken { .. }))
        ));
    }

    #[test]
    fn test_bbox_template() {
        let config = LayerTilingConfig::web_mercator("wms", "https://wms/?BBOX={bbox-epsg-3857}");
        let url = config.tile_url(0, 0, 0, 1).unwrap();
        let expected = format!(
            "https://wms/?BBOX={},{},{},{}",
            -WEB_MERCATOR_EXTENT,
            WEB_MERCATOR_EXTENT - 20_037_508.0,
            -WEB_MERCATOR_EXTENT + 20_037_508.0,
            WEB_MERCATOR_EXTENT
        );
        assert_eq!(url, expected);
    }

    #[test]
    fn test_swiss_config() {
        let config = LayerTilingConfig::swiss_lv95("swiss", OSM);
        assert_eq!(config.level_range(), (0, 28));
        assert_eq!(config.zoom_level_infos().len(), 29);
        assert_eq!(config.level(17).unwrap().tile_count_x, 19);
    }

    #[test]
    fn test_irregular_level_subset() {
        let config = LayerTilingConfig::irregular(
            "subset",
            OSM,
            CoordinateSystem::epsg2056(),
            irregular::swiss_lv95(),
            vec![20, 16, 18, 16],
        )
        .unwrap();

        let ids: Vec<i32> = config.zoom_level_infos().iter().map(|l| l.level_identifier).collect();
        assert_eq!(ids, vec![16, 18, 20]);
        assert_eq!(config.virtual_zoom_level_infos().len(), 16);
        assert!(config.level(17).is_err());
        assert_eq!(config.level_range(), (16, 20));
    }

    #[test]
    fn test_irregular_validation() {
        let empty = LayerTilingConfig::irregular("e", OSM, CoordinateSystem::epsg2056(), irregular::swiss_lv95(), vec![]);
        assert_eq!(empty.unwrap_err(), TilingError::EmptyLevels);

        let out = LayerTilingConfig::irregular("o", OSM, CoordinateSystem::epsg2056(), irregular::swiss_lv95(), vec![29]);
        assert!(matches!(out, Err(TilingError::LevelOutOfRange { level: 29, .. })));
    }

    #[test]
    fn test_for_crs() {
        let swiss = LayerTilingConfig::for_crs("s", OSM, "EPSG:2056").unwrap();
        assert!(matches!(swiss.scheme(), TilingScheme::Irregular { .. }));

        let wgs = LayerTilingConfig::for_crs("w", OSM, "CRS84").unwrap();
        assert_eq!(wgs.system_identifier(), EPSG_4326);

        assert!(matches!(
            LayerTilingConfig::for_crs("x", OSM, "EPSG:9999"),
            Err(TilingError::Coord(CoordError::UnsupportedCrs(_)))
        ));
    }

    #[test]
    fn test_regular_zoom_identifier_roundtrip() {
        let config = LayerTilingConfig::web_mercator("osm", OSM);
        let zoom = config.zoom_for_identifier(10.0);
        assert!((config.zoom_identifier(zoom) - 10.0).abs() < 1e-9);
        assert_eq!(config.zoom_identifier(1e12), 0.0);
    }

    #[test]
    fn test_tile_bounds_follow_level_direction() {
        let level = irregular::swiss_lv95()[16];
        let tile = tile_bounds(&level, 1, 2);
        assert_eq!(tile.top_left.x, 2_420_000.0 + 64_000.0);
        assert_eq!(tile.top_left.y, 1_350_000.0 - 128_000.0);
        assert_eq!(tile.bottom_right.y, 1_350_000.0 - 192_000.0);
    }

    #[test]
    #[should_panic(expected = "coordinate system mismatch")]
    fn test_with_bounds_requires_layer_system() {
        let bounds = RectCoord::new(Coord::flat(EPSG_4326, 0.0, 1.0), Coord::flat(EPSG_4326, 1.0, 0.0));
        let _ = LayerTilingConfig::web_mercator("osm", OSM).with_bounds(bounds);
    }
}
