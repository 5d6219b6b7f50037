//! Typed configuration values and their defaults.

use std::path::PathBuf;

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::coord::{resolve_identifier, Coord, CoordinateSystem, RectCoord, EPSG_2056, EPSG_21781};
use crate::source::DEFAULT_TIMEOUT_SECS;
use crate::tiling::{swiss_lv03, swiss_lv95, LayerTilingConfig, ZoomInfo, DEFAULT_MAX_LEVEL, SWISS_MAX_LEVEL};

use super::file::ConfigFileError;

/// Default log filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default CRS of a layer without a `crs` key.
pub const DEFAULT_CRS: &str = "EPSG:3857";

/// Whole configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub cache: CacheSettings,
    pub loader: LoaderSettings,
    pub logging: LoggingSettings,
    /// In file order.
    pub layers: Vec<LayerSettings>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            cache: CacheSettings {
                capacity: DEFAULT_CACHE_CAPACITY,
            },
            loader: LoaderSettings {
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            },
            logging: LoggingSettings {
                level: DEFAULT_LOG_LEVEL.to_string(),
                file: None,
            },
            layers: Vec::new(),
        }
    }
}

impl ConfigFile {
    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name.as_str()).collect()
    }

    pub fn layer_settings(&self, name: &str) -> Option<&LayerSettings> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Build the tiling configuration of layer `name`.
    ///
    /// # Errors
    ///
    /// - [`ConfigFileError::UnknownLayer`] if no such layer is configured
    /// - [`ConfigFileError::InvalidValue`] if its settings do not describe a
    ///   valid tiling
    pub fn layer(&self, name: &str) -> Result<LayerTilingConfig, ConfigFileError> {
        self.layer_settings(name)
            .ok_or_else(|| ConfigFileError::UnknownLayer(name.to_string()))?
            .to_tiling_config()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Maximum number of cached tiles; at least 1.
    pub capacity: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoaderSettings {
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub level: String,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeKind {
    Regular,
    Irregular,
}

impl SchemeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemeKind::Regular => "regular",
            SchemeKind::Irregular => "irregular",
        }
    }
}

/// One `[layer.<name>]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSettings {
    pub name: String,
    pub url: String,
    pub crs: String,
    /// `None` picks the natural scheme of the CRS.
    pub scheme: Option<SchemeKind>,
    pub min_zoom: Option<u32>,
    pub max_zoom: Option<u32>,
    /// Level indices of an irregular scheme.
    pub levels: Option<Vec<i32>>,
    pub zoom_info: ZoomInfo,
    /// `x1, y1, x2, y2` (top-left, bottom-right) in the layer system.
    pub bounds: Option<[f64; 4]>,
}

impl LayerSettings {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            crs: DEFAULT_CRS.to_string(),
            scheme: None,
            min_zoom: None,
            max_zoom: None,
            levels: None,
            zoom_info: ZoomInfo::default(),
            bounds: None,
        }
    }

    pub fn section_name(&self) -> String {
        format!("layer.{}", self.name)
    }

    fn invalid(&self, key: &str, value: impl Into<String>, reason: impl ToString) -> ConfigFileError {
        ConfigFileError::InvalidValue {
            section: self.section_name(),
            key: key.to_string(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    /// Build the [`LayerTilingConfig`] these settings describe.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigFileError::InvalidValue`] naming the offending key.
    pub fn to_tiling_config(&self) -> Result<LayerTilingConfig, ConfigFileError> {
        let identifier = resolve_identifier(&self.crs).map_err(|e| self.invalid("crs", self.crs.clone(), e))?;
        let system = CoordinateSystem::for_identifier(identifier).map_err(|e| self.invalid("crs", self.crs.clone(), e))?;
        let swiss = identifier == EPSG_2056 || identifier == EPSG_21781;

        let scheme = self.scheme.unwrap_or(if swiss {
            SchemeKind::Irregular
        } else {
            SchemeKind::Regular
        });

        let config = match scheme {
            SchemeKind::Regular => {
                let min = self.min_zoom.unwrap_or(0);
                let max = self.max_zoom.unwrap_or(DEFAULT_MAX_LEVEL);
                LayerTilingConfig::regular(self.name.clone(), self.url.as_str(), system, min, max)
                    .map_err(|e| self.invalid("max_zoom", max.to_string(), e))?
            }
            SchemeKind::Irregular => {
                let table = match identifier {
                    EPSG_2056 => swiss_lv95(),
                    EPSG_21781 => swiss_lv03(),
                    _ => {
                        return Err(self.invalid(
                            "scheme",
                            "irregular",
                            "irregular tiling is only available for EPSG:2056 and EPSG:21781",
                        ))
                    }
                };
                let levels = self.levels.clone().unwrap_or_else(|| (0..=SWISS_MAX_LEVEL).collect());
                let value = levels.iter().map(i32::to_string).collect::<Vec<_>>().join(",");
                LayerTilingConfig::irregular(self.name.clone(), self.url.as_str(), system, table, levels)
                    .map_err(|e| self.invalid("levels", value, e))?
            }
        };

        let mut config = config.with_zoom_info(self.zoom_info);
        if let Some([x1, y1, x2, y2]) = self.bounds {
            config = config.with_bounds(RectCoord::new(
                Coord::flat(identifier, x1, y1),
                Coord::flat(identifier, x2, y2),
            ));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiling::TilingScheme;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();
        assert_eq!(config.cache.capacity, DEFAULT_CACHE_CAPACITY);
        assert_eq!(config.loader.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.logging.level, "info");
        assert!(config.layers.is_empty());
    }

    #[test]
    fn test_regular_layer_defaults() {
        let settings = LayerSettings::new("osm", "https://x/{z}/{x}/{y}.png");
        let config = settings.to_tiling_config().unwrap();
        assert_eq!(config.level_range(), (0, DEFAULT_MAX_LEVEL as i32));
        assert_eq!(config.system_identifier(), 3857);
    }

    #[test]
    fn test_swiss_layer_defaults_to_irregular() {
        let mut settings = LayerSettings::new("swiss", "https://x/{z}/{x}/{y}.jpeg");
        settings.crs = "EPSG:2056".to_string();
        settings.levels = Some(vec![20, 18, 19]);
        let config = settings.to_tiling_config().unwrap();
        match config.scheme() {
            TilingScheme::Irregular { levels, .. } => assert_eq!(levels, &vec![18, 19, 20]),
            other => panic!("unexpected scheme {:?}", other),
        }
    }

    #[test]
    fn test_irregular_needs_swiss_crs() {
        let mut settings = LayerSettings::new("osm", "https://x/{z}/{x}/{y}.png");
        settings.scheme = Some(SchemeKind::Irregular);
        let err = settings.to_tiling_config().unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { ref key, .. } if key == "scheme"));
    }

    #[test]
    fn test_unknown_crs_names_key() {
        let mut settings = LayerSettings::new("osm", "https://x/{z}/{x}/{y}.png");
        settings.crs = "EPSG:9999".to_string();
        let err = settings.to_tiling_config().unwrap_err();
        assert!(err.to_string().contains("layer.osm.crs"));
    }

    #[test]
    fn test_bad_zoom_range() {
        let mut settings = LayerSettings::new("osm", "https://x/{z}/{x}/{y}.png");
        settings.min_zoom = Some(10);
        settings.max_zoom = Some(5);
        assert!(settings.to_tiling_config().is_err());
    }

    #[test]
    fn test_bounds_apply() {
        let mut settings = LayerSettings::new("osm", "https://x/{z}/{x}/{y}.png");
        settings.bounds = Some([0.0, 100.0, 100.0, 0.0]);
        let config = settings.to_tiling_config().unwrap();
        let bounds = config.bounds().unwrap();
        assert_eq!(bounds.top_left.x, 0.0);
        assert_eq!(bounds.bottom_right.x, 100.0);
    }

    #[test]
    fn test_unknown_layer() {
        let config = ConfigFile::default();
        assert!(matches!(config.layer("nope"), Err(ConfigFileError::UnknownLayer(_))));
    }
}
