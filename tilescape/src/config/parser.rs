//! `Ini` → [`ConfigFile`].
//!
//! Starts from the defaults and overlays every key found. Unknown keys are
//! ignored; malformed values fail with the section and key that held them.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use crate::tiling::{UrlTemplate, TOKEN_BBOX_3857};

use super::file::ConfigFileError;
use super::settings::{ConfigFile, LayerSettings, SchemeKind};

const LAYER_PREFIX: &str = "layer.";

pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("capacity") {
            let capacity: usize = parse_value("cache", "capacity", v)?;
            if capacity == 0 {
                return Err(invalid("cache", "capacity", v, "must be at least 1"));
            }
            config.cache.capacity = capacity;
        }
    }

    if let Some(section) = ini.section(Some("loader")) {
        if let Some(v) = section.get("timeout") {
            config.loader.timeout_secs = parse_value("loader", "timeout", v)?;
        }
    }

    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("level") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.level = v.to_string();
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = Some(expand_tilde(v));
            }
        }
    }

    for (name, section) in ini.iter() {
        let Some(layer) = name.and_then(|n| n.strip_prefix(LAYER_PREFIX)) else {
            continue;
        };
        if layer.is_empty() {
            return Err(invalid(name.unwrap_or_default(), "", "", "layer name is empty"));
        }
        if config.layers.iter().any(|l| l.name == layer) {
            return Err(invalid(name.unwrap_or_default(), "", "", "layer defined twice"));
        }
        config.layers.push(parse_layer(layer, section)?);
    }

    Ok(config)
}

fn parse_layer(name: &str, section: &Properties) -> Result<LayerSettings, ConfigFileError> {
    let section_name = format!("{}{}", LAYER_PREFIX, name);
    let s = section_name.as_str();

    let url = section
        .get("url")
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| invalid(s, "url", "", "a tile URL template is required"))?;
    if !url.contains(TOKEN_BBOX_3857) {
        UrlTemplate::new(url)
            .validate(false)
            .map_err(|e| invalid(s, "url", url, e))?;
    }

    let mut layer = LayerSettings::new(name, url);

    if let Some(v) = section.get("crs") {
        layer.crs = v.trim().to_string();
    }
    if let Some(v) = section.get("scheme") {
        layer.scheme = Some(match v.trim().to_ascii_lowercase().as_str() {
            "regular" => SchemeKind::Regular,
            "irregular" => SchemeKind::Irregular,
            _ => return Err(invalid(s, "scheme", v, "must be 'regular' or 'irregular'")),
        });
    }
    if let Some(v) = section.get("min_zoom") {
        layer.min_zoom = Some(parse_value(s, "min_zoom", v)?);
    }
    if let Some(v) = section.get("max_zoom") {
        layer.max_zoom = Some(parse_value(s, "max_zoom", v)?);
    }
    if let Some(v) = section.get("levels") {
        layer.levels = Some(parse_level_list(v).map_err(|reason| invalid(s, "levels", v, reason))?);
    }
    if let Some(v) = section.get("bounds") {
        layer.bounds = Some(parse_bounds(v).map_err(|reason| invalid(s, "bounds", v, reason))?);
    }

    let info = &mut layer.zoom_info;
    if let Some(v) = section.get("zoom_scale_factor") {
        let factor: f64 = parse_value(s, "zoom_scale_factor", v)?;
        if !(factor.is_finite() && factor > 0.0) {
            return Err(invalid(s, "zoom_scale_factor", v, "must be a positive number"));
        }
        info.zoom_level_scale_factor = factor;
    }
    if let Some(v) = section.get("draw_previous_layers") {
        info.num_draw_previous_layers = parse_value(s, "draw_previous_layers", v)?;
    }
    if let Some(v) = section.get("mask_tile") {
        info.mask_tile = parse_bool(s, "mask_tile", v)?;
    }
    if let Some(v) = section.get("underzoom") {
        info.underzoom = parse_bool(s, "underzoom", v)?;
    }
    if let Some(v) = section.get("overzoom") {
        info.overzoom = parse_bool(s, "overzoom", v)?;
    }

    Ok(layer)
}

fn invalid(section: &str, key: &str, value: &str, reason: impl ToString) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError>
where
    T: FromStr,
    T::Err: ToString,
{
    value.trim().parse().map_err(|e: T::Err| invalid(section, key, value, e))
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(section, key, value, "expected true or false")),
    }
}

/// `"0-3,7,9-10"` → `[0, 1, 2, 3, 7, 9, 10]`.
pub(super) fn parse_level_list(value: &str) -> Result<Vec<i32>, String> {
    let mut levels = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start: i32 = start.trim().parse().map_err(|_| format!("'{}' is not a level range", part))?;
                let end: i32 = end.trim().parse().map_err(|_| format!("'{}' is not a level range", part))?;
                if start > end {
                    return Err(format!("range '{}' is reversed", part));
                }
                levels.extend(start..=end);
            }
            None => levels.push(part.parse().map_err(|_| format!("'{}' is not a level", part))?),
        }
    }
    if levels.is_empty() {
        return Err("no levels given".to_string());
    }
    Ok(levels)
}

/// Inverse of [`parse_level_list`], collapsing consecutive runs.
pub(super) fn format_level_list(levels: &[i32]) -> String {
    let mut sorted = levels.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut parts = Vec::new();
    let mut iter = sorted.into_iter().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        parts.push(if start == end {
            start.to_string()
        } else {
            format!("{}-{}", start, end)
        });
    }
    parts.join(",")
}

fn parse_bounds(value: &str) -> Result<[f64; 4], String> {
    let numbers: Vec<f64> = value
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| e.to_string())?;
    match numbers.as_slice() {
        [x1, y1, x2, y2] => Ok([*x1, *y1, *x2, *y2]),
        _ => Err(format!("expected 4 numbers, got {}", numbers.len())),
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[cache]
capacity = 256

[loader]
timeout = 10

[logging]
level = tilescape=debug

[layer.osm]
url = https://tile.openstreetmap.org/{z}/{x}/{y}.png
crs = EPSG:3857
min_zoom = 0
max_zoom = 19
zoom_scale_factor = 1.5
draw_previous_layers = 1
mask_tile = true
overzoom = true
underzoom = false

[layer.swiss]
url = https://wmts.example.ch/{z}/{x}/{y}.jpeg
crs = EPSG:2056
scheme = irregular
levels = 0-3,20
"#;

    fn parse(text: &str) -> Result<ConfigFile, ConfigFileError> {
        ConfigFile::from_ini_str(text)
    }

    #[test]
    fn test_parse_sample() {
        let config = parse(SAMPLE).unwrap();
        assert_eq!(config.cache.capacity, 256);
        assert_eq!(config.loader.timeout_secs, 10);
        assert_eq!(config.logging.level, "tilescape=debug");
        assert_eq!(config.layer_names(), vec!["osm", "swiss"]);

        let osm = config.layer_settings("osm").unwrap();
        assert_eq!(osm.max_zoom, Some(19));
        assert_eq!(osm.zoom_info.zoom_level_scale_factor, 1.5);
        assert_eq!(osm.zoom_info.num_draw_previous_layers, 1);
        assert!(osm.zoom_info.mask_tile);

        let swiss = config.layer_settings("swiss").unwrap();
        assert_eq!(swiss.scheme, Some(SchemeKind::Irregular));
        assert_eq!(swiss.levels, Some(vec![0, 1, 2, 3, 20]));
        assert!(!swiss.zoom_info.mask_tile);

        assert_eq!(config.layer("osm").unwrap().zoom_level_infos().len(), 20);
        assert_eq!(config.layer("swiss").unwrap().zoom_level_infos().len(), 5);
        assert!(config.layer("osm").unwrap().zoom_info().mask_tile);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = parse("[cache]\ncapacity = 0\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { ref key, .. } if key == "capacity"));
    }

    #[test]
    fn test_missing_url_rejected() {
        let err = parse("[layer.osm]\ncrs = EPSG:3857\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { ref section, ref key, .. } if section == "layer.osm" && key == "url"));
    }

    #[test]
    fn test_template_missing_token_rejected() {
        let err = parse("[layer.osm]\nurl = https://x/{z}/{x}.png\n").unwrap_err();
        assert!(err.to_string().contains("{y}"));
    }

    #[test]
    fn test_bbox_template_accepted() {
        let config = parse("[layer.wms]\nurl = https://x/wms?bbox={bbox-epsg-3857}\n").unwrap();
        assert_eq!(config.layers.len(), 1);
    }

    #[test]
    fn test_bad_bool_rejected() {
        let err = parse("[layer.osm]\nurl = https://x/{z}/{x}/{y}.png\noverzoom = maybe\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { ref key, .. } if key == "overzoom"));
    }

    #[test]
    fn test_bad_number_rejected() {
        let err = parse("[layer.osm]\nurl = https://x/{z}/{x}/{y}.png\nmax_zoom = lots\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { ref key, .. } if key == "max_zoom"));
    }

    #[test]
    fn test_level_list() {
        assert_eq!(parse_level_list("0-2, 5 ,7-7").unwrap(), vec![0, 1, 2, 5, 7]);
        assert!(parse_level_list("3-1").is_err());
        assert!(parse_level_list("a").is_err());
        assert!(parse_level_list(" , ").is_err());
    }

    #[test]
    fn test_format_level_list() {
        assert_eq!(format_level_list(&[5, 0, 1, 2, 7, 7]), "0-2,5,7");
        assert_eq!(format_level_list(&[3]), "3");
    }

    #[test]
    fn test_bounds() {
        assert_eq!(parse_bounds("1, 2,3,4").unwrap(), [1.0, 2.0, 3.0, 4.0]);
        assert!(parse_bounds("1,2,3").is_err());
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/var/log/x.log"), PathBuf::from("/var/log/x.log"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/x.log"), home.join("x.log"));
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_level_list_roundtrip(levels in prop::collection::btree_set(0i32..40, 1..20)) {
                let levels: Vec<i32> = levels.into_iter().collect();
                let text = format_level_list(&levels);
                prop_assert_eq!(parse_level_list(&text).unwrap(), levels);
            }
        }
    }
}
