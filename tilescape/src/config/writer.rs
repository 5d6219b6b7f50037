//! [`ConfigFile`] → commented INI text.

use std::fmt::Write as _;

use super::parser::format_level_list;
use super::settings::{ConfigFile, LayerSettings};

pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let log_file = config
        .logging
        .file
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut out = format!(
        r#"[cache]
; Maximum number of tiles kept in memory (least frequently used are evicted)
capacity = {}

[loader]
; HTTP request timeout in seconds
timeout = {}

[logging]
; Filter used when RUST_LOG is not set, e.g. info or tilescape=debug
level = {}
; Optional log file, truncated on startup
file = {}
"#,
        config.cache.capacity, config.loader.timeout_secs, config.logging.level, log_file
    );

    for layer in &config.layers {
        out.push('\n');
        write_layer(&mut out, layer);
    }
    out
}

fn write_layer(out: &mut String, layer: &LayerSettings) {
    let info = &layer.zoom_info;
    // writing into a String cannot fail
    let _ = writeln!(out, "[{}]", layer.section_name());
    let _ = writeln!(out, "url = {}", layer.url);
    let _ = writeln!(out, "crs = {}", layer.crs);
    if let Some(scheme) = layer.scheme {
        let _ = writeln!(out, "scheme = {}", scheme.as_str());
    }
    if let Some(min) = layer.min_zoom {
        let _ = writeln!(out, "min_zoom = {}", min);
    }
    if let Some(max) = layer.max_zoom {
        let _ = writeln!(out, "max_zoom = {}", max);
    }
    if let Some(levels) = &layer.levels {
        let _ = writeln!(out, "levels = {}", format_level_list(levels));
    }
    if let Some([x1, y1, x2, y2]) = layer.bounds {
        let _ = writeln!(out, "bounds = {},{},{},{}", x1, y1, x2, y2);
    }
    let _ = writeln!(out, "zoom_scale_factor = {}", info.zoom_level_scale_factor);
    let _ = writeln!(out, "draw_previous_layers = {}", info.num_draw_previous_layers);
    let _ = writeln!(out, "mask_tile = {}", info.mask_tile);
    let _ = writeln!(out, "underzoom = {}", info.underzoom);
    let _ = writeln!(out, "overzoom = {}", info.overzoom);
}
