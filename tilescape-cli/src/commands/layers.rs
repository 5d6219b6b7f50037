//! Layer inspection commands: `layers` and `levels`.

use serde_json::json;
use tilescape::config::ConfigFile;
use tilescape::tiling::{LayerTilingConfig, TilingScheme};

use super::common::{print_json, GlobalOptions};
use crate::error::CliError;

fn scheme_name(config: &LayerTilingConfig) -> &'static str {
    match config.scheme() {
        TilingScheme::Regular { .. } => "regular",
        TilingScheme::Irregular { .. } => "irregular",
    }
}

/// List configured layers.
pub fn run_layers(options: &GlobalOptions) -> Result<(), CliError> {
    let config = options.load_config()?;
    let tilings = config
        .layer_names()
        .into_iter()
        .map(|name| config.layer(name))
        .collect::<Result<Vec<_>, _>>()?;

    if options.json {
        let entries: Vec<_> = tilings
            .iter()
            .map(|tiling| {
                let (min, max) = tiling.level_range();
                json!({
                    "name": tiling.layer_name(),
                    "url": tiling.url_template().as_str(),
                    "crs": tiling.system_identifier(),
                    "scheme": scheme_name(tiling),
                    "min_level": min,
                    "max_level": max,
                })
            })
            .collect();
        return print_json(&entries);
    }

    if tilings.is_empty() {
        println!("No layers configured in {}", options.config_path().display());
        println!("Run 'tilescape init' to create an example configuration.");
        return Ok(());
    }

    for tiling in &tilings {
        let (min, max) = tiling.level_range();
        println!("{}", tiling.layer_name());
        println!("  URL:    {}", tiling.url_template().as_str());
        println!("  CRS:    EPSG:{}", tiling.system_identifier());
        println!("  Scheme: {} (levels {}..={})", scheme_name(tiling), min, max);
    }
    Ok(())
}

/// Print the zoom levels of one layer, coarsest first.
pub fn run_levels(options: &GlobalOptions, layer: &str) -> Result<(), CliError> {
    let config: ConfigFile = options.load_config()?;
    let tiling = config.layer(layer)?;
    let levels = tiling.zoom_level_infos();

    if options.json {
        return print_json(&levels);
    }

    println!("{} ({} levels)", tiling.layer_name(), levels.len());
    println!("{:>5}  {:>18}  {:>14}  {:>10}", "level", "zoom", "tile width", "tiles");
    for level in &levels {
        println!(
            "{:>5}  {:>18.3}  {:>14.3}  {:>5}x{:<5}",
            level.level_identifier, level.zoom, level.tile_width, level.tile_count_x, level.tile_count_y
        );
    }
    Ok(())
}
