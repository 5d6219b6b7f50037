//! Resolve the URL of one tile.

use serde_json::json;

use super::common::{print_json, GlobalOptions};
use crate::error::CliError;

/// Tile address given on the command line.
#[derive(Debug, Clone, Copy)]
pub struct TileArgs {
    pub level: i32,
    pub x: u32,
    pub y: u32,
    pub t: u32,
}

pub fn run(options: &GlobalOptions, layer: &str, tile: TileArgs) -> Result<(), CliError> {
    let config = options.load_config()?;
    let tiling = config.layer(layer)?;
    let url = tiling.tile_url(tile.x, tile.y, tile.t, tile.level)?;

    if options.json {
        return print_json(&json!({
            "layer": layer,
            "level": tile.level,
            "x": tile.x,
            "y": tile.y,
            "t": tile.t,
            "url": url,
        }));
    }
    println!("{}", url);
    Ok(())
}
