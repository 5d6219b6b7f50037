//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use serde::Serialize;
use tilescape::config::{config_file_path, ConfigFile};
use tilescape::coord::{resolve_identifier, Coord, RectCoord};

use crate::error::CliError;

/// Options every command accepts.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub json: bool,
}

impl GlobalOptions {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(config_file_path)
    }

    /// Load the configuration file; a missing file yields defaults.
    pub fn load_config(&self) -> Result<ConfigFile, CliError> {
        Ok(ConfigFile::load_from(&self.config_path())?)
    }
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse `x1,y1,x2,y2` into a rectangle in `crs`.
pub fn parse_bbox(bbox: &str, crs: &str) -> Result<RectCoord, CliError> {
    let values: Vec<f64> = bbox
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| CliError::Argument(format!("bbox '{}': {}", bbox, e)))?;
    let [x1, y1, x2, y2] = values[..] else {
        return Err(CliError::Argument(format!(
            "bbox '{}' must have four values x1,y1,x2,y2",
            bbox
        )));
    };
    let identifier = resolve_identifier(crs)?;
    Ok(RectCoord::new(
        Coord::flat(identifier, x1, y1),
        Coord::flat(identifier, x2, y2),
    ))
}
