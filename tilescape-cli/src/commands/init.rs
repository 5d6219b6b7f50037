//! Configuration initialization.

use std::path::Path;

use tilescape::config::{ConfigFile, LayerSettings};

use super::common::GlobalOptions;
use crate::error::CliError;

/// Configuration written by `tilescape init`: defaults plus one example layer.
pub fn example_config() -> ConfigFile {
    let mut config = ConfigFile::default();
    let mut osm = LayerSettings::new("osm", "https://tile.openstreetmap.org/{z}/{x}/{y}.png");
    osm.max_zoom = Some(19);
    config.layers.push(osm);
    config
}

/// Write the example configuration to `path` unless a file exists there.
/// Returns whether a file was written.
pub fn write_example(path: &Path, force: bool) -> Result<bool, CliError> {
    if path.exists() && !force {
        return Ok(false);
    }
    example_config().save_to(path)?;
    Ok(true)
}

pub fn run(options: &GlobalOptions, force: bool) -> Result<(), CliError> {
    let path = options.config_path();
    if write_example(&path, force)? {
        println!("Created {}", path.display());
    } else {
        println!("{} already exists (use --force to overwrite)", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("layers.ini");

        assert!(write_example(&path, false).unwrap());
        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, example_config());
        assert!(loaded.layer("osm").is_ok());
    }

    #[test]
    fn test_existing_file_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layers.ini");
        std::fs::write(&path, "[cache]\ncapacity = 8\n").unwrap();

        assert!(!write_example(&path, false).unwrap());
        assert_eq!(ConfigFile::load_from(&path).unwrap().cache.capacity, 8);

        assert!(write_example(&path, true).unwrap());
        assert_eq!(ConfigFile::load_from(&path).unwrap(), example_config());
    }
}
