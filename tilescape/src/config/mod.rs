//! Layer configuration file.
//!
//! Layers are declared in `~/.tilescape/layers.ini`, one
//! `[layer.<name>]` section each, next to `[cache]`, `[loader]` and
//! `[logging]` settings:
//!
//! ```ini
//! [cache]
//! capacity = 512
//!
//! [layer.osm]
//! url = https://tile.openstreetmap.org/{z}/{x}/{y}.png
//! crs = EPSG:3857
//! max_zoom = 19
//! ```
//!
//! A missing file means defaults and no layers.

mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    CacheSettings, ConfigFile, LayerSettings, LoaderSettings, LoggingSettings, SchemeKind, DEFAULT_CRS,
    DEFAULT_LOG_LEVEL,
};
