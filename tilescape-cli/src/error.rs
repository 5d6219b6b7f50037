//! CLI error handling with user-friendly messages.
//!
//! Every command returns [`CliError`]; `main` prints it and exits with
//! status 1.

use std::fmt;
use std::path::PathBuf;
use std::process;

use tilescape::config::ConfigFileError;
use tilescape::coord::CoordError;
use tilescape::source::{HttpLoaderError, SourceError};
use tilescape::tiling::TilingError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Configuration file could not be read, parsed or written
    Config(ConfigFileError),
    /// Invalid command-line argument
    Argument(String),
    /// Coordinate system lookup or conversion failed
    Coord(CoordError),
    /// Tile addressing failed
    Tiling(TilingError),
    /// Visible area could not be applied to a layer
    Source(SourceError),
    /// HTTP client could not be created
    Http(HttpLoaderError),
    /// Failed to write an output file
    FileWrite { path: PathBuf, error: std::io::Error },
    /// Failed to serialize JSON output
    Json(serde_json::Error),
}

impl CliError {
    /// Exit the process with an error message and code 1.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::Config(ConfigFileError::UnknownLayer(_)) = self {
            eprintln!();
            eprintln!("Run 'tilescape layers' to list configured layers.");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Argument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Coord(e) => write!(f, "Coordinate error: {}", e),
            CliError::Tiling(e) => write!(f, "Tiling error: {}", e),
            CliError::Source(e) => write!(f, "{}", e),
            CliError::Http(e) => write!(f, "{}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
            CliError::Json(e) => write!(f, "Failed to produce JSON: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::Coord(e) => Some(e),
            CliError::Tiling(e) => Some(e),
            CliError::Source(e) => Some(e),
            CliError::Http(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            CliError::Json(e) => Some(e),
            CliError::Argument(_) => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::Coord(e)
    }
}

impl From<TilingError> for CliError {
    fn from(e: TilingError) -> Self {
        CliError::Tiling(e)
    }
}

impl From<SourceError> for CliError {
    fn from(e: SourceError) -> Self {
        CliError::Source(e)
    }
}

impl From<HttpLoaderError> for CliError {
    fn from(e: HttpLoaderError) -> Self {
        CliError::Http(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}
