//! Records reported to the activity aggregator.

use std::fmt;

use serde::Serialize;

use crate::coord::RectCoord;

/// Outcome of one tile load as reported by a loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderStatus {
    /// Data was loaded.
    Ok,
    /// The loader did not handle the request; the next loader may.
    Noop,
    Error400,
    Error404,
    ErrorTimeout,
    ErrorNetwork,
    ErrorOther,
}

impl LoaderStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, LoaderStatus::Ok)
    }

    /// Whether the server answered that the tile does not exist. Such tiles
    /// are not requested again.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoaderStatus::Error400 | LoaderStatus::Error404)
    }

    /// Whether retrying the request later may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LoaderStatus::ErrorTimeout | LoaderStatus::ErrorNetwork | LoaderStatus::ErrorOther
        )
    }
}

impl fmt::Display for LoaderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoaderStatus::Ok => "ok",
            LoaderStatus::Noop => "noop",
            LoaderStatus::Error400 => "error 400",
            LoaderStatus::Error404 => "error 404",
            LoaderStatus::ErrorTimeout => "timeout",
            LoaderStatus::ErrorNetwork => "network error",
            LoaderStatus::ErrorOther => "error",
        };
        f.write_str(s)
    }
}

/// A failed tile request. Identity is the URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TiledLayerError {
    pub status: LoaderStatus,
    pub error_code: Option<String>,
    pub layer_name: String,
    pub url: String,
    pub is_recoverable: bool,
    pub bounds: Option<RectCoord>,
}

impl TiledLayerError {
    /// Build an error whose recoverability follows from `status`.
    pub fn new(status: LoaderStatus, layer_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            status,
            error_code: None,
            layer_name: layer_name.into(),
            url: url.into(),
            is_recoverable: status.is_recoverable(),
            bounds: None,
        }
    }

    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    pub fn with_bounds(mut self, bounds: RectCoord) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

impl fmt::Display for TiledLayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.layer_name, self.url, self.status)?;
        if let Some(code) = &self.error_code {
            write!(f, " [{}]", code)?;
        }
        Ok(())
    }
}

/// Outstanding work of one layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TasksProgressInfo {
    pub layer_name: String,
    /// Highest outstanding count seen since the layer last reached zero.
    pub max_count: usize,
    pub remaining_count: usize,
    /// `0.0..=1.0`; `1.0` once nothing is outstanding.
    pub progress: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(LoaderStatus::Ok.is_ok());
        assert!(LoaderStatus::Error404.is_not_found());
        assert!(LoaderStatus::Error400.is_not_found());
        assert!(!LoaderStatus::Error404.is_recoverable());
        assert!(LoaderStatus::ErrorTimeout.is_recoverable());
        assert!(LoaderStatus::ErrorNetwork.is_recoverable());
        assert!(LoaderStatus::ErrorOther.is_recoverable());
        assert!(!LoaderStatus::Noop.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let error = TiledLayerError::new(LoaderStatus::ErrorTimeout, "osm", "https://x/1/0/0.png").with_error_code("-1001");
        assert!(error.is_recoverable);
        assert_eq!(error.to_string(), "osm: https://x/1/0/0.png (timeout) [-1001]");
    }

    #[test]
    fn test_error_serializes_status_snake_case() {
        let error = TiledLayerError::new(LoaderStatus::ErrorNetwork, "osm", "u");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["status"], "error_network");
        assert_eq!(json["is_recoverable"], true);
    }
}
