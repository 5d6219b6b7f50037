//! Cache keys for tile artifacts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tiling::TileInfo;

/// Identifies one cached tile artifact: the layer it belongs to and its
/// address within the layer's tile pyramid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileFingerprint {
    pub layer: String,
    pub level: i32,
    pub x: u32,
    pub y: u32,
    pub t: u32,
}

impl TileFingerprint {
    pub fn new(layer: impl Into<String>, level: i32, x: u32, y: u32, t: u32) -> Self {
        Self {
            layer: layer.into(),
            level,
            x,
            y,
            t,
        }
    }

    /// Fingerprint of `tile` within `layer`.
    pub fn for_tile(layer: &str, tile: &TileInfo) -> Self {
        Self::new(layer, tile.level_identifier, tile.x, tile.y, tile.t)
    }
}

impl fmt::Display for TileFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}@{}", self.layer, self.level, self.x, self.y, self.t)
    }
}
