//! Drawable wrapper around one loaded raster tile.

use bytes::Bytes;

use crate::coord::RectCoord;
use crate::render::{MaskingObject, RenderObject};
use crate::source::{LoadedTile, TileAddress};
use crate::tiling::TileInfo;

/// A textured quad covering one tile. The renderer uploads `data` and draws
/// it over `tile.bounds`.
#[derive(Debug, Clone, PartialEq)]
pub struct TileQuad {
    tile: TileInfo,
    data: Bytes,
}

impl TileQuad {
    pub fn new(tile: TileInfo, data: Bytes) -> Self {
        Self { tile, data }
    }

    pub fn tile(&self) -> &TileInfo {
        &self.tile
    }

    pub fn address(&self) -> TileAddress {
        self.tile.address()
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

impl From<LoadedTile> for TileQuad {
    fn from(loaded: LoadedTile) -> Self {
        Self::new(loaded.tile, loaded.data)
    }
}

impl RenderObject for TileQuad {
    /// An empty payload has nothing to draw.
    fn is_ready(&self) -> bool {
        !self.data.is_empty()
    }
}

/// Rectangular mask limiting a pass to the bounds of one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileMask {
    bounds: RectCoord,
}

impl TileMask {
    pub fn new(bounds: RectCoord) -> Self {
        Self { bounds }
    }
}

impl MaskingObject for TileMask {
    fn is_ready(&self) -> bool {
        true
    }

    fn bounds(&self) -> Option<RectCoord> {
        Some(self.bounds)
    }
}
