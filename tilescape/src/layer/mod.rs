//! Concrete map layers.

mod quad;
mod raster;

pub use quad::{TileMask, TileQuad};
pub use raster::{TiledRasterLayer, DEFAULT_RENDER_PASS_INDEX};
