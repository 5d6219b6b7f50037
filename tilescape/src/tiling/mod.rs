//! Tile addressing.
//!
//! Turns a layer configuration into a list of zoom levels, selects the tiles
//! covering a view, and resolves tile addresses into fetch URLs.
//!
//! # Example
//!
//! ```
//! use tilescape::tiling::LayerTilingConfig;
//!
//! let config = LayerTilingConfig::web_mercator("osm", "https://x/{z}/{x}/{y}.png");
//! assert_eq!(config.zoom_level_infos().len(), 21);
//! assert_eq!(config.tile_url(7, 9, 0, 4).unwrap(), "https://x/4/7/9.png");
//! ```

mod config;
mod cover;
mod irregular;
mod regular;
mod template;
mod zoom;

pub use config::{tile_bounds, LayerTilingConfig, TilingError, TilingScheme, DEFAULT_MAX_LEVEL, TOKEN_BBOX_3857};
pub use cover::{draw_order, target_level_index, visible_tiles, PrioritizedTile, TileInfo, PRIORITY_RANGE};
pub use irregular::{
    swiss_lv03, swiss_lv95, zoom_for_identifier, zoom_identifier_for, SWISS_LV03_ORIGIN, SWISS_LV95_ORIGIN,
    SWISS_MAX_LEVEL,
};
pub use regular::{
    base_for, regular_level, regular_levels, MAX_REGULAR_LEVEL, WEB_MERCATOR_BASE_WIDTH, WEB_MERCATOR_BASE_ZOOM,
    WGS84_BASE_WIDTH, WGS84_BASE_ZOOM,
};
pub use template::{TemplateError, UrlTemplate, TOKEN_T, TOKEN_X, TOKEN_Y, TOKEN_Z};
pub use zoom::{sorted_by_identifier, sorted_by_zoom, ZoomInfo, ZoomLevelInfo};
