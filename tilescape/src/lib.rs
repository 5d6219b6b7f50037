//! Tilescape - tiling, caching and pass composition core for 2D maps
//!
//! The crate decides which tiles of a layer are visible, where to fetch them,
//! keeps prepared tiles in a bounded frequency-ranked cache, and groups the
//! resulting drawables into ordered render and compute passes for a renderer.
//! Load failures and outstanding work are collected for status displays.
//!
//! Leaf to root:
//!
//! - [`coord`]: coordinate systems and conversions
//! - [`tiling`]: zoom levels, URL templates, visible tile selection
//! - [`cache`]: LFU eviction cache
//! - [`render`]: passes and layer capability traits
//! - [`activity`]: error and progress aggregation
//! - [`source`] and [`layer`]: loading pipeline and raster layer
//! - [`config`], [`log`], [`logging`]: configuration and diagnostics
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tilescape::cache::DEFAULT_CACHE_CAPACITY;
//! use tilescape::coord::CoordinateSystem;
//! use tilescape::layer::TiledRasterLayer;
//! use tilescape::render::{Layer, RenderPassProducer};
//! use tilescape::source::{LoaderResult, TileCache, TileLoader, TileSource};
//! use tilescape::tiling::{LayerTilingConfig, WEB_MERCATOR_BASE_ZOOM};
//!
//! let config = Arc::new(LayerTilingConfig::web_mercator("osm", "https://x/{z}/{x}/{y}.png"));
//! let loader: Arc<dyn TileLoader> = Arc::new(|_: &str, _: Option<&str>| LoaderResult::ok(vec![0u8; 4]));
//! let cache = Arc::new(TileCache::new(DEFAULT_CACHE_CAPACITY).unwrap());
//! let layer = TiledRasterLayer::new(Arc::new(TileSource::new(config, loader, cache)));
//!
//! let world = CoordinateSystem::epsg3857().bounds;
//! layer.on_visible_bounds_changed(&world, WEB_MERCATOR_BASE_ZOOM * 1.01).unwrap();
//! layer.source().load_due();
//! layer.update();
//!
//! let passes = layer.build_render_passes();
//! assert_eq!(passes[0].render_objects().len(), 1);
//! ```

pub mod activity;
pub mod cache;
pub mod config;
pub mod coord;
pub mod layer;
pub mod log;
pub mod logging;
pub mod render;
pub mod source;
pub mod tiling;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
