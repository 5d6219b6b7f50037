//! Tile loading.
//!
//! A [`TileSource`] tracks the tiles of one layer from "visible" to "ready",
//! consulting the shared [`TileCache`] before asking a [`TileLoader`].
//! [`HttpTileLoader`] is the stock loader for `http(s)` templates; other
//! transports implement [`TileLoader`] and can be combined in a
//! [`LoaderChain`].

mod http;
mod loader;
mod retry;
mod tile_source;

pub use http::{classify_status, HttpLoaderError, HttpTileLoader, DEFAULT_TIMEOUT_SECS};
pub use loader::{LoaderChain, LoaderResult, TileLoader};
pub use retry::{RetryState, MAX_RETRY_DELAY, MIN_RETRY_DELAY};
pub use tile_source::{CachedTile, LoadedTile, SourceError, TileAddress, TileCache, TileSource};
