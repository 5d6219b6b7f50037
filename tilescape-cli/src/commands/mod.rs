//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`init`] - Write an example configuration
//! - [`layers`] - List layers and their zoom levels
//! - [`crs`] - Coordinate system lookup
//! - [`url`] - Resolve one tile URL
//! - [`cover`] - Tiles covering an area
//! - [`fetch`] - Download the tiles covering an area

pub mod common;
pub mod cover;
pub mod crs;
pub mod fetch;
pub mod init;
pub mod layers;
pub mod url;
