//! Coordinate system registry and conversion.
//!
//! Defines the [`Coord`] and [`RectCoord`] primitives used throughout the
//! crate, the fixed set of supported coordinate system identifiers, and a
//! [`ConversionHelper`] that dispatches point conversions to registered
//! converters.
//!
//! # Example
//!
//! ```
//! use tilescape::coord::{resolve_identifier, unit_to_meter_factor, EPSG_3857};
//!
//! let id = resolve_identifier("urn:ogc:def:crs:EPSG::3857").unwrap();
//! assert_eq!(id, EPSG_3857);
//! assert_eq!(unit_to_meter_factor(id).unwrap(), 1.0);
//! ```

mod convert;
mod system;
mod types;

pub use convert::{
    ConversionHelper, CoordinateConverter, Lv95ToWgs84, WebMercatorToLv95, WebMercatorToWgs84, Wgs84ToLv95,
    Wgs84ToWebMercator,
};
pub use system::{
    crs_name, resolve_identifier, unit_to_meter_factor, CoordinateSystem, EARTH_CIRCUMFERENCE_M,
    EPSG_2056, EPSG_21781, EPSG_3857, EPSG_4326, RENDER_SYSTEM, UNIT_SPHERE, WEB_MERCATOR_EXTENT,
};
pub use types::{Coord, CoordError, RectCoord};
