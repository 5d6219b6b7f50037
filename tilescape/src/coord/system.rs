//! Coordinate system identifiers and the fixed registry of supported systems.
//!
//! Identifiers are stable integers. Projected and geographic systems use their
//! EPSG code; the unit sphere used for globe rendering is a sentinel with the
//! high bit set so it can never collide with a numeric EPSG code.

use std::f64::consts::PI;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::types::{Coord, CoordError, RectCoord};

/// Internal render system (screen/render space). Has no meter scaling.
pub const RENDER_SYSTEM: i32 = 0;

/// Web Mercator.
pub const EPSG_3857: i32 = 3857;

/// WGS84 geographic (degrees).
pub const EPSG_4326: i32 = 4326;

/// Swiss LV95.
pub const EPSG_2056: i32 = 2056;

/// Swiss LV03.
pub const EPSG_21781: i32 = 21781;

/// Unit sphere used by the globe renderer.
pub const UNIT_SPHERE: i32 = 0x8000_0000_u32 as i32;

/// Equatorial circumference used for meter scaling of angular systems.
pub const EARTH_CIRCUMFERENCE_M: f64 = 40_075_017.0;

/// Half the width of the Web Mercator square, in meters.
pub const WEB_MERCATOR_EXTENT: f64 = 20_037_508.34;

fn epsg_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(?:urn:ogc:def:crs:)?epsg:(?:[0-9.]*:)?(\d+)$")
            .expect("EPSG pattern is a valid regex")
    })
}

fn crs84_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(?:urn:ogc:def:crs:ogc:1\.3:)?crs84$")
            .expect("CRS84 pattern is a valid regex")
    })
}

/// Resolve a CRS string to a coordinate system identifier.
///
/// Accepted forms (case-insensitive):
/// - `EPSG:3857`, `EPSG::3857`
/// - `urn:ogc:def:crs:EPSG::2056`, `urn:ogc:def:crs:EPSG:6.3:21781`
/// - `urn:ogc:def:crs:OGC:1.3:CRS84` / `CRS84` (maps to 4326)
/// - legacy Web Mercator aliases `900913`, `3785`, `102100`, `102113`
///
/// # Errors
///
/// Returns [`CoordError::UnsupportedCrs`] for anything else.
pub fn resolve_identifier(crs: &str) -> Result<i32, CoordError> {
    let trimmed = crs.trim();

    if crs84_pattern().is_match(trimmed) {
        return Ok(EPSG_4326);
    }

    let code = epsg_pattern()
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .ok_or_else(|| CoordError::UnsupportedCrs(crs.to_string()))?;

    match code {
        3857 | 900913 | 3785 | 102100 | 102113 => Ok(EPSG_3857),
        4326 => Ok(EPSG_4326),
        2056 => Ok(EPSG_2056),
        21781 => Ok(EPSG_21781),
        _ => Err(CoordError::UnsupportedCrs(crs.to_string())),
    }
}

/// Meters represented by one unit of the given coordinate system.
///
/// # Errors
///
/// Returns [`CoordError::UnsupportedCoordinateSystem`] for the render system
/// and for any identifier outside the registry. There is no silent default.
pub fn unit_to_meter_factor(identifier: i32) -> Result<f64, CoordError> {
    match identifier {
        EPSG_3857 | EPSG_2056 | EPSG_21781 => Ok(1.0),
        EPSG_4326 => Ok(EARTH_CIRCUMFERENCE_M / 360.0),
        UNIT_SPHERE => Ok(EARTH_CIRCUMFERENCE_M / (2.0 * PI)),
        other => Err(CoordError::UnsupportedCoordinateSystem(other)),
    }
}

/// Canonical `EPSG:<code>` name, if the identifier has one.
pub fn crs_name(identifier: i32) -> Option<&'static str> {
    match identifier {
        EPSG_3857 => Some("EPSG:3857"),
        EPSG_4326 => Some("EPSG:4326"),
        EPSG_2056 => Some("EPSG:2056"),
        EPSG_21781 => Some("EPSG:21781"),
        _ => None,
    }
}

/// A named coordinate space with its valid extent and meter scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSystem {
    pub identifier: i32,
    pub bounds: RectCoord,
    /// Meters per coordinate unit.
    pub unit_to_meter_factor: f64,
}

impl CoordinateSystem {
    /// Create a custom coordinate system.
    ///
    /// # Panics
    ///
    /// Panics if `bounds` is expressed in a different system than `identifier`.
    #[track_caller]
    pub fn new(identifier: i32, bounds: RectCoord, unit_to_meter_factor: f64) -> Self {
        assert_eq!(
            bounds.system_identifier(),
            identifier,
            "coordinate system mismatch: bounds use {} but system is {}",
            bounds.system_identifier(),
            identifier
        );
        Self {
            identifier,
            bounds,
            unit_to_meter_factor,
        }
    }

    /// Look up one of the built-in systems.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError::UnsupportedCoordinateSystem`] if the identifier
    /// has no built-in definition.
    pub fn for_identifier(identifier: i32) -> Result<Self, CoordError> {
        match identifier {
            EPSG_3857 => Ok(Self::epsg3857()),
            EPSG_4326 => Ok(Self::epsg4326()),
            EPSG_2056 => Ok(Self::epsg2056()),
            EPSG_21781 => Ok(Self::epsg21781()),
            UNIT_SPHERE => Ok(Self::unit_sphere()),
            other => Err(CoordError::UnsupportedCoordinateSystem(other)),
        }
    }

    /// Resolve a CRS string and return the matching built-in system.
    pub fn from_crs(crs: &str) -> Result<Self, CoordError> {
        Self::for_identifier(resolve_identifier(crs)?)
    }

    pub fn epsg3857() -> Self {
        Self::with_corners(
            EPSG_3857,
            (-WEB_MERCATOR_EXTENT, WEB_MERCATOR_EXTENT),
            (WEB_MERCATOR_EXTENT, -WEB_MERCATOR_EXTENT),
        )
    }

    pub fn epsg4326() -> Self {
        Self::with_corners(EPSG_4326, (-180.0, 90.0), (180.0, -90.0))
    }

    pub fn epsg2056() -> Self {
        Self::with_corners(EPSG_2056, (2_485_000.0, 1_300_000.0), (2_840_000.0, 1_070_000.0))
    }

    pub fn epsg21781() -> Self {
        Self::with_corners(EPSG_21781, (485_000.0, 300_000.0), (840_000.0, 70_000.0))
    }

    /// Unit sphere: x spans one turn of longitude, y half a turn of latitude.
    pub fn unit_sphere() -> Self {
        let bounds = RectCoord::new(
            Coord::new(UNIT_SPHERE, -2.0 * PI, 0.0, 0.0),
            Coord::new(UNIT_SPHERE, 0.0, -PI, 3.0),
        );
        Self {
            identifier: UNIT_SPHERE,
            bounds,
            unit_to_meter_factor: EARTH_CIRCUMFERENCE_M / (2.0 * PI),
        }
    }

    fn with_corners(identifier: i32, top_left: (f64, f64), bottom_right: (f64, f64)) -> Self {
        let bounds = RectCoord::new(
            Coord::flat(identifier, top_left.0, top_left.1),
            Coord::flat(identifier, bottom_right.0, bottom_right.1),
        );
        // Built-in identifiers always have a factor.
        let unit_to_meter_factor = unit_to_meter_factor(identifier).unwrap_or(1.0);
        Self {
            identifier,
            bounds,
            unit_to_meter_factor,
        }
    }
}
