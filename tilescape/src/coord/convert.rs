//! Point conversion between coordinate systems.
//!
//! Converters are registered per `(from, to)` pair. A pair without a direct
//! converter is resolved through at most two intermediate systems; the
//! resulting chain is cached until the next registration.
//!
//! The Swiss LV95 converters use the swisstopo approximation formulas, which
//! agree with the rigorous projection to about one meter inside Switzerland.

use std::f64::consts::PI;
use std::sync::Arc;

use dashmap::DashMap;

use super::system::{EPSG_2056, EPSG_3857, EPSG_4326, WEB_MERCATOR_EXTENT};
use super::types::{Coord, CoordError, RectCoord};

/// Converts single points from one coordinate system into another.
pub trait CoordinateConverter: Send + Sync {
    /// Source system identifier.
    fn from_identifier(&self) -> i32;

    /// Target system identifier.
    fn to_identifier(&self) -> i32;

    /// Convert a point. Callers guarantee `coord` is in the source system.
    fn convert(&self, coord: &Coord) -> Coord;
}

/// Longest converter chain tried for pairs without a direct converter.
const MAX_CHAIN_LEN: usize = 3;

/// Registry of converters keyed by `(from, to)`.
///
/// Safe to share across threads; registration and lookup never block each
/// other for unrelated pairs.
#[derive(Default)]
pub struct ConversionHelper {
    converters: DashMap<(i32, i32), Arc<dyn CoordinateConverter>>,
    chains: DashMap<(i32, i32), Option<Arc<dyn CoordinateConverter>>>,
}

impl std::fmt::Debug for ConversionHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut pairs: Vec<(i32, i32)> = self.converters.iter().map(|e| *e.key()).collect();
        pairs.sort_unstable();
        f.debug_struct("ConversionHelper")
            .field("pairs", &pairs)
            .finish()
    }
}

impl ConversionHelper {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in converters: WGS84 / Web Mercator
    /// in both directions, WGS84 / LV95 in both directions and Web Mercator
    /// to LV95.
    pub fn with_defaults() -> Self {
        let helper = Self::new();
        helper.register(Arc::new(Wgs84ToWebMercator));
        helper.register(Arc::new(WebMercatorToWgs84));
        helper.register(Arc::new(Wgs84ToLv95));
        helper.register(Arc::new(Lv95ToWgs84));
        helper.register(Arc::new(WebMercatorToLv95));
        helper
    }

    /// Register (or replace) the converter for its `(from, to)` pair.
    pub fn register(&self, converter: Arc<dyn CoordinateConverter>) {
        let key = (converter.from_identifier(), converter.to_identifier());
        self.converters.insert(key, converter);
        self.chains.clear();
    }

    /// Whether a conversion from `from` to `to` is possible, directly or
    /// through intermediate systems.
    pub fn can_convert(&self, from: i32, to: i32) -> bool {
        from == to || self.converter_for(from, to).is_some()
    }

    /// Direct converter for the pair, else the cached or newly resolved chain.
    fn converter_for(&self, from: i32, to: i32) -> Option<Arc<dyn CoordinateConverter>> {
        if let Some(direct) = self.converters.get(&(from, to)) {
            return Some(Arc::clone(direct.value()));
        }
        if let Some(cached) = self.chains.get(&(from, to)) {
            return cached.value().clone();
        }
        let resolved = self.resolve_chain(from, to);
        self.chains.insert((from, to), resolved.clone());
        resolved
    }

    /// Breadth-first search for the shortest chain of registered converters.
    /// Candidates are visited in ascending pair order so the result does not
    /// depend on registration order.
    fn resolve_chain(&self, from: i32, to: i32) -> Option<Arc<dyn CoordinateConverter>> {
        let mut edges: Vec<Arc<dyn CoordinateConverter>> =
            self.converters.iter().map(|e| Arc::clone(e.value())).collect();
        edges.sort_unstable_by_key(|c| (c.from_identifier(), c.to_identifier()));

        let mut paths: Vec<Vec<Arc<dyn CoordinateConverter>>> = vec![Vec::new()];
        for _ in 0..MAX_CHAIN_LEN {
            let mut next = Vec::new();
            for path in &paths {
                let at = path.last().map_or(from, |c| c.to_identifier());
                for edge in edges.iter().filter(|c| c.from_identifier() == at) {
                    let end = edge.to_identifier();
                    if end == from || path.iter().any(|c| c.to_identifier() == end) {
                        continue;
                    }
                    let mut extended = path.clone();
                    extended.push(Arc::clone(edge));
                    if end == to {
                        return Some(Arc::new(ConverterChain { steps: extended }));
                    }
                    next.push(extended);
                }
            }
            paths = next;
        }
        None
    }

    /// Convert `coord` into the system `to`.
    ///
    /// Identity conversions return the coordinate unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError::NoConverter`] if neither a registered converter
    /// nor a chain of up to three converters connects the two systems.
    pub fn convert(&self, to: i32, coord: &Coord) -> Result<Coord, CoordError> {
        let from = coord.system_identifier;
        if from == to {
            return Ok(*coord);
        }
        let converter = self
            .converter_for(from, to)
            .ok_or(CoordError::NoConverter { from, to })?;
        Ok(converter.convert(coord))
    }

    /// Convert both corners of a rectangle.
    pub fn convert_rect(&self, to: i32, rect: &RectCoord) -> Result<RectCoord, CoordError> {
        let top_left = self.convert(to, &rect.top_left)?;
        let bottom_right = self.convert(to, &rect.bottom_right)?;
        Ok(RectCoord::new(top_left, bottom_right))
    }
}

/// Converters applied one after another.
struct ConverterChain {
    steps: Vec<Arc<dyn CoordinateConverter>>,
}

impl CoordinateConverter for ConverterChain {
    fn from_identifier(&self) -> i32 {
        self.steps.first().map_or(0, |c| c.from_identifier())
    }

    fn to_identifier(&self) -> i32 {
        self.steps.last().map_or(0, |c| c.to_identifier())
    }

    fn convert(&self, coord: &Coord) -> Coord {
        self.steps.iter().fold(*coord, |c, step| step.convert(&c))
    }
}

fn mercator_to_degrees(x: f64, y: f64) -> (f64, f64) {
    let lon = x / WEB_MERCATOR_EXTENT * 180.0;
    let lat_rad = (y / WEB_MERCATOR_EXTENT * PI).sinh().atan();
    (lon, lat_rad * 180.0 / PI)
}

/// Degrees to LV95 easting and northing.
fn degrees_to_lv95(lon: f64, lat: f64) -> (f64, f64) {
    // offsets from Bern in units of 10000 arc seconds
    let phi = (lat * 3600.0 - 169_028.66) / 10_000.0;
    let lambda = (lon * 3600.0 - 26_782.5) / 10_000.0;

    let east = 2_600_072.37 + 211_455.93 * lambda
        - 10_938.51 * lambda * phi
        - 0.36 * lambda * phi * phi
        - 44.54 * lambda.powi(3);
    let north = 1_200_147.07 + 308_807.95 * phi + 3_745.25 * lambda * lambda + 76.63 * phi * phi
        - 194.56 * lambda * lambda * phi
        + 119.79 * phi.powi(3);
    (east, north)
}

/// LV95 easting and northing to degrees.
fn lv95_to_degrees(east: f64, north: f64) -> (f64, f64) {
    // offsets from Bern in units of 1000 km
    let y = (east - 2_600_000.0) / 1_000_000.0;
    let x = (north - 1_200_000.0) / 1_000_000.0;

    let lat = 16.902_389_2 + 3.238_272 * x
        - 0.270_978 * y * y
        - 0.002_528 * x * x
        - 0.0447 * y * y * x
        - 0.0140 * x.powi(3);
    let lon = 2.677_909_4 + 4.728_982 * y + 0.791_484 * y * x + 0.1306 * y * x * x - 0.0436 * y.powi(3);
    // 10000 arc seconds to degrees
    (lon * 100.0 / 36.0, lat * 100.0 / 36.0)
}

/// EPSG:4326 (degrees) to EPSG:3857 (meters), spherical Mercator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wgs84ToWebMercator;

impl CoordinateConverter for Wgs84ToWebMercator {
    fn from_identifier(&self) -> i32 {
        EPSG_4326
    }

    fn to_identifier(&self) -> i32 {
        EPSG_3857
    }

    fn convert(&self, coord: &Coord) -> Coord {
        let x = coord.x / 180.0 * WEB_MERCATOR_EXTENT;
        let lat_rad = coord.y * PI / 180.0;
        let y = lat_rad.tan().asinh() / PI * WEB_MERCATOR_EXTENT;
        Coord::new(EPSG_3857, x, y, coord.z)
    }
}

/// EPSG:3857 (meters) to EPSG:4326 (degrees), spherical Mercator.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercatorToWgs84;

impl CoordinateConverter for WebMercatorToWgs84 {
    fn from_identifier(&self) -> i32 {
        EPSG_3857
    }

    fn to_identifier(&self) -> i32 {
        EPSG_4326
    }

    fn convert(&self, coord: &Coord) -> Coord {
        let (lon, lat) = mercator_to_degrees(coord.x, coord.y);
        Coord::new(EPSG_4326, lon, lat, coord.z)
    }
}

/// EPSG:4326 (degrees) to EPSG:2056 (Swiss LV95 meters).
#[derive(Debug, Clone, Copy, Default)]
pub struct Wgs84ToLv95;

impl CoordinateConverter for Wgs84ToLv95 {
    fn from_identifier(&self) -> i32 {
        EPSG_4326
    }

    fn to_identifier(&self) -> i32 {
        EPSG_2056
    }

    fn convert(&self, coord: &Coord) -> Coord {
        let (east, north) = degrees_to_lv95(coord.x, coord.y);
        Coord::new(EPSG_2056, east, north, coord.z)
    }
}

/// EPSG:2056 (Swiss LV95 meters) to EPSG:4326 (degrees).
#[derive(Debug, Clone, Copy, Default)]
pub struct Lv95ToWgs84;

impl CoordinateConverter for Lv95ToWgs84 {
    fn from_identifier(&self) -> i32 {
        EPSG_2056
    }

    fn to_identifier(&self) -> i32 {
        EPSG_4326
    }

    fn convert(&self, coord: &Coord) -> Coord {
        let (lon, lat) = lv95_to_degrees(coord.x, coord.y);
        Coord::new(EPSG_4326, lon, lat, coord.z)
    }
}

/// EPSG:3857 (meters) to EPSG:2056 (Swiss LV95 meters).
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercatorToLv95;

impl CoordinateConverter for WebMercatorToLv95 {
    fn from_identifier(&self) -> i32 {
        EPSG_3857
    }

    fn to_identifier(&self) -> i32 {
        EPSG_2056
    }

    fn convert(&self, coord: &Coord) -> Coord {
        let (lon, lat) = mercator_to_degrees(coord.x, coord.y);
        let (east, north) = degrees_to_lv95(lon, lat);
        Coord::new(EPSG_2056, east, north, coord.z)
    }
}
