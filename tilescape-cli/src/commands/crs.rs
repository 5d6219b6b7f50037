//! Coordinate system lookup.

use serde_json::json;
use tilescape::coord::{crs_name, CoordinateSystem};

use super::common::{print_json, GlobalOptions};
use crate::error::CliError;

/// Resolve a CRS string and print the registry entry.
pub fn run(options: &GlobalOptions, crs: &str) -> Result<(), CliError> {
    let system = CoordinateSystem::from_crs(crs)?;
    let name = crs_name(system.identifier).unwrap_or("-");

    if options.json {
        return print_json(&json!({
            "input": crs,
            "name": name,
            "system": system,
        }));
    }

    let bounds = system.bounds;
    println!("{} -> {} (identifier {})", crs, name, system.identifier);
    println!("  Meters per unit: {}", system.unit_to_meter_factor);
    println!(
        "  Bounds: ({}, {}) - ({}, {})",
        bounds.top_left.x, bounds.top_left.y, bounds.bottom_right.x, bounds.bottom_right.y
    );
    Ok(())
}
