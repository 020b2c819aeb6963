//! Route file loader
//!
//! A route file holds one geodetic point per line as three whitespace separated numbers:
//! longitude (degrees), latitude (degrees) and altitude (meters). Lines which can't be read as
//! a point are skipped.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use std::path::Path;

use super::{GeodeticPoint, RouteError};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Parse the points of a route file.
///
/// Blank and malformed lines are skipped, fields after the altitude are ignored.
pub fn parse_route(text: &str) -> Vec<GeodeticPoint> {
    let mut points = Vec::new();

    for (line_num, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        match parse_line(line) {
            Some(p) => points.push(p),
            None => debug!("Skipping malformed route line {}: {:?}", line_num + 1, line)
        }
    }

    points
}

/// Read and parse a route file.
pub fn load_route_file<P: AsRef<Path>>(path: P) -> Result<Vec<GeodeticPoint>, RouteError> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| RouteError::FileLoad(path.as_ref().display().to_string(), e))?;

    Ok(parse_route(&text))
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn parse_line(line: &str) -> Option<GeodeticPoint> {
    let mut fields = line.split_whitespace().map(|f| f.parse::<f64>());

    let lon_deg = fields.next()?.ok()?;
    let lat_deg = fields.next()?.ok()?;
    let alt_m = fields.next()?.ok()?;

    if !(lon_deg.is_finite() && lat_deg.is_finite() && alt_m.is_finite()) {
        return None
    }

    Some(GeodeticPoint { lon_deg, lat_deg, alt_m })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_route() {
        let text = "\
            116.3000 39.9000 45.0\n\
            \n\
            # survey header\n\
            116.3010\t39.9001   45.5 extra fields\n\
            116.3020 39.9002\n\
            116.3030 abc 46.0\n\
            116.3040 39.9004 NaN\n\
            116.3050 39.9005 47.0\n";

        let points = parse_route(text);

        assert_eq!(points, vec![
            GeodeticPoint::new(116.3, 39.9, 45.0),
            GeodeticPoint::new(116.301, 39.9001, 45.5),
            GeodeticPoint::new(116.305, 39.9005, 47.0)
        ]);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_route_file("/this/route/does/not/exist.txt"),
            Err(RouteError::FileLoad(_, _))
        ));
    }
}
