//! WGS-84 geodetic conversions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::{Serialize, Deserialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// WGS-84 semi-major axis in meters
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS-84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// WGS-84 first eccentricity squared
pub const WGS84_E2: f64 = 2.0 * WGS84_F - WGS84_F * WGS84_F;

/// Latitude iteration stops once successive estimates differ by less than this.
const LAT_CONVERGENCE_RAD: f64 = 1e-10;

/// Upper bound on latitude iterations, convergence normally takes fewer than ten.
const MAX_LAT_ITERATIONS: usize = 100;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A point on the WGS-84 ellipsoid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPoint {
    /// Longitude in degrees
    pub lon_deg: f64,

    /// Latitude in degrees
    pub lat_deg: f64,

    /// Altitude above the ellipsoid in meters
    pub alt_m: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GeodeticPoint {
    pub fn new(lon_deg: f64, lat_deg: f64, alt_m: f64) -> Self {
        Self { lon_deg, lat_deg, alt_m }
    }

    /// Convert to an Earth-centred Earth-fixed position.
    pub fn to_ecef(&self) -> Vector3<f64> {
        geodetic_to_ecef(self)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a geodetic point to ECEF coordinates in meters.
pub fn geodetic_to_ecef(point: &GeodeticPoint) -> Vector3<f64> {
    let lat = point.lat_deg.to_radians();
    let lon = point.lon_deg.to_radians();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();

    // Prime vertical radius of curvature
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

    Vector3::new(
        (n + point.alt_m) * cos_lat * cos_lon,
        (n + point.alt_m) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + point.alt_m) * sin_lat
    )
}

/// Convert ECEF coordinates in meters to a geodetic point.
///
/// Points on the polar axis have no defined longitude and return the zero point.
pub fn ecef_to_geodetic(ecef: &Vector3<f64>) -> GeodeticPoint {
    if ecef.x == 0.0 && ecef.y == 0.0 {
        return GeodeticPoint::default()
    }

    let lon = ecef.y.atan2(ecef.x);
    let p = (ecef.x * ecef.x + ecef.y * ecef.y).sqrt();

    let mut lat = 0.0f64;
    for _ in 0..MAX_LAT_ITERATIONS {
        let sin_lat = lat.sin();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        let next = (ecef.z + n * WGS84_E2 * sin_lat).atan2(p);
        let converged = (next - lat).abs() < LAT_CONVERGENCE_RAD;
        lat = next;
        if converged {
            break;
        }
    }

    let sin_lat = lat.sin();
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

    GeodeticPoint {
        lon_deg: lon.to_degrees(),
        lat_deg: lat.to_degrees(),
        alt_m: p / lat.cos() - n
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_equator_prime_meridian() {
        let ecef = geodetic_to_ecef(&GeodeticPoint::new(0.0, 0.0, 0.0));
        assert!((ecef.x - WGS84_A).abs() < 1e-6);
        assert!(ecef.y.abs() < 1e-6);
        assert!(ecef.z.abs() < 1e-6);

        let ecef = geodetic_to_ecef(&GeodeticPoint::new(90.0, 0.0, 100.0));
        assert!(ecef.x.abs() < 1e-6);
        assert!((ecef.y - (WGS84_A + 100.0)).abs() < 1e-6);
    }

    #[test]
    fn test_north_pole() {
        let ecef = geodetic_to_ecef(&GeodeticPoint::new(0.0, 90.0, 0.0));
        let b = WGS84_A * (1.0 - WGS84_F);
        assert!((ecef.z - b).abs() < 1e-6);

        // Undefined longitude on the polar axis
        assert_eq!(ecef_to_geodetic(&Vector3::new(0.0, 0.0, b)), GeodeticPoint::default());
    }

    #[test]
    fn test_round_trip() {
        let points = [
            GeodeticPoint::new(116.391, 39.907, 43.5),
            GeodeticPoint::new(-73.9857, 40.7484, 381.0),
            GeodeticPoint::new(151.2153, -33.8568, 5.0),
            GeodeticPoint::new(-0.1276, 51.5072, 0.0)
        ];

        for p in points.iter() {
            let back = ecef_to_geodetic(&geodetic_to_ecef(p));
            assert!((back.lon_deg - p.lon_deg).abs() < 1e-9);
            assert!((back.lat_deg - p.lat_deg).abs() < 1e-8);
            assert!((back.alt_m - p.alt_m).abs() < 1e-3);
        }
    }
}
