//! Route module
//!
//! A route is built once from an ordered list of geodetic points. The points are converted to
//! ECEF and the cumulative straight-line distance between them is used as the arc length
//! parameter `s` of three independent cubic splines `X(s)`, `Y(s)` and `Z(s)`.
//!
//! The longitudinal state of the train (`s`, `v = ds/dt`, `a`, `j`) is mapped onto 3D using the
//! chain rule:
//!
//! - velocity: `P'(s) v`
//! - acceleration: `P'(s) a + P''(s) v^2`
//! - jerk: `P'''(s) v^3 + 3 P''(s) v a + P'(s) j`
//!
//! All queries on a route that hasn't been loaded return the zero vector, check
//! `Route::is_initialized` before relying on them.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod geodesy;
pub mod loader;
mod spline;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use nalgebra::Vector3;
use std::path::Path;

pub use geodesy::*;
pub use spline::{CubicSpline, SplineError, MIN_KNOTS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An arc length parameterised 3D route.
#[derive(Debug, Clone, Default)]
pub struct Route {
    /// ECEF position of each route point
    points_ecef: Vec<Vector3<f64>>,

    /// Cumulative arc length at each route point
    arc_lengths_m: Vec<f64>,

    /// X, Y and Z splines, `None` until loaded
    splines: Option<[CubicSpline; 3]>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while loading a route.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Cannot load the route file {0}: {1}")]
    FileLoad(String, std::io::Error),

    #[error("A route needs at least 4 points, found {0}")]
    NotEnoughPoints(usize),

    #[error("Route point {0} is at the same position as the previous point")]
    NonIncreasingArcLength(usize),

    #[error("Could not fit the route splines: {0}")]
    SplineError(SplineError)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Route {
    /// Build a route from geodetic points.
    pub fn from_geodetic(points: &[GeodeticPoint]) -> Result<Self, RouteError> {
        Self::from_ecef(points.iter().map(geodetic_to_ecef).collect())
    }

    /// Build a route from points already in ECEF coordinates.
    pub fn from_ecef(points_ecef: Vec<Vector3<f64>>) -> Result<Self, RouteError> {
        if points_ecef.len() < MIN_KNOTS {
            return Err(RouteError::NotEnoughPoints(points_ecef.len()))
        }

        let mut arc_lengths_m = Vec::with_capacity(points_ecef.len());
        arc_lengths_m.push(0.0);

        for i in 1..points_ecef.len() {
            let seg_m = (points_ecef[i] - points_ecef[i - 1]).norm();
            if !(seg_m > 0.0) {
                return Err(RouteError::NonIncreasingArcLength(i))
            }
            arc_lengths_m.push(arc_lengths_m[i - 1] + seg_m);
        }

        let fit_axis = |axis: usize| {
            let values: Vec<f64> = points_ecef.iter().map(|p| p[axis]).collect();
            CubicSpline::fit(&arc_lengths_m, &values).map_err(RouteError::SplineError)
        };

        let splines = [fit_axis(0)?, fit_axis(1)?, fit_axis(2)?];

        Ok(Self {
            points_ecef,
            arc_lengths_m,
            splines: Some(splines)
        })
    }

    /// Load a route file, see [`loader`] for the format.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, RouteError> {
        let points = loader::load_route_file(path.as_ref())?;
        let route = Self::from_geodetic(&points)?;

        info!(
            "Loaded route {:?}: {} points, {:.3} m",
            path.as_ref(),
            route.num_points(),
            route.total_distance_m()
        );

        Ok(route)
    }

    /// Replace this route with one built from the given points.
    ///
    /// On error the route is left unchanged.
    pub fn load(&mut self, points: &[GeodeticPoint]) -> Result<(), RouteError> {
        *self = Self::from_geodetic(points)?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.splines.is_some()
    }

    /// Length of the route, zero if not loaded.
    pub fn total_distance_m(&self) -> f64 {
        self.arc_lengths_m.last().copied().unwrap_or(0.0)
    }

    pub fn num_points(&self) -> usize {
        self.points_ecef.len()
    }

    /// ECEF position of the route points.
    pub fn points_ecef(&self) -> &[Vector3<f64>] {
        &self.points_ecef
    }

    /// Cumulative arc length at each route point.
    pub fn arc_lengths_m(&self) -> &[f64] {
        &self.arc_lengths_m
    }

    /// The `order`th derivative of the route position with respect to arc length.
    pub fn derivative_at(&self, s_m: f64, order: usize) -> Vector3<f64> {
        match self.splines {
            Some(ref sp) => Vector3::new(
                sp[0].eval(s_m, order),
                sp[1].eval(s_m, order),
                sp[2].eval(s_m, order)
            ),
            None => Vector3::zeros()
        }
    }

    /// ECEF position at arc length `s_m`.
    pub fn position_at(&self, s_m: f64) -> Vector3<f64> {
        self.derivative_at(s_m, 0)
    }

    /// ECEF velocity at arc length `s_m` for along-track speed `v_ms`.
    pub fn velocity_at(&self, s_m: f64, v_ms: f64) -> Vector3<f64> {
        self.derivative_at(s_m, 1) * v_ms
    }

    /// ECEF acceleration at arc length `s_m`.
    ///
    /// The first term is the tangential acceleration, the second the centripetal acceleration
    /// due to the route's curvature.
    pub fn acceleration_at(&self, s_m: f64, v_ms: f64, a_mss: f64) -> Vector3<f64> {
        if !self.is_initialized() {
            return Vector3::zeros()
        }

        self.derivative_at(s_m, 1) * a_mss + self.derivative_at(s_m, 2) * (v_ms * v_ms)
    }

    /// ECEF jerk at arc length `s_m`.
    pub fn jerk_at(&self, s_m: f64, v_ms: f64, a_mss: f64, j_msss: f64) -> Vector3<f64> {
        if !self.is_initialized() {
            return Vector3::zeros()
        }

        self.derivative_at(s_m, 3) * (v_ms * v_ms * v_ms)
            + self.derivative_at(s_m, 2) * (3.0 * v_ms * a_mss)
            + self.derivative_at(s_m, 1) * j_msss
    }

    /// Geodetic position at arc length `s_m`, the zero point if not loaded.
    pub fn geodetic_at(&self, s_m: f64) -> GeodeticPoint {
        if !self.is_initialized() {
            return GeodeticPoint::default()
        }

        ecef_to_geodetic(&self.position_at(s_m))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn assert_vec_eq(a: Vector3<f64>, b: Vector3<f64>, tol: f64) {
        assert!((a - b).norm() < tol, "{:?} != {:?}", a, b);
    }

    /// Irregularly spaced points along an ECEF straight line.
    fn straight_route() -> (Route, Vector3<f64>, Vector3<f64>) {
        let origin = Vector3::new(-2_178_000.0, 4_388_000.0, 4_069_000.0);
        let dir = Vector3::new(0.3, -0.5, 0.8).normalize();

        let points: Vec<Vector3<f64>> = [0.0, 40.0, 55.0, 130.0, 200.0, 410.0]
            .iter()
            .map(|d| origin + dir * *d)
            .collect();

        (Route::from_ecef(points).unwrap(), origin, dir)
    }

    /// A half circle of radius `r` sampled every 5 degrees.
    fn half_circle(centre: Vector3<f64>, r: f64) -> Route {
        let points = (0..37)
            .map(|k| {
                let ang = (k as f64 * 5.0).to_radians();
                centre + Vector3::new(r * ang.cos(), r * ang.sin(), 0.0)
            })
            .collect();

        Route::from_ecef(points).unwrap()
    }

    #[test]
    fn test_straight_line() {
        let (route, origin, dir) = straight_route();

        assert!(route.is_initialized());
        assert_eq!(route.num_points(), 6);
        assert!((route.total_distance_m() - 410.0).abs() < 1e-6);
        assert_vec_eq(route.position_at(0.0), origin, 1e-6);
        assert_vec_eq(route.position_at(100.0), origin + dir * 100.0, 1e-6);
    }

    #[test]
    fn test_straight_line_derivatives() {
        let (route, _, dir) = straight_route();

        for s in [0.0, 47.5, 300.0].iter() {
            for (v, a, j) in [(0.0, 0.0, 0.0), (12.0, 0.8, -0.3), (33.3, -0.9, 0.75)].iter() {
                assert_vec_eq(route.velocity_at(*s, *v), dir * *v, 1e-6);
                assert_vec_eq(route.acceleration_at(*s, *v, *a), dir * *a, 1e-6);
                assert_vec_eq(route.jerk_at(*s, *v, *a, *j), dir * *j, 1e-6);
            }
        }
    }

    #[test]
    fn test_geodetic_route() {
        let points = [
            GeodeticPoint::new(116.3000, 39.9000, 45.0),
            GeodeticPoint::new(116.3010, 39.9004, 45.5),
            GeodeticPoint::new(116.3022, 39.9007, 46.0),
            GeodeticPoint::new(116.3031, 39.9013, 46.2),
            GeodeticPoint::new(116.3040, 39.9020, 46.0)
        ];

        let route = Route::from_geodetic(&points).unwrap();

        let ecef: Vec<Vector3<f64>> = points.iter().map(geodetic_to_ecef).collect();
        let expected_total: f64 = ecef.windows(2).map(|w| (w[1] - w[0]).norm()).sum();

        assert_vec_eq(route.position_at(0.0), ecef[0], 1e-6);
        assert_vec_eq(route.position_at(route.total_distance_m()), ecef[4], 1e-6);
        assert!((route.total_distance_m() - expected_total).abs() < 1e-6);

        let start = route.geodetic_at(0.0);
        assert!((start.lon_deg - 116.3).abs() < 1e-9);
        assert!((start.lat_deg - 39.9).abs() < 1e-9);
        assert!((start.alt_m - 45.0).abs() < 1e-3);
    }

    #[test]
    fn test_curvature() {
        let centre = Vector3::new(4.0e6, 1.0e6, 4.5e6);
        let r = 1000.0;
        let route = half_circle(centre, r);
        let v = 10.0;

        for frac in [0.3, 0.5, 0.71].iter() {
            let s = route.total_distance_m() * frac;

            // Unit speed parameterisation
            assert!((route.derivative_at(s, 1).norm() - 1.0).abs() < 1e-2);

            // Centripetal acceleration v^2 / r pointing at the centre
            let acc = route.acceleration_at(s, v, 0.0);
            assert!((acc.norm() - v * v / r).abs() < 1e-3);
            assert!((centre - route.position_at(s)).dot(&acc) > 0.0);
        }
    }

    #[test]
    fn test_chain_rule_matches_finite_differences() {
        let route = half_circle(Vector3::new(4.0e6, 1.0e6, 4.5e6), 1000.0);
        let s = 1234.5;
        let h = 1e-2;

        let d1 = (route.position_at(s + h) - route.position_at(s - h)) / (2.0 * h);
        assert_vec_eq(route.velocity_at(s, 1.0), d1, 1e-5);

        let d2 = (route.derivative_at(s + h, 1) - route.derivative_at(s - h, 1)) / (2.0 * h);
        assert_vec_eq(route.acceleration_at(s, 1.0, 0.0), d2, 1e-6);

        // With a = 0 and j = 0 only the curvature rate term remains
        assert_vec_eq(route.jerk_at(s, 2.0, 0.0, 0.0), route.derivative_at(s, 3) * 8.0, 1e-12);
    }

    #[test]
    fn test_unloaded_route() {
        let route = Route::default();

        assert!(!route.is_initialized());
        assert_eq!(route.total_distance_m(), 0.0);
        assert_eq!(route.position_at(10.0), Vector3::zeros());
        assert_eq!(route.velocity_at(10.0, 5.0), Vector3::zeros());
        assert_eq!(route.acceleration_at(10.0, 5.0, 1.0), Vector3::zeros());
        assert_eq!(route.jerk_at(10.0, 5.0, 1.0, 0.5), Vector3::zeros());
        assert_eq!(route.geodetic_at(10.0), GeodeticPoint::default());
    }

    #[test]
    fn test_load_errors() {
        let p = GeodeticPoint::new(116.3, 39.9, 45.0);
        let q = GeodeticPoint::new(116.31, 39.9, 45.0);
        let r = GeodeticPoint::new(116.32, 39.9, 45.0);
        let s = GeodeticPoint::new(116.33, 39.9, 45.0);

        assert!(matches!(
            Route::from_geodetic(&[p, q, r]),
            Err(RouteError::NotEnoughPoints(3))
        ));
        assert!(matches!(
            Route::from_geodetic(&[p, q, q, r]),
            Err(RouteError::NonIncreasingArcLength(2))
        ));

        // A failed load leaves the previous route in place
        let mut route = Route::from_geodetic(&[p, q, r, s]).unwrap();
        let total = route.total_distance_m();
        assert!(route.load(&[p, q]).is_err());
        assert!(route.is_initialized());
        assert_eq!(route.total_distance_m(), total);
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir().join("railtraj_route_test.txt");
        std::fs::write(
            &path,
            "116.3000 39.9000 45.0\n\
            bad line\n\
            116.3010 39.9004 45.5\n\
            116.3022 39.9007 46.0\n\
            \n\
            116.3031 39.9013 46.2\n"
        ).unwrap();

        let route = Route::load_file(&path).unwrap();
        assert_eq!(route.num_points(), 4);

        std::fs::write(&path, "116.3000 39.9000 45.0\n116.3010 39.9004 45.5\n").unwrap();
        assert!(matches!(Route::load_file(&path), Err(RouteError::NotEnoughPoints(2))));
    }
}
