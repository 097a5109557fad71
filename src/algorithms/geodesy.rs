//! Great-circle geodesy on a spherical Earth
//!
//! Haversine distance and initial bearing between two latitude/longitude
//! points, plus the small angle helpers the visibility gate builds on:
//! - Distances in meters on a sphere of radius `EARTH_RADIUS_M`
//! - Bearings in degrees clockwise from true north, in [0, 360)
//! - No altitude correction
//!
//! Every function is total: identical points give distance 0 and bearing 0,
//! antipodal points give half the circumference.

use crate::core::{GeoPoint, EARTH_RADIUS_M};

/// Great-circle distance between two points (m)
pub fn distance(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let phi1 = from.lat.to_radians();
    let phi2 = to.lat.to_radians();
    let delta_phi = (to.lat - from.lat).to_radians();
    let delta_lambda = (to.lon - from.lon).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Initial bearing along the great circle from `from` to `to`, in [0, 360)
pub fn bearing(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let phi1 = from.lat.to_radians();
    let phi2 = to.lat.to_radians();
    let delta_lambda = (to.lon - from.lon).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    normalize_degrees(y.atan2(x).to_degrees())
}

/// Point reached travelling `distance_m` from `from` on initial bearing `bearing_deg`
pub fn destination(from: &GeoPoint, bearing_deg: f64, distance_m: f64) -> GeoPoint {
    let delta = distance_m / EARTH_RADIUS_M;
    let theta = bearing_deg.to_radians();
    let phi1 = from.lat.to_radians();
    let lambda1 = from.lon.to_radians();

    let sin_phi2 = phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos();
    let phi2 = sin_phi2.clamp(-1.0, 1.0).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * sin_phi2);

    GeoPoint::new(phi2.to_degrees(), normalize_signed(lambda2.to_degrees()))
}

/// Wrap an angle into [0, 360)
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Wrap an angle into (-180, 180]
pub fn normalize_signed(angle: f64) -> f64 {
    let wrapped = normalize_degrees(angle);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Signed shortest rotation from `heading` to `target`, in (-180, 180]
pub fn angle_diff(target: f64, heading: f64) -> f64 {
    normalize_signed(target - heading)
}
