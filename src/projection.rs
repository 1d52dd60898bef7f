//! Spherical-Mercator (EPSG:3857) projection.
//!
//! The engine works in a linear metric space, so geographic observations
//! are projected before any geometry happens and only unprojected again
//! for reporting. The closed-form spherical formulas are enough here; the
//! sub-meter difference against the ellipsoidal variant is far below the
//! buffer sizes this tool works with.

use prismerge_types::bounds::GeometryError;

/// Tag recorded on prisms whose x/y live in this projection.
pub const WEB_MERCATOR_CRS: &str = "EPSG:3857";

/// Latitude band where the projection is defined. Inputs beyond it clamp
/// to the edge, the usual Web-Mercator convention.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Project geographic degrees to Web-Mercator meters.
///
/// # Errors
///
/// Non-finite input is rejected; latitudes outside the Mercator band are
/// clamped, not rejected.
///
/// # Examples
///
/// ```rust
/// use prismerge::projection::project;
///
/// let (x, y) = project(0.0, 0.0).unwrap();
/// assert_eq!(x, 0.0);
/// assert!(y.abs() < 1e-8);
///
/// let (x, _) = project(-74.0060, 40.7128).unwrap();
/// assert!((x - -8_238_310.24).abs() < 1.0);
/// ```
pub fn project(lon: f64, lat: f64) -> Result<(f64, f64), GeometryError> {
    if !lon.is_finite() || !lat.is_finite() {
        return Err(GeometryError::NonFinite(format!(
            "lon = {}, lat = {}",
            lon, lat
        )));
    }
    let lat = lat.clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
    let x = EARTH_RADIUS_M * lon.to_radians();
    let y = EARTH_RADIUS_M * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    Ok((x, y))
}

/// Invert [`project`]: Web-Mercator meters back to geographic degrees.
///
/// # Errors
///
/// Non-finite input is rejected.
pub fn unproject(x: f64, y: f64) -> Result<(f64, f64), GeometryError> {
    if !x.is_finite() || !y.is_finite() {
        return Err(GeometryError::NonFinite(format!("x = {}, y = {}", x, y)));
    }
    let lon = (x / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    Ok((lon, lat))
}
