use geo::Point;
use serde::{Deserialize, Serialize};

use crate::bounds::{Bounds, GeometryError};

/// Per-axis half-widths that turn a point observation into a volume.
///
/// Spatial buffers are in projected meters, the temporal buffer in seconds.
/// All three must be finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Buffers {
    pub x: f64,
    pub y: f64,
    pub temporal: f64,
}

impl Buffers {
    pub fn new(x: f64, y: f64, temporal: f64) -> Self {
        Self { x, y, temporal }
    }

    /// Equal half-widths on both spatial axes, the common case when a single
    /// distance buffer is applied around an observation.
    pub fn symmetric(distance: f64, temporal: f64) -> Self {
        Self {
            x: distance,
            y: distance,
            temporal,
        }
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        for (name, value) in [("x", self.x), ("y", self.y), ("temporal", self.temporal)] {
            if !value.is_finite() {
                return Err(GeometryError::NonFinite(format!(
                    "{} buffer = {}",
                    name, value
                )));
            }
            if value < 0.0 {
                return Err(GeometryError::NegativeBuffer(format!(
                    "{} buffer = {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// An immutable space-time observation volume.
///
/// A prism pairs a projected center (`x`, `y` in meters, `timestamp` in
/// epoch seconds) with per-axis buffers and an identity. The original
/// geographic coordinates (`lon`, `lat`) ride along for reporting but play
/// no part in the geometry; all derived bounds live in the projected space
/// named by `crs`.
///
/// Prisms are created once at ingestion and never mutated afterwards. The
/// 63-bit `uuid` is assigned by the caller so that id generation stays a
/// single, injectable concern.
///
/// # Examples
///
/// ```
/// use prismerge_types::prism::{Buffers, Prism};
///
/// let prism = Prism::new(
///     -74.0060,
///     40.7128,
///     -8238310.2,
///     4970071.6,
///     1_700_000_000.0,
///     "vessel-7",
///     Buffers::symmetric(100.0, 1800.0),
///     "EPSG:3857",
///     42,
/// )
/// .unwrap();
/// assert_eq!(prism.bounds().length_x(), 200.0);
/// assert_eq!(prism.bounds().length_t(), 3600.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prism {
    /// Geographic latitude of the observation (degrees, informational)
    pub lat: f64,
    /// Geographic longitude of the observation (degrees, informational)
    pub lon: f64,
    /// Projected x coordinate of the center (meters)
    pub x: f64,
    /// Projected y coordinate of the center (meters)
    pub y: f64,
    /// Observation time (epoch seconds)
    pub timestamp: f64,
    /// Identity label carried through to the output
    pub name: String,
    pub x_buffer: f64,
    pub y_buffer: f64,
    pub temporal_buffer: f64,
    /// Tag of the projected coordinate system the x/y values live in
    pub crs: String,
    /// 63-bit identifier assigned at construction
    pub uuid: u64,
}

impl Prism {
    /// Create a prism, validating buffers and coordinate finiteness.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        lon: f64,
        lat: f64,
        x: f64,
        y: f64,
        timestamp: f64,
        name: impl Into<String>,
        buffers: Buffers,
        crs: impl Into<String>,
        uuid: u64,
    ) -> Result<Self, GeometryError> {
        buffers.validate()?;
        for (field, value) in [
            ("lon", lon),
            ("lat", lat),
            ("x", x),
            ("y", y),
            ("timestamp", timestamp),
        ] {
            if !value.is_finite() {
                return Err(GeometryError::NonFinite(format!("{} = {}", field, value)));
            }
        }
        Ok(Self {
            lat,
            lon,
            x,
            y,
            timestamp,
            name: name.into(),
            x_buffer: buffers.x,
            y_buffer: buffers.y,
            temporal_buffer: buffers.temporal,
            crs: crs.into(),
            uuid,
        })
    }

    #[inline]
    pub fn xmin(&self) -> f64 {
        self.x - self.x_buffer
    }

    #[inline]
    pub fn xmax(&self) -> f64 {
        self.x + self.x_buffer
    }

    #[inline]
    pub fn ymin(&self) -> f64 {
        self.y - self.y_buffer
    }

    #[inline]
    pub fn ymax(&self) -> f64 {
        self.y + self.y_buffer
    }

    #[inline]
    pub fn tmin(&self) -> f64 {
        self.timestamp - self.temporal_buffer
    }

    #[inline]
    pub fn tmax(&self) -> f64 {
        self.timestamp + self.temporal_buffer
    }

    /// The axis-aligned bounds spanned by the buffers around the center.
    pub fn bounds(&self) -> Bounds {
        Bounds::from_center(
            self.x,
            self.y,
            self.timestamp,
            self.x_buffer,
            self.y_buffer,
            self.temporal_buffer,
        )
    }

    /// Volume of the prism's bounds.
    pub fn volume(&self) -> f64 {
        self.bounds().volume()
    }

    /// Geographic location as a lon/lat point.
    pub fn location(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }

    /// Projected center as an x/y point.
    pub fn projected(&self) -> Point<f64> {
        Point::new(self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_prism() -> Prism {
        Prism::new(
            -74.0,
            40.7,
            1000.0,
            2000.0,
            5000.0,
            "obs-1",
            Buffers::symmetric(100.0, 60.0),
            "EPSG:3857",
            7,
        )
        .unwrap()
    }

    #[test]
    fn test_prism_derived_bounds() {
        let p = sample_prism();
        assert_eq!(p.xmin(), 900.0);
        assert_eq!(p.xmax(), 1100.0);
        assert_eq!(p.ymin(), 1900.0);
        assert_eq!(p.ymax(), 2100.0);
        assert_eq!(p.tmin(), 4940.0);
        assert_eq!(p.tmax(), 5060.0);
        assert_eq!(
            p.bounds(),
            Bounds::new(900.0, 1900.0, 4940.0, 1100.0, 2100.0, 5060.0)
        );
    }

    #[test]
    fn test_prism_volume() {
        let p = sample_prism();
        assert_eq!(p.volume(), 200.0 * 200.0 * 120.0);
    }

    #[test]
    fn test_prism_points() {
        let p = sample_prism();
        assert_eq!(p.location().x(), -74.0);
        assert_eq!(p.location().y(), 40.7);
        assert_eq!(p.projected().x(), 1000.0);
        assert_eq!(p.projected().y(), 2000.0);
    }

    #[test]
    fn test_negative_buffer_rejected() {
        let result = Prism::new(
            0.0,
            0.0,
            0.0,
            0.0,
            0.0,
            "bad",
            Buffers::new(-1.0, 0.0, 0.0),
            "EPSG:3857",
            1,
        );
        assert!(matches!(result, Err(GeometryError::NegativeBuffer(_))));
    }

    #[test]
    fn test_non_finite_center_rejected() {
        let result = Prism::new(
            0.0,
            0.0,
            f64::NAN,
            0.0,
            0.0,
            "bad",
            Buffers::symmetric(1.0, 1.0),
            "EPSG:3857",
            1,
        );
        assert!(matches!(result, Err(GeometryError::NonFinite(_))));
    }

    #[test]
    fn test_zero_buffers_give_flat_prism() {
        let p = Prism::new(
            0.0,
            0.0,
            10.0,
            20.0,
            30.0,
            "flat",
            Buffers::new(0.0, 0.0, 0.0),
            "EPSG:3857",
            2,
        )
        .unwrap();
        assert_eq!(p.volume(), 0.0);
        assert!(p.bounds().validate().is_ok());
    }
}
