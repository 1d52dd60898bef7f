use serde::{Deserialize, Serialize};

/// Error type for geometric validation.
#[derive(Debug)]
pub enum GeometryError {
    /// A coordinate was NaN or infinite
    NonFinite(String),
    /// A minimum exceeded its maximum on some axis
    AxisInverted(String),
    /// A buffer half-width was negative
    NegativeBuffer(String),
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFinite(msg) => write!(f, "non-finite coordinate: {}", msg),
            Self::AxisInverted(msg) => write!(f, "inverted axis: {}", msg),
            Self::NegativeBuffer(msg) => write!(f, "negative buffer: {}", msg),
        }
    }
}

impl std::error::Error for GeometryError {}

/// An axis-aligned space-time box: two spatial axes (projected meters) and
/// one temporal axis (epoch seconds).
///
/// `Bounds` is the unit the merge engine works on. The spatial and temporal
/// coordinates share no unit; each axis is an independent closed interval,
/// and volume is simply the product of the three axis lengths.
///
/// # Examples
///
/// ```
/// use prismerge_types::bounds::Bounds;
///
/// let b = Bounds::new(0.0, 0.0, 0.0, 2.0, 3.0, 4.0);
/// assert_eq!(b.volume(), 24.0);
/// assert_eq!(b.lengths(), (2.0, 3.0, 4.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub xmin: f64,
    pub ymin: f64,
    pub tmin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub tmax: f64,
}

impl Bounds {
    /// Create bounds from the six corner coordinates.
    ///
    /// # Arguments
    ///
    /// * `xmin`, `ymin` - Minimum spatial corner (projected meters)
    /// * `tmin` - Start of the time interval (epoch seconds)
    /// * `xmax`, `ymax` - Maximum spatial corner
    /// * `tmax` - End of the time interval
    ///
    /// # Examples
    ///
    /// ```
    /// use prismerge_types::bounds::Bounds;
    ///
    /// let b = Bounds::new(-10.0, -10.0, 0.0, 10.0, 10.0, 3600.0);
    /// assert!(b.validate().is_ok());
    /// ```
    pub fn new(xmin: f64, ymin: f64, tmin: f64, xmax: f64, ymax: f64, tmax: f64) -> Self {
        Self {
            xmin,
            ymin,
            tmin,
            xmax,
            ymax,
            tmax,
        }
    }

    /// Create bounds from a center point and per-axis half-widths.
    pub fn from_center(x: f64, y: f64, t: f64, x_buffer: f64, y_buffer: f64, t_buffer: f64) -> Self {
        Self {
            xmin: x - x_buffer,
            ymin: y - y_buffer,
            tmin: t - t_buffer,
            xmax: x + x_buffer,
            ymax: y + y_buffer,
            tmax: t + t_buffer,
        }
    }

    /// Check that every coordinate is finite and no minimum exceeds its
    /// maximum.
    ///
    /// # Examples
    ///
    /// ```
    /// use prismerge_types::bounds::Bounds;
    ///
    /// assert!(Bounds::new(0.0, 0.0, 0.0, 1.0, 1.0, 1.0).validate().is_ok());
    /// assert!(Bounds::new(2.0, 0.0, 0.0, 1.0, 1.0, 1.0).validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), GeometryError> {
        for (name, value) in [
            ("xmin", self.xmin),
            ("ymin", self.ymin),
            ("tmin", self.tmin),
            ("xmax", self.xmax),
            ("ymax", self.ymax),
            ("tmax", self.tmax),
        ] {
            if !value.is_finite() {
                return Err(GeometryError::NonFinite(format!("{} = {}", name, value)));
            }
        }
        for (axis, min, max) in [
            ("x", self.xmin, self.xmax),
            ("y", self.ymin, self.ymax),
            ("t", self.tmin, self.tmax),
        ] {
            if min > max {
                return Err(GeometryError::AxisInverted(format!(
                    "{}: {} > {}",
                    axis, min, max
                )));
            }
        }
        Ok(())
    }

    /// Length of the x axis.
    #[inline]
    pub fn length_x(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Length of the y axis.
    #[inline]
    pub fn length_y(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Length of the t axis.
    #[inline]
    pub fn length_t(&self) -> f64 {
        self.tmax - self.tmin
    }

    /// All three axis lengths as `(x, y, t)`.
    #[inline]
    pub fn lengths(&self) -> (f64, f64, f64) {
        (self.length_x(), self.length_y(), self.length_t())
    }

    /// Volume of the box: the product of the three axis lengths.
    ///
    /// A box that is flat on some axis has zero volume; valid bounds never
    /// have negative volume.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.length_x() * self.length_y() * self.length_t()
    }

    /// The smallest bounds enclosing both `self` and `other`: the elementwise
    /// minimum of the minima and maximum of the maxima.
    ///
    /// The operation is commutative and associative, so the hull of any set
    /// of boxes is independent of combination order.
    ///
    /// # Examples
    ///
    /// ```
    /// use prismerge_types::bounds::Bounds;
    ///
    /// let a = Bounds::new(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
    /// let b = Bounds::new(10.0, 10.0, 10.0, 11.0, 11.0, 11.0);
    /// assert_eq!(a.combined(&b), Bounds::new(0.0, 0.0, 0.0, 11.0, 11.0, 11.0));
    /// assert_eq!(a.combined(&b), b.combined(&a));
    /// ```
    pub fn combined(&self, other: &Bounds) -> Bounds {
        Bounds {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            tmin: self.tmin.min(other.tmin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
            tmax: self.tmax.max(other.tmax),
        }
    }

    /// Whether the two boxes overlap on all three axes. Intervals are
    /// closed, so boxes that only share a face still intersect.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.xmin <= other.xmax
            && other.xmin <= self.xmax
            && self.ymin <= other.ymax
            && other.ymin <= self.ymax
            && self.tmin <= other.tmax
            && other.tmin <= self.tmax
    }

    /// Whether `other` lies entirely inside `self` (closed intervals).
    pub fn contains(&self, other: &Bounds) -> bool {
        self.xmin <= other.xmin
            && self.xmax >= other.xmax
            && self.ymin <= other.ymin
            && self.ymax >= other.ymax
            && self.tmin <= other.tmin
            && self.tmax >= other.tmax
    }

    /// Center of the box as `(x, y, t)`.
    pub fn center(&self) -> (f64, f64, f64) {
        (
            (self.xmax + self.xmin) / 2.0,
            (self.ymax + self.ymin) / 2.0,
            (self.tmax + self.tmin) / 2.0,
        )
    }

    /// Minimum corner as `[x, y, t]`.
    #[inline]
    pub fn min_corner(&self) -> [f64; 3] {
        [self.xmin, self.ymin, self.tmin]
    }

    /// Maximum corner as `[x, y, t]`.
    #[inline]
    pub fn max_corner(&self) -> [f64; 3] {
        [self.xmax, self.ymax, self.tmax]
    }
}
