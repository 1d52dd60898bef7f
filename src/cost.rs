//! Merge cost model: hull-volume deltas and query-window padding.
//!
//! Merging two boxes replaces them with their combined hull, so the cost of
//! a merge is the volume the hull adds beyond its two parents. A slack
//! coefficient shifts where "worth it" lies: it is subtracted from the raw
//! delta, letting merges that add up to `coef` of new volume still count as
//! beneficial, and it also widens the window used to look for neighbors in
//! the spatial index.

use crate::error::{EngineError, EngineResult};
use prismerge_types::bounds::Bounds;

/// Expand a box's faces for use as an index query window.
///
/// Each face moves outward by `coef` divided by the product of the other
/// two axis lengths, so the padding added on every axis represents roughly
/// `coef` worth of volume. With `coef == 0` the input is returned untouched
/// and no division is evaluated.
///
/// The padded window is only ever used to query the index; the box itself
/// keeps its raw bounds.
///
/// # Errors
///
/// A zero-length axis with a nonzero `coef` would divide by zero; that is
/// reported as [`EngineError::DegeneratePadding`] rather than letting a
/// non-finite window reach the index. A non-finite `coef` is
/// [`EngineError::InvalidInput`].
///
/// # Examples
///
/// ```rust
/// use prismerge::cost::padded_bounds;
/// use prismerge_types::bounds::Bounds;
///
/// let unit = Bounds::new(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
///
/// // coef = 0 is the exact identity.
/// assert_eq!(padded_bounds(&unit, 0.0).unwrap(), unit);
///
/// // Every face of the unit cube moves out by 0.5 / (1 * 1).
/// let window = padded_bounds(&unit, 0.5).unwrap();
/// assert_eq!(window, Bounds::new(-0.5, -0.5, -0.5, 1.5, 1.5, 1.5));
/// ```
pub fn padded_bounds(bounds: &Bounds, coef: f64) -> EngineResult<Bounds> {
    if !coef.is_finite() {
        return Err(EngineError::InvalidInput(format!(
            "padding coefficient must be finite, got {}",
            coef
        )));
    }
    if coef == 0.0 {
        return Ok(*bounds);
    }

    let (lx, ly, lt) = bounds.lengths();
    for (axis, length) in [("x", lx), ("y", ly), ("t", lt)] {
        if length == 0.0 {
            return Err(EngineError::DegeneratePadding(format!(
                "axis {} has zero length in {:?} with coef {}",
                axis, bounds, coef
            )));
        }
    }

    let pad_x = coef / (ly * lt);
    let pad_y = coef / (lx * lt);
    let pad_t = coef / (lx * ly);

    Ok(Bounds::new(
        bounds.xmin - pad_x,
        bounds.ymin - pad_y,
        bounds.tmin - pad_t,
        bounds.xmax + pad_x,
        bounds.ymax + pad_y,
        bounds.tmax + pad_t,
    ))
}

/// Cost delta of replacing `b1` and `b2` with `merged`.
///
/// Defined as `volume(merged) - volume(b1) - volume(b2) - coef`. A merge is
/// beneficial when the delta is less than or equal to zero: the hull wastes
/// no more volume than the slack coefficient allows. `merged` is passed in
/// rather than recomputed because callers already hold the hull.
///
/// # Examples
///
/// ```rust
/// use prismerge::cost::delta_c;
/// use prismerge_types::bounds::Bounds;
///
/// let a = Bounds::new(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
/// let b = Bounds::new(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
/// let merged = a.combined(&b);
///
/// // Two coincident unit cubes collapse into one: a full cube of volume
/// // is saved.
/// assert_eq!(delta_c(&a, &b, &merged, 0.0), -1.0);
/// ```
pub fn delta_c(b1: &Bounds, b2: &Bounds, merged: &Bounds, coef: f64) -> f64 {
    merged.volume() - b1.volume() - b2.volume() - coef
}
