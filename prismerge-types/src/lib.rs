//! # prismerge-types
//!
//! Core value types for the prismerge engine.
//!
//! This crate provides the fundamental types for working with space-time
//! query volumes:
//!
//! - **Bounds**: an axis-aligned box over two spatial axes and one temporal
//!   axis, with the elementwise-hull and volume operations the merge engine
//!   is built on
//! - **Prism**: an immutable observation volume (projected center, buffers,
//!   timestamp, identity) from which bounds are derived
//! - **Buffers**: the per-axis half-widths that turn a point observation
//!   into a volume
//!
//! All types are serializable with Serde. Spatial coordinates are plain
//! `f64` in a projected metric space; timestamps are epoch seconds.
//!
//! ## Examples
//!
//! ```rust
//! use prismerge_types::bounds::Bounds;
//!
//! let a = Bounds::new(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
//! let b = Bounds::new(0.5, 0.5, 0.5, 2.0, 2.0, 2.0);
//! let hull = a.combined(&b);
//! assert_eq!(hull.volume(), 8.0);
//! ```

pub mod bounds;
pub mod prism;
