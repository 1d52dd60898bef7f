//! Error types for prismerge.

use prismerge_types::bounds::GeometryError;
use thiserror::Error;

/// Result type for crate-level operations.
pub type Result<T> = std::result::Result<T, PrismergeError>;

/// Result type for engine-internal operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Failures the merge engine itself can produce.
///
/// All of these are deterministic and local: the engine performs no I/O, so
/// none of them is transient and none is worth retrying.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Caller-supplied geometry or configuration was unusable: negative
    /// coefficient, inverted bounds, non-finite coordinates.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Padding was requested for a box with a zero-length axis, which would
    /// divide by zero. Surfaced instead of producing a non-finite window.
    #[error("degenerate padding: {0}")]
    DegeneratePadding(String),

    /// The spatial index and the engine's bookkeeping disagree, e.g. a
    /// removal for an entry the index does not hold. Internal invariant
    /// violation; the run is aborted.
    #[error("index inconsistency: {0}")]
    IndexConsistency(String),
}

/// Crate-level error covering the engine plus the ingestion and
/// serialization boundary around it.
///
/// Engine signatures stay on [`EngineError`]; file, CSV, and timestamp
/// failures only exist out here.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PrismergeError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A mapped column index fell outside a row.
    #[error("{role} column {index} not present in a row of width {width}")]
    Column {
        role: &'static str,
        index: usize,
        width: usize,
    },

    /// A coordinate cell did not parse as a number.
    #[error("row {row}: {role} value {value:?} is not numeric")]
    Numeric {
        role: &'static str,
        row: usize,
        value: String,
    },

    /// A timestamp cell was neither epoch seconds nor ISO-8601.
    #[error("unparseable timestamp {value:?}: {reason}")]
    Timestamp { value: String, reason: String },

    /// GeoJSON or report serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}
