//! Greedy consolidation of space-time observations into minimal 3-D query volumes.
//!
//! Observations become axis-aligned boxes over (x, y, time); overlapping
//! boxes are merged whenever the merged volume does not exceed the volumes
//! it replaces by more than a caller-chosen coefficient.
//!
//! ```rust
//! use prismerge::{Bounds, GreedyMerger, QueryBox};
//!
//! let outer = QueryBox::new(1, Bounds::new(0.0, 0.0, 0.0, 2.0, 2.0, 2.0), None);
//! let inner = QueryBox::new(2, Bounds::new(0.5, 0.5, 0.5, 1.5, 1.5, 1.5), None);
//!
//! let outcome = GreedyMerger::new().run(vec![outer, inner])?;
//! assert_eq!(outcome.boxes().len(), 1);
//! assert_eq!(outcome.boxes()[0].bounds, Bounds::new(0.0, 0.0, 0.0, 2.0, 2.0, 2.0));
//! # Ok::<(), prismerge::EngineError>(())
//! ```

pub mod cost;
pub mod engine;
pub mod error;
pub mod generator;
pub mod ids;
pub mod index;
pub mod ingest;
pub mod output;
pub mod projection;
pub mod queue;

pub use engine::{GreedyMerger, MergeOutcome, QueryBox};
pub use error::{EngineError, PrismergeError, Result};

pub use prismerge_types::bounds::{Bounds, GeometryError};
pub use prismerge_types::prism::{Buffers, Prism};

pub use geo::Point;

pub use index::{BoxIndex, IndexedBox};
pub use queue::{CandidateQueue, MergeCandidate};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Bounds, Buffers, GeometryError, Prism};

    pub use crate::{EngineError, PrismergeError, Result};

    pub use crate::{GreedyMerger, MergeOutcome, QueryBox};

    pub use crate::ids::{IdSource, SequentialIds, UuidIds};

    pub use crate::ingest::{ColumnMap, Observation};

    pub use geo::Point;
}
