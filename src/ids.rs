//! Identifier generation for boxes and merge candidates.
//!
//! Every box and candidate carries a 63-bit identifier. Generation sits
//! behind a trait so that production runs get random ids while tests and
//! reproducibility-sensitive callers can inject a deterministic source:
//! with the same inputs and the same id sequence, a merge run is
//! bit-for-bit repeatable.

use uuid::Uuid;

/// A source of 63-bit identifiers.
///
/// Identifiers stay below `2^63` so they survive round trips through
/// signed integer columns in downstream stores.
pub trait IdSource: Send {
    /// Produce the next identifier.
    fn next_id(&mut self) -> u64;
}

/// Random identifiers derived from v4 UUIDs, truncated to the upper 63
/// bits. Collisions are possible in principle but negligible at the scale
/// of a merge run.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl UuidIds {
    pub fn new() -> Self {
        Self
    }
}

impl IdSource for UuidIds {
    fn next_id(&mut self) -> u64 {
        (Uuid::new_v4().as_u128() >> 65) as u64
    }
}

/// Monotonically increasing identifiers starting from a fixed value.
///
/// Used by tests and by callers that need stable ids across runs.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    /// Start counting from 1.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Start counting from `first`.
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids_are_monotonic() {
        let mut ids = SequentialIds::new();
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
        assert_eq!(ids.next_id(), 3);
    }

    #[test]
    fn test_sequential_ids_custom_start() {
        let mut ids = SequentialIds::starting_at(100);
        assert_eq!(ids.next_id(), 100);
        assert_eq!(ids.next_id(), 101);
    }

    #[test]
    fn test_uuid_ids_fit_in_63_bits() {
        let mut ids = UuidIds::new();
        for _ in 0..64 {
            let id = ids.next_id();
            assert!(id < (1u64 << 63));
        }
    }

    #[test]
    fn test_uuid_ids_are_distinct() {
        let mut ids = UuidIds::new();
        let a = ids.next_id();
        let b = ids.next_id();
        let c = ids.next_id();
        assert!(a != b && b != c && a != c);
    }
}
