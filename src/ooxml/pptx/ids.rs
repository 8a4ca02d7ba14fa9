//! Build-scoped identifier allocation.
//!
//! Shape IDs (`p:cNvPr/@id`) and slide creation IDs (`p14:creationId/@val`)
//! must not repeat across the slides of one output. Each build owns one
//! [`IdAllocator`], seeded with every value the template's slides use, and
//! every cloned slide draws its new values from it.

use std::collections::HashSet;

/// Monotonic sequence of `u32` identifiers that skips reserved values.
#[derive(Debug, Clone)]
pub struct IdSequence {
    next: u32,
    taken: HashSet<u32>,
}

impl IdSequence {
    /// Start above the highest observed value; observed values are never handed out.
    pub fn above(observed: impl IntoIterator<Item = u32>) -> Self {
        let taken: HashSet<u32> = observed.into_iter().collect();
        let next = taken
            .iter()
            .max()
            .map_or(1, |max| max.checked_add(1).unwrap_or(1));
        Self { next, taken }
    }

    /// Next free identifier. Zero is never returned.
    ///
    /// Wraps to 1 after `u32::MAX`; values handed out or observed are skipped.
    pub fn next_id(&mut self) -> u32 {
        loop {
            let candidate = self.next;
            self.next = self.next.checked_add(1).unwrap_or(1);
            if candidate != 0 && self.taken.insert(candidate) {
                return candidate;
            }
        }
    }

    /// Number of identifiers reserved so far, observed or allocated.
    #[inline]
    pub fn len(&self) -> usize {
        self.taken.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}

/// Identifier source shared by every slide of one build.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    shapes: IdSequence,
    creation: IdSequence,
}

impl IdAllocator {
    /// Seed from the identifiers already present in the template's slides.
    pub fn seeded(
        shape_ids: impl IntoIterator<Item = u32>,
        creation_ids: impl IntoIterator<Item = u32>,
    ) -> Self {
        Self {
            shapes: IdSequence::above(shape_ids),
            creation: IdSequence::above(creation_ids),
        }
    }

    /// Fresh shape/drawing identifier.
    #[inline]
    pub fn next_shape_id(&mut self) -> u32 {
        self.shapes.next_id()
    }

    /// Fresh slide creation identifier.
    #[inline]
    pub fn next_creation_id(&mut self) -> u32 {
        self.creation.next_id()
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::seeded([], [])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_above_observed() {
        let mut seq = IdSequence::above([1, 7, 3]);
        assert_eq!(seq.next_id(), 8);
        assert_eq!(seq.next_id(), 9);
        assert_eq!(IdSequence::above([]).next_id(), 1);
    }

    #[test]
    fn test_wraps_and_skips_taken() {
        let mut seq = IdSequence::above([u32::MAX - 1, 1, 2]);
        assert_eq!(seq.next_id(), u32::MAX);
        assert_eq!(seq.next_id(), 3);
    }

    #[test]
    fn test_allocator_sequences_are_independent() {
        let mut ids = IdAllocator::seeded([2, 5], [2_000_000_000]);
        assert_eq!(ids.next_shape_id(), 6);
        assert_eq!(ids.next_creation_id(), 2_000_000_001);
        assert_eq!(ids.next_shape_id(), 7);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            #[test]
            fn prop_allocations_never_collide(
                observed in proptest::collection::vec(any::<u32>(), 0..32),
                count in 1usize..64,
            ) {
                let reserved: HashSet<u32> = observed.iter().copied().collect();
                let mut seq = IdSequence::above(observed);
                let mut seen = HashSet::new();
                for _ in 0..count {
                    let id = seq.next_id();
                    prop_assert!(id != 0);
                    prop_assert!(!reserved.contains(&id));
                    prop_assert!(seen.insert(id));
                }
            }
        }
    }
}
