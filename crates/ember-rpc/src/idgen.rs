//! Correlation-id allocation.
//!
//! Each side of the connection owns one parity of the id space: by
//! convention the extension side allocates even ids starting at 2 and the
//! editor allocates odd ids. The stride keeps the two spaces disjoint
//! without any coordination, so a response's id alone says which side
//! issued the call it answers.

/// Which half of the id space this side owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdParity {
    /// Even ids (2, 4, 6, …), conventionally the extension side.
    Even,
    /// Odd ids (1, 3, 5, …), conventionally the editor side.
    Odd,
}

impl IdParity {
    /// Distance between consecutive ids of one side.
    pub const STRIDE: i64 = 2;

    /// Remainder of every id of this parity modulo [`Self::STRIDE`].
    #[must_use]
    pub const fn remainder(self) -> i64 {
        match self {
            Self::Even => 0,
            Self::Odd => 1,
        }
    }

    const fn first(self) -> i64 {
        match self {
            Self::Even => 2,
            Self::Odd => 1,
        }
    }
}

/// Monotonic id counter with a fixed stride and parity.
///
/// Initialised once per connection and never reset; only `allocate` mutates
/// it.
#[derive(Debug)]
pub struct IdAllocator {
    next: i64,
}

impl IdAllocator {
    /// Creates an allocator owning the given parity.
    #[must_use]
    pub const fn new(parity: IdParity) -> Self {
        Self {
            next: parity.first(),
        }
    }

    /// Returns a fresh id, unique for the connection's lifetime.
    pub const fn allocate(&mut self) -> i64 {
        let id = self.next;
        self.next += IdParity::STRIDE;
        id
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(IdParity::Even)]
    #[case(IdParity::Odd)]
    fn ids_are_unique_and_keep_parity(#[case] parity: IdParity) {
        let mut allocator = IdAllocator::new(parity);
        let ids: Vec<i64> = (0..64).map(|_| allocator.allocate()).collect();

        let mut seen = ids.clone();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), ids.len(), "ids must never repeat");

        for id in ids {
            assert_eq!(id.rem_euclid(IdParity::STRIDE), parity.remainder());
        }
    }

    #[test]
    fn extension_side_starts_at_two() {
        let mut allocator = IdAllocator::new(IdParity::Even);
        assert_eq!(allocator.allocate(), 2);
        assert_eq!(allocator.allocate(), 4);
    }

    #[test]
    fn parities_never_collide() {
        let mut even = IdAllocator::new(IdParity::Even);
        let mut odd = IdAllocator::new(IdParity::Odd);
        let evens: Vec<i64> = (0..32).map(|_| even.allocate()).collect();
        let odds: Vec<i64> = (0..32).map(|_| odd.allocate()).collect();
        assert!(evens.iter().all(|id| !odds.contains(id)));
    }
}
