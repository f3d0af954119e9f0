use crate::{PAGE_SIZE, PhysicalAddress, Size4K};
use core::fmt;

/// A contiguous run of 4 KiB physical pages.
///
/// This is the value an allocation hands to its caller: `nr_pages` pages
/// starting at the page-aligned `base`. Ownership of the run passes to whoever
/// holds the descriptor; nothing in the pool keeps a reference to it.
///
/// The empty run (`nr_pages == 0`) has a zero base and contains no address.
///
/// ### Invariants
/// - `base` is 4 KiB aligned (checked in debug builds).
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct PhysicalPages {
    base: PhysicalAddress,
    nr_pages: u64,
}

impl PhysicalPages {
    /// Describe `nr_pages` pages starting at `base`.
    ///
    /// Panics in debug if `base` is not page aligned.
    #[inline]
    #[must_use]
    pub fn new(base: PhysicalAddress, nr_pages: u64) -> Self {
        debug_assert!(base.is_aligned::<Size4K>(), "unaligned page run base");
        Self { base, nr_pages }
    }

    /// The run of zero pages.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            base: PhysicalAddress::zero(),
            nr_pages: 0,
        }
    }

    #[inline]
    #[must_use]
    pub const fn base(self) -> PhysicalAddress {
        self.base
    }

    #[inline]
    #[must_use]
    pub const fn nr_pages(self) -> u64 {
        self.nr_pages
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.nr_pages == 0
    }

    #[inline]
    #[must_use]
    pub const fn size_in_bytes(self) -> u64 {
        self.nr_pages * PAGE_SIZE
    }

    /// First address past the run.
    #[inline]
    #[must_use]
    pub const fn end(self) -> PhysicalAddress {
        PhysicalAddress::new(self.base.as_u64() + self.size_in_bytes())
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, addr: PhysicalAddress) -> bool {
        addr.as_u64() >= self.base.as_u64() && addr.as_u64() < self.end().as_u64()
    }

    /// Whether the two runs share at least one page. Empty runs overlap nothing.
    #[inline]
    #[must_use]
    pub const fn overlaps(self, other: Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.base.as_u64() < other.end().as_u64()
            && other.base.as_u64() < self.end().as_u64()
    }
}

impl fmt::Debug for PhysicalPages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PhysicalPages({:#018X}, {} pages)",
            self.base.as_u64(),
            self.nr_pages
        )
    }
}

impl fmt::Display for PhysicalPages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.base, self.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_run_contains_nothing() {
        let run = PhysicalPages::empty();
        assert!(run.is_empty());
        assert_eq!(run.size_in_bytes(), 0);
        assert!(!run.contains(PhysicalAddress::zero()));
    }

    #[test]
    fn run_bounds() {
        let run = PhysicalPages::new(PhysicalAddress::new(0x10_0000), 3);
        assert_eq!(run.end().as_u64(), 0x10_3000);
        assert!(run.contains(PhysicalAddress::new(0x10_0000)));
        assert!(run.contains(PhysicalAddress::new(0x10_2FFF)));
        assert!(!run.contains(PhysicalAddress::new(0x10_3000)));
        assert!(!run.contains(PhysicalAddress::new(0x0F_FFFF)));
    }

    #[test]
    fn overlap_is_symmetric_and_half_open() {
        let a = PhysicalPages::new(PhysicalAddress::new(0x1000), 2);
        let b = PhysicalPages::new(PhysicalAddress::new(0x3000), 1);
        let c = PhysicalPages::new(PhysicalAddress::new(0x2000), 4);

        assert!(!a.overlaps(b));
        assert!(!b.overlaps(a));
        assert!(a.overlaps(c) && c.overlaps(a));
        assert!(b.overlaps(c));
        assert!(!a.overlaps(PhysicalPages::empty()));
    }
}
