//! # Page Pool
//!
//! A single contiguous span of physical pages tracked by a [`Bitmap`].
//!
//! All mutable bookkeeping (bitmap, free count, cursor) lives in one
//! [`PoolState`] behind one [`SpinLock`]; an allocation marks bits, updates the
//! free count and advances the cursor under a single guard, so concurrent
//! callers are linearised and never receive overlapping runs.
//!
//! ## Search
//!
//! Allocation is first-fit starting at the cursor (the index just past the
//! previous allocation) and wraps around to the start of the pool once. Aligned
//! requests of `n` pages only accept runs whose physical base is a multiple of
//! `n * PAGE_SIZE`; candidate runs that start off a boundary make the search
//! resume at the next boundary.
//!
//! Pages are never returned to the pool.

use crate::bitmap::{BitSearch, Bitmap};
use core::fmt;
use kernel_memory_addresses::{PAGE_SIZE, PhysicalAddress, PhysicalPages, Size4K};
use kernel_sync::SpinLock;
use log::{trace, warn};

/// How many times the search may restart from the beginning of its range.
const SWEEPS: usize = 2;

pub struct PagePool<'a> {
    base: PhysicalAddress,
    nr_pages: u64,
    bitmap_pages: u64,
    state: SpinLock<PoolState<'a>>,
}

/// Lock-protected part of a [`PagePool`].
pub(crate) struct PoolState<'a> {
    pub(crate) bitmap: Bitmap<'a>,
    /// Pages not marked in the bitmap, i.e. `nr_pages - popcount(bitmap)`.
    pub(crate) free: u64,
    /// Bit index just past the most recent allocation.
    pub(crate) last: u64,
}

impl<'a> PagePool<'a> {
    /// Assemble a pool from already-prepared state. See [`PagePool::bootstrap`].
    pub(crate) const fn from_parts(
        base: PhysicalAddress,
        nr_pages: u64,
        bitmap_pages: u64,
        state: PoolState<'a>,
    ) -> Self {
        Self {
            base,
            nr_pages,
            bitmap_pages,
            state: SpinLock::new(state),
        }
    }

    /// Allocate `nr_pages` contiguous pages.
    ///
    /// With `aligned` set, the returned base is a multiple of
    /// `nr_pages * PAGE_SIZE`. A request for zero pages succeeds with
    /// [`PhysicalPages::empty`] and touches nothing.
    ///
    /// # Errors
    /// [`PoolError::Exhausted`] if the pool has fewer than `nr_pages` free pages
    /// or no suitable run exists. The pool is left unchanged in that case.
    pub fn allocate(&self, nr_pages: u64, aligned: bool) -> Result<PhysicalPages, PoolError> {
        if nr_pages == 0 {
            return Ok(PhysicalPages::empty());
        }

        let result = {
            let mut state = self.state.lock();
            self.claim(&mut state, nr_pages, aligned)
        };

        match &result {
            Ok(pages) => trace!("page pool: allocated {pages} (aligned: {aligned})"),
            Err(err) => warn!("page pool: {err} ({} free)", self.free_pages()),
        }
        result
    }

    /// Search and mark a run. Runs with the pool lock held.
    fn claim(
        &self,
        state: &mut PoolState<'_>,
        n: u64,
        aligned: bool,
    ) -> Result<PhysicalPages, PoolError> {
        let exhausted = PoolError::Exhausted {
            requested: n,
            aligned,
        };
        if state.free == 0 || n > state.free {
            return Err(exhausted);
        }

        // Bit `i` is a valid aligned start iff (i + start) % n == 0.
        let start = if aligned {
            self.base.page_index::<Size4K>() % n
        } else {
            0
        };

        let mut curr = if aligned {
            next_boundary(state.last, start, n)
        } else {
            state.last
        };

        for _ in 0..SWEEPS {
            loop {
                let bit = match state.bitmap.find_clear_run(
                    to_index(self.nr_pages),
                    to_index(curr),
                    to_index(n),
                ) {
                    BitSearch::Found(bit) => bit as u64,
                    BitSearch::NotFound => break,
                };

                if aligned && (bit + start) % n != 0 {
                    curr = next_boundary(bit, start, n);
                    continue;
                }

                state.bitmap.set_run(to_index(bit), to_index(n));
                state.free -= n;
                state.last = bit + n;
                return Ok(PhysicalPages::new(self.page_address(bit), n));
            }

            curr = if aligned { next_boundary(0, start, n) } else { 0 };
        }

        Err(exhausted)
    }

    /// Page-aligned first address of the pool.
    #[must_use]
    pub const fn base(&self) -> PhysicalAddress {
        self.base
    }

    /// First address past the pool.
    #[must_use]
    pub const fn end(&self) -> PhysicalAddress {
        self.page_address(self.nr_pages)
    }

    /// Number of pages the pool spans, including those backing its bitmap.
    #[must_use]
    pub const fn nr_pages(&self) -> u64 {
        self.nr_pages
    }

    /// Pages reserved for the bitmap at bootstrap.
    #[must_use]
    pub const fn bitmap_pages(&self) -> u64 {
        self.bitmap_pages
    }

    #[must_use]
    pub fn free_pages(&self) -> u64 {
        self.state.lock().free
    }

    #[must_use]
    pub fn used_pages(&self) -> u64 {
        self.nr_pages - self.free_pages()
    }

    /// Number of set bits in the bitmap storage, including the bitmap's own run.
    #[must_use]
    pub fn marked_pages(&self) -> u64 {
        self.state.lock().bitmap.count_set() as u64
    }

    /// Index just past the most recent allocation.
    #[must_use]
    pub fn cursor(&self) -> u64 {
        self.state.lock().last
    }

    /// Whether page `index` is marked, or `None` if the bitmap has no bit for it.
    #[must_use]
    pub fn is_allocated(&self, index: u64) -> Option<bool> {
        let state = self.state.lock();
        let index = to_index(index);
        (index < state.bitmap.capacity()).then(|| state.bitmap.is_set(index))
    }

    /// Whether `addr` lies within `[base, end)`.
    #[must_use]
    pub fn contains(&self, addr: PhysicalAddress) -> bool {
        addr >= self.base && addr < self.end()
    }

    const fn page_address(&self, index: u64) -> PhysicalAddress {
        PhysicalAddress::new(self.base.as_u64() + index * PAGE_SIZE)
    }
}

impl fmt::Debug for PagePool<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagePool")
            .field("base", &self.base)
            .field("nr_pages", &self.nr_pages)
            .field("bitmap_pages", &self.bitmap_pages)
            .finish_non_exhaustive()
    }
}

/// Smallest `i >= from` with `(i + start) % n == 0`.
const fn next_boundary(from: u64, start: u64, n: u64) -> u64 {
    from + (n - (from + start) % n) % n
}

#[inline]
#[allow(clippy::cast_possible_truncation)]
const fn to_index(value: u64) -> usize {
    value as usize
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("memory region of {nr_pages} pages cannot hold its own {bitmap_pages}-page bitmap")]
    SetupInfeasible { nr_pages: u64, bitmap_pages: u64 },
    #[error("bitmap storage too small: {required} bytes required, {provided} provided")]
    BitmapStorageTooSmall { required: u64, provided: u64 },
    #[error("bitmap storage cannot be tracked by the pool it describes")]
    BitmapOutOfReach,
    #[error("no memory for {requested} pages (aligned: {aligned})")]
    Exhausted { requested: u64, aligned: bool },
    #[error("root page pool already initialized")]
    AlreadyInitialized,
    #[error("root page pool not initialized")]
    Uninitialized,
}
