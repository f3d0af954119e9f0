//! # Pool Bootstrap
//!
//! Builds a [`PagePool`] over a [`MemoryRegion`] without any other allocator.
//! The bitmap's backing bytes come from a [`BitmapStorage`] whose physical
//! location the pool can itself describe; the pages holding the bitmap are
//! marked allocated before the pool is handed out.

use crate::bitmap::Bitmap;
use crate::pool::{PagePool, PoolError, PoolState};
use core::fmt;
use kernel_info::memory::MemoryRegion;
use kernel_memory_addresses::{PAGE_SIZE, PhysicalAddress, Size4K};
use log::info;

/// Bits per bitmap page.
const BITS_PER_PAGE: u64 = 8 * PAGE_SIZE;

/// Backing bytes for a pool bitmap, plus the physical address they live at.
///
/// The address is what the pool uses to decide which of its own pages the
/// bitmap occupies; it must be the location of `bytes` as the pool sees it.
pub struct BitmapStorage<'a> {
    base: PhysicalAddress,
    bytes: &'a mut [u8],
}

impl<'a> BitmapStorage<'a> {
    pub const fn new(base: PhysicalAddress, bytes: &'a mut [u8]) -> Self {
        Self { base, bytes }
    }

    /// Storage of `len` bytes at `base`, accessed through the identity mapping.
    ///
    /// # Safety
    /// `[base, base + len)` must be mapped at the same virtual address, writable,
    /// and not referenced by anything else for `'a`.
    #[allow(unsafe_code)]
    pub unsafe fn from_raw(base: PhysicalAddress, len: usize) -> Self {
        // SAFETY: exclusivity and mapping are the caller's contract.
        let bytes = unsafe { core::slice::from_raw_parts_mut(base.as_mut_ptr::<u8>(), len) };
        Self { base, bytes }
    }

    #[must_use]
    pub const fn base(&self) -> PhysicalAddress {
        self.base
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for BitmapStorage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitmapStorage")
            .field("base", &self.base)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Pages needed for a bitmap covering `nr_pages` pages.
#[must_use]
pub const fn bitmap_pages_for(nr_pages: u64) -> u64 {
    nr_pages.div_ceil(BITS_PER_PAGE)
}

/// Storage pages needed for a bitmap of a `nr_pages` pool placed `pageoff`
/// pages past the pool base.
///
/// Usually equal to [`bitmap_pages_for`]. When the bitmap's own run extends
/// past the pool, the storage grows until it has bits for that run too.
#[must_use]
pub const fn bitmap_storage_pages(nr_pages: u64, pageoff: u64) -> u64 {
    let covered = pageoff + bitmap_pages_for(nr_pages);
    if covered > nr_pages {
        bitmap_pages_for(covered)
    } else {
        bitmap_pages_for(nr_pages)
    }
}

impl<'a> PagePool<'a> {
    /// Build a pool spanning `region`, with its bitmap in `storage`.
    ///
    /// The pool starts at `region.base` rounded up to a page and spans
    /// `region.size / PAGE_SIZE` pages. `storage` is truncated to
    /// [`bitmap_storage_pages`], zeroed, and the `bitmap_pages_for(nr_pages)`
    /// pages starting at its base are marked allocated. The storage may sit at
    /// or after the end of the region; the bitmap then carries bits past the
    /// pool for its own run.
    ///
    /// # Errors
    /// - [`PoolError::SetupInfeasible`] if the region cannot hold its bitmap and
    ///   at least one more page.
    /// - [`PoolError::BitmapOutOfReach`] if `storage` is unaligned or below the
    ///   pool.
    /// - [`PoolError::BitmapStorageTooSmall`] if `storage` is shorter than
    ///   [`bitmap_storage_pages`].
    pub fn bootstrap(region: MemoryRegion, storage: BitmapStorage<'a>) -> Result<Self, PoolError> {
        let base = region.base.align_up::<Size4K>();
        let nr_pages = region.size / PAGE_SIZE;
        let bitmap_pages = bitmap_pages_for(nr_pages);

        if nr_pages <= bitmap_pages {
            return Err(PoolError::SetupInfeasible {
                nr_pages,
                bitmap_pages,
            });
        }

        if !storage.base.is_aligned::<Size4K>() {
            return Err(PoolError::BitmapOutOfReach);
        }
        let pageoff = storage
            .base
            .checked_offset_from(base)
            .ok_or(PoolError::BitmapOutOfReach)?
            / PAGE_SIZE;

        let required = bitmap_storage_pages(nr_pages, pageoff) * PAGE_SIZE;
        let provided = storage.bytes.len() as u64;
        if provided < required {
            return Err(PoolError::BitmapStorageTooSmall { required, provided });
        }

        let BitmapStorage {
            base: storage_base,
            bytes,
        } = storage;
        let (bytes, _) = bytes.split_at_mut(to_len(required));
        let mut bitmap = Bitmap::new(bytes);
        bitmap.clear_all();
        bitmap.set_run(to_len(pageoff), to_len(bitmap_pages));

        info!(
            "page pool: {nr_pages} pages at {base}, {bitmap_pages}-page bitmap at {storage_base}"
        );

        let state = PoolState {
            bitmap,
            free: nr_pages - bitmap_pages,
            last: 0,
        };
        Ok(Self::from_parts(base, nr_pages, bitmap_pages, state))
    }
}

#[inline]
#[allow(clippy::cast_possible_truncation)]
const fn to_len(value: u64) -> usize {
    value as usize
}
