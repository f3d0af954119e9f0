//! # Root Page Pool
//!
//! The process-wide pool that owns all memory handed to the hypervisor.
//!
//! The root is published exactly once, either by [`initialize`] from the boot
//! symbols or by [`init_root_pool`] from an explicit region. Later allocation
//! calls go through [`allocate_physical_pages`] and [`allocate_pages`], which
//! treat every failure as fatal: there is no recovery from running out of
//! physical memory this early.

use crate::bootstrap::BitmapStorage;
use crate::pool::{PagePool, PoolError};
use core::ptr;
use kernel_info::memory::MemoryRegion;
use kernel_memory_addresses::PhysicalPages;
use kernel_sync::SyncOnceCell;
use log::{debug, error};

static ROOT_PAGE_POOL: SyncOnceCell<PagePool<'static>> = SyncOnceCell::new();

/// Bootstrap a pool over `region` and publish it as the root.
///
/// # Errors
/// Any [`PagePool::bootstrap`] error, or [`PoolError::AlreadyInitialized`] if a
/// root pool exists. Losing an initialization race also reports
/// `AlreadyInitialized`; the loser's pool is dropped.
pub fn init_root_pool(
    region: MemoryRegion,
    storage: BitmapStorage<'static>,
) -> Result<&'static PagePool<'static>, PoolError> {
    if ROOT_PAGE_POOL.is_initialized() {
        return Err(PoolError::AlreadyInitialized);
    }

    let pool = PagePool::bootstrap(region, storage)?;
    let pool = ROOT_PAGE_POOL
        .set(pool)
        .map_err(|_| PoolError::AlreadyInitialized)?;

    debug!(
        "root page pool published: {} free of {} pages",
        pool.free_pages(),
        pool.nr_pages()
    );
    Ok(pool)
}

/// The root pool, if it has been published.
#[must_use]
pub fn root_page_pool() -> Option<&'static PagePool<'static>> {
    ROOT_PAGE_POOL.get()
}

/// Bring up the root pool over `[__mem_vm_begin, __mem_vm_end)`, with the
/// bitmap placed at `__mem_vm_end`.
///
/// # Panics
/// The linker-provided span cannot host a pool, or the root already exists.
#[cfg(target_os = "none")]
#[allow(unsafe_code)]
pub fn initialize() -> &'static PagePool<'static> {
    use crate::bootstrap::bitmap_storage_pages;
    use kernel_info::memory::{bitmap_placement, vm_memory_region};
    use kernel_memory_addresses::{PAGE_SIZE, Size4K};

    let region = vm_memory_region();
    let placement = bitmap_placement();
    let pageoff = placement
        .checked_offset_from(region.base.align_up::<Size4K>())
        .unwrap_or(0)
        / PAGE_SIZE;
    let len = bitmap_storage_pages(region.size / PAGE_SIZE, pageoff) * PAGE_SIZE;

    // SAFETY: the linker script reserves the bytes past `__mem_vm_end` for the
    // bitmap, identity mapped and unused by anything else.
    #[allow(clippy::cast_possible_truncation)]
    let storage = unsafe { BitmapStorage::from_raw(placement, len as usize) };

    match init_root_pool(region, storage) {
        Ok(pool) => {
            log::info!(
                "memory: {:?}, {} pages ({} free)",
                region,
                pool.nr_pages(),
                pool.free_pages()
            );
            pool
        }
        Err(err) => fatal(err),
    }
}

/// Allocate `nr_pages` pages from the root pool.
///
/// # Panics
/// The root pool is not initialized or cannot satisfy the request.
#[must_use]
pub fn allocate_physical_pages(nr_pages: u64, aligned: bool) -> PhysicalPages {
    let Some(pool) = root_page_pool() else {
        fatal(PoolError::Uninitialized)
    };

    match pool.allocate(nr_pages, aligned) {
        Ok(pages) => pages,
        Err(err) => fatal(err),
    }
}

/// Like [`allocate_physical_pages`], returning the identity-mapped base pointer.
///
/// A request for zero pages returns a null pointer.
///
/// # Panics
/// See [`allocate_physical_pages`].
#[must_use]
pub fn allocate_pages(nr_pages: u64, aligned: bool) -> *mut u8 {
    let pages = allocate_physical_pages(nr_pages, aligned);
    if pages.is_empty() {
        ptr::null_mut()
    } else {
        pages.base().as_mut_ptr()
    }
}

#[cold]
#[track_caller]
fn fatal(err: PoolError) -> ! {
    error!("page pool: {err}");
    panic!("page pool: {err}");
}
