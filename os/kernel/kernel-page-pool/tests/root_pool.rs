use kernel_info::memory::MemoryRegion;
use kernel_memory_addresses::{PAGE_SIZE, PhysicalAddress};
use kernel_page_pool::{
    BitmapStorage, PagePool, PoolError, allocate_pages, allocate_physical_pages, init_root_pool,
    root_page_pool,
};
use std::sync::Once;

const REGION_BASE: u64 = 0x8000_0000;
const REGION_PAGES: u64 = 256;

fn leaked_storage(base: u64) -> BitmapStorage<'static> {
    let bytes: &'static mut [u8] = Box::leak(vec![0u8; PAGE_SIZE as usize].into_boxed_slice());
    BitmapStorage::new(PhysicalAddress::new(base), bytes)
}

/// Publish the root the way boot does: bitmap right after the managed span.
fn root() -> &'static PagePool<'static> {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let region = MemoryRegion::new(PhysicalAddress::new(REGION_BASE), REGION_PAGES * PAGE_SIZE);
        let pool = init_root_pool(region, leaked_storage(region.end().as_u64())).unwrap();
        assert_eq!(pool.free_pages(), REGION_PAGES - 1);
    });
    root_page_pool().unwrap()
}

#[test]
fn root_is_published_once() {
    let pool = root();
    assert!(std::ptr::eq(pool, root_page_pool().unwrap()));

    let region = MemoryRegion::new(PhysicalAddress::new(0x9000_0000), 16 * PAGE_SIZE);
    assert_eq!(
        init_root_pool(region, leaked_storage(0x9000_0000)).unwrap_err(),
        PoolError::AlreadyInitialized
    );
    assert_eq!(pool.base().as_u64(), REGION_BASE);
}

#[test]
fn physical_pages_come_from_root() {
    let pool = root();
    let pages = allocate_physical_pages(2, true);
    assert_eq!(pages.nr_pages(), 2);
    assert_eq!(pages.base().as_u64() % (2 * PAGE_SIZE), 0);
    assert!(pool.contains(pages.base()));
    assert!(pages.end() <= pool.end());
}

#[test]
fn pointer_is_identity_mapped_base() {
    let pool = root();
    let ptr = allocate_pages(1, false);
    assert!(!ptr.is_null());
    assert!(pool.contains(PhysicalAddress::from_ptr(ptr)));
    assert_eq!(ptr as u64 % PAGE_SIZE, 0);
}

#[test]
fn zero_pages_yield_null_pointer() {
    let pool = root();
    let free = pool.free_pages();
    assert!(allocate_pages(0, true).is_null());
    assert!(allocate_physical_pages(0, false).is_empty());
    assert!(pool.free_pages() <= free);
}

#[test]
#[should_panic(expected = "no memory for 1024 pages")]
fn exhaustion_is_fatal() {
    root();
    let _ = allocate_physical_pages(1024, false);
}
