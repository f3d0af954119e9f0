//! # Physical Page Pool
//!
//! Page-granular allocator for all physical memory handed to the hypervisor.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                Root Page Pool ([`root`])            │
//! │    • One-time publication of the process-wide pool  │
//! │    • Fatal-on-failure allocation entry points       │
//! └─────────────────┬───────────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────────┐
//! │                Page Pool ([`pool`])                 │
//! │    • First-fit search from a cursor, one wraparound │
//! │    • Size-aligned runs on request                   │
//! │    • Bitmap, free count, cursor under one lock      │
//! └─────────────────┬───────────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────────┐
//! │                Bitmap ([`bitmap`])                  │
//! │    • One bit per 4 KiB page, set = allocated        │
//! │    • Stored in pages the pool itself manages        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! [`PagePool::bootstrap`] ([`bootstrap`]) builds a pool from a
//! [`MemoryRegion`](kernel_info::memory::MemoryRegion) and a
//! [`BitmapStorage`] without needing any other allocator, and reserves the
//! bitmap's own pages in the pool.
//!
//! ## Usage
//!
//! ```rust
//! # use kernel_info::memory::MemoryRegion;
//! # use kernel_memory_addresses::{PAGE_SIZE, PhysicalAddress};
//! # use kernel_page_pool::{BitmapStorage, PagePool};
//! let region = MemoryRegion::new(PhysicalAddress::new(0x4000_0000), 64 * PAGE_SIZE);
//!
//! // Keep the bitmap in the first page of the region.
//! let mut bytes = vec![0u8; PAGE_SIZE as usize];
//! let storage = BitmapStorage::new(region.base, &mut bytes);
//!
//! let pool = PagePool::bootstrap(region, storage).unwrap();
//! assert_eq!(pool.free_pages(), 63);
//!
//! let pages = pool.allocate(4, true).unwrap();
//! assert_eq!(pages.base().as_u64() % (4 * PAGE_SIZE), 0);
//! ```
//!
//! Memory is never returned to a pool.

#![cfg_attr(not(any(test, doctest)), no_std)]

pub mod bitmap;
pub mod bootstrap;
pub mod pool;
pub mod root;

pub use bootstrap::{BitmapStorage, bitmap_pages_for, bitmap_storage_pages};
pub use pool::{PagePool, PoolError};
#[cfg(target_os = "none")]
pub use root::initialize;
pub use root::{allocate_pages, allocate_physical_pages, init_root_pool, root_page_pool};
