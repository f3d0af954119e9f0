//! # Physical Memory Address Types
//!
//! Strongly typed wrappers for raw addresses and page runs used by the page
//! pool and its callers.
//!
//! ## Overview
//!
//! | Type | Description |
//! |------|-------------|
//! | [`MemoryAddress`] | A raw 64-bit address with page alignment helpers. |
//! | [`PhysicalAddress`] | A [`MemoryAddress`] with physical intent. |
//! | [`PhysicalPages`] | A contiguous run of 4 KiB physical pages, `{ base, nr_pages }`. |
//!
//! Page sizes are expressed as marker types implementing [`PageSize`]. The
//! allocator works at [`Size4K`] granularity; [`PAGE_SIZE`] is the byte size
//! of that page.
//!
//! ## Typical Usage
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let pa = PhysicalAddress::new(0x0010_0042);
//! assert_eq!(pa.align_up::<Size4K>().as_u64(), 0x0010_1000);
//! assert_eq!(pa.align_down::<Size4K>().as_u64(), 0x0010_0000);
//!
//! let run = PhysicalPages::new(PhysicalAddress::new(0x0020_0000), 4);
//! assert_eq!(run.size_in_bytes(), 4 * PAGE_SIZE);
//! assert!(run.contains(PhysicalAddress::new(0x0020_3FFF)));
//! assert!(!run.contains(run.end()));
//! ```
//!
//! ## Design Notes
//!
//! - The address types are `#[repr(transparent)]` and implement `Copy`, `Eq`,
//!   `Ord`, and `Hash`.
//! - Alignment calculations are `const fn`.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code, clippy::inline_always)]

mod memory_address;
mod page_size;
mod physical_address;
mod physical_pages;

pub use memory_address::MemoryAddress;
pub use page_size::{PageSize, Size4K};
pub use physical_address::PhysicalAddress;
pub use physical_pages::PhysicalPages;

/// Allocation granularity in bytes.
pub const PAGE_SIZE: u64 = Size4K::SIZE;
