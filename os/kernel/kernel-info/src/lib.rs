//! # Boot-Provided Memory Layout
//!
//! This crate is the single place that knows how the boot image describes the
//! memory handed to the hypervisor. The linker script exports two symbols that
//! delimit the managed span:
//!
//! ```text
//! __mem_vm_begin ┌─────────────────────────────────┐
//!                │   Managed span (page pool)      │
//!                │   guest carve-outs, page        │
//!                │   tables, internal heaps        │
//! __mem_vm_end   ├─────────────────────────────────┤
//!                │   Page pool bitmap              │
//!                └─────────────────────────────────┘
//! ```
//!
//! [`memory::MemoryRegion`] is the portable description of such a span. On
//! bare metal (`target_os = "none"`), [`memory::vm_memory_region`] and
//! [`memory::bitmap_placement`] read the linker symbols; hosted builds (tests,
//! tools) construct regions explicitly.
//!
//! The crate contains no unsafe code except the linker symbol declarations.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod memory;
