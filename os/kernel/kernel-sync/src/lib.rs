//! # Kernel synchronization primitives
//!
//! The two primitives the page pool is built on:
//!
//! * [`SpinLock`] guards mutable allocator state with a busy-waiting lock and
//!   an RAII [`SpinLockGuard`].
//! * [`SyncOnceCell`] publishes a process-wide singleton exactly once.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod spin_lock;
mod sync_once_cell;

pub use spin_lock::{SpinLock, SpinLockGuard};
pub use sync_once_cell::SyncOnceCell;
