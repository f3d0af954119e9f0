//! # Memory Layout

use core::fmt;
use kernel_memory_addresses::PhysicalAddress;

/// A contiguous physical address range discovered at boot.
///
/// The region is read once to seed the page pool and is never mutated. `size`
/// is in bytes and need not be a multiple of the page size.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct MemoryRegion {
    pub base: PhysicalAddress,
    pub size: u64,
}

impl MemoryRegion {
    #[must_use]
    pub const fn new(base: PhysicalAddress, size: u64) -> Self {
        Self { base, size }
    }

    /// The region `[begin, end)`, or `None` if `end` lies below `begin`.
    #[must_use]
    pub const fn from_bounds(begin: PhysicalAddress, end: PhysicalAddress) -> Option<Self> {
        match end.checked_offset_from(begin) {
            Some(size) => Some(Self::new(begin, size)),
            None => None,
        }
    }

    /// First address past the region.
    #[must_use]
    pub const fn end(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.base.as_u64() + self.size)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }
}

impl fmt::Debug for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MemoryRegion({:#018X}..{:#018X})",
            self.base.as_u64(),
            self.end().as_u64()
        )
    }
}

/// Symbols exported by the hypervisor linker script.
#[cfg(target_os = "none")]
#[allow(unsafe_code)]
mod linker {
    unsafe extern "C" {
        /// First byte of the managed span.
        pub safe static __mem_vm_begin: u8;
        /// First byte past the managed span; the pool bitmap is placed here.
        pub safe static __mem_vm_end: u8;
    }
}

/// The managed span `[__mem_vm_begin, __mem_vm_end)`.
///
/// # Panics
/// The linker script placed `__mem_vm_end` below `__mem_vm_begin`.
#[cfg(target_os = "none")]
#[must_use]
pub fn vm_memory_region() -> MemoryRegion {
    let begin = PhysicalAddress::from_ptr(&raw const linker::__mem_vm_begin);
    let end = PhysicalAddress::from_ptr(&raw const linker::__mem_vm_end);
    MemoryRegion::from_bounds(begin, end).expect("__mem_vm_end below __mem_vm_begin")
}

/// Where the page pool stores its bitmap: immediately after the managed span.
#[cfg(target_os = "none")]
#[must_use]
pub fn bitmap_placement() -> PhysicalAddress {
    PhysicalAddress::from_ptr(&raw const linker::__mem_vm_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_round_trip() {
        let begin = PhysicalAddress::new(0x4000_0000);
        let end = PhysicalAddress::new(0x4040_0000);
        let region = MemoryRegion::from_bounds(begin, end).unwrap();
        assert_eq!(region.base, begin);
        assert_eq!(region.size, 0x40_0000);
        assert_eq!(region.end(), end);
        assert!(!region.is_empty());
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let begin = PhysicalAddress::new(0x2000);
        let end = PhysicalAddress::new(0x1000);
        assert!(MemoryRegion::from_bounds(begin, end).is_none());
        assert!(MemoryRegion::from_bounds(begin, begin).unwrap().is_empty());
    }
}
