//! Packed bit-per-page occupancy map.
//!
//! Bit `i` lives in byte `i / 8` under mask `1 << (i % 8)`. A set bit means the
//! page is allocated (or reserved), a clear bit means it is free. The map does
//! not own its storage: the page pool borrows it from memory it manages itself.

/// Outcome of [`Bitmap::find_clear_run`].
///
/// "Found" and "not found" are separate variants so that no index value can be
/// mistaken for a failed search.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BitSearch {
    /// First bit of a clear run of the requested length.
    Found(usize),
    NotFound,
}

pub struct Bitmap<'a> {
    bytes: &'a mut [u8],
}

impl<'a> Bitmap<'a> {
    /// Wrap `bytes` as-is; call [`Bitmap::clear_all`] to start from an empty map.
    pub const fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes }
    }

    /// Number of bits the storage can hold.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.bytes.len() * 8
    }

    pub fn clear_all(&mut self) {
        self.bytes.fill(0);
    }

    /// # Panics
    /// `index` is beyond [`Bitmap::capacity`].
    #[inline]
    #[must_use]
    pub fn is_set(&self, index: usize) -> bool {
        self.bytes[index / 8] & Self::mask(index) != 0
    }

    /// Mark `[start, start + count)` as used.
    ///
    /// # Panics
    /// The run extends beyond [`Bitmap::capacity`].
    pub fn set_run(&mut self, start: usize, count: usize) {
        let end = start + count;
        assert!(end <= self.capacity(), "bit run {start}+{count} out of range");

        let mut i = start;
        while i < end {
            if i % 8 == 0 && end - i >= 8 {
                self.bytes[i / 8] = u8::MAX;
                i += 8;
            } else {
                self.bytes[i / 8] |= Self::mask(i);
                i += 1;
            }
        }
    }

    /// Number of set bits across the whole storage.
    #[must_use]
    pub fn count_set(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Find the first run of `len` clear bits that starts at or after `from`
    /// and ends at or before `limit`.
    ///
    /// `limit` is clamped to the storage capacity. A zero-length run is found
    /// at `from` whenever `from <= limit`.
    #[must_use]
    pub fn find_clear_run(&self, limit: usize, from: usize, len: usize) -> BitSearch {
        let limit = limit.min(self.capacity());
        if len == 0 {
            return if from <= limit {
                BitSearch::Found(from)
            } else {
                BitSearch::NotFound
            };
        }

        let mut run_start = from;
        let mut i = from;
        while i < limit && run_start + len <= limit {
            // Whole bytes of used pages can be skipped at once.
            if i % 8 == 0 && self.bytes[i / 8] == u8::MAX {
                i += 8;
                run_start = i;
                continue;
            }

            i += 1;
            if self.is_set(i - 1) {
                run_start = i;
            } else if i - run_start == len {
                return BitSearch::Found(run_start);
            }
        }

        BitSearch::NotFound
    }

    #[inline]
    const fn mask(index: usize) -> u8 {
        1 << (index % 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn used(bitmap: &Bitmap<'_>) -> Vec<usize> {
        (0..bitmap.capacity()).filter(|&i| bitmap.is_set(i)).collect()
    }

    #[test]
    fn clear_all_zeroes_storage() {
        let mut bytes = [0xA5u8; 4];
        let mut bitmap = Bitmap::new(&mut bytes);
        assert_eq!(bitmap.count_set(), 16);
        bitmap.clear_all();
        assert_eq!(bitmap.count_set(), 0);
    }

    #[test]
    fn set_run_spans_byte_boundaries() {
        let mut bytes = [0u8; 4];
        let mut bitmap = Bitmap::new(&mut bytes);
        bitmap.set_run(5, 14);
        assert_eq!(used(&bitmap), (5..19).collect::<Vec<_>>());
        assert_eq!(bitmap.count_set(), 14);
    }

    #[test]
    fn set_run_of_zero_is_noop() {
        let mut bytes = [0u8; 1];
        let mut bitmap = Bitmap::new(&mut bytes);
        bitmap.set_run(8, 0);
        assert_eq!(bitmap.count_set(), 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn set_run_past_capacity_panics() {
        let mut bytes = [0u8; 1];
        let mut bitmap = Bitmap::new(&mut bytes);
        bitmap.set_run(6, 3);
    }

    #[test]
    fn finds_first_fit_after_start() {
        let mut bytes = [0u8; 2];
        let mut bitmap = Bitmap::new(&mut bytes);
        bitmap.set_run(0, 2);
        bitmap.set_run(4, 1);

        assert_eq!(bitmap.find_clear_run(16, 0, 2), BitSearch::Found(2));
        assert_eq!(bitmap.find_clear_run(16, 0, 3), BitSearch::Found(5));
        assert_eq!(bitmap.find_clear_run(16, 6, 3), BitSearch::Found(6));
    }

    #[test]
    fn run_must_end_within_limit() {
        let mut bytes = [0u8; 2];
        let bitmap = Bitmap::new(&mut bytes);
        assert_eq!(bitmap.find_clear_run(10, 7, 3), BitSearch::Found(7));
        assert_eq!(bitmap.find_clear_run(10, 8, 3), BitSearch::NotFound);
        assert_eq!(bitmap.find_clear_run(10, 12, 1), BitSearch::NotFound);
    }

    #[test]
    fn limit_is_clamped_to_capacity() {
        let mut bytes = [0u8; 1];
        let bitmap = Bitmap::new(&mut bytes);
        assert_eq!(bitmap.find_clear_run(1000, 0, 8), BitSearch::Found(0));
        assert_eq!(bitmap.find_clear_run(1000, 0, 9), BitSearch::NotFound);
    }

    #[test]
    fn full_map_is_not_found() {
        let mut bytes = [0u8; 3];
        let mut bitmap = Bitmap::new(&mut bytes);
        bitmap.set_run(0, 24);
        assert_eq!(bitmap.find_clear_run(24, 0, 1), BitSearch::NotFound);
    }

    #[test]
    fn skips_full_bytes() {
        let mut bytes = [0u8; 4];
        let mut bitmap = Bitmap::new(&mut bytes);
        bitmap.set_run(0, 24);
        bitmap.set_run(27, 1);
        assert_eq!(bitmap.find_clear_run(32, 0, 3), BitSearch::Found(24));
        assert_eq!(bitmap.find_clear_run(32, 0, 4), BitSearch::Found(28));
    }

    #[test]
    fn zero_length_run() {
        let mut bytes = [0xFFu8; 1];
        let bitmap = Bitmap::new(&mut bytes);
        assert_eq!(bitmap.find_clear_run(8, 3, 0), BitSearch::Found(3));
        assert_eq!(bitmap.find_clear_run(8, 9, 0), BitSearch::NotFound);
    }
}
