//! # Content Hash
//!
//! 128-bit CRC-style identity for neural SDF assets.
//!
//! Two shapes referencing byte-identical embeddings hash equal, so the atlas
//! packs them once. The polynomial and bit order match the hashes stored in
//! authored assets.

use std::fmt;

/// High polynomial word.
const POLY0: u64 = 0x8000_0000_0000_0000;
/// Low polynomial word.
const POLY1: u64 = 0x0000_0000_0000_0003;

/// Finished 128-bit content hash. Ordered by `(m0, m1)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash {
    m0: u64,
    m1: u64,
}

impl ContentHash {
    /// Builds a hash from its two words.
    #[inline]
    #[must_use]
    pub const fn from_words(m0: u64, m1: u64) -> Self {
        Self { m0, m1 }
    }

    /// The two words, high first.
    #[inline]
    #[must_use]
    pub const fn words(self) -> (u64, u64) {
        (self.m0, self.m1)
    }

    /// Hashes RGBA embedding cells, each channel fed as a 32-bit word.
    #[must_use]
    pub fn of_embeddings(cells: &[[u8; 4]]) -> Self {
        let mut hasher = ContentHasher::new();
        hasher.append_cells(cells);
        hasher.finish()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.m0, self.m1)
    }
}

/// Incremental hasher.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContentHasher {
    state: ContentHash,
}

impl ContentHasher {
    /// Fresh hasher with a zero state.
    #[must_use]
    pub const fn new() -> Self {
        Self { state: ContentHash::from_words(0, 0) }
    }

    /// Feeds one bit.
    #[inline]
    pub fn append_bit(&mut self, input: bool) {
        let ContentHash { mut m0, mut m1 } = self.state;
        let bit = u64::from(input) ^ (m1 & 1);

        m1 = (m1 >> 1) | ((m0 & 1) << 63);
        m0 >>= 1;

        m0 ^= bit * POLY0;
        m1 ^= bit * POLY1;
        self.state = ContentHash { m0, m1 };
    }

    /// Feeds 32 bits, least significant first.
    pub fn append_i32(&mut self, input: i32) {
        let mut bits = input;
        for _ in 0..i32::BITS {
            self.append_bit(bits & 1 != 0);
            bits >>= 1;
        }
    }

    /// Feeds RGBA cells channel by channel.
    pub fn append_cells(&mut self, cells: &[[u8; 4]]) {
        for cell in cells {
            for &channel in cell {
                self.append_i32(i32::from(channel));
            }
        }
    }

    /// Current state.
    #[must_use]
    pub const fn finish(&self) -> ContentHash {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_input_keeps_zero_state() {
        let mut hasher = ContentHasher::new();
        hasher.append_i32(0);
        assert_eq!(hasher.finish(), ContentHash::default());
    }

    #[test]
    fn test_single_bit() {
        let mut hasher = ContentHasher::new();
        hasher.append_bit(true);
        assert_eq!(hasher.finish().words(), (POLY0, POLY1));

        // Second one-bit: feedback bit is 1 ^ (m1 & 1) = 0, state only shifts.
        hasher.append_bit(true);
        let (m0, m1) = hasher.finish().words();
        assert_eq!(m0, POLY0 >> 1);
        assert_eq!(m1, POLY1 >> 1);
    }

    #[test]
    fn test_identical_embeddings_hash_equal() {
        let a = vec![[1u8, 2, 3, 4], [200, 100, 50, 25]];
        let b = a.clone();
        assert_eq!(ContentHash::of_embeddings(&a), ContentHash::of_embeddings(&b));
    }

    #[test]
    fn test_channel_order_matters() {
        let a = ContentHash::of_embeddings(&[[1, 2, 3, 4]]);
        let b = ContentHash::of_embeddings(&[[4, 3, 2, 1]]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_is_32_hex_digits() {
        let hash = ContentHash::from_words(1, 2);
        assert_eq!(hash.to_string().len(), 32);
        assert!(hash.to_string().ends_with('2'));
    }

    #[test]
    fn test_ordering_is_high_word_first() {
        assert!(ContentHash::from_words(1, 0) > ContentHash::from_words(0, u64::MAX));
    }
}
