//! Tools to deal with codes.

use std::fmt;

/// `Code` represents a codeword as a sequence of bits.
///
/// The first bit of the codeword (the one chosen at the root) is the most significant
/// of the `len` lowest bits of `bits`.
/// Huffman trees built from `u64` weights are never deep enough to exceed its capacity.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default, Hash)]
pub struct Code {
    /// Concatenated bits of the codeword.
    pub bits: u128,
    /// Number of bits.
    pub len: u8
}

impl Code {
    /// Appends `bit` to the end of `self`.
    #[inline] pub fn push(&mut self, bit: bool) {
        self.bits = (self.bits << 1) | bit as u128;
        self.len += 1;
    }

    /// Returns `self` extended with `bit`.
    #[inline] #[must_use] pub fn pushed(mut self, bit: bool) -> Self {
        self.push(bit);
        self
    }

    /// Gets `bit_nr`-th bit, counting from the beginning of the codeword.
    /// `bit_nr` must be less than `self.len`.
    #[inline] pub fn get(&self, bit_nr: u8) -> bool {
        debug_assert!(bit_nr < self.len, "bit {} of {}-bit code", bit_nr, self.len);
        (self.bits >> (self.len - bit_nr - 1)) & 1 == 1
    }

    /// Returns iterator over bits of `self`, from the first to the last one.
    pub fn iter(&self) -> impl Iterator<Item = bool> + ExactSizeIterator + DoubleEndedIterator {
        let bits = self.bits;
        (0..self.len).rev().map(move |shift| (bits >> shift) & 1 == 1)
    }

    /// Returns whether `self` is a prefix of (or equal to) `other`.
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        self.len <= other.len && other.bits >> (other.len - self.len) == self.bits
    }

    /// Returns whether `self` consists of zero bits.
    #[inline] pub fn is_empty(&self) -> bool { self.len == 0 }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.iter().try_for_each(|bit| f.write_str(if bit { "1" } else { "0" }))
    }
}

impl dyn_size_of::GetSize for Code {}
