//! Packed bit stream and its binary artifact.
//!
//! The artifact consists of the number of bits (little-endian `u64`) followed by
//! the bits packed into `ceil(bits/8)` bytes; bit `i` is the bit `i % 8`
//! (counting from the least significant one) of byte `i / 8`.
//! Padding bits of the last byte are never interpreted.

use std::io::{self, BufRead};
use binout::{AsIs, Serializer};
use bitm::{BitAccess, BitVec, ceiling_div};
use dyn_size_of::GetSize;
use crate::{Code, CodeTree, DecodingResult, Error, Result};

/// Sequence of bits packed into 64-bit segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitStream {
    /// Segments of bits. Bits beyond `len` are zeroed.
    pub content: Box<[u64]>,
    /// Number of bits.
    pub len: usize
}

impl Default for BitStream {
    fn default() -> Self { Self::with_len(0) }
}

impl GetSize for BitStream {
    fn size_bytes_dyn(&self) -> usize { self.content.size_bytes_dyn() }
    const USES_DYN_MEM: bool = true;
}

impl FromIterator<bool> for BitStream {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let bits: Vec<bool> = iter.into_iter().collect();
        let mut result = Self::with_len(bits.len());
        for (index, _) in bits.iter().enumerate().filter(|(_, bit)| **bit) {
            result.content.set_bit(index);
        }
        result
    }
}

impl BitStream {
    /// Returns stream of `len` zeroed bits.
    pub fn with_len(len: usize) -> Self {
        Self { content: Box::<[u64]>::with_zeroed_bits(len), len }
    }

    /// Gets bit with given index `bit_nr`, which must be less than `self.len`.
    #[inline] pub fn get(&self, bit_nr: usize) -> bool {
        self.content.get_bit(bit_nr)
    }

    /// Returns iterator over all bits.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(|bit_nr| self.content.get_bit(bit_nr))
    }

    /// Returns number of bytes occupied by the bits, including the padding of the last byte.
    #[inline] pub fn byte_len(&self) -> usize { ceiling_div(self.len, 8) }

    /// Encodes all bytes read from `input` using codes from `book`.
    ///
    /// `len` is the total length of the codes of all bytes in `input`,
    /// i.e. the weighted path length of the tree the codes come from.
    /// Fails with [`Error::Encoding`] if a byte has no code or `input` gives other number of bits.
    pub fn encode<R: io::Read>(input: R, book: &[Option<Code>; 256], len: usize) -> Result<Self> {
        let mut result = Self::with_len(len);
        let mut bit_index = 0usize;
        let mut input = io::BufReader::new(input);
        loop {
            let buffer = match input.fill_buf() {
                Ok(buffer) => buffer,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into())
            };
            if buffer.is_empty() { break; }
            for byte in buffer {
                let code = book[*byte as usize].ok_or_else(||
                    Error::encoding(format!("byte {:08b} has no code", byte)))?;
                result.init_successive_bits(&mut bit_index, code)?;
            }
            let consumed = buffer.len();
            input.consume(consumed);
        }
        if bit_index != len {
            return Err(Error::encoding(format!("input gives {} bits instead of {} predicted by its frequencies", bit_index, len)));
        }
        Ok(result)
    }

    /// Sets successive bits, beginning from `bit_index`, to the bits of `code`, and advances `bit_index`.
    /// The bits are assumed to be cleared before.
    fn init_successive_bits(&mut self, bit_index: &mut usize, code: Code) -> Result<()> {
        if *bit_index + code.len as usize > self.len {
            return Err(Error::encoding(format!("input gives more than {} bits predicted by its frequencies", self.len)));
        }
        for bit in code.iter() {
            if bit { self.content.set_bit(*bit_index); }
            *bit_index += 1;
        }
        Ok(())
    }

    /// Decodes all bits of `self` using `tree`.
    ///
    /// Fails with [`Error::Decoding`] if the bits end inside a codeword or a codeword is invalid.
    pub fn decode<ValueType: Clone>(&self, tree: &CodeTree<ValueType>) -> Result<Vec<ValueType>> {
        let mut result = Vec::new();
        let mut decoder = tree.decoder();
        let mut bits = self.iter();
        loop {
            match decoder.decode_next(&mut bits) {
                DecodingResult::Value(value) => result.push(value.clone()),
                DecodingResult::Incomplete if decoder.consumed_bits() == 0 => return Ok(result),
                DecodingResult::Incomplete => return Err(Error::decoding(format!(
                    "bit stream ends inside a codeword, {} bits after the value number {}", decoder.consumed_bits(), result.len()))),
                DecodingResult::Invalid => return Err(Error::decoding(format!(
                    "invalid codeword after the value number {}", result.len())))
            }
        }
    }

    /// Returns number of bytes which `write` will write.
    #[inline] pub fn write_bytes(&self) -> usize {
        Self::write_bytes_for_len(self.len)
    }

    /// Returns number of bytes which `write` will write for the stream of `len` bits.
    pub fn write_bytes_for_len(len: usize) -> usize {
        AsIs::size(len as u64) + ceiling_div(len, 8)
    }

    /// Writes `self` to the `output`.
    pub fn write(&self, output: &mut dyn io::Write) -> io::Result<()> {
        AsIs::write(output, self.len as u64)?;
        let bytes: Vec<u8> = self.content.iter()
            .flat_map(|segment| segment.to_le_bytes())
            .take(self.byte_len())
            .collect();
        output.write_all(&bytes)
    }

    /// Reads (written by `write`) `BitStream` from the `input`, which must contain nothing more.
    ///
    /// Fails with [`Error::Decoding`] if the number of bytes does not agree with the number of bits.
    pub fn read(input: &mut dyn io::Read) -> Result<Self> {
        let len: u64 = AsIs::read(input)?;
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;
        let expected_bytes = len / 8 + u64::from(len % 8 != 0);
        if bytes.len() as u64 != expected_bytes {
            return Err(Error::decoding(format!("encoded stream of {} bits needs {} bytes, but {} found", len, expected_bytes, bytes.len())));
        }
        let mut result = Self::with_len(len as usize);
        for (index, byte) in bytes.iter().enumerate() {
            result.content[index / 8] |= (*byte as u64) << (8 * (index % 8));
        }
        let used_bits = result.len % 64;
        if used_bits != 0 {
            if let Some(last) = result.content.last_mut() { *last &= (1u64 << used_bits) - 1; }
        }
        Ok(result)
    }
}
