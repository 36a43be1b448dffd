use crate::{CodeTree, DecodingResult, Node};

/// Decoder that walks the Huffman tree, consuming one bit of a codeword at a time.
///
/// Time complexity of decoding the whole code is *O(length of the code)*.
///
/// Memory complexity: *O(1)*
pub struct Decoder<'huff, ValueType> {
    root: &'huff Node<ValueType>,
    /// Node reached by the bits consumed since the last decoded value.
    current: &'huff Node<ValueType>,
    /// Number of bits consumed since the last decoded value.
    consumed: u32
}

impl<'huff, ValueType> Decoder<'huff, ValueType> {
    /// Constructs decoder for given `tree`.
    pub fn new(tree: &'huff CodeTree<ValueType>) -> Self {
        Self { root: &tree.root, current: &tree.root, consumed: 0 }
    }

    /// Resets `self` to the root and makes it ready to decode next value.
    pub fn reset(&mut self) {
        self.current = self.root;
        self.consumed = 0;
    }

    /// Returns the number of bits consumed since construction, last reset or last decoded value.
    #[inline(always)] pub fn consumed_bits(&self) -> u32 { self.consumed }

    /// Consumes a `bit` of the codeword and returns:
    /// - a value if the given `bit` finishes the codeword, `self` is then reset to the root;
    /// - an [`DecodingResult::Incomplete`] if the codeword is incomplete and the next bit is needed;
    /// - or [`DecodingResult::Invalid`] if the tree consists of a single leaf,
    ///     whose only codeword is `0`, and `bit` is `1`.
    pub fn consume(&mut self, bit: bool) -> DecodingResult<&'huff ValueType> {
        let current: &'huff Node<ValueType> = self.current;
        let next = match current {
            Node::Internal { left, right, .. } => if bit { &**right } else { &**left },
            Node::Leaf { .. } if bit => return DecodingResult::Invalid,
            leaf => leaf
        };
        match next {
            Node::Leaf { value, .. } => {
                self.reset();
                DecodingResult::Value(value)
            },
            Node::Internal { .. } => {
                self.current = next;
                self.consumed += 1;
                DecodingResult::Incomplete
            }
        }
    }

    /// Tries to decode and return a single value from the `bits` iterator,
    /// consuming as many bits as needed.
    ///
    /// Returns [`DecodingResult::Incomplete`] if the iterator exhausted before the value was decoded
    /// ([`Self::consumed_bits`] enables checking if the iterator yielded any bit of the value before exhausting).
    /// Returns [`DecodingResult::Invalid`] if obtained invalid codeword.
    pub fn decode_next<I: Iterator<Item = bool>>(&mut self, bits: &mut I) -> DecodingResult<&'huff ValueType> {
        for bit in bits {
            match self.consume(bit) {
                DecodingResult::Incomplete => {},
                result => return result
            }
        }
        DecodingResult::Incomplete
    }
}
