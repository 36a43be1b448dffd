#![doc = include_str!("../README.md")]

use std::collections::{BTreeMap, VecDeque};
use std::iter::Peekable;

use dyn_size_of::GetSize;

mod code;
pub use code::Code;
mod frequencies;
pub use frequencies::{Frequencies, FrequencyTable, count_bytes};
mod freq_file;
pub use freq_file::{read_frequencies, write_frequencies, write_frequencies_bytes};
mod decoder;
pub use decoder::Decoder;
mod error;
pub use error::{Error, Result};
mod stream;
pub use stream::BitStream;
mod file;
pub use file::{decode, decode_file, encode, encode_file, DecodeSummary, EncodeSummary};

/// Node of the Huffman tree. Each node exclusively owns its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<ValueType> {
    /// Leaf assigned to a single value.
    Leaf {
        value: ValueType,
        /// Number of occurrences of `value`.
        weight: u64
    },
    /// Internal node, `left` is reached by bit `0` and `right` by bit `1`.
    Internal {
        /// Sum of the weights of children.
        weight: u64,
        left: Box<Node<ValueType>>,
        right: Box<Node<ValueType>>
    }
}

impl<ValueType> Node<ValueType> {
    /// Returns the weight of `self`.
    #[inline] pub fn weight(&self) -> u64 {
        match self {
            Node::Leaf { weight, .. } | Node::Internal { weight, .. } => *weight
        }
    }

    /// Returns whether `self` is a leaf.
    #[inline] pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Joins `left` and `right` under the new internal node.
    fn merge(left: Self, right: Self) -> Self {
        Node::Internal {
            weight: left.weight() + right.weight(),
            left: Box::new(left),
            right: Box::new(right)
        }
    }
}

impl<ValueType: GetSize> GetSize for Node<ValueType> {
    fn size_bytes_dyn(&self) -> usize {
        match self {
            Node::Leaf { value, .. } => value.size_bytes_dyn(),
            Node::Internal { left, right, .. } => (**left).size_bytes() + (**right).size_bytes()
        }
    }
    const USES_DYN_MEM: bool = true;
}

/// Huffman tree (binary prefix code) built for the given frequencies of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTree<ValueType> {
    pub root: Node<ValueType>
}

impl<ValueType: GetSize> GetSize for CodeTree<ValueType> {
    fn size_bytes_dyn(&self) -> usize { self.root.size_bytes_dyn() }
    const USES_DYN_MEM: bool = true;
}

impl<ValueType: Ord + Clone> CodeTree<ValueType> {
    /// Constructs the Huffman tree for given `frequencies` of values.
    ///
    /// Ties are broken deterministically: leaves are taken in ascending order of their
    /// weights and then values, and a leaf is taken before an internal node of the same weight.
    /// The first of two nodes taken becomes the left child of their parent.
    ///
    /// Fails with [`Error::InvalidInput`] if `frequencies` is empty
    /// or the total number of occurrences does not fit in `u64`.
    pub fn from_frequencies(frequencies: &FrequencyTable<ValueType>) -> Result<Self> {
        if frequencies.values().try_fold(0u64, |total, w| total.checked_add(*w)).is_none() {
            return Err(Error::invalid_input("total number of occurrences exceeds u64"));
        }
        let mut leaves: Vec<_> = frequencies.iter()
            .map(|(value, weight)| Node::Leaf { value: value.clone(), weight: *weight })
            .collect();
        leaves.sort_by_key(Node::weight);   // stable, so values stay ascending among equal weights
        Self::from_sorted(leaves)
            .ok_or_else(|| Error::invalid_input("cannot build Huffman tree for an empty frequency table"))
    }

    /// Returns a map from values to their codes.
    pub fn codes_for_values(&self) -> BTreeMap<ValueType, Code> {
        let mut result = BTreeMap::new();
        self.for_each_leaf(|value, _, code| { result.insert(value.clone(), code); });
        result
    }

    /// Returns a map from values to the lengths of their codes.
    pub fn code_lengths(&self) -> BTreeMap<ValueType, u8> {
        let mut result = BTreeMap::new();
        self.for_each_leaf(|value, _, code| { result.insert(value.clone(), code.len); });
        result
    }
}

impl<ValueType> CodeTree<ValueType> {
    /// Construct the tree for the given `leaves`, which have to be in non-descending order of weights.
    ///
    /// The leaves and the internal nodes are kept in two queues. The internal nodes are created
    /// in non-descending order of weights, so the lightest node is always at the front of one of the queues.
    /// The algorithm runs in *O(leaves.len)* time.
    /// Returns `None` if `leaves` is empty.
    fn from_sorted(leaves: Vec<Node<ValueType>>) -> Option<Self> {
        let mut internals = VecDeque::with_capacity(leaves.len() / 2 + 1);
        let mut leaves = leaves.into_iter().peekable();
        while let Some(left) = Self::take_lightest(&mut leaves, &mut internals) {
            match Self::take_lightest(&mut leaves, &mut internals) {
                Some(right) => internals.push_back(Node::merge(left, right)),
                None => return Some(Self { root: left })
            }
        }
        None
    }

    /// Removes and returns the lighter of the front nodes of the queues, preferring the leaf on tie.
    fn take_lightest<I>(leaves: &mut Peekable<I>, internals: &mut VecDeque<Node<ValueType>>) -> Option<Node<ValueType>>
        where I: Iterator<Item = Node<ValueType>>
    {
        match (leaves.peek(), internals.front()) {
            (Some(leaf), Some(internal)) if internal.weight() < leaf.weight() => internals.pop_front(),
            (Some(_), _) => leaves.next(),
            (None, _) => internals.pop_front()
        }
    }

    /// Calls `f` for each leaf in the tree, from the leftmost one.
    /// Arguments of `f` are: value assigned to the leaf, its weight and its code.
    ///
    /// The code is the path from the root: `0` for each descent to the left child and `1` to the right one.
    /// The root that is a leaf gets the one-bit code `0`.
    pub fn for_each_leaf<F>(&self, mut f: F) where F: FnMut(&ValueType, u64, Code) {
        if let Node::Leaf { value, weight } = &self.root {
            f(value, *weight, Code::default().pushed(false));
            return;
        }
        let mut stack = vec![(&self.root, Code::default())];
        while let Some((node, code)) = stack.pop() {
            match node {
                Node::Leaf { value, weight } => f(value, *weight, code),
                Node::Internal { left, right, .. } => {
                    stack.push((&**right, code.pushed(true)));
                    stack.push((&**left, code.pushed(false)));
                }
            }
        }
    }

    /// Returns the weighted path length of the tree, i.e. the sum of weight times code length over all leaves.
    ///
    /// This is the number of bits needed to encode all the occurrences the tree was built for.
    pub fn weighted_path_length(&self) -> u128 {
        let mut result = 0u128;
        self.for_each_leaf(|_, weight, code| result += weight as u128 * code.len as u128);
        result
    }

    /// Returns the number of leaves, i.e. the number of distinct values.
    pub fn leaf_count(&self) -> usize {
        let mut result = 0;
        self.for_each_leaf(|_, _, _| result += 1);
        result
    }

    /// Returns the length of the longest code.
    pub fn max_code_len(&self) -> u8 {
        let mut result = 0u8;
        self.for_each_leaf(|_, _, code| result = result.max(code.len));
        result
    }

    /// Returns decoder that allows for decoding values.
    #[inline] pub fn decoder(&self) -> Decoder<'_, ValueType> {
        Decoder::new(self)
    }
}

impl CodeTree<u8> {
    /// Returns codes of all bytes, indexed by the bytes. Bytes absent from the tree have no code.
    pub fn code_book(&self) -> [Option<Code>; 256] {
        let mut result = [None; 256];
        self.for_each_leaf(|value, _, code| result[*value as usize] = Some(code));
        result
    }
}

/// Result of bit consuming returned by `consume` method of `Decoder`.
#[derive(PartialOrd, Ord, PartialEq, Eq, Debug, Clone, Hash)]
pub enum DecodingResult<T> {
    /// Completed value that has been successfully decoded.
    Value(T),
    /// The codeword is incomplete and the next bit is needed.
    Incomplete,
    /// The codeword is invalid (possible only for the tree that consists of a single leaf).
    Invalid
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64Mcg;

    fn code(s: &str) -> Code {
        s.chars().fold(Code::default(), |c, b| c.pushed(b == '1'))
    }

    /// Returns the sum of weights of all internal nodes.
    fn internal_weights(node: &Node<char>) -> u64 {
        match node {
            Node::Leaf { .. } => 0,
            Node::Internal { weight, left, right } => weight + internal_weights(left) + internal_weights(right)
        }
    }

    fn random_frequencies(rng: &mut Pcg64Mcg, symbols: u32, max_weight: u64) -> FrequencyTable<u32> {
        (0..symbols).map(|v| (v, rng.gen_range(1..=max_weight))).collect()
    }

    #[test]
    fn tree_3sym() {
        //  /\
        // a /\
        //   cb
        let tree = CodeTree::from_frequencies(&btreemap!('a' => 3, 'b' => 2, 'c' => 1)).unwrap();
        assert_eq!(tree.root.weight(), 6);
        assert_eq!(tree.codes_for_values(), btreemap!(
            'a' => code("0"),
            'b' => code("11"),
            'c' => code("10")
        ));
        assert_eq!(tree.code_lengths(), btreemap!('a' => 1, 'b' => 2, 'c' => 2));
        assert_eq!(tree.weighted_path_length(), 9);
        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(tree.max_code_len(), 2);
    }

    #[test]
    fn tree_6sym() {
        //     /   \
        //   /  \  /\
        //  / \ f  ed
        // a  /\
        //    cb
        let frequencies = btreemap!('d' => 12, 'e' => 11, 'f' => 10, 'a' => 3, 'b' => 2, 'c' => 1);
        let tree = CodeTree::from_frequencies(&frequencies).unwrap();
        assert_eq!(tree.codes_for_values(), btreemap!(
            'a' => code("000"),
            'b' => code("0011"),
            'c' => code("0010"),
            'd' => code("11"),
            'e' => code("10"),
            'f' => code("01")
        ));
        assert_eq!(tree.weighted_path_length(), 87);
        assert_eq!(internal_weights(&tree.root), 87);
    }

    #[test]
    fn tree_ties_prefer_leaves_and_smaller_values() {
        let tree = CodeTree::from_frequencies(&btreemap!('x' => 1, 'w' => 1, 'v' => 2)).unwrap();
        // w and x (both 1) are merged first, then v (2) is taken before their parent (2).
        assert_eq!(tree.codes_for_values(), btreemap!(
            'v' => code("0"),
            'w' => code("10"),
            'x' => code("11")
        ));
    }

    #[test]
    fn tree_single_symbol() {
        let tree = CodeTree::from_frequencies(&btreemap!('z' => 4)).unwrap();
        assert_eq!(tree.root, Node::Leaf { value: 'z', weight: 4 });
        assert_eq!(tree.codes_for_values(), btreemap!('z' => code("0")));
        assert_eq!(tree.weighted_path_length(), 4);
        assert_eq!(tree.leaf_count(), 1);
    }

    #[test]
    fn tree_empty() {
        assert!(matches!(CodeTree::<char>::from_frequencies(&btreemap!()), Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn tree_total_overflow() {
        let frequencies = btreemap!('a' => u64::MAX, 'b' => 1);
        assert!(matches!(CodeTree::from_frequencies(&frequencies), Err(Error::InvalidInput { .. })));
        let frequencies = btreemap!('a' => u64::MAX - 1, 'b' => 1);
        assert_eq!(CodeTree::from_frequencies(&frequencies).unwrap().root.weight(), u64::MAX);
    }

    #[test]
    fn tree_fibonacci_weights() {
        let mut frequencies = FrequencyTable::new();
        let (mut a, mut b) = (1u64, 1u64);
        for v in 0..40u32 {
            frequencies.insert(v, a);
            (a, b) = (b, a + b);
        }
        let tree = CodeTree::from_frequencies(&frequencies).unwrap();
        assert_eq!(tree.max_code_len(), 39);
        let codes = tree.codes_for_values();
        assert_eq!(codes[&39].len, 1);
        assert_eq!(codes[&0].len, 39);
        assert_eq!(codes[&1].len, 39);
    }

    #[test]
    fn codes_are_prefix_free() {
        let mut rng = Pcg64Mcg::seed_from_u64(1234);
        for symbols in [2, 3, 10, 57, 256] {
            let tree = CodeTree::from_frequencies(&random_frequencies(&mut rng, symbols, 1000)).unwrap();
            let codes: Vec<Code> = tree.codes_for_values().into_values().collect();
            assert_eq!(codes.len(), symbols as usize);
            for (i, c1) in codes.iter().enumerate() {
                for c2 in &codes[i+1..] {
                    assert!(!c1.is_prefix_of(c2) && !c2.is_prefix_of(c1), "{} and {}", c1, c2);
                }
            }
        }
    }

    #[test]
    fn tree_is_optimal() {
        let mut rng = Pcg64Mcg::seed_from_u64(4321);
        for symbols in [2, 3, 4, 9, 100, 256] {
            for max_weight in [1, 5, 1_000_000] {
                let frequencies = random_frequencies(&mut rng, symbols, max_weight);
                let tree = CodeTree::from_frequencies(&frequencies).unwrap();
                let mut builder = huffman_compress::CodeBuilder::with_capacity(frequencies.len());
                for (v, w) in &frequencies { builder.push(*v, *w); }
                let (book, _) = builder.finish();
                let expected: u128 = frequencies.iter()
                    .map(|(v, w)| *w as u128 * book.get(v).unwrap().len() as u128)
                    .sum();
                assert_eq!(tree.weighted_path_length(), expected);
            }
        }
    }

    #[test]
    fn tree_is_deterministic() {
        let mut rng = Pcg64Mcg::seed_from_u64(99);
        let frequencies = random_frequencies(&mut rng, 200, 20);
        let first = CodeTree::from_frequencies(&frequencies).unwrap();
        let second = CodeTree::from_frequencies(&frequencies.clone()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.codes_for_values(), second.codes_for_values());
    }

    #[test]
    fn code_book_of_bytes() {
        let tree = CodeTree::from_frequencies(&btreemap!(b'a' => 3, b'b' => 2, b'c' => 1)).unwrap();
        let book = tree.code_book();
        assert_eq!(book[b'a' as usize], Some(code("0")));
        assert_eq!(book[b'c' as usize], Some(code("10")));
        assert_eq!(book.iter().filter(|c| c.is_some()).count(), 3);
    }

    #[test]
    fn tree_size() {
        let leaf = CodeTree::from_frequencies(&btreemap!(b'z' => 4)).unwrap();
        assert_eq!(leaf.size_bytes_dyn(), 0);
        let tree = CodeTree::from_frequencies(&btreemap!(b'a' => 3, b'b' => 2, b'c' => 1)).unwrap();
        assert_eq!(tree.size_bytes_dyn(), 4 * std::mem::size_of::<Node<u8>>());
    }
}
