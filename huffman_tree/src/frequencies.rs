//! Tools to count frequencies of values.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::io::{self, BufRead};
use fsum::FSum;

/// Map from values to the (positive) numbers of their occurrences.
///
/// It is ordered by values, so iterating over it is stable.
pub type FrequencyTable<V> = BTreeMap<V, u64>;

/// Types that implement this trait can count number of occurrences of values.
pub trait Frequencies {
    /// Type of value.
    type Value;

    /// Constructs `Self` that counts occurrences of all values exposed by `iter`.
    fn with_counted_all<Iter: IntoIterator>(iter: Iter) -> Self
        where Iter::Item: Borrow<Self::Value>, Self: Default, Self::Value: Clone
    {
        let mut result = Self::default();
        result.count_all(iter);
        result
    }

    /// Adds one to the stored number of `value` occurrences.
    fn count(&mut self, value: Self::Value);

    /// Calls `count` for all items exposed by `iter`.
    fn count_all<Iter: IntoIterator>(&mut self, iter: Iter) where Iter::Item: Borrow<Self::Value>, Self::Value: Clone {
        for v in iter { self.count(v.borrow().clone()); }
    }

    /// Returns the total number of occurrences of all values, saturated at `u64::MAX`.
    fn total(&self) -> u64;

    /// Returns the Shannon entropy of the values counted so far, in bits per value.
    fn entropy(&self) -> f64;
}

impl<Value: Ord> Frequencies for BTreeMap<Value, u64> {
    type Value = Value;

    fn count(&mut self, value: Value) {
        *self.entry(value).or_insert(0) += 1;
    }

    fn total(&self) -> u64 {
        self.values().fold(0u64, |total, count| total.saturating_add(*count))
    }

    fn entropy(&self) -> f64 {
        let sum = self.total() as f64;
        if sum == 0.0 { return 0.0; }
        - FSum::with_all(self.values()
            .map(|v| { let p = *v as f64 / sum; p * p.log2() })).value()
    }
}

/// Reads the whole `input` and counts occurrences of each byte.
///
/// Bytes which do not occur in `input` are absent from the result.
pub fn count_bytes<R: io::Read>(input: R) -> io::Result<FrequencyTable<u8>> {
    let mut counts = [0u64; 256];
    let mut input = io::BufReader::new(input);
    loop {
        let buffer = match input.fill_buf() {
            Ok(buffer) => buffer,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e)
        };
        if buffer.is_empty() { break; }
        for byte in buffer { counts[*byte as usize] += 1; }
        let len = buffer.len();
        input.consume(len);
    }
    Ok(counts.iter().enumerate()
        .filter(|(_, count)| **count != 0)
        .map(|(byte, count)| (byte as u8, *count))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;

    #[test]
    fn count_chars() {
        let frequencies = FrequencyTable::<char>::with_counted_all("aaabbc".chars());
        assert_eq!(frequencies, btreemap!('a' => 3, 'b' => 2, 'c' => 1));
        assert_eq!(frequencies.total(), 6);
    }

    #[test]
    fn count_bytes_of_reader() {
        assert_eq!(count_bytes(&b"aaabbc"[..]).unwrap(), btreemap!(b'a' => 3, b'b' => 2, b'c' => 1));
        assert_eq!(count_bytes(&[0u8, 255, 0][..]).unwrap(), btreemap!(0 => 2, 255 => 1));
    }

    #[test]
    fn count_empty() {
        assert!(count_bytes(io::empty()).unwrap().is_empty());
        assert_eq!(FrequencyTable::<u8>::new().entropy(), 0.0);
    }

    #[test]
    fn count_large_input() {
        let text: Vec<u8> = (0..100_000u32).map(|i| (i % 7) as u8).collect();
        let frequencies = count_bytes(&text[..]).unwrap();
        assert_eq!(frequencies.len(), 7);
        assert_eq!(frequencies.total(), 100_000);
        assert_eq!(frequencies[&0], 14286);
        assert_eq!(frequencies[&6], 14285);
    }

    #[test]
    fn total_saturates() {
        assert_eq!(btreemap!(0u8 => u64::MAX, 1 => 1).total(), u64::MAX);
        assert_eq!(btreemap!(0u8 => u64::MAX - 1, 1 => 1).total(), u64::MAX);
    }

    #[test]
    fn entropy() {
        assert_eq!(btreemap!('a' => 5u64, 'b' => 5, 'c' => 5, 'd' => 5).entropy(), 2.0);
        assert_eq!(btreemap!('z' => 4u64).entropy(), 0.0);
        let e = btreemap!('a' => 3u64, 'b' => 2, 'c' => 1).entropy();
        assert!(e > 1.45 && e < 1.46);
    }
}
