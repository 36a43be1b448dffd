//! Textual frequency artifact.
//!
//! Each distinct byte occupies one line `BBBBBBBB:N`, where `BBBBBBBB` is the byte written as
//! 8 binary digits and `N` is the decimal number of its occurrences.
//! Lines are written in ascending byte order.

use std::io::{self, BufRead};
use crate::{Error, FrequencyTable, Result};

/// Writes `frequencies` to `output`, one line per byte.
pub fn write_frequencies(frequencies: &FrequencyTable<u8>, output: &mut dyn io::Write) -> io::Result<()> {
    frequencies.iter().try_for_each(|(value, count)| writeln!(output, "{:08b}:{}", value, count))
}

/// Returns number of bytes which `write_frequencies` will write.
pub fn write_frequencies_bytes(frequencies: &FrequencyTable<u8>) -> usize {
    frequencies.values().map(|count| 8 + 1 + count.to_string().len() + 1).sum()
}

/// Reads (written by `write_frequencies`) frequency table from `input`.
///
/// Fails with [`Error::Decoding`] at the first malformed line,
/// which includes lines listing a byte already listed.
pub fn read_frequencies(input: &mut dyn io::BufRead) -> Result<FrequencyTable<u8>> {
    let mut result = FrequencyTable::new();
    for (index, line) in input.lines().enumerate() {
        let line_nr = index + 1;
        let line = line.map_err(|e| if e.kind() == io::ErrorKind::InvalidData {
            Error::decoding(format!("frequency line {}: not valid UTF-8", line_nr))
        } else {
            e.into()
        })?;
        let (value, count) = parse_line(&line).ok_or_else(||
            Error::decoding(format!("frequency line {}: malformed `{}`", line_nr, line)))?;
        if result.insert(value, count).is_some() {
            return Err(Error::decoding(format!("frequency line {}: byte {:08b} listed twice", line_nr, value)));
        }
    }
    Ok(result)
}

fn is_number(s: &str, radix: u32) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_digit(radix))
}

/// Parses `BBBBBBBB:N` line, `N` must be positive.
fn parse_line(line: &str) -> Option<(u8, u64)> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let (value, count) = line.split_once(':')?;
    if value.len() > 8 || !is_number(value, 2) || !is_number(count, 10) { return None; }
    let value = u8::from_str_radix(value, 2).ok()?;
    let count = count.parse::<u64>().ok().filter(|c| *c != 0)?;
    Some((value, count))
}
