//! Whole pipelines: encoding and decoding of byte slices and files.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{BitStream, CodeTree, Error, Frequencies, FrequencyTable, Result,
    count_bytes, read_frequencies, write_frequencies};

/// Outcome of a successful encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeSummary {
    /// Number of encoded bytes.
    pub symbols: u64,
    /// Number of distinct bytes.
    pub distinct: usize,
    /// Length of the encoded stream in bits (excluding padding).
    pub encoded_bits: usize,
    /// Shannon entropy of the input, in bits per symbol.
    pub entropy: f64
}

impl EncodeSummary {
    /// Returns the average number of bits used to encode a single byte.
    pub fn bits_per_symbol(&self) -> f64 {
        if self.symbols == 0 { 0.0 } else { self.encoded_bits as f64 / self.symbols as f64 }
    }
}

/// Outcome of a successful decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeSummary {
    /// Number of decoded bytes.
    pub symbols: u64,
    /// Length of the decoded stream in bits (excluding padding).
    pub encoded_bits: usize
}

/// Encodes `text`, returning its frequency table and the encoded bits.
///
/// Fails with [`Error::InvalidInput`] if `text` is empty.
pub fn encode(text: &[u8]) -> Result<(FrequencyTable<u8>, BitStream)> {
    let frequencies = FrequencyTable::<u8>::with_counted_all(text);
    let stream = encode_with(&frequencies, text)?;
    Ok((frequencies, stream))
}

/// Builds the Huffman tree for `frequencies` and encodes `input` with it.
fn encode_with<R: io::Read>(frequencies: &FrequencyTable<u8>, input: R) -> Result<BitStream> {
    let tree = CodeTree::from_frequencies(frequencies)?;
    let bits = usize::try_from(tree.weighted_path_length())
        .map_err(|_| Error::invalid_input("encoded stream does not fit in memory"))?;
    debug!(distinct = tree.leaf_count(), max_code_len = tree.max_code_len(), bits, "Huffman tree built");
    BitStream::encode(input, &tree.code_book(), bits)
}

/// Decodes `stream` using the tree rebuilt from `frequencies`.
///
/// Fails with [`Error::Decoding`] if `stream` is malformed
/// or the number of decoded bytes differs from the total of `frequencies`.
pub fn decode(frequencies: &FrequencyTable<u8>, stream: &BitStream) -> Result<Vec<u8>> {
    let tree = CodeTree::from_frequencies(frequencies)?;
    let text = stream.decode(&tree)?;
    let expected = frequencies.total();
    if text.len() as u64 != expected {
        return Err(Error::decoding(format!("{} bytes decoded, while the frequencies count {}", text.len(), expected)));
    }
    Ok(text)
}

/// Encodes the content of the `input` file.
/// Writes the encoded bits to `output` and the frequency table to `frequencies_path`.
///
/// The input is read twice: once to count the frequencies and once to encode it.
/// Nothing is written unless the whole input has been encoded.
/// Each artifact is written to a temporary file which then replaces the target,
/// so a target is never left partially written. If writing `output` fails,
/// `frequencies_path` may already be replaced.
pub fn encode_file(input: &Path, output: &Path, frequencies_path: &Path) -> Result<EncodeSummary> {
    let frequencies = count_bytes(File::open(input)?)?;
    debug!(symbols = frequencies.total(), distinct = frequencies.len(), "frequencies of {} counted", input.display());
    let stream = encode_with(&frequencies, File::open(input)?)?;
    write_atomically(frequencies_path, |out| write_frequencies(&frequencies, out))?;
    write_atomically(output, |out| stream.write(out))?;
    let summary = EncodeSummary {
        symbols: frequencies.total(),
        distinct: frequencies.len(),
        encoded_bits: stream.len,
        entropy: frequencies.entropy()
    };
    info!(symbols = summary.symbols, bits = summary.encoded_bits, "{} encoded to {}", input.display(), output.display());
    Ok(summary)
}

/// Decodes the `input` file (written by [`encode_file`]) with the frequency table read from `frequencies_path`,
/// and writes the decoded bytes to `output`.
///
/// `output` is written only if decoding succeeds, and replaced at once.
pub fn decode_file(input: &Path, output: &Path, frequencies_path: &Path) -> Result<DecodeSummary> {
    let frequencies = read_frequencies(&mut BufReader::new(File::open(frequencies_path)?))?;
    debug!(symbols = frequencies.total(), distinct = frequencies.len(), "frequencies read from {}", frequencies_path.display());
    let stream = BitStream::read(&mut BufReader::new(File::open(input)?))?;
    debug!(bits = stream.len, "encoded stream read from {}", input.display());
    let text = decode(&frequencies, &stream)?;
    write_atomically(output, |out| out.write_all(&text))?;
    let summary = DecodeSummary { symbols: text.len() as u64, encoded_bits: stream.len };
    info!(symbols = summary.symbols, bits = summary.encoded_bits, "{} decoded to {}", input.display(), output.display());
    Ok(summary)
}

/// Calls `write` for a temporary file in the directory of `path` and then renames the file to `path`.
fn write_atomically<F>(path: &Path, write: F) -> Result<()>
    where F: FnOnce(&mut dyn Write) -> io::Result<()>
{
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new(".")
    };
    let mut out = BufWriter::new(NamedTempFile::new_in(dir)?);
    write(&mut out)?;
    let file = out.into_inner().map_err(|e| e.into_error())?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
