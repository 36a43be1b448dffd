#![doc = include_str!("../README.md")]
mod shell;

use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use dyn_size_of::GetSize;
use huffman_tree::{BitStream, CodeTree, Frequencies, Result,
    count_bytes, decode, decode_file, encode_file, read_frequencies, write_frequencies_bytes};

/// Paths of the files processed by a single operation.
#[derive(Args, Clone, Debug)]
pub struct Paths {
    /// File to read
    pub input: PathBuf,
    /// File to write
    pub output: PathBuf,
    /// File with the frequency table (written by encode, read by decode)
    pub freq: PathBuf,
}

#[derive(Subcommand)]
pub enum Command {
    /// Encodes INPUT, writing the encoded bits to OUTPUT and the frequency table to FREQ
    Encode(Paths),
    /// Decodes INPUT (encoded before) with the frequency table read from FREQ, writing the result to OUTPUT
    Decode(Paths),
    /// Reads encode and decode commands (each followed by 3 paths) from the standard input, until quit
    Shell,
    /// Prints the codes of the bytes of INPUT and the size of the encoded content
    Stats {
        /// File to analyse
        input: PathBuf
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None, infer_subcommands=true)]
/// Huffman coding of files.
pub struct Conf {
    /// Operation to perform
    #[command(subcommand)]
    pub command: Command,

    /// Maximum level of the messages logged to the standard error
    #[arg(long, global = true, default_value_t = tracing::Level::WARN)]
    pub log_level: tracing::Level,

    /// Whether to decode the files written by encode and compare the result with the input
    #[arg(long, global = true, default_value_t = false)]
    pub verify: bool,
}

impl Conf {
    fn encode(&self, paths: &Paths, out: &mut dyn Write) -> Result<()> {
        let summary = encode_file(&paths.input, &paths.output, &paths.freq)?;
        writeln!(out, "Encoded {} bytes ({} distinct) into {} bits: {:.3} bits/symbol (entropy {:.3})",
            summary.symbols, summary.distinct, summary.encoded_bits, summary.bits_per_symbol(), summary.entropy)?;
        if self.verify { self.verify(paths, out)?; }
        Ok(())
    }

    fn decode(&self, paths: &Paths, out: &mut dyn Write) -> Result<()> {
        let summary = decode_file(&paths.input, &paths.output, &paths.freq)?;
        writeln!(out, "Decoded {} bits into {} bytes", summary.encoded_bits, summary.symbols)?;
        Ok(())
    }

    /// Decodes the artifacts written by `encode` in memory and compares the result with the input.
    fn verify(&self, paths: &Paths, out: &mut dyn Write) -> Result<()> {
        write!(out, "Verification... ")?;
        let frequencies = read_frequencies(&mut BufReader::new(File::open(&paths.freq)?))?;
        let stream = BitStream::read(&mut BufReader::new(File::open(&paths.output)?))?;
        let decoded = decode(&frequencies, &stream)?;
        compare_texts(&fs::read(&paths.input)?, &decoded, out)?;
        Ok(())
    }

    fn stats(&self, input: &Path, out: &mut dyn Write) -> Result<()> {
        let frequencies = count_bytes(File::open(input)?)?;
        let tree = CodeTree::from_frequencies(&frequencies)?;
        let codes = tree.codes_for_values();
        writeln!(out, "byte          count code")?;
        for (byte, count) in &frequencies {
            writeln!(out, "{:08b} {:>14} {}", byte, count, codes[byte])?;
        }
        let symbols = frequencies.total();
        let bits = tree.weighted_path_length();
        writeln!(out, "Symbols: {} ({} distinct)", symbols, frequencies.len())?;
        writeln!(out, "Entropy [bits/symbol]: {:.3}", frequencies.entropy())?;
        writeln!(out, "Average code length [bits/symbol]: {:.3} (max {})", bits as f64 / symbols as f64, tree.max_code_len())?;
        let encoded_bytes = usize::try_from(bits).map(BitStream::write_bytes_for_len)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(out, "Encoded size [bytes]: {} + {} of frequencies", encoded_bytes, write_frequencies_bytes(&frequencies))?;
        writeln!(out, "Tree size [bytes]: {}", tree.size_bytes())?;
        Ok(())
    }

    fn run(&self) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        match &self.command {
            Command::Encode(paths) => self.encode(paths, &mut out),
            Command::Decode(paths) => self.decode(paths, &mut out),
            Command::Shell => shell::run(self, io::stdin().lock(), &mut out),
            Command::Stats { input } => self.stats(input, &mut out),
        }
    }
}

fn compare_texts(original: &[u8], decoded: &[u8], out: &mut dyn Write) -> io::Result<()> {
    if original.len() != decoded.len() {
        return writeln!(out, "FAIL: decoded text has length {} different from original {}", decoded.len(), original.len());
    }
    if let Some((i, (e, g))) = original.iter().zip(decoded).enumerate().find(|(_, (e, g))| e != g) {
        return writeln!(out, "FAIL: decoded text at index {} has {}, while the original has {}", i, g, e);
    }
    writeln!(out, "DONE")
}

fn main() -> ExitCode {
    let conf = Conf::parse();
    tracing_subscriber::fmt()
        .with_max_level(conf.log_level)
        .with_writer(io::stderr)
        .init();
    match conf.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
