//! Interactive loop that reads commands as whitespace-separated tokens.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use huffman_tree::Result;
use tracing::{debug, warn};

use crate::{Conf, Paths};

/// Splits the lines of the input into whitespace-separated tokens.
struct Tokens<R> {
    input: R,
    pending: VecDeque<String>
}

impl<R: BufRead> Tokens<R> {
    fn new(input: R) -> Self { Self { input, pending: VecDeque::new() } }

    /// Returns the next token, or `None` at the end of the input.
    fn next(&mut self) -> io::Result<Option<String>> {
        while self.pending.is_empty() {
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 { return Ok(None); }
            self.pending.extend(line.split_whitespace().map(str::to_owned));
        }
        Ok(self.pending.pop_front())
    }

    /// Returns the next three tokens as paths, or `None` if the input ends before.
    fn paths(&mut self) -> io::Result<Option<Paths>> {
        let (Some(input), Some(output), Some(freq)) = (self.next()?, self.next()?, self.next()?) else {
            return Ok(None);
        };
        Ok(Some(Paths { input: input.into(), output: output.into(), freq: freq.into() }))
    }
}

type Operation = fn(&Conf, &Paths, &mut dyn Write) -> Result<()>;

/// Executes `encode IN OUT FREQ` and `decode IN OUT FREQ` commands read from `input`
/// until `quit` (or `exit`) or the end of `input`.
///
/// Command names are case-insensitive. Failure of a command is reported to `out` and does not stop the loop.
pub fn run<R: BufRead>(conf: &Conf, input: R, out: &mut dyn Write) -> Result<()> {
    let mut tokens = Tokens::new(input);
    while let Some(token) = tokens.next()? {
        let operation: Operation = match token.to_ascii_lowercase().as_str() {
            "encode" => Conf::encode,
            "decode" => Conf::decode,
            "quit" | "exit" => return Ok(()),
            _ => {
                writeln!(out, "Unknown command `{}`, expected encode, decode or quit", token)?;
                continue;
            }
        };
        let Some(paths) = tokens.paths()? else {
            writeln!(out, "Command `{}` needs 3 paths", token)?;
            break;
        };
        debug!("{} {} {} {}", token, paths.input.display(), paths.output.display(), paths.freq.display());
        if let Err(e) = operation(conf, &paths, out) {
            warn!("{} failed: {}", token, e);
            writeln!(out, "Error: {}", e)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use clap::Parser;

    fn run_script(script: &str) -> String {
        let conf = Conf::try_parse_from(["huffman", "shell"]).unwrap();
        let mut out = Vec::new();
        run(&conf, script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn tokens_across_lines() {
        let mut tokens = Tokens::new("  encode a\n\n b\tc \nquit".as_bytes());
        assert_eq!(tokens.next().unwrap().as_deref(), Some("encode"));
        let paths = tokens.paths().unwrap().unwrap();
        assert_eq!(paths.input.to_str(), Some("a"));
        assert_eq!(paths.output.to_str(), Some("b"));
        assert_eq!(paths.freq.to_str(), Some("c"));
        assert_eq!(tokens.next().unwrap().as_deref(), Some("quit"));
        assert_eq!(tokens.next().unwrap(), None);
    }

    #[test]
    fn encode_decode_quit() {
        let dir = tempfile::tempdir().unwrap();
        let path = |name: &str| dir.path().join(name).to_string_lossy().into_owned();
        fs::write(path("in"), b"abracadabra").unwrap();
        let script = format!("encode {} {} {}\nDECODE {} {} {}\nQuit\nencode {} {} {}\n",
            path("in"), path("enc"), path("freq"),
            path("enc"), path("out"), path("freq"),
            path("in"), path("enc2"), path("freq2"));
        let text = run_script(&script);
        assert!(text.starts_with("Encoded 11 bytes (5 distinct)"), "{}", text);
        assert!(text.ends_with("Decoded 23 bits into 11 bytes\n"), "{}", text);
        assert_eq!(fs::read(path("out")).unwrap(), b"abracadabra");
        assert!(!dir.path().join("enc2").exists());
    }

    #[test]
    fn failure_does_not_stop() {
        let dir = tempfile::tempdir().unwrap();
        let path = |name: &str| dir.path().join(name).to_string_lossy().into_owned();
        fs::write(path("in"), b"zzzz").unwrap();
        let script = format!("decode {} {} {}\nencode {} {} {}",
            path("missing"), path("out"), path("freq"),
            path("in"), path("enc"), path("freq"));
        let text = run_script(&script);
        assert!(text.starts_with("Error: I/O error"), "{}", text);
        assert!(text.contains("Encoded 4 bytes (1 distinct) into 4 bits"), "{}", text);
        assert_eq!(fs::read_to_string(path("freq")).unwrap(), "01111010:4\n");
    }

    #[test]
    fn unknown_and_incomplete_commands() {
        let text = run_script("hello\nencode a b");
        assert_eq!(text, "Unknown command `hello`, expected encode, decode or quit\nCommand `encode` needs 3 paths\n");
        assert_eq!(run_script(""), "");
        assert_eq!(run_script("exit encode a b c"), "");
    }
}
