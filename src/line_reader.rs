//! Line Reader (§4.1): folds a `udiprops` byte stream into logical
//! lines, stripping comments, CR/LF terminators and backslash
//! continuations.

use std::io::BufRead;

use log::warn;

use crate::buffer::LineBuffer;
use crate::error::LineError;
use crate::limits::MAX_LOGICAL_LINE;

/// One emitted logical line, numbered monotonically starting at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    pub number: u64,
    pub text: String,
}

/// Reads logical lines out of any `BufRead` source.
///
/// A *segment* is one physical line (up to the next `\n`, or
/// end-of-stream). A segment ending in `\` (after CR/comment
/// stripping) continues onto the next segment; the backslash itself
/// is dropped and no separator is inserted, so `fo\` + `o bar` folds
/// to `foo bar`.
pub struct LineReader<R: BufRead> {
    inner: R,
    next_number: u64,
    raw: Vec<u8>,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        LineReader {
            inner,
            next_number: 1,
            raw: Vec::new(),
        }
    }

    /// Reads the next logical line, folding as many physical segments
    /// as needed. Returns `Ok(None)` at end of stream.
    pub fn next_logical_line(&mut self) -> Result<Option<LogicalLine>, LineError> {
        let mut acc = LineBuffer::new();
        loop {
            self.raw.clear();
            let read = self.inner.read_until(b'\n', &mut self.raw)?;
            if read == 0 {
                // End of stream. If we folded at least one segment
                // already, emit what we have; otherwise we're done.
                if acc.is_empty() {
                    return Ok(None);
                }
                return Ok(self.finish_logical_line(acc));
            }

            let mut segment: &[u8] = &self.raw;
            if segment.last() == Some(&b'\n') {
                segment = &segment[..segment.len() - 1];
            }
            if segment.last() == Some(&b'\r') {
                segment = &segment[..segment.len() - 1];
            }

            let segment = match segment.iter().position(|&b| b == b'#') {
                Some(pos) => &segment[..pos],
                None => segment,
            };

            acc.extend(segment);
            if acc.strip_trailing(b'\\') {
                continue;
            }

            return Ok(self.finish_logical_line(acc));
        }
    }

    fn finish_logical_line(&mut self, mut acc: LineBuffer) -> Option<LogicalLine> {
        if acc.len() > MAX_LOGICAL_LINE {
            warn!(
                "logical line {} exceeds {} bytes after folding; truncating",
                self.next_number, MAX_LOGICAL_LINE
            );
        }
        let mut text = acc.take();
        if text.len() > MAX_LOGICAL_LINE {
            text.truncate(MAX_LOGICAL_LINE);
        }
        let trimmed = text.trim_start_matches([' ', '\t']).to_string();

        if trimmed.chars().filter(|c| !c.is_whitespace()).count() < 2 {
            return None;
        }

        let number = self.next_number;
        self.next_number += 1;
        Some(LogicalLine {
            number,
            text: trimmed,
        })
    }
}

/// Drives a `LineReader` to completion, yielding every logical line.
/// Suppressed (near-empty) lines are simply skipped.
impl<R: BufRead> Iterator for LineReader<R> {
    type Item = Result<LogicalLine, LineError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.next_logical_line() {
                Ok(Some(line)) => return Some(Ok(line)),
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn lines(input: &str) -> Vec<String> {
        LineReader::new(Cursor::new(input.as_bytes()))
            .map(|r| r.unwrap().text)
            .collect()
    }

    #[test]
    fn strips_comments_and_crlf() {
        assert_eq!(lines("foo bar # a comment\r\n"), vec!["foo bar"]);
    }

    #[test]
    fn folds_backslash_continuations() {
        assert_eq!(lines("fo\\\no bar\n"), vec!["foo bar"]);
    }

    #[test]
    fn folds_three_segments() {
        assert_eq!(lines("a\\\nb\\\nc d\n"), vec!["abc d"]);
    }

    #[test]
    fn suppresses_near_empty_lines() {
        assert_eq!(lines("\n \n\t\nx\ny y\n"), vec!["y y"]);
    }

    #[test]
    fn numbers_logical_lines_monotonically() {
        let mut reader = LineReader::new(Cursor::new(b"aa\nbb\ncc\n".as_slice()));
        let a = reader.next_logical_line().unwrap().unwrap();
        let b = reader.next_logical_line().unwrap().unwrap();
        let c = reader.next_logical_line().unwrap().unwrap();
        assert_eq!((a.number, b.number, c.number), (1, 2, 3));
    }

    #[test]
    fn truncates_overlong_lines_without_aborting() {
        let long = "x".repeat(600);
        let out = lines(&format!("{long}\n"));
        assert_eq!(out[0].len(), MAX_LOGICAL_LINE);
    }

    #[test]
    fn no_trailing_newline_still_emits_final_line() {
        assert_eq!(lines("ab cd"), vec!["ab cd"]);
    }
}
