//! Reverse line scanning for tailing large files.
//!
//! Blocks are read backwards from the end of the input, so the cost of
//! tailing depends on the length of the requested lines rather than on the
//! size of the file.

use std::collections::VecDeque;
use std::io::{self, Read, Seek, SeekFrom, Write};

pub const LINE_ENDING: &str = if cfg!(windows) { "\r\n" } else { "\n" };

const BLOCK_SIZE: usize = 8 * 1024;

/// Iterates over the lines of a seekable input from last to first.
///
/// A terminator at the very end of the input does not produce an empty last
/// line, and `\r\n` terminators are stripped like `\n`.
pub struct ReverseLines<R> {
    reader: R,
    len: u64,
    /// Offset of the first byte already pulled into `pending`.
    pos: u64,
    /// Unconsumed bytes in file order, starting at `pos`.
    pending: Vec<u8>,
    block_size: usize,
    trailing_checked: bool,
    finished: bool,
}

impl<R: Read + Seek> ReverseLines<R> {
    pub fn new(reader: R) -> io::Result<Self> {
        Self::with_block_size(reader, BLOCK_SIZE)
    }

    pub fn with_block_size(mut reader: R, block_size: usize) -> io::Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        Ok(Self {
            reader,
            len,
            pos: len,
            pending: Vec::new(),
            block_size: block_size.max(1),
            trailing_checked: false,
            finished: false,
        })
    }

    fn read_previous_block(&mut self) -> io::Result<()> {
        let chunk_len = self.pos.min(self.block_size as u64) as usize;
        self.pos -= chunk_len as u64;
        self.reader.seek(SeekFrom::Start(self.pos))?;

        let mut chunk = vec![0u8; chunk_len];
        self.reader.read_exact(&mut chunk)?;
        chunk.extend_from_slice(&self.pending);
        self.pending = chunk;

        if !self.trailing_checked && !self.pending.is_empty() {
            self.trailing_checked = true;
            if self.pending.last() == Some(&b'\n') {
                self.pending.pop();
            }
        }
        Ok(())
    }

    fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        if self.finished {
            return Ok(None);
        }
        loop {
            if let Some(idx) = self.pending.iter().rposition(|b| *b == b'\n') {
                let line = self.pending.split_off(idx + 1);
                self.pending.pop();
                return Ok(Some(strip_cr(line)));
            }
            if self.pos == 0 {
                self.finished = true;
                if self.len == 0 {
                    return Ok(None);
                }
                return Ok(Some(strip_cr(std::mem::take(&mut self.pending))));
            }
            self.read_previous_block()?;
        }
    }
}

impl<R: Read + Seek> Iterator for ReverseLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_line() {
            Ok(Some(line)) => Some(Ok(String::from_utf8_lossy(&line).into_owned())),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

fn strip_cr(mut line: Vec<u8>) -> Vec<u8> {
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    line
}

/// Returns the last `count` lines of `reader` in top-to-bottom order; all of
/// them when the input has fewer.
pub fn tail_lines<R: Read + Seek>(reader: R, count: usize) -> io::Result<Vec<String>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let mut lines = VecDeque::with_capacity(count.min(1024));
    for line in ReverseLines::new(reader)? {
        lines.push_front(line?);
        if lines.len() == count {
            break;
        }
    }
    Ok(lines.into())
}

pub fn write_lines<W: Write + ?Sized>(lines: &[String], sink: &mut W) -> io::Result<()> {
    for line in lines {
        sink.write_all(line.as_bytes())?;
        sink.write_all(LINE_ENDING.as_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reversed(input: &str, block_size: usize) -> Vec<String> {
        ReverseLines::with_block_size(Cursor::new(input.as_bytes().to_vec()), block_size)
            .unwrap()
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn yields_lines_last_to_first() {
        assert_eq!(reversed("line1\nline2\n", 4), vec!["line2", "line1"]);
        assert_eq!(reversed("line1\nline2", 4), vec!["line2", "line1"]);
    }

    #[test]
    fn block_size_does_not_change_the_result() {
        let input = "alpha\nbeta\r\n\ngamma delta\nepsilon\n";
        let expected = vec!["epsilon", "gamma delta", "", "beta", "alpha"];
        for block_size in [1, 2, 3, 7, 64, 8192] {
            assert_eq!(reversed(input, block_size), expected, "block {block_size}");
        }
    }

    #[test]
    fn empty_input_has_no_lines() {
        assert!(reversed("", 8).is_empty());
    }

    #[test]
    fn lone_terminator_is_one_empty_line() {
        assert_eq!(reversed("\n", 8), vec![""]);
        assert_eq!(reversed("\n\n", 8), vec!["", ""]);
    }

    #[test]
    fn tail_takes_exactly_the_requested_count() {
        let input = Cursor::new(b"l1\nl2\nl3\nl4\n".to_vec());
        assert_eq!(tail_lines(input, 2).unwrap(), vec!["l3", "l4"]);
    }

    #[test]
    fn tail_returns_everything_when_short() {
        let input = Cursor::new(b"l1\nl2\n".to_vec());
        assert_eq!(tail_lines(input, 10).unwrap(), vec!["l1", "l2"]);
    }

    #[test]
    fn tail_of_zero_lines_is_empty() {
        let input = Cursor::new(b"l1\nl2\n".to_vec());
        assert!(tail_lines(input, 0).unwrap().is_empty());
    }

    #[test]
    fn writes_platform_terminators() {
        let mut out = Vec::new();
        write_lines(&["a".to_string(), "b".to_string()], &mut out).unwrap();
        assert_eq!(out, format!("a{LINE_ENDING}b{LINE_ENDING}").into_bytes());
    }
}
