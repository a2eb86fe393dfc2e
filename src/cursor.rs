//! Bounded-lookahead cursor over a byte stream
//!
//! Offsets are relative to the current front of the stream: offset 0 is the
//! next unconsumed byte. Only the bytes needed to answer a lookahead request
//! are buffered, and a request beyond the configured limit fails instead of
//! growing the buffer further.

use std::io::{self, Read};

use memchr::memmem;
use tracing::trace;

use crate::error::{Error, ErrorKind, Result};

/// Smallest read issued against the underlying stream
const READ_CHUNK: usize = 64 * 1024;
/// First window scanned by [`Cursor::find`]; each miss doubles it
const FIRST_SEARCH_WINDOW: usize = 200;

/// Forward-only view over a stream with indexed lookahead
#[derive(Debug)]
pub struct Cursor<R> {
    reader: R,
    /// Bytes read from `reader`; the unconsumed part starts at `pos`
    buffer: Vec<u8>,
    pos: usize,
    eof: bool,
    limit: usize,
    /// Bytes discarded from the front so far
    consumed: usize,
}

impl<R: Read> Cursor<R> {
    /// Create a cursor that never looks more than `limit` bytes ahead
    pub fn new(reader: R, limit: usize) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            pos: 0,
            eof: false,
            limit,
            consumed: 0,
        }
    }

    /// Replace the lookahead limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Byte at offset `i` from the front
    pub fn peek(&mut self, i: usize) -> Result<u8> {
        self.lookahead(i + 1)?;
        self.buffered()
            .get(i)
            .copied()
            .ok_or_else(|| self.exhausted(i))
    }

    /// Whether at least one more byte can be produced
    pub fn available(&mut self) -> Result<bool> {
        Ok(self.fill(1)? > 0)
    }

    /// Permanently discard the first `n` bytes
    pub fn advance(&mut self, n: usize) -> Result<()> {
        let mut remaining = n;
        loop {
            let step = remaining.min(self.buffered().len());
            self.pos += step;
            self.consumed += step;
            remaining -= step;
            if remaining == 0 {
                return Ok(());
            }
            // Skipping past everything buffered: read and drop.
            if self.fill(remaining.min(READ_CHUNK))? == 0 {
                return Err(self.exhausted(remaining - 1));
            }
        }
    }

    /// Text covering offsets `[start, end)` without consuming it
    pub fn slice(&mut self, start: usize, end: usize) -> Result<&str> {
        if start > end {
            return Err(Error::malformed(format!(
                "invalid slice {start}..{end} requested from cursor"
            )));
        }
        self.lookahead(end)?;
        let bytes = self
            .buffered()
            .get(start..end)
            .ok_or_else(|| Error::new(ErrorKind::StreamExhausted { offset: end }))?;
        Ok(std::str::from_utf8(bytes)?)
    }

    /// Whether the stream continues with `token`; false if it ends first
    pub fn starts_with(&mut self, token: &[u8]) -> Result<bool> {
        match self.lookahead(token.len()) {
            Ok(()) => Ok(self.buffered().starts_with(token)),
            Err(e) if e.is_exhausted() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Smallest offset at which `token` starts.
    ///
    /// Scans windows of 200, 400, 800, ... bytes. Returns `None` when the
    /// stream ends or the lookahead limit is reached without a match.
    pub fn find(&mut self, token: &[u8]) -> Result<Option<usize>> {
        if token.is_empty() {
            return Ok(Some(0));
        }

        let mut window = FIRST_SEARCH_WINDOW;
        let mut searched: usize = 0;
        loop {
            let window_len = window.min(self.limit);
            let have = self.fill(window_len)?.min(self.limit);
            let haystack = self.buffered().get(..have).unwrap_or_default();

            // Resume just before the previous window's end so a token split
            // across windows is still found.
            let from = searched.saturating_sub(token.len() - 1);
            if let Some(found) = haystack
                .get(from..)
                .and_then(|rest| memmem::find(rest, token))
            {
                return Ok(Some(from + found));
            }

            if have < window_len || window_len >= self.limit {
                trace!(window = window_len, have, "token not found");
                return Ok(None);
            }
            searched = have;
            window = window.saturating_mul(2);
        }
    }

    /// Discard leading delimiter whitespace
    pub fn skip_whitespace(&mut self) -> Result<()> {
        loop {
            let have = self.fill(1)?;
            if have == 0 {
                return Ok(());
            }
            let blank = self
                .buffered()
                .iter()
                .take_while(|b| is_delimiter(**b))
                .count();
            self.pos += blank;
            self.consumed += blank;
            if blank < have {
                return Ok(());
            }
        }
    }

    /// Consume the rest of the stream, reporting whether it was all whitespace
    pub fn drain_is_blank(&mut self) -> Result<bool> {
        loop {
            self.skip_whitespace()?;
            if !self.available()? {
                return Ok(true);
            }
            if !self.buffered().first().copied().is_some_and(is_delimiter) {
                return Ok(false);
            }
        }
    }

    /// Total bytes consumed so far
    pub fn offset(&self) -> usize {
        self.consumed
    }

    /// Make `size` bytes available or fail with the matching cursor error.
    fn lookahead(&mut self, size: usize) -> Result<()> {
        if size > self.limit {
            return Err(Error::new(ErrorKind::BufferLimitExceeded {
                requested: size,
                limit: self.limit,
            }));
        }
        if self.fill(size)? < size {
            return Err(self.exhausted(size.saturating_sub(1)));
        }
        Ok(())
    }

    /// Read until `size` bytes are buffered or the stream ends.
    /// Returns the number of buffered bytes.
    fn fill(&mut self, size: usize) -> Result<usize> {
        while self.buffered().len() < size && !self.eof {
            self.compact();
            let start = self.buffer.len();
            let want = (size - self.buffered().len()).max(READ_CHUNK);
            self.buffer.resize(start + want, 0);
            let read = loop {
                match self.reader.read(self.buffer.get_mut(start..).unwrap_or_default()) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        self.buffer.truncate(start);
                        return Err(Error::from(e).with_context("reading input stream"));
                    }
                }
            };
            self.buffer.truncate(start + read);
            if read == 0 {
                self.eof = true;
            }
            trace!(read, buffered = self.buffered().len(), "cursor refill");
        }
        Ok(self.buffered().len())
    }

    /// Moves the unconsumed bytes to the beginning of the buffer.
    fn compact(&mut self) {
        if self.pos == 0 {
            return;
        }
        trace!(dropped = self.pos, "compacting cursor buffer");
        self.buffer.drain(..self.pos);
        self.pos = 0;
    }

    fn buffered(&self) -> &[u8] {
        self.buffer.get(self.pos..).unwrap_or_default()
    }

    fn exhausted(&self, i: usize) -> Error {
        Error::new(ErrorKind::StreamExhausted {
            offset: self.consumed + i,
        })
    }
}

/// Whitespace that separates XML constructs
pub fn is_delimiter(b: u8) -> bool {
    matches!(b, b' ' | b'\n' | b'\t' | b'\r')
}
