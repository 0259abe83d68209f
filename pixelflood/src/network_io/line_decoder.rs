// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Turn a byte stream into newline terminated lines.
//!
//! A command can arrive split over any number of reads, and a single read can carry many
//! commands. [`LineDecoder`] keeps the unterminated tail of the stream (the remainder)
//! between reads and hands out complete lines only:
//!
//! ```text
//! read 1: "SIZE\nPX 1 1 "      -> "SIZE",        remainder "PX 1 1 "
//! read 2: "ff0000\nPX 2"       -> "PX 1 1 ff0000", remainder "PX 2"
//! read 3: <end of stream>      -> remainder "PX 2" is dropped
//! ```
//!
//! Bytes are not validated as text here. Whatever is between two newlines is passed on,
//! and the command parser drops what it doesn't understand.

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use crate::{Buffer, protocol_constants::{DEFAULT_GRAB_SIZE, LINE_TERMINATOR,
                                         MAX_LINE_LENGTH}};

#[derive(Debug)]
pub struct LineDecoder {
    /// Unconsumed bytes start at `consumed`. Everything before it has been handed out.
    buffer: Buffer,
    consumed: usize,
    /// Where to resume the newline search, so a long remainder isn't scanned again on
    /// every read.
    scanned: usize,
    /// Set while the rest of an overlong line is still arriving.
    discarding: bool,
    grab_size: usize,
}

impl Default for LineDecoder {
    fn default() -> Self { Self::new(DEFAULT_GRAB_SIZE) }
}

impl LineDecoder {
    #[must_use]
    pub fn new(grab_size: usize) -> Self {
        let grab_size = grab_size.max(1);
        Self {
            buffer: Vec::with_capacity(grab_size + MAX_LINE_LENGTH),
            consumed: 0,
            scanned: 0,
            discarding: false,
            grab_size,
        }
    }

    /// The next complete line already in the buffer, without its `\n`. `None` means more
    /// bytes are needed, see [`Self::fill`]. Lines longer than [`MAX_LINE_LENGTH`] are
    /// skipped whole, including any part that arrives after the cap was hit.
    pub fn next_buffered_line(&mut self) -> Option<&[u8]> {
        loop {
            let search_from = self.consumed.max(self.scanned);
            let Some(index) = memchr_newline(&self.buffer[search_from..]) else {
                self.scanned = self.buffer.len();
                self.discard_overlong_remainder();
                return None;
            };

            let start = self.consumed;
            let end = search_from + index;
            self.consumed = end + 1;
            self.scanned = self.consumed;

            if self.discarding {
                // The end of a line whose start was already dropped.
                self.discarding = false;
                continue;
            }
            if end - start > MAX_LINE_LENGTH {
                trace!(message = "Dropping overlong line", line_len = end - start);
                continue;
            }
            return Some(&self.buffer[start..end]);
        }
    }

    /// Bytes received but not yet part of a complete line.
    #[must_use]
    pub fn remainder(&self) -> &[u8] { &self.buffer[self.consumed..] }

    /// Append bytes as if they had been read.
    #[cfg(test)]
    pub fn feed(&mut self, bytes: &[u8]) {
        self.compact();
        self.buffer.extend_from_slice(bytes);
    }

    /// Read once from `reader` (at most `grab_size` bytes) and append what arrived.
    /// Returns the number of bytes read, `0` means end of stream: whatever remainder is
    /// left is an unterminated line and will never complete.
    ///
    /// # Errors
    ///
    /// The read error. The buffer is left as it was.
    pub async fn fill<R: AsyncRead + Unpin>(
        &mut self,
        reader: &mut R,
    ) -> std::io::Result<usize> {
        self.compact();
        let len = self.buffer.len();
        self.buffer.resize(len + self.grab_size, 0);
        let result = reader.read(&mut self.buffer[len..]).await;
        let bytes_read = *result.as_ref().unwrap_or(&0);
        self.buffer.truncate(len + bytes_read);
        result
    }

    /// Move the remainder to the front of the buffer.
    fn compact(&mut self) {
        if self.consumed > 0 {
            self.buffer.drain(..self.consumed);
            self.scanned -= self.consumed.min(self.scanned);
            self.consumed = 0;
        }
    }

    /// Drop the unterminated remainder once it is over the cap, and keep dropping until
    /// its `\n` shows up.
    fn discard_overlong_remainder(&mut self) {
        let remainder_len = self.buffer.len() - self.consumed;
        if self.discarding || remainder_len > MAX_LINE_LENGTH {
            if !self.discarding {
                trace!(message = "Dropping overlong line", remainder_len);
                self.discarding = true;
            }
            self.buffer.clear();
            self.consumed = 0;
            self.scanned = 0;
        }
    }
}

fn memchr_newline(haystack: &[u8]) -> Option<usize> {
    haystack.iter().position(|it| *it == LINE_TERMINATOR)
}
