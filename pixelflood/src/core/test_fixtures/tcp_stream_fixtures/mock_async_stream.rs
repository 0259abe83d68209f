// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{collections::VecDeque,
          io::Result,
          pin::Pin,
          task::{Context, Poll}};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// A mock for one side of a [`tokio::net::TcpStream`] that delivers input in scripted
/// chunks.
///
/// - Each [`AsyncRead::poll_read`] hands out (at most) one chunk, so a test decides
///   exactly where the reads are split, e.g. `["PX 1 1 ", "ff0000\n"]`.
/// - Once all chunks are consumed, reads return 0 bytes, which is end of stream.
/// - Everything written is collected in [`MockAsyncStream::written`].
#[derive(Debug, Default)]
pub struct MockAsyncStream {
    pub chunks: VecDeque<Vec<u8>>,
    pub written: Vec<u8>,
}

impl MockAsyncStream {
    pub fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        Self {
            chunks: chunks.into_iter().map(|it| it.as_ref().to_vec()).collect(),
            written: vec![],
        }
    }

    /// The bytes written so far, as text.
    #[must_use]
    pub fn written_str(&self) -> String { String::from_utf8_lossy(&self.written).into() }
}

/// This struct also automatically implements [Unpin], because it contains no
/// self-referencing pointers.
impl AsyncWrite for MockAsyncStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize>> {
        self.written.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl AsyncRead for MockAsyncStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<Result<()>> {
        if let Some(mut chunk) = self.chunks.pop_front() {
            let len = std::cmp::min(chunk.len(), buf.remaining());
            buf.put_slice(&chunk[..len]);
            // Whatever did not fit is delivered by the next read.
            if len < chunk.len() {
                chunk.drain(..len);
                self.chunks.push_front(chunk);
            }
        }
        Poll::Ready(Ok(()))
    }
}
