// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! One task per client:
//!
//! ```text
//! loop {
//!     run every complete line already buffered, collecting replies
//!     write the replies (if any)
//!     read more bytes, stop on end of stream
//! }
//! ```
//!
//! Replies are collected and written together before the next read, so a client that
//! pipelines a batch of `PX x y` gets one write back instead of one per line.

use std::{fmt::Write as _, net::SocketAddr, sync::Arc};

use tokio::{io::{AsyncRead, AsyncWrite, AsyncWriteExt},
            net::TcpStream,
            task::JoinHandle};
use tracing::{Instrument, debug, info_span};

use crate::{AlphaMode, LineDecoder, PixelStore, Session, protocol_constants};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub alpha_mode: AlphaMode,
    /// Bytes requested per read.
    pub grab_size: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            alpha_mode: AlphaMode::default(),
            grab_size: protocol_constants::DEFAULT_GRAB_SIZE,
        }
    }
}

/// Serve one client until it closes its write side. Malformed lines never end the
/// connection, only IO errors do.
///
/// # Errors
///
/// A read or write error on the socket.
pub async fn handle_connection<R, W>(
    reader: &mut R,
    writer: &mut W,
    store: Arc<dyn PixelStore>,
    settings: ConnectionSettings,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut session = Session::new(store, settings.alpha_mode);
    let mut decoder = LineDecoder::new(settings.grab_size);
    let mut replies = String::new();

    loop {
        while let Some(line) = decoder.next_buffered_line() {
            if let Some(reply) = session.execute(line) {
                write!(replies, "{reply}").ok();
            }
        }

        if !replies.is_empty() {
            writer.write_all(replies.as_bytes()).await?;
            writer.flush().await?;
            replies.clear();
        }

        if decoder.fill(reader).await? == 0 {
            if !decoder.remainder().is_empty() {
                debug!(
                    message = "Dropping unterminated line at end of stream",
                    len = decoder.remainder().len()
                );
            }
            return Ok(());
        }
    }
}

/// Spawn the task that serves `stream`. Everything it logs is inside a `connection`
/// span carrying the peer address.
pub fn spawn_connection(
    stream: TcpStream,
    peer: SocketAddr,
    store: Arc<dyn PixelStore>,
    settings: ConnectionSettings,
) -> JoinHandle<()> {
    let span = info_span!("connection", %peer);
    tokio::spawn(
        async move {
            debug!("Connected");
            if let Err(error) = stream.set_nodelay(true) {
                debug!(message = "Can't set TCP_NODELAY", %error);
            }
            let (mut reader, mut writer) = stream.into_split();
            match handle_connection(&mut reader, &mut writer, store, settings).await {
                Ok(()) => debug!("Closed"),
                Err(error) => debug!(message = "Closed with error", %error),
            }
        }
        .instrument(span),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BytesPerPixel, ChannelOrder, GridLayout, MockAsyncStream, PixelFormat,
                Pos, Rgb, ScheduledBuffer, Size, get_mock_socket_halves};
    use pretty_assertions::assert_eq;
    use tokio::io::AsyncReadExt;

    fn canvas() -> Arc<ScheduledBuffer> {
        Arc::new(ScheduledBuffer::new(GridLayout::new(
            Size::new(64, 32),
            PixelFormat::new(BytesPerPixel::Four, ChannelOrder::Bgr),
        )))
    }

    async fn run_script(chunks: &[&str], store: Arc<ScheduledBuffer>) -> String {
        let mut stream = MockAsyncStream::new(chunks);
        let mut writer = MockAsyncStream::default();
        handle_connection(&mut stream, &mut writer, store, ConnectionSettings::default())
            .await
            .unwrap();
        writer.written_str()
    }

    #[tokio::test]
    async fn test_size_reply() {
        assert_eq!(run_script(&["SIZE\n"], canvas()).await, "SIZE 64 32\n");
    }

    #[tokio::test]
    async fn test_set_and_get_split_across_reads() {
        let store = canvas();
        let output = run_script(&["PX 1 1 ", "ff0000\nPX 1", " 1\n"], store.clone()).await;
        assert_eq!(output, "PX 1 1 ff0000\n");
        assert_eq!(store.get(Pos::new(1, 1)), Some(Rgb::new(0xff, 0, 0)));
    }

    #[tokio::test]
    async fn test_unknown_verb_then_size() {
        let output = run_script(&["FOO bar\nSIZE\n"], canvas()).await;
        assert_eq!(output, "SIZE 64 32\n");
    }

    #[tokio::test]
    async fn test_replies_keep_command_order() {
        let output = run_script(
            &["PX 0 0 0000ff\nPX 0 0\nSIZE\nPX 0 0 00ff00\nPX 0 0\n"],
            canvas(),
        )
        .await;
        assert_eq!(output, "PX 0 0 0000ff\nSIZE 64 32\nPX 0 0 00ff00\n");
    }

    #[tokio::test]
    async fn test_offset_is_per_connection() {
        let store = canvas();
        run_script(&["OFFSET 10 5\nPX 1 1 abcdef\n"], store.clone()).await;
        // A fresh connection starts without an offset.
        run_script(&["PX 1 1 123456\n"], store.clone()).await;
        assert_eq!(store.get(Pos::new(11, 6)), Some(Rgb::new(0xab, 0xcd, 0xef)));
        assert_eq!(store.get(Pos::new(1, 1)), Some(Rgb::new(0x12, 0x34, 0x56)));
    }

    #[tokio::test]
    async fn test_unterminated_line_is_not_executed() {
        let store = canvas();
        let output = run_script(&["SIZE\nPX 2 2 ffffff"], store.clone()).await;
        assert_eq!(output, "SIZE 64 32\n");
        assert_eq!(store.get(Pos::new(2, 2)), Some(Rgb::BLACK));
    }

    #[tokio::test]
    async fn test_overlong_line_tail_is_not_executed() {
        let store = canvas();
        let overlong = "x".repeat(protocol_constants::MAX_LINE_LENGTH + 76);
        let output = run_script(
            &[overlong.as_str(), "PX 1 1 ff0000\n", "SIZE\n"],
            store.clone(),
        )
        .await;
        assert_eq!(output, "SIZE 64 32\n");
        assert_eq!(store.get(Pos::new(1, 1)), Some(Rgb::BLACK));
    }

    #[tokio::test]
    async fn test_over_mock_socket() {
        let store = canvas();
        let mut socket = get_mock_socket_halves();
        let server = tokio::spawn({
            let store: Arc<dyn PixelStore> = store.clone();
            let mut reader = socket.server_read;
            let mut writer = socket.server_write;
            async move {
                handle_connection(&mut reader, &mut writer, store, ConnectionSettings {
                    grab_size: 4,
                    ..ConnectionSettings::default()
                })
                .await
            }
        });

        socket
            .client_write
            .write_all(b"PX 5 6 00ff00\nPX 5 6\nSIZE\n")
            .await
            .unwrap();
        drop(socket.client_write);

        let mut output = String::new();
        socket.client_read.read_to_string(&mut output).await.unwrap();
        server.await.unwrap().unwrap();

        assert_eq!(output, "PX 5 6 00ff00\nSIZE 64 32\n");
    }
}
