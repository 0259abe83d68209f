// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use tokio::io::{DuplexStream, ReadHalf, WriteHalf, duplex, split};

/// Size of the in-memory pipe between client and server. Large enough that a test can
/// write a whole script of commands before the server reads any of it.
pub const MOCK_SOCKET_CAPACITY: usize = 64 * 1024;

/// The four halves of an in-memory client/server connection.
#[derive(Debug)]
pub struct MockSocket {
    pub client_read: ReadHalf<DuplexStream>,
    pub client_write: WriteHalf<DuplexStream>,
    pub server_read: ReadHalf<DuplexStream>,
    pub server_write: WriteHalf<DuplexStream>,
}

/// A “channel” is created by [`tokio::io::duplex`] that can be used as in-memory IO
/// types. Bytes the client writes are read by the server and vice versa. Dropping
/// `client_write` makes the server side see end of stream.
#[must_use]
pub fn get_mock_socket_halves() -> MockSocket {
    let (client_stream, server_stream) = duplex(MOCK_SOCKET_CAPACITY);
    let (client_read, client_write) = split(client_stream);
    let (server_read, server_write) = split(server_stream);
    MockSocket {
        client_read,
        client_write,
        server_read,
        server_write,
    }
}
