// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

/// Type aliases for the connection byte buffers.
pub type Buffer = Vec<BufferAtom>;
pub type BufferAtom = u8;

pub mod protocol_constants {
    pub const DEFAULT_PORT: u16 = 42024;
    /// Bytes requested from the socket per read.
    pub const DEFAULT_GRAB_SIZE: usize = 2048;
    /// The longest valid command is `PX <u32> <u32> <8 hex digits>`, well under this. A
    /// line that grows past it without a newline is thrown away.
    pub const MAX_LINE_LENGTH: usize = 1024;
    pub const LINE_TERMINATOR: u8 = b'\n';
    /// Backlog for `listen(2)`.
    pub const LISTEN_BACKLOG: u32 = 1024;
}
