// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod acceptor;
pub mod command;
pub mod connection;
pub mod line_decoder;
pub mod protocol_types;
pub mod session;

// Re-export.
pub use acceptor::*;
pub use command::*;
pub use connection::*;
pub use line_decoder::*;
pub use protocol_types::*;
pub use session::*;
