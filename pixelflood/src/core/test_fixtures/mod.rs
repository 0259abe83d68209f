// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Fixtures shared by the unit tests in this crate and the integration tests in
//! `tests/`. They are compiled into the library so that both can reach them.

// Attach.
pub mod output_device_fixtures;
pub mod tcp_stream_fixtures;
pub mod temp_dir;

// Re-export.
pub use output_device_fixtures::*;
pub use tcp_stream_fixtures::*;
pub use temp_dir::*;
