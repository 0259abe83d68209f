// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # pixelflood
//!
//! A server for the line oriented "pixel flood" protocol. Any number of TCP clients
//! stream single pixel commands into one shared canvas that is rendered to a display
//! device:
//!
//! ```text
//! SIZE                  -> SIZE <width> <height>
//! OFFSET <x> <y>        (per connection translation, no reply)
//! PX <x> <y> <rrggbb>   (opaque set, no reply)
//! PX <x> <y> <rrggbbaa> (alpha blended set, no reply)
//! PX <x> <y>            -> PX <x> <y> <rrggbb>
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐ accept  ┌─────────────────────────────────────────┐
//! │ acceptor ├────────>│ connection task (one per client)        │
//! └──────────┘         │  LineDecoder -> Command -> Session      │
//!                      └──────────────────┬──────────────────────┘
//!                                         │ get / set
//!                                         ▼
//!                      ┌─────────────────────────────────────────┐
//!                      │ PixelStore                              │
//!                      │  ScheduledBuffer  or DirectDeviceBuffer │
//!                      └──────┬──────────────────────────────────┘
//!                             │ snapshot (scheduled mode only)
//!                             ▼
//!                      ┌──────────────────┐      ┌──────────────┐
//!                      │ FlushScheduler   ├─────>│ OutputDevice │
//!                      └──────────────────┘      └──────────────┘
//! ```
//!
//! The canvas is shared by every connection without a lock. Each channel byte is an
//! [`std::sync::atomic::AtomicU8`] accessed with relaxed ordering, so concurrent writes
//! to the same pixel can produce a torn color, but never undefined behavior. Every
//! access is bounds checked first.

// Skip rustfmt for rest of file.
// https://stackoverflow.com/a/75910283/2085356
#![cfg_attr(rustfmt, rustfmt_skip)]

// Enforce strict error handling in production library code only. Tests are allowed to
// use .unwrap() (workspace `Cargo.toml` config allows it).
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach modules (re-exported below to provide clean public API).
pub mod app;
pub mod config;
pub mod core;
pub mod network_io;
pub mod pixel_store;

// Re-export stable public API using glob imports for ergonomic, flat API surface.
pub use app::*;
pub use config::*;
#[allow(ambiguous_glob_reexports)]
pub use core::*;
pub use network_io::*;
pub use pixel_store::*;
