// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The shared canvas. [`PixelStore`] is the interface every connection writes through,
//! with two backends chosen once at startup:
//!
//! | Backend                | Storage                    | Reaches the display       |
//! | :--------------------- | :------------------------- | :------------------------ |
//! | [`ScheduledBuffer`]    | heap allocated cells       | [`FlushScheduler`] copies |
//! | [`DirectDeviceBuffer`] | `mmap` of the device       | immediately               |

// Attach.
pub mod color;
pub mod compositor;
#[cfg(unix)]
pub mod direct_device_buffer;
pub mod flush_scheduler;
pub mod grid_layout;
pub mod output_device;
pub mod pixel_format;
pub mod scheduled_buffer;
pub mod store_api;

// Re-export.
pub use color::*;
pub use compositor::*;
#[cfg(unix)]
pub use direct_device_buffer::*;
pub use flush_scheduler::*;
pub use grid_layout::*;
pub use output_device::*;
pub use pixel_format::*;
pub use scheduled_buffer::*;
pub use store_api::*;
