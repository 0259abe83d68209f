// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::atomic::AtomicU8;

use crate::{AtomicU8Ext, Rgb};

/// Byte order of the color channels inside one device pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ChannelOrder {
    /// Blue at the lowest address. This is the common little endian `XRGB8888` Linux
    /// framebuffer layout.
    #[default]
    Bgr,
    /// Red at the lowest address.
    Rgb,
}

/// Supported device pixel sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BytesPerPixel {
    /// Three channels, packed.
    Three,
    /// Three channels plus one pad byte, which is always written as [`PAD_BYTE`].
    #[default]
    Four,
}

/// Written into the 4th byte of a 4 byte pixel. Devices that read it as alpha see an
/// opaque pixel.
pub const PAD_BYTE: u8 = 0xff;

impl BytesPerPixel {
    #[must_use]
    pub const fn try_from_count(count: u8) -> Option<Self> {
        match count {
            3 => Some(Self::Three),
            4 => Some(Self::Four),
            _ => None,
        }
    }

    #[must_use]
    pub const fn count(self) -> usize {
        match self {
            Self::Three => 3,
            Self::Four => 4,
        }
    }
}

/// The fixed layout of one pixel in device memory. Chosen at startup, never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelFormat {
    pub bytes_per_pixel: BytesPerPixel,
    pub channel_order: ChannelOrder,
}

impl PixelFormat {
    #[must_use]
    pub const fn new(bytes_per_pixel: BytesPerPixel, channel_order: ChannelOrder) -> Self {
        Self {
            bytes_per_pixel,
            channel_order,
        }
    }

    /// Distance in bytes between two horizontally adjacent pixels.
    #[must_use]
    pub const fn stride(self) -> usize { self.bytes_per_pixel.count() }

    /// Offsets of the red, green and blue bytes within a pixel.
    const fn channel_offsets(self) -> [usize; 3] {
        match self.channel_order {
            ChannelOrder::Bgr => [2, 1, 0],
            ChannelOrder::Rgb => [0, 1, 2],
        }
    }

    /// Write `color` into `pixel`, which must be exactly [`Self::stride`] cells long.
    /// Each channel is a separate store.
    pub fn store(self, pixel: &[AtomicU8], color: Rgb) {
        let [r, g, b] = self.channel_offsets();
        pixel[r].set(color.red);
        pixel[g].set(color.green);
        pixel[b].set(color.blue);
        if let BytesPerPixel::Four = self.bytes_per_pixel {
            pixel[3].set(PAD_BYTE);
        }
    }

    /// Read the color from `pixel`, which must be exactly [`Self::stride`] cells long.
    #[must_use]
    pub fn load(self, pixel: &[AtomicU8]) -> Rgb {
        let [r, g, b] = self.channel_offsets();
        Rgb::new(pixel[r].get(), pixel[g].get(), pixel[b].get())
    }
}
