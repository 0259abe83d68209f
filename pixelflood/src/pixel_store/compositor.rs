// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Apply a [`Paint`] to a stored pixel.
//!
//! For a blend with alpha `a` normalized to `[0, 1]`, each channel becomes
//! `round(a * incoming + (1 - a) * stored)`. The stored pixel is always treated as
//! opaque, its own alpha (if the device format even has one) is never read.

use crate::{Paint, Rgb};

/// Blend one channel, `alpha` in `0..=255`. Integer only: `(n + 127) / 255` rounds
/// `n / 255` to nearest, and a tie can't happen since 255 is odd.
#[must_use]
pub fn blend_channel(incoming: u8, stored: u8, alpha: u8) -> u8 {
    let alpha = u32::from(alpha);
    let mixed = alpha * u32::from(incoming) + (255 - alpha) * u32::from(stored);
    // At most (255 * 255 + 127) / 255 = 255.
    u8::try_from((mixed + 127) / 255).unwrap_or(u8::MAX)
}

/// The color that results from applying `paint` over `stored`.
#[must_use]
pub fn composite(paint: Paint, stored: Rgb) -> Rgb {
    match paint {
        Paint::Opaque(color) => color,
        Paint::Blend { color, alpha } => Rgb {
            red: blend_channel(color.red, stored.red, alpha),
            green: blend_channel(color.green, stored.green, alpha),
            blue: blend_channel(color.blue, stored.blue, alpha),
        },
    }
}

impl Paint {
    /// Whether applying this paint needs the stored pixel. An opaque paint is a plain
    /// overwrite, no read, no blend math.
    #[must_use]
    pub const fn reads_destination(&self) -> bool { matches!(self, Paint::Blend { .. }) }
}
