// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::atomic::AtomicU8;

use crate::{Paint, PixelFormat, Rgb, composite};

/// Canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// A pixel coordinate, `(0, 0)` is the top left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Pos {
    pub x: u32,
    pub y: u32,
}

impl Pos {
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self { Self { x, y } }

    /// `None` if either axis overflows, which is out of bounds for any canvas anyway.
    #[must_use]
    pub fn checked_add(self, other: Pos) -> Option<Pos> {
        Some(Pos {
            x: self.x.checked_add(other.x)?,
            y: self.y.checked_add(other.y)?,
        })
    }
}

impl Size {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self { Self { width, height } }

    #[must_use]
    pub const fn contains(self, pos: Pos) -> bool {
        pos.x < self.width && pos.y < self.height
    }
}

/// Maps pixel coordinates onto a flat slice of byte cells, row major, no padding between
/// rows. Every accessor bounds checks first and does nothing for a position outside the
/// canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridLayout {
    pub size: Size,
    pub format: PixelFormat,
}

impl GridLayout {
    #[must_use]
    pub const fn new(size: Size, format: PixelFormat) -> Self { Self { size, format } }

    /// `width * height * stride`, `None` on overflow.
    #[must_use]
    pub fn checked_byte_len(&self) -> Option<usize> {
        usize::try_from(self.size.width)
            .ok()?
            .checked_mul(usize::try_from(self.size.height).ok()?)?
            .checked_mul(self.format.stride())
    }

    /// See [`Self::checked_byte_len`]. Layouts are validated at startup, so this only
    /// saturates for a layout that was never going to be allocated.
    #[must_use]
    pub fn byte_len(&self) -> usize { self.checked_byte_len().unwrap_or(usize::MAX) }

    /// Byte offset of the first channel of `pos`, `None` if out of bounds.
    #[must_use]
    pub fn byte_offset(&self, pos: Pos) -> Option<usize> {
        if !self.size.contains(pos) {
            return None;
        }
        let index = pos.y as usize * self.size.width as usize + pos.x as usize;
        Some(index * self.format.stride())
    }

    /// The cells of the pixel at `pos`, exactly one stride long.
    #[must_use]
    pub fn pixel<'a>(&self, cells: &'a [AtomicU8], pos: Pos) -> Option<&'a [AtomicU8]> {
        let start = self.byte_offset(pos)?;
        cells.get(start..start + self.format.stride())
    }

    #[must_use]
    pub fn load(&self, cells: &[AtomicU8], pos: Pos) -> Option<Rgb> {
        self.pixel(cells, pos).map(|pixel| self.format.load(pixel))
    }

    /// Returns `false` (and writes nothing) if `pos` is out of bounds.
    pub fn store(&self, cells: &[AtomicU8], pos: Pos, paint: Paint) -> bool {
        let Some(pixel) = self.pixel(cells, pos) else {
            return false;
        };
        // Read, blend, write are separate steps: a concurrent write between the read
        // and the write is overwritten.
        let stored = if paint.reads_destination() {
            self.format.load(pixel)
        } else {
            Rgb::BLACK
        };
        self.format.store(pixel, composite(paint, stored));
        true
    }
}
