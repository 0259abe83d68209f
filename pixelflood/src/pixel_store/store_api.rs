// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{fmt::Debug, sync::atomic::AtomicU8};

use crate::{GridLayout, Paint, Pos, Rgb, Size};

/// The shared canvas, as seen by a connection.
///
/// A backend only provides its [`GridLayout`] and its flat slice of byte cells. The
/// operations are provided methods, so both backends share the exact same bounds checks
/// and compositing. None of them block: there is no lock anywhere on this path, see
/// [`crate::AtomicU8Ext`] for what that means for concurrent writers.
pub trait PixelStore: Send + Sync + Debug {
    fn layout(&self) -> GridLayout;

    /// `layout().byte_len()` cells.
    fn cells(&self) -> &[AtomicU8];

    /// Width and height of the canvas.
    fn bounds(&self) -> Size { self.layout().size }

    /// `None` if `pos` is out of bounds.
    fn get(&self, pos: Pos) -> Option<Rgb> { self.layout().load(self.cells(), pos) }

    /// Apply `paint` at `pos`. Returns `false` if `pos` is out of bounds, in which case
    /// nothing is written.
    fn set(&self, pos: Pos, paint: Paint) -> bool {
        self.layout().store(self.cells(), pos, paint)
    }
}

/// How the canvas starts out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenMode {
    /// Start from whatever the device currently shows.
    #[default]
    Keep,
    /// Start from black.
    Clear,
}
