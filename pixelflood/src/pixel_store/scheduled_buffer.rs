// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{fmt::{Debug, Formatter},
          sync::atomic::AtomicU8};

use crate::{AtomicU8Ext, GridLayout, PixelStore, new_zeroed_cells};

/// An in-memory canvas, independent of the device. Connections write into it, and the
/// [`crate::FlushScheduler`] periodically copies all of it to the output device.
///
/// The cells use the device pixel format, so a flush is a plain byte copy.
pub struct ScheduledBuffer {
    layout: GridLayout,
    cells: Box<[AtomicU8]>,
}

impl Debug for ScheduledBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledBuffer")
            .field("layout", &self.layout)
            .field("cells.len", &self.cells.len())
            .finish()
    }
}

impl ScheduledBuffer {
    /// A black canvas.
    #[must_use]
    pub fn new(layout: GridLayout) -> Self {
        Self {
            layout,
            cells: new_zeroed_cells(layout.byte_len()),
        }
    }

    /// Copy `frame` (raw device bytes) into the canvas. A short frame only fills the top
    /// of the canvas, extra bytes are ignored.
    pub fn seed_from(&self, frame: &[u8]) {
        for (cell, byte) in self.cells.iter().zip(frame) {
            cell.set(*byte);
        }
    }

    /// Copy the whole canvas into `frame`, which is resized to fit. Writes that happen
    /// during the copy may or may not be in it.
    pub fn snapshot_into(&self, frame: &mut Vec<u8>) {
        frame.clear();
        frame.extend(self.cells.iter().map(AtomicU8Ext::get));
    }
}

impl PixelStore for ScheduledBuffer {
    fn layout(&self) -> GridLayout { self.layout }

    fn cells(&self) -> &[AtomicU8] { &self.cells }
}
