// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Extension trait for [`AtomicU8`] used as a race tolerant byte cell. See
//! [`AtomicU8Ext`] for details.
//!
//! [`AtomicU8`]: std::sync::atomic::AtomicU8

use std::sync::atomic::{AtomicU8, Ordering};

/// Ergonomic helpers for [`AtomicU8`] that hide [`Relaxed`] boilerplate.
///
/// The canvas is one flat slice of these cells, shared by every connection task and the
/// flush thread with no lock. All operations use [`Relaxed`] ordering: there is nothing
/// to synchronize *with*, only a byte that must never be read or written half way. A
/// pixel is 3 or 4 independent cells, so two writers racing on the same pixel can leave
/// a mix of both colors behind.
///
/// ```text
///              Writer A              Writer B          Stored (r, g, b)
///              --------              --------          ----------------
///  set(r=ff)                                           (ff, 00, 00)
///                              set(r=00)               (00, 00, 00)
///                              set(g=ff)               (00, ff, 00)
///  set(g=00)                                           (00, 00, 00)
///  set(b=00)                   set(b=ff)               (00, 00, ff)  <- torn
/// ```
///
/// A torn pixel is a cosmetic artifact, the next write to it fixes it.
///
/// [`AtomicU8`]: std::sync::atomic::AtomicU8
/// [`Relaxed`]: Ordering::Relaxed
pub trait AtomicU8Ext {
    /// Reads the current value.
    fn get(&self) -> u8;

    /// Writes `value`.
    fn set(&self, value: u8);
}

impl AtomicU8Ext for AtomicU8 {
    fn get(&self) -> u8 { self.load(Ordering::Relaxed) }

    fn set(&self, value: u8) { self.store(value, Ordering::Relaxed) }
}

/// Allocate `len` zeroed cells.
#[must_use]
pub fn new_zeroed_cells(len: usize) -> Box<[AtomicU8]> {
    (0..len).map(|_| AtomicU8::new(0)).collect()
}
