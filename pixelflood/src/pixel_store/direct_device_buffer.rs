// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{fmt::{Debug, Formatter},
          fs::OpenOptions,
          path::{Path, PathBuf},
          ptr::NonNull,
          sync::atomic::AtomicU8};

use rustix::mm::{MapFlags, ProtFlags, mmap, munmap};

use crate::{AtomicU8Ext, DeviceError, GridLayout, PixelStore, ScreenMode,
            check_device_len};

/// The canvas *is* the device: a shared, writable `mmap` of the framebuffer. Writes are
/// on screen as soon as the display scans them out, there is no flush step.
#[derive(Debug)]
pub struct DirectDeviceBuffer {
    layout: GridLayout,
    mapping: DeviceMapping,
}

impl DirectDeviceBuffer {
    /// Map the first `layout.byte_len()` bytes of the device at `path`. With
    /// [`ScreenMode::Clear`] the mapped region is zeroed once.
    ///
    /// # Errors
    ///
    /// [`DeviceError::Open`], [`DeviceError::TooSmall`], or [`DeviceError::Map`].
    pub fn open(
        path: &Path,
        layout: GridLayout,
        screen_mode: ScreenMode,
    ) -> Result<Self, DeviceError> {
        let len = layout.byte_len();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| DeviceError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        check_device_len(&file, path, len)?;

        // The mapping stays valid after `file` is closed.
        let mapping = DeviceMapping::try_new(&file, path, len)?;
        let it = Self { layout, mapping };

        if let ScreenMode::Clear = screen_mode {
            for cell in it.cells() {
                cell.set(0);
            }
        }

        Ok(it)
    }
}

impl PixelStore for DirectDeviceBuffer {
    fn layout(&self) -> GridLayout { self.layout }

    fn cells(&self) -> &[AtomicU8] { self.mapping.cells() }
}

/// Owns the mapped region and unmaps it on drop.
struct DeviceMapping {
    ptr: NonNull<AtomicU8>,
    len: usize,
    path: PathBuf,
}

// SAFETY: the region is only ever accessed through `&[AtomicU8]`, so sharing it across
// threads is the same as sharing a `Box<[AtomicU8]>`.
unsafe impl Send for DeviceMapping {}
// SAFETY: see above.
unsafe impl Sync for DeviceMapping {}

impl Debug for DeviceMapping {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceMapping")
            .field("path", &self.path)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl DeviceMapping {
    fn try_new(file: &std::fs::File, path: &Path, len: usize) -> Result<Self, DeviceError> {
        let map_err = |source: std::io::Error| DeviceError::Map {
            path: path.to_path_buf(),
            source,
        };

        if len == 0 {
            return Err(map_err(std::io::ErrorKind::InvalidInput.into()));
        }

        // SAFETY: a fresh mapping (null address hint), so no existing memory is
        // affected. The region is `len` bytes, readable and writable, and is released
        // exactly once in `drop`.
        let raw = unsafe {
            mmap(
                std::ptr::null_mut(),
                len,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                file,
                0,
            )
        }
        .map_err(|errno| map_err(errno.into()))?;

        let ptr = NonNull::new(raw.cast::<AtomicU8>())
            .ok_or_else(|| map_err(std::io::ErrorKind::AddrNotAvailable.into()))?;

        Ok(Self {
            ptr,
            len,
            path: path.to_path_buf(),
        })
    }

    fn cells(&self) -> &[AtomicU8] {
        // SAFETY: `ptr` points to `len` mapped bytes that live as long as `self`.
        // `AtomicU8` has the same size and alignment as `u8`. Other writers (the kernel,
        // other processes mapping the device) can change the bytes at any time, which
        // atomics allow for.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for DeviceMapping {
    fn drop(&mut self) {
        // SAFETY: `ptr` and `len` are exactly what `mmap` returned and accepted, and no
        // borrow of `cells()` can outlive `self`.
        if let Err(errno) = unsafe { munmap(self.ptr.as_ptr().cast(), self.len) } {
            tracing::warn!(message = "munmap failed", path = %self.path.display(), %errno);
        }
    }
}
