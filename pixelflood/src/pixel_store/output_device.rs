// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{fmt::Debug,
          fs::{File, OpenOptions},
          io::{self, Read, Seek, SeekFrom, Write},
          path::{Path, PathBuf}};

/// The rendering surface. Receives the whole canvas, in device pixel format, once per
/// [`crate::FlushScheduler`] tick.
pub trait OutputDevice: Send + Debug {
    /// Write `frame` starting at the first pixel.
    ///
    /// # Errors
    ///
    /// Any I/O error from the device. The scheduler logs it and carries on.
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()>;
}

/// Errors from opening, sizing, mapping, or reading the framebuffer device. All of these
/// happen at startup and are fatal.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DeviceError {
    #[error("Can't open framebuffer device {}", .path.display())]
    #[diagnostic(
        code(pixelflood::device::open),
        help("Check that the device exists and that this user can read and write it (usually the `video` group)")
    )]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "Framebuffer device {} holds {actual} bytes, the canvas needs {expected}",
        .path.display()
    )]
    #[diagnostic(
        code(pixelflood::device::too_small),
        help("Pass --width, --height and --bytes-per-pixel that match the device (see `fbset -i`)")
    )]
    TooSmall {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("Can't map framebuffer device {}", .path.display())]
    #[diagnostic(
        code(pixelflood::device::map),
        help("Use `--mode scheduled` if this device doesn't support mmap")
    )]
    Map {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Can't read the current contents of framebuffer device {}", .path.display())]
    #[diagnostic(
        code(pixelflood::device::read),
        help("Use --clear-screen to start from a black canvas instead")
    )]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A regular file standing in for a device (tests, or a file backed display) must be
/// big enough for the whole canvas. A character device reports a length of 0, so there
/// is nothing to check for it up front.
///
/// # Errors
///
/// [`DeviceError::TooSmall`] for a regular file shorter than `expected` bytes.
pub fn check_device_len(file: &File, path: &Path, expected: usize) -> Result<(), DeviceError> {
    let metadata = file.metadata().map_err(|source| DeviceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let expected = expected as u64;
    if metadata.is_file() && metadata.len() < expected {
        return Err(DeviceError::TooSmall {
            path: path.to_path_buf(),
            expected,
            actual: metadata.len(),
        });
    }
    Ok(())
}

/// Read the first `len` bytes of the device. Used once at startup to seed the canvas
/// with what is currently on screen.
///
/// # Errors
///
/// [`DeviceError::Open`] or [`DeviceError::Read`] (which includes a device shorter than
/// `len`).
pub fn read_device_frame(path: &Path, len: usize) -> Result<Vec<u8>, DeviceError> {
    let mut file = File::open(path).map_err(|source| DeviceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut frame = vec![0; len];
    file.read_exact(&mut frame)
        .map_err(|source| DeviceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(frame)
}

/// A framebuffer device (or file) opened for writing. Each frame is written from offset
/// 0. The file is not truncated on open.
#[derive(Debug)]
pub struct FramebufferFile {
    path: PathBuf,
    file: File,
}

impl FramebufferFile {
    /// # Errors
    ///
    /// [`DeviceError::Open`], or [`DeviceError::TooSmall`] for a regular file shorter
    /// than `frame_len`.
    pub fn open(path: &Path, frame_len: usize) -> Result<Self, DeviceError> {
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|source| DeviceError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        check_device_len(&file, path, frame_len)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path { &self.path }
}

impl OutputDevice for FramebufferFile {
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(frame)?;
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::try_create_temp_dir;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_write_frame_overwrites_from_start() {
        let dir = try_create_temp_dir().unwrap();
        let path = dir.create_file("fb0", 8, 0).unwrap();

        let mut device = FramebufferFile::open(&path, 8).unwrap();
        device.write_frame(&[1; 8]).unwrap();
        device.write_frame(&[2, 2, 2, 2]).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), vec![2, 2, 2, 2, 1, 1, 1, 1]);
        assert_eq!(device.path(), path.as_path());
    }

    #[test]
    fn test_open_missing_device() {
        let dir = try_create_temp_dir().unwrap();
        let result = FramebufferFile::open(&dir.path.join("nope"), 8);
        assert!(matches!(result, Err(DeviceError::Open { .. })));
    }

    #[test]
    fn test_open_too_small() {
        let dir = try_create_temp_dir().unwrap();
        let path = dir.create_file("fb0", 4, 0).unwrap();
        let result = FramebufferFile::open(&path, 8);
        assert!(matches!(
            result,
            Err(DeviceError::TooSmall {
                expected: 8,
                actual: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_read_device_frame() {
        let dir = try_create_temp_dir().unwrap();
        let path = dir.create_file("fb0", 8, 7).unwrap();
        assert_eq!(read_device_frame(&path, 6).unwrap(), vec![7; 6]);
        assert!(matches!(
            read_device_frame(&path, 9),
            Err(DeviceError::Read { .. })
        ));
    }
}
