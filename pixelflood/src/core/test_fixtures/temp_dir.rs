// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use miette::IntoDiagnostic;
use rand::Rng;
use std::path::PathBuf;

/// A directory under [`std::env::temp_dir`], deleted (with its contents) on drop. Tests
/// use it for log files and for regular files standing in for a framebuffer device.
#[derive(Debug)]
pub struct TempDir {
    pub path: PathBuf,
}

/// Create a uniquely named temporary directory.
///
/// # Errors
///
/// Returns an error if the directory can't be created.
pub fn try_create_temp_dir() -> miette::Result<TempDir> {
    let suffix: u64 = rand::rng().random();
    let name = format!("pixelflood-{}-{suffix:016x}", std::process::id());
    let path = std::env::temp_dir().join(name);
    std::fs::create_dir(&path).into_diagnostic()?;
    Ok(TempDir { path })
}

impl TempDir {
    /// Create a file of `len` bytes, all set to `fill`, inside this directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be written.
    pub fn create_file(&self, name: &str, len: usize, fill: u8) -> miette::Result<PathBuf> {
        let path = self.path.join(name);
        std::fs::write(&path, vec![fill; len]).into_diagnostic()?;
        Ok(path)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) { std::fs::remove_dir_all(&self.path).ok(); }
}
