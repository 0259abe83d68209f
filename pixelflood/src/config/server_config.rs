// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::path::PathBuf;

use crate::{AlphaMode, BindMode, BytesPerPixel, ChannelOrder, ConnectionSettings,
            FlushTransform, GridLayout, PixelFormat, ScreenMode, Size, protocol_constants};

pub mod config_defaults {
    pub const WIDTH: u32 = 1280;
    pub const HEIGHT: u32 = 800;
    pub const BYTES_PER_PIXEL: u8 = 4;
    pub const FRAMERATE: u32 = 60;
    pub const DEVICE: &str = "/dev/fb0";
}

/// Where connections write pixels to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Backend {
    /// An in-memory canvas, copied to the device `framerate` times per second.
    Scheduled,
    /// The device memory itself, mapped into the process. Writes show up immediately.
    #[default]
    Direct,
}

/// Everything the server needs to start. Built from the command line by
/// [`crate::CLIArg::server_config`], checked by [`ServerConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub size: Size,
    /// Raw count, so that an unsupported value is reported by [`Self::validate`].
    pub bytes_per_pixel: u8,
    pub channel_order: ChannelOrder,
    pub framerate: u32,
    pub device: PathBuf,
    pub transform: FlushTransform,
    pub alpha_mode: AlphaMode,
    pub screen_mode: ScreenMode,
    pub bind_mode: BindMode,
    pub port: u16,
    pub grab_size: usize,
    pub backend: Backend,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            size: Size::new(config_defaults::WIDTH, config_defaults::HEIGHT),
            bytes_per_pixel: config_defaults::BYTES_PER_PIXEL,
            channel_order: ChannelOrder::default(),
            framerate: config_defaults::FRAMERATE,
            device: PathBuf::from(config_defaults::DEVICE),
            transform: FlushTransform::default(),
            alpha_mode: AlphaMode::default(),
            screen_mode: ScreenMode::default(),
            bind_mode: BindMode::default(),
            port: protocol_constants::DEFAULT_PORT,
            grab_size: protocol_constants::DEFAULT_GRAB_SIZE,
            backend: Backend::default(),
        }
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum ConfigError {
    #[error("Canvas size {width}x{height} has no pixels")]
    #[diagnostic(
        code(pixelflood::config::empty_canvas),
        help("--width and --height must both be at least 1")
    )]
    EmptyCanvas { width: u32, height: u32 },

    #[error("Canvas size {width}x{height} at {bytes_per_pixel} bytes per pixel doesn't fit in memory")]
    #[diagnostic(code(pixelflood::config::canvas_too_large))]
    CanvasTooLarge {
        width: u32,
        height: u32,
        bytes_per_pixel: u8,
    },

    #[error("{count} bytes per pixel is not supported")]
    #[diagnostic(
        code(pixelflood::config::bytes_per_pixel),
        help("Use --bytes-per-pixel 4 (XRGB8888) or 3 (RGB888)")
    )]
    UnsupportedBytesPerPixel { count: u8 },

    #[error("Framerate must be at least 1")]
    #[diagnostic(code(pixelflood::config::framerate))]
    ZeroFramerate,

    #[error("Grab size must be at least 1 byte")]
    #[diagnostic(code(pixelflood::config::grab_size))]
    ZeroGrabSize,

    #[error("The direct backend is only available on unix")]
    #[diagnostic(
        code(pixelflood::config::direct_unsupported),
        help("Use --mode scheduled")
    )]
    DirectBackendUnsupported,
}

impl ServerConfig {
    /// Check every setting before any device or socket is opened. Returns the canvas
    /// layout the settings describe.
    ///
    /// # Errors
    ///
    /// The first [`ConfigError`] found.
    pub fn validate(&self) -> Result<GridLayout, ConfigError> {
        let Size { width, height } = self.size;
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyCanvas { width, height });
        }

        let bytes_per_pixel = BytesPerPixel::try_from_count(self.bytes_per_pixel).ok_or(
            ConfigError::UnsupportedBytesPerPixel {
                count: self.bytes_per_pixel,
            },
        )?;

        let layout = GridLayout::new(
            self.size,
            PixelFormat::new(bytes_per_pixel, self.channel_order),
        );
        if layout.checked_byte_len().is_none() {
            return Err(ConfigError::CanvasTooLarge {
                width,
                height,
                bytes_per_pixel: self.bytes_per_pixel,
            });
        }

        if self.framerate == 0 {
            return Err(ConfigError::ZeroFramerate);
        }
        if self.grab_size == 0 {
            return Err(ConfigError::ZeroGrabSize);
        }
        if self.backend == Backend::Direct && cfg!(not(unix)) {
            return Err(ConfigError::DirectBackendUnsupported);
        }

        Ok(layout)
    }

    #[must_use]
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            alpha_mode: self.alpha_mode,
            grab_size: self.grab_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_is_valid() {
        let layout = ServerConfig::default().validate().unwrap();
        assert_eq!(layout.size, Size::new(1280, 800));
        assert_eq!(layout.byte_len(), 1280 * 800 * 4);
    }

    #[test]
    fn test_three_bytes_per_pixel() {
        let config = ServerConfig {
            bytes_per_pixel: 3,
            channel_order: ChannelOrder::Rgb,
            ..ServerConfig::default()
        };
        let layout = config.validate().unwrap();
        assert_eq!(
            layout.format,
            PixelFormat::new(BytesPerPixel::Three, ChannelOrder::Rgb)
        );
    }

    #[test]
    fn test_rejects_empty_canvas() {
        let config = ServerConfig {
            size: Size::new(0, 800),
            ..ServerConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyCanvas {
                width: 0,
                height: 800
            })
        );
    }

    #[test]
    fn test_rejects_unsupported_bytes_per_pixel() {
        let config = ServerConfig {
            bytes_per_pixel: 2,
            ..ServerConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnsupportedBytesPerPixel { count: 2 })
        );
    }

    #[test]
    fn test_rejects_zero_framerate_and_grab_size() {
        let config = ServerConfig {
            framerate: 0,
            ..ServerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroFramerate));

        let config = ServerConfig {
            grab_size: 0,
            ..ServerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroGrabSize));
    }

    #[test]
    fn test_connection_settings() {
        let config = ServerConfig {
            alpha_mode: AlphaMode::Ignore,
            grab_size: 16,
            ..ServerConfig::default()
        };
        assert_eq!(
            config.connection_settings(),
            ConnectionSettings {
                alpha_mode: AlphaMode::Ignore,
                grab_size: 16
            }
        );
    }
}
