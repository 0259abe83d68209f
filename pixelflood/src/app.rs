// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::Arc;

use miette::{IntoDiagnostic, WrapErr};
use tracing::info;

use crate::{Backend, CommonResult, FlushScheduler, FlushSchedulerHandle, FramebufferFile,
            GridLayout, PixelStore, ScheduledBuffer, ScreenMode, ServerConfig,
            accept_forever, ok, read_device_frame, try_bind};

/// The shared canvas, plus the flush thread that goes with it in scheduled mode.
#[derive(Debug)]
pub struct Canvas {
    pub store: Arc<dyn PixelStore>,
    pub maybe_scheduler: Option<FlushSchedulerHandle>,
}

impl Canvas {
    /// Stop the flush thread (if any). The canvas stays readable.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush thread panicked.
    pub fn shutdown(self) -> CommonResult<()> {
        if let Some(scheduler) = self.maybe_scheduler {
            scheduler.stop_and_join()?;
        }
        ok!()
    }
}

/// Open the device and build the backend `config` asks for.
///
/// - [`Backend::Scheduled`]: an in-memory canvas, seeded from the device unless the
///   screen is cleared, and a running [`FlushScheduler`].
/// - [`Backend::Direct`]: the device memory mapped as the canvas.
///
/// # Errors
///
/// [`crate::DeviceError`] if the device can't be opened, read or mapped, or the flush
/// thread can't be started.
pub fn try_create_canvas(config: &ServerConfig, layout: GridLayout) -> CommonResult<Canvas> {
    match config.backend {
        Backend::Scheduled => {
            let buffer = Arc::new(ScheduledBuffer::new(layout));
            if config.screen_mode == ScreenMode::Keep {
                buffer.seed_from(&read_device_frame(&config.device, layout.byte_len())?);
            }
            let device = FramebufferFile::open(&config.device, layout.byte_len())?;
            let scheduler = FlushScheduler::new(
                Arc::clone(&buffer),
                device,
                config.framerate,
                config.transform,
            )
            .spawn()?;
            ok!(Canvas {
                store: buffer,
                maybe_scheduler: Some(scheduler),
            })
        }
        Backend::Direct => try_create_direct_canvas(config, layout),
    }
}

#[cfg(unix)]
fn try_create_direct_canvas(config: &ServerConfig, layout: GridLayout) -> CommonResult<Canvas> {
    let buffer = crate::DirectDeviceBuffer::open(&config.device, layout, config.screen_mode)?;
    ok!(Canvas {
        store: Arc::new(buffer),
        maybe_scheduler: None,
    })
}

#[cfg(not(unix))]
fn try_create_direct_canvas(_config: &ServerConfig, _layout: GridLayout) -> CommonResult<Canvas> {
    Err(crate::ConfigError::DirectBackendUnsupported.into())
}

/// Validate `config`, open the canvas, and serve clients until Ctrl-C.
///
/// # Errors
///
/// Any startup failure (invalid settings, device, listening socket), or the listening
/// socket failing while serving.
pub async fn run_app(config: ServerConfig) -> CommonResult<()> {
    let layout = config.validate()?;
    let canvas = try_create_canvas(&config, layout)?;
    let listener = try_bind(config.port, config.bind_mode)?;

    info!(
        message = "Listening",
        address = %listener.local_addr().into_diagnostic()?,
        backend = ?config.backend,
        device = %config.device.display(),
        width = layout.size.width,
        height = layout.size.height,
        format = ?layout.format,
    );

    let served = tokio::select! {
        result = accept_forever(listener, Arc::clone(&canvas.store), config.connection_settings()) => {
            result.into_diagnostic().wrap_err("Stopped accepting connections")
        }
        result = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            result.into_diagnostic().wrap_err("Failed to listen for Ctrl-C")
        }
    };

    // Stop the flush thread either way, then report the first failure.
    let stopped = canvas.shutdown();
    served?;
    stopped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FlushTransform, Paint, Pos, Rgb, Size, try_create_temp_dir};
    use pretty_assertions::assert_eq;
    use std::time::{Duration, Instant};

    fn config(backend: Backend, screen_mode: ScreenMode) -> ServerConfig {
        ServerConfig {
            size: Size::new(4, 2),
            framerate: 200,
            backend,
            screen_mode,
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_scheduled_canvas_keeps_screen_and_flushes() {
        let dir = try_create_temp_dir().unwrap();
        let it = ServerConfig {
            device: dir.create_file("fb", 4 * 2 * 4, 0x11).unwrap(),
            ..config(Backend::Scheduled, ScreenMode::Keep)
        };
        let layout = it.validate().unwrap();

        let canvas = try_create_canvas(&it, layout).unwrap();
        assert_eq!(canvas.store.get(Pos::new(0, 0)), Some(Rgb::new(0x11, 0x11, 0x11)));

        canvas.store.set(Pos::new(0, 0), Paint::Opaque(Rgb::new(0xff, 0, 0)));
        let deadline = Instant::now() + Duration::from_secs(5);
        let flushed = loop {
            let bytes = std::fs::read(&it.device).unwrap();
            if bytes[..4] == [0x00, 0x00, 0xff, 0xff] || Instant::now() > deadline {
                break bytes;
            }
            std::thread::sleep(Duration::from_millis(10));
        };
        canvas.shutdown().unwrap();

        // Bgr with the pad byte.
        assert_eq!(flushed[..4], [0x00, 0x00, 0xff, 0xff]);
        assert_eq!(flushed[4..8], [0x11; 4]);
    }

    #[test]
    fn test_scheduled_canvas_clear_screen() {
        let dir = try_create_temp_dir().unwrap();
        let it = ServerConfig {
            device: dir.create_file("fb", 4 * 2 * 4, 0x11).unwrap(),
            transform: FlushTransform::Invert,
            ..config(Backend::Scheduled, ScreenMode::Clear)
        };
        let canvas = try_create_canvas(&it, it.validate().unwrap()).unwrap();
        assert_eq!(canvas.store.get(Pos::new(3, 1)), Some(Rgb::BLACK));
        canvas.shutdown().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_direct_canvas_writes_through() {
        let dir = try_create_temp_dir().unwrap();
        let it = ServerConfig {
            device: dir.create_file("fb", 4 * 2 * 4, 0).unwrap(),
            ..config(Backend::Direct, ScreenMode::Keep)
        };
        let canvas = try_create_canvas(&it, it.validate().unwrap()).unwrap();
        assert!(canvas.maybe_scheduler.is_none());

        canvas.store.set(Pos::new(1, 0), Paint::Opaque(Rgb::new(0x01, 0x02, 0x03)));
        let store = canvas.store.clone();
        canvas.shutdown().unwrap();
        drop(store);

        let bytes = std::fs::read(&it.device).unwrap();
        assert_eq!(bytes[4..8], [0x03, 0x02, 0x01, 0xff]);
    }

    #[test]
    fn test_missing_device_is_an_error() {
        let dir = try_create_temp_dir().unwrap();
        let it = ServerConfig {
            device: dir.path.join("missing"),
            ..config(Backend::Scheduled, ScreenMode::Clear)
        };
        assert!(try_create_canvas(&it, it.validate().unwrap()).is_err());
    }
}
