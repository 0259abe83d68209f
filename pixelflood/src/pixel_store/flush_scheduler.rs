// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Periodic copy of a [`ScheduledBuffer`] to an [`OutputDevice`].
//!
//! The scheduler runs on its own OS thread, since a framebuffer write is blocking I/O
//! that has no business on the async runtime. The loop is:
//!
//! ```text
//! loop {
//!     sleep(period)          // period = 1 / framerate
//!     snapshot buffer -> frame
//!     transform frame        // optional
//!     write frame to device
//! }
//! ```
//!
//! The sleep starts when the previous flush has *completed*. A slow flush pushes every
//! later tick back, missed ticks are never caught up with back to back flushes.

use std::{io,
          sync::{Arc,
                 atomic::{AtomicBool, Ordering}},
          thread::JoinHandle,
          time::{Duration, Instant}};

use miette::{IntoDiagnostic, WrapErr};
use tracing::{debug, error, info};

use crate::{CommonResult, OutputDevice, PixelStore, RateLimiter, ScheduledBuffer, ok};

pub const FLUSH_THREAD_NAME: &str = "flush-scheduler";

/// Minimum time between two "flush failed" log lines.
pub const FLUSH_ERROR_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Optional per flush transform, for displays that disagree with the canvas about byte
/// order or polarity. Only the outgoing copy is transformed, never the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushTransform {
    #[default]
    None,
    /// Reverse the bytes of each pixel.
    ByteSwap,
    /// Invert every bit.
    Invert,
}

impl FlushTransform {
    /// `stride` is the pixel size in bytes.
    pub fn apply(self, frame: &mut [u8], stride: usize) {
        match self {
            FlushTransform::None => {}
            FlushTransform::ByteSwap => {
                frame.chunks_exact_mut(stride).for_each(<[u8]>::reverse);
            }
            FlushTransform::Invert => {
                for byte in frame.iter_mut() {
                    *byte = !*byte;
                }
            }
        }
    }
}

#[must_use]
pub fn period_for_framerate(framerate: u32) -> Duration {
    Duration::from_secs(1) / framerate.max(1)
}

#[derive(Debug)]
pub struct FlushScheduler<D> {
    buffer: Arc<ScheduledBuffer>,
    device: D,
    period: Duration,
    transform: FlushTransform,
    /// Reused across ticks.
    frame: Vec<u8>,
}

impl<D: OutputDevice + 'static> FlushScheduler<D> {
    #[must_use]
    pub fn new(
        buffer: Arc<ScheduledBuffer>,
        device: D,
        framerate: u32,
        transform: FlushTransform,
    ) -> Self {
        let frame = Vec::with_capacity(buffer.layout().byte_len());
        Self {
            buffer,
            device,
            period: period_for_framerate(framerate),
            transform,
            frame,
        }
    }

    #[must_use]
    pub fn period(&self) -> Duration { self.period }

    /// One flush: snapshot, transform, write.
    ///
    /// # Errors
    ///
    /// The device write error.
    pub fn tick(&mut self) -> io::Result<()> {
        self.buffer.snapshot_into(&mut self.frame);
        self.transform
            .apply(&mut self.frame, self.buffer.layout().format.stride());
        self.device.write_frame(&self.frame)
    }

    /// Start the flush thread. It runs until [`FlushSchedulerHandle::stop_and_join`].
    ///
    /// # Errors
    ///
    /// Returns an error if the OS refuses to create the thread.
    pub fn spawn(self) -> CommonResult<FlushSchedulerHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let join_handle = std::thread::Builder::new()
            .name(FLUSH_THREAD_NAME.into())
            .spawn({
                let stop = Arc::clone(&stop);
                move || self.run(&stop)
            })
            .into_diagnostic()
            .wrap_err("Failed to spawn the flush scheduler thread")?;
        ok!(FlushSchedulerHandle { stop, join_handle })
    }

    fn run(mut self, stop: &AtomicBool) {
        info!(
            message = "Flush scheduler started",
            period = ?self.period,
            transform = ?self.transform
        );

        let mut frames_written: u64 = 0;
        let mut error_log_limiter = RateLimiter::new(FLUSH_ERROR_LOG_INTERVAL);

        loop {
            std::thread::sleep(self.period);
            if stop.load(Ordering::Relaxed) {
                break;
            }
            match self.tick() {
                Ok(()) => frames_written += 1,
                Err(error) => {
                    if error_log_limiter
                        .get_status_and_update_last_run(Instant::now())
                        .is_allowed()
                    {
                        error!(message = "Flush to output device failed", %error);
                    }
                }
            }
        }

        debug!(message = "Flush scheduler stopped", frames_written);
    }
}

/// Returned by [`FlushScheduler::spawn`]. Dropping it leaves the thread running
/// (detached) until the process exits.
#[derive(Debug)]
pub struct FlushSchedulerHandle {
    stop: Arc<AtomicBool>,
    join_handle: JoinHandle<()>,
}

impl FlushSchedulerHandle {
    /// Ask the thread to stop, and wait for it. Takes up to one period.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread panicked.
    pub fn stop_and_join(self) -> CommonResult<()> {
        self.stop.store(true, Ordering::Relaxed);
        self.join_handle
            .join()
            .map_err(|_| miette::miette!("The flush scheduler thread panicked"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BytesPerPixel, ChannelOrder, GridLayout, MockOutputDevice, Paint,
                PixelFormat, Pos, Rgb, Size};
    use pretty_assertions::assert_eq;

    fn buffer() -> Arc<ScheduledBuffer> {
        Arc::new(ScheduledBuffer::new(GridLayout::new(
            Size::new(2, 1),
            PixelFormat::new(BytesPerPixel::Four, ChannelOrder::Bgr),
        )))
    }

    #[test]
    fn test_period_for_framerate() {
        assert_eq!(period_for_framerate(50), Duration::from_millis(20));
        assert_eq!(period_for_framerate(1), Duration::from_secs(1));
        assert_eq!(period_for_framerate(0), Duration::from_secs(1));
    }

    #[test]
    fn test_byteswap_reverses_each_pixel() {
        let mut frame = vec![1, 2, 3, 4, 5, 6, 7, 8];
        FlushTransform::ByteSwap.apply(&mut frame, 4);
        assert_eq!(frame, vec![4, 3, 2, 1, 8, 7, 6, 5]);
    }

    #[test]
    fn test_invert_flips_bits() {
        let mut frame = vec![0x00, 0xff, 0x0f];
        FlushTransform::Invert.apply(&mut frame, 3);
        assert_eq!(frame, vec![0xff, 0x00, 0xf0]);
    }

    #[test]
    fn test_tick_writes_full_frame() {
        let buffer = buffer();
        buffer.set(Pos::new(1, 0), Paint::Opaque(Rgb::new(0x11, 0x22, 0x33)));
        let device = MockOutputDevice::default();

        let mut scheduler =
            FlushScheduler::new(Arc::clone(&buffer), device.clone(), 60, FlushTransform::None);
        scheduler.tick().unwrap();

        assert_eq!(
            device.frames(),
            vec![vec![0, 0, 0, 0, 0x33, 0x22, 0x11, 0xff]]
        );
    }

    #[test]
    fn test_tick_transform_leaves_canvas_alone() {
        let buffer = buffer();
        buffer.set(Pos::new(0, 0), Paint::Opaque(Rgb::new(0x11, 0x22, 0x33)));
        let device = MockOutputDevice::default();

        let mut scheduler = FlushScheduler::new(
            Arc::clone(&buffer),
            device.clone(),
            60,
            FlushTransform::ByteSwap,
        );
        scheduler.tick().unwrap();

        assert_eq!(device.frames()[0][..4], [0xff, 0x11, 0x22, 0x33]);
        assert_eq!(buffer.get(Pos::new(0, 0)), Some(Rgb::new(0x11, 0x22, 0x33)));
    }

    #[test]
    fn test_ticks_are_one_period_apart() {
        let device = MockOutputDevice::default();
        let scheduler = FlushScheduler::new(buffer(), device.clone(), 50, FlushTransform::None);
        let period = scheduler.period();

        let started = Instant::now();
        let handle = scheduler.spawn().unwrap();
        std::thread::sleep(Duration::from_millis(150));
        handle.stop_and_join().unwrap();

        let timestamps = device.timestamps();
        assert!(timestamps.len() >= 2, "only {} flushes", timestamps.len());
        assert!(timestamps.len() <= 8, "{} flushes", timestamps.len());
        assert!(timestamps[0].duration_since(started) >= period);
        for pair in timestamps.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= period);
        }
    }

    /// A flush that takes longer than the period delays the next one, instead of being
    /// followed by a burst of catch up flushes.
    #[test]
    fn test_slow_device_does_not_cause_catch_up() {
        let write_delay = Duration::from_millis(40);
        let device = MockOutputDevice::with_write_delay(write_delay);
        let scheduler =
            FlushScheduler::new(buffer(), device.clone(), 100, FlushTransform::None);
        let period = scheduler.period();

        let handle = scheduler.spawn().unwrap();
        std::thread::sleep(Duration::from_millis(250));
        handle.stop_and_join().unwrap();

        let timestamps = device.timestamps();
        assert!(timestamps.len() >= 2, "only {} flushes", timestamps.len());
        for pair in timestamps.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= write_delay + period);
        }
    }
}
