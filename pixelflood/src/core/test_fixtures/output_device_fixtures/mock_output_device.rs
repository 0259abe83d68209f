// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{io,
          sync::{Arc, Mutex},
          time::{Duration, Instant}};

use crate::OutputDevice;

/// One [`OutputDevice::write_frame`] call, as seen by [`MockOutputDevice`].
#[derive(Debug, Clone)]
pub struct RecordedFrame {
    /// When the write started.
    pub at: Instant,
    pub bytes: Vec<u8>,
}

/// Records every frame written to it. Clones share the same recording, so a test keeps
/// one clone and hands the other to the [`crate::FlushScheduler`].
#[derive(Debug, Clone, Default)]
pub struct MockOutputDevice {
    pub recorded: Arc<Mutex<Vec<RecordedFrame>>>,
    /// Simulates a slow device.
    pub write_delay: Option<Duration>,
}

impl MockOutputDevice {
    #[must_use]
    pub fn with_write_delay(write_delay: Duration) -> Self {
        Self {
            write_delay: Some(write_delay),
            ..Self::default()
        }
    }

    /// All frames written so far.
    #[must_use]
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.recorded_frames().into_iter().map(|it| it.bytes).collect()
    }

    /// Start time of every write so far.
    #[must_use]
    pub fn timestamps(&self) -> Vec<Instant> {
        self.recorded_frames().into_iter().map(|it| it.at).collect()
    }

    fn recorded_frames(&self) -> Vec<RecordedFrame> {
        match self.recorded.lock() {
            Ok(it) => it.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl OutputDevice for MockOutputDevice {
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        let at = Instant::now();
        if let Some(write_delay) = self.write_delay {
            std::thread::sleep(write_delay);
        }
        self.recorded
            .lock()
            .map_err(|_| io::Error::other("MockOutputDevice lock poisoned"))?
            .push(RecordedFrame {
                at,
                bytes: frame.to_vec(),
            });
        Ok(())
    }
}
