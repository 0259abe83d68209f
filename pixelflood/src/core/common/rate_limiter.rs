// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::time::{Duration, Instant};

/// The status of a [`RateLimiter`] at a given instant:
/// - [`RateLimitStatus::NotStarted`]: it has never let anything through.
/// - [`RateLimitStatus::Expired`]: the last pass was longer than the threshold ago.
/// - [`RateLimitStatus::Active`]: the last pass was within the threshold.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RateLimitStatus {
    NotStarted,
    Expired,
    Active,
}

impl RateLimitStatus {
    #[must_use]
    pub fn is_allowed(self) -> bool { !matches!(self, RateLimitStatus::Active) }
}

/// Lets an operation through at most once every `min_time_threshold`. The flush thread
/// uses it so that a device that fails every tick (60 times a second) produces one log
/// line per interval, not one per tick.
#[derive(Debug, PartialEq, Eq)]
pub struct RateLimiter {
    pub last_run: Option<Instant>,
    pub min_time_threshold: Duration,
}

impl RateLimiter {
    #[must_use]
    pub fn new(min_time_threshold: Duration) -> Self {
        Self {
            last_run: None,
            min_time_threshold,
        }
    }

    /// Get the status, and record `now` as the last pass if the operation is allowed.
    pub fn get_status_and_update_last_run(&mut self, now: Instant) -> RateLimitStatus {
        let status = self.get_status(now);
        if status.is_allowed() {
            self.last_run.replace(now);
        }
        status
    }

    #[must_use]
    pub fn get_status(&self, now: Instant) -> RateLimitStatus {
        match self.last_run {
            None => RateLimitStatus::NotStarted,
            Some(last_run) if now.duration_since(last_run) > self.min_time_threshold => {
                RateLimitStatus::Expired
            }
            Some(_) => RateLimitStatus::Active,
        }
    }
}
