//! Clock and timing utilities for the frame loop.
//!
//! Frames are stamped with monotonic nanoseconds relative to a fixed epoch
//! (the moment the pipeline clock started). This module provides:
//! - The pipeline clock itself
//! - Nanosecond/second conversions
//! - A rate controller for throttled side outputs
//! - A frames-per-second meter

use std::time::Instant;

/// Monotonic nanoseconds since the pipeline clock epoch.
pub type TimestampNs = u64;

/// A monotonic clock anchored to the moment the pipeline started.
#[derive(Debug, Clone)]
pub struct PipelineClock {
    /// The instant the clock started.
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339 string).
    epoch_wall: String,
}

impl PipelineClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Nanoseconds elapsed since the epoch.
    pub fn elapsed_ns(&self) -> TimestampNs {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Seconds elapsed since the epoch.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at the epoch.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Convert a nanosecond value to seconds.
    pub fn ns_to_secs(ns: TimestampNs) -> f64 {
        ns as f64 / 1_000_000_000.0
    }

    /// Convert seconds to nanoseconds.
    pub fn secs_to_ns(secs: f64) -> TimestampNs {
        (secs * 1_000_000_000.0) as u64
    }
}

/// Rate controller for throttled outputs such as status snapshots.
#[derive(Debug)]
pub struct RateController {
    target_interval_ns: u64,
    last_tick_ns: Option<u64>,
}

impl RateController {
    /// Create a controller targeting the given Hz rate.
    pub fn new(target_hz: u32) -> Self {
        Self {
            target_interval_ns: 1_000_000_000 / target_hz.max(1) as u64,
            last_tick_ns: None,
        }
    }

    /// Check if enough time has passed for the next tick.
    /// Returns true and updates internal state if ready.
    /// The first call always returns true.
    pub fn should_tick(&mut self, current_ns: u64) -> bool {
        match self.last_tick_ns {
            None => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            Some(last) if current_ns >= last + self.target_interval_ns => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            _ => false,
        }
    }

    /// Target interval in nanoseconds.
    pub fn interval_ns(&self) -> u64 {
        self.target_interval_ns
    }
}

/// Frames-per-second estimate refreshed about once per second of frame time.
#[derive(Debug, Default)]
pub struct FpsMeter {
    window_start_ns: Option<u64>,
    frames_in_window: u32,
    fps: f64,
}

impl FpsMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame observed at `timestamp_ns`; returns the current estimate.
    pub fn record(&mut self, timestamp_ns: TimestampNs) -> f64 {
        let start = *self.window_start_ns.get_or_insert(timestamp_ns);
        self.frames_in_window += 1;

        let elapsed_ns = timestamp_ns.saturating_sub(start);
        if elapsed_ns >= 1_000_000_000 {
            self.fps = self.frames_in_window as f64 / PipelineClock::ns_to_secs(elapsed_ns);
            self.frames_in_window = 0;
            self.window_start_ns = Some(timestamp_ns);
        }
        self.fps
    }

    /// Most recent estimate (0.0 until one second of frames has been seen).
    pub fn fps(&self) -> f64 {
        self.fps
    }
}
