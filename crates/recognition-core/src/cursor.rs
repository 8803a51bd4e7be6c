//! Hand position to display coordinates.
//!
//! Absolute mode maps an "active zone" inside the camera frame onto the whole
//! display:
//!
//! ```text
//!   frame (640x480), margin 0.1
//!   ┌──────────────────────────┐
//!   │   ┌──────────────────┐   │        display (1920x1080)
//!   │   │   active zone    │ ──┼──▶  [0,1]² ──▶ ┌──────────────┐
//!   │   └──────────────────┘   │                │              │
//!   └──────────────────────────┘                └──────────────┘
//! ```
//!
//! Positions outside the zone are clamped to its edge, so the pointer can
//! reach every display border without the hand leaving the camera view.
//! The display-space result passes through a separate EMA.
//!
//! Relative mode moves the pointer by the frame-to-frame change of the hand
//! center, scaled by a sensitivity and boosted for large steps.

use handctl_common::config::{CursorConfig, CursorMode};

use crate::features::Point2;
use crate::smoothing::{PointSmoother, SmoothingAlgorithm};

/// Steps longer than this (frame pixels, per axis) get the acceleration gain.
pub const ACCELERATION_STEP_PX: f64 = 10.0;

/// Pointer motion for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorTarget {
    Absolute { x: i32, y: i32 },
    Relative { dx: i32, dy: i32 },
}

#[derive(Debug, Clone)]
pub struct CursorMapper {
    config: CursorConfig,
    smoother: PointSmoother,
    last_center: Option<Point2>,
}

impl CursorMapper {
    pub fn new(config: CursorConfig) -> Self {
        let smoother = PointSmoother::new(SmoothingAlgorithm::ema(config.smoothing));
        Self {
            config,
            smoother,
            last_center: None,
        }
    }

    pub fn config(&self) -> &CursorConfig {
        &self.config
    }

    /// Apply new settings. History is kept unless the mode changes.
    pub fn set_config(&mut self, config: CursorConfig) {
        if config.mode != self.config.mode {
            self.reset();
        }
        self.smoother
            .set_algorithm(SmoothingAlgorithm::ema(config.smoothing));
        self.config = config;
    }

    /// Map according to the configured mode. `None` when relative mode has
    /// no previous sample yet.
    pub fn map(&mut self, center: Point2) -> Option<CursorTarget> {
        match self.config.mode {
            CursorMode::Absolute => {
                let (x, y) = self.map_absolute(center);
                Some(CursorTarget::Absolute { x, y })
            }
            CursorMode::Relative => self
                .map_relative(center)
                .map(|(dx, dy)| CursorTarget::Relative { dx, dy }),
        }
    }

    /// Clamp into the active zone, normalize, scale to the display, smooth.
    pub fn map_absolute(&mut self, center: Point2) -> (i32, i32) {
        let (nx, ny) = self.normalize_in_zone(center);
        let raw = Point2::new(
            nx * self.config.display_width as f64,
            ny * self.config.display_height as f64,
        );
        let p = self.smoother.smooth(raw);
        (p.x.round() as i32, p.y.round() as i32)
    }

    /// Pointer delta since the previous call.
    pub fn map_relative(&mut self, center: Point2) -> Option<(i32, i32)> {
        let previous = self.last_center.replace(center)?;
        let mut dx = (center.x - previous.x) * self.config.sensitivity;
        let mut dy = (center.y - previous.y) * self.config.sensitivity;
        if (center.x - previous.x).abs() > ACCELERATION_STEP_PX
            || (center.y - previous.y).abs() > ACCELERATION_STEP_PX
        {
            dx *= self.config.acceleration;
            dy *= self.config.acceleration;
        }
        Some((dx.round() as i32, dy.round() as i32))
    }

    /// Position within the active zone as `[0, 1]` fractions.
    pub fn normalize_in_zone(&self, center: Point2) -> (f64, f64) {
        let fw = self.config.frame_width as f64;
        let fh = self.config.frame_height as f64;
        let margin = self.config.active_zone_margin;

        let (x0, x1) = (fw * margin, fw * (1.0 - margin));
        let (y0, y1) = (fh * margin, fh * (1.0 - margin));

        let fraction = |v: f64, lo: f64, hi: f64| {
            if hi <= lo {
                0.5
            } else {
                (v.clamp(lo, hi) - lo) / (hi - lo)
            }
        };
        (fraction(center.x, x0, x1), fraction(center.y, y0, y1))
    }

    /// Drop smoothing and relative history, e.g. when the hand is lost.
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.last_center = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unsmoothed() -> CursorConfig {
        CursorConfig {
            smoothing: 1.0,
            ..CursorConfig::default()
        }
    }

    #[test]
    fn test_zone_corners_reach_display_corners() {
        let mut mapper = CursorMapper::new(unsmoothed());
        assert_eq!(mapper.map_absolute(Point2::new(64.0, 48.0)), (0, 0));
        assert_eq!(mapper.map_absolute(Point2::new(576.0, 432.0)), (1920, 1080));
        assert_eq!(mapper.map_absolute(Point2::new(320.0, 240.0)), (960, 540));
    }

    #[test]
    fn test_outside_zone_is_clamped() {
        let mut mapper = CursorMapper::new(unsmoothed());
        assert_eq!(mapper.map_absolute(Point2::new(0.0, 479.0)), (0, 1080));
        assert_eq!(mapper.map_absolute(Point2::new(-50.0, -50.0)), (0, 0));
    }

    #[test]
    fn test_output_is_smoothed() {
        let mut mapper = CursorMapper::new(CursorConfig::default());
        assert_eq!(mapper.map_absolute(Point2::new(64.0, 48.0)), (0, 0));
        // alpha 0.3 toward (1920, 1080)
        assert_eq!(mapper.map_absolute(Point2::new(576.0, 432.0)), (576, 324));
    }

    #[test]
    fn test_reset_drops_history() {
        let mut mapper = CursorMapper::new(CursorConfig::default());
        mapper.map_absolute(Point2::new(64.0, 48.0));
        mapper.reset();
        assert_eq!(mapper.map_absolute(Point2::new(576.0, 432.0)), (1920, 1080));
    }

    #[test]
    fn test_relative_mode_scales_and_accelerates() {
        let mut mapper = CursorMapper::new(CursorConfig {
            mode: CursorMode::Relative,
            ..CursorConfig::default()
        });
        assert_eq!(mapper.map(Point2::new(100.0, 100.0)), None);
        assert_eq!(
            mapper.map(Point2::new(104.0, 98.0)),
            Some(CursorTarget::Relative { dx: 6, dy: -3 })
        );
        // 20 px step: 20 * 1.5 * 1.2 = 36
        assert_eq!(
            mapper.map(Point2::new(124.0, 98.0)),
            Some(CursorTarget::Relative { dx: 36, dy: 0 })
        );
    }

    #[test]
    fn test_mode_change_resets() {
        let mut mapper = CursorMapper::new(CursorConfig::default());
        mapper.map(Point2::new(100.0, 100.0));
        mapper.set_config(CursorConfig {
            mode: CursorMode::Relative,
            ..CursorConfig::default()
        });
        assert_eq!(mapper.map(Point2::new(110.0, 100.0)), None);
    }
}
