//! Exponential smoothing for landmark sets and single points.
//!
//! Both smoothers use `smoothed = alpha * current + (1 - alpha) * previous`,
//! where `alpha` is the weight of the newest sample: `1.0` disables smoothing,
//! values near `0.0` smooth heavily. The first sample after construction or
//! [`reset`](LandmarkSmoother::reset) passes through unchanged.

use handctl_hand_model::landmark::{Landmarks, Point3};

use crate::features::Point2;

/// Available smoothing algorithms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SmoothingAlgorithm {
    /// Exponential moving average; `alpha` in `[0.0, 1.0]`.
    Ema { alpha: f64 },

    /// Pass raw data through.
    None,
}

impl SmoothingAlgorithm {
    pub fn ema(alpha: f64) -> Self {
        SmoothingAlgorithm::Ema {
            alpha: clamp01(alpha),
        }
    }

    /// Build from the recognition config switches.
    pub fn from_settings(enabled: bool, alpha: f64) -> Self {
        if enabled {
            Self::ema(alpha)
        } else {
            SmoothingAlgorithm::None
        }
    }

    fn blend(self, previous: f64, current: f64) -> f64 {
        match self {
            SmoothingAlgorithm::Ema { alpha } => ema(previous, current, alpha),
            SmoothingAlgorithm::None => current,
        }
    }
}

/// One EMA step.
pub fn ema(previous: f64, current: f64, alpha: f64) -> f64 {
    alpha * current + (1.0 - alpha) * previous
}

/// Per-landmark, per-axis smoother for one tracked hand.
#[derive(Debug, Clone)]
pub struct LandmarkSmoother {
    algorithm: SmoothingAlgorithm,
    previous: Option<Landmarks>,
}

impl LandmarkSmoother {
    pub fn new(algorithm: SmoothingAlgorithm) -> Self {
        Self {
            algorithm,
            previous: None,
        }
    }

    /// Change the algorithm without dropping history.
    pub fn set_algorithm(&mut self, algorithm: SmoothingAlgorithm) {
        self.algorithm = algorithm;
    }

    pub fn algorithm(&self) -> SmoothingAlgorithm {
        self.algorithm
    }

    pub fn smooth(&mut self, current: &Landmarks) -> Landmarks {
        let smoothed = match &self.previous {
            None => *current,
            Some(previous) => {
                let mut out = *current;
                for (o, (p, c)) in out.iter_mut().zip(previous.iter().zip(current.iter())) {
                    *o = Point3::new(
                        self.algorithm.blend(p.x, c.x),
                        self.algorithm.blend(p.y, c.y),
                        self.algorithm.blend(p.z, c.z),
                    );
                }
                out
            }
        };
        self.previous = Some(smoothed);
        smoothed
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}

/// EMA over a single 2-D point, used for the cursor output.
#[derive(Debug, Clone)]
pub struct PointSmoother {
    algorithm: SmoothingAlgorithm,
    previous: Option<Point2>,
}

impl PointSmoother {
    pub fn new(algorithm: SmoothingAlgorithm) -> Self {
        Self {
            algorithm,
            previous: None,
        }
    }

    pub fn set_algorithm(&mut self, algorithm: SmoothingAlgorithm) {
        self.algorithm = algorithm;
    }

    pub fn smooth(&mut self, current: Point2) -> Point2 {
        let smoothed = match self.previous {
            None => current,
            Some(p) => Point2::new(
                self.algorithm.blend(p.x, current.x),
                self.algorithm.blend(p.y, current.y),
            ),
        };
        self.previous = Some(smoothed);
        smoothed
    }

    pub fn previous(&self) -> Option<Point2> {
        self.previous
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use handctl_hand_model::landmark::LANDMARK_COUNT;

    fn uniform(x: f64, y: f64) -> Landmarks {
        [Point3::xy(x, y); LANDMARK_COUNT]
    }

    #[test]
    fn test_first_sample_passes_through() {
        let mut smoother = LandmarkSmoother::new(SmoothingAlgorithm::ema(0.5));
        assert_eq!(smoother.smooth(&uniform(10.0, 20.0)), uniform(10.0, 20.0));
    }

    #[test]
    fn test_ema_step() {
        let mut smoother = LandmarkSmoother::new(SmoothingAlgorithm::ema(0.5));
        smoother.smooth(&uniform(0.0, 0.0));
        let out = smoother.smooth(&uniform(10.0, -10.0));
        assert_eq!(out[7], Point3::xy(5.0, -5.0));
    }

    #[test]
    fn test_reset_forgets_history() {
        let mut smoother = LandmarkSmoother::new(SmoothingAlgorithm::ema(0.1));
        smoother.smooth(&uniform(0.0, 0.0));
        smoother.reset();
        assert_eq!(smoother.smooth(&uniform(50.0, 50.0)), uniform(50.0, 50.0));
    }

    #[test]
    fn test_disabled_smoothing_is_identity() {
        let mut smoother = LandmarkSmoother::new(SmoothingAlgorithm::from_settings(false, 0.5));
        smoother.smooth(&uniform(0.0, 0.0));
        assert_eq!(smoother.smooth(&uniform(3.0, 4.0)), uniform(3.0, 4.0));
    }

    #[test]
    fn test_point_smoother() {
        let mut smoother = PointSmoother::new(SmoothingAlgorithm::ema(0.3));
        assert_eq!(smoother.smooth(Point2::new(100.0, 0.0)), Point2::new(100.0, 0.0));
        let p = smoother.smooth(Point2::new(200.0, 0.0));
        assert!((p.x - 130.0).abs() < 1e-9);
    }

    #[test]
    fn test_alpha_is_clamped() {
        assert_eq!(SmoothingAlgorithm::ema(1.7), SmoothingAlgorithm::Ema { alpha: 1.0 });
    }
}
