//! Sliding window of recent hand positions, and the motion measures derived
//! from it.

use std::collections::VecDeque;

use handctl_common::clock::{PipelineClock, TimestampNs};
use handctl_hand_model::event::HandDynamics;

use crate::features::{angle_difference, Point2};

/// One observation of a tracked hand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub position: Point2,
    pub timestamp_ns: TimestampNs,
    /// Hand orientation at this sample, used for rotation speed.
    pub angle_degrees: f64,
}

/// Net motion across the whole window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowMotion {
    pub displacement: Point2,
    pub elapsed_secs: f64,
    /// Pixels per second.
    pub speed: f64,
}

impl WindowMotion {
    /// Heading of the displacement in degrees, image coordinates.
    pub fn angle_degrees(&self) -> f64 {
        self.displacement.y.atan2(self.displacement.x).to_degrees()
    }
}

/// Fixed-capacity FIFO of samples. Pushing onto a full window evicts the
/// oldest sample.
#[derive(Debug, Clone)]
pub struct MotionWindow {
    capacity: usize,
    samples: VecDeque<MotionSample>,
}

impl MotionWindow {
    /// A capacity below 2 is raised to 2.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, sample: MotionSample) {
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resize in place; shrinking keeps the newest samples.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(2);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn samples(&self) -> impl Iterator<Item = &MotionSample> {
        self.samples.iter()
    }

    /// First-to-last motion. `None` until the window is full, or when the
    /// window spans no time.
    pub fn net_motion(&self) -> Option<WindowMotion> {
        if !self.is_full() {
            return None;
        }
        let first = self.samples.front()?;
        let last = self.samples.back()?;
        let elapsed_ns = last.timestamp_ns.checked_sub(first.timestamp_ns)?;
        if elapsed_ns == 0 {
            return None;
        }
        let elapsed_secs = PipelineClock::ns_to_secs(elapsed_ns);
        let displacement = Point2::new(
            last.position.x - first.position.x,
            last.position.y - first.position.y,
        );
        let speed = displacement.x.hypot(displacement.y) / elapsed_secs;
        Some(WindowMotion {
            displacement,
            elapsed_secs,
            speed,
        })
    }

    /// Short-horizon motion measures over the newest samples.
    pub fn dynamics(&self) -> HandDynamics {
        let samples: Vec<MotionSample> = self.samples.iter().copied().collect();
        hand_dynamics(&samples)
    }
}

/// Velocity, acceleration, rotation and stability over the newest samples.
pub fn hand_dynamics(samples: &[MotionSample]) -> HandDynamics {
    let n = samples.len();
    let mut dynamics = HandDynamics::default();
    if n < 2 {
        return dynamics;
    }

    let step = |a: &MotionSample, b: &MotionSample| -> Option<(Point2, f64)> {
        let dt = PipelineClock::ns_to_secs(b.timestamp_ns.checked_sub(a.timestamp_ns)?);
        if dt <= 0.0 {
            return None;
        }
        Some((
            Point2::new(
                (b.position.x - a.position.x) / dt,
                (b.position.y - a.position.y) / dt,
            ),
            dt,
        ))
    };

    let last = &samples[n - 1];
    let prev = &samples[n - 2];
    if let Some((v, dt)) = step(prev, last) {
        dynamics.velocity = v.x.hypot(v.y);
        dynamics.rotation = angle_difference(last.angle_degrees, prev.angle_degrees) / dt;

        if n >= 3 {
            if let Some((v0, _)) = step(&samples[n - 3], prev) {
                dynamics.acceleration = (v.x - v0.x).hypot(v.y - v0.y) / dt;
            }
        }
    }

    if n >= 3 {
        let recent = &samples[n.saturating_sub(5)..];
        let count = recent.len() as f64;
        let mean_x = recent.iter().map(|s| s.position.x).sum::<f64>() / count;
        let mean_y = recent.iter().map(|s| s.position.y).sum::<f64>() / count;
        let variance = recent
            .iter()
            .map(|s| (s.position.x - mean_x).powi(2) + (s.position.y - mean_y).powi(2))
            .sum::<f64>()
            / count;
        dynamics.stability = 1.0 / (1.0 + variance / 100.0);
    }

    dynamics
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(x: f64, y: f64, t_ms: u64) -> MotionSample {
        MotionSample {
            position: Point2::new(x, y),
            timestamp_ns: t_ms * 1_000_000,
            angle_degrees: 0.0,
        }
    }

    #[test]
    fn test_push_evicts_oldest_when_full() {
        let mut window = MotionWindow::new(3);
        for i in 0..5 {
            window.push(sample(i as f64, 0.0, i));
        }
        assert_eq!(window.len(), 3);
        let xs: Vec<f64> = window.samples().map(|s| s.position.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_net_motion_requires_full_window() {
        let mut window = MotionWindow::new(4);
        window.push(sample(0.0, 0.0, 0));
        window.push(sample(10.0, 0.0, 10));
        assert!(window.net_motion().is_none());
    }

    #[test]
    fn test_zero_elapsed_is_rejected() {
        let mut window = MotionWindow::new(2);
        window.push(sample(0.0, 0.0, 5));
        window.push(sample(100.0, 0.0, 5));
        assert!(window.net_motion().is_none());
    }

    #[test]
    fn test_net_motion_speed() {
        let mut window = MotionWindow::new(10);
        for i in 0..10u64 {
            window.push(sample(i as f64 * 600.0 / 9.0, 0.0, i * 200 / 9));
        }
        let motion = window.net_motion().unwrap();
        assert!((motion.displacement.x - 600.0).abs() < 1e-9);
        // 9 * 200 / 9 ms = 200 ms
        assert!((motion.speed - 3000.0).abs() < 1e-6);
    }

    #[test]
    fn test_shrinking_keeps_newest() {
        let mut window = MotionWindow::new(5);
        for i in 0..5 {
            window.push(sample(i as f64, 0.0, i));
        }
        window.set_capacity(2);
        let xs: Vec<f64> = window.samples().map(|s| s.position.x).collect();
        assert_eq!(xs, vec![3.0, 4.0]);
        assert!(window.is_full());
    }

    #[test]
    fn test_dynamics_of_still_hand() {
        let samples: Vec<MotionSample> = (0..5).map(|i| sample(50.0, 50.0, i * 33)).collect();
        let d = hand_dynamics(&samples);
        assert_eq!(d.velocity, 0.0);
        assert_eq!(d.stability, 1.0);
    }

    #[test]
    fn test_dynamics_velocity_and_rotation() {
        let mut a = sample(0.0, 0.0, 0);
        let mut b = sample(30.0, 40.0, 100);
        a.angle_degrees = 175.0;
        b.angle_degrees = -175.0;
        let d = hand_dynamics(&[a, b]);
        assert!((d.velocity - 500.0).abs() < 1e-9);
        assert!((d.rotation - 100.0).abs() < 1e-9);
    }
}
