//! Per-hand recognition state.
//!
//! A [`HandTrack`] owns everything that must not leak between hands: the
//! landmark smoother, the motion windows and the stabilizer. Feeding it one
//! landmark set per frame runs the whole recognition chain.
//!
//! Two windows are kept. The swipe window only receives frames that neither
//! the static nor the shape strategy recognised; the trail receives every
//! frame and backs [`HandDynamics`].

use std::collections::BTreeMap;

use handctl_common::clock::TimestampNs;
use handctl_common::config::RecognitionConfig;
use handctl_hand_model::event::HandDynamics;
use handctl_hand_model::gesture::{GestureSymbol, HoldPhase};
use handctl_hand_model::landmark::{Handedness, Landmarks};
use handctl_hand_model::mapping::CustomGestureTemplate;

use crate::classifier::{ClassifierParams, GestureClassifier};
use crate::features::HandSnapshot;
use crate::motion::{MotionSample, MotionWindow};
use crate::smoothing::{LandmarkSmoother, SmoothingAlgorithm};
use crate::stabilizer::{GestureStabilizer, StabilizerParams, StabilizerUpdate};

/// Output of one frame for one hand.
#[derive(Debug, Clone)]
pub struct TrackUpdate {
    pub snapshot: HandSnapshot,
    /// Raw classification before debounce.
    pub raw: GestureSymbol,
    pub stabilizer: StabilizerUpdate,
}

#[derive(Debug, Clone)]
pub struct HandTrack {
    smoother: LandmarkSmoother,
    window: MotionWindow,
    trail: MotionWindow,
    classifier: GestureClassifier,
    stabilizer: GestureStabilizer,
    last_seen_ns: TimestampNs,
}

impl HandTrack {
    pub fn new(config: &RecognitionConfig) -> Self {
        Self {
            smoother: LandmarkSmoother::new(SmoothingAlgorithm::from_settings(
                config.landmark_smoothing_enabled,
                config.landmark_smoothing,
            )),
            window: MotionWindow::new(config.motion_window_capacity),
            trail: MotionWindow::new(config.motion_window_capacity),
            classifier: GestureClassifier::new(ClassifierParams::from_config(config)),
            stabilizer: GestureStabilizer::new(StabilizerParams::from_config(config)),
            last_seen_ns: 0,
        }
    }

    /// Swap in new thresholds. Accumulated history is kept.
    pub fn apply_config(&mut self, config: &RecognitionConfig) {
        self.smoother.set_algorithm(SmoothingAlgorithm::from_settings(
            config.landmark_smoothing_enabled,
            config.landmark_smoothing,
        ));
        self.window.set_capacity(config.motion_window_capacity);
        self.trail.set_capacity(config.motion_window_capacity);
        self.classifier
            .set_params(ClassifierParams::from_config(config));
        self.stabilizer
            .set_params(StabilizerParams::from_config(config));
    }

    pub fn observe(
        &mut self,
        landmarks: &Landmarks,
        handedness: Handedness,
        timestamp_ns: TimestampNs,
        templates: &BTreeMap<String, CustomGestureTemplate>,
    ) -> TrackUpdate {
        let smoothed = self.smoother.smooth(landmarks);
        let snapshot = HandSnapshot::extract(&smoothed, handedness);

        let sample = MotionSample {
            position: snapshot.center,
            timestamp_ns,
            angle_degrees: snapshot.orientation.angle_degrees,
        };
        self.trail.push(sample);
        self.last_seen_ns = timestamp_ns;

        let raw = self
            .classifier
            .classify_tracked(&snapshot, sample, &mut self.window, templates)
            .map(|(symbol, _)| symbol)
            .unwrap_or_default();
        let stabilizer = self.stabilizer.update(raw.clone(), timestamp_ns);

        TrackUpdate {
            snapshot,
            raw,
            stabilizer,
        }
    }

    pub fn current(&self) -> &GestureSymbol {
        self.stabilizer.current()
    }

    pub fn phase(&self) -> HoldPhase {
        self.stabilizer.phase()
    }

    pub fn confidence(&self) -> f64 {
        self.stabilizer.confidence()
    }

    pub fn dynamics(&self) -> HandDynamics {
        self.trail.dynamics()
    }

    pub fn last_seen_ns(&self) -> TimestampNs {
        self.last_seen_ns
    }

    /// Back to the state of a freshly detected hand.
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.window.clear();
        self.trail.clear();
        self.stabilizer.reset();
    }
}
