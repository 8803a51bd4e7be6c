//! handctl Recognition Core
//!
//! Turns landmark sets into debounced gesture symbols:
//! - **Features:** center, palm scale, finger pattern, orientation
//! - **Smoothing:** per-landmark EMA, plus a point EMA for the cursor
//! - **Classification:** static pattern, then shape/template, then swipe
//! - **Stabilization:** hold-time debounce and majority-vote confidence
//! - **Cursor mapping:** active zone to display coordinates
//!
//! This crate is pure computation: no I/O, no threads, no clocks.
//! All inputs are data; all outputs are data.

pub mod classifier;
pub mod cursor;
pub mod features;
pub mod motion;
pub mod smoothing;
pub mod stabilizer;
pub mod track;

pub use classifier::{ClassifierParams, GestureClassifier, MatchStrategy};
pub use cursor::{CursorMapper, CursorTarget};
pub use features::{HandSnapshot, Point2};
pub use motion::{hand_dynamics, MotionWindow};
pub use smoothing::{LandmarkSmoother, SmoothingAlgorithm};
pub use stabilizer::{ConfidenceBuffer, GestureStabilizer, StabilizerParams, StabilizerUpdate};
pub use track::{HandTrack, TrackUpdate};
