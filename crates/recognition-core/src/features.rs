//! Feature extraction: one landmark set in, one [`HandSnapshot`] out.
//!
//! # Conventions
//!
//! Image coordinates are y-down. A non-thumb finger is extended when its tip
//! lies above (smaller y than) its PIP joint. The thumb is compared
//! horizontally against its IP joint, in the direction the thumb points for
//! the reported handedness: to the right for right (and unlabelled) hands,
//! to the left for left hands.

use handctl_hand_model::gesture::Direction;
use handctl_hand_model::landmark::{index, Handedness, Landmarks, Point3, LANDMARK_COUNT};
use serde::{Deserialize, Serialize};

/// A point in frame-pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned bounds of all 21 landmarks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Extension flags for `[thumb, index, middle, ring, pinky]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerState {
    pub extended: [bool; 5],
    /// The flags as a `'0'/'1'` string, always 5 characters.
    pub pattern: String,
}

impl FingerState {
    pub fn from_flags(extended: [bool; 5]) -> Self {
        let pattern = extended
            .iter()
            .map(|&up| if up { '1' } else { '0' })
            .collect();
        Self { extended, pattern }
    }

    /// Number of extended fingers.
    pub fn count(&self) -> usize {
        self.extended.iter().filter(|&&up| up).count()
    }
}

/// Angle of the index-base minus pinky-base vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    /// Degrees in `(-180, 180]`.
    pub angle_degrees: f64,
    pub direction: Direction,
}

impl Orientation {
    pub fn from_angle(angle_degrees: f64) -> Self {
        Self {
            angle_degrees,
            direction: Direction::from_angle(angle_degrees),
        }
    }
}

/// Everything derived from one hand in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HandSnapshot {
    pub landmarks: Landmarks,
    pub handedness: Handedness,
    /// Midpoint of the wrist and the middle-finger base.
    pub center: Point2,
    pub bounding_box: BoundingBox,
    /// Planar wrist to middle-finger-base distance; 1.0 when degenerate.
    pub palm_scale: f64,
    pub finger_state: FingerState,
    pub orientation: Orientation,
}

impl HandSnapshot {
    pub fn extract(landmarks: &Landmarks, handedness: Handedness) -> Self {
        let wrist = landmarks[index::WRIST];
        let middle_base = landmarks[index::MIDDLE_MCP];

        Self {
            landmarks: *landmarks,
            handedness,
            center: Point2::new((wrist.x + middle_base.x) / 2.0, (wrist.y + middle_base.y) / 2.0),
            bounding_box: bounding_box(landmarks),
            palm_scale: nonzero_scale(wrist.planar_distance(middle_base)),
            finger_state: finger_state(landmarks, handedness),
            orientation: orientation(landmarks),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.finger_state.pattern
    }

    /// Planar distance between thumb tip and index tip.
    pub fn thumb_index_distance(&self) -> f64 {
        self.landmarks[index::THUMB_TIP].planar_distance(self.landmarks[index::INDEX_TIP])
    }

    /// Fixed-length descriptor: 42 wrist-relative, palm-scaled x/y values,
    /// the 5 finger flags as 0/1, and the orientation angle divided by 180.
    pub fn feature_vector(&self) -> Vec<f64> {
        let wrist = self.landmarks[index::WRIST];
        let mut features = Vec::with_capacity(LANDMARK_COUNT * 2 + 6);
        for p in &self.landmarks {
            features.push((p.x - wrist.x) / self.palm_scale);
            features.push((p.y - wrist.y) / self.palm_scale);
        }
        features.extend(
            self.finger_state
                .extended
                .iter()
                .map(|&up| if up { 1.0 } else { 0.0 }),
        );
        features.push(self.orientation.angle_degrees / 180.0);
        features
    }
}

fn nonzero_scale(scale: f64) -> f64 {
    if scale == 0.0 || !scale.is_finite() {
        1.0
    } else {
        scale
    }
}

pub fn bounding_box(landmarks: &Landmarks) -> BoundingBox {
    let mut bb = BoundingBox {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };
    for p in landmarks {
        bb.min_x = bb.min_x.min(p.x);
        bb.min_y = bb.min_y.min(p.y);
        bb.max_x = bb.max_x.max(p.x);
        bb.max_y = bb.max_y.max(p.y);
    }
    bb
}

pub fn finger_state(landmarks: &Landmarks, handedness: Handedness) -> FingerState {
    let thumb_tip = landmarks[index::THUMB_TIP].x;
    let thumb_ip = landmarks[index::THUMB_IP].x;
    let thumb = match handedness {
        Handedness::Left => thumb_tip < thumb_ip,
        Handedness::Right | Handedness::Unknown => thumb_tip > thumb_ip,
    };

    let finger = |pip: usize, tip: usize| landmarks[tip].y < landmarks[pip].y;

    FingerState::from_flags([
        thumb,
        finger(index::INDEX_PIP, index::INDEX_TIP),
        finger(index::MIDDLE_PIP, index::MIDDLE_TIP),
        finger(index::RING_PIP, index::RING_TIP),
        finger(index::PINKY_PIP, index::PINKY_TIP),
    ])
}

pub fn orientation(landmarks: &Landmarks) -> Orientation {
    let v = landmarks[index::INDEX_MCP].sub(landmarks[index::PINKY_MCP]);
    Orientation::from_angle(v.y.atan2(v.x).to_degrees())
}

/// Translate so the wrist is the origin, then divide by the 3-D wrist to
/// middle-finger-base distance (1.0 when that distance is zero).
pub fn normalize_landmarks(points: &[Point3]) -> Vec<Point3> {
    let Some(&wrist) = points.first() else {
        return Vec::new();
    };
    let scale = points
        .get(index::MIDDLE_MCP)
        .map(|m| nonzero_scale(m.distance(wrist)))
        .unwrap_or(1.0);
    points
        .iter()
        .map(|p| p.sub(wrist).scale(1.0 / scale))
        .collect()
}

/// Cosine similarity of two flattened point sets. Zero when either set has
/// zero norm or the lengths differ.
pub fn cosine_similarity(a: &[Point3], b: &[Point3]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (p, q) in a.iter().zip(b) {
        dot += p.x * q.x + p.y * q.y + p.z * q.z;
        norm_a += p.x * p.x + p.y * p.y + p.z * p.z;
        norm_b += q.x * q.x + q.y * q.y + q.z * q.z;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        0.0
    } else {
        dot / denom
    }
}

/// Absolute difference between two angles in degrees, wrapped into `[0, 180]`.
pub fn angle_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}
