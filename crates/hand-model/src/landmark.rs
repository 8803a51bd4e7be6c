//! Landmark frames as delivered by the external pose estimator.
//!
//! Each processed image yields zero or more hand detections; each detection
//! carries exactly 21 points in frame-pixel space, a handedness label and a
//! detection confidence. Recorded streams are stored as JSONL, one
//! [`FrameInput`] per line.

use std::fmt;

use handctl_common::clock::TimestampNs;
use serde::{Deserialize, Serialize};

/// Number of landmarks per detected hand.
pub const LANDMARK_COUNT: usize = 21;

/// Landmark indices used by feature extraction.
pub mod index {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

/// A 3-D landmark. Serialized as `[x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ORIGIN: Point3 = Point3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Planar point (`z = 0`).
    pub fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Euclidean norm over all three axes.
    pub fn norm(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Distance in the image plane, ignoring depth.
    pub fn planar_distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Distance over all three axes.
    pub fn distance(self, other: Self) -> f64 {
        self.sub(other).norm()
    }
}

impl From<[f64; 3]> for Point3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Point3> for [f64; 3] {
    fn from(p: Point3) -> Self {
        [p.x, p.y, p.z]
    }
}

/// One hand's full landmark set.
pub type Landmarks = [Point3; LANDMARK_COUNT];

/// Handedness label reported by the pose estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Handedness {
    Left,
    #[default]
    Right,
    Unknown,
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Handedness::Left => "left",
            Handedness::Right => "right",
            Handedness::Unknown => "unknown",
        })
    }
}

/// One detected hand in one frame. Consumed, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// The 21 landmarks in estimator order.
    pub landmarks: Landmarks,

    /// Handedness label.
    #[serde(default)]
    pub handedness: Handedness,

    /// Detection confidence in `[0.0, 1.0]`.
    #[serde(default = "full_confidence")]
    pub confidence: f64,
}

fn full_confidence() -> f64 {
    1.0
}

impl LandmarkFrame {
    pub fn new(landmarks: Landmarks, handedness: Handedness, confidence: f64) -> Self {
        Self {
            landmarks,
            handedness,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// All detections for one processed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    /// Monotonic nanoseconds since the pipeline clock epoch.
    #[serde(rename = "t")]
    pub timestamp_ns: TimestampNs,

    /// Zero or more detected hands.
    #[serde(default)]
    pub hands: Vec<LandmarkFrame>,
}

impl FrameInput {
    pub fn new(timestamp_ns: TimestampNs, hands: Vec<LandmarkFrame>) -> Self {
        Self {
            timestamp_ns,
            hands,
        }
    }

    /// A frame in which no hand was detected.
    pub fn empty(timestamp_ns: TimestampNs) -> Self {
        Self::new(timestamp_ns, Vec::new())
    }

    /// Timestamp as fractional seconds.
    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp_ns as f64 / 1_000_000_000.0
    }

    /// Pair each detection with its stable per-frame identity. Ordinals stop
    /// at 255, so detections past that share the last id.
    pub fn identified_hands(&self) -> Vec<(HandId, &LandmarkFrame)> {
        let mut seen: Vec<(Handedness, u8)> = Vec::new();
        self.hands
            .iter()
            .map(|hand| {
                let ordinal = match seen.iter_mut().find(|(h, _)| *h == hand.handedness) {
                    Some((_, count)) => {
                        *count = count.saturating_add(1);
                        *count
                    }
                    None => {
                        seen.push((hand.handedness, 0));
                        0
                    }
                };
                (
                    HandId {
                        handedness: hand.handedness,
                        ordinal,
                    },
                    hand,
                )
            })
            .collect()
    }
}

/// Identity of a tracked hand: the n-th detection carrying a given
/// handedness label within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandId {
    pub handedness: Handedness,
    pub ordinal: u8,
}

impl HandId {
    pub fn new(handedness: Handedness, ordinal: u8) -> Self {
        Self {
            handedness,
            ordinal,
        }
    }
}

impl fmt::Display for HandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.handedness, self.ordinal)
    }
}

/// Metadata written as the `#` header line of a frame recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameStreamHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Wall-clock time at the clock epoch (RFC 3339).
    pub epoch_wall: String,

    /// Frame dimensions in pixels.
    pub frame_width: u32,
    pub frame_height: u32,

    /// Nominal frame rate of the producer, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate_hz: Option<u32>,

    /// Where the frames came from (estimator name, `synth`, ...).
    #[serde(default)]
    pub source: String,
}

impl FrameStreamHeader {
    pub const SCHEMA_VERSION: &'static str = "1.0";

    pub fn new(epoch_wall: impl Into<String>, frame_width: u32, frame_height: u32) -> Self {
        Self {
            schema_version: Self::SCHEMA_VERSION.to_string(),
            epoch_wall: epoch_wall.into(),
            frame_width,
            frame_height,
            frame_rate_hz: None,
            source: String::new(),
        }
    }
}

/// Read the header from recorded JSONL content, if the first non-blank line
/// is a `#` header.
pub fn parse_header(jsonl: &str) -> Option<FrameStreamHeader> {
    let first = jsonl.lines().map(str::trim).find(|line| !line.is_empty())?;
    let body = first.strip_prefix('#')?;
    serde_json::from_str(body.trim()).ok()
}

/// Parse recorded frames from JSONL content (one JSON object per line).
/// Blank lines and `#` header lines are skipped.
pub fn parse_frames(jsonl: &str) -> Result<Vec<FrameInput>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize frames to JSONL format.
pub fn serialize_frames(frames: &[FrameInput]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for frame in frames {
        output.push_str(&serde_json::to_string(frame)?);
        output.push('\n');
    }
    Ok(output)
}
