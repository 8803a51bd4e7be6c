//! Events and status snapshots published by the pipeline.
//!
//! Events are serializable so they can be streamed as JSONL by the CLI or
//! forwarded to any subscriber over a broadcast channel.

use handctl_common::clock::TimestampNs;
use serde::{Deserialize, Serialize};

use crate::gesture::{GestureSymbol, HoldPhase};
use crate::landmark::HandId;

/// A single pipeline event with the frame timestamp it was produced at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineEvent {
    /// Frame timestamp, monotonic nanoseconds.
    #[serde(rename = "t")]
    pub timestamp_ns: TimestampNs,

    /// The event payload.
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Discriminated union of event types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// The raw classification for a hand changed; the hold timer restarted.
    GestureChanged { hand: HandId, symbol: GestureSymbol },

    /// A held symbol resolved to an action and was dispatched.
    GestureConfirmed {
        hand: HandId,
        symbol: GestureSymbol,
        action: String,
    },

    /// An actuator reported failure. The loop carried on.
    ActionFailed { action: String, message: String },

    DragStarted { hand: HandId },

    /// `forced` is set when the drag was ended by hand loss or shutdown.
    DragEnded { forced: bool },

    HandLost { hand: HandId },

    Paused,
    Resumed,
    Stopped,
    ConfigReloaded,
    MappingReloaded,
}

impl PipelineEvent {
    pub fn new(timestamp_ns: TimestampNs, kind: EventKind) -> Self {
        Self { timestamp_ns, kind }
    }

    /// The hand this event concerns, if any.
    pub fn hand(&self) -> Option<HandId> {
        match &self.kind {
            EventKind::GestureChanged { hand, .. }
            | EventKind::GestureConfirmed { hand, .. }
            | EventKind::DragStarted { hand }
            | EventKind::HandLost { hand } => Some(*hand),
            _ => None,
        }
    }

    /// Timestamp as fractional seconds.
    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp_ns as f64 / 1_000_000_000.0
    }
}

/// Instantaneous motion measures of a tracked hand. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandDynamics {
    /// Speed between the last two samples, px/s.
    pub velocity: f64,
    /// Change of velocity over the last three samples, px/s².
    pub acceleration: f64,
    /// Orientation change between the last two samples, degrees/s.
    pub rotation: f64,
    /// `1 / (1 + variance / 100)` of the last five positions; 1.0 is still.
    pub stability: f64,
}

impl Default for HandDynamics {
    fn default() -> Self {
        Self {
            velocity: 0.0,
            acceleration: 0.0,
            rotation: 0.0,
            stability: 1.0,
        }
    }
}

/// Per-hand part of a [`PipelineStatus`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandStatus {
    pub id: HandId,
    pub symbol: GestureSymbol,
    pub phase: HoldPhase,
    /// Majority-vote confidence from the confidence buffer.
    pub confidence: f64,
    #[serde(default)]
    pub dynamics: HandDynamics,
}

/// Complete, self-consistent view of the pipeline for status readers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineStatus {
    /// Whether the worker loop is running.
    pub active: bool,
    pub paused: bool,
    pub dragging: bool,
    pub frames_processed: u64,
    pub fps: f64,
    pub hands: Vec<HandStatus>,
}
