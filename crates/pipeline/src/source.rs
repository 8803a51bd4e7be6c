//! Landmark sources.
//!
//! The pose estimator lives outside this workspace. It reaches the pipeline
//! through a [`LandmarkSource`]:
//!
//! - **Channel:** live detections pushed from another task or thread
//! - **Replay:** a recorded JSONL stream, optionally paced in real time

use std::collections::VecDeque;
use std::path::Path;

use handctl_common::clock::{PipelineClock, TimestampNs};
use handctl_common::error::{HandctlError, HandctlResult};
use handctl_hand_model::landmark::{parse_frames, parse_header, FrameInput, FrameStreamHeader, LandmarkFrame};
use tokio::sync::mpsc;

/// Trait for landmark providers.
pub trait LandmarkSource: Send {
    /// Poll for the next frame. Returns `None` if no frame is ready yet.
    fn poll(&mut self) -> HandctlResult<Option<FrameInput>>;

    /// Source name for logging.
    fn name(&self) -> &str;

    /// True once no further frames will ever be produced.
    fn is_exhausted(&self) -> bool;

    /// Let go of any upstream resource. Called once on shutdown.
    fn release(&mut self) {}
}

/// Detections for one processed image, as the estimator reports them.
pub type Detections = Vec<LandmarkFrame>;

/// Sending half handed to the estimator.
pub type DetectionSender = mpsc::UnboundedSender<Detections>;

/// Live frames pushed through a channel and stamped on arrival.
pub struct ChannelSource {
    receiver: mpsc::UnboundedReceiver<Detections>,
    clock: PipelineClock,
    exhausted: bool,
}

impl ChannelSource {
    /// Create the source and the sender an estimator pushes detections into.
    pub fn new(clock: PipelineClock) -> (Self, DetectionSender) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                receiver,
                clock,
                exhausted: false,
            },
            sender,
        )
    }

    pub fn clock(&self) -> &PipelineClock {
        &self.clock
    }
}

impl LandmarkSource for ChannelSource {
    fn poll(&mut self) -> HandctlResult<Option<FrameInput>> {
        match self.receiver.try_recv() {
            Ok(hands) => Ok(Some(FrameInput::new(self.clock.elapsed_ns(), hands))),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => {
                if !self.exhausted {
                    tracing::debug!("Detection sender dropped");
                }
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    fn name(&self) -> &str {
        "channel"
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn release(&mut self) {
        self.receiver.close();
        self.exhausted = true;
    }
}

/// Frames read back from a recording.
pub struct JsonlReplaySource {
    name: String,
    header: Option<FrameStreamHeader>,
    frames: VecDeque<FrameInput>,
    pacing: Option<Pacing>,
}

/// Real-time pacing state: frame `t` is released once `t - first_t` of wall
/// time has passed since the first poll.
struct Pacing {
    clock: Option<PipelineClock>,
    first_ns: Option<TimestampNs>,
}

impl JsonlReplaySource {
    /// Load a whole recording. A missing file or a malformed line is an error.
    pub fn open(path: &Path) -> HandctlResult<Self> {
        if !path.exists() {
            return Err(HandctlError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let mut source = Self::from_jsonl(&content)?;
        source.name = format!("replay({})", path.display());
        Ok(source)
    }

    pub fn from_jsonl(content: &str) -> HandctlResult<Self> {
        let frames = parse_frames(content)
            .map_err(|e| HandctlError::landmark_source(format!("Malformed frame record: {e}")))?;
        let mut source = Self::from_frames(frames);
        source.header = parse_header(content);
        Ok(source)
    }

    pub fn from_frames(frames: Vec<FrameInput>) -> Self {
        Self {
            name: "replay".to_string(),
            header: None,
            frames: frames.into(),
            pacing: None,
        }
    }

    /// Release frames at their recorded rate instead of as fast as polled.
    pub fn realtime(mut self, enabled: bool) -> Self {
        self.pacing = enabled.then_some(Pacing {
            clock: None,
            first_ns: None,
        });
        self
    }

    pub fn header(&self) -> Option<&FrameStreamHeader> {
        self.header.as_ref()
    }

    /// Frames not yet delivered.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl LandmarkSource for JsonlReplaySource {
    fn poll(&mut self) -> HandctlResult<Option<FrameInput>> {
        let Some(next) = self.frames.front() else {
            return Ok(None);
        };

        if let Some(pacing) = &mut self.pacing {
            let clock = pacing.clock.get_or_insert_with(PipelineClock::start);
            let first = *pacing.first_ns.get_or_insert(next.timestamp_ns);
            let due = next.timestamp_ns.saturating_sub(first);
            if clock.elapsed_ns() < due {
                return Ok(None);
            }
        }

        Ok(self.frames.pop_front())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_exhausted(&self) -> bool {
        self.frames.is_empty()
    }

    fn release(&mut self) {
        if !self.frames.is_empty() {
            tracing::debug!(skipped = self.frames.len(), "Replay released early");
        }
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handctl_hand_model::landmark::serialize_frames;
    use handctl_hand_model::synthetic::SyntheticHand;

    #[test]
    fn test_replay_yields_frames_in_order() {
        let hand = SyntheticHand::new((100.0, 100.0));
        let frames = vec![hand.input(0), FrameInput::empty(10), hand.input(20)];
        let content = format!(
            "# {}\n{}",
            serde_json::to_string(&FrameStreamHeader::new("2026-01-01T00:00:00Z", 640, 480)).unwrap(),
            serialize_frames(&frames).unwrap()
        );

        let mut source = JsonlReplaySource::from_jsonl(&content).unwrap();
        assert_eq!(source.header().map(|h| h.frame_width), Some(640));
        let mut seen = Vec::new();
        while let Some(frame) = source.poll().unwrap() {
            seen.push(frame.timestamp_ns);
        }
        assert_eq!(seen, vec![0, 10, 20]);
        assert!(source.is_exhausted());
    }

    #[test]
    fn test_malformed_line_is_source_error() {
        let result = JsonlReplaySource::from_jsonl("{\"t\": 0}\nnot json\n");
        assert!(matches!(result, Err(HandctlError::Source { .. })));
    }

    #[test]
    fn test_missing_recording() {
        let path = std::env::temp_dir().join("handctl_no_such_recording.jsonl");
        assert!(matches!(
            JsonlReplaySource::open(&path),
            Err(HandctlError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_realtime_replay_holds_future_frames() {
        let hand = SyntheticHand::new((100.0, 100.0));
        let frames = vec![hand.input(0), hand.input(60_000_000_000)];
        let mut source = JsonlReplaySource::from_frames(frames).realtime(true);
        assert!(source.poll().unwrap().is_some());
        assert!(source.poll().unwrap().is_none());
        assert!(!source.is_exhausted());
    }

    #[test]
    fn test_channel_source_stamps_and_ends() {
        let (mut source, sender) = ChannelSource::new(PipelineClock::start());
        assert!(source.poll().unwrap().is_none());

        sender
            .send(vec![SyntheticHand::new((0.0, 0.0)).frame(0.9)])
            .unwrap();
        let frame = source.poll().unwrap().unwrap();
        assert_eq!(frame.hands.len(), 1);

        drop(sender);
        assert!(source.poll().unwrap().is_none());
        assert!(source.is_exhausted());
    }
}
