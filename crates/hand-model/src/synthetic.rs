//! Synthetic hand poses for tests and the `synth` command.
//!
//! The generated hand is upright, palm facing the camera, with the wrist
//! 40 px below and the middle-finger base 40 px above the requested center,
//! so its center is exactly the requested point and its palm scale is 80.

use handctl_common::clock::TimestampNs;

use crate::gesture::{Direction, GestureSymbol, ShapeGesture};
use crate::landmark::{index, FrameInput, Handedness, LandmarkFrame, Landmarks, Point3, LANDMARK_COUNT};

/// Distance between wrist and middle-finger base of a synthetic hand.
pub const SYNTHETIC_PALM_SCALE: f64 = 80.0;

/// A pattern no static rule uses and that forms neither a pinch nor an OK
/// sign unless a thumb gap is set. Handy for motion tests.
pub const NEUTRAL_PATTERN: &str = "00110";

/// Column x offsets (right hand) of index, middle, ring and pinky.
const FINGER_COLUMNS: [f64; 4] = [20.0, 0.0, -18.0, -34.0];

/// Builder for one synthetic landmark set.
#[derive(Debug, Clone)]
pub struct SyntheticHand {
    center: (f64, f64),
    extended: [bool; 5],
    handedness: Handedness,
    orientation: Option<Direction>,
    thumb_index_gap: Option<f64>,
}

impl SyntheticHand {
    /// An open hand centered at `center`.
    pub fn new(center: (f64, f64)) -> Self {
        Self {
            center,
            extended: [true; 5],
            handedness: Handedness::Right,
            orientation: None,
            thumb_index_gap: None,
        }
    }

    /// Finger pattern `[thumb, index, middle, ring, pinky]`, e.g. `"01000"`.
    /// Characters other than `'1'` are treated as folded.
    pub fn pattern(mut self, pattern: &str) -> Self {
        let mut extended = [false; 5];
        for (slot, c) in extended.iter_mut().zip(pattern.chars()) {
            *slot = c == '1';
        }
        self.extended = extended;
        self
    }

    pub fn handedness(mut self, handedness: Handedness) -> Self {
        self.handedness = handedness;
        self
    }

    /// Rotate the index-base/pinky-base axis to point in `direction`.
    pub fn orientation(mut self, direction: Direction) -> Self {
        self.orientation = Some(direction);
        self
    }

    /// Put the thumb tip exactly `gap` px from the index tip. This overrides
    /// the thumb bit of the pattern (the thumb reads as folded).
    pub fn thumb_index_gap(mut self, gap: Option<f64>) -> Self {
        self.thumb_index_gap = gap;
        self
    }

    /// Thumb and index tips 5 px apart.
    pub fn pinching(self) -> Self {
        self.thumb_index_gap(Some(5.0))
    }

    pub fn center(mut self, center: (f64, f64)) -> Self {
        self.center = center;
        self
    }

    pub fn build(&self) -> Landmarks {
        let (cx, cy) = self.center;
        // Mirror horizontally for left hands.
        let side = if self.handedness == Handedness::Left {
            -1.0
        } else {
            1.0
        };
        let at = |dx: f64, dy: f64| Point3::xy(cx + side * dx, cy + dy);

        let mut lm = [Point3::ORIGIN; LANDMARK_COUNT];
        lm[index::WRIST] = at(0.0, 40.0);

        lm[index::THUMB_CMC] = at(25.0, 25.0);
        lm[index::THUMB_MCP] = at(40.0, 10.0);
        lm[index::THUMB_IP] = at(50.0, -5.0);
        lm[index::THUMB_TIP] = if self.extended[0] {
            at(70.0, -15.0)
        } else {
            at(40.0, 5.0)
        };

        let anchor = -40.0;
        for (finger, dx) in FINGER_COLUMNS.iter().enumerate() {
            let base = index::INDEX_MCP + finger * 4;
            let extended = self.extended[finger + 1];
            lm[base] = at(*dx, anchor);
            lm[base + 1] = at(*dx, anchor - 20.0);
            if extended {
                lm[base + 2] = at(*dx, anchor - 40.0);
                lm[base + 3] = at(*dx, anchor - 60.0);
            } else {
                lm[base + 2] = at(*dx, anchor - 10.0);
                lm[base + 3] = at(*dx, anchor);
            }
        }

        if let Some(direction) = self.orientation {
            let (ux, uy) = direction.unit();
            let mid = at(-7.0, anchor);
            lm[index::INDEX_MCP] = Point3::xy(mid.x + 27.0 * ux, mid.y + 27.0 * uy);
            lm[index::PINKY_MCP] = Point3::xy(mid.x - 27.0 * ux, mid.y - 27.0 * uy);
        }

        if let Some(gap) = self.thumb_index_gap {
            let tip = lm[index::INDEX_TIP];
            lm[index::THUMB_TIP] = Point3::xy(tip.x + side * 0.6 * gap, tip.y + 0.8 * gap);
        }

        lm
    }

    pub fn frame(&self, confidence: f64) -> LandmarkFrame {
        LandmarkFrame::new(self.build(), self.handedness, confidence)
    }

    /// A single-hand [`FrameInput`] at `timestamp_ns`.
    pub fn input(&self, timestamp_ns: TimestampNs) -> FrameInput {
        FrameInput::new(timestamp_ns, vec![self.frame(1.0)])
    }
}

/// A pose the classifier reads as `symbol`, centered at `center`.
///
/// Swipes get the neutral pose; the motion is up to the caller. Custom
/// templates and `NONE` have no canonical pose.
pub fn posed(symbol: &GestureSymbol, center: (f64, f64)) -> Option<SyntheticHand> {
    let hand = SyntheticHand::new(center);
    match symbol {
        GestureSymbol::Static(gesture) => {
            let rule = gesture.rule();
            let hand = hand.pattern(rule.pattern);
            Some(match rule.discriminator {
                Some(direction) => hand.orientation(direction),
                None => hand,
            })
        }
        GestureSymbol::Shape(ShapeGesture::Pinch) => Some(hand.pattern(NEUTRAL_PATTERN).pinching()),
        GestureSymbol::Shape(ShapeGesture::OkSign) => {
            Some(hand.pattern("00111").thumb_index_gap(Some(35.0)))
        }
        GestureSymbol::Swipe(_) => Some(hand.pattern(NEUTRAL_PATTERN)),
        GestureSymbol::NoGesture | GestureSymbol::Custom(_) => None,
    }
}

/// `count` frames of `hand` held still, `interval_ns` apart from `start_ns`.
pub fn hold_sequence(
    hand: &SyntheticHand,
    start_ns: TimestampNs,
    interval_ns: u64,
    count: usize,
) -> Vec<FrameInput> {
    (0..count)
        .map(|i| hand.input(start_ns + i as u64 * interval_ns))
        .collect()
}

/// `count` frames of `hand` moving in `direction` at `speed` px/s.
pub fn swipe_sequence(
    hand: &SyntheticHand,
    direction: Direction,
    speed: f64,
    start_ns: TimestampNs,
    interval_ns: u64,
    count: usize,
) -> Vec<FrameInput> {
    let (ux, uy) = direction.unit();
    let (cx, cy) = hand.center;
    let step = speed * interval_ns as f64 / 1_000_000_000.0;
    (0..count)
        .map(|i| {
            let moved = hand
                .clone()
                .center((cx + ux * step * i as f64, cy + uy * step * i as f64));
            moved.input(start_ns + i as u64 * interval_ns)
        })
        .collect()
}
