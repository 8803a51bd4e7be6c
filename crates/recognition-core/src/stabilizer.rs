//! Hold-time debounce and majority-vote confidence.
//!
//! ```text
//!            new symbol                 held >= hold time
//!   IDLE ─────────────────▶ PENDING ─────────────────────▶ CONFIRMED
//!     ▲                        │  ▲                            │
//!     │    NoGesture / reset   │  └──── different symbol ──────┘
//!     └────────────────────────┘
//! ```
//!
//! A confirmed hold yields a dispatch on every frame it stays confirmed.
//! Whether the caller forwards every one of those is its repeat policy; the
//! stabilizer marks the first one so a once-per-hold policy can be applied.

use std::collections::VecDeque;

use handctl_common::clock::TimestampNs;
use handctl_common::config::RecognitionConfig;
use handctl_hand_model::gesture::{GestureSymbol, HoldPhase};

/// Fixed-length FIFO of raw per-frame classifications.
#[derive(Debug, Clone)]
pub struct ConfidenceBuffer {
    capacity: usize,
    entries: VecDeque<GestureSymbol>,
}

impl ConfidenceBuffer {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, symbol: GestureSymbol) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(symbol);
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Most frequent entry and its count. Ties go to the entry seen first.
    pub fn dominant(&self) -> Option<(&GestureSymbol, usize)> {
        let mut best: Option<(&GestureSymbol, usize)> = None;
        for candidate in &self.entries {
            let count = self.entries.iter().filter(|e| *e == candidate).count();
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((candidate, count));
            }
        }
        best
    }

    /// Share of the dominant entry once the buffer is full, else 0.
    pub fn confidence(&self) -> f64 {
        if !self.is_full() {
            return 0.0;
        }
        self.dominant()
            .map(|(_, count)| count as f64 / self.entries.len() as f64)
            .unwrap_or(0.0)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Debounce timing and the optional confidence gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilizerParams {
    pub hold_time_ns: u64,
    pub confidence_buffer_size: usize,
    /// Suppress confirmed dispatches below this confidence.
    pub confidence_gate: Option<f64>,
}

impl Default for StabilizerParams {
    fn default() -> Self {
        Self::from_config(&RecognitionConfig::default())
    }
}

impl StabilizerParams {
    pub fn from_config(config: &RecognitionConfig) -> Self {
        Self {
            hold_time_ns: (config.hold_time_secs.max(0.0) * 1_000_000_000.0).round() as u64,
            confidence_buffer_size: config.confidence_buffer_size,
            confidence_gate: config.confidence_gate,
        }
    }
}

/// A symbol that has been held long enough to act on.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub symbol: GestureSymbol,
    /// True on the frame the hold first became confirmed.
    pub first: bool,
}

/// Result of feeding one frame's classification.
#[derive(Debug, Clone, PartialEq)]
pub struct StabilizerUpdate {
    pub phase: HoldPhase,
    /// The held symbol changed this frame (the hold timer restarted).
    pub changed: bool,
    /// Set when this frame should dispatch.
    pub confirmed: Option<Confirmation>,
    pub confidence: f64,
}

/// Per-hand debounce state.
#[derive(Debug, Clone)]
pub struct GestureStabilizer {
    params: StabilizerParams,
    current: GestureSymbol,
    symbol_start_ns: TimestampNs,
    phase: HoldPhase,
    buffer: ConfidenceBuffer,
}

impl GestureStabilizer {
    pub fn new(params: StabilizerParams) -> Self {
        Self {
            params,
            current: GestureSymbol::NoGesture,
            symbol_start_ns: 0,
            phase: HoldPhase::Idle,
            buffer: ConfidenceBuffer::new(params.confidence_buffer_size),
        }
    }

    pub fn set_params(&mut self, params: StabilizerParams) {
        self.buffer.set_capacity(params.confidence_buffer_size);
        self.params = params;
    }

    pub fn current(&self) -> &GestureSymbol {
        &self.current
    }

    pub fn phase(&self) -> HoldPhase {
        self.phase
    }

    pub fn confidence(&self) -> f64 {
        self.buffer.confidence()
    }

    /// Feed the raw classification for the frame at `now_ns`.
    pub fn update(&mut self, symbol: GestureSymbol, now_ns: TimestampNs) -> StabilizerUpdate {
        self.buffer.push(symbol.clone());
        let confidence = self.buffer.confidence();

        if symbol != self.current {
            self.phase = if symbol.is_none() {
                HoldPhase::Idle
            } else {
                HoldPhase::Pending
            };
            self.current = symbol;
            self.symbol_start_ns = now_ns;
            return StabilizerUpdate {
                phase: self.phase,
                changed: true,
                confirmed: None,
                confidence,
            };
        }

        if self.current.is_none() {
            return StabilizerUpdate {
                phase: HoldPhase::Idle,
                changed: false,
                confirmed: None,
                confidence,
            };
        }

        let held_ns = now_ns.saturating_sub(self.symbol_start_ns);
        if held_ns < self.params.hold_time_ns {
            return StabilizerUpdate {
                phase: self.phase,
                changed: false,
                confirmed: None,
                confidence,
            };
        }

        let first = self.phase != HoldPhase::Confirmed;
        self.phase = HoldPhase::Confirmed;

        let gated = self
            .params
            .confidence_gate
            .is_some_and(|gate| confidence < gate);

        StabilizerUpdate {
            phase: self.phase,
            changed: false,
            confirmed: (!gated).then(|| Confirmation {
                symbol: self.current.clone(),
                first,
            }),
            confidence,
        }
    }

    /// Forget everything; used when the hand disappears.
    pub fn reset(&mut self) {
        self.current = GestureSymbol::NoGesture;
        self.symbol_start_ns = 0;
        self.phase = HoldPhase::Idle;
        self.buffer.clear();
    }
}
