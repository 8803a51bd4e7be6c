//! handctl Pipeline
//!
//! Drives recognition and dispatch for every tracked hand. One worker owns
//! all live state; everything else talks to it through a [`PipelineControl`]:
//!
//! - **Input:** a [`LandmarkSource`] polled once per loop iteration
//! - **Output:** [`ActuatorCommand`](handctl_actuator_core::ActuatorCommand)s
//!   through the [`ActionDispatcher`]
//! - **Observation:** typed events on a broadcast channel, throttled status
//!   snapshots on a watch channel
//!
//! [`Pipeline::tick`] processes exactly one frame and is what tests drive;
//! [`Pipeline::run`] wraps it in the cooperative async loop.

pub mod control;
pub mod dispatcher;
pub mod source;
pub mod writer;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use handctl_actuator_core::Actuator;
use handctl_common::clock::{FpsMeter, RateController, TimestampNs};
use handctl_common::config::{AppConfig, RepeatPolicy};
use handctl_common::error::HandctlResult;
use handctl_hand_model::event::{EventKind, HandStatus, PipelineEvent, PipelineStatus};
use handctl_hand_model::landmark::{FrameInput, HandId};
use handctl_hand_model::mapping::{Action, MappingSnapshot};
use handctl_recognition_core::track::HandTrack;

pub use control::PipelineControl;
pub use dispatcher::{ActionDispatcher, DragState};
pub use source::{ChannelSource, DetectionSender, JsonlReplaySource, LandmarkSource};
pub use writer::FrameWriter;

use control::WorkerChannels;

const IDLE_POLL: std::time::Duration = std::time::Duration::from_millis(1);
const PAUSED_POLL: std::time::Duration = std::time::Duration::from_millis(100);

/// The recognition-and-dispatch worker.
pub struct Pipeline {
    config: Arc<AppConfig>,
    mapping: Arc<MappingSnapshot>,
    tracks: BTreeMap<HandId, HandTrack>,
    dispatcher: ActionDispatcher,
    control: PipelineControl,
    channels: WorkerChannels,
    status_rate: RateController,
    fps: FpsMeter,
    frames_processed: u64,
    last_timestamp_ns: TimestampNs,
    active: bool,
    paused: bool,
}

impl Pipeline {
    pub fn new(config: AppConfig, mapping: MappingSnapshot, actuator: Box<dyn Actuator>) -> Self {
        let config = Arc::new(config);
        let mapping = Arc::new(mapping);
        let (control, channels) = PipelineControl::new(config.clone(), mapping.clone());

        Self {
            dispatcher: ActionDispatcher::new(actuator, &config),
            status_rate: RateController::new(config.dispatch.status_rate_hz),
            config,
            mapping,
            tracks: BTreeMap::new(),
            control,
            channels,
            fps: FpsMeter::new(),
            frames_processed: 0,
            last_timestamp_ns: 0,
            active: false,
            paused: false,
        }
    }

    /// A handle for other tasks or threads.
    pub fn control(&self) -> PipelineControl {
        self.control.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn mapping(&self) -> &MappingSnapshot {
        &self.mapping
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn tracked_hands(&self) -> Vec<HandId> {
        self.tracks.keys().copied().collect()
    }

    /// Process one frame. Returns every event it produced, in order.
    ///
    /// Pending config and mapping snapshots are applied first. While paused
    /// the frame is ignored.
    pub fn tick(&mut self, frame: &FrameInput) -> Vec<PipelineEvent> {
        let now = frame.timestamp_ns;
        self.last_timestamp_ns = now;

        let mut out = Vec::new();
        self.apply_updates(now, &mut out);
        if self.sync_pause(now, &mut out) {
            return out;
        }

        self.frames_processed += 1;
        self.fps.record(now);

        let mut kinds = Vec::new();
        let mut seen = BTreeSet::new();
        let mut hands_changed = false;

        for (id, hand) in frame.identified_hands() {
            seen.insert(id);
            let recognition = &self.config.recognition;
            let track = self.tracks.entry(id).or_insert_with(|| {
                tracing::debug!(hand = %id, "Hand tracked");
                hands_changed = true;
                HandTrack::new(recognition)
            });
            let update = track.observe(&hand.landmarks, hand.handedness, now, &self.mapping.templates);

            if update.stabilizer.changed {
                tracing::trace!(hand = %id, symbol = %update.raw, "Gesture changed");
                kinds.push(EventKind::GestureChanged {
                    hand: id,
                    symbol: update.raw.clone(),
                });
            }

            let Some(confirmation) = update.stabilizer.confirmed else {
                continue;
            };
            let Some(action_id) = self.mapping.mapping.resolve(&confirmation.symbol) else {
                continue;
            };
            if !confirmation.first
                && self.config.dispatch.policy_for(&action_id) == RepeatPolicy::OncePerHold
            {
                continue;
            }

            if confirmation.first {
                tracing::debug!(
                    hand = %id,
                    symbol = %confirmation.symbol,
                    action = %action_id,
                    "Gesture confirmed"
                );
            }
            let action = Action::parse(&action_id);
            kinds.push(EventKind::GestureConfirmed {
                hand: id,
                symbol: confirmation.symbol,
                action: action_id,
            });
            kinds.extend(
                self.dispatcher
                    .dispatch(id, &action, update.snapshot.center),
            );
        }

        let lost: Vec<HandId> = self
            .tracks
            .keys()
            .filter(|id| !seen.contains(*id))
            .copied()
            .collect();
        for id in lost {
            self.tracks.remove(&id);
            hands_changed = true;
            tracing::debug!(hand = %id, "Hand lost");
            kinds.push(EventKind::HandLost { hand: id });
            kinds.extend(self.dispatcher.hand_lost(id));
        }

        if frame.hands.is_empty() {
            kinds.extend(self.dispatcher.force_drag_end());
            self.dispatcher.reset_cursor();
        }

        for kind in kinds {
            self.emit(now, kind, &mut out);
        }
        self.publish_status(now, hands_changed);
        out
    }

    /// Poll `source` until it is exhausted or stop is requested, then shut
    /// down. Returns the number of frames processed.
    pub async fn run(&mut self, source: &mut dyn LandmarkSource) -> HandctlResult<u64> {
        tracing::info!(
            source = %source.name(),
            actuator = %self.dispatcher.actuator_name(),
            "Pipeline started"
        );
        self.active = true;
        self.publish_status(self.last_timestamp_ns, true);

        while !self.control.is_stopped() {
            if self.control.is_paused() {
                let mut out = Vec::new();
                let now = self.last_timestamp_ns;
                self.apply_updates(now, &mut out);
                self.sync_pause(now, &mut out);
                tokio::time::sleep(PAUSED_POLL).await;
                continue;
            }

            if source.is_exhausted() {
                tracing::info!(source = %source.name(), "Landmark source exhausted");
                break;
            }

            match source.poll() {
                Ok(Some(frame)) => {
                    self.tick(&frame);
                }
                Ok(None) => {
                    tokio::time::sleep(IDLE_POLL).await;
                }
                Err(e) => {
                    tracing::warn!(source = %source.name(), error = %e, "Landmark source error");
                    tokio::time::sleep(IDLE_POLL).await;
                }
            }
        }

        source.release();
        self.shutdown();
        tracing::info!(
            frames = self.frames_processed,
            failures = self.dispatcher.failures(),
            "Pipeline stopped"
        );
        Ok(self.frames_processed)
    }

    /// End any drag, forget all hands and publish the final status.
    pub fn shutdown(&mut self) -> Vec<PipelineEvent> {
        let now = self.last_timestamp_ns;
        let mut out = Vec::new();

        let kinds = self.dispatcher.force_drag_end();
        for kind in kinds {
            self.emit(now, kind, &mut out);
        }
        self.tracks.clear();
        self.dispatcher.reset_cursor();
        self.active = false;
        self.emit(now, EventKind::Stopped, &mut out);
        self.publish_status(now, true);
        out
    }

    fn apply_updates(&mut self, now: TimestampNs, out: &mut Vec<PipelineEvent>) {
        if self.channels.config_rx.has_changed().unwrap_or(false) {
            let config = self.channels.config_rx.borrow_and_update().clone();
            for track in self.tracks.values_mut() {
                track.apply_config(&config.recognition);
            }
            self.dispatcher.apply_config(&config);
            self.status_rate = RateController::new(config.dispatch.status_rate_hz);
            self.config = config;
            tracing::info!("Configuration reloaded");
            self.emit(now, EventKind::ConfigReloaded, out);
        }

        if self.channels.mapping_rx.has_changed().unwrap_or(false) {
            self.mapping = self.channels.mapping_rx.borrow_and_update().clone();
            tracing::info!(
                overrides = self.mapping.mapping.overrides().len(),
                templates = self.mapping.templates.len(),
                "Mapping reloaded"
            );
            self.emit(now, EventKind::MappingReloaded, out);
        }
    }

    /// Track the pause flag; returns whether the pipeline is paused.
    fn sync_pause(&mut self, now: TimestampNs, out: &mut Vec<PipelineEvent>) -> bool {
        let paused = self.control.is_paused();
        if paused == self.paused {
            return paused;
        }
        self.paused = paused;

        if paused {
            for kind in self.dispatcher.force_drag_end() {
                self.emit(now, kind, out);
            }
            self.tracks.clear();
            self.dispatcher.reset_cursor();
            tracing::info!("Pipeline paused");
            self.emit(now, EventKind::Paused, out);
        } else {
            tracing::info!("Pipeline resumed");
            self.emit(now, EventKind::Resumed, out);
        }
        self.publish_status(now, true);
        paused
    }

    fn emit(&mut self, now: TimestampNs, kind: EventKind, out: &mut Vec<PipelineEvent>) {
        let event = PipelineEvent::new(now, kind);
        self.control.publish(event.clone());
        out.push(event);
    }

    fn publish_status(&mut self, now: TimestampNs, force: bool) {
        if !self.status_rate.should_tick(now) && !force {
            return;
        }
        let status = PipelineStatus {
            active: self.active,
            paused: self.paused,
            dragging: self.dispatcher.is_dragging(),
            frames_processed: self.frames_processed,
            fps: self.fps.fps(),
            hands: self
                .tracks
                .iter()
                .map(|(id, track)| HandStatus {
                    id: *id,
                    symbol: track.current().clone(),
                    phase: track.phase(),
                    confidence: track.confidence(),
                    dynamics: track.dynamics(),
                })
                .collect(),
        };
        self.channels.status_tx.send_replace(status);
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("tracks", &self.tracks.len())
            .field("dispatcher", &self.dispatcher)
            .field("frames_processed", &self.frames_processed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handctl_actuator_core::RecordingActuator;
    use handctl_hand_model::gesture::{GestureSymbol, StaticGesture};
    use handctl_hand_model::landmark::Handedness;
    use handctl_hand_model::synthetic::SyntheticHand;

    fn pipeline() -> (Pipeline, RecordingActuator) {
        let recorder = RecordingActuator::new();
        let pipeline = Pipeline::new(
            AppConfig::default(),
            MappingSnapshot::default(),
            Box::new(recorder.clone()),
        );
        (pipeline, recorder)
    }

    #[test]
    fn test_first_frame_reports_change_only() {
        let (mut p, rec) = pipeline();
        let events = p.tick(&SyntheticHand::new((320.0, 240.0)).pattern("11000").input(0));
        assert_eq!(
            events.iter().map(|e| e.kind.clone()).collect::<Vec<_>>(),
            vec![EventKind::GestureChanged {
                hand: HandId::new(Handedness::Right, 0),
                symbol: GestureSymbol::Static(StaticGesture::LShape),
            }]
        );
        assert!(rec.commands().is_empty());
        assert_eq!(p.tracked_hands().len(), 1);
    }

    #[test]
    fn test_status_snapshot_lists_hands() {
        let (mut p, _) = pipeline();
        let control = p.control();
        p.tick(&SyntheticHand::new((320.0, 240.0)).input(0));
        let status = control.status();
        assert_eq!(status.frames_processed, 1);
        assert_eq!(status.hands.len(), 1);
        assert_eq!(
            status.hands[0].symbol,
            GestureSymbol::Static(StaticGesture::OpenHand)
        );
    }

    #[test]
    fn test_shutdown_emits_stopped_last() {
        let (mut p, _) = pipeline();
        let events = p.shutdown();
        assert_eq!(events.last().map(|e| e.kind.clone()), Some(EventKind::Stopped));
        assert!(!p.control().status().active);
    }
}
