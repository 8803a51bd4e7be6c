use std::time::Duration;

use handctl_actuator_core::{ActuatorCommand, MouseButton, RecordingActuator};
use handctl_common::clock::PipelineClock;
use handctl_common::config::{AppConfig, RepeatPolicy};
use handctl_hand_model::event::{EventKind, PipelineEvent};
use handctl_hand_model::gesture::{Direction, GestureSymbol, HoldPhase};
use handctl_hand_model::landmark::{FrameInput, HandId, Handedness};
use handctl_hand_model::mapping::{Action, GestureMapping, MappingSnapshot};
use handctl_hand_model::synthetic::{hold_sequence, swipe_sequence, SyntheticHand, NEUTRAL_PATTERN};
use handctl_pipeline::{ActionDispatcher, ChannelSource, JsonlReplaySource, Pipeline};
use handctl_recognition_core::features::Point2;
use proptest::prelude::*;

const MS: u64 = 1_000_000;
const FRAME: u64 = 33_333_333;

fn unsmoothed() -> AppConfig {
    let mut config = AppConfig::default();
    config.recognition.landmark_smoothing_enabled = false;
    config
}

fn pipeline_with(config: AppConfig, mapping: MappingSnapshot) -> (Pipeline, RecordingActuator) {
    let recorder = RecordingActuator::new();
    let pipeline = Pipeline::new(config, mapping, Box::new(recorder.clone()));
    (pipeline, recorder)
}

fn pipeline() -> (Pipeline, RecordingActuator) {
    pipeline_with(unsmoothed(), MappingSnapshot::default())
}

fn l_shape() -> SyntheticHand {
    SyntheticHand::new((320.0, 240.0)).pattern("11000")
}

fn fist() -> SyntheticHand {
    SyntheticHand::new((320.0, 240.0)).pattern("00000")
}

fn open_hand() -> SyntheticHand {
    SyntheticHand::new((320.0, 240.0))
}

fn kinds(events: &[PipelineEvent]) -> Vec<EventKind> {
    events.iter().map(|e| e.kind.clone()).collect()
}

#[test]
fn short_hold_does_not_dispatch_but_long_hold_repeats() {
    let (mut p, rec) = pipeline();
    let hand = l_shape();

    p.tick(&hand.input(0));
    p.tick(&hand.input(100 * MS));
    assert_eq!(rec.count("click"), 0);

    p.tick(&hand.input(350 * MS));
    assert_eq!(rec.count("click"), 1);

    p.tick(&hand.input(383 * MS));
    p.tick(&hand.input(416 * MS));
    assert_eq!(rec.count("click"), 3);
    assert_eq!(
        rec.commands()[0],
        ActuatorCommand::Click {
            button: MouseButton::Left
        }
    );
}

#[test]
fn once_per_hold_policy_fires_once() {
    let mut config = unsmoothed();
    config
        .dispatch
        .repeat_policy
        .insert("left_click".to_string(), RepeatPolicy::OncePerHold);
    let (mut p, rec) = pipeline_with(config, MappingSnapshot::default());

    for frame in hold_sequence(&l_shape(), 0, FRAME, 20) {
        p.tick(&frame);
    }
    assert_eq!(rec.count("click"), 1);
}

#[test]
fn repeated_drag_gestures_reach_actuator_once_each() {
    let (mut p, rec) = pipeline();

    let mut t = 0;
    for _ in 0..15 {
        p.tick(&fist().input(t));
        t += FRAME;
    }
    for _ in 0..15 {
        p.tick(&open_hand().input(t));
        t += FRAME;
    }

    assert_eq!(rec.count("drag_start"), 1);
    assert_eq!(rec.count("drag_end"), 1);
    assert!(!p.dispatcher().is_dragging());
}

#[test]
fn losing_the_hand_mid_drag_forces_one_drag_end() {
    let (mut p, rec) = pipeline();

    let frames = hold_sequence(&fist(), 0, FRAME, 12);
    for frame in &frames {
        p.tick(frame);
    }
    assert!(p.dispatcher().is_dragging());

    let t = frames.last().map(|f| f.timestamp_ns).unwrap_or(0);
    let events = p.tick(&FrameInput::empty(t + FRAME));
    assert_eq!(
        kinds(&events),
        vec![
            EventKind::HandLost {
                hand: HandId::new(Handedness::Right, 0)
            },
            EventKind::DragEnded { forced: true },
        ]
    );

    p.tick(&FrameInput::empty(t + 2 * FRAME));
    p.tick(&FrameInput::empty(t + 3 * FRAME));
    assert_eq!(rec.count("drag_end"), 1);
}

#[test]
fn failing_actuator_does_not_stop_the_loop() {
    let (mut p, rec) = pipeline();
    rec.fail_on("click");

    let mut failures = 0;
    for frame in hold_sequence(&l_shape(), 0, FRAME, 15) {
        failures += p
            .tick(&frame)
            .iter()
            .filter(|e| matches!(e.kind, EventKind::ActionFailed { .. }))
            .count();
    }
    // Confirmed from frame 10 onward.
    assert_eq!(failures, 5);
    assert_eq!(p.frames_processed(), 15);
    assert_eq!(p.dispatcher().failures(), 5);

    rec.clear_failures();
    p.tick(&l_shape().input(15 * FRAME));
    assert_eq!(p.dispatcher().failures(), 5);
}

#[test]
fn config_and_mapping_reload_between_frames() {
    let (mut p, rec) = pipeline();
    let control = p.control();

    let mut config = unsmoothed();
    config.recognition.hold_time_secs = 1.0;
    control.update_config(config).unwrap();

    let frames = hold_sequence(&l_shape(), 0, FRAME, 15);
    let first = p.tick(&frames[0]);
    assert_eq!(first[0].kind, EventKind::ConfigReloaded);
    for frame in &frames[1..] {
        p.tick(frame);
    }
    assert_eq!(rec.count("click"), 0);

    control.update_mapping(MappingSnapshot::new(
        GestureMapping::default().with_override("L_SHAPE", "screenshot"),
        Default::default(),
    ));
    let mut reloaded = false;
    for frame in hold_sequence(&l_shape(), 15 * FRAME, FRAME, 25) {
        reloaded |= p
            .tick(&frame)
            .iter()
            .any(|e| e.kind == EventKind::MappingReloaded);
    }
    assert!(reloaded);
    assert!(rec.count("screenshot") > 0);
    assert_eq!(rec.count("click"), 0);
}

#[test]
fn invalid_config_update_is_rejected() {
    let (p, _) = pipeline();
    let mut config = AppConfig::default();
    config.recognition.motion_window_capacity = 1;
    assert!(p.control().update_config(config).is_err());
}

#[test]
fn sustained_swipe_dispatches_navigation() {
    let (mut p, rec) = pipeline();
    let hand = SyntheticHand::new((100.0, 240.0)).pattern(NEUTRAL_PATTERN);

    let mut confirmed = Vec::new();
    for frame in swipe_sequence(&hand, Direction::Right, 900.0, 0, FRAME, 24) {
        for event in p.tick(&frame) {
            if let EventKind::GestureConfirmed { symbol, .. } = event.kind {
                confirmed.push(symbol);
            }
        }
    }

    // The window keeps sliding, so the swipe re-fires on consecutive frames.
    assert!(confirmed.len() > 1);
    assert!(confirmed
        .iter()
        .all(|s| *s == GestureSymbol::Swipe(Direction::Right)));
    assert!(rec
        .commands()
        .contains(&ActuatorCommand::combo("alt+right")));
}

#[test]
fn reacquired_hand_starts_with_empty_history() {
    let (mut p, rec) = pipeline();
    let control = p.control();
    let hand = SyntheticHand::new((100.0, 240.0)).pattern(NEUTRAL_PATTERN);

    for frame in swipe_sequence(&hand, Direction::Right, 900.0, 0, FRAME, 20) {
        p.tick(&frame);
    }
    assert!(rec.count("key_combo") > 0);
    rec.clear();

    p.tick(&FrameInput::empty(20 * FRAME));
    assert!(p.tracked_hands().is_empty());

    // Same speed and direction as before the gap.
    let resumed = hand.clone().center((100.0 + 30.0 * 21.0, 240.0));
    let frames = swipe_sequence(&resumed, Direction::Right, 900.0, 21 * FRAME, FRAME, 9);
    for (i, frame) in frames.iter().enumerate() {
        let events = p.tick(frame);
        if i == 0 {
            let status = control.status();
            assert_eq!(status.hands.len(), 1);
            assert_eq!(status.hands[0].symbol, GestureSymbol::NoGesture);
            assert_eq!(status.hands[0].phase, HoldPhase::Idle);
        }
        assert!(
            !kinds(&events)
                .iter()
                .any(|k| matches!(k, EventKind::GestureChanged { .. } | EventKind::GestureConfirmed { .. })),
            "frame {i} after reacquisition produced a gesture"
        );
    }
    assert!(rec.commands().is_empty());
}

#[test]
fn pause_ignores_frames_and_releases_drag() {
    let (mut p, rec) = pipeline();
    let control = p.control();

    for frame in hold_sequence(&fist(), 0, FRAME, 12) {
        p.tick(&frame);
    }
    assert!(p.dispatcher().is_dragging());

    control.pause();
    let events = p.tick(&fist().input(12 * FRAME));
    assert_eq!(
        kinds(&events),
        vec![EventKind::DragEnded { forced: true }, EventKind::Paused]
    );
    assert!(p.tick(&fist().input(13 * FRAME)).is_empty());
    assert_eq!(p.frames_processed(), 12);
    assert!(control.status().paused);

    control.resume();
    let events = p.tick(&fist().input(14 * FRAME));
    assert_eq!(events[0].kind, EventKind::Resumed);
    assert_eq!(p.frames_processed(), 13);
    assert_eq!(rec.count("drag_end"), 1);
}

#[test]
fn hands_are_tracked_independently() {
    let (mut p, rec) = pipeline();
    let right = fist();
    let left = SyntheticHand::new((200.0, 240.0))
        .pattern("01000")
        .handedness(Handedness::Left);

    for i in 0..12u64 {
        p.tick(&FrameInput::new(
            i * FRAME,
            vec![right.frame(1.0), left.frame(1.0)],
        ));
    }
    assert!(p.dispatcher().is_dragging());
    assert!(rec.count("move_absolute") > 0);

    // The pointing hand leaves; the drag owner is still present.
    let events = p.tick(&FrameInput::new(12 * FRAME, vec![right.frame(1.0)]));
    assert!(kinds(&events).contains(&EventKind::HandLost {
        hand: HandId::new(Handedness::Left, 0)
    }));
    assert!(p.dispatcher().is_dragging());

    p.tick(&FrameInput::new(13 * FRAME, vec![left.frame(1.0)]));
    assert!(!p.dispatcher().is_dragging());
    assert_eq!(rec.count("drag_end"), 1);
}

#[tokio::test]
async fn replay_runs_to_completion_and_stops_cleanly() {
    let (mut p, rec) = pipeline();
    let mut events = p.control().subscribe();

    let mut source = JsonlReplaySource::from_frames(hold_sequence(&fist(), 0, FRAME, 15));

    let processed = p.run(&mut source).await.unwrap();
    assert_eq!(processed, 15);
    // Shutdown released the drag that was still held.
    assert_eq!(rec.count("drag_start"), 1);
    assert_eq!(rec.count("drag_end"), 1);

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event.kind);
    }
    assert!(seen.contains(&EventKind::DragEnded { forced: true }));
    assert_eq!(seen.last(), Some(&EventKind::Stopped));
    assert!(!p.control().status().active);
}

#[tokio::test]
async fn channel_source_runs_until_stopped() {
    let (mut p, _) = pipeline();
    let control = p.control();
    let (mut source, sender) = ChannelSource::new(PipelineClock::start());

    let feeder = tokio::spawn(async move {
        for _ in 0..5 {
            sender.send(vec![open_hand().frame(1.0)]).unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        control.stop();
        sender
    });

    let processed = p.run(&mut source).await.unwrap();
    let _sender = feeder.await.unwrap();
    assert_eq!(processed, 5);
}

proptest! {
    #[test]
    fn drag_commands_always_alternate(starts in prop::collection::vec(any::<bool>(), 0..40)) {
        let rec = RecordingActuator::new();
        let mut dispatcher = ActionDispatcher::new(Box::new(rec.clone()), &AppConfig::default());
        let hand = HandId::new(Handedness::Right, 0);

        for start in starts {
            let action = if start { Action::DragStart } else { Action::DragEnd };
            dispatcher.dispatch(hand, &action, Point2::new(320.0, 240.0));
        }

        let drags: Vec<&'static str> = rec
            .commands()
            .iter()
            .map(|c| c.action_name())
            .filter(|n| *n == "drag_start" || *n == "drag_end")
            .collect();
        for (i, name) in drags.iter().enumerate() {
            let expected = if i % 2 == 0 { "drag_start" } else { "drag_end" };
            prop_assert_eq!(*name, expected);
        }
    }
}
