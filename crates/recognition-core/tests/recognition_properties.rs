use std::collections::BTreeMap;

use handctl_hand_model::gesture::{Direction, GestureSymbol, ShapeGesture, StaticGesture};
use handctl_hand_model::landmark::{index, Handedness, Landmarks, Point3, LANDMARK_COUNT};
use handctl_hand_model::synthetic::{SyntheticHand, NEUTRAL_PATTERN};
use handctl_recognition_core::classifier::{match_static, ClassifierParams, GestureClassifier};
use handctl_recognition_core::features::{normalize_landmarks, FingerState, HandSnapshot, Point2};
use handctl_recognition_core::motion::{MotionSample, MotionWindow};
use handctl_recognition_core::smoothing::ema;
use proptest::prelude::*;

fn arb_point() -> impl Strategy<Value = Point3> {
    (-2000.0f64..2000.0, -2000.0f64..2000.0, -1.0f64..1.0).prop_map(|(x, y, z)| Point3::new(x, y, z))
}

fn arb_landmarks() -> impl Strategy<Value = Landmarks> {
    prop::collection::vec(arb_point(), LANDMARK_COUNT).prop_map(|points| {
        let mut lm = [Point3::ORIGIN; LANDMARK_COUNT];
        lm.copy_from_slice(&points);
        lm
    })
}

fn arb_handedness() -> impl Strategy<Value = Handedness> {
    prop_oneof![
        Just(Handedness::Left),
        Just(Handedness::Right),
        Just(Handedness::Unknown),
    ]
}

proptest! {
    #[test]
    fn prop_pattern_is_five_binary_chars(lm in arb_landmarks(), handedness in arb_handedness()) {
        let snap = HandSnapshot::extract(&lm, handedness);
        prop_assert_eq!(snap.pattern().len(), 5);
        prop_assert!(snap.pattern().chars().all(|c| c == '0' || c == '1'));
        prop_assert!(snap.palm_scale > 0.0);
    }

    #[test]
    fn prop_wrist_normalizes_to_origin(lm in arb_landmarks()) {
        let norm = normalize_landmarks(&lm);
        prop_assert_eq!(norm.len(), LANDMARK_COUNT);
        prop_assert_eq!(norm[index::WRIST], Point3::ORIGIN);
    }

    #[test]
    fn prop_ema_stays_between_inputs(
        previous in -1.0e4f64..1.0e4,
        current in -1.0e4f64..1.0e4,
        alpha in 0.0f64..=1.0,
    ) {
        let out = ema(previous, current, alpha);
        let (lo, hi) = if previous <= current { (previous, current) } else { (current, previous) };
        prop_assert!(out >= lo - 1e-9 && out <= hi + 1e-9);
    }
}

#[test]
fn pointing_flags_map_to_cursor_move() {
    let state = FingerState::from_flags([false, true, false, false, false]);
    assert_eq!(state.pattern, "01000");

    let lm = SyntheticHand::new((320.0, 240.0)).pattern("01000").build();
    let snap = HandSnapshot::extract(&lm, Handedness::Right);
    assert_eq!(snap.finger_state, state);

    let gesture = match_static(&snap);
    assert_eq!(gesture, Some(StaticGesture::IndexPointing));
    assert_eq!(
        GestureSymbol::Static(StaticGesture::IndexPointing).default_action(),
        Some("cursor_move")
    );
}

#[test]
fn close_thumb_and_index_tips_pinch() {
    let mut lm = SyntheticHand::new((100.0, 100.0))
        .pattern(NEUTRAL_PATTERN)
        .build();
    lm[index::THUMB_TIP] = Point3::xy(100.0, 100.0);
    lm[index::INDEX_TIP] = Point3::xy(105.0, 103.0);

    let snap = HandSnapshot::extract(&lm, Handedness::Right);
    assert_eq!(snap.pattern(), NEUTRAL_PATTERN);
    assert!(match_static(&snap).is_none());

    let classifier = GestureClassifier::new(ClassifierParams {
        pinch_threshold: 30.0,
        ..ClassifierParams::default()
    });
    let symbol = classifier.classify(&snap, &MotionWindow::new(10), &BTreeMap::new());
    assert_eq!(symbol, GestureSymbol::Shape(ShapeGesture::Pinch));
}

fn filled_window(dx: f64, dy: f64) -> MotionWindow {
    let mut window = MotionWindow::new(10);
    for i in 0..10u64 {
        let f = i as f64 / 9.0;
        window.push(MotionSample {
            position: Point2::new(100.0 + dx * f, 100.0 + dy * f),
            timestamp_ns: i * 200_000_000 / 9,
            angle_degrees: 0.0,
        });
    }
    window
}

#[test]
fn window_speed_selects_swipe_direction() {
    let classifier = GestureClassifier::new(ClassifierParams {
        swipe_speed_threshold: 500.0,
        ..ClassifierParams::default()
    });

    assert_eq!(classifier.match_motion(&filled_window(600.0, 0.0)), Some(Direction::Right));
    assert_eq!(classifier.match_motion(&filled_window(0.0, 600.0)), Some(Direction::Down));
    assert_eq!(classifier.match_motion(&filled_window(-600.0, 0.0)), Some(Direction::Left));
    // 90 px over 0.2 s = 450 px/s
    assert_eq!(classifier.match_motion(&filled_window(90.0, 0.0)), None);
}

#[test]
fn static_match_takes_priority_over_motion() {
    let classifier = GestureClassifier::default();
    let lm = SyntheticHand::new((320.0, 240.0)).pattern("00000").build();
    let snap = HandSnapshot::extract(&lm, Handedness::Right);
    let symbol = classifier.classify(&snap, &filled_window(600.0, 0.0), &BTreeMap::new());
    assert_eq!(symbol, GestureSymbol::Static(StaticGesture::ClosedFist));
}
