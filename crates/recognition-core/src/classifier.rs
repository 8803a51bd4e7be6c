//! Gesture classification.
//!
//! Three strategies run in a fixed order and the first that matches wins:
//!
//! 1. **Static:** the finger pattern against [`STATIC_RULES`], in table order.
//! 2. **Shape:** pinch, then OK sign, then custom templates by ascending name.
//! 3. **Motion:** a swipe read from a full [`MotionWindow`].
//!
//! No scores are compared across strategies. Nothing here fails; every
//! degenerate input simply produces [`GestureSymbol::NoGesture`].

use std::collections::BTreeMap;

use handctl_common::config::RecognitionConfig;
use handctl_hand_model::gesture::{
    Direction, GestureSymbol, ShapeGesture, StaticGesture, STATIC_RULES,
};
use handctl_hand_model::landmark::Point3;
use handctl_hand_model::mapping::CustomGestureTemplate;

use crate::features::{angle_difference, cosine_similarity, normalize_landmarks, HandSnapshot};
use crate::motion::{MotionSample, MotionWindow};

/// Which strategy produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    Static,
    Shape,
    Motion,
}

/// Thresholds used by the shape and motion strategies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierParams {
    /// Thumb-tip to index-tip distance below which the hand pinches (px).
    pub pinch_threshold: f64,
    /// Thumb-tip to index-tip distance below which an OK sign may form (px).
    pub ok_threshold: f64,
    /// Window speed above which motion counts as a swipe (px/s).
    pub swipe_speed_threshold: f64,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self::from_config(&RecognitionConfig::default())
    }
}

impl ClassifierParams {
    pub fn from_config(config: &RecognitionConfig) -> Self {
        Self {
            pinch_threshold: config.pinch_threshold,
            ok_threshold: config.ok_threshold,
            swipe_speed_threshold: config.swipe_speed_threshold,
        }
    }
}

/// Stateless classifier; per-hand state lives in the [`MotionWindow`] the
/// caller passes in.
#[derive(Debug, Clone, Default)]
pub struct GestureClassifier {
    params: ClassifierParams,
}

impl GestureClassifier {
    pub fn new(params: ClassifierParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ClassifierParams {
        &self.params
    }

    pub fn set_params(&mut self, params: ClassifierParams) {
        self.params = params;
    }

    pub fn classify(
        &self,
        snapshot: &HandSnapshot,
        motion: &MotionWindow,
        templates: &BTreeMap<String, CustomGestureTemplate>,
    ) -> GestureSymbol {
        self.classify_with_strategy(snapshot, motion, templates)
            .map(|(symbol, _)| symbol)
            .unwrap_or_default()
    }

    pub fn classify_with_strategy(
        &self,
        snapshot: &HandSnapshot,
        motion: &MotionWindow,
        templates: &BTreeMap<String, CustomGestureTemplate>,
    ) -> Option<(GestureSymbol, MatchStrategy)> {
        self.classify_pose(snapshot, templates).or_else(|| {
            self.match_motion(motion)
                .map(|direction| (GestureSymbol::Swipe(direction), MatchStrategy::Motion))
        })
    }

    /// Classify a tracked hand. `sample` enters the window only when neither
    /// the static nor the shape strategy matched, so the window holds motion
    /// of unrecognised poses only.
    pub fn classify_tracked(
        &self,
        snapshot: &HandSnapshot,
        sample: MotionSample,
        window: &mut MotionWindow,
        templates: &BTreeMap<String, CustomGestureTemplate>,
    ) -> Option<(GestureSymbol, MatchStrategy)> {
        if let Some(matched) = self.classify_pose(snapshot, templates) {
            return Some(matched);
        }
        window.push(sample);
        self.match_motion(window)
            .map(|direction| (GestureSymbol::Swipe(direction), MatchStrategy::Motion))
    }

    /// The static and shape strategies, which need no history.
    pub fn classify_pose(
        &self,
        snapshot: &HandSnapshot,
        templates: &BTreeMap<String, CustomGestureTemplate>,
    ) -> Option<(GestureSymbol, MatchStrategy)> {
        if let Some(gesture) = match_static(snapshot) {
            return Some((GestureSymbol::Static(gesture), MatchStrategy::Static));
        }
        self.match_shape(snapshot, templates)
            .map(|symbol| (symbol, MatchStrategy::Shape))
    }

    /// Pinch, then OK sign, then custom templates in ascending name order.
    pub fn match_shape(
        &self,
        snapshot: &HandSnapshot,
        templates: &BTreeMap<String, CustomGestureTemplate>,
    ) -> Option<GestureSymbol> {
        let gap = snapshot.thumb_index_distance();
        if gap < self.params.pinch_threshold {
            return Some(GestureSymbol::Shape(ShapeGesture::Pinch));
        }

        let [_, _, middle, ring, pinky] = snapshot.finger_state.extended;
        if gap < self.params.ok_threshold && middle && ring && pinky {
            return Some(GestureSymbol::Shape(ShapeGesture::OkSign));
        }

        templates
            .iter()
            .find(|(_, template)| match_template(snapshot, template))
            .map(|(name, _)| {
                tracing::trace!(template = %name, "Custom template matched");
                GestureSymbol::Custom(name.clone())
            })
    }

    /// Swipe direction when the full window moved faster than the threshold.
    pub fn match_motion(&self, window: &MotionWindow) -> Option<Direction> {
        let motion = window.net_motion()?;
        if motion.speed > self.params.swipe_speed_threshold {
            Some(Direction::from_angle(motion.angle_degrees()))
        } else {
            None
        }
    }
}

/// First rule in [`STATIC_RULES`] whose pattern matches and whose
/// discriminator, if any, agrees with the hand orientation.
pub fn match_static(snapshot: &HandSnapshot) -> Option<StaticGesture> {
    STATIC_RULES
        .iter()
        .find(|rule| {
            rule.pattern == snapshot.pattern()
                && rule
                    .discriminator
                    .map_or(true, |d| d == snapshot.orientation.direction)
        })
        .map(|rule| rule.gesture)
}

/// Every field the template specifies must hold. A template that specifies
/// nothing matches.
pub fn match_template(snapshot: &HandSnapshot, template: &CustomGestureTemplate) -> bool {
    if let Some(pattern) = &template.finger_pattern {
        if pattern != snapshot.pattern() {
            return false;
        }
    }

    if let Some(angle) = template.orientation {
        if angle_difference(snapshot.orientation.angle_degrees, angle) > template.angle_tolerance() {
            return false;
        }
    }

    if let Some(reference) = &template.landmarks {
        let reference: Vec<Point3> = reference.iter().copied().map(Point3::from).collect();
        if reference.len() != snapshot.landmarks.len() {
            return false;
        }
        let similarity = cosine_similarity(
            &normalize_landmarks(&snapshot.landmarks),
            &normalize_landmarks(&reference),
        );
        if similarity < template.similarity_threshold() {
            return false;
        }
    }

    true
}
