//! Gesture symbols and the static gesture registry.
//!
//! A [`GestureSymbol`] is the discrete classification result for one hand
//! in one frame. Symbols serialize as their SCREAMING_SNAKE names, which is
//! also how mapping documents refer to them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse direction bucket shared by hand orientation and swipe motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Right,
    Down,
    Up,
    Left,
}

impl Direction {
    /// Bucket an angle in degrees (image coordinates, y down):
    /// right `[-45, 45]`, down `(45, 135]`, up `[-135, -45)`, left otherwise.
    pub fn from_angle(angle_degrees: f64) -> Self {
        if (-45.0..=45.0).contains(&angle_degrees) {
            Direction::Right
        } else if angle_degrees > 45.0 && angle_degrees <= 135.0 {
            Direction::Down
        } else if (-135.0..-45.0).contains(&angle_degrees) {
            Direction::Up
        } else {
            Direction::Left
        }
    }

    /// Unit vector in image coordinates.
    pub fn unit(self) -> (f64, f64) {
        match self {
            Direction::Right => (1.0, 0.0),
            Direction::Down => (0.0, 1.0),
            Direction::Up => (0.0, -1.0),
            Direction::Left => (-1.0, 0.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Up => "up",
            Direction::Left => "left",
        }
    }
}

/// Gestures recognized from the 5-bit finger pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaticGesture {
    IndexPointing,
    LShape,
    PeaceSign,
    RockSign,
    CallSign,
    ClosedFist,
    OpenHand,
    MiddleFinger,
    ThumbsUp,
    ThumbsDown,
    ThreeFingers,
}

/// Gestures recognized from landmark geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShapeGesture {
    Pinch,
    OkSign,
}

/// One entry of the static registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticRule {
    pub gesture: StaticGesture,
    /// Finger pattern `[thumb, index, middle, ring, pinky]`.
    pub pattern: &'static str,
    /// Orientation the hand must point in for this rule to apply.
    pub discriminator: Option<Direction>,
}

/// The static registry in evaluation order. The first matching rule wins.
///
/// Precedence: when several gestures share a pattern, every rule carrying a
/// discriminator is listed before the rule without one. `THUMBS_DOWN`
/// (pattern `10000`, pointing down) is therefore tried before `THUMBS_UP`
/// (pattern `10000`, any orientation).
pub const STATIC_RULES: &[StaticRule] = &[
    StaticRule {
        gesture: StaticGesture::IndexPointing,
        pattern: "01000",
        discriminator: None,
    },
    StaticRule {
        gesture: StaticGesture::LShape,
        pattern: "11000",
        discriminator: None,
    },
    StaticRule {
        gesture: StaticGesture::PeaceSign,
        pattern: "01100",
        discriminator: None,
    },
    StaticRule {
        gesture: StaticGesture::RockSign,
        pattern: "01001",
        discriminator: None,
    },
    StaticRule {
        gesture: StaticGesture::CallSign,
        pattern: "10001",
        discriminator: None,
    },
    StaticRule {
        gesture: StaticGesture::ClosedFist,
        pattern: "00000",
        discriminator: None,
    },
    StaticRule {
        gesture: StaticGesture::OpenHand,
        pattern: "11111",
        discriminator: None,
    },
    StaticRule {
        gesture: StaticGesture::MiddleFinger,
        pattern: "00100",
        discriminator: None,
    },
    StaticRule {
        gesture: StaticGesture::ThumbsDown,
        pattern: "10000",
        discriminator: Some(Direction::Down),
    },
    StaticRule {
        gesture: StaticGesture::ThumbsUp,
        pattern: "10000",
        discriminator: None,
    },
    StaticRule {
        gesture: StaticGesture::ThreeFingers,
        pattern: "01110",
        discriminator: None,
    },
];

impl StaticGesture {
    pub const ALL: [StaticGesture; 11] = [
        StaticGesture::IndexPointing,
        StaticGesture::LShape,
        StaticGesture::PeaceSign,
        StaticGesture::RockSign,
        StaticGesture::CallSign,
        StaticGesture::ClosedFist,
        StaticGesture::OpenHand,
        StaticGesture::MiddleFinger,
        StaticGesture::ThumbsUp,
        StaticGesture::ThumbsDown,
        StaticGesture::ThreeFingers,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StaticGesture::IndexPointing => "INDEX_POINTING",
            StaticGesture::LShape => "L_SHAPE",
            StaticGesture::PeaceSign => "PEACE_SIGN",
            StaticGesture::RockSign => "ROCK_SIGN",
            StaticGesture::CallSign => "CALL_SIGN",
            StaticGesture::ClosedFist => "CLOSED_FIST",
            StaticGesture::OpenHand => "OPEN_HAND",
            StaticGesture::MiddleFinger => "MIDDLE_FINGER",
            StaticGesture::ThumbsUp => "THUMBS_UP",
            StaticGesture::ThumbsDown => "THUMBS_DOWN",
            StaticGesture::ThreeFingers => "THREE_FINGERS",
        }
    }

    /// The registry rule describing this gesture.
    pub fn rule(self) -> &'static StaticRule {
        STATIC_RULES
            .iter()
            .find(|rule| rule.gesture == self)
            .unwrap_or(&STATIC_RULES[0])
    }

    pub fn default_action(self) -> &'static str {
        match self {
            StaticGesture::IndexPointing => "cursor_move",
            StaticGesture::LShape => "left_click",
            StaticGesture::PeaceSign => "right_click",
            StaticGesture::RockSign => "scroll_up",
            StaticGesture::CallSign => "scroll_down",
            StaticGesture::ClosedFist => "drag_start",
            StaticGesture::OpenHand => "drag_end",
            StaticGesture::MiddleFinger => "switch_window",
            StaticGesture::ThumbsUp => "volume_up",
            StaticGesture::ThumbsDown => "volume_down",
            StaticGesture::ThreeFingers => "voice_command",
        }
    }
}

impl ShapeGesture {
    pub fn name(self) -> &'static str {
        match self {
            ShapeGesture::Pinch => "PINCH",
            ShapeGesture::OkSign => "OK_SIGN",
        }
    }

    pub fn default_action(self) -> &'static str {
        match self {
            ShapeGesture::Pinch => "zoom",
            ShapeGesture::OkSign => "screenshot",
        }
    }
}

/// Classification result for one hand in one frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GestureSymbol {
    /// Nothing recognized.
    #[default]
    NoGesture,
    Static(StaticGesture),
    Shape(ShapeGesture),
    /// A user-defined template, identified by its name.
    Custom(String),
    Swipe(Direction),
}

impl GestureSymbol {
    pub const NO_GESTURE_NAME: &'static str = "NONE";

    pub fn is_none(&self) -> bool {
        matches!(self, GestureSymbol::NoGesture)
    }

    /// Name used in logs and mapping documents.
    pub fn name(&self) -> &str {
        match self {
            GestureSymbol::NoGesture => Self::NO_GESTURE_NAME,
            GestureSymbol::Static(g) => g.name(),
            GestureSymbol::Shape(g) => g.name(),
            GestureSymbol::Custom(name) => name,
            GestureSymbol::Swipe(Direction::Left) => "SWIPE_LEFT",
            GestureSymbol::Swipe(Direction::Right) => "SWIPE_RIGHT",
            GestureSymbol::Swipe(Direction::Up) => "SWIPE_UP",
            GestureSymbol::Swipe(Direction::Down) => "SWIPE_DOWN",
        }
    }

    /// Resolve a name back to a symbol. Names not belonging to a built-in
    /// gesture are taken to be custom template names.
    pub fn from_name(name: &str) -> Self {
        if name == Self::NO_GESTURE_NAME {
            return GestureSymbol::NoGesture;
        }
        if let Some(g) = StaticGesture::ALL.iter().find(|g| g.name() == name) {
            return GestureSymbol::Static(*g);
        }
        for shape in [ShapeGesture::Pinch, ShapeGesture::OkSign] {
            if shape.name() == name {
                return GestureSymbol::Shape(shape);
            }
        }
        match name {
            "SWIPE_LEFT" => GestureSymbol::Swipe(Direction::Left),
            "SWIPE_RIGHT" => GestureSymbol::Swipe(Direction::Right),
            "SWIPE_UP" => GestureSymbol::Swipe(Direction::Up),
            "SWIPE_DOWN" => GestureSymbol::Swipe(Direction::Down),
            other => GestureSymbol::Custom(other.to_string()),
        }
    }

    /// Compiled-in action identifier, if any. Custom templates have none.
    pub fn default_action(&self) -> Option<&'static str> {
        match self {
            GestureSymbol::NoGesture | GestureSymbol::Custom(_) => None,
            GestureSymbol::Static(g) => Some(g.default_action()),
            GestureSymbol::Shape(g) => Some(g.default_action()),
            GestureSymbol::Swipe(Direction::Left) => Some("go_back"),
            GestureSymbol::Swipe(Direction::Right) => Some("go_forward"),
            GestureSymbol::Swipe(Direction::Up) => Some("maximize"),
            GestureSymbol::Swipe(Direction::Down) => Some("minimize"),
        }
    }

    /// Every built-in symbol, in registry order.
    pub fn builtins() -> Vec<GestureSymbol> {
        let mut all: Vec<GestureSymbol> = STATIC_RULES
            .iter()
            .map(|rule| GestureSymbol::Static(rule.gesture))
            .collect();
        all.push(GestureSymbol::Shape(ShapeGesture::Pinch));
        all.push(GestureSymbol::Shape(ShapeGesture::OkSign));
        for dir in [Direction::Left, Direction::Right, Direction::Up, Direction::Down] {
            all.push(GestureSymbol::Swipe(dir));
        }
        all
    }
}

impl fmt::Display for GestureSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for GestureSymbol {
    fn from(name: String) -> Self {
        GestureSymbol::from_name(&name)
    }
}

impl From<GestureSymbol> for String {
    fn from(symbol: GestureSymbol) -> Self {
        symbol.name().to_string()
    }
}

/// Debounce phase of a tracked hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HoldPhase {
    /// No symbol is held.
    #[default]
    Idle,
    /// A symbol was seen; its hold timer is running.
    Pending,
    /// The symbol has been held for at least the hold time.
    Confirmed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_direction_buckets() {
        assert_eq!(Direction::from_angle(0.0), Direction::Right);
        assert_eq!(Direction::from_angle(45.0), Direction::Right);
        assert_eq!(Direction::from_angle(-45.0), Direction::Right);
        assert_eq!(Direction::from_angle(45.1), Direction::Down);
        assert_eq!(Direction::from_angle(135.0), Direction::Down);
        assert_eq!(Direction::from_angle(-135.0), Direction::Up);
        assert_eq!(Direction::from_angle(-45.1), Direction::Up);
        assert_eq!(Direction::from_angle(135.1), Direction::Left);
        assert_eq!(Direction::from_angle(-135.1), Direction::Left);
        assert_eq!(Direction::from_angle(180.0), Direction::Left);
    }

    #[test]
    fn test_names_roundtrip_for_builtins() {
        for symbol in GestureSymbol::builtins() {
            assert_eq!(GestureSymbol::from_name(symbol.name()), symbol);
        }
        assert_eq!(GestureSymbol::from_name("NONE"), GestureSymbol::NoGesture);
    }

    #[test]
    fn test_unknown_name_is_custom() {
        assert_eq!(
            GestureSymbol::from_name("SPIDERMAN"),
            GestureSymbol::Custom("SPIDERMAN".to_string())
        );
    }

    #[test]
    fn test_symbol_serializes_as_name() {
        let json = serde_json::to_string(&GestureSymbol::Swipe(Direction::Up)).unwrap();
        assert_eq!(json, "\"SWIPE_UP\"");
        let parsed: GestureSymbol = serde_json::from_str("\"PEACE_SIGN\"").unwrap();
        assert_eq!(parsed, GestureSymbol::Static(StaticGesture::PeaceSign));
    }

    #[test]
    fn test_pointing_defaults_to_cursor_move() {
        let rule = StaticGesture::IndexPointing.rule();
        assert_eq!(rule.pattern, "01000");
        assert_eq!(
            GestureSymbol::Static(StaticGesture::IndexPointing).default_action(),
            Some("cursor_move")
        );
    }

    #[test]
    fn test_discriminated_rules_precede_shared_patterns() {
        for (i, rule) in STATIC_RULES.iter().enumerate() {
            if rule.discriminator.is_some() {
                continue;
            }
            let shadowed = STATIC_RULES[i + 1..]
                .iter()
                .any(|later| later.pattern == rule.pattern && later.discriminator.is_some());
            assert!(!shadowed, "{} shadows a discriminated rule", rule.gesture.name());
        }
    }

    proptest! {
        #[test]
        fn prop_direction_bucket_is_nearest_axis(angle in -180.0f64..=180.0) {
            let (ux, uy) = Direction::from_angle(angle).unit();
            let rad = angle.to_radians();
            let alignment = ux * rad.cos() + uy * rad.sin();
            prop_assert!(alignment >= std::f64::consts::FRAC_1_SQRT_2 - 1e-9);
        }
    }

    #[test]
    fn test_every_static_gesture_has_a_rule() {
        for gesture in StaticGesture::ALL {
            assert_eq!(gesture.rule().gesture, gesture);
        }
    }
}
