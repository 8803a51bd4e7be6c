//! Gesture-to-action mapping and custom gesture templates.
//!
//! Both documents are owned and persisted outside the core. The pipeline
//! only ever consumes them as an immutable [`MappingSnapshot`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use handctl_common::error::{HandctlError, HandctlResult};
use serde::{Deserialize, Serialize};

use crate::gesture::GestureSymbol;
use crate::landmark::LANDMARK_COUNT;

/// Typed view of an action identifier.
///
/// Identifiers that are not part of the known vocabulary become
/// [`Action::Shortcut`] and are forwarded verbatim to the key actuator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    CursorMove,
    LeftClick,
    RightClick,
    DoubleClick,
    ScrollUp,
    ScrollDown,
    DragStart,
    DragEnd,
    SwitchWindow,
    VolumeUp,
    VolumeDown,
    BrightnessUp,
    BrightnessDown,
    VoiceCommand,
    Screenshot,
    GoBack,
    GoForward,
    Minimize,
    Maximize,
    Close,
    Copy,
    Paste,
    Cut,
    Undo,
    Delete,
    LockScreen,
    LaunchApp(String),
    CloseApp(String),
    Shortcut(String),
}

impl Action {
    pub fn parse(id: &str) -> Self {
        let id = id.trim();
        if let Some(app) = id.strip_prefix("launch:") {
            return Action::LaunchApp(app.to_string());
        }
        if let Some(app) = id.strip_prefix("close_app:") {
            return Action::CloseApp(app.to_string());
        }
        match id {
            "cursor_move" => Action::CursorMove,
            "left_click" => Action::LeftClick,
            "right_click" => Action::RightClick,
            "double_click" => Action::DoubleClick,
            "scroll_up" => Action::ScrollUp,
            "scroll_down" => Action::ScrollDown,
            "drag_start" => Action::DragStart,
            "drag_end" => Action::DragEnd,
            "switch_window" => Action::SwitchWindow,
            "volume_up" => Action::VolumeUp,
            "volume_down" => Action::VolumeDown,
            "brightness_up" => Action::BrightnessUp,
            "brightness_down" => Action::BrightnessDown,
            "voice_command" => Action::VoiceCommand,
            "screenshot" => Action::Screenshot,
            "go_back" => Action::GoBack,
            "go_forward" => Action::GoForward,
            "minimize" => Action::Minimize,
            "maximize" => Action::Maximize,
            "close" => Action::Close,
            "copy" => Action::Copy,
            "paste" => Action::Paste,
            "cut" => Action::Cut,
            "undo" => Action::Undo,
            "delete" => Action::Delete,
            "lock_screen" => Action::LockScreen,
            other => Action::Shortcut(other.to_string()),
        }
    }

    /// The identifier this action was parsed from.
    pub fn id(&self) -> String {
        let fixed = match self {
            Action::CursorMove => "cursor_move",
            Action::LeftClick => "left_click",
            Action::RightClick => "right_click",
            Action::DoubleClick => "double_click",
            Action::ScrollUp => "scroll_up",
            Action::ScrollDown => "scroll_down",
            Action::DragStart => "drag_start",
            Action::DragEnd => "drag_end",
            Action::SwitchWindow => "switch_window",
            Action::VolumeUp => "volume_up",
            Action::VolumeDown => "volume_down",
            Action::BrightnessUp => "brightness_up",
            Action::BrightnessDown => "brightness_down",
            Action::VoiceCommand => "voice_command",
            Action::Screenshot => "screenshot",
            Action::GoBack => "go_back",
            Action::GoForward => "go_forward",
            Action::Minimize => "minimize",
            Action::Maximize => "maximize",
            Action::Close => "close",
            Action::Copy => "copy",
            Action::Paste => "paste",
            Action::Cut => "cut",
            Action::Undo => "undo",
            Action::Delete => "delete",
            Action::LockScreen => "lock_screen",
            Action::LaunchApp(app) => return format!("launch:{app}"),
            Action::CloseApp(app) => return format!("close_app:{app}"),
            Action::Shortcut(raw) => return raw.clone(),
        };
        fixed.to_string()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

/// Symbol-name to action-identifier overrides layered over the
/// compiled-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GestureMapping {
    overrides: BTreeMap<String, String>,
}

impl GestureMapping {
    pub fn new(overrides: BTreeMap<String, String>) -> Self {
        Self { overrides }
    }

    /// Resolve a symbol: override first, then compiled-in default.
    /// An override with an empty identifier explicitly unmaps the symbol.
    pub fn resolve(&self, symbol: &GestureSymbol) -> Option<String> {
        if symbol.is_none() {
            return None;
        }
        match self.overrides.get(symbol.name()) {
            Some(action) if action.trim().is_empty() => None,
            Some(action) => Some(action.clone()),
            None => symbol.default_action().map(str::to_string),
        }
    }

    pub fn overrides(&self) -> &BTreeMap<String, String> {
        &self.overrides
    }

    pub fn with_override(mut self, symbol: &str, action: &str) -> Self {
        self.overrides.insert(symbol.to_string(), action.to_string());
        self
    }
}

/// A user-defined gesture. Every field is optional; a template matches only
/// if every field it specifies is satisfied.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CustomGestureTemplate {
    /// Required finger pattern, e.g. `"01100"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finger_pattern: Option<String>,

    /// Required orientation angle in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<f64>,

    /// Allowed deviation from `orientation`, in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle_tolerance: Option<f64>,

    /// Reference landmarks (21 points) compared by cosine similarity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<Vec<[f64; 3]>>,

    /// Minimum cosine similarity against `landmarks`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f64>,
}

impl CustomGestureTemplate {
    pub const DEFAULT_ANGLE_TOLERANCE: f64 = 30.0;
    pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

    pub fn angle_tolerance(&self) -> f64 {
        self.angle_tolerance.unwrap_or(Self::DEFAULT_ANGLE_TOLERANCE)
    }

    pub fn similarity_threshold(&self) -> f64 {
        self.similarity_threshold
            .unwrap_or(Self::DEFAULT_SIMILARITY_THRESHOLD)
    }

    /// A template with no matching fields matches every hand.
    pub fn is_unconstrained(&self) -> bool {
        self.finger_pattern.is_none() && self.orientation.is_none() && self.landmarks.is_none()
    }

    /// Check the fields that are present for well-formedness.
    pub fn validate(&self, name: &str) -> HandctlResult<()> {
        if let Some(pattern) = &self.finger_pattern {
            if pattern.len() != 5 || !pattern.chars().all(|c| c == '0' || c == '1') {
                return Err(HandctlError::template(format!(
                    "{name}: finger_pattern must be 5 characters of 0/1, got {pattern:?}"
                )));
            }
        }
        if let Some(points) = &self.landmarks {
            if points.len() != LANDMARK_COUNT {
                return Err(HandctlError::template(format!(
                    "{name}: landmarks must contain {LANDMARK_COUNT} points, got {}",
                    points.len()
                )));
            }
        }
        Ok(())
    }
}

/// Immutable view of the mapping documents, swapped atomically by the owner.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MappingSnapshot {
    pub mapping: GestureMapping,

    /// Templates keyed by name; evaluated in ascending name order.
    pub templates: BTreeMap<String, CustomGestureTemplate>,
}

impl MappingSnapshot {
    pub fn new(mapping: GestureMapping, templates: BTreeMap<String, CustomGestureTemplate>) -> Self {
        Self { mapping, templates }
    }

    /// Read both documents. A missing file is treated as empty.
    pub fn load(mapping_path: &Path, templates_path: &Path) -> HandctlResult<Self> {
        let mapping = if mapping_path.exists() {
            let content = std::fs::read_to_string(mapping_path)?;
            serde_json::from_str(&content).map_err(|e| {
                HandctlError::mapping(format!("{}: {e}", mapping_path.display()))
            })?
        } else {
            tracing::debug!(path = %mapping_path.display(), "No mapping overrides file");
            GestureMapping::default()
        };

        let templates = if templates_path.exists() {
            let content = std::fs::read_to_string(templates_path)?;
            parse_templates(&content)?
        } else {
            tracing::debug!(path = %templates_path.display(), "No custom templates file");
            BTreeMap::new()
        };

        Ok(Self { mapping, templates })
    }
}

/// Parse and validate a custom template document.
pub fn parse_templates(json: &str) -> HandctlResult<BTreeMap<String, CustomGestureTemplate>> {
    let templates: BTreeMap<String, CustomGestureTemplate> =
        serde_json::from_str(json).map_err(|e| HandctlError::template(e.to_string()))?;
    for (name, template) in &templates {
        template.validate(name)?;
        if template.is_unconstrained() {
            tracing::warn!(template = %name, "Custom template has no fields and matches every hand");
        }
    }
    Ok(templates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{Direction, ShapeGesture, StaticGesture};

    #[test]
    fn test_action_parse_roundtrip() {
        for id in [
            "cursor_move",
            "left_click",
            "drag_start",
            "volume_down",
            "launch:firefox",
            "close_app:slack",
            "ctrl+shift+t",
        ] {
            assert_eq!(Action::parse(id).id(), id);
        }
    }

    #[test]
    fn test_unknown_action_is_shortcut() {
        assert_eq!(Action::parse("zoom"), Action::Shortcut("zoom".to_string()));
    }

    #[test]
    fn test_override_takes_precedence() {
        let mapping = GestureMapping::default().with_override("PEACE_SIGN", "copy");
        assert_eq!(
            mapping.resolve(&GestureSymbol::Static(StaticGesture::PeaceSign)),
            Some("copy".to_string())
        );
        assert_eq!(
            mapping.resolve(&GestureSymbol::Shape(ShapeGesture::OkSign)),
            Some("screenshot".to_string())
        );
        assert_eq!(
            mapping.resolve(&GestureSymbol::Swipe(Direction::Left)),
            Some("go_back".to_string())
        );
    }

    #[test]
    fn test_empty_override_unmaps() {
        let mapping = GestureMapping::default().with_override("OPEN_HAND", "");
        assert_eq!(
            mapping.resolve(&GestureSymbol::Static(StaticGesture::OpenHand)),
            None
        );
    }

    #[test]
    fn test_custom_symbol_needs_override() {
        let symbol = GestureSymbol::Custom("VULCAN".to_string());
        assert_eq!(GestureMapping::default().resolve(&symbol), None);
        let mapping = GestureMapping::default().with_override("VULCAN", "lock_screen");
        assert_eq!(mapping.resolve(&symbol), Some("lock_screen".to_string()));
    }

    #[test]
    fn test_no_gesture_never_resolves() {
        let mapping = GestureMapping::default().with_override("NONE", "left_click");
        assert_eq!(mapping.resolve(&GestureSymbol::NoGesture), None);
    }

    #[test]
    fn test_template_missing_fields_parse() {
        let templates = parse_templates(r#"{ "TWO_UP": { "finger_pattern": "01100" } }"#).unwrap();
        let t = &templates["TWO_UP"];
        assert_eq!(t.orientation, None);
        assert_eq!(t.angle_tolerance(), 30.0);
        assert_eq!(t.similarity_threshold(), 0.85);
    }

    #[test]
    fn test_template_rejects_bad_pattern() {
        assert!(parse_templates(r#"{ "BAD": { "finger_pattern": "0120" } }"#).is_err());
    }

    #[test]
    fn test_template_rejects_wrong_landmark_count() {
        assert!(parse_templates(r#"{ "BAD": { "landmarks": [[0,0,0]] } }"#).is_err());
    }

    #[test]
    fn test_load_missing_files_gives_empty_snapshot() {
        let dir = std::env::temp_dir().join("handctl_missing_mapping_docs");
        let snapshot =
            MappingSnapshot::load(&dir.join("gestures.json"), &dir.join("custom.json")).unwrap();
        assert_eq!(snapshot, MappingSnapshot::default());
    }

    #[test]
    fn test_load_reads_both_documents() {
        let dir = std::env::temp_dir().join("handctl_test_mapping_docs");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("gestures.json"), r#"{ "PINCH": "ctrl+plus" }"#).unwrap();
        std::fs::write(
            dir.join("custom.json"),
            r#"{ "SPREAD": { "finger_pattern": "11111", "orientation": -90.0 } }"#,
        )
        .unwrap();

        let snapshot =
            MappingSnapshot::load(&dir.join("gestures.json"), &dir.join("custom.json")).unwrap();
        assert_eq!(
            snapshot
                .mapping
                .resolve(&GestureSymbol::Shape(ShapeGesture::Pinch)),
            Some("ctrl+plus".to_string())
        );
        assert_eq!(snapshot.templates["SPREAD"].orientation, Some(-90.0));

        std::fs::remove_dir_all(&dir).ok();
    }
}
