//! handctl actuator contracts.
//!
//! The recognition pipeline never touches the OS directly. Every effect it
//! wants is expressed as an [`ActuatorCommand`] handed to an [`Actuator`];
//! concrete OS automation lives outside this workspace.

pub mod queued;
pub mod recording;

use handctl_common::error::HandctlResult;
use serde::{Deserialize, Serialize};

pub use queued::QueuedActuator;
pub use recording::{LogActuator, RecordingActuator};

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// One operation requested from the outside world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ActuatorCommand {
    /// Move the pointer to absolute display pixels.
    MoveAbsolute { x: i32, y: i32 },
    MoveRelative { dx: i32, dy: i32 },
    Click { button: MouseButton },
    DoubleClick { button: MouseButton },
    /// Press and hold the button at the current pointer position.
    DragStart { button: MouseButton },
    DragEnd { button: MouseButton },
    /// Positive scrolls up.
    Scroll { amount: i32 },

    /// A single key, e.g. `"delete"`.
    Key { key: String },
    /// Keys pressed together, e.g. `["alt", "tab"]`.
    KeyCombo { keys: Vec<String> },
    /// A named or raw shortcut forwarded verbatim.
    Shortcut { name: String },

    AdjustVolume { delta: i32 },
    AdjustBrightness { delta: i32 },
    Screenshot,
    LaunchApp { app: String },
    CloseApp { app: String },
    Lock,
}

impl ActuatorCommand {
    /// Symbolic operation name used in logs and failure reports.
    pub fn action_name(&self) -> &'static str {
        match self {
            ActuatorCommand::MoveAbsolute { .. } => "move_absolute",
            ActuatorCommand::MoveRelative { .. } => "move_relative",
            ActuatorCommand::Click { .. } => "click",
            ActuatorCommand::DoubleClick { .. } => "double_click",
            ActuatorCommand::DragStart { .. } => "drag_start",
            ActuatorCommand::DragEnd { .. } => "drag_end",
            ActuatorCommand::Scroll { .. } => "scroll",
            ActuatorCommand::Key { .. } => "key",
            ActuatorCommand::KeyCombo { .. } => "key_combo",
            ActuatorCommand::Shortcut { .. } => "shortcut",
            ActuatorCommand::AdjustVolume { .. } => "adjust_volume",
            ActuatorCommand::AdjustBrightness { .. } => "adjust_brightness",
            ActuatorCommand::Screenshot => "screenshot",
            ActuatorCommand::LaunchApp { .. } => "launch_app",
            ActuatorCommand::CloseApp { .. } => "close_app",
            ActuatorCommand::Lock => "lock",
        }
    }

    /// Build a key combination from a `+`-separated string such as `"alt+f4"`.
    pub fn combo(chord: &str) -> Self {
        ActuatorCommand::KeyCombo {
            keys: chord
                .split('+')
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }
}

/// Sink for actuator commands.
///
/// Implementations report failure through the returned error; they must not
/// panic. Callers treat every error as non-fatal.
pub trait Actuator: Send {
    fn execute(&mut self, command: &ActuatorCommand) -> HandctlResult<()>;

    /// Actuator name for logging.
    fn name(&self) -> &str;
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn execute(&mut self, command: &ActuatorCommand) -> HandctlResult<()> {
        (**self).execute(command)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// The display the pointer is mapped onto.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayInfo {
    /// Display name/identifier.
    pub name: String,
    /// Resolution in pixels.
    pub width: u32,
    pub height: u32,
}

impl DisplayInfo {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            name: "primary".to_string(),
            width,
            height,
        }
    }

    /// Clamp a pixel position onto the display.
    pub fn clamp(&self, x: i32, y: i32) -> (i32, i32) {
        let max_x = self.width.max(1) as i32 - 1;
        let max_y = self.height.max(1) as i32 - 1;
        (x.clamp(0, max_x), y.clamp(0, max_y))
    }
}
