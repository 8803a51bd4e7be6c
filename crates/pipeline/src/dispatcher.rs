//! Action dispatch: typed actions to actuator commands, plus drag state.
//!
//! Drag is a two-state machine owned here, not by the actuator:
//!
//! ```text
//!              drag_start (effective)
//!   NOT_DRAGGING ───────────────────▶ DRAGGING { owner }
//!        ▲                                  │
//!        └──────────────────────────────────┘
//!          drag_end, owner lost, no hands, shutdown
//! ```
//!
//! `drag_start` while dragging and `drag_end` while not dragging never reach
//! the actuator.

use handctl_actuator_core::{Actuator, ActuatorCommand, DisplayInfo, MouseButton};
use handctl_common::config::{AppConfig, DispatchConfig};
use handctl_hand_model::event::EventKind;
use handctl_hand_model::landmark::HandId;
use handctl_hand_model::mapping::Action;
use handctl_recognition_core::cursor::{CursorMapper, CursorTarget};
use handctl_recognition_core::features::Point2;

/// Drag state of the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    NotDragging,
    Dragging {
        owner: HandId,
    },
}

/// Translate an action that needs neither the hand position nor drag state.
///
/// Returns `None` for [`Action::CursorMove`], [`Action::DragStart`] and
/// [`Action::DragEnd`], which the dispatcher handles itself.
pub fn translate(action: &Action, config: &DispatchConfig) -> Option<ActuatorCommand> {
    let command = match action {
        Action::CursorMove | Action::DragStart | Action::DragEnd => return None,
        Action::LeftClick => ActuatorCommand::Click {
            button: MouseButton::Left,
        },
        Action::RightClick => ActuatorCommand::Click {
            button: MouseButton::Right,
        },
        Action::DoubleClick => ActuatorCommand::DoubleClick {
            button: MouseButton::Left,
        },
        Action::ScrollUp => ActuatorCommand::Scroll {
            amount: config.scroll_amount,
        },
        Action::ScrollDown => ActuatorCommand::Scroll {
            amount: -config.scroll_amount,
        },
        Action::SwitchWindow => ActuatorCommand::combo("alt+tab"),
        Action::VolumeUp => ActuatorCommand::AdjustVolume {
            delta: config.volume_step,
        },
        Action::VolumeDown => ActuatorCommand::AdjustVolume {
            delta: -config.volume_step,
        },
        Action::BrightnessUp => ActuatorCommand::AdjustBrightness {
            delta: config.brightness_step,
        },
        Action::BrightnessDown => ActuatorCommand::AdjustBrightness {
            delta: -config.brightness_step,
        },
        Action::VoiceCommand => ActuatorCommand::combo("super+h"),
        Action::Screenshot => ActuatorCommand::Screenshot,
        Action::GoBack => ActuatorCommand::combo("alt+left"),
        Action::GoForward => ActuatorCommand::combo("alt+right"),
        Action::Minimize => ActuatorCommand::combo("super+down"),
        Action::Maximize => ActuatorCommand::combo("super+up"),
        Action::Close => ActuatorCommand::combo("alt+f4"),
        Action::Copy => ActuatorCommand::combo("ctrl+c"),
        Action::Paste => ActuatorCommand::combo("ctrl+v"),
        Action::Cut => ActuatorCommand::combo("ctrl+x"),
        Action::Undo => ActuatorCommand::combo("ctrl+z"),
        Action::Delete => ActuatorCommand::Key {
            key: "delete".to_string(),
        },
        Action::LockScreen => ActuatorCommand::Lock,
        Action::LaunchApp(app) => ActuatorCommand::LaunchApp { app: app.clone() },
        Action::CloseApp(app) => ActuatorCommand::CloseApp { app: app.clone() },
        Action::Shortcut(raw) => ActuatorCommand::Shortcut { name: raw.clone() },
    };
    Some(command)
}

/// Forwards actions to an actuator and owns drag and cursor state.
pub struct ActionDispatcher {
    actuator: Box<dyn Actuator>,
    config: DispatchConfig,
    cursor: CursorMapper,
    display: DisplayInfo,
    drag: DragState,
    failures: u64,
}

impl ActionDispatcher {
    pub fn new(actuator: Box<dyn Actuator>, config: &AppConfig) -> Self {
        Self {
            actuator,
            config: config.dispatch.clone(),
            cursor: CursorMapper::new(config.cursor.clone()),
            display: DisplayInfo::new(config.cursor.display_width, config.cursor.display_height),
            drag: DragState::NotDragging,
            failures: 0,
        }
    }

    /// Pick up new dispatch and cursor settings. Drag state is kept.
    pub fn apply_config(&mut self, config: &AppConfig) {
        self.config = config.dispatch.clone();
        self.cursor.set_config(config.cursor.clone());
        self.display = DisplayInfo::new(config.cursor.display_width, config.cursor.display_height);
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    pub fn actuator_name(&self) -> &str {
        self.actuator.name()
    }

    /// Number of actuator calls that reported failure.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Dispatch one confirmed action for `hand`, whose center is `center`.
    /// Returns the events this produced.
    pub fn dispatch(&mut self, hand: HandId, action: &Action, center: Point2) -> Vec<EventKind> {
        let mut events = Vec::new();
        match action {
            Action::CursorMove => {
                if let Some(command) = self.cursor_command(center) {
                    self.execute(action, &command, &mut events);
                }
            }
            Action::DragStart => match self.drag {
                DragState::NotDragging => {
                    let command = ActuatorCommand::DragStart {
                        button: MouseButton::Left,
                    };
                    if self.execute(action, &command, &mut events) {
                        self.drag = DragState::Dragging { owner: hand };
                        tracing::info!(hand = %hand, "Drag started");
                        events.push(EventKind::DragStarted { hand });
                    }
                }
                DragState::Dragging { .. } => {}
            },
            Action::DragEnd => {
                if self.is_dragging() {
                    self.end_drag(false, &mut events);
                }
            }
            other => {
                if let Some(command) = translate(other, &self.config) {
                    if let Action::Shortcut(raw) = other {
                        tracing::debug!(action = %raw, "Unknown action forwarded as shortcut");
                    }
                    self.execute(action, &command, &mut events);
                }
            }
        }
        events
    }

    /// End an active drag regardless of which hand owns it.
    pub fn force_drag_end(&mut self) -> Vec<EventKind> {
        let mut events = Vec::new();
        if self.is_dragging() {
            self.end_drag(true, &mut events);
        }
        events
    }

    /// A tracked hand disappeared. Ends the drag if that hand owned it.
    pub fn hand_lost(&mut self, hand: HandId) -> Vec<EventKind> {
        match self.drag {
            DragState::Dragging { owner } if owner == hand => self.force_drag_end(),
            _ => Vec::new(),
        }
    }

    /// Forget cursor smoothing history.
    pub fn reset_cursor(&mut self) {
        self.cursor.reset();
    }

    fn cursor_command(&mut self, center: Point2) -> Option<ActuatorCommand> {
        match self.cursor.map(center)? {
            CursorTarget::Absolute { x, y } => {
                let (x, y) = self.display.clamp(x, y);
                Some(ActuatorCommand::MoveAbsolute { x, y })
            }
            CursorTarget::Relative { dx, dy } if dx == 0 && dy == 0 => None,
            CursorTarget::Relative { dx, dy } => Some(ActuatorCommand::MoveRelative { dx, dy }),
        }
    }

    fn end_drag(&mut self, forced: bool, events: &mut Vec<EventKind>) {
        let command = ActuatorCommand::DragEnd {
            button: MouseButton::Left,
        };
        // Cleared even if the actuator failed.
        self.execute(&Action::DragEnd, &command, events);
        self.drag = DragState::NotDragging;
        tracing::info!(forced, "Drag ended");
        events.push(EventKind::DragEnded { forced });
    }

    /// Run one command; failures are logged and reported, never returned.
    fn execute(
        &mut self,
        action: &Action,
        command: &ActuatorCommand,
        events: &mut Vec<EventKind>,
    ) -> bool {
        tracing::trace!(action = %action, op = command.action_name(), "Executing");
        match self.actuator.execute(command) {
            Ok(()) => true,
            Err(e) => {
                self.failures += 1;
                tracing::warn!(
                    action = %action,
                    actuator = %self.actuator.name(),
                    error = %e,
                    "Actuator call failed"
                );
                events.push(EventKind::ActionFailed {
                    action: action.id(),
                    message: e.to_string(),
                });
                false
            }
        }
    }
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("actuator", &self.actuator.name())
            .field("drag", &self.drag)
            .field("failures", &self.failures)
            .finish()
    }
}
