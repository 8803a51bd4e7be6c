//! Actuators that do not touch the OS.
//!
//! - [`RecordingActuator`] keeps every command for later inspection and can
//!   be told to fail, for tests.
//! - [`LogActuator`] logs every command and simulates pointer state, for
//!   dry runs and replays.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use handctl_common::error::{HandctlError, HandctlResult};

use crate::{Actuator, ActuatorCommand, DisplayInfo};

/// Records every command it receives. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingActuator {
    log: Arc<Mutex<Vec<ActuatorCommand>>>,
    failing: Arc<Mutex<HashSet<&'static str>>>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every command whose [`ActuatorCommand::action_name`] is `name`.
    /// Failed commands are still recorded.
    pub fn fail_on(&self, name: &'static str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(name);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.clear();
        }
    }

    /// Snapshot of everything received so far.
    pub fn commands(&self) -> Vec<ActuatorCommand> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Number of received commands with the given action name.
    pub fn count(&self, name: &str) -> usize {
        self.commands()
            .iter()
            .filter(|c| c.action_name() == name)
            .count()
    }

    pub fn clear(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.clear();
        }
    }
}

impl Actuator for RecordingActuator {
    fn execute(&mut self, command: &ActuatorCommand) -> HandctlResult<()> {
        self.log
            .lock()
            .map_err(|_| HandctlError::actuator("recording log poisoned"))?
            .push(command.clone());

        let should_fail = self
            .failing
            .lock()
            .map(|failing| failing.contains(command.action_name()))
            .unwrap_or(false);
        if should_fail {
            return Err(HandctlError::actuator(format!(
                "{} rejected by test actuator",
                command.action_name()
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Logs commands at info level and tracks where the pointer would be.
#[derive(Debug)]
pub struct LogActuator {
    display: DisplayInfo,
    pointer: (i32, i32),
    button_held: bool,
    executed: u64,
}

impl LogActuator {
    pub fn new(display: DisplayInfo) -> Self {
        let pointer = (display.width as i32 / 2, display.height as i32 / 2);
        Self {
            display,
            pointer,
            button_held: false,
            executed: 0,
        }
    }

    pub fn pointer(&self) -> (i32, i32) {
        self.pointer
    }

    pub fn button_held(&self) -> bool {
        self.button_held
    }

    pub fn executed(&self) -> u64 {
        self.executed
    }
}

impl Actuator for LogActuator {
    fn execute(&mut self, command: &ActuatorCommand) -> HandctlResult<()> {
        match command {
            ActuatorCommand::MoveAbsolute { x, y } => {
                self.pointer = self.display.clamp(*x, *y);
            }
            ActuatorCommand::MoveRelative { dx, dy } => {
                self.pointer = self
                    .display
                    .clamp(self.pointer.0.saturating_add(*dx), self.pointer.1.saturating_add(*dy));
            }
            ActuatorCommand::DragStart { .. } => self.button_held = true,
            ActuatorCommand::DragEnd { .. } => self.button_held = false,
            _ => {}
        }
        self.executed += 1;

        tracing::info!(
            op = command.action_name(),
            command = ?command,
            x = self.pointer.0,
            y = self.pointer.1,
            "Actuator command"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MouseButton;

    #[test]
    fn test_recording_shares_log_between_clones() {
        let recorder = RecordingActuator::new();
        let mut boxed: Box<dyn Actuator> = Box::new(recorder.clone());
        boxed.execute(&ActuatorCommand::Screenshot).unwrap();
        boxed.execute(&ActuatorCommand::Lock).unwrap();
        assert_eq!(
            recorder.commands(),
            vec![ActuatorCommand::Screenshot, ActuatorCommand::Lock]
        );
        assert_eq!(recorder.count("lock"), 1);
    }

    #[test]
    fn test_recording_fails_on_request() {
        let mut recorder = RecordingActuator::new();
        recorder.fail_on("click");
        let result = recorder.execute(&ActuatorCommand::Click {
            button: MouseButton::Left,
        });
        assert!(result.is_err());
        assert_eq!(recorder.count("click"), 1);

        recorder.clear_failures();
        assert!(recorder
            .execute(&ActuatorCommand::Click {
                button: MouseButton::Left,
            })
            .is_ok());
    }

    #[test]
    fn test_log_actuator_clamps_pointer() {
        let mut actuator = LogActuator::new(DisplayInfo::new(800, 600));
        assert_eq!(actuator.pointer(), (400, 300));
        actuator
            .execute(&ActuatorCommand::MoveRelative { dx: 1000, dy: -1000 })
            .unwrap();
        assert_eq!(actuator.pointer(), (799, 0));
        actuator
            .execute(&ActuatorCommand::DragStart {
                button: MouseButton::Left,
            })
            .unwrap();
        assert!(actuator.button_held());
        assert_eq!(actuator.executed(), 2);
    }
}
