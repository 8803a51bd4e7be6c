//! Non-blocking actuator wrapper.
//!
//! OS automation calls can take tens of milliseconds. [`QueuedActuator`]
//! moves them onto a dedicated thread so the frame loop only ever pays for a
//! channel send.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;

use handctl_common::error::{HandctlError, HandctlResult};

use crate::{Actuator, ActuatorCommand};

/// Commands that may wait for the worker before new ones are refused.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Runs an inner actuator on its own thread, fed by a bounded channel.
///
/// Commands execute in submission order. Errors from the inner actuator are
/// logged on the worker thread and counted; they are not reported back to
/// the caller. When the queue is full, pointer moves are dropped (a later
/// move supersedes them) and any other command is refused with an error.
/// Dropping the wrapper drains the queue and joins the thread.
pub struct QueuedActuator {
    name: String,
    sender: Option<mpsc::SyncSender<ActuatorCommand>>,
    worker: Option<JoinHandle<()>>,
    failures: Arc<AtomicU64>,
    dropped: u64,
}

impl QueuedActuator {
    pub fn spawn<A: Actuator + 'static>(inner: A) -> HandctlResult<Self> {
        Self::with_capacity(inner, DEFAULT_QUEUE_CAPACITY)
    }

    /// A capacity of 0 is raised to 1.
    pub fn with_capacity<A: Actuator + 'static>(
        mut inner: A,
        capacity: usize,
    ) -> HandctlResult<Self> {
        let name = format!("queued({})", inner.name());
        let (sender, receiver) = mpsc::sync_channel::<ActuatorCommand>(capacity.max(1));
        let failures = Arc::new(AtomicU64::new(0));
        let worker_failures = failures.clone();

        let worker = std::thread::Builder::new()
            .name("handctl-actuator".to_string())
            .spawn(move || {
                while let Ok(command) = receiver.recv() {
                    if let Err(e) = inner.execute(&command) {
                        worker_failures.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(
                            actuator = %inner.name(),
                            op = command.action_name(),
                            error = %e,
                            "Queued actuator command failed"
                        );
                    }
                }
                tracing::debug!(actuator = %inner.name(), "Actuator worker drained");
            })
            .map_err(|e| HandctlError::actuator(format!("Failed to spawn actuator thread: {e}")))?;

        Ok(Self {
            name,
            sender: Some(sender),
            worker: Some(worker),
            failures,
            dropped: 0,
        })
    }

    /// Number of commands the inner actuator rejected so far.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Number of commands discarded or refused because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Actuator for QueuedActuator {
    fn execute(&mut self, command: &ActuatorCommand) -> HandctlResult<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| HandctlError::actuator("actuator queue closed"))?;
        match sender.try_send(command.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(command)) => {
                self.dropped += 1;
                tracing::warn!(
                    actuator = %self.name,
                    op = command.action_name(),
                    dropped = self.dropped,
                    "Actuator queue full, command dropped"
                );
                match command {
                    ActuatorCommand::MoveAbsolute { .. } | ActuatorCommand::MoveRelative { .. } => {
                        Ok(())
                    }
                    _ => Err(HandctlError::actuator("actuator queue full")),
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                Err(HandctlError::actuator("actuator worker exited"))
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for QueuedActuator {
    fn drop(&mut self) {
        // Closing the sender ends the worker loop once the queue is empty.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!(actuator = %self.name, "Actuator worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordingActuator;

    #[test]
    fn test_commands_run_in_order_and_drain_on_drop() {
        let recorder = RecordingActuator::new();
        let mut queued = QueuedActuator::spawn(recorder.clone()).unwrap();
        assert_eq!(queued.name(), "queued(recording)");

        for delta in [1, 2, 3] {
            queued
                .execute(&ActuatorCommand::AdjustVolume { delta })
                .unwrap();
        }
        drop(queued);

        assert_eq!(
            recorder.commands(),
            vec![
                ActuatorCommand::AdjustVolume { delta: 1 },
                ActuatorCommand::AdjustVolume { delta: 2 },
                ActuatorCommand::AdjustVolume { delta: 3 },
            ]
        );
    }

    /// Holds every command until the test lets it through.
    struct GatedActuator {
        gate: mpsc::Receiver<()>,
        inner: RecordingActuator,
    }

    impl Actuator for GatedActuator {
        fn execute(&mut self, command: &ActuatorCommand) -> HandctlResult<()> {
            // A closed gate lets everything through.
            let _ = self.gate.recv();
            self.inner.execute(command)
        }

        fn name(&self) -> &str {
            "gated"
        }
    }

    #[test]
    fn test_stalled_worker_keeps_backlog_bounded() {
        let recorder = RecordingActuator::new();
        let (open, gate) = mpsc::channel();
        let mut queued = QueuedActuator::with_capacity(
            GatedActuator {
                gate,
                inner: recorder.clone(),
            },
            4,
        )
        .unwrap();

        for x in 0..100 {
            assert!(queued
                .execute(&ActuatorCommand::MoveAbsolute { x, y: 0 })
                .is_ok());
        }
        // Four queued, plus at most one already taken by the stalled worker.
        let accepted = 100 - queued.dropped();
        assert!((4..=5).contains(&accepted), "accepted {accepted}");

        assert!(queued.execute(&ActuatorCommand::Screenshot).is_err());
        assert_eq!(queued.dropped(), 100 - accepted + 1);

        drop(open);
        drop(queued);
        assert_eq!(recorder.count("move_absolute") as u64, accepted);
        assert_eq!(recorder.count("screenshot"), 0);
    }

    #[test]
    fn test_inner_failures_do_not_reach_caller() {
        let recorder = RecordingActuator::new();
        recorder.fail_on("screenshot");
        let mut queued = QueuedActuator::spawn(recorder.clone()).unwrap();

        assert!(queued.execute(&ActuatorCommand::Screenshot).is_ok());
        assert!(queued.execute(&ActuatorCommand::Lock).is_ok());
        drop(queued);

        assert_eq!(recorder.count("lock"), 1);
    }
}
