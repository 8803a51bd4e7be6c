//! Cross-thread handle to a running pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use handctl_common::config::AppConfig;
use handctl_common::error::HandctlResult;
use handctl_hand_model::event::{PipelineEvent, PipelineStatus};
use handctl_hand_model::mapping::MappingSnapshot;
use tokio::sync::{broadcast, watch};

/// Capacity of the event broadcast channel. Slow subscribers lag and skip.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Cheap, cloneable control surface.
///
/// Flags are cooperative: the worker polls them once per frame. Config and
/// mapping updates are whole snapshots, swapped in by the worker on its next
/// tick; the worker never sees a half-applied update.
#[derive(Clone)]
pub struct PipelineControl {
    stop_flag: Arc<AtomicBool>,
    pause_flag: Arc<AtomicBool>,
    config_tx: Arc<watch::Sender<Arc<AppConfig>>>,
    mapping_tx: Arc<watch::Sender<Arc<MappingSnapshot>>>,
    events: broadcast::Sender<PipelineEvent>,
    status: watch::Receiver<PipelineStatus>,
}

/// Receiving ends held by the worker.
pub(crate) struct WorkerChannels {
    pub config_rx: watch::Receiver<Arc<AppConfig>>,
    pub mapping_rx: watch::Receiver<Arc<MappingSnapshot>>,
    pub status_tx: watch::Sender<PipelineStatus>,
}

impl PipelineControl {
    pub(crate) fn new(
        config: Arc<AppConfig>,
        mapping: Arc<MappingSnapshot>,
    ) -> (Self, WorkerChannels) {
        let (config_tx, config_rx) = watch::channel(config);
        let (mapping_tx, mapping_rx) = watch::channel(mapping);
        let (status_tx, status_rx) = watch::channel(PipelineStatus::default());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        (
            Self {
                stop_flag: Arc::new(AtomicBool::new(false)),
                pause_flag: Arc::new(AtomicBool::new(false)),
                config_tx: Arc::new(config_tx),
                mapping_tx: Arc::new(mapping_tx),
                events,
                status: status_rx,
            },
            WorkerChannels {
                config_rx,
                mapping_rx,
                status_tx,
            },
        )
    }

    /// Ask the worker to finish after the current frame.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::SeqCst)
    }

    pub fn pause(&self) {
        self.pause_flag.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.pause_flag.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.pause_flag.load(Ordering::SeqCst)
    }

    /// Get the stop flag for external coordination (signal handlers).
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Validate and publish a new configuration snapshot.
    pub fn update_config(&self, config: AppConfig) -> HandctlResult<()> {
        config.validate()?;
        self.config_tx.send_replace(Arc::new(config));
        Ok(())
    }

    /// Publish a new mapping snapshot. This is the "mapping changed" signal.
    pub fn update_mapping(&self, mapping: MappingSnapshot) {
        self.mapping_tx.send_replace(Arc::new(mapping));
    }

    pub fn config(&self) -> Arc<AppConfig> {
        self.config_tx.borrow().clone()
    }

    pub fn mapping(&self) -> Arc<MappingSnapshot> {
        self.mapping_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    /// Latest complete status snapshot.
    pub fn status(&self) -> PipelineStatus {
        self.status.borrow().clone()
    }

    /// Receiver that can `await` status changes.
    pub fn status_receiver(&self) -> watch::Receiver<PipelineStatus> {
        self.status.clone()
    }

    pub(crate) fn publish(&self, event: PipelineEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl std::fmt::Debug for PipelineControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineControl")
            .field("stopped", &self.is_stopped())
            .field("paused", &self.is_paused())
            .finish()
    }
}
