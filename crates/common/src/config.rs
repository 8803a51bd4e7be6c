//! Application configuration.
//!
//! Every section deserializes with `#[serde(default)]`, so a partial
//! settings file is merged over the defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HandctlError, HandctlResult};

/// Global application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Classification and debounce tuning.
    pub recognition: RecognitionConfig,

    /// Frame-to-display cursor mapping.
    pub cursor: CursorConfig,

    /// Action dispatch parameters.
    pub dispatch: DispatchConfig,

    /// Locations of the persisted mapping documents.
    pub files: DataFiles,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Thresholds consumed by the recognition stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Thumb-tip to index-tip distance (frame pixels) below which a pinch is seen.
    pub pinch_threshold: f64,

    /// Thumb-tip to index-tip distance (frame pixels) for the OK sign.
    pub ok_threshold: f64,

    /// Minimum hand-center speed (frame pixels per second) for a swipe.
    pub swipe_speed_threshold: f64,

    /// Seconds a symbol must persist before it is confirmed.
    pub hold_time_secs: f64,

    /// Whether raw landmarks are smoothed across frames.
    pub landmark_smoothing_enabled: bool,

    /// EMA weight of the current landmark sample, in `[0.0, 1.0]`.
    pub landmark_smoothing: f64,

    /// Number of (center, timestamp) samples kept for swipe detection.
    pub motion_window_capacity: usize,

    /// Length of the majority-vote confidence buffer.
    pub confidence_buffer_size: usize,

    /// When set, confirmed symbols whose confidence is below this value are
    /// not dispatched. `None` keeps the confidence score advisory.
    pub confidence_gate: Option<f64>,
}

/// Active zone and display geometry for cursor control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    /// Camera frame width in pixels.
    pub frame_width: u32,

    /// Camera frame height in pixels.
    pub frame_height: u32,

    /// Target display width in pixels.
    pub display_width: u32,

    /// Target display height in pixels.
    pub display_height: u32,

    /// Fraction of the frame trimmed from each side to form the active zone.
    pub active_zone_margin: f64,

    /// EMA weight of the current cursor sample, in `[0.0, 1.0]`.
    pub smoothing: f64,

    /// Absolute zone mapping or relative (trackpad-like) motion.
    pub mode: CursorMode,

    /// Relative mode: display pixels per frame pixel of hand motion.
    pub sensitivity: f64,

    /// Relative mode: extra gain applied to steps longer than 10 px.
    pub acceleration: f64,
}

/// How hand motion drives the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CursorMode {
    #[default]
    Absolute,
    Relative,
}

/// Whether a held gesture re-fires its action on every confirmed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPolicy {
    /// Dispatch on every frame while the hold stays confirmed.
    #[default]
    Continuous,
    /// Dispatch only on the frame the hold first becomes confirmed.
    OncePerHold,
}

/// Parameters for turning actions into actuator commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Wheel clicks per scroll action.
    pub scroll_amount: i32,

    /// Percentage points per volume action.
    pub volume_step: i32,

    /// Percentage points per brightness action.
    pub brightness_step: i32,

    /// Per-action repeat policy, keyed by action identifier.
    /// Actions not listed use [`RepeatPolicy::Continuous`].
    pub repeat_policy: BTreeMap<String, RepeatPolicy>,

    /// Maximum rate at which status snapshots are published (Hz).
    pub status_rate_hz: u32,
}

/// Persisted documents the core reads but never writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataFiles {
    /// Gesture-symbol to action-identifier overrides.
    pub mapping: PathBuf,

    /// Custom gesture templates.
    pub templates: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "handctl_pipeline=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            pinch_threshold: 30.0,
            ok_threshold: 40.0,
            swipe_speed_threshold: 500.0,
            hold_time_secs: 0.3,
            landmark_smoothing_enabled: true,
            landmark_smoothing: 0.5,
            motion_window_capacity: 10,
            confidence_buffer_size: 5,
            confidence_gate: None,
        }
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            frame_width: 640,
            frame_height: 480,
            display_width: 1920,
            display_height: 1080,
            active_zone_margin: 0.1,
            smoothing: 0.3,
            mode: CursorMode::Absolute,
            sensitivity: 1.5,
            acceleration: 1.2,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            scroll_amount: 5,
            volume_step: 10,
            brightness_step: 10,
            repeat_policy: BTreeMap::new(),
            status_rate_hz: 10,
        }
    }
}

impl DispatchConfig {
    /// Repeat policy for an action identifier.
    pub fn policy_for(&self, action: &str) -> RepeatPolicy {
        self.repeat_policy.get(action).copied().unwrap_or_default()
    }
}

impl Default for DataFiles {
    fn default() -> Self {
        let dir = config_dir();
        Self {
            mapping: dir.join("gestures.json"),
            templates: dir.join("custom_gestures.json"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load and validate config from an explicit path.
    pub fn load_from(path: &Path) -> HandctlResult<Self> {
        if !path.exists() {
            return Err(HandctlError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> HandctlResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject values the pipeline cannot operate with.
    pub fn validate(&self) -> HandctlResult<()> {
        let r = &self.recognition;
        let c = &self.cursor;

        if r.pinch_threshold < 0.0 || r.ok_threshold < 0.0 {
            return Err(HandctlError::config("shape thresholds must be non-negative"));
        }
        if r.swipe_speed_threshold < 0.0 {
            return Err(HandctlError::config(
                "swipe_speed_threshold must be non-negative",
            ));
        }
        if r.hold_time_secs < 0.0 {
            return Err(HandctlError::config("hold_time_secs must be non-negative"));
        }
        if !(0.0..=1.0).contains(&r.landmark_smoothing) || !(0.0..=1.0).contains(&c.smoothing) {
            return Err(HandctlError::config(
                "smoothing factors must lie in [0.0, 1.0]",
            ));
        }
        if r.motion_window_capacity < 2 {
            return Err(HandctlError::config(
                "motion_window_capacity must be at least 2",
            ));
        }
        if r.confidence_buffer_size == 0 {
            return Err(HandctlError::config(
                "confidence_buffer_size must be at least 1",
            ));
        }
        if let Some(gate) = r.confidence_gate {
            if !(0.0..=1.0).contains(&gate) {
                return Err(HandctlError::config("confidence_gate must lie in [0.0, 1.0]"));
            }
        }
        if !(0.0..0.5).contains(&c.active_zone_margin) {
            return Err(HandctlError::config(
                "active_zone_margin must lie in [0.0, 0.5)",
            ));
        }
        if c.sensitivity <= 0.0 || c.acceleration <= 0.0 {
            return Err(HandctlError::config(
                "cursor sensitivity and acceleration must be positive",
            ));
        }
        if c.frame_width == 0 || c.frame_height == 0 {
            return Err(HandctlError::config("frame dimensions must be non-zero"));
        }
        if c.display_width == 0 || c.display_height == 0 {
            return Err(HandctlError::config("display dimensions must be non-zero"));
        }
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Standard handctl config directory.
pub fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("handctl")
}
