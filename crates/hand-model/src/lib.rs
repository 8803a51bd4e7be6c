//! handctl Hand Model
//!
//! Defines the data contracts shared by every handctl stage:
//! - **Landmarks:** 21-point hand poses as produced by the pose estimator
//! - **Gestures:** The closed set of gesture symbols and their registry
//! - **Mapping:** Action identifiers, override tables, custom templates
//! - **Events:** Typed pipeline events and status snapshots
//!
//! Landmark coordinates are in frame-pixel space; `z` is relative depth.

pub mod event;
pub mod gesture;
pub mod landmark;
pub mod mapping;
pub mod synthetic;

pub use event::*;
pub use gesture::*;
pub use landmark::*;
pub use mapping::*;
