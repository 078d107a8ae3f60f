//! Afterglow Core - time synchronization and scene sequencing
//!
//! This crate turns a monotonically increasing playback clock into the values
//! a demo needs every frame: which scene is active, how far into it we are,
//! and the current value of every named sync track.
//!
//! # Architecture
//!
//! - [`Clock`] - pausable wall-clock accumulator
//! - [`Device`] - owns the tracks, loads them from disk or receives them live
//!   from an attached editor
//! - [`SyncSystem`] - the playback state machine that ties clock and device
//!   together and publishes scene/frame cursors
//! - [`scene`] - per-frame consumers: scene dispatch, reveal math, camera
//!   frames, light colors, uniform providers
//! - [`broadcast`] - background thread publishing light colors to stage
//!   hardware

pub mod broadcast;
pub mod clock;
pub mod config;
pub mod device;
pub mod error;
pub mod scene;
pub mod sync;
#[cfg(test)]
pub mod test_utils;

pub use broadcast::LightBroadcaster;
pub use clock::{Clock, SystemTimeSource, TimeSource};
pub use config::{BroadcastConfig, SyncConfig};
pub use device::{Device, SyncCallbacks, TrackHandle};
pub use error::{Severity, StatusFlag, SyncError};
pub use sync::{Mode, PlaybackState, SceneCursor, SyncSystem, Timing};

// Re-export the track model so hosts only need one dependency
pub use afterglow_shared::{Interpolation, Key, Track};
