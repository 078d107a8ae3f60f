//! Playback state machine
//!
//! [`SyncSystem`] owns the [`Clock`] and the optional [`Device`] and turns them
//! into the per-frame cursors the demo reads:
//!
//! - `row`: musical position derived from elapsed seconds
//! - `scene`: integer scene index plus progress, split from the scene track
//! - `frame`: integer camera frame plus progress, split from the frame track
//!
//! The [`Mode`] is decided once by [`SyncSystem::start`]:
//!
//! | Outcome                      | Mode     | Initial state |
//! |------------------------------|----------|---------------|
//! | no file prefix               | `Manual` | `Running`     |
//! | editor answered              | `Client` | `Paused`      |
//! | no editor, tracks from files | `Player` | `Running`     |
//!
//! Running past the song length finishes a `Player` run for good; the other
//! modes pause so the user can restart.


use std::time::Duration;

use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::device::{Device, SyncCallbacks, TrackHandle};
use crate::error::{Severity, StatusFlag};

/// Where track data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Live editor attached
    Client,
    /// Standalone playback from track files
    Player,
    /// No track data; scenes stepped by user input
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Paused,
    Running,
    /// Terminal until [`SyncSystem::restart`]
    Finished,
}

/// Tempo parameters for converting between seconds and rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub bpm: f64,
    pub rows_per_beat: f64,
}

impl Timing {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            bpm: f64::from(config.bpm),
            rows_per_beat: f64::from(config.rows_per_beat),
        }
    }

    /// Fractional row reached after `seconds` of playback
    pub fn rows_at(&self, seconds: f64) -> f64 {
        let minutes = seconds / 60.0;
        let beats = self.bpm * minutes;
        self.rows_per_beat * beats
    }

    /// Playback seconds at which `row` is reached
    pub fn seconds_at(&self, row: f64) -> f64 {
        row / self.rows_per_beat / self.bpm * 60.0
    }
}

/// Integer index plus fractional progress split from one track sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SceneCursor {
    pub index: i32,
    pub progress: f32,
}

impl SceneCursor {
    /// Split `value` into `floor(value)` and the remainder.
    ///
    /// Progress is always in `[0, 1)`. Non-finite samples map to scene zero.
    pub fn from_value(value: f32) -> Self {
        if !value.is_finite() {
            return Self::default();
        }
        let floor = value.floor();
        let mut cursor = Self {
            index: floor as i32,
            progress: value - floor,
        };
        // Tiny negative values round the remainder up to exactly 1.0
        if cursor.progress >= 1.0 {
            cursor.index += 1;
            cursor.progress = 0.0;
        }
        cursor
    }
}

/// Editor transport requests collected during one device update.
struct TransportHooks {
    playing: bool,
    pause: Option<bool>,
    seek: Option<u32>,
}

impl SyncCallbacks for TransportHooks {
    fn pause(&mut self, paused: bool) {
        self.pause = Some(paused);
    }

    fn set_row(&mut self, row: u32) {
        self.seek = Some(row);
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

/// The demo's time source and track front end. One per run.
#[derive(Debug)]
pub struct SyncSystem {
    config: SyncConfig,
    timing: Timing,
    mode: Mode,
    state: PlaybackState,
    clock: Clock,
    device: Option<Device>,
    scene_track: TrackHandle,
    frame_track: TrackHandle,
    row: f64,
    scene: SceneCursor,
    frame: SceneCursor,
    /// Last update lost the editor; try to attach again next tick
    reconnect_pending: bool,
    status: StatusFlag,
}

impl SyncSystem {
    pub fn new(config: SyncConfig) -> Self {
        Self::with_clock(config, Clock::new())
    }

    /// Create a system driven by `clock`. Invalid config values are replaced
    /// with defaults and logged.
    pub fn with_clock(mut config: SyncConfig, clock: Clock) -> Self {
        for warning in config.validate() {
            tracing::warn!("{}", warning);
        }
        Self {
            timing: Timing::from_config(&config),
            config,
            mode: Mode::Manual,
            state: PlaybackState::Paused,
            clock,
            device: None,
            scene_track: TrackHandle::DUMMY,
            frame_track: TrackHandle::DUMMY,
            row: 0.0,
            scene: SceneCursor::default(),
            frame: SceneCursor::default(),
            reconnect_pending: false,
            status: StatusFlag::new(),
        }
    }

    /// Decide the mode and begin playback.
    ///
    /// `None` selects manual mode. Otherwise an editor is tried first and
    /// track files under `file_prefix` are the fallback.
    pub fn start(&mut self, file_prefix: Option<&str>) -> Mode {
        self.row = 0.0;
        self.reconnect_pending = false;

        let Some(prefix) = file_prefix else {
            self.mode = Mode::Manual;
            self.device = None;
            self.clock.restart();
            self.state = PlaybackState::Running;
            tracing::info!("No sync data requested, scenes are under manual control");
            return self.mode;
        };

        let mut device = Device::with_status(prefix, self.status.clone());
        self.scene_track = device.get_track(&self.config.scene_track);
        self.frame_track = device.get_track(&self.config.frame_track);

        let timeout = self.connect_timeout();
        if device.connect(&self.config.editor_address, timeout) {
            self.mode = Mode::Client;
            self.clock.stop();
            self.clock.set_elapsed(Duration::ZERO);
            self.state = PlaybackState::Paused;
            tracing::info!("Client mode: waiting for the editor to start playback");
        } else {
            let loaded = device.load_tracks();
            self.mode = Mode::Player;
            self.clock.restart();
            self.state = PlaybackState::Running;
            tracing::info!(loaded, prefix, "Player mode: playing from track files");

            let scene_empty = device.track(self.scene_track).is_none_or(|t| t.is_empty());
            if scene_empty && self.config.require_sync {
                self.status.report(
                    Severity::Critical,
                    format!(
                        "No editor at {} and no data for track '{}' under '{}'",
                        self.config.editor_address, self.config.scene_track, prefix
                    ),
                );
            }
        }

        self.device = Some(device);
        self.resolve_scene_state();
        self.mode
    }

    /// Advance one frame: sample the clock, talk to the device, refresh the
    /// scene and frame cursors.
    pub fn sync(&mut self) {
        if self.state == PlaybackState::Running {
            let seconds = self.clock.elapsed_seconds();
            self.row = self.timing.rows_at(seconds);

            if seconds > self.config.song_length_seconds {
                self.clock.stop();
                self.state = match self.mode {
                    Mode::Player => PlaybackState::Finished,
                    Mode::Client | Mode::Manual => PlaybackState::Paused,
                };
                tracing::info!(seconds, state = ?self.state, "Reached end of song");
            }
        }

        if self.mode != Mode::Manual {
            self.update_device();
        }
        self.resolve_scene_state();
    }

    fn update_device(&mut self) {
        let timeout = self.connect_timeout();
        let Some(device) = self.device.as_mut() else {
            return;
        };
        let mut hooks = TransportHooks {
            playing: self.state == PlaybackState::Running,
            pause: None,
            seek: None,
        };

        if self.reconnect_pending {
            if device.connect(&self.config.editor_address, timeout) {
                self.reconnect_pending = false;
                tracing::info!("Editor reattached");
            }
        } else if !device.update(self.row.floor() as u32, &mut hooks) && self.mode == Mode::Client {
            self.reconnect_pending = true;
            tracing::warn!("Editor lost, holding last track values and retrying");
        }

        match hooks.pause {
            Some(true) => self.pause(),
            Some(false) => self.run(),
            None => {}
        }
        if let Some(row) = hooks.seek {
            self.seek(f64::from(row));
        }
    }

    /// Single place where the public scene and frame cursors are written.
    fn resolve_scene_state(&mut self) {
        match self.mode {
            // Driven by the manual controls
            Mode::Manual => {}
            Mode::Client | Mode::Player => {
                let Some(device) = self.device.as_ref() else {
                    return;
                };
                self.scene = SceneCursor::from_value(device.value(self.scene_track, self.row));
                self.frame = SceneCursor::from_value(device.value(self.frame_track, self.row));
            }
        }
    }

    fn seek(&mut self, row: f64) {
        let seconds = self.timing.seconds_at(row);
        self.clock
            .set_elapsed(Duration::try_from_secs_f64(seconds).unwrap_or_default());
        self.row = row;
        tracing::debug!(row, seconds, "Seek");
    }

    fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.config.connect_timeout_ms)
    }

    // ========================================================================
    // Playback control
    // ========================================================================

    /// Resume from `Paused`. A finished run needs [`Self::restart`].
    pub fn run(&mut self) {
        if self.state == PlaybackState::Paused {
            self.clock.start();
            self.state = PlaybackState::Running;
            tracing::debug!(row = self.row, "Running");
        }
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Running {
            self.clock.stop();
            self.state = PlaybackState::Paused;
            tracing::debug!(row = self.row, "Paused");
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            PlaybackState::Running => self.pause(),
            PlaybackState::Paused => self.run(),
            PlaybackState::Finished => {}
        }
    }

    /// Rewind to row zero and run, from any state.
    pub fn restart(&mut self) {
        self.clock.restart();
        self.row = 0.0;
        self.state = PlaybackState::Running;
        self.resolve_scene_state();
        tracing::info!("Restarted");
    }

    /// Halt the clock. The current row and cursors are kept.
    pub fn stop(&mut self) {
        self.clock.stop();
        if self.state == PlaybackState::Running {
            self.state = PlaybackState::Paused;
        }
    }

    /// Stop playback and release the device and editor link.
    pub fn clean_and_exit(mut self) {
        self.stop();
        let tracks = self.device.as_ref().map_or(0, Device::len);
        tracing::info!(
            mode = ?self.mode,
            row = self.row,
            seconds = self.clock.elapsed_seconds(),
            tracks,
            "Sync shut down"
        );
    }

    // ========================================================================
    // Manual scene control
    // ========================================================================

    /// Step scene progress forward by the configured rate, up to 1.
    pub fn advance_scene_progress(&mut self) {
        if self.manual_only("advance_scene_progress") {
            let rate = self.config.manual_scene_advance_rate;
            self.scene.progress = (self.scene.progress + rate).clamp(0.0, 1.0);
        }
    }

    /// Step scene progress back by the configured rate, down to 0.
    pub fn retreat_scene_progress(&mut self) {
        if self.manual_only("retreat_scene_progress") {
            let rate = self.config.manual_scene_advance_rate;
            self.scene.progress = (self.scene.progress - rate).clamp(0.0, 1.0);
        }
    }

    pub fn change_to_next_scene(&mut self) {
        if self.manual_only("change_to_next_scene") {
            self.scene = SceneCursor {
                index: self.scene.index.saturating_add(1),
                progress: 0.0,
            };
            tracing::debug!(scene = self.scene.index, "Next scene");
        }
    }

    pub fn change_to_prev_scene(&mut self) {
        if self.manual_only("change_to_prev_scene") {
            self.scene = SceneCursor {
                index: (self.scene.index - 1).max(0),
                progress: 0.0,
            };
            tracing::debug!(scene = self.scene.index, "Previous scene");
        }
    }

    fn manual_only(&self, action: &str) -> bool {
        if self.mode != Mode::Manual {
            tracing::debug!(mode = ?self.mode, "Ignoring {} outside manual mode", action);
            return false;
        }
        true
    }

    // ========================================================================
    // Track access
    // ========================================================================

    /// Register `name` and return its handle.
    ///
    /// Without a device (manual mode, or before [`Self::start`]) every name
    /// resolves to [`TrackHandle::DUMMY`], which evaluates to zero.
    pub fn track(&mut self, name: &str) -> TrackHandle {
        match self.device.as_mut() {
            Some(device) => device.get_track(name),
            None => {
                tracing::debug!(track = name, "No track data, using zero");
                TrackHandle::DUMMY
            }
        }
    }

    /// Value of `handle` at the current row
    pub fn value(&self, handle: TrackHandle) -> f32 {
        self.device
            .as_ref()
            .map_or(0.0, |device| device.value(handle, self.row))
    }

    /// Register-and-evaluate shorthand for one-off lookups.
    pub fn track_value(&mut self, name: &str) -> f32 {
        let handle = self.track(name);
        self.value(handle)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PlaybackState::Running
    }

    pub fn row(&self) -> f64 {
        self.row
    }

    pub fn scene(&self) -> SceneCursor {
        self.scene
    }

    pub fn frame(&self) -> SceneCursor {
        self.frame
    }

    pub fn scene_index(&self) -> i32 {
        self.scene.index
    }

    pub fn scene_progress(&self) -> f32 {
        self.scene.progress
    }

    pub fn frame_index(&self) -> i32 {
        self.frame.index
    }

    pub fn frame_progress(&self) -> f32 {
        self.frame.progress
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.clock.elapsed_seconds()
    }

    pub fn is_reconnecting(&self) -> bool {
        self.reconnect_pending
    }

    /// Shared critical-error flag; clone it to observe from elsewhere.
    pub fn status(&self) -> &StatusFlag {
        &self.status
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn device(&self) -> Option<&Device> {
        self.device.as_ref()
    }
}
