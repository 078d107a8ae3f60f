//! Sync track device
//!
//! A [`Device`] owns every [`Track`] the demo has asked for. Tracks come from
//! one of two places:
//!
//! - **Files** (player mode): `{prefix}_{name}.track`, read once and then
//!   read-only for the session.
//! - **Editor** (client mode): keys arrive over the control channel and are
//!   applied as they come in; the editor can also pause, seek and ask the
//!   device to save everything to files.
//!
//! Track identity is a [`TrackHandle`]. Handles are never invalidated, and the
//! same name always yields the same handle.

mod editor;

#[cfg(test)]
mod tests;

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::time::Duration;

use afterglow_shared::{EditorCommand, Track, track_file};
use hashbrown::{HashMap, HashSet};

use crate::error::{Severity, StatusFlag, SyncError};
use editor::EditorLink;

/// Stable reference to a track inside a [`Device`].
///
/// The index doubles as the track id on the editor wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackHandle(u32);

impl TrackHandle {
    /// Handle that never resolves to a track; evaluates to zero.
    pub const DUMMY: Self = Self(u32::MAX);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Host hooks driven by editor commands.
///
/// The device calls these while processing [`Device::update`]; the host
/// decides what pausing or seeking means for its clock.
pub trait SyncCallbacks {
    /// Editor asked to pause (`true`) or resume (`false`)
    fn pause(&mut self, paused: bool);
    /// Editor moved its cursor to `row`
    fn set_row(&mut self, row: u32);
    /// Whether the demo is currently playing
    fn is_playing(&self) -> bool;
}

/// Collection of named tracks plus the optional editor connection.
#[derive(Debug)]
pub struct Device {
    prefix: String,
    tracks: Vec<Track>,
    by_name: HashMap<String, TrackHandle>,
    editor: Option<EditorLink>,
    /// Re-requested after a reconnect; old keys stay until the editor's
    /// first edit of the track
    stale: HashSet<TrackHandle>,
    /// Tracks are read from files (player mode)
    file_backed: bool,
    status: StatusFlag,
}

impl Device {
    /// Create an empty device whose track files live under `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_status(prefix, StatusFlag::new())
    }

    /// Create a device that reports data errors to `status`.
    pub fn with_status(prefix: impl Into<String>, status: StatusFlag) -> Self {
        Self {
            prefix: prefix.into(),
            tracks: Vec::new(),
            by_name: HashMap::new(),
            editor: None,
            stale: HashSet::new(),
            file_backed: false,
            status,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn is_connected(&self) -> bool {
        self.editor.is_some()
    }

    pub fn is_file_backed(&self) -> bool {
        self.file_backed
    }

    /// Return the handle for `name`, creating an empty track on first use.
    ///
    /// A new track is requested from the editor when connected, or read
    /// from its file when file-backed.
    pub fn get_track(&mut self, name: &str) -> TrackHandle {
        if let Some(&handle) = self.by_name.get(name) {
            return handle;
        }

        let handle = TrackHandle(self.tracks.len() as u32);
        self.tracks.push(Track::new(name));
        self.by_name.insert(name.to_string(), handle);
        tracing::debug!(track = name, index = handle.0, "Track created");

        if let Some(link) = self.editor.as_mut()
            && let Err(e) = link.request_track(name)
        {
            tracing::warn!("Lost editor while requesting '{}': {}", name, e);
            self.editor = None;
        }
        if self.file_backed {
            self.load_or_warn(handle);
        }

        handle
    }

    pub fn track(&self, handle: TrackHandle) -> Option<&Track> {
        self.tracks.get(handle.index())
    }

    /// Evaluate a track at `row`. Unknown handles evaluate to zero.
    pub fn value(&self, handle: TrackHandle, row: f64) -> f32 {
        self.track(handle).map_or(0.0, |track| track.evaluate(row))
    }

    /// Try to attach to an editor at `addr`.
    ///
    /// Failure is the normal "no editor running" case: it is logged and
    /// reported as `false`, never as an error.
    pub fn connect(&mut self, addr: &str, timeout: Duration) -> bool {
        match EditorLink::connect(addr, timeout) {
            Ok(link) => {
                tracing::info!("Connected to editor at {}", link.peer());
                self.editor = Some(link);
                self.file_backed = false;
                match self.request_all() {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!("Editor dropped during track requests: {}", e);
                        self.editor = None;
                        false
                    }
                }
            }
            Err(e) => {
                tracing::info!("No editor at {}: {}", addr, e);
                false
            }
        }
    }

    /// Exchange pending data with the editor.
    ///
    /// Applies key edits, forwards pause/seek commands to `callbacks`, and
    /// reports `row` back while playing. Returns `false` when no editor is
    /// attached or the connection was lost; file-backed devices always
    /// return `true`.
    pub fn update(&mut self, row: u32, callbacks: &mut dyn SyncCallbacks) -> bool {
        if self.file_backed {
            return true;
        }
        match self.exchange(row, callbacks) {
            Ok(attached) => attached,
            Err(e) => {
                tracing::warn!("Editor connection lost: {}", e);
                self.editor = None;
                false
            }
        }
    }

    fn exchange(&mut self, row: u32, callbacks: &mut dyn SyncCallbacks) -> Result<bool, SyncError> {
        let Some(link) = self.editor.as_mut() else {
            return Ok(false);
        };
        let commands = link.poll()?;

        for command in commands {
            self.apply(command, callbacks);
        }

        if callbacks.is_playing()
            && let Some(link) = self.editor.as_mut()
        {
            link.send_row(row)?;
        }
        Ok(self.editor.is_some())
    }

    fn apply(&mut self, command: EditorCommand, callbacks: &mut dyn SyncCallbacks) {
        match command {
            EditorCommand::SetKey { track, key } => match self.fresh_track(track) {
                Some(t) => t.set_key(key),
                None => tracing::warn!("{}", SyncError::UnknownTrack(track)),
            },
            EditorCommand::DeleteKey { track, row } => match self.fresh_track(track) {
                Some(t) => {
                    t.delete_key(f64::from(row));
                }
                None => tracing::warn!("{}", SyncError::UnknownTrack(track)),
            },
            EditorCommand::SetRow(row) => callbacks.set_row(row),
            EditorCommand::Pause(paused) => callbacks.pause(paused),
            EditorCommand::SaveTracks => match self.save_tracks() {
                Ok(count) => tracing::info!("Saved {} tracks under '{}'", count, self.prefix),
                Err(e) => tracing::error!("Saving tracks failed: {}", e),
            },
        }
    }

    /// Track `id` for an editor edit. A stale track drops its old keys
    /// first, since the editor resends all of them.
    fn fresh_track(&mut self, id: u32) -> Option<&mut Track> {
        let track = self.tracks.get_mut(id as usize)?;
        if self.stale.remove(&TrackHandle(id)) {
            track.clear();
        }
        Some(track)
    }

    fn request_all(&mut self) -> Result<(), SyncError> {
        let Some(link) = self.editor.as_mut() else {
            return Ok(());
        };
        for (i, track) in self.tracks.iter().enumerate() {
            if !track.is_empty() {
                self.stale.insert(TrackHandle(i as u32));
            }
            link.request_track(track.name())?;
        }
        Ok(())
    }

    /// Switch to file-backed mode and read every known track.
    ///
    /// Returns how many tracks had a file. Tracks requested later are read
    /// as they are created.
    pub fn load_tracks(&mut self) -> usize {
        self.file_backed = true;
        self.editor = None;
        self.stale.clear();
        (0..self.tracks.len() as u32)
            .filter(|&i| self.load_or_warn(TrackHandle(i)))
            .count()
    }

    fn load_or_warn(&mut self, handle: TrackHandle) -> bool {
        let name = self.tracks[handle.index()].name().to_string();
        match self.load_track_file(handle) {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!("Track '{}' has no file under '{}', using zero", name, self.prefix);
                false
            }
            Err(e) => {
                self.status.report(
                    Severity::Limited,
                    format!("Track '{}' could not be read, using zero: {}", name, e),
                );
                false
            }
        }
    }

    /// Read one track from its file. `Ok(false)` means there is no file.
    pub fn load_track_file(&mut self, handle: TrackHandle) -> Result<bool, SyncError> {
        let Some(track) = self.tracks.get_mut(handle.index()) else {
            return Ok(false);
        };
        let path = track_file::track_path(&self.prefix, track.name());
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        let (loaded, replaced) =
            track_file::read_track_checked(track.name(), BufReader::new(file))?;
        tracing::debug!(track = track.name(), keys = loaded.len(), "Track loaded");
        if !replaced.is_empty() {
            self.status.report(
                Severity::Limited,
                format!(
                    "Track '{}' has unknown interpolation at rows {:?}, using step",
                    loaded.name(),
                    replaced
                ),
            );
        }
        *track = loaded;
        Ok(true)
    }

    /// Write every track to `{prefix}_{name}.track`. Returns the count written.
    pub fn save_tracks(&self) -> Result<usize, SyncError> {
        for track in &self.tracks {
            let path = track_file::track_path(&self.prefix, track.name());
            let file = File::create(&path)?;
            track_file::write_track(track, BufWriter::new(file))?;
        }
        Ok(self.tracks.len())
    }
}
