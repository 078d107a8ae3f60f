//! Shared types for the Afterglow demo.
//!
//! Everything in this crate is plain data plus the byte formats that move it
//! around. Nothing here owns a socket, a thread or a clock.
//!
//! - [`track`] - keyframe curves evaluated at a fractional row
//! - [`track_file`] - one-file-per-track persistence (`{prefix}_{name}.track`)
//! - [`protocol`] - editor control channel messages
//! - [`light_packet`] - light color packet sent to stage hardware

pub mod light_packet;
pub mod protocol;
pub mod track;
pub mod track_file;

pub use light_packet::{LightRecord, PacketError, encode_light_packet};
pub use protocol::{ClientMessage, EditorCommand, ProtocolError};
pub use track::{Interpolation, Key, Track};
pub use track_file::{
    TrackFileError, read_track, read_track_checked, track_path, write_track,
};
