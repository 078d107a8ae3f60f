//! Editor control channel protocol
//!
//! The demo connects to a track editor over TCP. After a fixed text
//! handshake both sides exchange one-byte command ids followed by big-endian
//! payloads:
//!
//! | id | name        | direction       | payload                                  |
//! |----|-------------|-----------------|------------------------------------------|
//! | 0  | SET_KEY     | editor → demo   | u32 track, u32 row, f32 value, u8 interp |
//! | 1  | DELETE_KEY  | editor → demo   | u32 track, u32 row                       |
//! | 2  | GET_TRACK   | demo → editor   | u32 name length, name bytes              |
//! | 3  | SET_ROW     | both            | u32 row                                  |
//! | 4  | PAUSE       | editor → demo   | u8 flag (1 = paused)                     |
//! | 5  | SAVE_TRACKS | editor → demo   | -                                        |
//!
//! Track ids in editor messages are the order in which the demo asked for
//! tracks with GET_TRACK.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

use crate::track::{Interpolation, Key};

/// Sent by the demo right after connecting
pub const CLIENT_GREETING: &[u8] = b"hello, synctracker!";
/// Expected reply from the editor
pub const SERVER_GREETING: &[u8] = b"hello, demo!";

/// Default editor port
pub const DEFAULT_EDITOR_PORT: u16 = 1338;

const SET_KEY: u8 = 0;
const DELETE_KEY: u8 = 1;
const GET_TRACK: u8 = 2;
const SET_ROW: u8 = 3;
const PAUSE: u8 = 4;
const SAVE_TRACKS: u8 = 5;

/// Longest track name accepted in a GET_TRACK request
const MAX_NAME_LEN: u32 = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("unknown command id {0}")]
    UnknownCommand(u8),
    #[error("editor greeting mismatch")]
    BadGreeting,
    #[error("track name of {0} bytes exceeds the limit")]
    NameTooLong(u32),
    #[error("track name is not valid UTF-8")]
    InvalidName,
}

/// Commands the editor sends to the demo.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    SetKey { track: u32, key: Key },
    DeleteKey { track: u32, row: u32 },
    SetRow(u32),
    Pause(bool),
    SaveTracks,
}

impl EditorCommand {
    /// Decode one command from the front of `buf`.
    ///
    /// Returns `Ok(None)` when `buf` holds only part of a command, otherwise
    /// the command and the number of bytes it used.
    pub fn decode(buf: &[u8]) -> Result<Option<(Self, usize)>, ProtocolError> {
        let Some(&id) = buf.first() else {
            return Ok(None);
        };
        let payload_len = match id {
            SET_KEY => 13,
            DELETE_KEY => 8,
            SET_ROW => 4,
            PAUSE => 1,
            SAVE_TRACKS => 0,
            other => return Err(ProtocolError::UnknownCommand(other)),
        };
        if buf.len() < 1 + payload_len {
            return Ok(None);
        }

        let mut payload = &buf[1..1 + payload_len];
        let command = match id {
            SET_KEY => {
                let track = read_u32(&mut payload);
                let row = read_u32(&mut payload);
                let value = f32::from_bits(read_u32(&mut payload));
                let kind = payload.read_u8().unwrap_or_default();
                let interpolation = Interpolation::from_u8(kind).unwrap_or_else(|| {
                    tracing::warn!(track, row, kind, "Editor sent unknown interpolation");
                    Interpolation::Step
                });
                Self::SetKey {
                    track,
                    key: Key::new(f64::from(row), value, interpolation),
                }
            }
            DELETE_KEY => Self::DeleteKey {
                track: read_u32(&mut payload),
                row: read_u32(&mut payload),
            },
            SET_ROW => Self::SetRow(read_u32(&mut payload)),
            PAUSE => Self::Pause(payload.read_u8().unwrap_or_default() != 0),
            _ => Self::SaveTracks,
        };

        Ok(Some((command, 1 + payload_len)))
    }

    /// Append the wire form of this command to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Self::SetKey { track, key } => {
                out.push(SET_KEY);
                write_u32(out, *track);
                write_u32(out, key.row.max(0.0).round() as u32);
                write_u32(out, key.value.to_bits());
                out.push(key.interpolation.as_u8());
            }
            Self::DeleteKey { track, row } => {
                out.push(DELETE_KEY);
                write_u32(out, *track);
                write_u32(out, *row);
            }
            Self::SetRow(row) => {
                out.push(SET_ROW);
                write_u32(out, *row);
            }
            Self::Pause(paused) => {
                out.push(PAUSE);
                out.push(u8::from(*paused));
            }
            Self::SaveTracks => out.push(SAVE_TRACKS),
        }
    }
}

/// Messages the demo sends to the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    GetTrack(String),
    SetRow(u32),
}

impl ClientMessage {
    /// Append the wire form of this message to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Self::GetTrack(name) => {
                out.push(GET_TRACK);
                write_u32(out, name.len() as u32);
                out.extend_from_slice(name.as_bytes());
            }
            Self::SetRow(row) => {
                out.push(SET_ROW);
                write_u32(out, *row);
            }
        }
    }

    /// Decode one message from the front of `buf` (editor side).
    pub fn decode(buf: &[u8]) -> Result<Option<(Self, usize)>, ProtocolError> {
        let Some(&id) = buf.first() else {
            return Ok(None);
        };
        if buf.len() < 5 {
            return match id {
                GET_TRACK | SET_ROW => Ok(None),
                other => Err(ProtocolError::UnknownCommand(other)),
            };
        }

        let value = read_u32(&mut &buf[1..5]);
        match id {
            SET_ROW => Ok(Some((Self::SetRow(value), 5))),
            GET_TRACK => {
                if value > MAX_NAME_LEN {
                    return Err(ProtocolError::NameTooLong(value));
                }
                let end = 5 + value as usize;
                if buf.len() < end {
                    return Ok(None);
                }
                let name = std::str::from_utf8(&buf[5..end])
                    .map_err(|_| ProtocolError::InvalidName)?;
                Ok(Some((Self::GetTrack(name.to_string()), end)))
            }
            other => Err(ProtocolError::UnknownCommand(other)),
        }
    }
}

/// Check the editor's handshake reply.
pub fn check_server_greeting(reply: &[u8]) -> Result<(), ProtocolError> {
    if reply == SERVER_GREETING {
        Ok(())
    } else {
        Err(ProtocolError::BadGreeting)
    }
}

// Callers check lengths before reading, so a short read cannot happen.
fn read_u32(payload: &mut &[u8]) -> u32 {
    payload.read_u32::<BigEndian>().unwrap_or_default()
}

fn write_u32(out: &mut Vec<u8>, value: u32) {
    // Writing into a Vec cannot fail
    let _ = out.write_u32::<BigEndian>(value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_set_key() {
        let mut buf = Vec::new();
        EditorCommand::SetKey {
            track: 2,
            key: Key::new(16.0, 0.5, Interpolation::Linear),
        }
        .encode(&mut buf);
        assert_eq!(buf.len(), 14);
        assert_eq!(&buf[..5], &[0, 0, 0, 0, 2]);

        let (command, used) = EditorCommand::decode(&buf).unwrap().unwrap();
        assert_eq!(used, 14);
        assert_eq!(
            command,
            EditorCommand::SetKey {
                track: 2,
                key: Key::new(16.0, 0.5, Interpolation::Linear),
            }
        );
    }

    #[test]
    fn test_partial_command_waits_for_more() {
        let mut buf = Vec::new();
        EditorCommand::DeleteKey { track: 1, row: 9 }.encode(&mut buf);
        for cut in 0..buf.len() {
            assert_eq!(EditorCommand::decode(&buf[..cut]).unwrap(), None);
        }
        assert!(EditorCommand::decode(&buf).unwrap().is_some());
    }

    #[test]
    fn test_decode_stream_of_commands() {
        let mut buf = Vec::new();
        EditorCommand::Pause(false).encode(&mut buf);
        EditorCommand::SetRow(64).encode(&mut buf);
        EditorCommand::SaveTracks.encode(&mut buf);

        let mut offset = 0;
        let mut decoded = Vec::new();
        while let Some((command, used)) = EditorCommand::decode(&buf[offset..]).unwrap() {
            decoded.push(command);
            offset += used;
        }
        assert_eq!(
            decoded,
            vec![
                EditorCommand::Pause(false),
                EditorCommand::SetRow(64),
                EditorCommand::SaveTracks
            ]
        );
        assert_eq!(offset, buf.len());
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            EditorCommand::decode(&[42, 0, 0]),
            Err(ProtocolError::UnknownCommand(42))
        );
    }

    #[test]
    fn test_get_track_wire_form() {
        let mut buf = Vec::new();
        ClientMessage::GetTrack("Scene".to_string()).encode(&mut buf);
        assert_eq!(buf, [&[2u8, 0, 0, 0, 5][..], &b"Scene"[..]].concat());

        let (message, used) = ClientMessage::decode(&buf).unwrap().unwrap();
        assert_eq!(message, ClientMessage::GetTrack("Scene".to_string()));
        assert_eq!(used, buf.len());
        assert_eq!(ClientMessage::decode(&buf[..7]).unwrap(), None);
    }

    #[test]
    fn test_client_set_row() {
        let mut buf = Vec::new();
        ClientMessage::SetRow(0x0102_0304).encode(&mut buf);
        assert_eq!(buf, vec![3, 1, 2, 3, 4]);
    }

    #[test]
    fn test_greeting_check() {
        assert!(check_server_greeting(SERVER_GREETING).is_ok());
        assert_eq!(
            check_server_greeting(b"hello, world"),
            Err(ProtocolError::BadGreeting)
        );
    }
}
