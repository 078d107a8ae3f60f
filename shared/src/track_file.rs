//! Track file format
//!
//! One file per track, named `{prefix}_{track name}.track`. All integers are
//! little-endian:
//!
//! ```text
//! u32          key count
//! key count × {
//!     u32      row
//!     f32      value
//!     u8       interpolation (0 step, 1 linear, 2 smooth, 3 ramp)
//! }
//! ```

use std::io::{self, Read, Write};
use std::path::PathBuf;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

use crate::track::{Interpolation, Key, Track};

/// File extension for persisted tracks
pub const TRACK_FILE_EXTENSION: &str = "track";

/// Upper bound on keys per file; anything larger is treated as corrupt.
const MAX_KEYS: u32 = 1 << 20;

#[derive(Debug, Error)]
pub enum TrackFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("track '{name}' is truncated after {read} of {expected} keys")]
    Truncated {
        name: String,
        read: u32,
        expected: u32,
    },
    #[error("track '{name}' claims {count} keys")]
    TooManyKeys { name: String, count: u32 },
}

/// Path of the file holding `name` under `prefix`.
///
/// Path separators inside the track name are replaced so every track stays a
/// sibling of the prefix.
pub fn track_path(prefix: &str, name: &str) -> PathBuf {
    let safe: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    PathBuf::from(format!("{prefix}_{safe}.{TRACK_FILE_EXTENSION}"))
}

/// Read a track in the file format above.
///
/// Unknown interpolation bytes do not fail the read: the key is kept as
/// [`Interpolation::Step`] and a warning is logged.
pub fn read_track<R: Read>(name: &str, reader: R) -> Result<Track, TrackFileError> {
    let (track, replaced) = read_track_checked(name, reader)?;
    for row in replaced {
        tracing::warn!(track = name, row, "Unknown interpolation, using step");
    }
    Ok(track)
}

/// Like [`read_track`], but returns the rows whose interpolation byte was
/// unknown instead of logging them.
pub fn read_track_checked<R: Read>(
    name: &str,
    mut reader: R,
) -> Result<(Track, Vec<u32>), TrackFileError> {
    let count = reader.read_u32::<LittleEndian>()?;
    if count > MAX_KEYS {
        return Err(TrackFileError::TooManyKeys {
            name: name.to_string(),
            count,
        });
    }

    let mut keys = Vec::with_capacity(count as usize);
    let mut replaced = Vec::new();
    for read in 0..count {
        let (key, known) = read_key(&mut reader).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => TrackFileError::Truncated {
                name: name.to_string(),
                read,
                expected: count,
            },
            _ => TrackFileError::Io(e),
        })?;
        if !known {
            replaced.push(key.row as u32);
        }
        keys.push(key);
    }

    Ok((Track::from_keys(name, keys), replaced))
}

/// One key, and whether its interpolation byte was recognised
fn read_key<R: Read>(reader: &mut R) -> io::Result<(Key, bool)> {
    let row = reader.read_u32::<LittleEndian>()?;
    let value = reader.read_f32::<LittleEndian>()?;
    let kind = reader.read_u8()?;

    let interpolation = Interpolation::from_u8(kind);
    let key = Key::new(
        f64::from(row),
        value,
        interpolation.unwrap_or(Interpolation::Step),
    );
    Ok((key, interpolation.is_some()))
}

/// Write a track in the file format above.
///
/// Rows are stored as whole numbers; fractional rows are rounded.
pub fn write_track<W: Write>(track: &Track, mut writer: W) -> Result<(), TrackFileError> {
    writer.write_u32::<LittleEndian>(track.len() as u32)?;
    for key in track.keys() {
        writer.write_u32::<LittleEndian>(key.row.max(0.0).round() as u32)?;
        writer.write_f32::<LittleEndian>(key.value)?;
        writer.write_u8(key.interpolation.as_u8())?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode(keys: &[(u32, f32, u8)]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.write_u32::<LittleEndian>(keys.len() as u32).unwrap();
        for &(row, value, kind) in keys {
            bytes.write_u32::<LittleEndian>(row).unwrap();
            bytes.write_f32::<LittleEndian>(value).unwrap();
            bytes.write_u8(kind).unwrap();
        }
        bytes
    }

    #[test]
    fn test_track_path() {
        assert_eq!(
            track_path("data/sync", "Scene"),
            PathBuf::from("data/sync_Scene.track")
        );
        assert_eq!(
            track_path("sync", "cam:pos/x"),
            PathBuf::from("sync_cam_pos_x.track")
        );
    }

    #[test]
    fn test_read_track() {
        let bytes = encode(&[(0, 0.0, 1), (10, 100.0, 0)]);
        let track = read_track("Scene", Cursor::new(bytes)).unwrap();
        assert_eq!(track.name(), "Scene");
        assert_eq!(track.len(), 2);
        assert_eq!(track.evaluate(5.0), 50.0);
    }

    #[test]
    fn test_unknown_interpolation_falls_back_to_step() {
        let bytes = encode(&[(0, 1.0, 9), (4, 2.0, 1)]);
        let track = read_track("odd", Cursor::new(bytes)).unwrap();
        assert_eq!(track.keys()[0].interpolation, Interpolation::Step);
        assert_eq!(track.evaluate(2.0), 1.0);
    }

    #[test]
    fn test_checked_read_lists_replaced_rows() {
        let bytes = encode(&[(0, 1.0, 1), (4, 2.0, 9), (8, 3.0, 200)]);
        let (track, replaced) = read_track_checked("odd", Cursor::new(bytes)).unwrap();
        assert_eq!(track.len(), 3);
        assert_eq!(replaced, vec![4, 8]);
        assert_eq!(track.keys()[1].interpolation, Interpolation::Step);
    }

    #[test]
    fn test_truncated_file() {
        let mut bytes = encode(&[(0, 1.0, 1), (4, 2.0, 1)]);
        bytes.truncate(bytes.len() - 3);
        match read_track("short", Cursor::new(bytes)) {
            Err(TrackFileError::Truncated { read, expected, .. }) => {
                assert_eq!(read, 1);
                assert_eq!(expected, 2);
            }
            other => panic!("expected truncation error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input_is_io_error() {
        let result = read_track("none", Cursor::new(Vec::new()));
        assert!(matches!(result, Err(TrackFileError::Io(_))));
    }

    #[test]
    fn test_absurd_key_count_rejected() {
        let mut bytes = Vec::new();
        bytes.write_u32::<LittleEndian>(u32::MAX).unwrap();
        let result = read_track("huge", Cursor::new(bytes));
        assert!(matches!(result, Err(TrackFileError::TooManyKeys { .. })));
    }

    #[test]
    fn test_written_track_reads_back() {
        let track = Track::from_keys(
            "Fade",
            [
                Key::new(0.0, 0.0, Interpolation::Smooth),
                Key::new(32.0, 1.0, Interpolation::Step),
            ],
        );
        let mut bytes = Vec::new();
        write_track(&track, &mut bytes).unwrap();
        assert_eq!(bytes.len(), 4 + 2 * 9);

        let parsed = read_track("Fade", Cursor::new(bytes)).unwrap();
        assert_eq!(parsed, track);
    }
}
