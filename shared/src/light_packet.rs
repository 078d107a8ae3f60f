//! Light color packet for stage hardware
//!
//! Byte layout:
//!
//! ```text
//! u8        protocol version
//! u8        name length
//! [u8]      ASCII name
//! u8        0 terminator
//! repeated {
//!     u8    effect id
//!     u8    light index
//!     u8    padding (0)
//!     u8×3  RGB
//! }
//! ```
//!
//! Only lights whose color changed since the previous packet are included.

use thiserror::Error;

/// Bytes per light record
pub const RECORD_SIZE: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    #[error("packet name must be ASCII")]
    NonAsciiName,
    #[error("packet name is {0} bytes, limit is 255")]
    NameTooLong(usize),
}

/// One light's color in a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LightRecord {
    pub effect: u8,
    pub light: u8,
    pub rgb: [u8; 3],
}

impl LightRecord {
    /// Build a record from a linear `[0, 1]` color. Channels are clamped.
    pub fn from_color(effect: u8, light: u8, color: [f32; 3]) -> Self {
        Self {
            effect,
            light,
            rgb: color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8),
        }
    }
}

/// Encode a packet with the layout above.
pub fn encode_light_packet(
    version: u8,
    name: &str,
    records: &[LightRecord],
) -> Result<Vec<u8>, PacketError> {
    if !name.is_ascii() {
        return Err(PacketError::NonAsciiName);
    }
    let name_len = u8::try_from(name.len()).map_err(|_| PacketError::NameTooLong(name.len()))?;

    let mut packet = Vec::with_capacity(3 + name.len() + records.len() * RECORD_SIZE);
    packet.push(version);
    packet.push(name_len);
    packet.extend_from_slice(name.as_bytes());
    packet.push(0);
    for record in records {
        packet.extend_from_slice(&[record.effect, record.light, 0]);
        packet.extend_from_slice(&record.rgb);
    }
    Ok(packet)
}
