//! Sync and broadcast configuration
//!
//! These sections are embedded in the host's `config.toml`. Every field has a
//! default so partial files load cleanly.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Audio timing and playback settings consumed by [`crate::SyncSystem`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Song tempo in beats per minute (default: 120)
    #[serde(default = "default_bpm")]
    pub bpm: u32,
    /// Rows per beat (default: 8)
    #[serde(default = "default_rows_per_beat")]
    pub rows_per_beat: u32,
    /// Song length; playback stops or pauses past this (default: 180.0)
    #[serde(default = "default_song_length")]
    pub song_length_seconds: f64,
    /// Scene progress step per manual advance, in (0, 1) (default: 0.01)
    #[serde(default = "default_manual_rate")]
    pub manual_scene_advance_rate: f32,
    /// Editor address (default: 127.0.0.1:1338)
    #[serde(default = "default_editor_address")]
    pub editor_address: String,
    /// Editor connect timeout in milliseconds (default: 50)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    /// Track whose value selects the scene (default: "Scene")
    #[serde(default = "default_scene_track")]
    pub scene_track: String,
    /// Track whose value selects the camera frame (default: "CameraFrame")
    #[serde(default = "default_frame_track")]
    pub frame_track: String,
    /// Track file prefix; no prefix means manual mode (default: "sync")
    #[serde(default = "default_file_prefix")]
    pub file_prefix: Option<String>,
    /// Treat missing track data as critical when no editor is attached
    /// (default: true)
    #[serde(default = "default_true")]
    pub require_sync: bool,
}

/// Light broadcast settings consumed by [`crate::LightBroadcaster`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Whether to start the broadcaster at all (default: false)
    #[serde(default)]
    pub enabled: bool,
    /// Destination address (default: 255.255.255.255:7000)
    #[serde(default = "default_broadcast_target")]
    pub target: String,
    /// Send interval in milliseconds (default: 16)
    #[serde(default = "default_broadcast_interval")]
    pub interval_ms: u64,
    /// Name written into each packet (default: "afterglow")
    #[serde(default = "default_broadcast_name")]
    pub name: String,
    /// Packet protocol version (default: 1)
    #[serde(default = "default_packet_version")]
    pub version: u8,
}

fn default_bpm() -> u32 {
    120
}
fn default_rows_per_beat() -> u32 {
    8
}
fn default_song_length() -> f64 {
    180.0
}
fn default_manual_rate() -> f32 {
    0.01
}
fn default_editor_address() -> String {
    format!("127.0.0.1:{}", afterglow_shared::protocol::DEFAULT_EDITOR_PORT)
}
fn default_connect_timeout() -> u64 {
    50
}
fn default_scene_track() -> String {
    "Scene".to_string()
}
fn default_frame_track() -> String {
    "CameraFrame".to_string()
}
fn default_file_prefix() -> Option<String> {
    Some("sync".to_string())
}
fn default_true() -> bool {
    true
}

fn default_broadcast_target() -> String {
    "255.255.255.255:7000".to_string()
}
fn default_broadcast_interval() -> u64 {
    16
}
fn default_broadcast_name() -> String {
    "afterglow".to_string()
}
fn default_packet_version() -> u8 {
    1
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            bpm: default_bpm(),
            rows_per_beat: default_rows_per_beat(),
            song_length_seconds: default_song_length(),
            manual_scene_advance_rate: default_manual_rate(),
            editor_address: default_editor_address(),
            connect_timeout_ms: default_connect_timeout(),
            scene_track: default_scene_track(),
            frame_track: default_frame_track(),
            file_prefix: default_file_prefix(),
            require_sync: default_true(),
        }
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            target: default_broadcast_target(),
            interval_ms: default_broadcast_interval(),
            name: default_broadcast_name(),
            version: default_packet_version(),
        }
    }
}

impl SyncConfig {
    /// Replace out-of-range values with defaults.
    ///
    /// Returns one warning per replaced field.
    pub fn validate(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.bpm == 0 {
            warnings.push(format!("sync.bpm must be positive, using {}", default_bpm()));
            self.bpm = default_bpm();
        }
        if self.rows_per_beat == 0 {
            warnings.push(format!(
                "sync.rows_per_beat must be positive, using {}",
                default_rows_per_beat()
            ));
            self.rows_per_beat = default_rows_per_beat();
        }
        if self.song_length_seconds.is_nan() || self.song_length_seconds <= 0.0 {
            warnings.push(format!(
                "sync.song_length_seconds must be positive, using {}",
                default_song_length()
            ));
            self.song_length_seconds = default_song_length();
        }
        let rate = self.manual_scene_advance_rate;
        if rate.is_nan() || rate <= 0.0 || rate >= 1.0 {
            warnings.push(format!(
                "sync.manual_scene_advance_rate {} is outside (0, 1), using {}",
                rate,
                default_manual_rate()
            ));
            self.manual_scene_advance_rate = default_manual_rate();
        }

        warnings
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Returns the platform-specific configuration directory.
///
/// On Linux: `~/.config/Afterglow`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.afterglow", "", "Afterglow")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Read and parse a TOML file.
pub fn load_from<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_config_default() {
        let config = SyncConfig::default();
        assert_eq!(config.bpm, 120);
        assert_eq!(config.rows_per_beat, 8);
        assert_eq!(config.editor_address, "127.0.0.1:1338");
        assert_eq!(config.file_prefix.as_deref(), Some("sync"));
        assert!(config.require_sync);
    }

    #[test]
    fn test_deserialize_empty_is_default() {
        let config: SyncConfig = toml::from_str("").unwrap();
        assert_eq!(config, SyncConfig::default());
        let broadcast: BroadcastConfig = toml::from_str("").unwrap();
        assert_eq!(broadcast, BroadcastConfig::default());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SyncConfig = toml::from_str(
            r#"
bpm = 140
scene_track = "part"
"#,
        )
        .unwrap();
        assert_eq!(config.bpm, 140);
        assert_eq!(config.scene_track, "part");
        assert_eq!(config.rows_per_beat, 8);
    }

    #[test]
    fn test_validate_replaces_bad_values() {
        let mut config = SyncConfig {
            bpm: 0,
            rows_per_beat: 0,
            song_length_seconds: -1.0,
            manual_scene_advance_rate: 1.5,
            ..Default::default()
        };
        let warnings = config.validate();
        assert_eq!(warnings.len(), 4);
        assert_eq!(config.bpm, 120);
        assert_eq!(config.rows_per_beat, 8);
        assert_eq!(config.song_length_seconds, 180.0);
        assert!((config.manual_scene_advance_rate - 0.01).abs() < f32::EPSILON);
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(SyncConfig::default().validate().is_empty());
    }

    #[test]
    fn test_load_from_missing_file() {
        let result = load_from::<SyncConfig>(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.toml");
        std::fs::write(&path, "bpm = 90\nsong_length_seconds = 12.5\n").unwrap();
        let config: SyncConfig = load_from(&path).unwrap();
        assert_eq!(config.bpm, 90);
        assert_eq!(config.song_length_seconds, 12.5);
    }
}
