//! Error types and the polled status flag
//!
//! Expected conditions (no editor, lost editor, unknown track) never surface as
//! errors past the sync core; they are logged and playback continues. Data
//! problems are reported as [`Severity::Limited`]. Startup failures that leave
//! the demo with nothing to play are [`Severity::Critical`] and raise the
//! [`StatusFlag`] the host loop checks every frame.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use afterglow_shared::{PacketError, ProtocolError, TrackFileError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("editor protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("track file error: {0}")]
    TrackFile(#[from] TrackFileError),
    #[error("light packet error: {0}")]
    Packet(#[from] PacketError),
    #[error("invalid address '{addr}': {reason}")]
    Address { addr: String, reason: String },
    #[error("editor closed the connection")]
    Disconnected,
    #[error("editor referenced unknown track id {0}")]
    UnknownTrack(u32),
}

/// How bad a reported problem is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Degraded but playable (bad key data, out-of-range frame index)
    Limited,
    /// Nothing sensible left to play; the host should stop advancing
    Critical,
}

#[derive(Debug, Default)]
struct StatusInner {
    critical: AtomicBool,
    limited: AtomicU32,
    message: Mutex<Option<String>>,
}

/// Process-wide critical error flag plus a count of limited data errors.
///
/// Cloning shares the flag. The first critical message is kept; later ones are
/// only logged.
#[derive(Debug, Clone, Default)]
pub struct StatusFlag {
    inner: Arc<StatusInner>,
}

impl StatusFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a problem and raise the flag if it is critical.
    pub fn report(&self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Limited => {
                tracing::warn!("{}", message);
                self.inner.limited.fetch_add(1, Ordering::Relaxed);
            }
            Severity::Critical => {
                tracing::error!("{}", message);
                if let Ok(mut slot) = self.inner.message.lock()
                    && slot.is_none()
                {
                    *slot = Some(message);
                }
                self.inner.critical.store(true, Ordering::Release);
            }
        }
    }

    /// Whether a critical error has been reported
    pub fn is_critical(&self) -> bool {
        self.inner.critical.load(Ordering::Acquire)
    }

    /// Number of limited data errors reported so far
    pub fn limited_count(&self) -> u32 {
        self.inner.limited.load(Ordering::Relaxed)
    }

    /// The first critical message, if any
    pub fn message(&self) -> Option<String> {
        self.inner.message.lock().ok().and_then(|slot| slot.clone())
    }

    /// Reset the flag (e.g. after the host recovered by attaching an editor)
    pub fn clear(&self) {
        if let Ok(mut slot) = self.inner.message.lock() {
            *slot = None;
        }
        self.inner.critical.store(false, Ordering::Release);
    }
}
