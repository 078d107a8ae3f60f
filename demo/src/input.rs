//! Keyboard commands read from stdin
//!
//! Each character of an input line is one command, so `nnnn` advances scene
//! progress four steps.
//!
//! | Key | Action |
//! |-----|--------|
//! | `n` | advance scene progress |
//! | `b` | retreat scene progress |
//! | `]` | next scene |
//! | `[` | previous scene |
//! | `r` | restart |
//! | `p` | pause / resume |
//! | `q` | quit |

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use afterglow_core::SyncSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    AdvanceProgress,
    RetreatProgress,
    NextScene,
    PrevScene,
    Restart,
    TogglePause,
    Quit,
}

impl Command {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'n' => Some(Self::AdvanceProgress),
            'b' => Some(Self::RetreatProgress),
            ']' => Some(Self::NextScene),
            '[' => Some(Self::PrevScene),
            'r' => Some(Self::Restart),
            'p' => Some(Self::TogglePause),
            'q' => Some(Self::Quit),
            _ => None,
        }
    }

    /// Apply to `sync`. Returns `false` for [`Command::Quit`].
    pub fn apply(self, sync: &mut SyncSystem) -> bool {
        match self {
            Self::AdvanceProgress => sync.advance_scene_progress(),
            Self::RetreatProgress => sync.retreat_scene_progress(),
            Self::NextScene => sync.change_to_next_scene(),
            Self::PrevScene => sync.change_to_prev_scene(),
            Self::Restart => sync.restart(),
            Self::TogglePause => sync.toggle_pause(),
            Self::Quit => return false,
        }
        true
    }
}

/// Commands in `line`; whitespace is skipped and unknown keys are logged.
pub fn parse_line(line: &str) -> Vec<Command> {
    line.chars()
        .filter(|c| !c.is_whitespace())
        .filter_map(|c| {
            let command = Command::from_char(c);
            if command.is_none() {
                tracing::debug!("Unknown key '{}'", c);
            }
            command
        })
        .collect()
}

/// Read stdin on a background thread.
///
/// The channel disconnects when stdin reaches end of file.
pub fn spawn_stdin_reader() -> std::io::Result<Receiver<Command>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("stdin-input".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                for command in parse_line(&line) {
                    if tx.send(command).is_err() {
                        return;
                    }
                }
            }
            tracing::debug!("stdin closed");
        })?;
    Ok(rx)
}
