//! Demo frame loop
//!
//! Owns the sync system, the scenes and the light output. Each tick syncs
//! the clock and tracks, lets the active scene read its values, then draws.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use afterglow_core::scene::{LightColorBuffer, SceneDispatcher};
use afterglow_core::{LightBroadcaster, Mode, PlaybackState, SyncSystem};
use anyhow::{Context, Result};

use crate::config::{Config, RuntimeConfig};
use crate::fade::FadeOverlay;
use crate::input::Command;
use crate::renderer::{DrawTarget, Renderer};
use crate::scenes;

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// The song played to its end in player mode
    Finished,
    /// A critical error was reported; nothing is synced or drawn
    Halted,
}

/// Why [`Demo::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Quit,
    Finished,
    Halted,
    FrameLimit,
}

/// Keeps ticks on a fixed schedule.
#[derive(Debug)]
pub struct FramePacer {
    tick: Duration,
    budget: Duration,
    next: Option<Instant>,
}

impl FramePacer {
    pub fn new(config: &RuntimeConfig) -> Self {
        let tick = config.tick_duration();
        Self {
            tick,
            budget: tick,
            next: None,
        }
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick
    }

    /// Sleep until the next tick is due.
    ///
    /// A loop that fell more than a tick behind restarts its schedule instead
    /// of bursting to catch up.
    pub fn wait(&mut self) {
        let now = Instant::now();
        let due = self.next.unwrap_or(now);
        if due > now {
            thread::sleep(due - now);
            self.next = Some(due + self.tick);
        } else if now - due > self.tick {
            self.next = Some(now + self.tick);
        } else {
            self.next = Some(due + self.tick);
        }
    }

    /// Warn if a tick took longer than its slot.
    pub fn check_budget(&self, tick_time: Duration) -> bool {
        if tick_time > self.budget {
            tracing::warn!(
                "Tick took {:?}, exceeds budget of {:?}",
                tick_time,
                self.budget
            );
            return false;
        }
        true
    }
}

pub struct Demo<R: Renderer + 'static> {
    sync: SyncSystem,
    scenes: SceneDispatcher<DrawTarget>,
    fade: FadeOverlay,
    broadcaster: Option<LightBroadcaster>,
    renderer: R,
    runtime: RuntimeConfig,
    halted: bool,
    ticks: u64,
}

impl<R: Renderer + 'static> Demo<R> {
    /// Start sync, register and load the scenes, and open the light output.
    ///
    /// An empty or missing file prefix selects manual mode.
    pub fn start(config: &Config, renderer: R) -> Result<Self> {
        let mut sync = SyncSystem::new(config.sync.clone());
        let prefix = config
            .sync
            .file_prefix
            .as_deref()
            .filter(|prefix| !prefix.is_empty());
        let mode = sync.start(prefix);

        let fade = FadeOverlay::new(&mut sync);
        let lights = Arc::new(Mutex::new(LightColorBuffer::new()));

        let mut dispatcher = SceneDispatcher::new();
        scenes::register_all(&mut dispatcher, &config.scenes, Arc::clone(&lights))
            .context("Failed to register scenes")?;
        dispatcher.load_all(&mut sync);

        let broadcaster = if config.broadcast.enabled {
            let broadcaster = LightBroadcaster::spawn(&config.broadcast, Arc::clone(&lights))
                .context("Failed to start light broadcast")?;
            tracing::info!("Broadcasting lights to {}", broadcaster.target());
            Some(broadcaster)
        } else {
            None
        };

        tracing::info!(?mode, scenes = dispatcher.len(), "Demo started");

        Ok(Self {
            sync,
            scenes: dispatcher,
            fade,
            broadcaster,
            renderer,
            runtime: config.runtime.clone(),
            halted: false,
            ticks: 0,
        })
    }

    pub fn sync(&self) -> &SyncSystem {
        &self.sync
    }

    #[cfg(test)]
    pub fn sync_mut(&mut self) -> &mut SyncSystem {
        &mut self.sync
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn active_scene(&self) -> Option<&str> {
        self.scenes.active_name()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.sync.status().is_critical() {
            if !self.halted {
                self.halted = true;
                if let Some(broadcaster) = &self.broadcaster {
                    broadcaster.set_syncing(false);
                }
                tracing::error!(
                    "Playback halted: {}",
                    self.sync.status().message().unwrap_or_default()
                );
            }
            return TickOutcome::Halted;
        }

        self.sync.sync();
        self.fade.sync(&self.sync);
        self.scenes.sync(&self.sync);

        if let Some(broadcaster) = &self.broadcaster {
            broadcaster.set_syncing(self.sync.is_running());
        }

        self.renderer.begin_frame(self.sync.row());
        self.scenes.draw(&mut self.renderer);
        self.fade.draw(&mut self.renderer);
        self.renderer.end_frame();
        self.ticks += 1;

        if self.sync.mode() == Mode::Player && self.sync.state() == PlaybackState::Finished {
            TickOutcome::Finished
        } else {
            TickOutcome::Continue
        }
    }

    /// Run ticks until quit, the end of the song, a critical error with no
    /// way to quit, or `max_frames`.
    pub fn run(
        &mut self,
        input: Option<Receiver<Command>>,
        max_frames: Option<u64>,
    ) -> ExitReason {
        let mut input = input;
        let mut pacer = FramePacer::new(&self.runtime);
        let mut frames = 0u64;
        tracing::debug!(tick = ?pacer.tick_duration(), "Frame loop started");

        loop {
            if max_frames.is_some_and(|max| frames >= max) {
                return ExitReason::FrameLimit;
            }
            pacer.wait();

            if let Some(rx) = &input {
                loop {
                    match rx.try_recv() {
                        Ok(command) => {
                            if !command.apply(&mut self.sync) {
                                return ExitReason::Quit;
                            }
                        }
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => {
                            input = None;
                            break;
                        }
                    }
                }
            }

            let tick_start = Instant::now();
            let outcome = self.tick();
            pacer.check_budget(tick_start.elapsed());
            frames += 1;

            match outcome {
                TickOutcome::Continue => {}
                TickOutcome::Finished => return ExitReason::Finished,
                // Stay up while the user can still quit by hand
                TickOutcome::Halted if input.is_none() => return ExitReason::Halted,
                TickOutcome::Halted => {}
            }
        }
    }

    /// Stop the light output and shut sync down.
    pub fn shutdown(self) {
        let Self {
            sync,
            broadcaster,
            ticks,
            ..
        } = self;
        if let Some(mut broadcaster) = broadcaster {
            broadcaster.stop();
        }
        tracing::info!(ticks, "Demo stopped");
        sync.clean_and_exit();
    }
}
