//! Afterglow - demo host
//!
//! Plays the demo from a sync editor, from track files, or under manual
//! control, and mirrors the stage lights over UDP.
//!
//! # Usage
//!
//! ```bash
//! # Follow the editor on 127.0.0.1:1338, or play sync_*.track files
//! afterglow
//!
//! # Step through scenes by hand (keys on stdin: n b ] [ r p q)
//! afterglow --manual
//!
//! # Play a show directory and broadcast lights
//! afterglow --prefix show/sync --broadcast 192.168.1.255:7000
//! ```

mod app;
mod config;
mod fade;
mod input;
mod renderer;
mod scenes;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use app::{Demo, ExitReason};
use config::Config;
use renderer::TraceRenderer;

/// Afterglow - demo host with editor sync and stage lights
#[derive(Parser)]
#[command(name = "afterglow")]
#[command(about = "Demo host with editor sync and stage lights")]
#[command(version)]
struct Cli {
    /// Config file (default: platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Track file prefix; an empty prefix selects manual mode
    #[arg(short, long)]
    prefix: Option<String>,

    /// Manual scene control, no editor or track files
    #[arg(short, long, conflicts_with = "prefix")]
    manual: bool,

    /// Editor address (host:port)
    #[arg(short, long)]
    editor: Option<String>,

    /// Broadcast light colors to this address (host:port)
    #[arg(short, long)]
    broadcast: Option<String>,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log: String,

    /// Write the effective config to the platform config directory and exit
    #[arg(long)]
    write_config: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if self.manual {
            config.sync.file_prefix = None;
        } else if let Some(prefix) = &self.prefix {
            config.sync.file_prefix = Some(prefix.clone()).filter(|p| !p.is_empty());
        }
        if let Some(editor) = &self.editor {
            config.sync.editor_address = editor.clone();
        }
        if let Some(target) = &self.broadcast {
            config.broadcast.enabled = true;
            config.broadcast.target = target.clone();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log)),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => config::load_from(path)?,
        None => config::load(),
    };
    cli.apply(&mut config);

    if cli.write_config {
        match config::save(&config)? {
            Some(path) => tracing::info!("Wrote {}", path.display()),
            None => tracing::warn!("No config directory available"),
        }
        return Ok(());
    }

    let mut demo = Demo::start(&config, TraceRenderer::new())?;

    let input = match input::spawn_stdin_reader() {
        Ok(rx) => Some(rx),
        Err(e) => {
            tracing::warn!("Keyboard input unavailable: {}", e);
            None
        }
    };

    let reason = demo.run(input, cli.frames);
    match reason {
        ExitReason::Halted => tracing::error!("Stopped after a critical error"),
        reason => tracing::info!(
            ?reason,
            mode = ?demo.sync().mode(),
            scene = demo.active_scene().unwrap_or("none"),
            ticks = demo.ticks(),
            frames = demo.renderer().frames(),
            last_frame = ?demo.renderer().last_frame(),
            "Exiting"
        ),
    }
    demo.shutdown();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "afterglow",
            "--prefix",
            "show/sync",
            "--editor",
            "10.0.0.2:1338",
            "--broadcast",
            "10.0.0.255:7000",
        ]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.sync.file_prefix.as_deref(), Some("show/sync"));
        assert_eq!(config.sync.editor_address, "10.0.0.2:1338");
        assert!(config.broadcast.enabled);
        assert_eq!(config.broadcast.target, "10.0.0.255:7000");
    }

    #[test]
    fn test_manual_and_empty_prefix() {
        let mut config = Config::default();
        Cli::parse_from(["afterglow", "--manual"]).apply(&mut config);
        assert_eq!(config.sync.file_prefix, None);

        let mut config = Config::default();
        Cli::parse_from(["afterglow", "--prefix", ""]).apply(&mut config);
        assert_eq!(config.sync.file_prefix, None);
    }

    #[test]
    fn test_manual_conflicts_with_prefix() {
        assert!(Cli::try_parse_from(["afterglow", "--manual", "--prefix", "x"]).is_err());
    }
}
