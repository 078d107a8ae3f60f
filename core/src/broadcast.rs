//! Light color broadcast to stage hardware
//!
//! A background thread wakes every interval, drains the changed entries of
//! the shared [`LightColorBuffer`] and sends them as one UDP packet. Sending
//! is best effort: failures are logged at debug level and never retried.
//! The buffer lock is released before the packet goes out.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use afterglow_shared::encode_light_packet;

use crate::config::BroadcastConfig;
use crate::error::SyncError;
use crate::scene::LightColorBuffer;

/// Handle to the broadcast thread. Dropping it stops and joins the thread.
#[derive(Debug)]
pub struct LightBroadcaster {
    target: SocketAddr,
    active: Arc<AtomicBool>,
    syncing: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

struct Sender {
    socket: UdpSocket,
    target: SocketAddr,
    interval: Duration,
    name: String,
    version: u8,
    buffer: Arc<Mutex<LightColorBuffer>>,
    active: Arc<AtomicBool>,
    syncing: Arc<AtomicBool>,
}

impl LightBroadcaster {
    /// Bind a socket and start the thread. Packets only go out once
    /// [`Self::set_syncing`] enables them.
    pub fn spawn(
        config: &BroadcastConfig,
        buffer: Arc<Mutex<LightColorBuffer>>,
    ) -> Result<Self, SyncError> {
        let target: SocketAddr = config.target.parse().map_err(|e: std::net::AddrParseError| {
            SyncError::Address {
                addr: config.target.clone(),
                reason: e.to_string(),
            }
        })?;
        // Reject names the packet can't carry before the thread starts
        encode_light_packet(config.version, &config.name, &[])?;

        let local: SocketAddr = match target {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local)?;
        socket.set_broadcast(true)?;
        tracing::info!(%target, interval_ms = config.interval_ms, "Light broadcast ready");

        let active = Arc::new(AtomicBool::new(true));
        let syncing = Arc::new(AtomicBool::new(false));
        let sender = Sender {
            socket,
            target,
            interval: Duration::from_millis(config.interval_ms.max(1)),
            name: config.name.clone(),
            version: config.version,
            buffer,
            active: Arc::clone(&active),
            syncing: Arc::clone(&syncing),
        };
        let handle = thread::Builder::new()
            .name("light-broadcast".to_string())
            .spawn(move || sender.run())?;

        Ok(Self {
            target,
            active,
            syncing,
            handle: Some(handle),
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Enable or disable sending. Changes keep accumulating while disabled.
    pub fn set_syncing(&self, syncing: bool) {
        self.syncing.store(syncing, Ordering::Relaxed);
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Relaxed)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Ask the thread to exit and wait for it.
    pub fn stop(&mut self) {
        self.active.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Light broadcast thread panicked");
            } else {
                tracing::debug!("Light broadcast stopped");
            }
        }
    }
}

impl Drop for LightBroadcaster {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Sender {
    fn run(self) {
        while self.active.load(Ordering::Relaxed) {
            if self.syncing.load(Ordering::Relaxed) {
                self.send_changes();
            }
            thread::sleep(self.interval);
        }
    }

    fn send_changes(&self) {
        let records = match self.buffer.lock() {
            Ok(mut buffer) => buffer.drain_dirty(),
            Err(poisoned) => poisoned.into_inner().drain_dirty(),
        };
        if records.is_empty() {
            return;
        }

        match encode_light_packet(self.version, &self.name, &records) {
            Ok(packet) => {
                if let Err(e) = self.socket.send_to(&packet, self.target) {
                    tracing::debug!(target = %self.target, "Light packet dropped: {}", e);
                }
            }
            Err(e) => tracing::warn!("Light packet not encoded: {}", e),
        }
    }
}
