//! Shared test utilities for unit tests

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use afterglow_shared::protocol::{CLIENT_GREETING, SERVER_GREETING};
use afterglow_shared::{ClientMessage, EditorCommand};

use crate::clock::TimeSource;

// ============================================================================
// Manual time
// ============================================================================

/// Time source that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    nanos: Arc<AtomicU64>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

// ============================================================================
// Fake editor
// ============================================================================

/// In-process editor speaking the control channel protocol.
///
/// Accepts a single connection, answers the greeting, records every client
/// message and forwards queued commands.
pub struct FakeEditor {
    addr: SocketAddr,
    commands: Sender<EditorCommand>,
    received: Arc<Mutex<Vec<ClientMessage>>>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FakeEditor {
    pub fn spawn() -> Self {
        Self::spawn_at("127.0.0.1:0")
    }

    /// Listen on a specific address, e.g. to stand in for an editor that
    /// went away.
    pub fn spawn_at(addr: &str) -> Self {
        let listener = TcpListener::bind(addr).unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();

        let (commands, rx) = mpsc::channel();
        let received = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));

        let thread_received = Arc::clone(&received);
        let thread_stop = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            serve(listener, rx, thread_received, thread_stop);
        });

        Self {
            addr,
            commands,
            received,
            stop,
            handle: Some(handle),
        }
    }

    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    pub fn send(&self, command: EditorCommand) {
        self.commands.send(command).unwrap();
    }

    pub fn received(&self) -> Vec<ClientMessage> {
        self.received.lock().unwrap().clone()
    }

    /// Wait until the recorded messages satisfy `check`.
    pub fn wait_for(&self, check: impl Fn(&[ClientMessage]) -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if check(&self.received.lock().unwrap()) {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    /// Close the connection and stop the editor thread.
    pub fn shutdown(mut self) {
        self.stop_thread();
    }

    fn stop_thread(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FakeEditor {
    fn drop(&mut self) {
        self.stop_thread();
    }
}

fn serve(
    listener: TcpListener,
    commands: Receiver<EditorCommand>,
    received: Arc<Mutex<Vec<ClientMessage>>>,
    stop: Arc<AtomicBool>,
) {
    let mut stream = loop {
        if stop.load(Ordering::SeqCst) {
            return;
        }
        match listener.accept() {
            Ok((stream, _)) => break stream,
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(1));
            }
            Err(_) => return,
        }
    };

    stream.set_nonblocking(false).unwrap();
    let mut greeting = [0u8; CLIENT_GREETING.len()];
    if stream.read_exact(&mut greeting).is_err() || greeting != CLIENT_GREETING {
        return;
    }
    stream.write_all(SERVER_GREETING).unwrap();
    stream.set_nonblocking(true).unwrap();

    let mut inbox = Vec::new();
    let mut buf = [0u8; 1024];
    while !stop.load(Ordering::SeqCst) {
        loop {
            match commands.try_recv() {
                Ok(command) => {
                    let mut bytes = Vec::new();
                    command.encode(&mut bytes);
                    if stream.write_all(&bytes).is_err() {
                        return;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }

        match stream.read(&mut buf) {
            Ok(0) => return,
            Ok(len) => inbox.extend_from_slice(&buf[..len]),
            Err(e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(_) => return,
        }

        let mut offset = 0;
        while let Ok(Some((message, used))) = ClientMessage::decode(&inbox[offset..]) {
            received.lock().unwrap().push(message);
            offset += used;
        }
        inbox.drain(..offset);

        thread::sleep(Duration::from_millis(1));
    }
}

/// Address with nothing listening on it.
pub fn closed_port_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

/// Call `step` until `check` passes or two seconds elapse.
pub fn pump_until<T>(
    target: &mut T,
    mut step: impl FnMut(&mut T),
    check: impl Fn(&T) -> bool,
) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        step(target);
        if check(target) {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}
