//! TCP link to a live track editor

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use afterglow_shared::protocol::{self, CLIENT_GREETING, SERVER_GREETING};
use afterglow_shared::{ClientMessage, EditorCommand};

use crate::error::SyncError;

/// Buffer size for each non-blocking read
const RECV_BUFFER_SIZE: usize = 4096;

/// An established, handshaken editor connection.
///
/// The stream is non-blocking after [`EditorLink::connect`] returns; partial
/// commands stay in `inbox` until the rest arrives.
#[derive(Debug)]
pub(crate) struct EditorLink {
    stream: TcpStream,
    peer: SocketAddr,
    inbox: Vec<u8>,
    recv_buf: Vec<u8>,
    last_sent_row: Option<u32>,
}

impl EditorLink {
    /// Connect and perform the greeting exchange.
    ///
    /// `timeout` bounds both the TCP connect and the greeting reply.
    pub fn connect(addr: &str, timeout: Duration) -> Result<Self, SyncError> {
        let peer: SocketAddr = addr.parse().map_err(|e: std::net::AddrParseError| {
            SyncError::Address {
                addr: addr.to_string(),
                reason: e.to_string(),
            }
        })?;

        let mut stream = TcpStream::connect_timeout(&peer, timeout)?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;

        stream.write_all(CLIENT_GREETING)?;
        let mut reply = [0u8; SERVER_GREETING.len()];
        stream.read_exact(&mut reply)?;
        protocol::check_server_greeting(&reply)?;

        stream.set_nonblocking(true)?;
        tracing::debug!(%peer, "Editor handshake complete");

        Ok(Self {
            stream,
            peer,
            inbox: Vec::new(),
            recv_buf: vec![0u8; RECV_BUFFER_SIZE],
            last_sent_row: None,
        })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Ask the editor to send all keys of `name`.
    pub fn request_track(&mut self, name: &str) -> Result<(), SyncError> {
        self.send(&ClientMessage::GetTrack(name.to_string()))
    }

    /// Report the playback row, skipping repeats.
    pub fn send_row(&mut self, row: u32) -> Result<(), SyncError> {
        if self.last_sent_row == Some(row) {
            return Ok(());
        }
        self.send(&ClientMessage::SetRow(row))?;
        self.last_sent_row = Some(row);
        Ok(())
    }

    /// Drain the socket and return every complete command received.
    pub fn poll(&mut self) -> Result<Vec<EditorCommand>, SyncError> {
        loop {
            match self.stream.read(&mut self.recv_buf) {
                Ok(0) => return Err(SyncError::Disconnected),
                Ok(len) => self.inbox.extend_from_slice(&self.recv_buf[..len]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        let mut commands = Vec::new();
        let mut offset = 0;
        while let Some((command, used)) = EditorCommand::decode(&self.inbox[offset..])? {
            commands.push(command);
            offset += used;
        }
        self.inbox.drain(..offset);
        Ok(commands)
    }

    fn send(&mut self, message: &ClientMessage) -> Result<(), SyncError> {
        let mut bytes = Vec::new();
        message.encode(&mut bytes);
        self.stream.write_all(&bytes)?;
        Ok(())
    }
}
