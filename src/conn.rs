//! Request/response exchange over a byte channel.
//!
//! Handles buffer clearing, send, fixed-length receive, and frame decode.
//! No application logic; the dome session drives sequencing.

use std::io;
use std::time::Duration;

use tracing::trace;

use crate::codec::Revision;
use crate::error::{Error, WireError};
use crate::frame;
use crate::leaf::MovePolicy;
use crate::protocol::Command;
use crate::protocol::config::ConfigRecord;
use crate::protocol::status::StatusSnapshot;

/// Default per-exchange receive timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Duplex byte channel to the controller (normally a serial port).
///
/// Timeouts must surface as `io::ErrorKind::TimedOut` (or `WouldBlock`);
/// any other error kind is treated as a transport failure.
pub trait Channel: Send {
    fn open(&mut self) -> io::Result<()>;

    fn close(&mut self) -> io::Result<()>;

    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()>;

    /// Discard anything pending in either direction.
    fn clear_buffers(&mut self) -> io::Result<()>;

    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Block until exactly `count` bytes arrive or the timeout expires.
    fn receive(&mut self, count: usize) -> io::Result<Vec<u8>>;
}

/// Connection to a SkyHat controller.
///
/// Synchronous and not internally locked; [`crate::Dome`] serializes access.
pub struct Connection<C> {
    channel: C,
    revision: Revision,
    timeout: Duration,
}

impl<C: Channel> Connection<C> {
    pub fn new(channel: C, revision: Revision, timeout: Duration) -> Self {
        Self { channel, revision, timeout }
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Open the channel and apply the receive timeout.
    pub fn open(&mut self) -> Result<(), Error> {
        self.channel.open().map_err(Error::Transport)?;
        self.channel.set_timeout(self.timeout).map_err(Error::Transport)
    }

    pub fn close(&mut self) -> Result<(), Error> {
        self.channel.close().map_err(Error::Transport)
    }

    /// Send a command without waiting for a reply.
    pub fn send(&mut self, cmd: &Command) -> Result<(), Error> {
        let wire = cmd.encode(self.revision);
        self.channel.clear_buffers().map_err(Error::Transport)?;
        trace!(cmd = cmd.name(), wire = %frame::hex(&wire, 16), "send");
        self.channel
            .send(&wire)
            .map_err(|e| Error::from_io(e, self.timeout))
    }

    /// Send a command and receive its fixed-length reply.
    pub fn exchange(&mut self, cmd: &Command) -> Result<Vec<u8>, Error> {
        self.send(cmd)?;
        let Some(len) = cmd.reply_len(self.revision) else {
            return Ok(Vec::new());
        };
        let wire = self
            .channel
            .receive(len)
            .map_err(|e| Error::from_io(e, self.timeout))?;
        trace!(cmd = cmd.name(), len = wire.len(), wire = %frame::hex(&wire, 16), "recv");
        if wire.len() != len {
            return Err(WireError::unexpected_length(cmd.name(), len, &wire).into());
        }
        Ok(wire)
    }

    /// `c g` → decoded status snapshot.
    pub fn request_status(&mut self) -> Result<StatusSnapshot, Error> {
        let wire = self.exchange(&Command::GetStatus)?;
        Ok(StatusSnapshot::decode(&wire)?)
    }

    /// `c e` → decoded configuration.
    ///
    /// `host_policy` fills the move policy for revisions that do not store it.
    pub fn request_config(&mut self, host_policy: MovePolicy) -> Result<ConfigRecord, Error> {
        let wire = self.exchange(&Command::GetConfig)?;
        Ok(self.revision.decode_config(&wire, host_policy)?)
    }
}
