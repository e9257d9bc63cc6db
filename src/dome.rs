//! Dome session: connection lifecycle and shutter operations.
//!
//! [`Dome`] is the surface a host integration layer talks to. It owns the
//! channel, the active [`ConfigRecord`] and the latest [`StatusSnapshot`],
//! and serializes every exchange behind one mutex.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::codec::Revision;
use crate::conn::{Channel, Connection, DEFAULT_TIMEOUT};
use crate::error::Error;
use crate::leaf::MovePolicy;
use crate::protocol::Command;
use crate::protocol::config::ConfigRecord;
use crate::protocol::status::StatusSnapshot;
use crate::shutter::{ShutterState, derive_state};

/// Session parameters supplied by the host before connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomeOptions {
    /// Firmware wire contract of the controller.
    pub revision: Revision,
    /// Move policy used when the firmware does not report one (V1).
    pub move_policy: MovePolicy,
    /// Per-exchange receive timeout.
    pub timeout: Duration,
}

impl Default for DomeOptions {
    fn default() -> Self {
        Self {
            revision: Revision::default(),
            move_policy: MovePolicy::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    /// Channel open, initial config/status exchange in progress.
    Connecting,
    Connected,
    /// Never entered: failures in a connected session are returned per call
    /// and do not tear the session down.
    Faulted,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkState::Disconnected => write!(f, "disconnected"),
            LinkState::Connecting => write!(f, "connecting"),
            LinkState::Connected => write!(f, "connected"),
            LinkState::Faulted => write!(f, "faulted"),
        }
    }
}

/// What the shutter can and cannot do. Fixed by the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Capabilities {
    pub can_set_shutter: bool,
    pub can_find_home: bool,
    pub can_park: bool,
    pub can_set_park: bool,
    pub can_set_altitude: bool,
    pub can_set_azimuth: bool,
    pub can_sync_azimuth: bool,
    pub can_slave: bool,
}

pub const CAPABILITIES: Capabilities = Capabilities {
    can_set_shutter: true,
    can_find_home: false,
    can_park: false,
    can_set_park: false,
    can_set_altitude: false,
    can_set_azimuth: false,
    can_sync_azimuth: false,
    can_slave: false,
};

/// State that exists only while connected.
#[derive(Debug, Clone, Copy)]
struct Session {
    config: ConfigRecord,
    last: StatusSnapshot,
}

struct Inner<C> {
    conn: Connection<C>,
    link: LinkState,
    session: Option<Session>,
}

impl<C: Channel> Inner<C> {
    fn session(&mut self, op: &'static str) -> Result<&mut Session, Error> {
        match (self.link, self.session.as_mut()) {
            (LinkState::Connected, Some(s)) => Ok(s),
            _ => Err(Error::NotConnected { op }),
        }
    }

    /// Open the channel, read config, read status.
    fn handshake(&mut self, host_policy: MovePolicy) -> Result<Session, Error> {
        self.conn.open()?;
        let config = self.conn.request_config(host_policy)?;
        debug!(?config, "controller config");
        let last = self.conn.request_status()?;
        debug!(?last, "controller status");
        Ok(Session { config, last })
    }

    fn teardown(&mut self) {
        self.session = None;
        self.link = LinkState::Disconnected;
        if let Err(e) = self.conn.close() {
            warn!(error = %e, "channel close failed");
        }
    }
}

/// A SkyHat shutter controller session.
///
/// Every method that talks to the controller holds the session lock for the
/// whole request/response pair, so a `Dome` can be shared between threads.
///
/// # Example
///
/// ```no_run
/// # #[cfg(feature = "serial")] {
/// use skyhat::{Dome, DomeOptions, ShutterState};
/// use skyhat::serial::SerialChannel;
///
/// let dome = Dome::new(SerialChannel::new("/dev/ttyUSB0"), DomeOptions::default());
/// dome.connect()?;
/// dome.open()?;
/// while dome.status()? == ShutterState::Opening {
///     std::thread::sleep(std::time::Duration::from_secs(1));
/// }
/// # }
/// # Ok::<(), skyhat::Error>(())
/// ```
pub struct Dome<C> {
    inner: Mutex<Inner<C>>,
    options: DomeOptions,
}

impl<C: Channel> Dome<C> {
    pub fn new(channel: C, options: DomeOptions) -> Self {
        Self {
            inner: Mutex::new(Inner {
                conn: Connection::new(channel, options.revision, options.timeout),
                link: LinkState::Disconnected,
                session: None,
            }),
            options,
        }
    }

    pub fn options(&self) -> DomeOptions {
        self.options
    }

    fn lock(&self) -> MutexGuard<'_, Inner<C>> {
        // An interrupted exchange leaves nothing half-written in Inner.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    pub fn link_state(&self) -> LinkState {
        self.lock().link
    }

    pub fn is_connected(&self) -> bool {
        self.link_state() == LinkState::Connected
    }

    /// Open the channel and read config and status.
    ///
    /// On any failure the channel is closed again and the session is left
    /// `Disconnected`; the next call starts from scratch. Connecting an
    /// already connected session is a no-op.
    pub fn connect(&self) -> Result<(), Error> {
        let mut inner = self.lock();
        if inner.link == LinkState::Connected {
            return Ok(());
        }
        inner.link = LinkState::Connecting;
        info!(revision = ?inner.conn.revision(), "connecting");
        match inner.handshake(self.options.move_policy) {
            Ok(session) => {
                let state = derive_state(&session.last, session.config.move_policy);
                inner.session = Some(session);
                inner.link = LinkState::Connected;
                info!(policy = %session.config.move_policy, %state, "connected");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "connect failed");
                inner.teardown();
                Err(e)
            }
        }
    }

    /// Close the channel and drop the cached config and snapshot.
    pub fn disconnect(&self) {
        let mut inner = self.lock();
        if inner.link == LinkState::Disconnected {
            return;
        }
        inner.teardown();
        info!("disconnected");
    }

    // -----------------------------------------------------------------------
    // Shutter
    // -----------------------------------------------------------------------

    /// Start opening. Returns once the command is sent; poll [`status`](Self::status).
    pub fn open(&self) -> Result<(), Error> {
        self.move_command("open", Command::Open)
    }

    /// Start closing. Returns once the command is sent; poll [`status`](Self::status).
    pub fn close(&self) -> Result<(), Error> {
        self.move_command("close", Command::Close)
    }

    fn move_command(
        &self,
        op: &'static str,
        build: fn(MovePolicy) -> Command,
    ) -> Result<(), Error> {
        let mut inner = self.lock();
        let policy = inner.session(op)?.config.move_policy;
        inner.conn.send(&build(policy))?;
        debug!(op, %policy, "move sent");
        Ok(())
    }

    /// Stop both motors.
    ///
    /// Always sent. The controller flags an abort with nothing moving as an
    /// error, so callers should check [`ShutterState::is_moving`] first.
    pub fn abort(&self) -> Result<(), Error> {
        let mut inner = self.lock();
        inner.session("abort")?;
        inner.conn.send(&Command::Abort)?;
        debug!("abort sent");
        Ok(())
    }

    /// Read a fresh snapshot and derive the shutter state from it.
    pub fn status(&self) -> Result<ShutterState, Error> {
        let mut inner = self.lock();
        let policy = inner.session("status")?.config.move_policy;
        let snap = inner.conn.request_status()?;
        inner.session("status")?.last = snap;
        let state = derive_state(&snap, policy);
        debug!(%policy, %state, "shutter status");
        Ok(state)
    }

    /// Read a fresh snapshot without deriving a state.
    pub fn snapshot(&self) -> Result<StatusSnapshot, Error> {
        let mut inner = self.lock();
        inner.session("snapshot")?;
        let snap = inner.conn.request_status()?;
        inner.session("snapshot")?.last = snap;
        Ok(snap)
    }

    /// Snapshot from the most recent status read, if connected.
    pub fn last_snapshot(&self) -> Option<StatusSnapshot> {
        self.lock().session.map(|s| s.last)
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    /// Cached config from the last read or write, if connected.
    pub fn config(&self) -> Option<ConfigRecord> {
        self.lock().session.map(|s| s.config)
    }

    /// Read the controller config and make it the active one.
    pub fn read_config(&self) -> Result<ConfigRecord, Error> {
        let mut inner = self.lock();
        let host_policy = inner.session("read_config")?.config.move_policy;
        let config = inner.conn.request_config(host_policy)?;
        inner.session("read_config")?.config = config;
        Ok(config)
    }

    /// Write `record` to the controller EEPROM and read it straight back.
    ///
    /// Returns `true` when the read-back matches. The read-back becomes the
    /// active config either way.
    pub fn write_config(&self, record: ConfigRecord) -> Result<bool, Error> {
        let mut inner = self.lock();
        inner.session("write_config")?;
        inner.conn.send(&Command::SetConfig(record))?;
        // V1 never reports the policy, so the written one is the truth.
        let readback = inner.conn.request_config(record.move_policy)?;
        inner.session("write_config")?.config = readback;
        let confirmed = readback == record;
        if confirmed {
            info!(config = ?readback, "config written");
        } else {
            warn!(written = ?record, read = ?readback, "config read-back mismatch");
        }
        Ok(confirmed)
    }

    // -----------------------------------------------------------------------
    // Capabilities the shutter never offers
    // -----------------------------------------------------------------------

    pub fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }

    /// Always false: the shutter has no slewing axis.
    pub fn slewing(&self) -> bool {
        false
    }

    /// Always false.
    pub fn slaved(&self) -> bool {
        false
    }

    pub fn set_slaved(&self, slaved: bool) -> Result<(), Error> {
        if slaved { unsupported("set_slaved") } else { Ok(()) }
    }

    pub fn azimuth(&self) -> Result<f64, Error> {
        unsupported("azimuth")
    }

    pub fn altitude(&self) -> Result<f64, Error> {
        unsupported("altitude")
    }

    pub fn at_home(&self) -> Result<bool, Error> {
        unsupported("at_home")
    }

    pub fn at_park(&self) -> Result<bool, Error> {
        unsupported("at_park")
    }

    pub fn slew_to_azimuth(&self, _azimuth: f64) -> Result<(), Error> {
        unsupported("slew_to_azimuth")
    }

    pub fn slew_to_altitude(&self, _altitude: f64) -> Result<(), Error> {
        unsupported("slew_to_altitude")
    }

    pub fn sync_to_azimuth(&self, _azimuth: f64) -> Result<(), Error> {
        unsupported("sync_to_azimuth")
    }

    pub fn find_home(&self) -> Result<(), Error> {
        unsupported("find_home")
    }

    pub fn park(&self) -> Result<(), Error> {
        unsupported("park")
    }

    pub fn set_park(&self) -> Result<(), Error> {
        unsupported("set_park")
    }
}

fn unsupported<T>(op: &'static str) -> Result<T, Error> {
    debug!(op, "unsupported operation");
    Err(Error::Unsupported { op })
}
