use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::frame;

/// Errors arising from frame encoding and decoding.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("unexpected frame length for {frame}: expected {expected}, got {got}{}", format_raw_suffix(raw))]
    UnexpectedLength {
        frame: &'static str,
        expected: usize,
        got: usize,
        /// Raw frame bytes for debug context.
        raw: Vec<u8>,
    },

    #[error("invalid {field} byte 0x{value:02X}")]
    InvalidField { field: &'static str, value: u8 },
}

impl WireError {
    /// Create an `UnexpectedLength` error carrying the offending bytes.
    pub(crate) fn unexpected_length(frame: &'static str, expected: usize, wire: &[u8]) -> Self {
        Self::UnexpectedLength { frame, expected, got: wire.len(), raw: wire.to_vec() }
    }
}

/// Format raw bytes as a suffix like " | EE 00 03 ..." (empty if no bytes).
fn format_raw_suffix(raw: &[u8]) -> String {
    if raw.is_empty() {
        return String::new();
    }
    format!(" | {}", frame::hex(raw, 16))
}

pub type Result<T> = std::result::Result<T, WireError>;

/// Errors surfaced by a dome session.
///
/// Closed set: callers match on the variant, never on the message text.
#[derive(Debug, Error)]
pub enum Error {
    /// Operation attempted without a connected session.
    #[error("{op}: not connected")]
    NotConnected { op: &'static str },

    /// Response frame did not match the expected layout.
    #[error("framing error: {0}")]
    Framing(#[from] WireError),

    /// The channel did not deliver a complete response in time.
    #[error("no complete response within {timeout:?}")]
    ProtocolTimeout { timeout: Duration },

    /// Underlying channel failure (port missing, access denied, device removed).
    #[error("transport error: {0}")]
    Transport(#[source] io::Error),

    /// Capability the shutter never offers.
    #[error("{op} is not supported by this device")]
    Unsupported { op: &'static str },
}

impl Error {
    /// Classify a channel error: timeouts become `ProtocolTimeout`, everything
    /// else is a transport failure.
    pub(crate) fn from_io(e: io::Error, timeout: Duration) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                Error::ProtocolTimeout { timeout }
            }
            _ => Error::Transport(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_error_shows_raw_bytes() {
        let e = WireError::unexpected_length("StatusFrame", 11, &[0xEE, 0x05, 0x00]);
        assert_eq!(
            e.to_string(),
            "unexpected frame length for StatusFrame: expected 11, got 3 | EE 05 00"
        );
    }

    #[test]
    fn io_timeout_is_protocol_timeout() {
        let t = Duration::from_secs(5);
        let e = Error::from_io(io::Error::from(io::ErrorKind::TimedOut), t);
        assert!(matches!(e, Error::ProtocolTimeout { timeout } if timeout == t));

        let e = Error::from_io(io::Error::from(io::ErrorKind::WouldBlock), t);
        assert!(matches!(e, Error::ProtocolTimeout { .. }));
    }

    #[test]
    fn io_failure_is_transport() {
        let e = Error::from_io(
            io::Error::from(io::ErrorKind::PermissionDenied),
            Duration::from_secs(5),
        );
        assert!(matches!(e, Error::Transport(ref err) if err.kind() == io::ErrorKind::PermissionDenied));
    }
}
