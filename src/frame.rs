//! Fixed-length frame helpers.
//!
//! Wire format:
//! ```text
//! request:  'c' OP [ARGS...]
//! response: EE FIELD... 00
//! ```
//!
//! There is no checksum and no byte stuffing. Responses are identified purely
//! by the command that solicited them and must match its length exactly.

use crate::error::{Result, WireError};

/// Prefix byte of every request.
pub const COMMAND: u8 = b'c';
/// Start marker of every response. Not validated on decode.
pub const START: u8 = 0xEE;
/// Terminator of every response. Not validated on decode.
pub const STOP: u8 = 0x00;

/// A response frame whose length has been checked against its layout.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    bytes: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Accept `wire` only if it is exactly `len` bytes.
    pub fn fixed(name: &'static str, wire: &'a [u8], len: usize) -> Result<Self> {
        if wire.len() != len {
            return Err(WireError::unexpected_length(name, len, wire));
        }
        Ok(Self { bytes: wire })
    }

    /// Field byte at `offset`. Callers index within the checked layout.
    pub fn byte(&self, offset: usize) -> u8 {
        self.bytes[offset]
    }
}

/// Format bytes as space-separated hex, truncated to `limit` bytes.
pub fn hex(bytes: &[u8], limit: usize) -> String {
    let mut s = bytes
        .iter()
        .take(limit)
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ");
    if bytes.len() > limit {
        s.push_str("...");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_length_accepted() {
        let wire = [START, 1, 2, STOP];
        let frame = Frame::fixed("Test", &wire, 4).unwrap();
        assert_eq!(frame.byte(0), START);
        assert_eq!(frame.byte(2), 2);
    }

    #[test]
    fn short_frame_rejected() {
        let wire = [START, 1];
        assert!(matches!(
            Frame::fixed("Test", &wire, 4),
            Err(WireError::UnexpectedLength { expected: 4, got: 2, .. })
        ));
    }

    #[test]
    fn long_frame_rejected() {
        let wire = [START, 1, 2, 3, 4, STOP];
        assert!(matches!(
            Frame::fixed("Test", &wire, 4),
            Err(WireError::UnexpectedLength { expected: 4, got: 6, .. })
        ));
    }

    #[test]
    fn hex_truncates() {
        assert_eq!(hex(&[0xEE, 0x00], 16), "EE 00");
        assert_eq!(hex(&[1, 2, 3], 2), "01 02...");
        assert_eq!(hex(&[], 4), "");
    }
}
