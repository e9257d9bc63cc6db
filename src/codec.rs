//! Firmware wire revisions.
//!
//! Two controller firmware lines disagree on where the move policy is stored.
//! Each is an explicit strategy; the session picks one up front and never
//! mixes them. Open/close carry the `l`/`r`/`a` selector from the active
//! policy under both.
//!
//! | | V1 | V2 |
//! |---|---|---|
//! | `SetConfig` | `c s first t b th ms v` | `c s policy first t b th ms v` |
//! | policy byte in `SetConfig` | none | `l`/`r`/`a` |
//! | `GetConfig` reply | 8 bytes, no policy | 14 bytes, `l`/`r`/`b` at byte 1 |
//!
//! V2 firmware takes the policy in the move selector spelling but reports it
//! back with `b` for both leaves. Under V1 the policy lives only on the host.

use crate::error::Result;
use crate::frame::{self, Frame};
use crate::leaf::{Leaf, MovePolicy};
use crate::protocol::config::ConfigRecord;

/// V1 `GetConfig` reply: `[EE first t b th ms v 00]`.
pub const V1_CONFIG_FRAME_LEN: usize = 8;
/// V2 `GetConfig` reply: `[EE policy first t b th ms v RESERVED*5 00]`.
pub const V2_CONFIG_FRAME_LEN: usize = 14;

/// Controller firmware wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Revision {
    /// Policy kept on the host; 8-byte config reply.
    V1,
    /// Policy stored in EEPROM; 14-byte config reply.
    #[default]
    V2,
}

impl Revision {
    /// Expected `GetConfig` reply length.
    pub fn config_frame_len(self) -> usize {
        match self {
            Revision::V1 => V1_CONFIG_FRAME_LEN,
            Revision::V2 => V2_CONFIG_FRAME_LEN,
        }
    }

    /// Append the `SetConfig` arguments (everything after `c s`).
    pub fn encode_config_args(self, rec: &ConfigRecord, buf: &mut Vec<u8>) {
        if self == Revision::V2 {
            buf.push(rec.move_policy.selector_byte());
        }
        buf.extend_from_slice(&rec.tuning_bytes());
    }

    /// Decode a `GetConfig` reply.
    ///
    /// `host_policy` fills in the move policy when the revision does not carry
    /// one on the wire.
    pub fn decode_config(self, wire: &[u8], host_policy: MovePolicy) -> Result<ConfigRecord> {
        let f = Frame::fixed("ConfigFrame", wire, self.config_frame_len())?;
        let (move_policy, base) = match self {
            Revision::V1 => (host_policy, 1),
            Revision::V2 => (MovePolicy::from_discriminator(f.byte(1))?, 2),
        };
        Ok(ConfigRecord {
            first_leaf: Leaf::from_byte(f.byte(base))?,
            move_policy,
            timeout_secs: f.byte(base + 1),
            brightness: f.byte(base + 2),
            current_threshold: f.byte(base + 3),
            max_speed_pwm: f.byte(base + 4),
            acceleration: f.byte(base + 5),
        })
    }

    /// Encode a `GetConfig` reply as the controller would send it.
    pub fn encode_config_frame(self, rec: &ConfigRecord) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.config_frame_len());
        buf.push(frame::START);
        if self == Revision::V2 {
            buf.push(rec.move_policy.discriminator());
        }
        buf.extend_from_slice(&rec.tuning_bytes());
        buf.resize(self.config_frame_len() - 1, 0x00);
        buf.push(frame::STOP);
        buf
    }
}
