//! Command encoding.
//!
//! - [`Command`]: requests we send to the controller
//! - [`status::StatusSnapshot`] / [`config::ConfigRecord`]: decoded replies
//!
//! Only `GetStatus` and `GetConfig` solicit a reply; every other command is
//! fire-and-forget.

pub mod config;
pub mod status;

use crate::codec::Revision;
use crate::frame;
use crate::leaf::MovePolicy;

// ---------------------------------------------------------------------------
// Opcode constants (second request byte)
// ---------------------------------------------------------------------------

pub const OP_OPEN: u8 = b'o';
pub const OP_CLOSE: u8 = b'c';
pub const OP_ABORT: u8 = b'a';
pub const OP_GET_STATUS: u8 = b'g';
pub const OP_GET_CONFIG: u8 = b'e';
pub const OP_SET_CONFIG: u8 = b's';

/// A request we send to the controller.
#[derive(Debug, Clone)]
pub enum Command {
    Open(MovePolicy),
    Close(MovePolicy),
    Abort,
    GetStatus,
    GetConfig,
    SetConfig(config::ConfigRecord),
}

impl Command {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Open(_) => "Open",
            Command::Close(_) => "Close",
            Command::Abort => "Abort",
            Command::GetStatus => "GetStatus",
            Command::GetConfig => "GetConfig",
            Command::SetConfig(_) => "SetConfig",
        }
    }

    /// Encode into wire bytes for the given firmware revision.
    pub fn encode(&self, rev: Revision) -> Vec<u8> {
        let mut buf = vec![frame::COMMAND];
        match self {
            Command::Open(policy) => buf.extend([OP_OPEN, policy.selector_byte()]),
            Command::Close(policy) => buf.extend([OP_CLOSE, policy.selector_byte()]),
            Command::Abort => buf.push(OP_ABORT),
            Command::GetStatus => buf.push(OP_GET_STATUS),
            Command::GetConfig => buf.push(OP_GET_CONFIG),
            Command::SetConfig(rec) => {
                buf.push(OP_SET_CONFIG);
                rev.encode_config_args(rec, &mut buf);
            }
        }
        buf
    }

    /// Length of the reply frame this command solicits, if any.
    pub fn reply_len(&self, rev: Revision) -> Option<usize> {
        match self {
            Command::GetStatus => Some(status::STATUS_FRAME_LEN),
            Command::GetConfig => Some(rev.config_frame_len()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::Leaf;

    #[test]
    fn fixed_commands() {
        for rev in [Revision::V1, Revision::V2] {
            assert_eq!(Command::Abort.encode(rev), b"ca".to_vec());
            assert_eq!(Command::GetStatus.encode(rev), b"cg".to_vec());
            assert_eq!(Command::GetConfig.encode(rev), b"ce".to_vec());
        }
    }

    #[test]
    fn move_commands_carry_policy_selector() {
        for rev in [Revision::V1, Revision::V2] {
            assert_eq!(Command::Open(MovePolicy::Left).encode(rev), b"col".to_vec());
            assert_eq!(Command::Open(MovePolicy::Both).encode(rev), b"coa".to_vec());
            assert_eq!(Command::Close(MovePolicy::Right).encode(rev), b"ccr".to_vec());
            assert_eq!(Command::Close(MovePolicy::Both).encode(rev), b"cca".to_vec());
        }
    }

    #[test]
    fn set_config() {
        let rec = config::ConfigRecord {
            first_leaf: Leaf::Left,
            move_policy: MovePolicy::Right,
            timeout_secs: 3,
            brightness: 255,
            current_threshold: 25,
            max_speed_pwm: 255,
            acceleration: 5,
        };
        assert_eq!(
            Command::SetConfig(rec).encode(Revision::V1),
            vec![b'c', b's', b'l', 3, 255, 25, 255, 5]
        );
        assert_eq!(
            Command::SetConfig(rec).encode(Revision::V2),
            vec![b'c', b's', b'r', b'l', 3, 255, 25, 255, 5]
        );
    }

    #[test]
    fn reply_lengths() {
        assert_eq!(Command::GetStatus.reply_len(Revision::V2), Some(11));
        assert_eq!(Command::GetConfig.reply_len(Revision::V1), Some(8));
        assert_eq!(Command::GetConfig.reply_len(Revision::V2), Some(14));
        assert_eq!(Command::Abort.reply_len(Revision::V2), None);
        assert_eq!(Command::Open(MovePolicy::Both).reply_len(Revision::V2), None);
    }
}
