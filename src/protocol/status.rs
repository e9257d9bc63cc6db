//! Status response (`c g`).

use crate::error::Result;
use crate::frame::{self, Frame};

/// Length of the status response frame.
pub const STATUS_FRAME_LEN: usize = 11;

/// Where a leaf's motor is currently being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MoveTarget {
    /// `s`
    Stop,
    /// `o`
    Open,
    /// `c`
    Close,
    /// Any other byte, preserved as received.
    Unknown(u8),
}

impl MoveTarget {
    pub fn from_byte(b: u8) -> Self {
        match b {
            b's' => Self::Stop,
            b'o' => Self::Open,
            b'c' => Self::Close,
            other => Self::Unknown(other),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Self::Stop => b's',
            Self::Open => b'o',
            Self::Close => b'c',
            Self::Unknown(b) => b,
        }
    }
}

/// Last known position of a single leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LeafStatus {
    /// `u`: initial state after power-up, position not yet known.
    Unknown,
    /// `o`
    Open,
    /// `c`
    Closed,
    /// `g`: leaves stopped apart from each other.
    Gap,
    /// `t`: the move did not finish before the configured timeout.
    TimeoutError,
    /// Any other byte, preserved as received.
    Invalid(u8),
}

impl LeafStatus {
    pub fn from_byte(b: u8) -> Self {
        match b {
            b'u' => Self::Unknown,
            b'o' => Self::Open,
            b'c' => Self::Closed,
            b'g' => Self::Gap,
            b't' => Self::TimeoutError,
            other => Self::Invalid(other),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Self::Unknown => b'u',
            Self::Open => b'o',
            Self::Closed => b'c',
            Self::Gap => b'g',
            Self::TimeoutError => b't',
            Self::Invalid(b) => b,
        }
    }
}

/// One decoded status reading (11 bytes).
///
/// `[EE current timeout moveL moveR statusL statusR light speedL speedR 00]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StatusSnapshot {
    /// Motor current sensor reading (ADU)
    pub current_adu: u8,
    /// Seconds left before the move times out
    pub timeout_remaining: u8,
    pub move_left: MoveTarget,
    pub move_right: MoveTarget,
    pub status_left: LeafStatus,
    pub status_right: LeafStatus,
    /// EL panel state
    pub light_on: bool,
    /// Left motor PWM
    pub speed_left: u8,
    /// Right motor PWM
    pub speed_right: u8,
}

impl StatusSnapshot {
    /// Decode by fixed offset. The start marker and terminator are not checked.
    pub fn decode(wire: &[u8]) -> Result<Self> {
        let f = Frame::fixed("StatusFrame", wire, STATUS_FRAME_LEN)?;
        Ok(Self {
            current_adu: f.byte(1),
            timeout_remaining: f.byte(2),
            move_left: MoveTarget::from_byte(f.byte(3)),
            move_right: MoveTarget::from_byte(f.byte(4)),
            status_left: LeafStatus::from_byte(f.byte(5)),
            status_right: LeafStatus::from_byte(f.byte(6)),
            // Firmware builds disagree on binary vs ASCII for this flag.
            light_on: matches!(f.byte(7), 1 | b'1'),
            speed_left: f.byte(8),
            speed_right: f.byte(9),
        })
    }

    /// Encode as the device would send it.
    pub fn encode(&self) -> Vec<u8> {
        vec![
            frame::START,
            self.current_adu,
            self.timeout_remaining,
            self.move_left.as_byte(),
            self.move_right.as_byte(),
            self.status_left.as_byte(),
            self.status_right.as_byte(),
            u8::from(self.light_on),
            self.speed_left,
            self.speed_right,
            frame::STOP,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WireError;

    #[test]
    fn decode_captured_frame() {
        // Both leaves closed, idle, light off.
        let wire = [0xEE, 0x03, 0x00, b's', b's', b'c', b'c', 0x00, 0x00, 0x00, 0x00];
        let s = StatusSnapshot::decode(&wire).unwrap();
        assert_eq!(s.current_adu, 3);
        assert_eq!(s.timeout_remaining, 0);
        assert_eq!(s.move_left, MoveTarget::Stop);
        assert_eq!(s.move_right, MoveTarget::Stop);
        assert_eq!(s.status_left, LeafStatus::Closed);
        assert_eq!(s.status_right, LeafStatus::Closed);
        assert!(!s.light_on);
    }

    #[test]
    fn decode_moving_frame() {
        let wire = [0xEE, 0x19, 0x07, b'o', b's', b'u', b'c', b'1', 0xC8, 0x00, 0x00];
        let s = StatusSnapshot::decode(&wire).unwrap();
        assert_eq!(s.current_adu, 25);
        assert_eq!(s.timeout_remaining, 7);
        assert_eq!(s.move_left, MoveTarget::Open);
        assert_eq!(s.status_left, LeafStatus::Unknown);
        assert!(s.light_on);
        assert_eq!(s.speed_left, 200);
        assert_eq!(s.speed_right, 0);
    }

    #[test]
    fn start_marker_not_validated() {
        let wire = [0x00, 0x00, 0x00, b's', b's', b'o', b'o', 0x00, 0x00, 0x00, 0xFF];
        let s = StatusSnapshot::decode(&wire).unwrap();
        assert_eq!(s.status_left, LeafStatus::Open);
    }

    #[test]
    fn undefined_bytes_preserved() {
        let wire = [0xEE, 0x00, 0x00, b'x', b's', b'?', b'g', 0x00, 0x00, 0x00, 0x00];
        let s = StatusSnapshot::decode(&wire).unwrap();
        assert_eq!(s.move_left, MoveTarget::Unknown(b'x'));
        assert_eq!(s.status_left, LeafStatus::Invalid(b'?'));
        assert_eq!(s.status_right, LeafStatus::Gap);
    }

    #[test]
    fn short_frame_never_partially_decoded() {
        let wire = [0xEE, 0x03, 0x00, b's', b's', b'c'];
        assert!(matches!(
            StatusSnapshot::decode(&wire),
            Err(WireError::UnexpectedLength { expected: 11, got: 6, .. })
        ));
    }

    #[test]
    fn encode_matches_device_layout() {
        let wire = [0xEE, 0x10, 0x04, b'c', b'c', b'o', b't', 0x01, 0x80, 0x7F, 0x00];
        let s = StatusSnapshot::decode(&wire).unwrap();
        assert_eq!(s.encode(), wire.to_vec());
    }
}
