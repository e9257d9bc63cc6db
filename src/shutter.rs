//! Shutter state derivation.
//!
//! The controller never reports "opening" or "open" for the shutter as a
//! whole; it reports a target and a position per leaf. [`derive_state`] folds
//! those into one [`ShutterState`] for the active move policy. It is pure and
//! must be re-run on every fresh [`StatusSnapshot`].

use std::fmt;

use crate::leaf::MovePolicy;
use crate::protocol::status::{LeafStatus, MoveTarget, StatusSnapshot};

/// Externally reported shutter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ShutterState {
    Open,
    Closed,
    Opening,
    Closing,
    Error,
}

impl ShutterState {
    /// True while a leaf is still being driven.
    pub fn is_moving(self) -> bool {
        matches!(self, ShutterState::Opening | ShutterState::Closing)
    }
}

impl fmt::Display for ShutterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutterState::Open => write!(f, "open"),
            ShutterState::Closed => write!(f, "closed"),
            ShutterState::Opening => write!(f, "opening"),
            ShutterState::Closing => write!(f, "closing"),
            ShutterState::Error => write!(f, "error"),
        }
    }
}

/// Derive the shutter state from one snapshot under `policy`.
pub fn derive_state(snapshot: &StatusSnapshot, policy: MovePolicy) -> ShutterState {
    match policy {
        MovePolicy::Left => leaf_state(snapshot.move_left, snapshot.status_left),
        MovePolicy::Right => leaf_state(snapshot.move_right, snapshot.status_right),
        MovePolicy::Both => joint_state(snapshot),
    }
}

/// Single-leaf policy. A gap cannot exist with one leaf, so it is an error.
fn leaf_state(target: MoveTarget, status: LeafStatus) -> ShutterState {
    match target {
        MoveTarget::Stop => match status {
            LeafStatus::Closed => ShutterState::Closed,
            LeafStatus::Open => ShutterState::Open,
            LeafStatus::Unknown
            | LeafStatus::Gap
            | LeafStatus::TimeoutError
            | LeafStatus::Invalid(_) => ShutterState::Error,
        },
        MoveTarget::Open => ShutterState::Opening,
        MoveTarget::Close => ShutterState::Closing,
        MoveTarget::Unknown(_) => ShutterState::Error,
    }
}

fn joint_state(s: &StatusSnapshot) -> ShutterState {
    // A timed-out leaf wins over whatever the targets say.
    if s.status_left == LeafStatus::TimeoutError || s.status_right == LeafStatus::TimeoutError {
        return ShutterState::Error;
    }

    match (s.move_left, s.move_right) {
        (MoveTarget::Stop, MoveTarget::Stop) => match (s.status_left, s.status_right) {
            (LeafStatus::Open, LeafStatus::Open) => ShutterState::Open,
            (LeafStatus::Closed, LeafStatus::Closed) => ShutterState::Closed,
            _ => ShutterState::Error,
        },
        (MoveTarget::Open, _) | (_, MoveTarget::Open) => ShutterState::Opening,
        (MoveTarget::Close, _) | (_, MoveTarget::Close) => ShutterState::Closing,
        _ => ShutterState::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(
        move_left: MoveTarget,
        status_left: LeafStatus,
        move_right: MoveTarget,
        status_right: LeafStatus,
    ) -> StatusSnapshot {
        StatusSnapshot {
            current_adu: 0,
            timeout_remaining: 0,
            move_left,
            move_right,
            status_left,
            status_right,
            light_on: false,
            speed_left: 0,
            speed_right: 0,
        }
    }

    /// Snapshot where only one leaf carries meaningful bytes; the other is
    /// set to a combination that would be an error if it were examined.
    fn single(policy: MovePolicy, target: MoveTarget, status: LeafStatus) -> StatusSnapshot {
        let noise = (MoveTarget::Unknown(b'?'), LeafStatus::TimeoutError);
        match policy {
            MovePolicy::Left => snap(target, status, noise.0, noise.1),
            MovePolicy::Right => snap(noise.0, noise.1, target, status),
            MovePolicy::Both => unreachable!(),
        }
    }

    #[test]
    fn single_leaf_stopped() {
        for policy in [MovePolicy::Left, MovePolicy::Right] {
            let at = |status| derive_state(&single(policy, MoveTarget::Stop, status), policy);
            assert_eq!(at(LeafStatus::Closed), ShutterState::Closed, "{policy}");
            assert_eq!(at(LeafStatus::Open), ShutterState::Open, "{policy}");
            assert_eq!(at(LeafStatus::Unknown), ShutterState::Error, "{policy}");
            assert_eq!(at(LeafStatus::Gap), ShutterState::Error, "{policy}");
            assert_eq!(at(LeafStatus::TimeoutError), ShutterState::Error, "{policy}");
            assert_eq!(at(LeafStatus::Invalid(b'z')), ShutterState::Error, "{policy}");
        }
    }

    #[test]
    fn single_leaf_moving_ignores_status() {
        let statuses = [
            LeafStatus::Unknown,
            LeafStatus::Open,
            LeafStatus::Closed,
            LeafStatus::Gap,
            LeafStatus::TimeoutError,
        ];
        for policy in [MovePolicy::Left, MovePolicy::Right] {
            for status in statuses {
                assert_eq!(
                    derive_state(&single(policy, MoveTarget::Open, status), policy),
                    ShutterState::Opening
                );
                assert_eq!(
                    derive_state(&single(policy, MoveTarget::Close, status), policy),
                    ShutterState::Closing
                );
            }
        }
    }

    #[test]
    fn single_leaf_unknown_target() {
        let s = single(MovePolicy::Left, MoveTarget::Unknown(b'x'), LeafStatus::Closed);
        assert_eq!(derive_state(&s, MovePolicy::Left), ShutterState::Error);
    }

    #[test]
    fn both_stopped() {
        use LeafStatus::*;
        let stop = MoveTarget::Stop;
        assert_eq!(derive_state(&snap(stop, Open, stop, Open), MovePolicy::Both), ShutterState::Open);
        assert_eq!(
            derive_state(&snap(stop, Closed, stop, Closed), MovePolicy::Both),
            ShutterState::Closed
        );
        assert_eq!(derive_state(&snap(stop, Open, stop, Closed), MovePolicy::Both), ShutterState::Error);
        assert_eq!(derive_state(&snap(stop, Gap, stop, Gap), MovePolicy::Both), ShutterState::Error);
        assert_eq!(
            derive_state(&snap(stop, Unknown, stop, Unknown), MovePolicy::Both),
            ShutterState::Error
        );
    }

    #[test]
    fn both_timeout_short_circuits() {
        use LeafStatus::*;
        let s = snap(MoveTarget::Open, TimeoutError, MoveTarget::Stop, Closed);
        assert_eq!(derive_state(&s, MovePolicy::Both), ShutterState::Error);
        let s = snap(MoveTarget::Stop, Closed, MoveTarget::Close, TimeoutError);
        assert_eq!(derive_state(&s, MovePolicy::Both), ShutterState::Error);
    }

    #[test]
    fn both_one_leaf_opening() {
        let s = snap(MoveTarget::Open, LeafStatus::Closed, MoveTarget::Stop, LeafStatus::Closed);
        assert_eq!(derive_state(&s, MovePolicy::Both), ShutterState::Opening);
    }

    #[test]
    fn both_open_wins_over_close() {
        let s = snap(MoveTarget::Close, LeafStatus::Gap, MoveTarget::Open, LeafStatus::Gap);
        assert_eq!(derive_state(&s, MovePolicy::Both), ShutterState::Opening);
    }

    #[test]
    fn both_closing() {
        let s = snap(MoveTarget::Stop, LeafStatus::Closed, MoveTarget::Close, LeafStatus::Open);
        assert_eq!(derive_state(&s, MovePolicy::Both), ShutterState::Closing);
    }

    #[test]
    fn both_unknown_target_without_motion() {
        let s = snap(MoveTarget::Unknown(b'x'), LeafStatus::Open, MoveTarget::Stop, LeafStatus::Open);
        assert_eq!(derive_state(&s, MovePolicy::Both), ShutterState::Error);
    }

    #[test]
    fn moving_flag() {
        assert!(ShutterState::Opening.is_moving());
        assert!(ShutterState::Closing.is_moving());
        assert!(!ShutterState::Open.is_moving());
        assert!(!ShutterState::Error.is_moving());
    }
}
