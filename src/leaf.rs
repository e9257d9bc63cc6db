use std::fmt;

use crate::error::{Result, WireError};

/// One physical half of the shutter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Leaf {
    Left,
    Right,
}

impl Leaf {
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            b'l' => Ok(Self::Left),
            b'r' => Ok(Self::Right),
            _ => Err(WireError::InvalidField { field: "first leaf", value: b }),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Self::Left => b'l',
            Self::Right => b'r',
        }
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Which leaf (or leaves) a move command drives.
///
/// Two byte spellings exist on the wire: move commands select with
/// `l`/`r`/`a`, while the EEPROM stores `l`/`r`/`b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MovePolicy {
    Left,
    Right,
    #[default]
    Both,
}

impl MovePolicy {
    /// Selector byte appended to open/close commands.
    pub fn selector_byte(self) -> u8 {
        match self {
            Self::Left => b'l',
            Self::Right => b'r',
            Self::Both => b'a',
        }
    }

    /// Decode the policy discriminator stored in the EEPROM.
    pub fn from_discriminator(b: u8) -> Result<Self> {
        match b {
            b'l' => Ok(Self::Left),
            b'r' => Ok(Self::Right),
            b'b' => Ok(Self::Both),
            _ => Err(WireError::InvalidField { field: "move policy", value: b }),
        }
    }

    pub fn discriminator(self) -> u8 {
        match self {
            Self::Left => b'l',
            Self::Right => b'r',
            Self::Both => b'b',
        }
    }
}

impl fmt::Display for MovePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Both => write!(f, "both"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_round_trip() {
        for leaf in [Leaf::Left, Leaf::Right] {
            assert_eq!(Leaf::from_byte(leaf.as_byte()).unwrap(), leaf);
        }
    }

    #[test]
    fn unknown_leaf() {
        assert!(matches!(
            Leaf::from_byte(b'x'),
            Err(WireError::InvalidField { value: b'x', .. })
        ));
    }

    #[test]
    fn selector_and_discriminator_differ_for_both() {
        assert_eq!(MovePolicy::Both.selector_byte(), b'a');
        assert_eq!(MovePolicy::Both.discriminator(), b'b');
        assert_eq!(MovePolicy::from_discriminator(b'b').unwrap(), MovePolicy::Both);
        // 'a' is a command selector, never an EEPROM value.
        assert!(MovePolicy::from_discriminator(b'a').is_err());
    }

    #[test]
    fn single_leaf_policies_share_spelling() {
        for policy in [MovePolicy::Left, MovePolicy::Right] {
            assert_eq!(policy.selector_byte(), policy.discriminator());
            assert_eq!(MovePolicy::from_discriminator(policy.discriminator()).unwrap(), policy);
        }
    }
}
