//! Controller EEPROM configuration.

use crate::leaf::{Leaf, MovePolicy};

// ---------------------------------------------------------------------------
// Factory defaults (firmware EEPROM initial values)
// ---------------------------------------------------------------------------

pub const DEFAULT_TIMEOUT_SECS: u8 = 3;
pub const DEFAULT_BRIGHTNESS: u8 = 255;
pub const DEFAULT_CURRENT_THRESHOLD: u8 = 25;
pub const DEFAULT_MAX_SPEED_PWM: u8 = 255;
pub const DEFAULT_ACCELERATION: u8 = 5;

/// Controller configuration as stored in EEPROM.
///
/// Every numeric field is a single wire byte; wider host values must be
/// range-checked before they get here (see `Settings::config_record`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfigRecord {
    /// Leaf that opens first (and closes last) when both move.
    pub first_leaf: Leaf,
    /// Leaf selection for move commands and status interpretation.
    pub move_policy: MovePolicy,
    /// Move timeout (s)
    pub timeout_secs: u8,
    /// EL panel brightness
    pub brightness: u8,
    /// Current sensor end-stop threshold (ADU)
    pub current_threshold: u8,
    /// Maximum motor speed (PWM duty)
    pub max_speed_pwm: u8,
    /// Acceleration ramp step
    pub acceleration: u8,
}

impl Default for ConfigRecord {
    fn default() -> Self {
        Self {
            first_leaf: Leaf::Left,
            move_policy: MovePolicy::Both,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            brightness: DEFAULT_BRIGHTNESS,
            current_threshold: DEFAULT_CURRENT_THRESHOLD,
            max_speed_pwm: DEFAULT_MAX_SPEED_PWM,
            acceleration: DEFAULT_ACCELERATION,
        }
    }
}

impl ConfigRecord {
    /// The six tuning bytes in `SetConfig` order, starting with the first leaf.
    pub fn tuning_bytes(&self) -> [u8; 6] {
        [
            self.first_leaf.as_byte(),
            self.timeout_secs,
            self.brightness,
            self.current_threshold,
            self.max_speed_pwm,
            self.acceleration,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuning_bytes_order() {
        let rec = ConfigRecord {
            first_leaf: Leaf::Right,
            move_policy: MovePolicy::Left,
            timeout_secs: 10,
            brightness: 128,
            current_threshold: 30,
            max_speed_pwm: 200,
            acceleration: 4,
        };
        assert_eq!(rec.tuning_bytes(), [b'r', 10, 128, 30, 200, 4]);
    }

    #[test]
    fn factory_defaults() {
        let rec = ConfigRecord::default();
        assert_eq!(rec.first_leaf, Leaf::Left);
        assert_eq!(rec.move_policy, MovePolicy::Both);
        assert_eq!(rec.timeout_secs, 3);
        assert_eq!(rec.current_threshold, 25);
    }
}
