//! Host-side settings file (TOML).
//!
//! Holds the serial port and the last known controller configuration. Numeric
//! fields are kept wide so that hand-edited files fail validation instead of
//! wrapping when converted into a [`ConfigRecord`].
//!
//! ```toml
//! port = "/dev/ttyUSB0"
//! revision = "v2"
//! move_policy = "both"
//! first_leaf = "left"
//! timeout = 3
//! brightness = 255
//! threshold = 25
//! max_speed = 255
//! velocity = 5
//! ```

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::Revision;
use crate::conn::DEFAULT_TIMEOUT;
use crate::dome::DomeOptions;
use crate::leaf::{Leaf, MovePolicy};
use crate::protocol::config::ConfigRecord;

/// Errors loading, saving, or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("{field} = {value} is out of range ({range})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        range: &'static str,
    },
}

/// Persisted host settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Serial port name; empty means not chosen yet.
    pub port: String,
    pub revision: Revision,
    pub move_policy: MovePolicy,
    pub first_leaf: Leaf,
    /// Move timeout (s)
    pub timeout: i64,
    pub brightness: i64,
    /// Current sensor threshold (ADU)
    pub threshold: i64,
    /// Max motor PWM
    pub max_speed: i64,
    /// Acceleration step
    pub velocity: i64,
    /// Per-exchange receive timeout (ms)
    pub receive_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let mut s = Self {
            port: String::new(),
            revision: Revision::default(),
            move_policy: MovePolicy::default(),
            first_leaf: Leaf::Left,
            timeout: 0,
            brightness: 0,
            threshold: 0,
            max_speed: 0,
            velocity: 0,
            receive_timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
        };
        s.apply(&ConfigRecord::default());
        s
    }
}

impl Settings {
    /// Load from `path`. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(toml::from_str(&text)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Validate into a wire-ready record.
    pub fn config_record(&self) -> Result<ConfigRecord, SettingsError> {
        Ok(ConfigRecord {
            first_leaf: self.first_leaf,
            move_policy: self.move_policy,
            timeout_secs: byte("timeout", self.timeout)?,
            brightness: byte("brightness", self.brightness)?,
            current_threshold: byte("threshold", self.threshold)?,
            max_speed_pwm: byte("max_speed", self.max_speed)?,
            acceleration: byte("velocity", self.velocity)?,
        })
    }

    /// Overwrite the controller fields with a record read from the device.
    pub fn apply(&mut self, rec: &ConfigRecord) {
        self.first_leaf = rec.first_leaf;
        self.move_policy = rec.move_policy;
        self.timeout = rec.timeout_secs.into();
        self.brightness = rec.brightness.into();
        self.threshold = rec.current_threshold.into();
        self.max_speed = rec.max_speed_pwm.into();
        self.velocity = rec.acceleration.into();
    }

    /// Mirror a record read from the controller into the file at `path`.
    ///
    /// Writes only when a controller field changed or the file does not
    /// exist yet. Returns whether the file was written.
    pub fn sync_device(
        &mut self,
        rec: &ConfigRecord,
        path: impl AsRef<Path>,
    ) -> Result<bool, SettingsError> {
        let path = path.as_ref();
        let before = self.clone();
        self.apply(rec);
        if *self == before && path.exists() {
            return Ok(false);
        }
        self.save(path)?;
        Ok(true)
    }

    /// Session options. A zero receive timeout is rejected.
    pub fn dome_options(&self) -> Result<DomeOptions, SettingsError> {
        if self.receive_timeout_ms == 0 {
            return Err(SettingsError::OutOfRange {
                field: "receive_timeout_ms",
                value: 0,
                range: "1 or more",
            });
        }
        Ok(DomeOptions {
            revision: self.revision,
            move_policy: self.move_policy,
            timeout: Duration::from_millis(self.receive_timeout_ms),
        })
    }
}

fn byte(field: &'static str, value: i64) -> Result<u8, SettingsError> {
    u8::try_from(value).map_err(|_| SettingsError::OutOfRange {
        field,
        value,
        range: "0-255",
    })
}
