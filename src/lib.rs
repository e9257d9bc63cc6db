pub mod codec;
pub mod conn;
pub mod dome;
pub mod error;
pub mod frame;
pub mod leaf;
pub mod protocol;
#[cfg(feature = "serial")]
pub mod serial;
#[cfg(feature = "settings")]
pub mod settings;
pub mod shutter;

pub use codec::Revision;
pub use conn::{Channel, Connection};
pub use dome::{Capabilities, Dome, DomeOptions, LinkState};
pub use error::{Error, WireError};
pub use leaf::{Leaf, MovePolicy};
pub use protocol::Command;
pub use protocol::config::ConfigRecord;
pub use protocol::status::{LeafStatus, MoveTarget, StatusSnapshot};
pub use shutter::{ShutterState, derive_state};
