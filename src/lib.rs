//! Emulator for a Launchpad S style controller: an 8×8 pad grid with a row of
//! buttons on top and a column on the right.
//!
//! [`DeviceState`] holds the two light buffers and the brightness.
//! [`CommandDispatcher`] turns channel messages (JSON or MIDI) into mutations
//! of that state, and user interactions into outbound messages.

pub mod color;
pub mod config;
pub mod controls;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod midi;
pub mod protocol;

pub use color::{Color, Rgb, PALETTE};
pub use config::EmulatorConfig;
pub use controls::{BackBufferOperation, Brightness, BufferId, Button, Control, Pad, ScrollSpeed};
pub use device::{Buffer, DeviceState, DisplayColor, Snapshot};
pub use dispatcher::CommandDispatcher;
pub use error::{ConfigError, ProtocolError};
pub use protocol::{Command, Event, WireCommand, WireEvent};
