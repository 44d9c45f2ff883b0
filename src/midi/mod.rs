//! Launchpad S MIDI dialect: byte codec plus midir connections.

mod codec;
mod port;

pub use codec::{decode, encode};
pub use port::{create_virtual, MidiBridgeError, MidiCommandSource, MidiEventSink};
