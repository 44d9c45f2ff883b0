use log::{debug, warn};
use serde::Deserialize;

use crate::device::DeviceState;
use crate::error::ProtocolError;
use crate::midi;
use crate::protocol::{Command, Event, WireCommand};

/// Translates channel messages into device mutations and user interactions
/// into channel messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandDispatcher {
    strict: bool,
}

#[derive(Deserialize)]
struct Discriminator {
    evt: String,
}

impl CommandDispatcher {
    /// Unknown commands are ignored.
    pub fn new() -> Self {
        Self { strict: false }
    }

    /// Unknown commands are rejected with [`ProtocolError::UnknownCommand`].
    pub fn strict() -> Self {
        Self { strict: true }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Parse one JSON message. `Ok(None)` means it was ignored.
    pub fn decode(&self, text: &str) -> Result<Option<Command>, ProtocolError> {
        match serde_json::from_str::<WireCommand>(text)?.validate()? {
            Some(command) => Ok(Some(command)),
            None => {
                let name = serde_json::from_str::<Discriminator>(text)?.evt;
                self.unknown(name)
            }
        }
    }

    /// Parse one Launchpad MIDI message. `Ok(None)` means it was ignored.
    pub fn decode_midi(&self, bytes: &[u8]) -> Result<Option<Command>, ProtocolError> {
        match midi::decode(bytes)? {
            Some(command) => Ok(Some(command)),
            None => self.unknown(format!("{bytes:02X?}")),
        }
    }

    fn unknown(&self, name: String) -> Result<Option<Command>, ProtocolError> {
        if self.strict {
            Err(ProtocolError::UnknownCommand(name))
        } else {
            debug!("ignoring unknown command {name}");
            Ok(None)
        }
    }

    /// Apply one command in full.
    pub fn apply(&self, state: &mut DeviceState, command: Command) -> Result<(), ProtocolError> {
        match command {
            Command::Reset => state.reset(),
            Command::SetPadLight {
                pad,
                color,
                operation,
            } => state.set_pad_light(pad, color, operation),
            Command::SetButtonLight {
                button,
                color,
                operation,
            } => state.set_button_light(button, color, operation),
            Command::SetBrightness(level) => state.set_brightness(level),
            Command::SetBuffers {
                visible,
                write,
                copy_visible_to_write,
                auto_swap,
            } => state.set_buffers(visible, write, copy_visible_to_write, auto_swap),
            Command::TestLights(intensity) => state.test_lights(intensity),
            Command::SetLights { colors, operation } => state.set_lights(&colors, operation)?,
            Command::ScrollText {
                text,
                color,
                speed,
                looping,
                operation,
            } => state.scroll_text(&text, color, speed, looping, operation)?,
        }
        Ok(())
    }

    /// Decode and apply a JSON message.
    pub fn handle(&self, state: &mut DeviceState, text: &str) -> Result<(), ProtocolError> {
        self.dispatch(state, self.decode(text))
    }

    /// Decode and apply a MIDI message.
    pub fn handle_midi(&self, state: &mut DeviceState, bytes: &[u8]) -> Result<(), ProtocolError> {
        self.dispatch(state, self.decode_midi(bytes))
    }

    fn dispatch(
        &self,
        state: &mut DeviceState,
        decoded: Result<Option<Command>, ProtocolError>,
    ) -> Result<(), ProtocolError> {
        let result = match decoded {
            Ok(Some(command)) => self.apply(state, command),
            Ok(None) => Ok(()),
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            warn!("rejected command: {err}");
        }
        result
    }

    /// JSON form of an interaction, ready for the channel.
    pub fn encode(event: Event) -> String {
        // A struct of an enum and two integers always serializes.
        serde_json::to_string(&event.to_wire()).unwrap_or_default()
    }

    /// MIDI form of an interaction.
    pub fn encode_midi(event: Event) -> [u8; 3] {
        midi::encode(event)
    }
}
