use log::info;
use midir::{Ignore, MidiIO, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};

use crate::dispatcher::CommandDispatcher;
use crate::protocol::Event;

const INPUT_CONNECTION_NAME: &str = "launchpad-emu-in";
const OUTPUT_CONNECTION_NAME: &str = "launchpad-emu-out";

#[derive(Debug, thiserror::Error)]
pub enum MidiBridgeError {
    #[error("failed to initialise MIDI {0}")]
    MidiInit(String),
    #[error("no MIDI port matching \"{0}\" was found")]
    PortNotFound(String),
    #[error("failed to open MIDI connection: {0}")]
    Connection(String),
    #[error("failed to send on MIDI port \"{port}\": {reason}")]
    Send { port: String, reason: String },
    #[error("virtual MIDI ports are not available on this platform")]
    VirtualUnsupported,
}

/// Live input connection. Raw messages are handed to the callback given at
/// connection time, on midir's thread.
pub struct MidiCommandSource {
    connection: MidiInputConnection<()>,
    port_name: String,
}

impl MidiCommandSource {
    /// Connect to the first input port whose name contains `port_hint`
    /// (case-insensitive; an empty hint takes the first port).
    pub fn connect<F>(client_name: &str, port_hint: &str, mut forward: F) -> Result<Self, MidiBridgeError>
    where
        F: FnMut(&[u8]) + Send + 'static,
    {
        let mut midi_in = MidiInput::new(client_name)
            .map_err(|err| MidiBridgeError::MidiInit(format!("input: {err}")))?;
        midi_in.ignore(Ignore::None);

        let port = find_port(&midi_in, port_hint)?;
        let port_name = port_label(&midi_in, &port);

        let connection = midi_in
            .connect(
                &port,
                INPUT_CONNECTION_NAME,
                move |_stamp, message, _| forward(message),
                (),
            )
            .map_err(|err| MidiBridgeError::Connection(err.to_string()))?;

        info!("receiving commands from MIDI port \"{port_name}\"");
        Ok(Self {
            connection,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn close(self) {
        let _ = self.connection.close();
    }
}

/// Output connection the device reports interactions on.
pub struct MidiEventSink {
    connection: MidiOutputConnection,
    port_name: String,
}

impl MidiEventSink {
    pub fn connect(client_name: &str, port_hint: &str) -> Result<Self, MidiBridgeError> {
        let midi_out = MidiOutput::new(client_name)
            .map_err(|err| MidiBridgeError::MidiInit(format!("output: {err}")))?;

        let port = find_port(&midi_out, port_hint)?;
        let port_name = port_label(&midi_out, &port);

        let connection = midi_out
            .connect(&port, OUTPUT_CONNECTION_NAME)
            .map_err(|err| MidiBridgeError::Connection(err.to_string()))?;

        info!("reporting interactions to MIDI port \"{port_name}\"");
        Ok(Self {
            connection,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn send(&mut self, event: Event) -> Result<(), MidiBridgeError> {
        self.connection
            .send(&CommandDispatcher::encode_midi(event))
            .map_err(|err| MidiBridgeError::Send {
                port: self.port_name.clone(),
                reason: err.to_string(),
            })
    }

    pub fn close(self) {
        let _ = self.connection.close();
    }
}

/// Publish a virtual port pair named `port_name`, so applications looking for
/// a device can connect to the emulator directly.
#[cfg(unix)]
pub fn create_virtual<F>(
    client_name: &str,
    port_name: &str,
    mut forward: F,
) -> Result<(MidiCommandSource, MidiEventSink), MidiBridgeError>
where
    F: FnMut(&[u8]) + Send + 'static,
{
    use midir::os::unix::{VirtualInput, VirtualOutput};

    let mut midi_in = MidiInput::new(client_name)
        .map_err(|err| MidiBridgeError::MidiInit(format!("input: {err}")))?;
    midi_in.ignore(Ignore::None);
    let input = midi_in
        .create_virtual(port_name, move |_stamp, message, _| forward(message), ())
        .map_err(|err| MidiBridgeError::Connection(err.to_string()))?;

    let midi_out = MidiOutput::new(client_name)
        .map_err(|err| MidiBridgeError::MidiInit(format!("output: {err}")))?;
    let output = midi_out
        .create_virtual(port_name)
        .map_err(|err| MidiBridgeError::Connection(err.to_string()))?;

    info!("published virtual MIDI port \"{port_name}\"");
    Ok((
        MidiCommandSource {
            connection: input,
            port_name: port_name.to_string(),
        },
        MidiEventSink {
            connection: output,
            port_name: port_name.to_string(),
        },
    ))
}

#[cfg(not(unix))]
pub fn create_virtual<F>(
    _client_name: &str,
    _port_name: &str,
    _forward: F,
) -> Result<(MidiCommandSource, MidiEventSink), MidiBridgeError>
where
    F: FnMut(&[u8]) + Send + 'static,
{
    Err(MidiBridgeError::VirtualUnsupported)
}

fn find_port<T: MidiIO>(io: &T, port_hint: &str) -> Result<T::Port, MidiBridgeError> {
    let ports = io.ports();
    if port_hint.trim().is_empty() {
        return ports
            .first()
            .cloned()
            .ok_or_else(|| MidiBridgeError::PortNotFound(port_hint.to_string()));
    }

    let hint = port_hint.to_lowercase();
    ports
        .iter()
        .find(|port| port_matches(io.port_name(port).ok().as_deref(), &hint))
        .cloned()
        .ok_or_else(|| MidiBridgeError::PortNotFound(port_hint.to_string()))
}

fn port_matches(name: Option<&str>, hint: &str) -> bool {
    name.map(|name| name.to_lowercase().contains(hint))
        .unwrap_or(false)
}

fn port_label<T: MidiIO>(io: &T, port: &T::Port) -> String {
    io.port_name(port).unwrap_or_else(|_| "<unknown>".into())
}
