//! Message types exchanged between the controlling application and the
//! emulated device.
//!
//! [`Command`] and [`Event`] are the closed, validated forms used inside the
//! crate. [`WireCommand`] and [`WireEvent`] mirror the JSON shapes carried by
//! the channel: every command is an object tagged by `evt`, fields named with
//! single letters.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::controls::{
    BackBufferOperation, Brightness, BufferId, Button, Control, Pad, ScrollSpeed,
};
use crate::error::ProtocolError;

/// One mutation of the device state.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Reset,
    SetPadLight {
        pad: Pad,
        color: Color,
        operation: BackBufferOperation,
    },
    SetButtonLight {
        button: Button,
        color: Color,
        operation: BackBufferOperation,
    },
    SetBrightness(Brightness),
    SetBuffers {
        visible: BufferId,
        write: BufferId,
        copy_visible_to_write: bool,
        auto_swap: bool,
    },
    TestLights(Brightness),
    SetLights {
        colors: Vec<Color>,
        operation: BackBufferOperation,
    },
    ScrollText {
        text: String,
        color: Color,
        speed: ScrollSpeed,
        looping: bool,
        operation: BackBufferOperation,
    },
}

impl Command {
    /// Encode the command the way the application side publishes it.
    pub fn to_wire(&self) -> Result<WireCommand, ProtocolError> {
        let wire = match self {
            Command::Reset => WireCommand::Reset,
            Command::SetPadLight {
                pad,
                color,
                operation,
            } => WireCommand::PadLight {
                x: pad.x() as i64,
                y: pad.y() as i64,
                c: WireColor::from(*color),
                o: operation.name().to_string(),
            },
            Command::SetButtonLight {
                button,
                color,
                operation,
            } => WireCommand::ButtonLight {
                t: button.is_top(),
                i: button.coordinate() as i64,
                c: WireColor::from(*color),
                o: operation.name().to_string(),
            },
            Command::SetBrightness(level) => WireCommand::Brightness {
                b: level.level() as i64,
            },
            Command::SetBuffers {
                visible,
                write,
                copy_visible_to_write,
                auto_swap,
            } => WireCommand::Buffers {
                v: visible.name().to_string(),
                w: write.name().to_string(),
                c: *copy_visible_to_write,
                a: *auto_swap,
            },
            Command::TestLights(level) => WireCommand::Test {
                i: level.level() as i64,
            },
            Command::SetLights { .. } => return Err(ProtocolError::Unsupported("set_lights")),
            Command::ScrollText { .. } => return Err(ProtocolError::Unsupported("scroll_text")),
        };
        Ok(wire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireColor {
    pub r: i64,
    pub g: i64,
}

impl From<Color> for WireColor {
    fn from(color: Color) -> Self {
        Self {
            r: color.red() as i64,
            g: color.green() as i64,
        }
    }
}

/// JSON shape of an inbound command. Values are checked by [`WireCommand::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "evt")]
pub enum WireCommand {
    #[serde(rename = "RST")]
    Reset,
    #[serde(rename = "PADLGT")]
    PadLight {
        x: i64,
        y: i64,
        c: WireColor,
        o: String,
    },
    #[serde(rename = "BTNLGT")]
    ButtonLight {
        t: bool,
        i: i64,
        c: WireColor,
        o: String,
    },
    #[serde(rename = "BRGHT")]
    Brightness { b: i64 },
    #[serde(rename = "BUF")]
    Buffers {
        v: String,
        w: String,
        #[serde(default)]
        c: bool,
        #[serde(default)]
        a: bool,
    },
    #[serde(rename = "TST")]
    Test { i: i64 },
    #[serde(other)]
    Unknown,
}

impl WireCommand {
    /// Check every field and build the typed command.
    ///
    /// Returns `Ok(None)` for an unrecognized discriminator.
    pub fn validate(self) -> Result<Option<Command>, ProtocolError> {
        let command = match self {
            WireCommand::Reset => Command::Reset,
            WireCommand::PadLight { x, y, c, o } => Command::SetPadLight {
                pad: Pad::at(x, y)?,
                color: Color::of(c.r, c.g)?,
                operation: operation(&o)?,
            },
            WireCommand::ButtonLight { t, i, c, o } => Command::SetButtonLight {
                button: Button::at(t, i)?,
                color: Color::of(c.r, c.g)?,
                operation: operation(&o)?,
            },
            WireCommand::Brightness { b } => Command::SetBrightness(Brightness::of(b)?),
            WireCommand::Buffers { v, w, c, a } => Command::SetBuffers {
                visible: buffer("v", &v)?,
                write: buffer("w", &w)?,
                copy_visible_to_write: c,
                auto_swap: a,
            },
            WireCommand::Test { i } => Command::TestLights(Brightness::checked("i", i)?),
            WireCommand::Unknown => return Ok(None),
        };
        Ok(Some(command))
    }
}

fn operation(value: &str) -> Result<BackBufferOperation, ProtocolError> {
    value.parse().map_err(|_| ProtocolError::InvalidValue {
        field: "o",
        value: value.to_string(),
    })
}

fn buffer(field: &'static str, value: &str) -> Result<BufferId, ProtocolError> {
    value.parse().map_err(|_| ProtocolError::InvalidValue {
        field,
        value: value.to_string(),
    })
}

/// A user interaction with the emulated surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    PadPressed(Pad),
    PadReleased(Pad),
    ButtonPressed(Button),
    ButtonReleased(Button),
}

impl Event {
    pub fn pressed(control: Control) -> Self {
        match control {
            Control::Pad(pad) => Event::PadPressed(pad),
            Control::Button(button) => Event::ButtonPressed(button),
        }
    }

    pub fn released(control: Control) -> Self {
        match control {
            Control::Pad(pad) => Event::PadReleased(pad),
            Control::Button(button) => Event::ButtonReleased(button),
        }
    }

    pub fn control(self) -> Control {
        match self {
            Event::PadPressed(pad) | Event::PadReleased(pad) => Control::Pad(pad),
            Event::ButtonPressed(button) | Event::ButtonReleased(button) => {
                Control::Button(button)
            }
        }
    }

    pub fn is_press(self) -> bool {
        matches!(self, Event::PadPressed(_) | Event::ButtonPressed(_))
    }

    /// Top buttons travel as `(index, -1)`, right buttons as `(-1, index)`.
    pub fn to_wire(self) -> WireEvent {
        let (evt, x, y) = match self {
            Event::PadPressed(pad) => (EventKind::PP, pad.x() as i64, pad.y() as i64),
            Event::PadReleased(pad) => (EventKind::PR, pad.x() as i64, pad.y() as i64),
            Event::ButtonPressed(button) => {
                let (x, y) = button_coords(button);
                (EventKind::BP, x, y)
            }
            Event::ButtonReleased(button) => {
                let (x, y) = button_coords(button);
                (EventKind::BR, x, y)
            }
        };
        WireEvent { evt, x, y }
    }
}

fn button_coords(button: Button) -> (i64, i64) {
    let c = button.coordinate() as i64;
    if button.is_top() {
        (c, -1)
    } else {
        (-1, c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    PP,
    PR,
    BP,
    BR,
}

/// JSON shape of an outbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEvent {
    pub evt: EventKind,
    pub x: i64,
    pub y: i64,
}

impl TryFrom<WireEvent> for Event {
    type Error = ProtocolError;

    fn try_from(wire: WireEvent) -> Result<Self, Self::Error> {
        let button = || {
            if wire.x == -1 {
                Button::at_right(wire.y)
            } else {
                Button::at_top(wire.x)
            }
        };
        Ok(match wire.evt {
            EventKind::PP => Event::PadPressed(Pad::at(wire.x, wire.y)?),
            EventKind::PR => Event::PadReleased(Pad::at(wire.x, wire.y)?),
            EventKind::BP => Event::ButtonPressed(button()?),
            EventKind::BR => Event::ButtonReleased(button()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Option<Command>, ProtocolError> {
        serde_json::from_str::<WireCommand>(json)?.validate()
    }

    #[test]
    fn decodes_pad_light() {
        let command = parse(r#"{"evt":"PADLGT","x":3,"y":4,"c":{"r":2,"g":1},"o":"NONE"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            command,
            Command::SetPadLight {
                pad: Pad::at(3, 4).unwrap(),
                color: Color::of(2, 1).unwrap(),
                operation: BackBufferOperation::None,
            }
        );
    }

    #[test]
    fn decodes_buffers_with_shared_c_field() {
        let command = parse(r#"{"evt":"BUF","v":"BUFFER_1","w":"BUFFER_0","c":true,"a":false}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            command,
            Command::SetBuffers {
                visible: BufferId::Buffer1,
                write: BufferId::Buffer0,
                copy_visible_to_write: true,
                auto_swap: false,
            }
        );
    }

    #[test]
    fn unknown_discriminator_is_not_a_command() {
        assert!(parse(r#"{"evt":"TXT","t":"hello"}"#).unwrap().is_none());
    }

    #[test]
    fn invalid_fields_are_named() {
        let err = parse(r#"{"evt":"PADLGT","x":9,"y":0,"c":{"r":0,"g":0},"o":"NONE"}"#).unwrap_err();
        assert_eq!(err.field(), Some("x"));

        let err = parse(r#"{"evt":"BTNLGT","t":true,"i":1,"c":{"r":0,"g":5},"o":"COPY"}"#)
            .unwrap_err();
        assert_eq!(err.field(), Some("c.g"));

        let err = parse(r#"{"evt":"BTNLGT","t":true,"i":1,"c":{"r":0,"g":0},"o":"SWAP"}"#)
            .unwrap_err();
        assert_eq!(err.field(), Some("o"));

        let err = parse(r#"{"evt":"BUF","v":"BUFFER_0","w":"BUFFER_7","c":false,"a":false}"#)
            .unwrap_err();
        assert_eq!(err.field(), Some("w"));

        let err = parse(r#"{"evt":"TST","i":20}"#).unwrap_err();
        assert_eq!(err.field(), Some("i"));
    }

    #[test]
    fn missing_fields_are_malformed() {
        let err = parse(r#"{"evt":"BRGHT"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn button_events_use_edge_convention() {
        let top = Event::ButtonPressed(Button::Left).to_wire();
        assert_eq!((top.evt, top.x, top.y), (EventKind::BP, 2, -1));

        let right = Event::ButtonReleased(Button::Solo).to_wire();
        assert_eq!((right.evt, right.x, right.y), (EventKind::BR, -1, 6));

        assert_eq!(Event::try_from(right).unwrap(), Event::ButtonReleased(Button::Solo));
    }

    #[test]
    fn wire_event_serializes_as_flat_object() {
        let pad = Pad::at(1, 7).unwrap();
        let json = serde_json::to_string(&Event::PadPressed(pad).to_wire()).unwrap();
        assert_eq!(json, r#"{"evt":"PP","x":1,"y":7}"#);
    }

    #[test]
    fn application_side_encoding_matches_wire_names() {
        let command = Command::SetButtonLight {
            button: Button::Arm,
            color: Color::ORANGE,
            operation: BackBufferOperation::Clear,
        };
        let json = serde_json::to_value(command.to_wire().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"evt":"BTNLGT","t":false,"i":7,"c":{"r":3,"g":2},"o":"CLEAR"})
        );

        let unsupported = Command::SetLights {
            colors: vec![Color::RED],
            operation: BackBufferOperation::None,
        };
        assert!(matches!(
            unsupported.to_wire(),
            Err(ProtocolError::Unsupported(_))
        ));
    }
}
