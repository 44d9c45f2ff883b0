use crate::color::Color;
use crate::controls::{BackBufferOperation, Brightness, BufferId, Button, Pad, ScrollSpeed};
use crate::error::ProtocolError;
use crate::protocol::{Command, Event};

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xB0;
const SYSEX_START: u8 = 0xF0;
const SYSEX_END: u8 = 0xF7;

/// Channel used by the rapid LED update.
const RAPID_UPDATE_CHANNEL: u8 = 3;
const TOP_BUTTON_BASE: u8 = 104;
const ROW_STRIDE: u8 = 16;
const PRESSED_VELOCITY: u8 = 0x7F;

const CTL_MODE: u8 = 0;
const CTL_DUTY_LOW: u8 = 30;
const CTL_DUTY_HIGH: u8 = 31;

const MODE_RESET: u8 = 0;
const MODE_BUFFERS: std::ops::RangeInclusive<u8> = 32..=63;
const MODE_TEST_LOW: u8 = 125;
const MODE_TEST_MEDIUM: u8 = 126;
const MODE_TEST_HIGH: u8 = 127;

const BUFFER_COPY_FLAG: u8 = 0x10;
const BUFFER_AUTO_SWAP_FLAG: u8 = 0x08;

const COLOR_FLAGS: u8 = 0x0C;
const COLOR_CLEAR: u8 = 0x08;
const COLOR_COPY: u8 = 0x0C;

const TEXT_HEADER: [u8; 5] = [SYSEX_START, 0x00, 0x20, 0x29, 0x09];
const TEXT_LOOP_FLAG: u8 = 0x40;

/// Decode one Launchpad MIDI message into a command.
///
/// `Ok(None)` is returned for messages the emulator does not model.
pub fn decode(bytes: &[u8]) -> Result<Option<Command>, ProtocolError> {
    let Some(&status) = bytes.first() else {
        return Ok(None);
    };
    if status == SYSEX_START {
        return decode_sysex(bytes);
    }

    let (Some(&data1), Some(&data2)) = (bytes.get(1), bytes.get(2)) else {
        return Ok(None);
    };
    let channel = status & 0x0F;

    match (status & 0xF0, channel) {
        (NOTE_ON, 0) => note(data1, raw_color(data2)).map(Some),
        (NOTE_OFF, 0) => note(data1, (Color::OFF, BackBufferOperation::None)).map(Some),
        (NOTE_ON, RAPID_UPDATE_CHANNEL) => {
            let (first, operation) = raw_color(data1);
            let (second, _) = raw_color(data2);
            Ok(Some(Command::SetLights {
                colors: vec![first, second],
                operation,
            }))
        }
        (CONTROL_CHANGE, 0) => control_change(data1, data2),
        _ => Ok(None),
    }
}

fn note(note: u8, (color, operation): (Color, BackBufferOperation)) -> Result<Command, ProtocolError> {
    let x = note % ROW_STRIDE;
    let y = note / ROW_STRIDE;
    if x == 8 && y < 8 {
        return Ok(Command::SetButtonLight {
            button: Button::at_right(y as i64)?,
            color,
            operation,
        });
    }
    let pad = Pad::at(x as i64, y as i64)
        .map_err(|_| ProtocolError::out_of_range("note", note as i64, "x + 16 * y, x <= 8, y <= 7"))?;
    Ok(Command::SetPadLight {
        pad,
        color,
        operation,
    })
}

fn control_change(controller: u8, value: u8) -> Result<Option<Command>, ProtocolError> {
    let command = match controller {
        CTL_MODE => match value {
            MODE_RESET => Command::Reset,
            MODE_TEST_LOW => Command::TestLights(Brightness::of(5)?),
            MODE_TEST_MEDIUM => Command::TestLights(Brightness::of(10)?),
            MODE_TEST_HIGH => Command::TestLights(Brightness::MAX),
            v if MODE_BUFFERS.contains(&v) => Command::SetBuffers {
                visible: BufferId::from_bit(v),
                write: BufferId::from_bit(v >> 2),
                copy_visible_to_write: v & BUFFER_COPY_FLAG != 0,
                auto_swap: v & BUFFER_AUTO_SWAP_FLAG != 0,
            },
            // Layout selection and the other modes are not modelled.
            _ => return Ok(None),
        },
        CTL_DUTY_LOW | CTL_DUTY_HIGH => {
            let base = if controller == CTL_DUTY_LOW { 1 } else { 9 };
            let numerator = base + (value >> 4) as u32;
            let denominator = (value & 0x0F) as u32 + 3;
            Command::SetBrightness(level_for_duty(numerator, denominator))
        }
        c if (TOP_BUTTON_BASE..TOP_BUTTON_BASE + 8).contains(&c) => {
            let (color, operation) = raw_color(value);
            Command::SetButtonLight {
                button: Button::at_top((c - TOP_BUTTON_BASE) as i64)?,
                color,
                operation,
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(command))
}

/// Brightness level `l` drives the LEDs at a duty cycle of `1 / (18 - l)`.
fn level_for_duty(numerator: u32, denominator: u32) -> Brightness {
    let duty = numerator as f32 / denominator as f32;
    let mut best = Brightness::MIN;
    let mut best_distance = f32::MAX;
    let mut level = Brightness::MIN;
    loop {
        let distance = (1.0 / (18 - level.level()) as f32 - duty).abs();
        if distance < best_distance {
            best = level;
            best_distance = distance;
        }
        if level == Brightness::MAX {
            return best;
        }
        level = level.more();
    }
}

fn raw_color(value: u8) -> (Color, BackBufferOperation) {
    let color = Color::from_bits(value, value >> 4);
    let operation = match value & COLOR_FLAGS {
        COLOR_COPY => BackBufferOperation::Copy,
        COLOR_CLEAR => BackBufferOperation::Clear,
        _ => BackBufferOperation::None,
    };
    (color, operation)
}

fn decode_sysex(bytes: &[u8]) -> Result<Option<Command>, ProtocolError> {
    let body = bytes
        .strip_prefix(&TEXT_HEADER[..])
        .and_then(|rest| rest.strip_suffix(&[SYSEX_END]));
    // Color and speed bytes are required, the text may be empty.
    let Some([raw, speed, text @ ..]) = body else {
        return Ok(None);
    };
    let speed = ScrollSpeed::of(*speed as i64)?;
    let (color, operation) = raw_color(raw & !TEXT_LOOP_FLAG);
    Ok(Some(Command::ScrollText {
        text: text.iter().map(|&b| b as char).collect(),
        color,
        speed,
        looping: raw & TEXT_LOOP_FLAG != 0,
        operation,
    }))
}

/// Encode an interaction the way the hardware reports it.
pub fn encode(event: Event) -> [u8; 3] {
    let velocity = if event.is_press() { PRESSED_VELOCITY } else { 0 };
    match event {
        Event::PadPressed(pad) | Event::PadReleased(pad) => {
            [NOTE_ON, pad.x() + ROW_STRIDE * pad.y(), velocity]
        }
        Event::ButtonPressed(button) | Event::ButtonReleased(button) if button.is_top() => {
            [CONTROL_CHANGE, TOP_BUTTON_BASE + button.coordinate(), velocity]
        }
        Event::ButtonPressed(button) | Event::ButtonReleased(button) => {
            [NOTE_ON, 8 + ROW_STRIDE * button.coordinate(), velocity]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_lights_pad_with_raw_color() {
        let command = decode(&[0x90, 0x34, 0x3F]).unwrap().unwrap();
        assert_eq!(
            command,
            Command::SetPadLight {
                pad: Pad::at(4, 3).unwrap(),
                color: Color::AMBER,
                operation: BackBufferOperation::Copy,
            }
        );
    }

    #[test]
    fn raw_color_flags() {
        assert_eq!(raw_color(0x0B), (Color::RED, BackBufferOperation::Clear));
        assert_eq!(raw_color(0x30), (Color::GREEN, BackBufferOperation::None));
        assert_eq!(raw_color(0x04), (Color::BLACK, BackBufferOperation::None));
    }

    #[test]
    fn column_eight_is_the_right_edge() {
        let command = decode(&[0x90, 0x78, 0x0F]).unwrap().unwrap();
        assert_eq!(
            command,
            Command::SetButtonLight {
                button: Button::Arm,
                color: Color::RED,
                operation: BackBufferOperation::Copy,
            }
        );
        let err = decode(&[0x90, 0x09, 0x0F]).unwrap_err();
        assert_eq!(err.field(), Some("note"));
    }

    #[test]
    fn note_off_turns_light_off() {
        let command = decode(&[0x80, 0x00, 0x40]).unwrap().unwrap();
        assert_eq!(
            command,
            Command::SetPadLight {
                pad: Pad::at(0, 0).unwrap(),
                color: Color::OFF,
                operation: BackBufferOperation::None,
            }
        );
    }

    #[test]
    fn mode_controls() {
        assert_eq!(decode(&[0xB0, 0, 0]).unwrap(), Some(Command::Reset));
        assert_eq!(
            decode(&[0xB0, 0, 126]).unwrap(),
            Some(Command::TestLights(Brightness::of(10).unwrap()))
        );
        assert_eq!(
            decode(&[0xB0, 0, 0x31]).unwrap(),
            Some(Command::SetBuffers {
                visible: BufferId::Buffer1,
                write: BufferId::Buffer0,
                copy_visible_to_write: true,
                auto_swap: false,
            })
        );
        assert_eq!(decode(&[0xB0, 0, 1]).unwrap(), None);
    }

    #[test]
    fn duty_cycle_maps_to_level() {
        for level in 0..=15u8 {
            let value = 18 - level - 3;
            assert_eq!(
                decode(&[0xB0, 30, value]).unwrap(),
                Some(Command::SetBrightness(Brightness::of(level as i64).unwrap()))
            );
        }
        // 16/18 is brighter than any level reaches.
        assert_eq!(
            decode(&[0xB0, 31, 0x7F]).unwrap(),
            Some(Command::SetBrightness(Brightness::MAX))
        );
    }

    #[test]
    fn top_buttons_use_control_change() {
        assert_eq!(
            decode(&[0xB0, 106, 0x33]).unwrap(),
            Some(Command::SetButtonLight {
                button: Button::Left,
                color: Color::AMBER,
                operation: BackBufferOperation::None,
            })
        );
    }

    #[test]
    fn rapid_update_and_text_are_recognized() {
        assert!(matches!(
            decode(&[0x93, 0x0F, 0x3C]).unwrap(),
            Some(Command::SetLights { colors, operation: BackBufferOperation::Copy }) if colors == vec![Color::RED, Color::GREEN]
        ));

        let mut sysex = TEXT_HEADER.to_vec();
        sysex.extend_from_slice(&[0x43, 4, b'h', b'i', SYSEX_END]);
        assert_eq!(
            decode(&sysex).unwrap(),
            Some(Command::ScrollText {
                text: "hi".into(),
                color: Color::RED,
                speed: ScrollSpeed::of(4).unwrap(),
                looping: true,
                operation: BackBufferOperation::None,
            })
        );
    }

    #[test]
    fn unmodelled_messages_are_not_commands() {
        assert_eq!(decode(&[]).unwrap(), None);
        assert_eq!(decode(&[0xE0, 0, 0]).unwrap(), None);
        assert_eq!(decode(&[0x90, 0x00]).unwrap(), None);
        assert_eq!(decode(&[0xF0, 0x7E, 0xF7]).unwrap(), None);
    }

    #[test]
    fn short_text_sysex_is_ignored() {
        let mut no_speed = TEXT_HEADER.to_vec();
        no_speed.extend_from_slice(&[0x03, SYSEX_END]);
        assert_eq!(decode(&no_speed).unwrap(), None);

        let mut unterminated = TEXT_HEADER.to_vec();
        unterminated.push(0x03);
        assert_eq!(decode(&unterminated).unwrap(), None);

        assert_eq!(decode(&TEXT_HEADER).unwrap(), None);
    }

    #[test]
    fn empty_text_sysex_still_scrolls() {
        let mut sysex = TEXT_HEADER.to_vec();
        sysex.extend_from_slice(&[0x30, 7, SYSEX_END]);
        assert_eq!(
            decode(&sysex).unwrap(),
            Some(Command::ScrollText {
                text: String::new(),
                color: Color::GREEN,
                speed: ScrollSpeed::MAX,
                looping: false,
                operation: BackBufferOperation::None,
            })
        );

        let mut bad_speed = TEXT_HEADER.to_vec();
        bad_speed.extend_from_slice(&[0x30, 0, SYSEX_END]);
        assert_eq!(decode(&bad_speed).unwrap_err().field(), Some("speed"));
    }

    #[test]
    fn encodes_interactions_like_the_hardware() {
        let pad = Pad::at(2, 3).unwrap();
        assert_eq!(encode(Event::PadPressed(pad)), [0x90, 0x32, 0x7F]);
        assert_eq!(encode(Event::PadReleased(pad)), [0x90, 0x32, 0x00]);
        assert_eq!(encode(Event::ButtonPressed(Button::Mixer)), [0xB0, 111, 0x7F]);
        assert_eq!(encode(Event::ButtonReleased(Button::Pan)), [0x90, 0x18, 0x00]);
    }
}
