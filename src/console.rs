use std::fmt::Write as _;

use anyhow::{anyhow, bail, Context, Result};
use launchpad_emu::{Button, Control, DisplayColor, Pad, Snapshot};

/// How a simulated pointer interacts with a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Press,
    Release,
    /// Press then release.
    Click,
    /// Press whose release is never reported.
    Hold,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    Empty,
    Json(String),
    Interact { gesture: Gesture, control: Control },
    Show,
    Quit,
}

pub fn parse(line: &str) -> Result<ConsoleLine> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(ConsoleLine::Empty);
    }
    if line.starts_with('{') {
        return Ok(ConsoleLine::Json(line.to_string()));
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        ["show"] => Ok(ConsoleLine::Show),
        ["quit"] | ["exit"] => Ok(ConsoleLine::Quit),
        [gesture, rest @ ..] => Ok(ConsoleLine::Interact {
            gesture: parse_gesture(gesture)?,
            control: parse_control(rest)?,
        }),
        [] => Ok(ConsoleLine::Empty),
    }
}

fn parse_gesture(word: &str) -> Result<Gesture> {
    Ok(match word {
        "press" => Gesture::Press,
        "release" => Gesture::Release,
        "click" => Gesture::Click,
        "hold" => Gesture::Hold,
        other => bail!("unknown console command {other:?}"),
    })
}

fn parse_control(words: &[&str]) -> Result<Control> {
    let number = |word: &str| -> Result<i64> {
        word.parse()
            .with_context(|| format!("expected a number, got {word:?}"))
    };
    Ok(match words {
        ["pad", x, y] => Control::Pad(Pad::at(number(x)?, number(y)?)?),
        ["top", i] => Control::Button(Button::at_top(number(i)?)?),
        ["right", i] => Control::Button(Button::at_right(number(i)?)?),
        _ => return Err(anyhow!("expected `pad X Y`, `top I` or `right I`")),
    })
}

/// Grid position of a control on screen, column then row.
fn position(control: Control) -> (usize, usize) {
    match control {
        Control::Pad(pad) => (pad.x() as usize, pad.y() as usize + 1),
        Control::Button(button) if button.is_top() => (button.coordinate() as usize, 0),
        Control::Button(button) => (8, button.coordinate() as usize + 1),
    }
}

fn swatch(color: DisplayColor) -> String {
    let scale = |channel: u8| (channel as f32 * color.opacity).round() as u8;
    format!(
        "\x1b[48;2;{};{};{}m  \x1b[0m",
        scale(color.rgb.r),
        scale(color.rgb.g),
        scale(color.rgb.b)
    )
}

/// ANSI rendering of the device, followed by a one-line change summary.
pub fn render(snapshot: &Snapshot, previous: &Snapshot) -> String {
    let mut grid = [[None; 9]; 9];
    for (control, color) in snapshot.cells() {
        let (column, row) = position(control);
        grid[row][column] = Some(color);
    }

    let mut out = String::new();
    for row in grid.iter() {
        for cell in row.iter() {
            match cell {
                Some(color) => out.push_str(&swatch(*color)),
                None => out.push_str("  "),
            }
            out.push(' ');
        }
        out.push('\n');
    }
    let changed = snapshot.changes(previous).count();
    let _ = writeln!(out, "{changed} control(s) changed since last render");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchpad_emu::{BackBufferOperation, Color, DeviceState};

    #[test]
    fn parses_interactions() {
        assert_eq!(
            parse("click pad 3 4").unwrap(),
            ConsoleLine::Interact {
                gesture: Gesture::Click,
                control: Control::Pad(Pad::at(3, 4).unwrap()),
            }
        );
        assert_eq!(
            parse("hold right 7").unwrap(),
            ConsoleLine::Interact {
                gesture: Gesture::Hold,
                control: Control::Button(Button::Arm),
            }
        );
        assert_eq!(parse("  show ").unwrap(), ConsoleLine::Show);
        assert_eq!(parse("").unwrap(), ConsoleLine::Empty);
        assert!(matches!(parse(r#"{"evt":"RST"}"#).unwrap(), ConsoleLine::Json(_)));
    }

    #[test]
    fn rejects_bad_lines() {
        assert!(parse("poke pad 1 1").is_err());
        assert!(parse("press pad 1").is_err());
        assert!(parse("press top 8").is_err());
        assert!(parse("press pad a 1").is_err());
    }

    #[test]
    fn render_draws_nine_rows_and_counts_changes() {
        let mut state = DeviceState::new();
        let before = state.snapshot();
        state.set_pad_light(Pad::at(0, 0).unwrap(), Color::RED, BackBufferOperation::None);

        let text = render(&state.snapshot(), &before);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[9], "1 control(s) changed since last render");
        assert!(lines[1].starts_with("\x1b[48;2;255;0;0m"));
    }
}
