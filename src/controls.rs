use std::{fmt, str::FromStr};

use crate::error::ProtocolError;

pub const MIN_COORD: u8 = 0;
pub const MAX_COORD: u8 = 7;

/// Side length of the unified light grid: 8 pads plus one row/column of buttons.
pub const GRID_SIZE: usize = 9;

fn coordinate(field: &'static str, value: i64) -> Result<u8, ProtocolError> {
    if (MIN_COORD as i64..=MAX_COORD as i64).contains(&value) {
        Ok(value as u8)
    } else {
        Err(ProtocolError::out_of_range(field, value, "0..=7"))
    }
}

/// One of the 64 square pads, `(0, 0)` being top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pad {
    x: u8,
    y: u8,
}

impl Pad {
    pub fn at(x: i64, y: i64) -> Result<Self, ProtocolError> {
        Ok(Self {
            x: coordinate("x", x)?,
            y: coordinate("y", y)?,
        })
    }

    pub fn x(self) -> u8 {
        self.x
    }

    pub fn y(self) -> u8 {
        self.y
    }
}

impl fmt::Display for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pad[{},{}]", self.x, self.y)
    }
}

/// The round buttons along the top edge and the right edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    Session,
    User1,
    User2,
    Mixer,
    Vol,
    Pan,
    SndA,
    SndB,
    Stop,
    TrackOn,
    Solo,
    Arm,
}

impl Button {
    pub const TOP: [Button; 8] = [
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::Session,
        Button::User1,
        Button::User2,
        Button::Mixer,
    ];

    pub const RIGHT: [Button; 8] = [
        Button::Vol,
        Button::Pan,
        Button::SndA,
        Button::SndB,
        Button::Stop,
        Button::TrackOn,
        Button::Solo,
        Button::Arm,
    ];

    pub fn at_top(index: i64) -> Result<Self, ProtocolError> {
        Ok(Self::TOP[coordinate("i", index)? as usize])
    }

    pub fn at_right(index: i64) -> Result<Self, ProtocolError> {
        Ok(Self::RIGHT[coordinate("i", index)? as usize])
    }

    pub fn at(is_top: bool, index: i64) -> Result<Self, ProtocolError> {
        if is_top {
            Self::at_top(index)
        } else {
            Self::at_right(index)
        }
    }

    pub fn is_top(self) -> bool {
        Self::TOP.contains(&self)
    }

    /// Position along the edge the button sits on.
    pub fn coordinate(self) -> u8 {
        let row = if self.is_top() { &Self::TOP } else { &Self::RIGHT };
        row.iter().position(|&b| b == self).unwrap_or_default() as u8
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let edge = if self.is_top() { "top" } else { "right" };
        write!(f, "Button[{:?}({},{})]", self, edge, self.coordinate())
    }
}

/// Anything that can be lit or pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Pad(Pad),
    Button(Button),
}

impl Control {
    /// Every control on the device, column by column.
    pub fn all() -> impl Iterator<Item = Control> {
        (0..GRID_SIZE).flat_map(|column| {
            (0..GRID_SIZE).filter_map(move |row| Cell { column, row }.control())
        })
    }

    pub(crate) fn cell(self) -> Cell {
        match self {
            Control::Pad(pad) => Cell {
                column: pad.x as usize,
                row: pad.y as usize + 1,
            },
            Control::Button(button) if button.is_top() => Cell {
                column: button.coordinate() as usize,
                row: 0,
            },
            Control::Button(button) => Cell {
                column: GRID_SIZE - 1,
                row: button.coordinate() as usize + 1,
            },
        }
    }
}

impl From<Pad> for Control {
    fn from(pad: Pad) -> Self {
        Control::Pad(pad)
    }
}

impl From<Button> for Control {
    fn from(button: Button) -> Self {
        Control::Button(button)
    }
}

/// Position in the unified 9×9 grid: top buttons on row 0, right buttons on
/// the last column, pads shifted down by one row. `(8, 0)` has no control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cell {
    pub column: usize,
    pub row: usize,
}

impl Cell {
    pub fn control(self) -> Option<Control> {
        let last = GRID_SIZE - 1;
        match (self.column, self.row) {
            (c, 0) if c == last => None,
            (c, 0) if c < last => Some(Control::Button(Button::TOP[c])),
            (c, r) if c == last && r < GRID_SIZE => Some(Control::Button(Button::RIGHT[r - 1])),
            (c, r) if c < last && r < GRID_SIZE => Some(Control::Pad(Pad {
                x: c as u8,
                y: (r - 1) as u8,
            })),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BufferId {
    #[default]
    Buffer0,
    Buffer1,
}

impl BufferId {
    pub fn other(self) -> Self {
        match self {
            BufferId::Buffer0 => BufferId::Buffer1,
            BufferId::Buffer1 => BufferId::Buffer0,
        }
    }

    pub fn index(self) -> usize {
        match self {
            BufferId::Buffer0 => 0,
            BufferId::Buffer1 => 1,
        }
    }

    pub(crate) fn from_bit(bit: u8) -> Self {
        if bit & 1 == 0 {
            BufferId::Buffer0
        } else {
            BufferId::Buffer1
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BufferId::Buffer0 => "BUFFER_0",
            BufferId::Buffer1 => "BUFFER_1",
        }
    }
}

impl FromStr for BufferId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUFFER_0" => Ok(BufferId::Buffer0),
            "BUFFER_1" => Ok(BufferId::Buffer1),
            _ => Err(()),
        }
    }
}

/// What a light-setting command also does to the back buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BackBufferOperation {
    #[default]
    None,
    Copy,
    Clear,
}

impl BackBufferOperation {
    pub fn name(self) -> &'static str {
        match self {
            BackBufferOperation::None => "NONE",
            BackBufferOperation::Copy => "COPY",
            BackBufferOperation::Clear => "CLEAR",
        }
    }
}

impl FromStr for BackBufferOperation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(BackBufferOperation::None),
            "COPY" => Ok(BackBufferOperation::Copy),
            "CLEAR" => Ok(BackBufferOperation::Clear),
            _ => Err(()),
        }
    }
}

/// Device intensity level, `0..=15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Brightness(u8);

impl Brightness {
    pub const MIN: Brightness = Brightness(0);
    pub const MAX: Brightness = Brightness(15);

    pub fn of(level: i64) -> Result<Self, ProtocolError> {
        Self::checked("b", level)
    }

    pub(crate) fn checked(field: &'static str, level: i64) -> Result<Self, ProtocolError> {
        if (Self::MIN.0 as i64..=Self::MAX.0 as i64).contains(&level) {
            Ok(Brightness(level as u8))
        } else {
            Err(ProtocolError::out_of_range(field, level, "0..=15"))
        }
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn more(self) -> Self {
        Brightness(self.0.saturating_add(1).min(Self::MAX.0))
    }

    pub fn less(self) -> Self {
        Brightness(self.0.saturating_sub(1))
    }

    /// Opacity applied to lit cells at this level.
    pub fn opacity(self) -> f32 {
        0.1 + 0.06 * self.0 as f32
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Brightness::MAX
    }
}

/// Text scrolling speed, `1..=7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScrollSpeed(u8);

impl ScrollSpeed {
    pub const MIN: ScrollSpeed = ScrollSpeed(1);
    pub const MAX: ScrollSpeed = ScrollSpeed(7);

    pub fn of(speed: i64) -> Result<Self, ProtocolError> {
        if (Self::MIN.0 as i64..=Self::MAX.0 as i64).contains(&speed) {
            Ok(ScrollSpeed(speed as u8))
        } else {
            Err(ProtocolError::out_of_range("speed", speed, "1..=7"))
        }
    }

    pub fn speed(self) -> u8 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_rejects_out_of_range() {
        assert!(Pad::at(0, 7).is_ok());
        assert_eq!(Pad::at(8, 0).unwrap_err().field(), Some("x"));
        assert_eq!(Pad::at(0, -1).unwrap_err().field(), Some("y"));
    }

    #[test]
    fn buttons_round_trip_coordinates() {
        for i in 0..8 {
            let top = Button::at_top(i).unwrap();
            assert!(top.is_top());
            assert_eq!(top.coordinate() as i64, i);

            let right = Button::at_right(i).unwrap();
            assert!(!right.is_top());
            assert_eq!(right.coordinate() as i64, i);
        }
        assert_eq!(Button::at(true, 4).unwrap(), Button::Session);
        assert_eq!(Button::at(false, 5).unwrap(), Button::TrackOn);
        assert!(Button::at_right(8).is_err());
    }

    #[test]
    fn control_cells_follow_grid_layout() {
        assert_eq!(Control::Pad(Pad::at(3, 4).unwrap()).cell(), Cell { column: 3, row: 5 });
        assert_eq!(Control::Button(Button::Left).cell(), Cell { column: 2, row: 0 });
        assert_eq!(Control::Button(Button::Vol).cell(), Cell { column: 8, row: 1 });
        assert_eq!(Cell { column: 8, row: 0 }.control(), None);
    }

    #[test]
    fn all_controls_cover_eighty_cells() {
        let controls: Vec<_> = Control::all().collect();
        assert_eq!(controls.len(), 80);
        for control in controls {
            assert_eq!(control.cell().control(), Some(control));
        }
    }

    #[test]
    fn brightness_saturates_and_maps_to_opacity() {
        assert_eq!(Brightness::MAX.more(), Brightness::MAX);
        assert_eq!(Brightness::MIN.less(), Brightness::MIN);
        assert!((Brightness::MIN.opacity() - 0.1).abs() < 1e-6);
        assert!((Brightness::MAX.opacity() - 1.0).abs() < 1e-6);
        assert_eq!(Brightness::of(16).unwrap_err().field(), Some("b"));
    }

    #[test]
    fn buffer_names_parse() {
        assert_eq!("BUFFER_1".parse::<BufferId>(), Ok(BufferId::Buffer1));
        assert!("BUFFER_2".parse::<BufferId>().is_err());
        assert_eq!(BufferId::Buffer0.other(), BufferId::Buffer1);
    }
}
