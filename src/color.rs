use std::fmt;

use crate::error::ProtocolError;

pub const MIN_INTENSITY: u8 = 0;
pub const MAX_INTENSITY: u8 = 3;

/// A concrete display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Build a color from a three-digit hex triple such as `0xC60`.
    const fn short(hex: u16) -> Self {
        let r = ((hex >> 8) & 0xF) as u8;
        let g = ((hex >> 4) & 0xF) as u8;
        let b = (hex & 0xF) as u8;
        Self {
            r: r * 0x11,
            g: g * 0x11,
            b: b * 0x11,
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Display colors, indexed `[red][green]`.
pub const PALETTE: [[Rgb; 4]; 4] = [
    [
        Rgb::short(0xCCC),
        Rgb::short(0x060),
        Rgb::short(0x0C2),
        Rgb::short(0x0F4),
    ],
    [
        Rgb::short(0x600),
        Rgb::short(0x660),
        Rgb::short(0x6C2),
        Rgb::short(0x6F4),
    ],
    [
        Rgb::short(0xC00),
        Rgb::short(0xC60),
        Rgb::short(0xCC2),
        Rgb::short(0xCF4),
    ],
    [
        Rgb::short(0xF00),
        Rgb::short(0xF60),
        Rgb::short(0xFC2),
        Rgb::short(0xFF4),
    ],
];

/// Red/green LED intensities, each in `0..=3`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color {
    red: u8,
    green: u8,
}

impl Color {
    pub const BLACK: Color = Color { red: 0, green: 0 };
    pub const RED: Color = Color { red: 3, green: 0 };
    pub const GREEN: Color = Color { red: 0, green: 3 };
    pub const ORANGE: Color = Color { red: 3, green: 2 };
    pub const AMBER: Color = Color { red: 3, green: 3 };
    pub const YELLOW: Color = Color { red: 2, green: 3 };

    /// The color unset cells render as. Never dimmed.
    pub const OFF: Color = Color::BLACK;

    pub fn of(red: i64, green: i64) -> Result<Self, ProtocolError> {
        Ok(Self {
            red: intensity("c.r", red)?,
            green: intensity("c.g", green)?,
        })
    }

    /// Build a color from intensities already masked to two bits.
    pub(crate) fn from_bits(red: u8, green: u8) -> Self {
        Self {
            red: red & MAX_INTENSITY,
            green: green & MAX_INTENSITY,
        }
    }

    pub fn red(self) -> u8 {
        self.red
    }

    pub fn green(self) -> u8 {
        self.green
    }

    pub fn is_off(self) -> bool {
        self == Color::OFF
    }

    pub fn rgb(self) -> Rgb {
        PALETTE[self.red as usize][self.green as usize]
    }
}

fn intensity(field: &'static str, value: i64) -> Result<u8, ProtocolError> {
    if (MIN_INTENSITY as i64..=MAX_INTENSITY as i64).contains(&value) {
        Ok(value as u8)
    } else {
        Err(ProtocolError::out_of_range(field, value, "0..=3"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_expands_short_hex() {
        assert_eq!(Color::OFF.rgb().to_string(), "#CCCCCC");
        assert_eq!(Color::of(2, 1).unwrap().rgb().to_string(), "#CC6600");
        assert_eq!(Color::AMBER.rgb().to_string(), "#FFFF44");
    }

    #[test]
    fn off_color_is_unique_in_palette() {
        let off = Color::OFF.rgb();
        let matches = PALETTE.iter().flatten().filter(|&&rgb| rgb == off).count();
        assert_eq!(matches, 1);
    }

    #[test]
    fn rejects_out_of_range_components() {
        let err = Color::of(4, 0).unwrap_err();
        assert_eq!(err.field(), Some("c.r"));

        let err = Color::of(0, -1).unwrap_err();
        assert_eq!(err.field(), Some("c.g"));
    }
}
