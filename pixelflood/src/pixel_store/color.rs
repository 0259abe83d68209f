// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::fmt::{Display, Formatter, Result};

/// An opaque color. Displayed as 6 lowercase hex digits, `rrggbb`, the same convention
/// the protocol accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);

    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self { Self { red, green, blue } }

    /// Only the low 24 bits of `value` (`0xRRGGBB`) are used.
    #[must_use]
    pub const fn from_u32(value: u32) -> Self {
        let [_, red, green, blue] = value.to_be_bytes();
        Self { red, green, blue }
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

/// What to do with the alpha byte of an 8 hex digit color token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    /// Composite over the stored pixel.
    #[default]
    Blend,
    /// Drop the alpha byte and replace the stored pixel.
    Ignore,
}

/// A color as it arrives in a `PX x y <color>` command, ready to be applied to a stored
/// pixel by [`crate::composite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    /// `rrggbb` (or fewer digits, left padded with zeros). Replaces the stored pixel.
    Opaque(Rgb),
    /// `rrggbbaa`. Blended over the stored pixel with weight `alpha / 255`.
    Blend { color: Rgb, alpha: u8 },
}

/// Token lengths, in hex digits.
pub mod color_token_len {
    pub const RGB: usize = 6;
    pub const RGBA: usize = 8;
}

impl Paint {
    /// Parse a color token.
    ///
    /// - 1 to 6 hex digits: opaque `rrggbb`, left padded with zeros (`ff` is `0000ff`).
    /// - 8 hex digits: `rrggbbaa`, see [`AlphaMode`].
    /// - Anything else (empty, 7 or more than 8 digits, a non hex character): `None`.
    ///
    /// Hex digits are case insensitive.
    #[must_use]
    pub fn parse_hex(token: &[u8], alpha_mode: AlphaMode) -> Option<Self> {
        match token.len() {
            1..=color_token_len::RGB => {
                parse_hex_u32(token).map(|value| Self::Opaque(Rgb::from_u32(value)))
            }
            color_token_len::RGBA => {
                let value = parse_hex_u32(token)?;
                let [red, green, blue, alpha] = value.to_be_bytes();
                let color = Rgb::new(red, green, blue);
                Some(match alpha_mode {
                    AlphaMode::Blend => Self::Blend { color, alpha },
                    AlphaMode::Ignore => Self::Opaque(color),
                })
            }
            _ => None,
        }
    }
}

/// At most 8 digits, so the value always fits.
fn parse_hex_u32(token: &[u8]) -> Option<u32> {
    token.iter().try_fold(0_u32, |acc, &byte| {
        let digit = char::from(byte).to_digit(16)?;
        Some((acc << 4) | digit)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(b"ff0000", Rgb::new(0xff, 0, 0) ; "full rgb")]
    #[test_case(b"00FF00", Rgb::new(0, 0xff, 0) ; "uppercase")]
    #[test_case(b"ff", Rgb::new(0, 0, 0xff) ; "two digits are blue")]
    #[test_case(b"1", Rgb::new(0, 0, 1) ; "single digit")]
    #[test_case(b"12345", Rgb::new(0x01, 0x23, 0x45) ; "five digits")]
    fn test_parse_opaque(token: &[u8], expected: Rgb) {
        assert_eq!(
            Paint::parse_hex(token, AlphaMode::Blend),
            Some(Paint::Opaque(expected))
        );
    }

    #[test]
    fn test_parse_rgba_blend() {
        assert_eq!(
            Paint::parse_hex(b"00ff0080", AlphaMode::Blend),
            Some(Paint::Blend {
                color: Rgb::new(0, 0xff, 0),
                alpha: 0x80
            })
        );
    }

    #[test]
    fn test_parse_rgba_alpha_ignored() {
        assert_eq!(
            Paint::parse_hex(b"00ff0080", AlphaMode::Ignore),
            Some(Paint::Opaque(Rgb::new(0, 0xff, 0)))
        );
    }

    #[test_case(b"" ; "empty")]
    #[test_case(b"fffffff" ; "seven digits")]
    #[test_case(b"fffffffff" ; "nine digits")]
    #[test_case(b"gg0000" ; "not hex")]
    #[test_case(b"-1" ; "sign")]
    #[test_case(b"\xff\xfe" ; "not ascii")]
    fn test_parse_rejects(token: &[u8]) {
        assert_eq!(Paint::parse_hex(token, AlphaMode::Blend), None);
    }

    #[test]
    fn test_display_is_lowercase_hex() {
        assert_eq!(Rgb::new(0xab, 0x0c, 0xff).to_string(), "ab0cff");
        assert_eq!(Rgb::BLACK.to_string(), "000000");
    }

    #[test]
    fn test_from_u32_drops_high_byte() {
        assert_eq!(Rgb::from_u32(0xaa11_2233), Rgb::new(0x11, 0x22, 0x33));
    }
}
