// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::fmt::{Display, Formatter, Result};

use smallvec::SmallVec;

use crate::{AlphaMode, Paint, Pos, Rgb, Size};

/// Upper bound of tokens a valid command has (`PX x y color`). Longer lines still parse,
/// they just spill to the heap.
pub const INLINE_TOKEN_COUNT: usize = 4;

pub type Tokens<'a> = SmallVec<[&'a [u8]; INLINE_TOKEN_COUNT]>;

pub mod verb {
    pub const SIZE: &[u8] = b"SIZE";
    pub const OFFSET: &[u8] = b"OFFSET";
    pub const PIXEL: &[u8] = b"PX";
}

/// One parsed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Size,
    Offset { x: u32, y: u32 },
    SetPixel { pos: Pos, paint: Paint },
    GetPixel { pos: Pos },
}

impl Command {
    /// Parse a line (without its `\n`). Returns `None` for anything that isn't a well
    /// formed command: unknown or lowercase verbs, missing or non numeric coordinates, a
    /// bad color token. Tokens past the ones a command uses are ignored.
    #[must_use]
    pub fn parse(line: &[u8], alpha_mode: AlphaMode) -> Option<Self> {
        let tokens = tokenize(line);
        let (first, args) = tokens.split_first()?;
        match *first {
            verb::SIZE => Some(Self::Size),
            verb::OFFSET => {
                let [x, y, ..] = args else { return None };
                Some(Self::Offset {
                    x: parse_coordinate(x)?,
                    y: parse_coordinate(y)?,
                })
            }
            verb::PIXEL => match args {
                [x, y] => Some(Self::GetPixel {
                    pos: Pos::new(parse_coordinate(x)?, parse_coordinate(y)?),
                }),
                [x, y, color, ..] => Some(Self::SetPixel {
                    pos: Pos::new(parse_coordinate(x)?, parse_coordinate(y)?),
                    paint: Paint::parse_hex(color, alpha_mode)?,
                }),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Split on runs of ASCII whitespace. A trailing `\r` is whitespace too, so `\r\n`
/// terminated clients work.
#[must_use]
pub fn tokenize(line: &[u8]) -> Tokens<'_> {
    line.split(u8::is_ascii_whitespace)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Decimal digits only, no sign. `None` on overflow.
fn parse_coordinate(token: &[u8]) -> Option<u32> {
    if token.is_empty() {
        return None;
    }
    token.iter().try_fold(0_u32, |acc, &byte| {
        let digit = char::from(byte).to_digit(10)?;
        acc.checked_mul(10)?.checked_add(digit)
    })
}

/// What the server sends back. Each variant displays as one complete line, `\n`
/// included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Size(Size),
    Pixel { pos: Pos, color: Rgb },
}

impl Display for Reply {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::Size(size) => writeln!(f, "SIZE {} {}", size.width, size.height),
            Self::Pixel { pos, color } => writeln!(f, "PX {} {} {color}", pos.x, pos.y),
        }
    }
}
