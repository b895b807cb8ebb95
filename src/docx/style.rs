//! Run-level formatting shared by the writer, the reader and the cleaner.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An sRGB color as written in `w:color/@w:val`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const BLUE: Rgb = Rgb(0, 112, 192);

    /// Uppercase `RRGGBB`, the form WordprocessingML expects.
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.hex())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid color '{0}': expected RRGGBB or #RRGGBB")]
pub struct ParseRgbError(String);

impl FromStr for Rgb {
    type Err = ParseRgbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseRgbError(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ParseRgbError(s.to_string()))
        };
        Ok(Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

/// Visual attributes of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunStyle {
    pub bold: bool,
    pub strike: bool,
    pub color: Option<Rgb>,
}

impl RunStyle {
    pub fn plain() -> Self {
        Self::default()
    }
}

/// A span of text with uniform formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub style: RunStyle,
}

impl Run {
    pub fn new(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, RunStyle::plain())
    }
}

/// Points to twentieths of a point (twips).
pub fn points_to_twips(points: f32) -> i64 {
    (points * 20.0).round() as i64
}

/// Points to the half-point unit used by `w:sz`.
pub fn points_to_half_points(points: f32) -> i64 {
    (points * 2.0).round() as i64
}

pub fn inches_to_twips(inches: f32) -> i64 {
    (inches * 1440.0).round() as i64
}

pub fn cm_to_twips(cm: f32) -> i64 {
    (cm * 1440.0 / 2.54).round() as i64
}
