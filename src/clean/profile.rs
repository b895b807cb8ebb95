use crate::docx::Rgb;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// ASCII punctuation to full-width equivalents, in application order.
///
/// Multi-character keys precede the single characters they start with, and
/// ASCII spaces are removed.
const DEFAULT_PUNCTUATION: &[(&str, &str)] = &[
    (",", "，"),
    ("?", "？"),
    ("!", "！"),
    (":", "："),
    (";", "；"),
    ("(", "（"),
    (")", "）"),
    ("[", "【"),
    ("]", "】"),
    ("{", "｛"),
    ("}", "｝"),
    ("<=", "≤"),
    (">=", "≥"),
    ("<", "＜"),
    (">", "＞"),
    ("\"", "“"),
    ("'", "’"),
    ("/", "／"),
    ("\\", "＼"),
    ("&", "＆"),
    ("#", "＃"),
    ("*", "＊"),
    ("%", "％"),
    ("@", "＠"),
    ("^", "＾"),
    ("-", "－"),
    ("=", "＝"),
    ("+", "＋"),
    ("_", "＿"),
    ("`", "｀"),
    ("~", "～"),
    (" ", ""),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    #[default]
    A4,
    A5,
    B5,
    Letter,
}

impl PageSize {
    /// Portrait (width, height) in inches.
    pub fn dimensions_inches(&self) -> (f32, f32) {
        match self {
            PageSize::A4 => (8.27, 11.69),
            PageSize::A5 => (5.83, 8.27),
            PageSize::B5 => (6.93, 9.84),
            PageSize::Letter => (8.5, 11.0),
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageSize::A4 => "A4",
            PageSize::A5 => "A5",
            PageSize::B5 => "B5",
            PageSize::Letter => "Letter",
        };
        f.write_str(name)
    }
}

/// Case-insensitive; unknown names fall back to A4.
impl FromStr for PageSize {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "a4" => PageSize::A4,
            "a5" => PageSize::A5,
            "b5" => PageSize::B5,
            "letter" => PageSize::Letter,
            other => {
                log::warn!("unknown page size '{other}', using A4");
                PageSize::A4
            }
        })
    }
}

/// Page margins in centimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 2.5,
            bottom: 2.0,
            left: 2.0,
            right: 2.0,
        }
    }
}

/// Ordered text replacements applied to every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PunctuationMap(Vec<(String, String)>);

impl PunctuationMap {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn apply(&self, text: &str) -> String {
        self.0
            .iter()
            .filter(|(from, _)| !from.is_empty())
            .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
    }
}

impl Default for PunctuationMap {
    fn default() -> Self {
        Self(
            DEFAULT_PUNCTUATION
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        )
    }
}

/// Target formatting convention for [`clean_document`](super::clean_document).
#[derive(Debug, Clone, PartialEq)]
pub struct CleanProfile {
    pub page_size: PageSize,
    pub margins: Margins,
    pub font_size_pt: f32,
    pub font_name: String,
    pub line_spacing_pt: f32,
    pub first_line_indent_pt: f32,
    pub font_color: Rgb,
    pub punctuation: PunctuationMap,
}

impl Default for CleanProfile {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            margins: Margins::default(),
            font_size_pt: 14.0,
            font_name: "宋体".to_string(),
            line_spacing_pt: 30.0,
            first_line_indent_pt: 28.0,
            font_color: Rgb::BLACK,
            punctuation: PunctuationMap::default(),
        }
    }
}
