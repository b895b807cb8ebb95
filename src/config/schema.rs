use crate::clean::{CleanProfile, Margins, PageSize, PunctuationMap};
use crate::diff::DiffStyle;
use crate::docx::Rgb;
use crate::reconstruct::{ReconstructOptions, DEFAULT_HEADING, DEFAULT_PREAMBLE};
use crate::revise::{
    PromptTemplate, ServiceSettings, DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_POOL_SIZE,
    DEFAULT_TIMEOUT,
};
use serde::Deserialize;
use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

pub const MARGIN_RANGE_CM: RangeInclusive<f32> = 0.5..=5.0;
pub const FONT_SIZE_RANGE_PT: RangeInclusive<f32> = 10.0..=24.0;
pub const LINE_SPACING_RANGE_PT: RangeInclusive<f32> = 12.0..=60.0;
pub const INDENT_RANGE_PT: RangeInclusive<f32> = 0.0..=56.0;

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct DocrevConfig {
    #[serde(default)]
    pub revision: RevisionConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub clean: CleanConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct RevisionConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
    pub workers: usize,
    /// Overrides the built-in instruction; must contain `{paragraph}`.
    pub prompt: Option<String>,
}

impl Default for RevisionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            workers: DEFAULT_POOL_SIZE,
            prompt: None,
        }
    }
}

impl RevisionConfig {
    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            prompt: self
                .prompt
                .as_deref()
                .map(PromptTemplate::new)
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub heading: String,
    pub preamble: String,
    pub deletion_color: String,
    pub insertion_color: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            heading: DEFAULT_HEADING.to_string(),
            preamble: DEFAULT_PREAMBLE.to_string(),
            deletion_color: Rgb::RED.hex(),
            insertion_color: Rgb::BLUE.hex(),
        }
    }
}

impl OutputConfig {
    /// Colors that fail to parse fall back to the defaults; `validate` reports
    /// them before this is reached.
    pub fn reconstruct_options(&self) -> ReconstructOptions {
        let defaults = DiffStyle::default();
        ReconstructOptions {
            heading: self.heading.clone(),
            preamble: self.preamble.clone(),
            diff_style: DiffStyle {
                deletion_color: self
                    .deletion_color
                    .parse()
                    .unwrap_or(defaults.deletion_color),
                insertion_color: self
                    .insertion_color
                    .parse()
                    .unwrap_or(defaults.insertion_color),
            },
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MarginsConfig {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Default for MarginsConfig {
    fn default() -> Self {
        let m = Margins::default();
        Self {
            top: m.top,
            bottom: m.bottom,
            left: m.left,
            right: m.right,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct CleanConfig {
    pub page_size: String,
    /// Centimeters.
    pub margins: MarginsConfig,
    pub font_size: f32,
    pub font_name: String,
    pub line_spacing: f32,
    pub indent: f32,
    pub color: String,
    /// Replaces the built-in punctuation table when set.
    pub punctuation: Option<Vec<(String, String)>>,
}

impl Default for CleanConfig {
    fn default() -> Self {
        let profile = CleanProfile::default();
        Self {
            page_size: profile.page_size.to_string(),
            margins: MarginsConfig::default(),
            font_size: profile.font_size_pt,
            font_name: profile.font_name,
            line_spacing: profile.line_spacing_pt,
            indent: profile.first_line_indent_pt,
            color: profile.font_color.hex(),
            punctuation: None,
        }
    }
}

impl CleanConfig {
    pub fn profile(&self) -> CleanProfile {
        let page_size: PageSize = match self.page_size.parse() {
            Ok(size) => size,
            Err(never) => match never {},
        };
        CleanProfile {
            page_size,
            margins: Margins {
                top: self.margins.top,
                bottom: self.margins.bottom,
                left: self.margins.left,
                right: self.margins.right,
            },
            font_size_pt: self.font_size,
            font_name: self.font_name.clone(),
            line_spacing_pt: self.line_spacing,
            first_line_indent_pt: self.indent,
            font_color: self.color.parse().unwrap_or(Rgb::BLACK),
            punctuation: self
                .punctuation
                .clone()
                .map(PunctuationMap::new)
                .unwrap_or_default(),
        }
    }
}

impl DocrevConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        let revision = &self.revision;
        if !(revision.endpoint.starts_with("http://") || revision.endpoint.starts_with("https://"))
        {
            issues.push(ValidationIssue::InvalidValue {
                field: "revision.endpoint",
                message: format!("'{}' is not an http(s) URL", revision.endpoint),
            });
        }
        if revision.model.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "revision.model",
            });
        }
        if revision.workers == 0 {
            issues.push(ValidationIssue::InvalidValue {
                field: "revision.workers",
                message: "must be at least 1".to_string(),
            });
        }
        if revision.timeout_secs == 0 {
            issues.push(ValidationIssue::InvalidValue {
                field: "revision.timeout_secs",
                message: "must be at least 1".to_string(),
            });
        }
        if let Some(prompt) = &revision.prompt {
            if !prompt.contains("{paragraph}") {
                issues.push(ValidationIssue::InvalidValue {
                    field: "revision.prompt",
                    message: "must contain the {paragraph} placeholder".to_string(),
                });
            }
        }

        check_color(&mut issues, "output.deletion_color", &self.output.deletion_color);
        check_color(&mut issues, "output.insertion_color", &self.output.insertion_color);

        let clean = &self.clean;
        for (field, value) in [
            ("clean.margins.top", clean.margins.top),
            ("clean.margins.bottom", clean.margins.bottom),
            ("clean.margins.left", clean.margins.left),
            ("clean.margins.right", clean.margins.right),
        ] {
            check_range(&mut issues, field, value, MARGIN_RANGE_CM);
        }
        check_range(&mut issues, "clean.font_size", clean.font_size, FONT_SIZE_RANGE_PT);
        check_range(
            &mut issues,
            "clean.line_spacing",
            clean.line_spacing,
            LINE_SPACING_RANGE_PT,
        );
        check_range(&mut issues, "clean.indent", clean.indent, INDENT_RANGE_PT);
        if clean.font_name.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "clean.font_name",
            });
        }
        check_color(&mut issues, "clean.color", &clean.color);

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

fn check_range(
    issues: &mut Vec<ValidationIssue>,
    field: &'static str,
    value: f32,
    range: RangeInclusive<f32>,
) {
    if !range.contains(&value) {
        issues.push(ValidationIssue::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        });
    }
}

fn check_color(issues: &mut Vec<ValidationIssue>, field: &'static str, value: &str) {
    if let Err(e) = value.parse::<Rgb>() {
        issues.push(ValidationIssue::InvalidValue {
            field,
            message: e.to_string(),
        });
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    MissingField {
        field: &'static str,
    },
    InvalidValue {
        field: &'static str,
        message: String,
    },
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
}

impl ValidationIssue {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationIssue::MissingField { field }
            | ValidationIssue::InvalidValue { field, .. }
            | ValidationIssue::OutOfRange { field, .. } => field,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { field } => {
                write!(f, "missing required field '{field}'")
            }
            ValidationIssue::InvalidValue { field, message } => {
                write!(f, "invalid value for '{field}': {message}")
            }
            ValidationIssue::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "'{field}' is {value}, expected {min} to {max}"),
        }
    }
}
