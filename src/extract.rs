//! Paragraph extraction: the single canonical split of a document into
//! revision units.

use crate::docx::reader::{body_paragraphs, paragraph_text};
use crate::docx::{DocxError, Package};

/// One non-empty body paragraph, addressed by its position among the
/// extracted units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphUnit {
    pub index: usize,
    pub text: String,
}

impl ParagraphUnit {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Split a package into ordered units with indices `0..N`.
///
/// Paragraph text is trimmed; paragraphs that are empty after trimming are
/// skipped and do not consume an index.
pub fn extract_paragraphs(package: &Package) -> Result<Vec<ParagraphUnit>, DocxError> {
    let body = package.body()?;
    let units: Vec<ParagraphUnit> = body_paragraphs(body)
        .map(paragraph_text)
        .filter_map(|text| {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .enumerate()
        .map(|(index, text)| ParagraphUnit { index, text })
        .collect();

    log::info!("extracted {} paragraph units", units.len());
    Ok(units)
}

/// Texts of the units, in index order.
pub fn unit_texts(units: &[ParagraphUnit]) -> Vec<String> {
    units.iter().map(|u| u.text.clone()).collect()
}
