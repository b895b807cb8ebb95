//! Assembling the diff-annotated output document.

use crate::diff::{self, DiffStyle};
use crate::docx::{DocxError, OutputDocument};

pub const DEFAULT_HEADING: &str = "Revised Document";
pub const DEFAULT_PREAMBLE: &str = "The paragraphs below are the model's \
paragraph-by-paragraph revisions. Only changed paragraphs are kept: deleted \
text is struck through in red, inserted text is bold blue.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructOptions {
    pub heading: String,
    pub preamble: String,
    pub diff_style: DiffStyle,
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            heading: DEFAULT_HEADING.to_string(),
            preamble: DEFAULT_PREAMBLE.to_string(),
            diff_style: DiffStyle::default(),
        }
    }
}

/// The built document plus the indices of the paragraphs it contains.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub document: OutputDocument,
    pub changed: Vec<usize>,
}

/// Pad with empty strings or truncate so there is one revision per original.
pub fn normalize_revisions(mut revised: Vec<String>, len: usize) -> Vec<String> {
    revised.resize(len, String::new());
    revised
}

/// Pair each original with its revision and append one diff paragraph per
/// genuine change.
///
/// A pair is skipped when the trimmed revision is empty or equal to the
/// trimmed original.
pub fn reconstruct(
    originals: &[String],
    revised: Vec<String>,
    options: &ReconstructOptions,
) -> Reconstruction {
    if revised.len() != originals.len() {
        log::warn!(
            "got {} revisions for {} paragraphs, normalizing",
            revised.len(),
            originals.len()
        );
    }
    let revised = normalize_revisions(revised, originals.len());

    let mut document = OutputDocument::new();
    document.add_heading(&options.heading, 1);
    document.add_text(&options.preamble);

    let mut changed = Vec::new();
    for (index, (original, revision)) in originals.iter().zip(&revised).enumerate() {
        let original = original.trim();
        let revision = revision.trim();
        if revision.is_empty() || revision == original {
            continue;
        }

        let spans = diff::render(original, revision);
        document.add_paragraph(options.diff_style.to_runs(&spans));
        changed.push(index);
    }

    log::info!(
        "{} of {} paragraphs changed",
        changed.len(),
        originals.len()
    );
    Reconstruction { document, changed }
}

/// [`reconstruct`] and serialize the result.
pub fn build_revised_document(
    originals: &[String],
    revised: Vec<String>,
    options: &ReconstructOptions,
) -> Result<Vec<u8>, DocxError> {
    reconstruct(originals, revised, options).document.into_bytes()
}
