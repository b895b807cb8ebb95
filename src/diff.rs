//! Character-level diff between an original paragraph and its revision,
//! and its encoding as styled runs.
//!
//! Deleted text is struck through in red, inserted text is bold blue. Within
//! each changed region all deletions come before all insertions, so a reader
//! sees the old wording first and the new wording right after it.

use crate::docx::{Rgb, Run, RunStyle};
use similar::{capture_diff_slices_deadline, Algorithm, DiffTag};
use std::time::{Duration, Instant};

/// Upper bound on alignment time for one paragraph pair; past it the
/// alignment degrades to a coarser (still correct) diff.
const DIFF_DEADLINE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffSpan {
    Equal(String),
    Delete(String),
    Insert(String),
}

impl DiffSpan {
    pub fn text(&self) -> &str {
        match self {
            DiffSpan::Equal(t) | DiffSpan::Delete(t) | DiffSpan::Insert(t) => t,
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, DiffSpan::Equal(_))
    }
}

/// Align `original` and `revised` character by character.
///
/// `replace` regions decompose into a `Delete` immediately followed by an
/// `Insert`. Adjacent spans never share a tag.
pub fn render(original: &str, revised: &str) -> Vec<DiffSpan> {
    let old: Vec<char> = original.chars().collect();
    let new: Vec<char> = revised.chars().collect();
    let ops = capture_diff_slices_deadline(
        Algorithm::Myers,
        &old,
        &new,
        Some(Instant::now() + DIFF_DEADLINE),
    );

    let mut spans = Vec::new();
    let mut deleted = String::new();
    let mut inserted = String::new();

    for op in &ops {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                if new_range.is_empty() {
                    continue;
                }
                flush_change(&mut spans, &mut deleted, &mut inserted);
                let text: String = new[new_range].iter().collect();
                match spans.last_mut() {
                    Some(DiffSpan::Equal(prev)) => prev.push_str(&text),
                    _ => spans.push(DiffSpan::Equal(text)),
                }
            }
            DiffTag::Delete => deleted.extend(&old[old_range]),
            DiffTag::Insert => inserted.extend(&new[new_range]),
            DiffTag::Replace => {
                deleted.extend(&old[old_range]);
                inserted.extend(&new[new_range]);
            }
        }
    }
    flush_change(&mut spans, &mut deleted, &mut inserted);

    spans
}

fn flush_change(spans: &mut Vec<DiffSpan>, deleted: &mut String, inserted: &mut String) {
    if !deleted.is_empty() {
        spans.push(DiffSpan::Delete(std::mem::take(deleted)));
    }
    if !inserted.is_empty() {
        spans.push(DiffSpan::Insert(std::mem::take(inserted)));
    }
}

/// The original text: equal and deleted spans.
pub fn original_text(spans: &[DiffSpan]) -> String {
    spans
        .iter()
        .filter(|s| !matches!(s, DiffSpan::Insert(_)))
        .map(DiffSpan::text)
        .collect()
}

/// The revised text: equal and inserted spans.
pub fn revised_text(spans: &[DiffSpan]) -> String {
    spans
        .iter()
        .filter(|s| !matches!(s, DiffSpan::Delete(_)))
        .map(DiffSpan::text)
        .collect()
}

/// Colors used to mark changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffStyle {
    pub deletion_color: Rgb,
    pub insertion_color: Rgb,
}

impl Default for DiffStyle {
    fn default() -> Self {
        Self {
            deletion_color: Rgb::RED,
            insertion_color: Rgb::BLUE,
        }
    }
}

impl DiffStyle {
    pub fn run_for(&self, span: &DiffSpan) -> Run {
        let style = match span {
            DiffSpan::Equal(_) => RunStyle::plain(),
            DiffSpan::Delete(_) => RunStyle {
                bold: false,
                strike: true,
                color: Some(self.deletion_color),
            },
            DiffSpan::Insert(_) => RunStyle {
                bold: true,
                strike: false,
                color: Some(self.insertion_color),
            },
        };
        Run::new(span.text(), style)
    }

    pub fn to_runs(&self, spans: &[DiffSpan]) -> Vec<Run> {
        spans.iter().map(|span| self.run_for(span)).collect()
    }
}
