use super::common::docx_with_paragraphs;
use docrev::diff::DiffStyle;
use docrev::docx::reader::{body_paragraphs, paragraph_style, paragraph_text, styled_runs};
use docrev::docx::{Package, Run};
use docrev::extract::{extract_paragraphs, unit_texts, ParagraphUnit};
use docrev::reconstruct::{build_revised_document, reconstruct, ReconstructOptions};
use docrev::revise::{
    Dispatcher, Progress, RevisionBackend, RevisionClient, RevisionError, SilentProgress,
};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

/// Fixes one known typo and leaves everything else alone.
struct TypoFixer;

impl RevisionBackend for TypoFixer {
    fn try_revise(&self, unit: &ParagraphUnit) -> Result<String, RevisionError> {
        Ok(unit.text.replace("hree", "here"))
    }
}

struct Unreachable;

impl RevisionBackend for Unreachable {
    fn try_revise(&self, _unit: &ParagraphUnit) -> Result<String, RevisionError> {
        Err(RevisionError::Status {
            status: 503,
            body: "service unavailable".to_string(),
        })
    }
}

/// Earlier units answer later, and every answer names its own unit.
struct SlowFirst {
    total: usize,
}

impl RevisionBackend for SlowFirst {
    fn try_revise(&self, unit: &ParagraphUnit) -> Result<String, RevisionError> {
        thread::sleep(Duration::from_millis(10 * (self.total - unit.index) as u64));
        Ok(format!("{} (rev {})", unit.text, unit.index))
    }
}

fn revise_document<B: RevisionBackend>(input: &[u8], backend: B) -> Vec<u8> {
    let package = Package::from_bytes(input).unwrap();
    let units = extract_paragraphs(&package).unwrap();
    let client = RevisionClient::new(backend);
    let table = Dispatcher::new(&client, 5).dispatch(&units, &SilentProgress);
    build_revised_document(
        &unit_texts(&units),
        table.into_inner(),
        &ReconstructOptions::default(),
    )
    .unwrap()
}

fn joined(runs: &[Run], keep: impl Fn(&Run) -> bool) -> String {
    runs.iter().filter(|r| keep(r)).map(|r| r.text.as_str()).collect()
}

#[test]
fn test_end_to_end_only_changed_paragraph_is_reported() {
    let input = docx_with_paragraphs(&["A typo hree.", "", "This line is correct."]);
    let output = revise_document(&input, TypoFixer);

    let package = Package::from_bytes(&output).unwrap();
    let body = package.body().unwrap();
    let paragraphs: Vec<_> = body_paragraphs(body).collect();
    assert_eq!(paragraphs.len(), 3, "heading, preamble and one diff paragraph");
    assert_eq!(paragraph_style(paragraphs[0]), Some("Heading1"));

    let style = DiffStyle::default();
    let runs = styled_runs(paragraphs[2]);
    let deleted: Vec<&Run> = runs.iter().filter(|r| r.style.strike).collect();
    let inserted: Vec<&Run> = runs.iter().filter(|r| r.style.bold).collect();
    assert!(!deleted.is_empty());
    assert!(!inserted.is_empty());
    assert!(deleted
        .iter()
        .all(|r| r.style.color == Some(style.deletion_color) && !r.style.bold));
    assert!(inserted
        .iter()
        .all(|r| r.style.color == Some(style.insertion_color) && !r.style.strike));

    assert_eq!(joined(&runs, |r| !r.style.strike), "A typo here.");
    assert_eq!(joined(&runs, |r| !r.style.bold), "A typo hree.");
}

#[test]
fn test_replacement_shows_deletion_before_insertion() {
    let originals = vec!["The cat sat.".to_string()];
    let revised = vec!["The dog sat.".to_string()];
    let r = reconstruct(&originals, revised, &ReconstructOptions::default());

    let runs = &r.document.paragraphs()[2].runs;
    let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, ["The ", "cat", "dog", " sat."]);
    assert!(runs[1].style.strike);
    assert!(runs[2].style.bold);
}

#[test]
fn test_unreachable_service_gives_heading_only_document() {
    let input = docx_with_paragraphs(&["First.", "Second.", "Third."]);
    let output = revise_document(&input, Unreachable);

    let package = Package::from_bytes(&output).unwrap();
    let texts: Vec<String> = body_paragraphs(package.body().unwrap())
        .map(paragraph_text)
        .collect();
    assert_eq!(texts.len(), 2);
    assert_eq!(texts[0], "Revised Document");
}

#[test]
fn test_empty_document_gives_heading_only_document() {
    let input = docx_with_paragraphs(&["", "   "]);
    let package = Package::from_bytes(&input).unwrap();
    assert!(extract_paragraphs(&package).unwrap().is_empty());

    let output = revise_document(&input, TypoFixer);
    let package = Package::from_bytes(&output).unwrap();
    assert_eq!(body_paragraphs(package.body().unwrap()).count(), 2);
}

#[test]
fn test_out_of_order_completion_keeps_alignment() {
    let texts: Vec<String> = (0..12).map(|i| format!("Paragraph number {i}.")).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let input = docx_with_paragraphs(&refs);

    let package = Package::from_bytes(&input).unwrap();
    let units = extract_paragraphs(&package).unwrap();
    let client = RevisionClient::new(SlowFirst { total: units.len() });

    let order = Mutex::new(Vec::new());
    let observer = |p: Progress| order.lock().unwrap().push(p.index);
    let table = Dispatcher::new(&client, 4).dispatch(&units, &observer);

    let completion_order = order.into_inner().unwrap();
    assert_eq!(completion_order.len(), units.len());
    assert_ne!(completion_order, (0..units.len()).collect::<Vec<_>>());

    for (i, revised) in table.as_slice().iter().enumerate() {
        assert_eq!(revised, &format!("Paragraph number {i}. (rev {i})"));
    }

    let r = reconstruct(&unit_texts(&units), table.into_inner(), &ReconstructOptions::default());
    assert_eq!(r.changed, (0..units.len()).collect::<Vec<_>>());
    for (offset, paragraph) in r.document.paragraphs()[2..].iter().enumerate() {
        assert_eq!(
            paragraph.text(),
            format!("Paragraph number {offset}. (rev {offset})")
        );
    }
}
