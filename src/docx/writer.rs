//! Building a new `.docx` package from styled paragraphs.

use super::errors::DocxError;
use super::package::write_archive;
use super::style::{Run, RunStyle};
use super::xml::{self, Element};

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

/// Highest heading level with a style definition in the generated package.
pub const MAX_HEADING_LEVEL: u8 = 3;

/// A paragraph to be written: optional paragraph style plus runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Paragraph {
    pub style: Option<String>,
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn new(runs: Vec<Run>) -> Self {
        Self { style: None, runs }
    }

    /// Concatenated run text.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Append-only document under construction.
///
/// [`OutputDocument::into_bytes`] consumes the document, so a built document
/// is serialized exactly once.
#[derive(Debug, Clone, Default)]
pub struct OutputDocument {
    paragraphs: Vec<Paragraph>,
}

impl OutputDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a heading; levels are clamped to `1..=MAX_HEADING_LEVEL`.
    pub fn add_heading(&mut self, text: impl Into<String>, level: u8) {
        let level = level.clamp(1, MAX_HEADING_LEVEL);
        self.paragraphs.push(Paragraph {
            style: Some(format!("Heading{level}")),
            runs: vec![Run::plain(text)],
        });
    }

    pub fn add_text(&mut self, text: impl Into<String>) {
        self.paragraphs.push(Paragraph::new(vec![Run::plain(text)]));
    }

    pub fn add_paragraph(&mut self, runs: Vec<Run>) {
        self.paragraphs.push(Paragraph::new(runs));
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Serialize into a complete `.docx` package.
    pub fn into_bytes(self) -> Result<Vec<u8>, DocxError> {
        let document = xml::serialize(&self.document_element());
        let styles = xml::serialize(&styles_element());

        let bytes = write_archive([
            ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
            ("_rels/.rels", PACKAGE_RELS.as_bytes()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes()),
            ("word/document.xml", document.as_bytes()),
            ("word/styles.xml", styles.as_bytes()),
        ])?;

        log::debug!(
            "wrote document with {} paragraphs ({} bytes)",
            self.paragraphs.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    fn document_element(&self) -> Element {
        let mut body = Element::new("w:body");
        for paragraph in &self.paragraphs {
            body.push(paragraph_element(paragraph));
        }
        body.push(default_section());

        Element::new("w:document")
            .with_attr("xmlns:w", WORDML_NS)
            .with_child(body)
    }
}

fn paragraph_element(paragraph: &Paragraph) -> Element {
    let mut p = Element::new("w:p");
    if let Some(style) = &paragraph.style {
        p.push(
            Element::new("w:pPr").with_child(Element::new("w:pStyle").with_attr("w:val", style)),
        );
    }
    for run in &paragraph.runs {
        p.push(run_element(run));
    }
    p
}

fn run_element(run: &Run) -> Element {
    let mut r = Element::new("w:r");
    if let Some(rpr) = run_properties(&run.style) {
        r.push(rpr);
    }

    // Tabs and line breaks are elements in WordprocessingML, not characters.
    let mut pending = String::new();
    for c in run.text.chars() {
        match c {
            '\t' | '\n' => {
                flush_text(&mut r, &mut pending);
                r.push(Element::new(if c == '\t' { "w:tab" } else { "w:br" }));
            }
            '\r' => {}
            _ => pending.push(c),
        }
    }
    flush_text(&mut r, &mut pending);
    r
}

fn flush_text(run: &mut Element, pending: &mut String) {
    if pending.is_empty() {
        return;
    }
    run.push(
        Element::new("w:t")
            .with_attr("xml:space", "preserve")
            .with_text(std::mem::take(pending)),
    );
}

fn run_properties(style: &RunStyle) -> Option<Element> {
    if *style == RunStyle::plain() {
        return None;
    }
    let mut rpr = Element::new("w:rPr");
    if style.bold {
        rpr.push(Element::new("w:b"));
    }
    if style.strike {
        rpr.push(Element::new("w:strike"));
    }
    if let Some(color) = style.color {
        rpr.push(Element::new("w:color").with_attr("w:val", color.hex()));
    }
    Some(rpr)
}

/// A4 portrait with 2.54 cm margins.
fn default_section() -> Element {
    Element::new("w:sectPr")
        .with_child(
            Element::new("w:pgSz")
                .with_attr("w:w", "11906")
                .with_attr("w:h", "16838"),
        )
        .with_child(
            Element::new("w:pgMar")
                .with_attr("w:top", "1440")
                .with_attr("w:right", "1440")
                .with_attr("w:bottom", "1440")
                .with_attr("w:left", "1440")
                .with_attr("w:header", "720")
                .with_attr("w:footer", "720")
                .with_attr("w:gutter", "0"),
        )
}

fn styles_element() -> Element {
    let mut styles = Element::new("w:styles").with_attr("xmlns:w", WORDML_NS);

    styles.push(
        Element::new("w:style")
            .with_attr("w:type", "paragraph")
            .with_attr("w:default", "1")
            .with_attr("w:styleId", "Normal")
            .with_child(Element::new("w:name").with_attr("w:val", "Normal"))
            .with_child(Element::new("w:qFormat")),
    );

    for level in 1..=MAX_HEADING_LEVEL {
        let size = match level {
            1 => "32",
            2 => "28",
            _ => "24",
        };
        styles.push(
            Element::new("w:style")
                .with_attr("w:type", "paragraph")
                .with_attr("w:styleId", format!("Heading{level}"))
                .with_child(Element::new("w:name").with_attr("w:val", format!("heading {level}")))
                .with_child(Element::new("w:basedOn").with_attr("w:val", "Normal"))
                .with_child(Element::new("w:next").with_attr("w:val", "Normal"))
                .with_child(Element::new("w:qFormat"))
                .with_child(
                    Element::new("w:pPr")
                        .with_child(Element::new("w:keepNext"))
                        .with_child(
                            Element::new("w:spacing")
                                .with_attr("w:before", "240")
                                .with_attr("w:after", "120"),
                        )
                        .with_child(
                            Element::new("w:outlineLvl")
                                .with_attr("w:val", (level - 1).to_string()),
                        ),
                )
                .with_child(
                    Element::new("w:rPr")
                        .with_child(Element::new("w:b"))
                        .with_child(Element::new("w:sz").with_attr("w:val", size)),
                ),
        );
    }

    styles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::reader::{body_paragraphs, paragraph_style, paragraph_text, styled_runs};
    use crate::docx::style::Rgb;
    use crate::docx::Package;

    #[test]
    fn test_written_document_reads_back() {
        let mut doc = OutputDocument::new();
        doc.add_heading("Title", 1);
        doc.add_text("Intro");
        doc.add_paragraph(vec![
            Run::plain("keep "),
            Run::new(
                "old",
                RunStyle {
                    bold: false,
                    strike: true,
                    color: Some(Rgb::RED),
                },
            ),
            Run::new(
                "new",
                RunStyle {
                    bold: true,
                    strike: false,
                    color: Some(Rgb::BLUE),
                },
            ),
        ]);

        let package = Package::from_bytes(&doc.into_bytes().unwrap()).unwrap();
        let body = package.body().unwrap();
        let paragraphs: Vec<_> = body_paragraphs(body).collect();

        assert_eq!(paragraphs.len(), 3);
        assert_eq!(paragraph_style(paragraphs[0]), Some("Heading1"));
        assert_eq!(paragraph_text(paragraphs[1]), "Intro");

        let runs = styled_runs(paragraphs[2]);
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[1].text, "old");
        assert!(runs[1].style.strike);
        assert_eq!(runs[1].style.color, Some(Rgb::RED));
        assert_eq!(runs[2].text, "new");
        assert!(runs[2].style.bold);
        assert_eq!(runs[2].style.color, Some(Rgb::BLUE));

        assert!(package.part("word/styles.xml").is_some());
    }

    #[test]
    fn test_run_text_with_tabs_and_breaks() {
        let run = run_element(&Run::plain("a\tb\nc"));
        let names: Vec<&str> = run.child_elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["w:t", "w:tab", "w:t", "w:br", "w:t"]);
    }

    #[test]
    fn test_heading_level_clamped() {
        let mut doc = OutputDocument::new();
        doc.add_heading("Deep", 9);
        assert_eq!(doc.paragraphs()[0].style.as_deref(), Some("Heading3"));
    }
}
