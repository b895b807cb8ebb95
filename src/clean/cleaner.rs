//! In-place normalization of a document's layout and character formatting.

use super::profile::CleanProfile;
use crate::docx::reader::{for_each_run_mut, paragraph_text};
use crate::docx::style::{cm_to_twips, inches_to_twips, points_to_half_points, points_to_twips};
use crate::docx::xml::{Element, Node};
use crate::docx::{DocxError, Package};

const PPR_ORDER: &[&str] = &[
    "w:pStyle",
    "w:keepNext",
    "w:keepLines",
    "w:pageBreakBefore",
    "w:framePr",
    "w:widowControl",
    "w:numPr",
    "w:suppressLineNumbers",
    "w:pBdr",
    "w:shd",
    "w:tabs",
    "w:suppressAutoHyphens",
    "w:kinsoku",
    "w:wordWrap",
    "w:overflowPunct",
    "w:topLinePunct",
    "w:autoSpaceDE",
    "w:autoSpaceDN",
    "w:bidi",
    "w:adjustRightInd",
    "w:snapToGrid",
    "w:spacing",
    "w:ind",
    "w:contextualSpacing",
    "w:mirrorIndents",
    "w:suppressOverlap",
    "w:jc",
    "w:textDirection",
    "w:textAlignment",
    "w:textboxTightWrap",
    "w:outlineLvl",
    "w:divId",
    "w:cnfStyle",
    "w:rPr",
    "w:sectPr",
    "w:pPrChange",
];

const RPR_ORDER: &[&str] = &[
    "w:rStyle",
    "w:rFonts",
    "w:b",
    "w:bCs",
    "w:i",
    "w:iCs",
    "w:caps",
    "w:smallCaps",
    "w:strike",
    "w:dstrike",
    "w:outline",
    "w:shadow",
    "w:emboss",
    "w:imprint",
    "w:noProof",
    "w:snapToGrid",
    "w:vanish",
    "w:webHidden",
    "w:color",
    "w:spacing",
    "w:w",
    "w:kern",
    "w:position",
    "w:sz",
    "w:szCs",
    "w:highlight",
    "w:u",
    "w:effect",
    "w:bdr",
    "w:shd",
    "w:fitText",
    "w:vertAlign",
    "w:rtl",
    "w:cs",
    "w:em",
    "w:lang",
    "w:eastAsianLayout",
    "w:specVanish",
    "w:oMath",
];

const SECTPR_ORDER: &[&str] = &[
    "w:headerReference",
    "w:footerReference",
    "w:footnotePr",
    "w:endnotePr",
    "w:type",
    "w:pgSz",
    "w:pgMar",
    "w:paperSrc",
    "w:pgBorders",
    "w:lnNumType",
    "w:pgNumType",
    "w:cols",
    "w:formProt",
    "w:vAlign",
    "w:noEndnote",
    "w:titlePg",
    "w:textDirection",
    "w:bidi",
    "w:rtlGutter",
    "w:docGrid",
    "w:printerSettings",
    "w:sectPrChange",
];

/// Character effects removed from every run.
const CLEARED_RUN_PROPERTIES: &[&str] = &[
    "w:b",
    "w:bCs",
    "w:i",
    "w:iCs",
    "w:u",
    "w:strike",
    "w:dstrike",
    "w:vertAlign",
    "w:shadow",
    "w:outline",
    "w:emboss",
    "w:imprint",
    "w:highlight",
];

/// Content that keeps an otherwise text-free paragraph alive.
const NON_TEXT_CONTENT: &[&str] = &["w:sectPr", "w:drawing", "w:pict", "w:object"];

/// Header, footer and gutter distances for a freshly created `w:pgMar`.
const DEFAULT_MARGIN_EXTRAS: &[(&str, &str)] =
    &[("w:header", "851"), ("w:footer", "992"), ("w:gutter", "0")];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub paragraphs_formatted: usize,
    pub runs_formatted: usize,
    pub empty_paragraphs_removed: usize,
}

/// Apply `profile` to the package's main document.
///
/// Page size and margins go to the first section. Every non-empty paragraph
/// in the body and in tables gets left alignment, exact line spacing, a
/// first-line indent and uniform run formatting, with punctuation rewritten.
/// Empty body paragraphs are removed unless they carry a section break or
/// embedded graphics.
pub fn clean_document(
    package: &mut Package,
    profile: &CleanProfile,
) -> Result<CleanReport, DocxError> {
    let body = package.body_mut()?;
    let mut report = CleanReport::default();

    apply_page_geometry(body, profile);

    for child in body.child_elements_mut() {
        match child.name.as_str() {
            "w:p" => format_paragraph(child, profile, &mut report),
            "w:tbl" => for_each_nested_paragraph(child, &mut |p: &mut Element| {
                format_paragraph(p, profile, &mut report)
            }),
            _ => {}
        }
    }

    report.empty_paragraphs_removed = remove_empty_paragraphs(body);

    log::info!(
        "formatted {} paragraphs ({} runs), removed {} empty paragraphs",
        report.paragraphs_formatted,
        report.runs_formatted,
        report.empty_paragraphs_removed
    );
    Ok(report)
}

/// Parse, clean and re-serialize a `.docx` held in memory.
pub fn clean_bytes(
    input: &[u8],
    profile: &CleanProfile,
) -> Result<(Vec<u8>, CleanReport), DocxError> {
    let mut package = Package::from_bytes(input)?;
    let report = clean_document(&mut package, profile)?;
    Ok((package.to_bytes()?, report))
}

fn apply_page_geometry(body: &mut Element, profile: &CleanProfile) {
    if body.find_descendant("w:sectPr").is_none() {
        body.push(Element::new("w:sectPr"));
    }
    let Some(section) = body.find_descendant_mut("w:sectPr") else {
        return;
    };

    let (width, height) = profile.page_size.dimensions_inches();
    let page = section.ensure_ordered("w:pgSz", SECTPR_ORDER);
    page.set_attr("w:w", inches_to_twips(width).to_string());
    page.set_attr("w:h", inches_to_twips(height).to_string());

    let margins = section.ensure_ordered("w:pgMar", SECTPR_ORDER);
    let m = &profile.margins;
    for (key, cm) in [
        ("w:top", m.top),
        ("w:bottom", m.bottom),
        ("w:left", m.left),
        ("w:right", m.right),
    ] {
        margins.set_attr(key, cm_to_twips(cm).to_string());
    }
    for (key, value) in DEFAULT_MARGIN_EXTRAS {
        if margins.attr(key).is_none() {
            margins.set_attr(*key, *value);
        }
    }
}

/// Visit every paragraph below `element`, descending through rows, cells,
/// nested tables and content controls.
fn for_each_nested_paragraph(element: &mut Element, f: &mut dyn FnMut(&mut Element)) {
    for child in element.child_elements_mut() {
        if child.is("w:p") {
            f(child);
        } else {
            for_each_nested_paragraph(child, f);
        }
    }
}

fn format_paragraph(paragraph: &mut Element, profile: &CleanProfile, report: &mut CleanReport) {
    if paragraph_text(paragraph).trim().is_empty() {
        return;
    }

    let properties = paragraph.ensure_ordered("w:pPr", &["w:pPr"]);

    properties
        .ensure_ordered("w:jc", PPR_ORDER)
        .set_attr("w:val", "left");

    let spacing = properties.ensure_ordered("w:spacing", PPR_ORDER);
    spacing.set_attr("w:line", points_to_twips(profile.line_spacing_pt).to_string());
    spacing.set_attr("w:lineRule", "exact");

    let indent = properties.ensure_ordered("w:ind", PPR_ORDER);
    for key in ["w:hanging", "w:hangingChars", "w:firstLineChars"] {
        indent.remove_attr(key);
    }
    indent.set_attr(
        "w:firstLine",
        points_to_twips(profile.first_line_indent_pt).to_string(),
    );

    let mut runs = 0;
    for_each_run_mut(paragraph, |run| {
        format_run(run, profile);
        runs += 1;
    });

    report.paragraphs_formatted += 1;
    report.runs_formatted += runs;
}

fn format_run(run: &mut Element, profile: &CleanProfile) {
    let properties = run.ensure_ordered("w:rPr", &["w:rPr"]);
    properties.remove_children(CLEARED_RUN_PROPERTIES);

    let fonts = properties.ensure_ordered("w:rFonts", RPR_ORDER);
    for key in ["w:asciiTheme", "w:hAnsiTheme", "w:eastAsiaTheme"] {
        fonts.remove_attr(key);
    }
    for key in ["w:ascii", "w:hAnsi", "w:eastAsia"] {
        fonts.set_attr(key, profile.font_name.as_str());
    }

    properties.insert_ordered(
        Element::new("w:color").with_attr("w:val", profile.font_color.hex()),
        RPR_ORDER,
    );
    properties.insert_ordered(
        Element::new("w:sz").with_attr(
            "w:val",
            points_to_half_points(profile.font_size_pt).to_string(),
        ),
        RPR_ORDER,
    );

    for text in run.child_elements_mut().filter(|e| e.is("w:t")) {
        let rewritten = profile.punctuation.apply(&text.text());
        text.set_text(rewritten);
        text.set_attr("xml:space", "preserve");
    }
}

fn remove_empty_paragraphs(body: &mut Element) -> usize {
    let before = body.children.len();
    body.children.retain(|node| match node {
        Node::Element(e) if e.is("w:p") => {
            !paragraph_text(e).trim().is_empty() || e.contains_descendant(NON_TEXT_CONTENT)
        }
        _ => true,
    });
    before - body.children.len()
}
