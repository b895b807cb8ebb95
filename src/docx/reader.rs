//! Text and run views over WordprocessingML paragraphs.

use super::style::{Rgb, Run, RunStyle};
use super::xml::Element;

/// Containers whose content is not part of the enclosing paragraph's text.
const OPAQUE_CONTAINERS: &[&str] = &["w:txbxContent", "w:pPr", "w:rPr", "w:del"];

/// Inline containers whose `w:r` children belong to the enclosing paragraph.
const RUN_WRAPPERS: &[&str] = &["w:hyperlink", "w:ins", "w:smartTag"];

/// Body-level paragraphs in document order.
///
/// Paragraphs nested in tables, text boxes or content controls are not
/// included.
pub fn body_paragraphs(body: &Element) -> impl Iterator<Item = &Element> {
    body.child_elements().filter(|e| e.is("w:p"))
}

/// Plain text of a paragraph: `w:t` content, tabs as `\t`, breaks as `\n`.
pub fn paragraph_text(paragraph: &Element) -> String {
    let mut text = String::new();
    collect_text(paragraph, &mut text);
    text
}

fn collect_text(element: &Element, out: &mut String) {
    for child in element.child_elements() {
        match child.name.as_str() {
            "w:t" => out.push_str(&child.text()),
            "w:tab" => out.push('\t'),
            "w:br" | "w:cr" => out.push('\n'),
            name if OPAQUE_CONTAINERS.contains(&name) => {}
            _ => collect_text(child, out),
        }
    }
}

/// Runs directly owned by a paragraph, including runs wrapped in hyperlinks,
/// insertions and smart tags.
pub fn paragraph_runs(paragraph: &Element) -> Vec<&Element> {
    let mut runs = Vec::new();
    for child in paragraph.child_elements() {
        match child.name.as_str() {
            "w:r" => runs.push(child),
            name if RUN_WRAPPERS.contains(&name) => {
                runs.extend(child.child_elements().filter(|e| e.is("w:r")))
            }
            _ => {}
        }
    }
    runs
}

/// Mutable counterpart of [`paragraph_runs`].
pub fn for_each_run_mut(paragraph: &mut Element, mut f: impl FnMut(&mut Element)) {
    for child in paragraph.child_elements_mut() {
        if child.is("w:r") {
            f(child);
        } else if RUN_WRAPPERS.contains(&child.name.as_str()) {
            child
                .child_elements_mut()
                .filter(|e| e.is("w:r"))
                .for_each(&mut f);
        }
    }
}

/// Styled runs of a paragraph as the writer would have produced them.
pub fn styled_runs(paragraph: &Element) -> Vec<Run> {
    paragraph_runs(paragraph)
        .into_iter()
        .map(|run| {
            let mut text = String::new();
            collect_text(run, &mut text);
            Run::new(text, run_style(run))
        })
        .collect()
}

fn run_style(run: &Element) -> RunStyle {
    let Some(rpr) = run.find("w:rPr") else {
        return RunStyle::plain();
    };
    RunStyle {
        bold: toggle_on(rpr.find("w:b")),
        strike: toggle_on(rpr.find("w:strike")),
        color: rpr
            .find("w:color")
            .and_then(|c| c.attr("w:val"))
            .filter(|val| *val != "auto")
            .and_then(|val| val.parse::<Rgb>().ok()),
    }
}

/// OOXML toggle properties are on when present unless `w:val` says otherwise.
fn toggle_on(property: Option<&Element>) -> bool {
    match property {
        Some(p) => !matches!(p.attr("w:val"), Some("0" | "false" | "off")),
        None => false,
    }
}

/// Paragraph style id from `w:pPr/w:pStyle`.
pub fn paragraph_style(paragraph: &Element) -> Option<&str> {
    paragraph
        .find("w:pPr")
        .and_then(|ppr| ppr.find("w:pStyle"))
        .and_then(|style| style.attr("w:val"))
}
