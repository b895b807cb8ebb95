//! Minimal owned XML tree for OOXML parts.
//!
//! WordprocessingML parts are small enough to hold in memory, and both the
//! cleaner and the paragraph reader need random access to siblings (a run's
//! `w:rPr` must stay its first child, `w:sectPr` children are ordered), which
//! a streaming rewrite cannot give us. Qualified names are kept verbatim
//! (`w:p`, `w:rPr`), so prefixes survive a parse/serialize cycle unchanged.

use super::errors::DocxError;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing any previous value in place.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key, value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) {
        self.attrs.retain(|(k, _)| k != key);
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// First direct child with the given name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.is(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.child_elements_mut().find(|e| e.is(name))
    }

    /// First descendant with the given name, in document order.
    pub fn find_descendant(&self, name: &str) -> Option<&Element> {
        for child in self.child_elements() {
            if child.is(name) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(name) {
                return Some(found);
            }
        }
        None
    }

    pub fn find_descendant_mut(&mut self, name: &str) -> Option<&mut Element> {
        for child in self.child_elements_mut() {
            if child.is(name) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant_mut(name) {
                return Some(found);
            }
        }
        None
    }

    pub fn contains_descendant(&self, names: &[&str]) -> bool {
        self.child_elements()
            .any(|child| names.contains(&child.name.as_str()) || child.contains_descendant(names))
    }

    /// Drop every direct child element whose name is listed.
    pub fn remove_children(&mut self, names: &[&str]) {
        self.children.retain(|node| match node {
            Node::Element(e) => !names.contains(&e.name.as_str()),
            Node::Text(_) => true,
        });
    }

    /// Insert `child` respecting the schema sequence in `order`, replacing any
    /// existing child of the same name.
    ///
    /// Children whose names are not listed in `order` are treated as trailing.
    pub fn insert_ordered(&mut self, child: Element, order: &[&str]) -> &mut Element {
        let rank = |name: &str| {
            order
                .iter()
                .position(|n| *n == name)
                .unwrap_or(order.len())
        };

        let existing = self.children.iter().position(
            |node| matches!(node, Node::Element(e) if e.name == child.name),
        );
        if let Some(idx) = existing {
            self.children.remove(idx);
        }

        let child_rank = rank(&child.name);
        let position = self
            .children
            .iter()
            .position(|node| matches!(node, Node::Element(e) if rank(&e.name) > child_rank))
            .unwrap_or(self.children.len());

        self.children.insert(position, Node::Element(child));
        match &mut self.children[position] {
            Node::Element(e) => e,
            Node::Text(_) => unreachable!("an element was just inserted at this position"),
        }
    }

    /// Existing child named `name`, or a fresh one inserted in schema order.
    pub fn ensure_ordered(&mut self, name: &str, order: &[&str]) -> &mut Element {
        let existing = self
            .children
            .iter()
            .position(|node| matches!(node, Node::Element(e) if e.name == name));
        match existing {
            Some(idx) => match &mut self.children[idx] {
                Node::Element(e) => e,
                Node::Text(_) => unreachable!("position matched an element"),
            },
            None => self.insert_ordered(Element::new(name), order),
        }
    }

    /// Concatenated direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Replace all direct text children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.retain(|node| matches!(node, Node::Element(_)));
        self.children.push(Node::Text(text.into()));
    }
}

/// Parse an XML part into its root element.
pub fn parse(part: &str, xml: &str) -> Result<Element, DocxError> {
    let wrap = |source: quick_xml::Error| DocxError::Xml {
        part: part.to_string(),
        source,
    };

    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event().map_err(wrap)? {
            Event::Start(ref e) => {
                stack.push(start_element(e).map_err(wrap)?);
            }
            Event::Empty(ref e) => {
                let element = start_element(e).map_err(wrap)?;
                attach(&mut stack, &mut root, element, part)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| {
                    DocxError::malformed(format!("{part}: unbalanced closing tag"))
                })?;
                attach(&mut stack, &mut root, element, part)?;
            }
            Event::Text(e) => {
                if let Some(parent) = stack.last_mut() {
                    let text = e.unescape().map_err(wrap)?;
                    if !text.is_empty() {
                        parent.children.push(Node::Text(text.into_owned()));
                    }
                }
            }
            Event::CData(e) => {
                if let Some(parent) = stack.last_mut() {
                    let raw = e.into_inner();
                    parent
                        .children
                        .push(Node::Text(String::from_utf8_lossy(&raw).into_owned()));
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes are
            // regenerated or dropped on write.
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(DocxError::malformed(format!(
            "{part}: unexpected end of input inside <{}>",
            stack.last().map(|e| e.name.as_str()).unwrap_or_default()
        )));
    }
    root.ok_or_else(|| DocxError::malformed(format!("{part}: no root element")))
}

fn start_element(e: &BytesStart<'_>) -> Result<Element, quick_xml::Error> {
    let mut element = Element::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        element.attrs.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    part: &str,
) -> Result<(), DocxError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(Node::Element(element));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(DocxError::malformed(format!(
            "{part}: more than one root element"
        ))),
    }
}

/// Serialize a root element, with the standard OOXML declaration.
pub fn serialize(root: &Element) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(XML_DECLARATION);
    write_element(&mut out, root);
    out
}

fn write_element(out: &mut String, element: &Element) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        push_escaped(out, value);
        out.push('"');
    }

    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    for child in &element.children {
        match child {
            Node::Element(e) => write_element(out, e),
            Node::Text(t) => push_escaped(out, t),
        }
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

/// Whether `c` matches the XML 1.0 `Char` production.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Escape markup and drop characters no XML parser will accept.
fn push_escaped(out: &mut String, text: &str) {
    if text.chars().all(is_xml_char) {
        out.push_str(&escape(text));
    } else {
        let kept: String = text.chars().filter(|&c| is_xml_char(c)).collect();
        out.push_str(&escape(&kept));
    }
}
