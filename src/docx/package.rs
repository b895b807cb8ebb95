//! Reading and writing the ZIP container of a `.docx` file.
//!
//! Only the main document part is parsed; every other part (styles,
//! numbering, media, relationships) is carried through byte-for-byte.

use super::errors::DocxError;
use super::xml::{self, Element};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const PACKAGE_RELS: &str = "_rels/.rels";
const DEFAULT_DOCUMENT_PART: &str = "word/document.xml";
const OFFICE_DOCUMENT_REL: &str = "/officeDocument";

/// A loaded `.docx` package.
#[derive(Debug, Clone)]
pub struct Package {
    /// Raw parts in archive order; the main document entry is stale once
    /// `document` has been modified and is regenerated on write.
    parts: Vec<(String, Vec<u8>)>,
    document_part: String,
    document: Element,
}

impl Package {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DocxError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocxError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut content = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut content)?;
            parts.push((file.name().to_string(), content));
        }

        let document_part = locate_document_part(&parts)?;
        let raw = parts
            .iter()
            .find(|(name, _)| *name == document_part)
            .map(|(_, data)| data.as_slice())
            .ok_or_else(|| DocxError::MissingPart {
                name: document_part.clone(),
            })?;
        let text = std::str::from_utf8(raw).map_err(|e| {
            DocxError::malformed(format!("{document_part} is not valid UTF-8: {e}"))
        })?;
        let document = xml::parse(&document_part, text)?;

        if document.find("w:body").is_none() {
            return Err(DocxError::malformed(format!(
                "{document_part} has no w:body element"
            )));
        }

        log::debug!(
            "loaded package with {} parts, main document at {}",
            parts.len(),
            document_part
        );

        Ok(Self {
            parts,
            document_part,
            document,
        })
    }

    pub fn document(&self) -> &Element {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Element {
        &mut self.document
    }

    pub fn body(&self) -> Result<&Element, DocxError> {
        self.document
            .find("w:body")
            .ok_or_else(|| DocxError::malformed("document has no w:body element"))
    }

    pub fn body_mut(&mut self) -> Result<&mut Element, DocxError> {
        self.document
            .find_mut("w:body")
            .ok_or_else(|| DocxError::malformed("document has no w:body element"))
    }

    /// Raw bytes of a non-document part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// Serialize the package, regenerating the main document part.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let document = xml::serialize(&self.document);
        let entries = self.parts.iter().map(|(name, data)| {
            if *name == self.document_part {
                (name.as_str(), document.as_bytes())
            } else {
                (name.as_str(), data.as_slice())
            }
        });
        write_archive(entries)
    }
}

/// Write `(name, bytes)` entries into a deflated ZIP archive.
pub(crate) fn write_archive<'a>(
    entries: impl IntoIterator<Item = (&'a str, &'a [u8])>,
) -> Result<Vec<u8>, DocxError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, data) in entries {
        zip.start_file(name, options)?;
        zip.write_all(data)?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Resolve the main document part through the package relationships,
/// falling back to the conventional location.
fn locate_document_part(parts: &[(String, Vec<u8>)]) -> Result<String, DocxError> {
    let Some((_, rels)) = parts.iter().find(|(name, _)| name == PACKAGE_RELS) else {
        return Ok(DEFAULT_DOCUMENT_PART.to_string());
    };

    let text = String::from_utf8_lossy(rels);
    let root = xml::parse(PACKAGE_RELS, &text)?;
    let target = root
        .child_elements()
        .filter(|rel| rel.is("Relationship"))
        .find(|rel| {
            rel.attr("Type")
                .is_some_and(|t| t.ends_with(OFFICE_DOCUMENT_REL))
        })
        .and_then(|rel| rel.attr("Target"));

    Ok(match target {
        Some(target) => target.trim_start_matches('/').to_string(),
        None => DEFAULT_DOCUMENT_PART.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RELS: &str = r#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="/word/main.xml"/></Relationships>"#;
    const DOC: &str = r#"<?xml version="1.0"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>Hi</w:t></w:r></w:p></w:body></w:document>"#;

    #[test]
    fn test_document_part_resolved_through_relationships() {
        let bytes = write_archive([
            (PACKAGE_RELS, RELS.as_bytes()),
            ("word/main.xml", DOC.as_bytes()),
        ])
        .unwrap();

        let package = Package::from_bytes(&bytes).unwrap();
        assert_eq!(package.document_part, "word/main.xml");
        assert!(package.body().is_ok());
    }

    #[test]
    fn test_other_parts_preserved_on_write() {
        let bytes = write_archive([
            ("word/document.xml", DOC.as_bytes()),
            ("word/media/image1.png", &[0x89, 0x50, 0x4E, 0x47][..]),
        ])
        .unwrap();

        let mut package = Package::from_bytes(&bytes).unwrap();
        package
            .body_mut()
            .unwrap()
            .push(Element::new("w:p"));

        let rewritten = Package::from_bytes(&package.to_bytes().unwrap()).unwrap();
        assert_eq!(
            rewritten.part("word/media/image1.png"),
            Some(&[0x89, 0x50, 0x4E, 0x47][..])
        );
        assert_eq!(rewritten.body().unwrap().child_elements().count(), 2);
    }

    #[test]
    fn test_not_a_zip() {
        let err = Package::from_bytes(b"plain text, not a package").unwrap_err();
        assert!(matches!(err, DocxError::Zip(_)));
    }

    #[test]
    fn test_missing_document_part() {
        let bytes = write_archive([("docProps/app.xml", &b"<a/>"[..])]).unwrap();
        let err = Package::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, DocxError::MissingPart { .. }));
    }
}
