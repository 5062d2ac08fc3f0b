#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{fs, io};

use docx_tree::docx::{
    BodyReader, BodyReaderOptions, ContentTypeLookup, FileSource, Numbering, NumberingOptions,
    Styles, read_numbering_xml, read_styles_xml,
};
use docx_tree::model::Node;
use docx_tree::xml::XmlElement;
use docx_tree::{Diagnostic, Outcome};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const NAMESPACES: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture" "#,
    r#"xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" "#,
    r#"xmlns:v="urn:schemas-microsoft-com:vml" "#,
    r#"xmlns:o="urn:schemas-microsoft-com:office:office" "#,
    r#"xmlns:w10="urn:schemas-microsoft-com:office:word""#,
);

/// Parse a WordprocessingML fragment with the usual prefixes in scope.
/// The returned element has its position indices assigned.
pub fn element(fragment: &str) -> XmlElement {
    let mut root = XmlElement::parse(&format!("<w:root {NAMESPACES}>{fragment}</w:root>"))
        .expect("fixture XML must parse");
    root.assign_indices();
    root.element_children()
        .next()
        .cloned()
        .expect("fixture must contain an element")
}

/// Parse a complete part (`w:styles`, `w:numbering`, ...) with prefixes in scope.
/// `root` is the element name, `body` its content.
pub fn part(root: &str, body: &str) -> XmlElement {
    XmlElement::parse(&format!("<{root} {NAMESPACES}>{body}</{root}>"))
        .expect("fixture part must parse")
}

pub fn styles(body: &str) -> Styles {
    read_styles_xml(&part("w:styles", body))
}

pub fn numbering(body: &str, styles: Styles) -> Numbering {
    let options = NumberingOptions {
        styles: Some(Arc::new(styles)),
    };
    read_numbering_xml(&part("w:numbering", body), &options).expect("numbering must build")
}

#[derive(Default)]
pub struct MemoryFiles {
    pub files: HashMap<String, Vec<u8>>,
}

impl FileSource for MemoryFiles {
    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }
}

/// Content types keyed by exact path.
#[derive(Default)]
pub struct FixedContentTypes(pub HashMap<String, String>);

impl ContentTypeLookup for FixedContentTypes {
    fn find_content_type(&self, path: &str) -> Option<String> {
        self.0.get(path).cloned()
    }
}

/// Everything a body reader needs, with overridable pieces.
pub struct Fixture {
    pub relationships: HashMap<String, String>,
    pub content_types: FixedContentTypes,
    pub docx_file: Arc<MemoryFiles>,
    pub files: Arc<MemoryFiles>,
    pub numbering: Numbering,
    pub styles: Styles,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            relationships: HashMap::new(),
            content_types: FixedContentTypes::default(),
            docx_file: Arc::new(MemoryFiles::default()),
            files: Arc::new(MemoryFiles::default()),
            numbering: Numbering::default(),
            styles: Styles::default(),
        }
    }
}

impl Fixture {
    pub fn with_styles(styles: Styles) -> Self {
        Self {
            styles,
            ..Self::default()
        }
    }

    pub fn relationship(mut self, id: &str, target: &str) -> Self {
        self.relationships.insert(id.into(), target.into());
        self
    }

    pub fn content_type(mut self, path: &str, content_type: &str) -> Self {
        self.content_types.0.insert(path.into(), content_type.into());
        self
    }

    pub fn options(&self) -> BodyReaderOptions<'_> {
        BodyReaderOptions {
            relationships: &self.relationships,
            content_types: &self.content_types,
            docx_file: self.docx_file.clone(),
            files: self.files.clone(),
            numbering: &self.numbering,
            styles: &self.styles,
        }
    }

    /// Read one fragment with a fresh reader.
    pub fn read(&self, fragment: &str) -> Outcome<Vec<Node>> {
        BodyReader::new(&self.options()).read_xml_element(&element(fragment))
    }

    /// Read every element of `fragment` in order with a single reader.
    pub fn read_all(&self, fragment: &str) -> Outcome<Vec<Node>> {
        let mut root = part("w:body", fragment);
        root.assign_indices();
        BodyReader::new(&self.options()).read_xml_elements(root.element_children())
    }
}

pub fn messages(outcome: &Outcome<Vec<Node>>) -> Vec<String> {
    outcome.messages.iter().map(|m| m.message.clone()).collect()
}

pub fn warning_texts(messages: &[Diagnostic]) -> Vec<&str> {
    messages.iter().map(|m| m.message.as_str()).collect()
}

/// Build a `.docx` in memory from `(path, content)` pairs.
pub fn build_docx(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        zip.start_file(*name, SimpleFileOptions::default())
            .expect("start zip entry");
        zip.write_all(content.as_bytes()).expect("write zip entry");
    }
    zip.finish().expect("finish zip").into_inner()
}

pub const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="png" ContentType="image/png"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

pub const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

/// Wrap body content in a `w:document` part.
pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {NAMESPACES}><w:body>{body}</w:body></w:document>"#
    )
}

/// `.docx` fixtures under `tests/fixtures/`, if any are checked out.
pub fn discover_fixtures() -> io::Result<Vec<PathBuf>> {
    let fixtures_dir = Path::new("tests/fixtures");
    if !fixtures_dir.is_dir() {
        return Ok(Vec::new());
    }
    let case_filter = std::env::var("DOCX_TREE_CASE").ok();
    let mut fixtures = Vec::new();
    for entry in fs::read_dir(fixtures_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("docx") {
            continue;
        }
        let name = path.file_stem().and_then(|n| n.to_str()).unwrap_or("");
        if case_filter.as_deref().is_none_or(|filter| filter == name) {
            fixtures.push(path);
        }
    }
    fixtures.sort();
    Ok(fixtures)
}
