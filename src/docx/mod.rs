mod body;
mod numbering;
mod package;
mod styles;
mod symbols;

use std::path::Path;
use std::sync::Arc;

pub use body::{BodyReader, BodyReaderOptions};
pub use numbering::{AbstractNum, Numbering, NumberingOptions, read_numbering_xml};
pub use package::{
    ContentTypeLookup, ContentTypes, ExternalFiles, FileSource, RelationshipLookup, Relationships,
    ZipFiles, read_content_types_xml, read_relationships_xml, relationships_path,
    replace_fragment, uri_to_zip_entry_name,
};
pub use styles::{NumberingStyle, Style, StyleKind, StyleNumbering, StyleRef, Styles, read_styles_xml};
pub use symbols::{dingbat_to_unicode, hex_to_unicode};

use crate::error::Error;
use crate::model::{Comment, Document, Node, Note, NoteType, Notes};
use crate::results::{Diagnostic, Outcome, error};
use crate::xml::{XmlElement, XmlNode};

const OFFICE_DOCUMENT_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const STRICT_OFFICE_DOCUMENT_TYPE: &str =
    "http://purl.oclc.org/ooxml/officeDocument/relationships/officeDocument";

pub fn read(path: &Path) -> Result<Outcome<Document>, Error> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Io(
            std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())),
        ),
        _ => Error::Io(e),
    })?;
    let base = path.parent().map(Path::to_path_buf);
    read_package(bytes, ExternalFiles::new(base))
}

pub fn read_bytes(bytes: &[u8]) -> Result<Outcome<Document>, Error> {
    read_package(bytes.to_vec(), ExternalFiles::new(None))
}

/// Lookup tables shared by every part of one package.
struct Package {
    zip: Arc<ZipFiles>,
    files: Arc<dyn FileSource>,
    content_types: ContentTypes,
    styles: Arc<Styles>,
    numbering: Numbering,
    messages: Vec<Diagnostic>,
}

impl Package {
    /// Parse an optional part. Absent parts are skipped quietly; parts that
    /// fail to parse are skipped with an error diagnostic.
    fn optional_part(&mut self, path: &str) -> Option<XmlElement> {
        read_optional_part(&self.zip, path, &mut self.messages)
    }

    fn part_relationships(&mut self, part_path: &str) -> Relationships {
        self.optional_part(&relationships_path(part_path))
            .map(|root| read_relationships_xml(&root))
            .unwrap_or_default()
    }

    fn options<'a>(&'a self, relationships: &'a Relationships) -> BodyReaderOptions<'a> {
        BodyReaderOptions {
            relationships,
            content_types: &self.content_types,
            docx_file: self.zip.clone(),
            files: self.files.clone(),
            numbering: &self.numbering,
            styles: &self.styles,
        }
    }

    fn read_notes(&mut self, path: &str, element_name: &str, note_type: NoteType) -> Outcome<Vec<Note>> {
        let Some(root) = self.optional_part(path) else {
            return Outcome::empty();
        };
        let relationships = self.part_relationships(path);
        let options = self.options(&relationships);

        let results: Vec<_> = root
            .element_children()
            .filter(|el| el.name == element_name)
            .filter(|el| {
                !matches!(
                    el.attribute("w:type"),
                    Some("separator" | "continuationSeparator")
                )
            })
            .map(|el| {
                let note_id = el.attribute("w:id").unwrap_or_default().to_string();
                BodyReader::new(&options)
                    .read_xml_elements(el.element_children())
                    .insert_extra()
                    .map(|body| {
                        vec![Note {
                            note_type,
                            note_id,
                            body,
                        }]
                    })
            })
            .collect();
        Outcome::combine(results)
    }

    fn read_comments(&mut self) -> Outcome<Vec<Comment>> {
        let path = "word/comments.xml";
        let Some(root) = self.optional_part(path) else {
            return Outcome::empty();
        };
        let relationships = self.part_relationships(path);
        let options = self.options(&relationships);

        let results: Vec<_> = root
            .element_children()
            .filter(|el| el.name == "w:comment")
            .map(|el| {
                let attr = |name: &str| el.attribute(name).filter(|v| !v.is_empty()).map(String::from);
                let comment_id = el.attribute("w:id").unwrap_or_default().to_string();
                let (author_name, author_initials) = (attr("w:author"), attr("w:initials"));
                BodyReader::new(&options)
                    .read_xml_elements(el.element_children())
                    .insert_extra()
                    .map(|body| {
                        vec![Comment {
                            comment_id,
                            body,
                            author_name,
                            author_initials,
                        }]
                    })
            })
            .collect();
        Outcome::combine(results)
    }
}

fn read_optional_part(zip: &ZipFiles, path: &str, messages: &mut Vec<Diagnostic>) -> Option<XmlElement> {
    let Ok(bytes) = zip.read(path) else {
        log::debug!("Part {path} not present, skipping");
        return None;
    };
    match parse_part(&bytes) {
        Ok(root) => Some(root),
        Err(e) => {
            log::debug!("Part {path} failed to parse: {e}");
            messages.push(error(format!("Could not read {path}: {e}")));
            None
        }
    }
}

fn parse_part(bytes: &[u8]) -> Result<XmlElement, Error> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::InvalidDocx(format!("part is not valid UTF-8: {e}")))?;
    XmlElement::parse(text.trim_start_matches('\u{feff}'))
}

/// Path of the main document part, from the package relationships.
fn find_document_path(zip: &ZipFiles, messages: &mut Vec<Diagnostic>) -> String {
    read_optional_part(zip, "_rels/.rels", messages)
        .and_then(|root| {
            root.element_children()
                .find(|rel| {
                    matches!(
                        rel.attribute("Type"),
                        Some(OFFICE_DOCUMENT_TYPE | STRICT_OFFICE_DOCUMENT_TYPE)
                    )
                })
                .and_then(|rel| rel.attribute("Target"))
                .map(|target| uri_to_zip_entry_name("", target))
        })
        .unwrap_or_else(|| "word/document.xml".to_string())
}

fn read_package(bytes: Vec<u8>, external: ExternalFiles) -> Result<Outcome<Document>, Error> {
    let zip = ZipFiles::new(bytes)
        .map_err(|_| Error::InvalidDocx("file is not a ZIP archive".into()))?;
    let mut messages = Vec::new();

    let document_path = find_document_path(&zip, &mut messages);
    let content_types = read_optional_part(&zip, "[Content_Types].xml", &mut messages)
        .map(|root| read_content_types_xml(&root))
        .unwrap_or_default();
    let styles = Arc::new(
        read_optional_part(&zip, "word/styles.xml", &mut messages)
            .map(|root| read_styles_xml(&root))
            .unwrap_or_default(),
    );
    let numbering_options = NumberingOptions {
        styles: Some(styles.clone()),
    };
    let numbering = match read_optional_part(&zip, "word/numbering.xml", &mut messages) {
        Some(root) => read_numbering_xml(&root, &numbering_options)?,
        None => Numbering::new(Default::default(), Vec::new(), styles.clone()),
    };

    let document_bytes = zip.read(&document_path).map_err(|_| {
        Error::InvalidDocx(format!("missing {document_path} (is this a DOCX file?)"))
    })?;
    let mut document_root = parse_part(&document_bytes)?;
    let body = document_root
        .children
        .iter_mut()
        .find_map(|child| match child {
            XmlNode::Element(el) if el.name == "w:body" => Some(el),
            _ => None,
        })
        .ok_or_else(|| Error::InvalidDocx("missing w:body".into()))?;
    body.assign_indices();
    let body = std::mem::take(body);

    let mut package = Package {
        zip: Arc::new(zip),
        files: Arc::new(external),
        content_types,
        styles,
        numbering,
        messages,
    };

    let relationships = package.part_relationships(&document_path);
    let body_result = {
        let options = package.options(&relationships);
        BodyReader::new(&options)
            .read_xml_elements(body.element_children())
            .insert_extra()
    };

    let footnotes = package.read_notes("word/footnotes.xml", "w:footnote", NoteType::Footnote);
    let endnotes = package.read_notes("word/endnotes.xml", "w:endnote", NoteType::Endnote);
    let comments = package.read_comments();

    let mut messages = std::mem::take(&mut package.messages);
    let (children, mut body_messages) = body_result.into_parts();
    messages.append(&mut body_messages);
    let (notes, mut note_messages) = Outcome::combine([footnotes, endnotes]).into_parts();
    messages.append(&mut note_messages);
    let (comments, mut comment_messages) = comments.into_parts();
    messages.append(&mut comment_messages);

    log::debug!(
        "Read {}: {} body nodes, {} notes, {} comments",
        document_path,
        children.len(),
        notes.len(),
        comments.len()
    );

    Ok(Outcome::with_messages(
        Document {
            children,
            notes: Notes::new(notes),
            comments,
        },
        messages,
    ))
}

/// Count nodes of the tree, descending into every container.
pub fn count_nodes(nodes: &[Node]) -> usize {
    nodes.iter().map(|n| 1 + count_nodes(n.children())).sum()
}
