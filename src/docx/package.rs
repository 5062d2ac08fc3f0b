use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Error;
use crate::xml::XmlElement;

pub trait RelationshipLookup {
    fn find_target_by_relationship_id(&self, id: &str) -> Option<String>;
}

pub trait ContentTypeLookup {
    fn find_content_type(&self, path: &str) -> Option<String>;
}

/// Byte access by path. Implementations must be shareable across threads
/// because images keep a handle for deferred reads.
pub trait FileSource: Send + Sync {
    fn read(&self, path: &str) -> std::io::Result<Vec<u8>>;
}

#[derive(Clone, Debug, Default)]
pub struct Relationships {
    targets: HashMap<String, String>,
}

impl Relationships {
    pub fn new(targets: HashMap<String, String>) -> Self {
        Self { targets }
    }
}

impl RelationshipLookup for Relationships {
    fn find_target_by_relationship_id(&self, id: &str) -> Option<String> {
        self.targets.get(id).cloned()
    }
}

impl RelationshipLookup for HashMap<String, String> {
    fn find_target_by_relationship_id(&self, id: &str) -> Option<String> {
        self.get(id).cloned()
    }
}

pub fn read_relationships_xml(root: &XmlElement) -> Relationships {
    let targets = root
        .element_children()
        .filter(|n| n.name == "relationships:Relationship" || n.name == "Relationship")
        .filter_map(|n| Some((n.attribute("Id")?.to_string(), n.attribute("Target")?.to_string())))
        .collect();
    Relationships { targets }
}

const IMAGE_CONTENT_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("bmp", "image/bmp"),
    ("svg", "image/svg+xml"),
    ("emf", "image/x-emf"),
    ("wmf", "image/x-wmf"),
];

/// `[Content_Types].xml`: overrides by part name, defaults by extension.
#[derive(Clone, Debug, Default)]
pub struct ContentTypes {
    overrides: HashMap<String, String>,
    extension_defaults: HashMap<String, String>,
}

impl ContentTypeLookup for ContentTypes {
    fn find_content_type(&self, path: &str) -> Option<String> {
        let part_name = format!("/{}", path.trim_start_matches('/'));
        if let Some(content_type) = self.overrides.get(&part_name) {
            return Some(content_type.clone());
        }
        let extension = path.rsplit_once('.')?.1.to_ascii_lowercase();
        self.extension_defaults.get(&extension).cloned().or_else(|| {
            IMAGE_CONTENT_TYPES
                .iter()
                .find(|(ext, _)| *ext == extension)
                .map(|(_, content_type)| content_type.to_string())
        })
    }
}

pub fn read_content_types_xml(root: &XmlElement) -> ContentTypes {
    let mut content_types = ContentTypes::default();
    for node in root.element_children() {
        let Some(content_type) = node.attribute("ContentType") else {
            continue;
        };
        match node.name.as_str() {
            "content-types:Override" => {
                if let Some(part_name) = node.attribute("PartName") {
                    content_types
                        .overrides
                        .insert(part_name.to_string(), content_type.to_string());
                }
            }
            "content-types:Default" => {
                if let Some(extension) = node.attribute("Extension") {
                    content_types
                        .extension_defaults
                        .insert(extension.to_ascii_lowercase(), content_type.to_string());
                }
            }
            _ => {}
        }
    }
    content_types
}

/// Archive entries, read on demand from an in-memory copy of the package.
#[derive(Clone)]
pub struct ZipFiles {
    bytes: Arc<[u8]>,
}

impl ZipFiles {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Result<Self, Error> {
        let bytes = bytes.into();
        zip::ZipArchive::new(Cursor::new(&bytes[..]))?;
        Ok(Self { bytes })
    }
}

impl FileSource for ZipFiles {
    fn read(&self, path: &str) -> std::io::Result<Vec<u8>> {
        let mut zip = zip::ZipArchive::new(Cursor::new(&self.bytes[..]))?;
        let mut entry = zip.by_name(path)?;
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        Ok(data)
    }
}

/// Files next to the document, for images linked rather than embedded.
#[derive(Clone, Debug, Default)]
pub struct ExternalFiles {
    base: Option<PathBuf>,
}

impl ExternalFiles {
    pub fn new(base: Option<PathBuf>) -> Self {
        Self { base }
    }
}

impl FileSource for ExternalFiles {
    fn read(&self, path: &str) -> std::io::Result<Vec<u8>> {
        let path = path.strip_prefix("file:///").unwrap_or(path);
        let resolved = match &self.base {
            Some(base) if !std::path::Path::new(path).is_absolute() => base.join(path),
            _ => PathBuf::from(path),
        };
        if self.base.is_none() && !resolved.is_absolute() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("could not find external image '{path}', path of input document is unknown"),
            ));
        }
        std::fs::read(&resolved).map_err(|e| {
            std::io::Error::new(e.kind(), format!("{}: {}", e, resolved.display()))
        })
    }
}

/// Resolve a relationship target against the directory of its part.
pub fn uri_to_zip_entry_name(base: &str, uri: &str) -> String {
    if let Some(absolute) = uri.strip_prefix('/') {
        absolute.to_string()
    } else if base.is_empty() {
        uri.to_string()
    } else {
        format!("{base}/{uri}")
    }
}

/// Replace (or add) the `#fragment` of a URI.
pub fn replace_fragment(uri: &str, fragment: &str) -> String {
    let base = uri.split_once('#').map_or(uri, |(base, _)| base);
    format!("{base}#{fragment}")
}

/// `word/_rels/footnotes.xml.rels` for `word/footnotes.xml`.
pub fn relationships_path(part_path: &str) -> String {
    match part_path.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part_path}.rels"),
    }
}
