use std::collections::{BTreeMap, HashMap};

use crate::error::Error;

/// Namespace URIs and the prefixes element names are normalised to.
/// Strict (ISO/IEC 29500) URIs map onto the same prefixes as transitional.
const NAMESPACE_PREFIXES: &[(&str, &str)] = &[
    ("http://schemas.openxmlformats.org/wordprocessingml/2006/main", "w"),
    ("http://purl.oclc.org/ooxml/wordprocessingml/main", "w"),
    ("http://schemas.openxmlformats.org/officeDocument/2006/relationships", "r"),
    ("http://purl.oclc.org/ooxml/officeDocument/relationships", "r"),
    ("http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing", "wp"),
    ("http://purl.oclc.org/ooxml/drawingml/wordprocessingDrawing", "wp"),
    ("http://schemas.openxmlformats.org/drawingml/2006/main", "a"),
    ("http://purl.oclc.org/ooxml/drawingml/main", "a"),
    ("http://schemas.openxmlformats.org/drawingml/2006/picture", "pic"),
    ("http://purl.oclc.org/ooxml/drawingml/picture", "pic"),
    ("http://schemas.openxmlformats.org/package/2006/content-types", "content-types"),
    ("http://schemas.openxmlformats.org/package/2006/relationships", "relationships"),
    ("http://schemas.openxmlformats.org/markup-compatibility/2006", "mc"),
    ("urn:schemas-microsoft-com:vml", "v"),
    ("urn:schemas-microsoft-com:office:office", "o"),
    ("urn:schemas-microsoft-com:office:word", "office-word"),
    ("http://www.w3.org/XML/1998/namespace", "xml"),
];

static EMPTY_ELEMENT: XmlElement = XmlElement {
    name: String::new(),
    attributes: BTreeMap::new(),
    children: Vec::new(),
    element_index: None,
    absolute_index: None,
};

#[derive(Clone, Debug, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// A parsed element with prefix-normalised names (`w:p`, `r:id`, ...).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<XmlNode>,
    /// Position among preceding siblings with the same name.
    pub element_index: Option<usize>,
    /// Position among all element siblings.
    pub absolute_index: Option<usize>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse an XML string and return its root element.
    pub fn parse(xml: &str) -> Result<XmlElement, Error> {
        let doc = roxmltree::Document::parse(xml)?;
        Ok(Self::from_roxmltree(doc.root_element()))
    }

    pub fn from_roxmltree(node: roxmltree::Node) -> XmlElement {
        let name = qualified_name(node.tag_name().namespace(), node.tag_name().name());
        let attributes = node
            .attributes()
            .map(|a| (qualified_name(a.namespace(), a.name()), a.value().to_string()))
            .collect();
        let children = node
            .children()
            .filter_map(|child| {
                if child.is_element() {
                    Some(XmlNode::Element(Self::from_roxmltree(child)))
                } else if child.is_text() {
                    child.text().map(|t| XmlNode::Text(t.to_string()))
                } else {
                    None
                }
            })
            .collect();
        XmlElement {
            name,
            attributes,
            children,
            element_index: None,
            absolute_index: None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn element_children(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    pub fn first(&self, name: &str) -> Option<&XmlElement> {
        self.element_children().find(|e| e.name == name)
    }

    /// Like [`first`](Self::first), but yields an empty element when missing
    /// so chained lookups stay total.
    pub fn first_or_empty(&self, name: &str) -> &XmlElement {
        self.first(name).unwrap_or(&EMPTY_ELEMENT)
    }

    /// All descendants named `name`, in document order.
    pub fn elements_by_tag_name<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        collect_descendants(self, name, &mut found);
        found
    }

    /// Concatenated text of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Assign `element_index` and `absolute_index` to every descendant,
    /// relative to its own siblings.
    pub fn assign_indices(&mut self) {
        let mut per_name: HashMap<String, usize> = HashMap::new();
        let mut absolute = 0usize;
        for child in &mut self.children {
            let XmlNode::Element(el) = child else {
                continue;
            };
            let count = per_name.entry(el.name.clone()).or_insert(0);
            el.element_index = Some(*count);
            el.absolute_index = Some(absolute);
            *count += 1;
            absolute += 1;
            el.assign_indices();
        }
    }
}

fn collect_descendants<'a>(el: &'a XmlElement, name: &str, out: &mut Vec<&'a XmlElement>) {
    for child in el.element_children() {
        if child.name == name {
            out.push(child);
        }
        collect_descendants(child, name, out);
    }
}

fn qualified_name(namespace: Option<&str>, local: &str) -> String {
    let Some(uri) = namespace else {
        return local.to_string();
    };
    match NAMESPACE_PREFIXES.iter().find(|(ns, _)| *ns == uri) {
        Some((_, prefix)) => format!("{prefix}:{local}"),
        None => format!("{{{uri}}}{local}"),
    }
}
