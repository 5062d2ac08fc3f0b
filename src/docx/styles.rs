use std::collections::{HashMap, HashSet};

use crate::results::{Outcome, warning};
use crate::xml::XmlElement;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleKind {
    Paragraph,
    Character,
    Table,
}

impl StyleKind {
    fn label(self) -> &'static str {
        match self {
            StyleKind::Paragraph => "Paragraph",
            StyleKind::Character => "Run",
            StyleKind::Table => "Table",
        }
    }
}

/// Numbering properties declared in a style's `w:pPr/w:numPr`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleNumbering {
    pub num_id: Option<String>,
    pub level: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    pub style_id: String,
    pub name: Option<String>,
    pub based_on: Option<String>,
    pub numbering: Option<StyleNumbering>,
}

/// A `w:type="numbering"` style: only a pointer to a numbering instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumberingStyle {
    pub num_id: Option<String>,
}

/// Result of resolving a style reference.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct Styles {
    paragraph_styles: HashMap<String, Style>,
    character_styles: HashMap<String, Style>,
    table_styles: HashMap<String, Style>,
    numbering_styles: HashMap<String, NumberingStyle>,
}

impl Styles {
    pub fn new(
        paragraph_styles: HashMap<String, Style>,
        character_styles: HashMap<String, Style>,
        table_styles: HashMap<String, Style>,
        numbering_styles: HashMap<String, NumberingStyle>,
    ) -> Self {
        Self {
            paragraph_styles,
            character_styles,
            table_styles,
            numbering_styles,
        }
    }

    pub fn paragraph_styles(&self) -> &HashMap<String, Style> {
        &self.paragraph_styles
    }

    pub fn character_styles(&self) -> &HashMap<String, Style> {
        &self.character_styles
    }

    pub fn table_styles(&self) -> &HashMap<String, Style> {
        &self.table_styles
    }

    pub fn numbering_styles(&self) -> &HashMap<String, NumberingStyle> {
        &self.numbering_styles
    }

    pub fn find_paragraph_style_by_id(&self, style_id: &str) -> Option<&Style> {
        self.paragraph_styles.get(style_id)
    }

    pub fn find_character_style_by_id(&self, style_id: &str) -> Option<&Style> {
        self.character_styles.get(style_id)
    }

    pub fn find_table_style_by_id(&self, style_id: &str) -> Option<&Style> {
        self.table_styles.get(style_id)
    }

    pub fn find_numbering_style_by_id(&self, style_id: &str) -> Option<&NumberingStyle> {
        self.numbering_styles.get(style_id)
    }

    fn find(&self, kind: StyleKind, style_id: &str) -> Option<&Style> {
        match kind {
            StyleKind::Paragraph => self.find_paragraph_style_by_id(style_id),
            StyleKind::Character => self.find_character_style_by_id(style_id),
            StyleKind::Table => self.find_table_style_by_id(style_id),
        }
    }

    /// Map a style id to its display name. An unknown id keeps the id,
    /// has no name, and warns.
    pub fn resolve(&self, kind: StyleKind, style_id: Option<&str>) -> Outcome<StyleRef> {
        let Some(id) = style_id.filter(|id| !id.is_empty()) else {
            return Outcome::new(StyleRef::default());
        };
        match self.find(kind, id) {
            Some(style) => Outcome::new(StyleRef {
                id: Some(id.to_string()),
                name: style.name.clone(),
            }),
            None => Outcome::with_messages(
                StyleRef {
                    id: Some(id.to_string()),
                    name: None,
                },
                vec![warning(format!(
                    "{} style with ID {} was referenced but not defined in the document",
                    kind.label(),
                    id
                ))],
            ),
        }
    }

    /// Numbering declared on a paragraph style or, failing that, on the
    /// nearest `basedOn` ancestor that declares it.
    pub fn inherited_numbering(&self, style_id: &str) -> Option<&StyleNumbering> {
        let mut seen = HashSet::new();
        let mut current = Some(style_id);
        while let Some(id) = current {
            if !seen.insert(id) {
                break;
            }
            let style = self.paragraph_styles.get(id)?;
            if let Some(numbering) = &style.numbering {
                return Some(numbering);
            }
            current = style.based_on.as_deref();
        }
        None
    }
}

pub fn read_styles_xml(root: &XmlElement) -> Styles {
    let mut styles = Styles::default();

    for style_element in root.elements_by_tag_name("w:style") {
        let Some(style_id) = style_element.attribute("w:styleId") else {
            continue;
        };
        let numbering = read_style_numbering(style_element);
        match style_element.attribute("w:type") {
            Some("numbering") => {
                styles.numbering_styles.insert(
                    style_id.to_string(),
                    NumberingStyle {
                        num_id: numbering.and_then(|n| n.num_id),
                    },
                );
            }
            Some(kind @ ("paragraph" | "character" | "table")) => {
                let style = Style {
                    style_id: style_id.to_string(),
                    name: style_element
                        .first("w:name")
                        .and_then(|n| n.attribute("w:val"))
                        .map(String::from),
                    based_on: style_element
                        .first("w:basedOn")
                        .and_then(|n| n.attribute("w:val"))
                        .map(String::from),
                    numbering,
                };
                let map = match kind {
                    "paragraph" => &mut styles.paragraph_styles,
                    "character" => &mut styles.character_styles,
                    _ => &mut styles.table_styles,
                };
                map.insert(style_id.to_string(), style);
            }
            _ => {}
        }
    }

    log::debug!(
        "Read styles: {} paragraph, {} character, {} table, {} numbering",
        styles.paragraph_styles.len(),
        styles.character_styles.len(),
        styles.table_styles.len(),
        styles.numbering_styles.len()
    );
    styles
}

fn read_style_numbering(style_element: &XmlElement) -> Option<StyleNumbering> {
    let num_pr = style_element.first("w:pPr")?.first("w:numPr")?;
    Some(StyleNumbering {
        num_id: num_pr
            .first("w:numId")
            .and_then(|n| n.attribute("w:val"))
            .map(String::from),
        level: num_pr
            .first("w:ilvl")
            .and_then(|n| n.attribute("w:val"))
            .map(String::from),
    })
}
