use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::numbering::{Numbering, read_indent};
use super::package::{
    ContentTypeLookup, FileSource, RelationshipLookup, replace_fragment, uri_to_zip_entry_name,
};
use super::styles::{StyleKind, Styles};
use super::symbols::hex_to_unicode;
use crate::model::{
    Alignment, BookmarkStart, BorderStyle, BreakType, CommentReference, Extent, FontColor,
    Hyperlink, HyperlinkTarget, Image, ImageData, Node, NoteReference, NoteType, Paragraph,
    ParagraphBorders, ParagraphIndent, ParagraphNumbering, ParagraphSpacing, Run, RunProperties,
    Table, TableCell, TableRow, TriState, VerticalAlignment,
};
use crate::results::{Outcome, warning};
use crate::xml::XmlElement;

const SUPPORTED_IMAGE_TYPES: &[&str] = &[
    "image/png",
    "image/gif",
    "image/jpeg",
    "image/svg+xml",
    "image/tiff",
];

static EXTERNAL_HYPERLINK_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s*HYPERLINK "(.*)""#).unwrap());
static INTERNAL_HYPERLINK_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s*HYPERLINK\s+\\l\s+"(.*)""#).unwrap());
static PRIVATE_USE_SYMBOL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^F0..$").unwrap());

/// Everything a body reader looks things up in. Shared read-only between
/// readers, so independent parts can be converted concurrently.
#[derive(Clone)]
pub struct BodyReaderOptions<'a> {
    pub relationships: &'a dyn RelationshipLookup,
    pub content_types: &'a dyn ContentTypeLookup,
    /// Entries of the package itself, for embedded images.
    pub docx_file: Arc<dyn FileSource>,
    /// Files outside the package, for linked images.
    pub files: Arc<dyn FileSource>,
    pub numbering: &'a Numbering,
    pub styles: &'a Styles,
}

/// Element names the reader knows how to convert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tag {
    Paragraph,
    ParagraphProperties,
    Run,
    RunProperties,
    FieldChar,
    InstrText,
    Text,
    Tab,
    NoBreakHyphen,
    SoftHyphen,
    Symbol,
    Hyperlink,
    Table,
    TableRow,
    TableCell,
    FootnoteReference,
    EndnoteReference,
    CommentReference,
    Break,
    BookmarkStart,
    AlternateContent,
    StructuredDocumentTag,
    /// Read straight through to the children.
    Transparent,
    Picture,
    Drawing,
    VmlImageData,
    /// Known and safe to drop.
    Ignored,
    Unknown,
}

impl Tag {
    fn from_name(name: &str) -> Tag {
        match name {
            "w:p" => Tag::Paragraph,
            "w:pPr" => Tag::ParagraphProperties,
            "w:r" => Tag::Run,
            "w:rPr" => Tag::RunProperties,
            "w:fldChar" => Tag::FieldChar,
            "w:instrText" => Tag::InstrText,
            "w:t" => Tag::Text,
            "w:tab" => Tag::Tab,
            "w:noBreakHyphen" => Tag::NoBreakHyphen,
            "w:softHyphen" => Tag::SoftHyphen,
            "w:sym" => Tag::Symbol,
            "w:hyperlink" => Tag::Hyperlink,
            "w:tbl" => Tag::Table,
            "w:tr" => Tag::TableRow,
            "w:tc" => Tag::TableCell,
            "w:footnoteReference" => Tag::FootnoteReference,
            "w:endnoteReference" => Tag::EndnoteReference,
            "w:commentReference" => Tag::CommentReference,
            "w:br" => Tag::Break,
            "w:bookmarkStart" => Tag::BookmarkStart,
            "mc:AlternateContent" => Tag::AlternateContent,
            "w:sdt" => Tag::StructuredDocumentTag,
            "w:ins" | "w:object" | "w:smartTag" | "w:drawing" | "v:roundrect" | "v:shape"
            | "v:textbox" | "w:txbxContent" | "v:group" | "v:rect" => Tag::Transparent,
            "w:pict" => Tag::Picture,
            "wp:inline" | "wp:anchor" => Tag::Drawing,
            "v:imagedata" => Tag::VmlImageData,
            "office-word:wrap"
            | "v:shadow"
            | "v:shapetype"
            | "w:annotationRef"
            | "w:bookmarkEnd"
            | "w:sectPr"
            | "w:proofErr"
            | "w:lastRenderedPageBreak"
            | "w:commentRangeStart"
            | "w:commentRangeEnd"
            | "w:del"
            | "w:footnoteRef"
            | "w:endnoteRef"
            | "w:tblPr"
            | "w:tblGrid"
            | "w:trPr"
            | "w:tcPr" => Tag::Ignored,
            _ => Tag::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum ComplexField {
    Unknown,
    Hyperlink(HyperlinkTarget),
}

/// Properties carried by `w:pPr`, folded into the enclosing paragraph.
#[derive(Default)]
struct ParagraphProperties {
    style_id: Option<String>,
    style_name: Option<String>,
    alignment: Option<Alignment>,
    numbering: Option<ParagraphNumbering>,
    indent: ParagraphIndent,
    borders: ParagraphBorders,
    spacing: ParagraphSpacing,
    run_properties: Option<RunProperties>,
}

/// A row under construction: cells plus the parallel "continues a
/// vertical merge" flags.
struct MergeRow {
    is_header: bool,
    children: Vec<Node>,
    continues_merge: Vec<bool>,
}

impl MergeRow {
    fn into_node(self) -> Node {
        Node::TableRow(TableRow {
            children: self.children,
            is_header: self.is_header,
        })
    }
}

enum TableChild {
    Row(MergeRow),
    Other(Node),
}

impl TableChild {
    fn into_node(self) -> Node {
        match self {
            TableChild::Row(row) => row.into_node(),
            TableChild::Other(node) => node,
        }
    }
}

/// Converts one document part. Field state lives on the reader, so use a
/// fresh reader per part.
pub struct BodyReader<'a> {
    options: BodyReaderOptions<'a>,
    complex_field_stack: Vec<ComplexField>,
    current_instr_text: String,
}

impl<'a> BodyReader<'a> {
    pub fn new(options: &BodyReaderOptions<'a>) -> Self {
        Self {
            options: options.clone(),
            complex_field_stack: Vec::new(),
            current_instr_text: String::new(),
        }
    }

    pub fn read_xml_elements<'e>(
        &mut self,
        elements: impl IntoIterator<Item = &'e XmlElement>,
    ) -> Outcome<Vec<Node>> {
        let results: Vec<_> = elements
            .into_iter()
            .map(|element| self.read_xml_element(element))
            .collect();
        Outcome::combine(results)
    }

    fn read_children(&mut self, element: &XmlElement) -> Outcome<Vec<Node>> {
        self.read_xml_elements(element.element_children())
    }

    pub fn read_xml_element(&mut self, element: &XmlElement) -> Outcome<Vec<Node>> {
        match Tag::from_name(&element.name) {
            Tag::Paragraph => self.read_paragraph(element),
            // Only meaningful inside w:p / w:r, which read them directly.
            Tag::ParagraphProperties | Tag::RunProperties => Outcome::empty(),
            Tag::Run => self.read_run(element),
            Tag::FieldChar => self.read_fld_char(element),
            Tag::InstrText => {
                self.current_instr_text.push_str(&element.text());
                Outcome::empty()
            }
            Tag::Text => Outcome::element(Node::Text(element.text())),
            Tag::Tab => Outcome::element(Node::Tab),
            Tag::NoBreakHyphen => Outcome::element(Node::Text("\u{2011}".into())),
            Tag::SoftHyphen => Outcome::element(Node::Text("\u{00AD}".into())),
            Tag::Symbol => read_symbol(element),
            Tag::Hyperlink => self.read_hyperlink(element),
            Tag::Table => self.read_table(element),
            Tag::TableRow => self.read_table_row(element).map(|row| vec![row.into_node()]),
            Tag::TableCell => self
                .read_table_cell(element)
                .map(|(cell, _)| vec![Node::TableCell(cell)]),
            Tag::FootnoteReference => note_reference(element, NoteType::Footnote),
            Tag::EndnoteReference => note_reference(element, NoteType::Endnote),
            Tag::CommentReference => Outcome::element(Node::CommentReference(CommentReference {
                comment_id: element.attribute("w:id").unwrap_or_default().to_string(),
            })),
            Tag::Break => read_break(element),
            Tag::BookmarkStart => {
                let name = element.attribute("w:name").unwrap_or_default();
                if name == "_GoBack" {
                    Outcome::empty()
                } else {
                    Outcome::element(Node::BookmarkStart(BookmarkStart {
                        name: name.to_string(),
                    }))
                }
            }
            Tag::AlternateContent => match element.first("mc:Fallback") {
                Some(fallback) => self.read_children(fallback),
                None => Outcome::empty(),
            },
            Tag::StructuredDocumentTag => self.read_children(element.first_or_empty("w:sdtContent")),
            Tag::Transparent => self.read_children(element),
            Tag::Picture => self.read_children(element).to_extra(),
            Tag::Drawing => self.read_drawing(element),
            Tag::VmlImageData => self.read_vml_image_data(element),
            Tag::Ignored => Outcome::empty(),
            Tag::Unknown => Outcome::empty_with_messages(vec![warning(format!(
                "An unrecognised element was ignored: {}",
                element.name
            ))]),
        }
    }

    fn read_paragraph(&mut self, element: &XmlElement) -> Outcome<Vec<Node>> {
        let mut properties: Option<ParagraphProperties> = None;
        let mut results = Vec::new();
        for child in element.element_children() {
            if child.name == "w:pPr" {
                let outcome = self.read_paragraph_properties(child);
                results.push(outcome.flat_map(|props| {
                    if properties.is_none() {
                        properties = Some(props);
                    }
                    Outcome::empty()
                }));
            } else {
                results.push(self.read_xml_element(child));
            }
        }
        let properties = properties.unwrap_or_default();

        let has_last_rendered_page_break = element
            .first("w:r")
            .is_some_and(|run| run.first("w:lastRenderedPageBreak").is_some());

        Outcome::combine(results)
            .map(|children| {
                vec![Node::Paragraph(Paragraph {
                    children,
                    style_id: properties.style_id,
                    style_name: properties.style_name,
                    numbering: properties.numbering,
                    alignment: properties.alignment,
                    indent: properties.indent,
                    borders: properties.borders,
                    spacing: properties.spacing,
                    run_properties: properties.run_properties,
                    has_last_rendered_page_break,
                    element_index: element.element_index,
                    absolute_index: element.absolute_index,
                })]
            })
            .insert_extra()
    }

    fn read_paragraph_properties(&self, element: &XmlElement) -> Outcome<ParagraphProperties> {
        let style_id = element.first("w:pStyle").and_then(|s| s.attribute("w:val"));
        let style = self.options.styles.resolve(StyleKind::Paragraph, style_id);

        let run_properties = element.first("w:rPr").map(|rpr| self.read_run_properties(rpr));

        style.flat_map(|style| {
            let numbering = self
                .options
                .numbering
                .read_paragraph_numbering(style.id.as_deref(), element.first_or_empty("w:numPr"));
            let properties = ParagraphProperties {
                alignment: element
                    .first("w:jc")
                    .and_then(|jc| jc.attribute("w:val"))
                    .and_then(parse_alignment),
                numbering,
                indent: read_indent(element.first_or_empty("w:ind")),
                borders: read_paragraph_borders(element.first("w:pBdr")),
                spacing: read_paragraph_spacing(element.first_or_empty("w:spacing")),
                style_id: style.id,
                style_name: style.name,
                run_properties: None,
            };
            match run_properties {
                Some(run_properties) => run_properties.map(|rp| ParagraphProperties {
                    run_properties: Some(rp),
                    ..properties
                }),
                None => Outcome::new(properties),
            }
        })
    }

    fn read_run(&mut self, element: &XmlElement) -> Outcome<Vec<Node>> {
        let mut properties: Option<RunProperties> = None;
        let mut results = Vec::new();
        for child in element.element_children() {
            if child.name == "w:rPr" {
                let outcome = self.read_run_properties(child);
                results.push(outcome.flat_map(|props| {
                    if properties.is_none() {
                        properties = Some(props);
                    }
                    Outcome::empty()
                }));
            } else {
                results.push(self.read_xml_element(child));
            }
        }
        let hyperlink = self.current_hyperlink_target();

        Outcome::combine(results).map(|children| {
            let children = match hyperlink {
                Some(target) => vec![Node::Hyperlink(Hyperlink {
                    children,
                    target,
                    target_frame: None,
                })],
                None => children,
            };
            vec![Node::Run(Run {
                children,
                properties: properties.unwrap_or_default(),
            })]
        })
    }

    fn read_run_properties(&self, element: &XmlElement) -> Outcome<RunProperties> {
        let style_id = element.first("w:rStyle").and_then(|s| s.attribute("w:val"));
        self.options
            .styles
            .resolve(StyleKind::Character, style_id)
            .map(|style| RunProperties {
                style_id: style.id,
                style_name: style.name,
                is_bold: read_toggle(element.first("w:b")),
                is_italic: read_toggle(element.first("w:i")),
                is_underline: read_underline(element.first("w:u")),
                is_strikethrough: read_toggle(element.first("w:strike")),
                is_all_caps: read_toggle(element.first("w:caps")),
                is_small_caps: read_toggle(element.first("w:smallCaps")),
                vertical_alignment: match element
                    .first("w:vertAlign")
                    .and_then(|v| v.attribute("w:val"))
                {
                    Some("superscript") => VerticalAlignment::Superscript,
                    Some("subscript") => VerticalAlignment::Subscript,
                    _ => VerticalAlignment::Baseline,
                },
                font: element
                    .first("w:rFonts")
                    .and_then(|f| f.attribute("w:ascii"))
                    .map(String::from),
                font_size: half_points(element.first("w:sz"))
                    .filter(|&size| size != 0.0)
                    .or_else(|| half_points(element.first("w:szCs"))),
                font_color: read_color(element.first("w:color")),
                is_hidden: read_toggle(element.first("w:vanish")).is_true(),
            })
    }

    fn read_fld_char(&mut self, element: &XmlElement) -> Outcome<Vec<Node>> {
        match element.attribute("w:fldCharType") {
            Some("begin") => {
                self.complex_field_stack.push(ComplexField::Unknown);
                self.current_instr_text.clear();
            }
            Some("end") => {
                self.complex_field_stack.pop();
            }
            Some("separate") => {
                let field = match parse_hyperlink_field_code(&self.current_instr_text) {
                    Some(target) => ComplexField::Hyperlink(target),
                    None => ComplexField::Unknown,
                };
                self.complex_field_stack.pop();
                self.complex_field_stack.push(field);
            }
            _ => {}
        }
        Outcome::empty()
    }

    fn current_hyperlink_target(&self) -> Option<HyperlinkTarget> {
        self.complex_field_stack.iter().rev().find_map(|field| match field {
            ComplexField::Hyperlink(target) => Some(target.clone()),
            ComplexField::Unknown => None,
        })
    }

    fn read_hyperlink(&mut self, element: &XmlElement) -> Outcome<Vec<Node>> {
        let anchor = element.attribute("w:anchor").filter(|a| !a.is_empty());
        let relationship_id = element.attribute("r:id").filter(|id| !id.is_empty());
        let href = relationship_id
            .and_then(|id| self.options.relationships.find_target_by_relationship_id(id));
        let mut messages = Vec::new();
        if let (Some(id), None) = (relationship_id, &href) {
            messages.push(warning(format!(
                "Could not find hyperlink target for relationship ID {id}"
            )));
        }
        let target = match (href, anchor) {
            (Some(href), Some(anchor)) => Some(HyperlinkTarget::Href(replace_fragment(&href, anchor))),
            (Some(href), None) => Some(HyperlinkTarget::Href(href)),
            (None, Some(anchor)) => Some(HyperlinkTarget::Anchor(anchor.to_string())),
            (None, None) => None,
        };
        let target_frame = element
            .attribute("w:tgtFrame")
            .filter(|f| !f.is_empty())
            .map(String::from);

        let mut outcome = self.read_children(element).map(|children| match target {
            Some(target) => vec![Node::Hyperlink(Hyperlink {
                children,
                target,
                target_frame,
            })],
            None => children,
        });
        messages.append(&mut outcome.messages);
        outcome.messages = messages;
        outcome
    }

    fn read_table(&mut self, element: &XmlElement) -> Outcome<Vec<Node>> {
        let tbl_pr = element.first("w:tblPr");
        let style_id = tbl_pr
            .and_then(|pr| pr.first("w:tblStyle"))
            .and_then(|s| s.attribute("w:val"));
        let style = self.options.styles.resolve(StyleKind::Table, style_id);

        self.read_table_children(element)
            .flat_map(calculate_row_spans)
            .flat_map(|children| {
                style.map(|style| {
                    vec![Node::Table(Table {
                        children,
                        style_id: style.id,
                        style_name: style.name,
                        tbl_pr: tbl_pr.cloned(),
                        tbl_grid: element.first("w:tblGrid").cloned(),
                        element_index: element.element_index,
                        absolute_index: element.absolute_index,
                    })]
                })
            })
    }

    fn read_table_children(&mut self, element: &XmlElement) -> Outcome<Vec<TableChild>> {
        let mut results = Vec::new();
        for child in element.element_children() {
            let result = match child.name.as_str() {
                "w:tr" => self.read_table_row(child).map(|row| vec![TableChild::Row(row)]),
                "w:sdt" => self.read_table_children(child.first_or_empty("w:sdtContent")),
                _ => self
                    .read_xml_element(child)
                    .map(|nodes| nodes.into_iter().map(TableChild::Other).collect()),
            };
            results.push(result);
        }
        Outcome::combine(results)
    }

    fn read_table_row(&mut self, element: &XmlElement) -> Outcome<MergeRow> {
        let is_header = element
            .first("w:trPr")
            .is_some_and(|pr| pr.first("w:tblHeader").is_some());
        self.read_row_children(element).map(|cells| {
            let (children, continues_merge) = cells.into_iter().unzip();
            MergeRow {
                is_header,
                children,
                continues_merge,
            }
        })
    }

    fn read_row_children(&mut self, element: &XmlElement) -> Outcome<Vec<(Node, bool)>> {
        let mut results = Vec::new();
        for child in element.element_children() {
            let result = match child.name.as_str() {
                "w:tc" => self
                    .read_table_cell(child)
                    .map(|(cell, continues)| vec![(Node::TableCell(cell), continues)]),
                "w:sdt" => self.read_row_children(child.first_or_empty("w:sdtContent")),
                _ => self
                    .read_xml_element(child)
                    .map(|nodes| nodes.into_iter().map(|n| (n, false)).collect()),
            };
            results.push(result);
        }
        Outcome::combine(results)
    }

    fn read_table_cell(&mut self, element: &XmlElement) -> Outcome<(TableCell, bool)> {
        let properties = element.first_or_empty("w:tcPr");
        let col_span = properties
            .first("w:gridSpan")
            .and_then(|g| g.attribute("w:val"))
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&span| span > 0)
            .unwrap_or(1);
        let background_color = properties
            .first("w:shd")
            .and_then(|shd| shd.attribute("w:fill"))
            .map(String::from);
        let continues_merge = properties
            .first("w:vMerge")
            .is_some_and(|v| matches!(v.attribute("w:val"), None | Some("") | Some("continue")));

        self.read_children(element).map(|children| {
            let cell = TableCell {
                children,
                col_span,
                row_span: 1,
                background_color,
                element_index: element.element_index,
                absolute_index: element.absolute_index,
            };
            (cell, continues_merge)
        })
    }

    fn read_drawing(&self, element: &XmlElement) -> Outcome<Vec<Node>> {
        let blips: Vec<&XmlElement> = element
            .elements_by_tag_name("a:graphic")
            .into_iter()
            .flat_map(|e| e.elements_by_tag_name("a:graphicData"))
            .flat_map(|e| e.elements_by_tag_name("pic:pic"))
            .flat_map(|e| e.elements_by_tag_name("pic:blipFill"))
            .flat_map(|e| e.elements_by_tag_name("a:blip"))
            .collect();

        if blips.is_empty() {
            return Outcome::element(Node::Image(Image {
                data: ImageData::inert(),
                alt_text: Some("Unknown image".into()),
                content_type: Some("unknown".into()),
                dimensions: None,
            }));
        }

        let results: Vec<_> = blips
            .into_iter()
            .map(|blip| self.read_blip(element, blip))
            .collect();
        Outcome::combine(results)
    }

    fn read_blip(&self, element: &XmlElement, blip: &XmlElement) -> Outcome<Vec<Node>> {
        let doc_pr = element.first_or_empty("wp:docPr");
        let alt_text = match doc_pr.attribute("descr") {
            Some(descr) if !descr.trim().is_empty() => Some(descr.to_string()),
            _ => doc_pr.attribute("title").map(String::from),
        };
        let dimensions = element.first("wp:extent").map(|extent| Extent {
            cx: extent.attribute("cx").and_then(|v| v.parse().ok()),
            cy: extent.attribute("cy").and_then(|v| v.parse().ok()),
        });

        let embed = blip.attribute("r:embed").filter(|id| !id.is_empty());
        let link = blip.attribute("r:link").filter(|id| !id.is_empty());
        let data = match (embed, link) {
            (Some(id), _) => self.find_embedded_image(id),
            (None, Some(id)) => self.find_linked_image(id),
            (None, None) => {
                return Outcome::empty_with_messages(vec![warning(
                    "Could not find image file for a:blip element",
                )]);
            }
        };
        self.read_image(data, alt_text, dimensions)
    }

    fn read_vml_image_data(&self, element: &XmlElement) -> Outcome<Vec<Node>> {
        let Some(id) = element.attribute("r:id").filter(|id| !id.is_empty()) else {
            return Outcome::empty_with_messages(vec![warning(
                "A v:imagedata element without a relationship ID was ignored",
            )]);
        };
        let title = element.attribute("o:title").map(String::from);
        self.read_image(self.find_embedded_image(id), title, None)
    }

    fn find_embedded_image(&self, relationship_id: &str) -> Result<ImageData, String> {
        let target = self.relationship_target(relationship_id)?;
        let path = uri_to_zip_entry_name("word", &target);
        Ok(ImageData::deferred(self.options.docx_file.clone(), path))
    }

    fn find_linked_image(&self, relationship_id: &str) -> Result<ImageData, String> {
        let target = self.relationship_target(relationship_id)?;
        Ok(ImageData::deferred(self.options.files.clone(), target))
    }

    fn relationship_target(&self, relationship_id: &str) -> Result<String, String> {
        self.options
            .relationships
            .find_target_by_relationship_id(relationship_id)
            .ok_or_else(|| {
                format!("Could not find image file for relationship ID {relationship_id}")
            })
    }

    fn read_image(
        &self,
        data: Result<ImageData, String>,
        alt_text: Option<String>,
        dimensions: Option<Extent>,
    ) -> Outcome<Vec<Node>> {
        let data = match data {
            Ok(data) => data,
            Err(message) => return Outcome::empty_with_messages(vec![warning(message)]),
        };
        let content_type = data
            .path()
            .and_then(|path| self.options.content_types.find_content_type(path));

        let mut messages = Vec::new();
        if !content_type
            .as_deref()
            .is_some_and(|ct| SUPPORTED_IMAGE_TYPES.contains(&ct))
        {
            messages.push(warning(format!(
                "Image of type {} is unlikely to display in web browsers",
                content_type.as_deref().unwrap_or("undefined")
            )));
        }
        Outcome::with_messages(
            vec![Node::Image(Image {
                data,
                alt_text,
                content_type,
                dimensions,
            })],
            messages,
        )
    }
}

fn calculate_row_spans(children: Vec<TableChild>) -> Outcome<Vec<Node>> {
    if children.iter().any(|c| matches!(c, TableChild::Other(_))) {
        return Outcome::with_messages(
            children.into_iter().map(TableChild::into_node).collect(),
            vec![warning(
                "unexpected non-row element in table, cell merging may be incorrect",
            )],
        );
    }
    let mut rows: Vec<MergeRow> = children
        .into_iter()
        .filter_map(|c| match c {
            TableChild::Row(row) => Some(row),
            TableChild::Other(_) => None,
        })
        .collect();
    if rows
        .iter()
        .any(|row| row.children.iter().any(|c| !matches!(c, Node::TableCell(_))))
    {
        return Outcome::with_messages(
            rows.into_iter().map(MergeRow::into_node).collect(),
            vec![warning(
                "unexpected non-cell element in table row, cell merging may be incorrect",
            )],
        );
    }

    // grid column -> (row, cell) of the cell currently open at that column
    let mut columns: HashMap<u32, (usize, usize)> = HashMap::new();
    let mut messages = Vec::new();
    for row_index in 0..rows.len() {
        let mut grid_column = 0u32;
        for cell_index in 0..rows[row_index].children.len() {
            let col_span = match &rows[row_index].children[cell_index] {
                Node::TableCell(cell) => cell.col_span,
                _ => 1,
            };
            let open = columns.get(&grid_column).copied();
            match open {
                Some((open_row, open_cell)) if rows[row_index].continues_merge[cell_index] => {
                    if let Node::TableCell(cell) = &mut rows[open_row].children[open_cell] {
                        cell.row_span += 1;
                    }
                }
                _ => {
                    if open.is_none() && rows[row_index].continues_merge[cell_index] {
                        messages.push(warning(format!(
                            "vertical merge continuation without a cell above at grid column {grid_column}"
                        )));
                    }
                    columns.insert(grid_column, (row_index, cell_index));
                    rows[row_index].continues_merge[cell_index] = false;
                }
            }
            grid_column += col_span;
        }
    }

    let nodes = rows
        .into_iter()
        .map(|row| {
            let children = row
                .children
                .into_iter()
                .zip(row.continues_merge)
                .filter(|(_, continues)| !continues)
                .map(|(cell, _)| cell)
                .collect();
            Node::TableRow(TableRow {
                children,
                is_header: row.is_header,
            })
        })
        .collect();
    Outcome::with_messages(nodes, messages)
}

fn parse_hyperlink_field_code(code: &str) -> Option<HyperlinkTarget> {
    if let Some(caps) = EXTERNAL_HYPERLINK_FIELD.captures(code) {
        return Some(HyperlinkTarget::Href(caps[1].to_string()));
    }
    INTERNAL_HYPERLINK_FIELD
        .captures(code)
        .map(|caps| HyperlinkTarget::Anchor(caps[1].to_string()))
}

fn read_symbol(element: &XmlElement) -> Outcome<Vec<Node>> {
    let font = element.attribute("w:font").unwrap_or_default();
    let code = element.attribute("w:char").unwrap_or_default();
    let character = hex_to_unicode(font, code).or_else(|| {
        if PRIVATE_USE_SYMBOL.is_match(code) {
            code.get(2..).and_then(|low| hex_to_unicode(font, low))
        } else {
            None
        }
    });
    match character {
        Some(c) => Outcome::element(Node::Text(c.to_string())),
        None => Outcome::empty_with_messages(vec![warning(format!(
            "A w:sym element with an unsupported character was ignored: char {code} in font {font}"
        ))]),
    }
}

fn read_break(element: &XmlElement) -> Outcome<Vec<Node>> {
    let break_type = match element.attribute("w:type") {
        None | Some("textWrapping") => BreakType::Line,
        Some("page") => BreakType::Page,
        Some("column") => BreakType::Column,
        Some(other) => {
            return Outcome::empty_with_messages(vec![warning(format!(
                "Unsupported break type: {other}"
            ))]);
        }
    };
    Outcome::element(Node::Break(break_type))
}

fn note_reference(element: &XmlElement, note_type: NoteType) -> Outcome<Vec<Node>> {
    Outcome::element(Node::NoteReference(NoteReference {
        note_type,
        note_id: element.attribute("w:id").unwrap_or_default().to_string(),
    }))
}

fn parse_alignment(val: &str) -> Option<Alignment> {
    match val {
        "left" | "start" => Some(Alignment::Left),
        "center" => Some(Alignment::Center),
        "right" | "end" => Some(Alignment::Right),
        "both" => Some(Alignment::Justify),
        "distribute" => Some(Alignment::Distribute),
        _ => None,
    }
}

fn is_off(val: &str) -> bool {
    matches!(val, "false" | "0" | "none")
}

fn read_toggle(element: Option<&XmlElement>) -> TriState {
    match element {
        None => TriState::Unspecified,
        Some(el) => TriState::from_bool(!el.attribute("w:val").is_some_and(is_off)),
    }
}

/// `w:u` without a value carries no underline style, so it reads as off.
fn read_underline(element: Option<&XmlElement>) -> TriState {
    match element {
        None => TriState::Unspecified,
        Some(el) => TriState::from_bool(el.attribute("w:val").is_some_and(|v| !is_off(v))),
    }
}

fn read_color(element: Option<&XmlElement>) -> FontColor {
    let Some(element) = element else {
        return FontColor::Unspecified;
    };
    match element.attribute("w:val") {
        None | Some("") => FontColor::Empty,
        Some("auto") => FontColor::Rgb("#000000".into()),
        Some(val) => FontColor::Rgb(format!("#{val}")),
    }
}

fn half_points(element: Option<&XmlElement>) -> Option<f64> {
    let val = element?.attribute("w:val")?;
    if val.is_empty() || !val.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    val.parse::<u64>().ok().map(|hp| hp as f64 / 2.0)
}

fn read_paragraph_spacing(element: &XmlElement) -> ParagraphSpacing {
    let pixels = |name: &str| {
        element
            .attribute(name)
            .filter(|v| !v.is_empty())
            .and_then(|v| v.trim().parse::<f64>().ok())
            .map(|twips| twips / 20.0 * 96.0 / 72.0)
    };
    ParagraphSpacing {
        before: pixels("w:before"),
        after: pixels("w:after"),
    }
}

fn read_paragraph_borders(element: Option<&XmlElement>) -> ParagraphBorders {
    let Some(element) = element else {
        return ParagraphBorders::default();
    };
    let side = |name: &str| {
        element.first(name).map(|b| BorderStyle {
            style: b.attribute("w:val").map(String::from),
            size: b.attribute("w:sz").and_then(|v| v.parse().ok()),
            space: b.attribute("w:space").and_then(|v| v.parse().ok()),
            color: b.attribute("w:color").map(String::from),
        })
    };
    ParagraphBorders {
        top: side("w:top"),
        bottom: side("w:bottom"),
        left: side("w:left"),
        right: side("w:right"),
    }
}
