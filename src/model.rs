use std::collections::HashMap;
use std::sync::Arc;

use crate::docx::FileSource;
use crate::xml::XmlElement;

/// Formatting toggle that distinguishes "not set here" from an explicit off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TriState {
    #[default]
    Unspecified,
    True,
    False,
}

impl TriState {
    pub fn from_bool(value: bool) -> Self {
        if value { TriState::True } else { TriState::False }
    }

    pub fn as_option(self) -> Option<bool> {
        match self {
            TriState::Unspecified => None,
            TriState::True => Some(true),
            TriState::False => Some(false),
        }
    }

    pub fn is_true(self) -> bool {
        self == TriState::True
    }
}

/// Run color as written: absent, present without a value, or `#RRGGBB`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FontColor {
    #[default]
    Unspecified,
    Empty,
    Rgb(String),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
    Distribute,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum VerticalAlignment {
    #[default]
    Baseline,
    Superscript,
    Subscript,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoteType {
    Footnote,
    Endnote,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BreakType {
    Line,
    Page,
    Column,
}

/// Indentation in twentieths of a point, as written on the paragraph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParagraphIndent {
    pub start: Option<i32>,
    pub end: Option<i32>,
    pub first_line: Option<i32>,
    pub hanging: Option<i32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BorderStyle {
    pub style: Option<String>,
    pub size: Option<u32>, // eighths of a point
    pub space: Option<u32>, // points
    pub color: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParagraphBorders {
    pub top: Option<BorderStyle>,
    pub bottom: Option<BorderStyle>,
    pub left: Option<BorderStyle>,
    pub right: Option<BorderStyle>,
}

/// Spacing in device pixels (96 per inch).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParagraphSpacing {
    pub before: Option<f64>,
    pub after: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LevelStart {
    pub start: Option<u32>,
    pub number_format: Option<String>,
}

/// One level of an abstract numbering definition.
#[derive(Clone, Debug, PartialEq)]
pub struct NumberingLevel {
    pub level: u8,
    pub is_ordered: bool,
    pub number_format: Option<String>,
    pub level_text: Option<String>,
    pub level_restart: Option<u32>,
    /// `w:isLgl`: render every level's number as arabic numerals.
    pub is_legal: bool,
    pub start: Option<u32>,
    pub paragraph_style_id: Option<String>,
    pub indent: Option<ParagraphIndent>,
    /// Start values of the levels defined up to and including this one,
    /// used to backfill counters for ancestor levels that never appeared.
    pub start_by_level: std::collections::BTreeMap<u8, LevelStart>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParagraphNumbering {
    /// Numbering instance id; `None` when implied by the paragraph style.
    pub num_id: Option<String>,
    pub level: NumberingLevel,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunProperties {
    pub style_id: Option<String>,
    pub style_name: Option<String>,
    pub is_bold: TriState,
    pub is_italic: TriState,
    pub is_underline: TriState,
    pub is_strikethrough: TriState,
    pub is_all_caps: TriState,
    pub is_small_caps: TriState,
    pub vertical_alignment: VerticalAlignment,
    pub font: Option<String>,
    pub font_size: Option<f64>, // points
    pub font_color: FontColor,
    pub is_hidden: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Paragraph {
    pub children: Vec<Node>,
    pub style_id: Option<String>,
    pub style_name: Option<String>,
    pub numbering: Option<ParagraphNumbering>,
    pub alignment: Option<Alignment>,
    pub indent: ParagraphIndent,
    pub borders: ParagraphBorders,
    pub spacing: ParagraphSpacing,
    /// Formatting of the paragraph mark.
    pub run_properties: Option<RunProperties>,
    pub has_last_rendered_page_break: bool,
    pub element_index: Option<usize>,
    pub absolute_index: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Run {
    pub children: Vec<Node>,
    pub properties: RunProperties,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HyperlinkTarget {
    Href(String),
    Anchor(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Hyperlink {
    pub children: Vec<Node>,
    pub target: HyperlinkTarget,
    pub target_frame: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteReference {
    pub note_type: NoteType,
    pub note_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentReference {
    pub comment_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookmarkStart {
    pub name: String,
}

/// Drawing size in EMU (914400 per inch).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extent {
    pub cx: Option<u64>,
    pub cy: Option<u64>,
}

impl Extent {
    pub const EMU_PER_PIXEL: u64 = 9525;

    pub fn pixels(&self) -> (Option<u64>, Option<u64>) {
        (
            self.cx.map(|v| v / Self::EMU_PER_PIXEL),
            self.cy.map(|v| v / Self::EMU_PER_PIXEL),
        )
    }
}

/// Deferred access to image bytes. Nothing is read until [`read`](Self::read).
#[derive(Clone)]
pub struct ImageData {
    source: Option<(Arc<dyn FileSource>, String)>,
}

impl ImageData {
    pub fn deferred(files: Arc<dyn FileSource>, path: impl Into<String>) -> Self {
        Self {
            source: Some((files, path.into())),
        }
    }

    /// Reader for drawings that carry no picture; always yields no bytes.
    pub fn inert() -> Self {
        Self { source: None }
    }

    pub fn path(&self) -> Option<&str> {
        self.source.as_ref().map(|(_, path)| path.as_str())
    }

    pub fn read(&self) -> std::io::Result<Vec<u8>> {
        match &self.source {
            Some((files, path)) => files.read(path),
            None => Ok(Vec::new()),
        }
    }
}

impl std::fmt::Debug for ImageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.path() {
            Some(path) => write!(f, "ImageData({path:?})"),
            None => write!(f, "ImageData(inert)"),
        }
    }
}

impl PartialEq for ImageData {
    fn eq(&self, other: &Self) -> bool {
        self.path() == other.path()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub data: ImageData,
    pub alt_text: Option<String>,
    pub content_type: Option<String>,
    pub dimensions: Option<Extent>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub children: Vec<Node>,
    pub style_id: Option<String>,
    pub style_name: Option<String>,
    /// `w:tblPr` as read, for consumers that interpret table properties.
    pub tbl_pr: Option<XmlElement>,
    pub tbl_grid: Option<XmlElement>,
    pub element_index: Option<usize>,
    pub absolute_index: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableRow {
    pub children: Vec<Node>,
    pub is_header: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableCell {
    pub children: Vec<Node>,
    pub col_span: u32,
    pub row_span: u32,
    pub background_color: Option<String>,
    pub element_index: Option<usize>,
    pub absolute_index: Option<usize>,
}

impl Default for TableCell {
    fn default() -> Self {
        Self {
            children: Vec::new(),
            col_span: 1,
            row_span: 1,
            background_color: None,
            element_index: None,
            absolute_index: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Paragraph(Paragraph),
    Run(Run),
    Text(String),
    Tab,
    Hyperlink(Hyperlink),
    NoteReference(NoteReference),
    CommentReference(CommentReference),
    Image(Image),
    Table(Table),
    TableRow(TableRow),
    TableCell(TableCell),
    Break(BreakType),
    BookmarkStart(BookmarkStart),
}

impl Node {
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Paragraph(p) => &p.children,
            Node::Run(r) => &r.children,
            Node::Hyperlink(h) => &h.children,
            Node::Table(t) => &t.children,
            Node::TableRow(r) => &r.children,
            Node::TableCell(c) => &c.children,
            _ => &[],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub note_type: NoteType,
    pub note_id: String,
    pub body: Vec<Node>,
}

/// Footnotes and endnotes, keyed by `(type, id)`.
#[derive(Clone, Debug, Default)]
pub struct Notes {
    notes: Vec<Note>,
    index: HashMap<(NoteType, String), usize>,
}

impl Notes {
    pub fn new(notes: Vec<Note>) -> Self {
        let index = notes
            .iter()
            .enumerate()
            .map(|(i, n)| ((n.note_type, n.note_id.clone()), i))
            .collect();
        Self { notes, index }
    }

    pub fn resolve(&self, reference: &NoteReference) -> Option<&Note> {
        self.find(reference.note_type, &reference.note_id)
    }

    pub fn find(&self, note_type: NoteType, note_id: &str) -> Option<&Note> {
        self.index
            .get(&(note_type, note_id.to_string()))
            .map(|&i| &self.notes[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Comment {
    pub comment_id: String,
    pub body: Vec<Node>,
    pub author_name: Option<String>,
    pub author_initials: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct Document {
    pub children: Vec<Node>,
    pub notes: Notes,
    pub comments: Vec<Comment>,
}
