use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use docx_tree::model::{BreakType, FontColor, HyperlinkTarget, Node, TriState};
use docx_tree::{Document, Severity};

/// Print the document tree of a DOCX file as an indented outline.
#[derive(Debug, Parser)]
#[command(name = "docx-tree", version, about)]
struct Args {
    /// Input .docx file
    input: PathBuf,

    /// Print only the diagnostics, not the tree
    #[arg(long)]
    warnings_only: bool,

    /// Include run formatting and table spans in the outline
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let result = match docx_tree::convert_docx(&args.input) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if args.warnings_only {
        for message in &result.messages {
            println!("{message}");
        }
    } else {
        print_document(&result.value, args.verbose);
    }

    if result.messages.iter().any(|m| m.severity == Severity::Error) {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}

fn print_document(document: &Document, verbose: bool) {
    print_nodes(&document.children, 0, verbose);
    for note in document.notes.iter() {
        println!("{:?} {}", note.note_type, note.note_id);
        print_nodes(&note.body, 1, verbose);
    }
    for comment in &document.comments {
        let author = comment.author_name.as_deref().unwrap_or("unknown author");
        println!("Comment {} ({author})", comment.comment_id);
        print_nodes(&comment.body, 1, verbose);
    }
}

fn print_nodes(nodes: &[Node], depth: usize, verbose: bool) {
    for node in nodes {
        println!("{}{}", "  ".repeat(depth), describe(node, verbose));
        print_nodes(node.children(), depth + 1, verbose);
    }
}

fn describe(node: &Node, verbose: bool) -> String {
    match node {
        Node::Paragraph(p) => {
            let mut line = String::from("Paragraph");
            if let Some(style) = p.style_name.as_deref().or(p.style_id.as_deref()) {
                line.push_str(&format!(" [{style}]"));
            }
            if let Some(numbering) = &p.numbering {
                let kind = if numbering.level.is_ordered { "ordered" } else { "bullet" };
                line.push_str(&format!(" ({kind} list, level {})", numbering.level.level));
            }
            line
        }
        Node::Run(r) => {
            let mut line = String::from("Run");
            if verbose {
                let p = &r.properties;
                let flags = [
                    ("bold", p.is_bold),
                    ("italic", p.is_italic),
                    ("underline", p.is_underline),
                    ("strike", p.is_strikethrough),
                    ("caps", p.is_all_caps),
                    ("small-caps", p.is_small_caps),
                ];
                for (name, value) in flags {
                    match value {
                        TriState::True => line.push_str(&format!(" +{name}")),
                        TriState::False => line.push_str(&format!(" -{name}")),
                        TriState::Unspecified => {}
                    }
                }
                if let Some(size) = p.font_size {
                    line.push_str(&format!(" {size}pt"));
                }
                if let FontColor::Rgb(color) = &p.font_color {
                    line.push_str(&format!(" {color}"));
                }
            }
            line
        }
        Node::Text(text) => format!("{text:?}"),
        Node::Tab => "Tab".into(),
        Node::Hyperlink(h) => match &h.target {
            HyperlinkTarget::Href(href) => format!("Hyperlink -> {href}"),
            HyperlinkTarget::Anchor(anchor) => format!("Hyperlink -> #{anchor}"),
        },
        Node::NoteReference(n) => format!("{:?} reference {}", n.note_type, n.note_id),
        Node::CommentReference(c) => format!("Comment reference {}", c.comment_id),
        Node::Image(image) => format!(
            "Image {} ({})",
            image.alt_text.as_deref().unwrap_or(""),
            image.content_type.as_deref().unwrap_or("unknown type")
        ),
        Node::Table(t) => match t.style_name.as_deref().or(t.style_id.as_deref()) {
            Some(style) => format!("Table [{style}]"),
            None => "Table".into(),
        },
        Node::TableRow(r) if r.is_header => "Row (header)".into(),
        Node::TableRow(_) => "Row".into(),
        Node::TableCell(c) if verbose => format!("Cell {}x{}", c.col_span, c.row_span),
        Node::TableCell(_) => "Cell".into(),
        Node::Break(BreakType::Line) => "Line break".into(),
        Node::Break(BreakType::Page) => "Page break".into(),
        Node::Break(BreakType::Column) => "Column break".into(),
        Node::BookmarkStart(b) => format!("Bookmark {}", b.name),
    }
}
