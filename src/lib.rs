pub mod docx;
mod error;
pub mod model;
pub mod results;
pub mod xml;

pub use error::Error;
pub use model::Document;
pub use results::{Diagnostic, Outcome, Severity};

use std::path::Path;
use std::time::Instant;

/// Convert the `.docx` file at `input` into a document tree.
///
/// Linked (not embedded) images resolve relative to the file's directory.
pub fn convert_docx(input: &Path) -> Result<Outcome<Document>, Error> {
    let t0 = Instant::now();
    let result = docx::read(input)?;
    log_conversion(&result, t0);
    Ok(result)
}

pub fn convert_docx_bytes(input: &[u8]) -> Result<Outcome<Document>, Error> {
    let t0 = Instant::now();
    let result = docx::read_bytes(input)?;
    log_conversion(&result, t0);
    Ok(result)
}

fn log_conversion(result: &Outcome<Document>, t0: Instant) {
    for message in &result.messages {
        log::warn!("{message}");
    }
    log::info!(
        "Timing: convert={:.1}ms ({} nodes, {} notes, {} comments, {} messages)",
        t0.elapsed().as_secs_f64() * 1000.0,
        docx::count_nodes(&result.value.children),
        result.value.notes.len(),
        result.value.comments.len(),
        result.messages.len(),
    );
}
