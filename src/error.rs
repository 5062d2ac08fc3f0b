use thiserror::Error;

/// Fatal conversion errors. Everything recoverable is reported as a
/// [`Diagnostic`](crate::Diagnostic) instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Invalid DOCX: {0}")]
    InvalidDocx(String),

    /// Numbering cannot be built without a style table: numbering-style
    /// links resolve through it.
    #[error("styles is missing")]
    MissingStyles,
}
