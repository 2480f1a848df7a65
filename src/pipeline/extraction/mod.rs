pub mod format;
pub mod lines;
pub mod pdf;

pub use format::*;
pub use lines::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("document contains no extractable text")]
    EmptyDocument,
}
