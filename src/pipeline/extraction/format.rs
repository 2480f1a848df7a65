use super::pdf::extract_pdf_text;
use super::ExtractionError;

/// The two contract formats the pipeline ingests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractFormat {
    Pdf,
    PlainText,
}

/// Detect the contract format from magic bytes. Anything that is not a
/// PDF is treated as plain text.
pub fn detect_format(bytes: &[u8]) -> ContractFormat {
    if bytes.starts_with(b"%PDF-") {
        ContractFormat::Pdf
    } else {
        ContractFormat::PlainText
    }
}

/// Extract the raw contract text for the given format.
pub fn extract_text(bytes: &[u8], format: ContractFormat) -> Result<String, ExtractionError> {
    let text = match format {
        ContractFormat::Pdf => extract_pdf_text(bytes)?,
        ContractFormat::PlainText => String::from_utf8_lossy(bytes).into_owned(),
    };

    if text.trim().is_empty() {
        return Err(ExtractionError::EmptyDocument);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_magic_bytes_detected() {
        assert_eq!(detect_format(b"%PDF-1.7 rest"), ContractFormat::Pdf);
        assert_eq!(detect_format(b"Crestron DM-NVX-D30"), ContractFormat::PlainText);
        assert_eq!(detect_format(b""), ContractFormat::PlainText);
    }

    #[test]
    fn plain_text_passes_through() {
        let text = extract_text(b"line one\nline two", ContractFormat::PlainText).unwrap();
        assert_eq!(text, "line one\nline two");
    }

    #[test]
    fn empty_document_is_an_error() {
        let result = extract_text(b"   \n\t ", ContractFormat::PlainText);
        assert!(matches!(result, Err(ExtractionError::EmptyDocument)));
    }
}
