use super::ExtractionError;

/// Extract the text layer from a digital PDF, page by page, joined with
/// newlines. Scanned PDFs without a text layer come back empty and are
/// rejected upstream as `EmptyDocument`.
pub fn extract_pdf_text(pdf_bytes: &[u8]) -> Result<String, ExtractionError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
        .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;
    Ok(pages.join("\n"))
}
