// Text extraction for uploaded .txt and .pdf files

use lopdf::Document;
use tracing::{debug, warn};

use super::{DocumentKind, ExtractedDocument};
use crate::types::{AppError, AppResult};

const PDF_SIGNATURE: &[u8] = b"%PDF-";
/// Readers accept a header that starts anywhere in the first 1024 bytes.
const PDF_HEADER_WINDOW: usize = 1024;

pub struct DocumentProcessor;

impl DocumentProcessor {
    /// Extract the text of an uploaded file. The extension picks the
    /// extractor; a `.pdf` must also carry the PDF signature.
    pub fn process(filename: &str, content: &[u8]) -> AppResult<ExtractedDocument> {
        let kind = DocumentKind::from_filename(filename)?;

        let (text, page_count) = match kind {
            DocumentKind::Text => (Self::extract_txt(content)?, 1),
            DocumentKind::Pdf => {
                let pages = Self::extract_pdf_pages(content)?;
                let count = pages.len();
                (pages.concat(), count)
            }
        };

        debug!(
            filename,
            %kind,
            page_count,
            bytes = content.len(),
            "Extracted document text"
        );

        Ok(ExtractedDocument {
            filename: filename.to_string(),
            kind,
            text,
            page_count,
        })
    }

    pub fn extract_txt(content: &[u8]) -> AppResult<String> {
        String::from_utf8(content.to_vec()).map_err(|e| AppError::FileDecode(e.to_string()))
    }

    /// Text of every page, in ascending page order.
    pub fn extract_pdf_pages(content: &[u8]) -> AppResult<Vec<String>> {
        if !has_pdf_signature(content) {
            return Err(AppError::PdfParse("missing %PDF- header".to_string()));
        }

        let doc = Document::load_mem(content).map_err(|e| AppError::PdfParse(e.to_string()))?;

        // get_pages is a BTreeMap keyed by 1-based page number
        let pages = doc
            .get_pages()
            .keys()
            .map(|&page_number| match doc.extract_text(&[page_number]) {
                Ok(text) => text,
                Err(e) => {
                    warn!(page_number, error = %e, "Failed to extract text from PDF page");
                    String::new()
                }
            })
            .collect();

        Ok(pages)
    }
}

fn has_pdf_signature(content: &[u8]) -> bool {
    content[..content.len().min(PDF_HEADER_WINDOW + PDF_SIGNATURE.len() - 1)]
        .windows(PDF_SIGNATURE.len())
        .any(|window| window == PDF_SIGNATURE)
}
