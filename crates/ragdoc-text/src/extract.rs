use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use ragdoc_core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "txt" | "md" | "markdown" => Ok(Self::PlainText),
            "" => Err(Error::extraction(path, "file has no extension")),
            other => Err(Error::extraction(path, format!("unsupported document format '.{}'", other))),
        }
    }
}

/// Read the whole text of a document.
///
/// PDFs are read page by page in page order; the pages' text is concatenated
/// as-is. The result may be empty or whitespace-only; deciding whether that
/// is usable is left to the caller.
pub fn extract_text(path: &Path) -> Result<String> {
    match DocumentKind::from_path(path)? {
        DocumentKind::Pdf => extract_pdf(path),
        DocumentKind::PlainText => read_plain_text(path),
    }
}

fn read_plain_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::extraction(path, e))?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

fn extract_pdf(path: &Path) -> Result<String> {
    let doc = lopdf::Document::load(path).map_err(|e| Error::extraction(path, e))?;
    match extract_pages(&doc) {
        Ok(text) if !text.trim().is_empty() => Ok(text),
        // Fonts without a usable encoding come back empty or fail per page;
        // the whole-document extractor handles more of those.
        per_page => match extract_whole_document(path) {
            Ok(text) => Ok(text),
            Err(fallback) => per_page.map_err(|e| Error::extraction(path, format!("{}; fallback: {}", e, fallback))),
        },
    }
}

fn extract_pages(doc: &lopdf::Document) -> std::result::Result<String, String> {
    let mut text = String::new();
    for page_number in doc.get_pages().keys() {
        let page = doc.extract_text(&[*page_number]).map_err(|e| format!("page {}: {}", page_number, e))?;
        text.push_str(&page);
    }
    Ok(text)
}

fn extract_whole_document(path: &Path) -> std::result::Result<String, String> {
    match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text(path))) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("pdf-extract panicked".to_string()),
    }
}
