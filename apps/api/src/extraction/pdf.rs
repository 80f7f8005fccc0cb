use std::fmt::Display;
use std::panic;

use lopdf::Document;
use tracing::{debug, warn};

use crate::extraction::ExtractionReport;

/// Returns true if the bytes start with the `%PDF-` magic.
pub fn is_pdf(head: &[u8]) -> bool {
    head.starts_with(b"%PDF-")
}

/// Extracts text page by page. Pages that fail contribute empty text.
///
/// When the document structure itself cannot be parsed, falls back to a
/// whole-document pass with `pdf-extract`, which tolerates some files lopdf rejects.
pub fn extract_pages(bytes: &[u8]) -> ExtractionReport {
    match Document::load_mem(bytes) {
        Ok(doc) => {
            let pages = doc.get_pages();
            collect_pages(
                pages
                    .keys()
                    .map(|page_num| (*page_num, doc.extract_text(&[*page_num]))),
            )
        }
        Err(e) => {
            debug!("lopdf could not load document ({e}); trying pdf-extract");
            extract_whole_document(bytes)
        }
    }
}

fn extract_whole_document(bytes: &[u8]) -> ExtractionReport {
    // pdf-extract panics on some malformed fonts instead of returning an error.
    let outcome = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));
    match outcome {
        Ok(Ok(text)) => ExtractionReport {
            text,
            pages: 1,
            failed_pages: 0,
        },
        Ok(Err(e)) => {
            warn!("PDF text extraction failed: {e}");
            ExtractionReport {
                pages: 1,
                failed_pages: 1,
                ..ExtractionReport::default()
            }
        }
        Err(_) => {
            warn!("PDF text extraction panicked; using empty text");
            ExtractionReport {
                pages: 1,
                failed_pages: 1,
                ..ExtractionReport::default()
            }
        }
    }
}

fn collect_pages<I, E>(pages: I) -> ExtractionReport
where
    I: IntoIterator<Item = (u32, Result<String, E>)>,
    E: Display,
{
    let mut report = ExtractionReport::default();
    for (page_num, result) in pages {
        report.pages += 1;
        match result {
            Ok(text) => report.text.push_str(&text),
            Err(e) => {
                warn!("Failed to extract text from page {page_num}: {e}");
                report.failed_pages += 1;
            }
        }
    }
    report
}
