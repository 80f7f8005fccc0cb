//! Best-effort text extraction from stored uploads.
//!
//! Extraction never fails from the caller's point of view: anything that cannot be
//! read becomes empty text, and the number of pages lost is reported for logging.

pub mod pdf;

use std::path::Path;

use tracing::warn;

/// Outcome of extracting one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    pub text: String,
    pub pages: usize,
    pub failed_pages: usize,
}

/// Converts a stored document into raw text.
///
/// Implementations are synchronous and CPU-bound; callers run them on the blocking pool.
pub trait DocumentExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> ExtractionReport;
}

/// Default extractor: PDFs page by page, UTF-8 text files verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResumeTextExtractor;

impl DocumentExtractor for ResumeTextExtractor {
    fn extract(&self, path: &Path) -> ExtractionReport {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read upload {}: {e}", path.display());
                return ExtractionReport {
                    failed_pages: 1,
                    ..ExtractionReport::default()
                };
            }
        };

        if pdf::is_pdf(&bytes) {
            return pdf::extract_pages(&bytes);
        }

        match String::from_utf8(bytes) {
            Ok(text) => ExtractionReport {
                text,
                pages: 1,
                failed_pages: 0,
            },
            Err(_) => {
                warn!(
                    "Upload {} is neither a PDF nor UTF-8 text; using empty text",
                    path.display()
                );
                ExtractionReport {
                    pages: 1,
                    failed_pages: 1,
                    ..ExtractionReport::default()
                }
            }
        }
    }
}
