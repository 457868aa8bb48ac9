//! Text Extractor — turns an uploaded PDF into plain text.
//!
//! Extraction is best effort: failures are logged and yield an empty string so
//! the analysis pipeline always continues.

use std::panic;

use bytes::Bytes;
use tracing::{debug, error, warn};

/// Extracts the text of every page, concatenated in page order.
///
/// Returns an empty string if the document cannot be read.
pub fn extract_text(buffer: &[u8]) -> String {
    // pdf-extract panics on some malformed inputs instead of returning Err.
    let result = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(buffer));

    match result {
        Ok(Ok(pages)) => {
            debug!("Extracted text from {} PDF page(s)", pages.len());
            pages.concat()
        }
        Ok(Err(e)) => {
            warn!("PDF extraction failed: {e}");
            String::new()
        }
        Err(_) => {
            warn!("PDF extraction failed: parser panicked");
            String::new()
        }
    }
}

/// Runs `extract_text` on the blocking thread pool.
pub async fn extract_text_off_runtime(buffer: Bytes) -> String {
    match tokio::task::spawn_blocking(move || extract_text(&buffer)).await {
        Ok(text) => text,
        Err(e) => {
            error!("PDF extraction task failed: {e}");
            String::new()
        }
    }
}
