//! Diet plan text extraction via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is CPU-bound and not
//! async-safe. Parsing runs on the blocking pool so the Tokio workers never
//! stall on a large plan.
//!
//! ## Degrading per page
//!
//! A page whose text layer cannot be read (scanned, image-only) contributes
//! an empty string. Only a document that cannot be opened at all fails the
//! operation.

use crate::error::AnalysisError;
use crate::output::DietPlan;
use crate::pipeline::input::looks_like_pdf;
use pdfium_render::prelude::*;
use tracing::{debug, info, warn};

/// Extract the diet text from PDF bytes.
pub async fn extract_diet_plan(bytes: Vec<u8>) -> Result<DietPlan, AnalysisError> {
    check_document(&bytes)?;

    tokio::task::spawn_blocking(move || extract_blocking(&bytes))
        .await
        .map_err(|e| AnalysisError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Cheap checks that run before pdfium is bound.
fn check_document(bytes: &[u8]) -> Result<(), AnalysisError> {
    if bytes.is_empty() {
        return Err(AnalysisError::DocumentUnreadable {
            detail: "document is empty".into(),
        });
    }
    if !looks_like_pdf(bytes) {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(AnalysisError::DocumentUnreadable {
            detail: format!("not a PDF (first bytes: {:?})", magic),
        });
    }
    Ok(())
}

/// Blocking implementation of text extraction.
fn extract_blocking(bytes: &[u8]) -> Result<DietPlan, AnalysisError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| AnalysisError::DocumentUnreadable {
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    info!("Diet plan loaded: {} pages", pages.len());

    let texts: Vec<Option<String>> = pages
        .iter()
        .enumerate()
        .map(|(idx, page)| match page.text() {
            Ok(text) => {
                let text = text.all();
                debug!("Page {}: {} chars", idx + 1, text.len());
                Some(text)
            }
            Err(e) => {
                warn!("Page {}: no extractable text ({:?})", idx + 1, e);
                None
            }
        })
        .collect();

    Ok(DietPlan::from_pages(texts))
}

/// Bind to a pdfium library.
///
/// Resolution order: `PDFIUM_LIB_PATH`, the working directory, then the
/// system library path.
fn bind_pdfium() -> Result<Pdfium, AnalysisError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| AnalysisError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}
