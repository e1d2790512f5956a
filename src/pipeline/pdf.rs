//! PDF extraction: per-page text and images via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto a thread
//! designed for blocking operations, so the Tokio workers never stall on
//! CPU-heavy decoding.
//!
//! ## Two image modes
//!
//! [`PdfImageMode::Embedded`] pulls the raster objects out of each page
//! losslessly — right for slide-deck PDFs where figures are discrete
//! images. [`PdfImageMode::PageRender`] rasterises the whole page and
//! lets the model read it as a human would — right for scans and
//! vector-heavy layouts with an unreliable text layer.

use crate::config::{PdfImageMode, SummaryConfig};
use crate::error::SummarizeError;
use crate::pipeline::{repair_umlauts, Unit};
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Extract one [`Unit`] per page of a PDF.
///
/// Runs inside `spawn_blocking` since pdfium operations are CPU-bound.
pub async fn extract_units(
    pdf_path: &Path,
    config: &SummaryConfig,
) -> Result<Vec<Unit>, SummarizeError> {
    let path = pdf_path.to_path_buf();
    let mode = config.pdf_images;
    let max_pixels = config.max_rendered_pixels;

    tokio::task::spawn_blocking(move || extract_units_blocking(&path, mode, max_pixels))
        .await
        .map_err(|e| SummarizeError::Internal(format!("PDF extraction task panicked: {e}")))?
}

fn extract_units_blocking(
    pdf_path: &Path,
    mode: PdfImageMode,
    max_pixels: u32,
) -> Result<Vec<Unit>, SummarizeError> {
    let pdfium = Pdfium::default();

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| SummarizeError::CorruptDocument {
            path: pdf_path.to_path_buf(),
            expected: "PDF",
            detail: format!("{e:?}"),
        })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let render_config = match mode {
        PdfImageMode::PageRender { dpi } => {
            // Target width from DPI assuming letter width, capped by the
            // pixel budget so oversized pages stay bounded.
            let target = ((dpi as f32 * 8.5) as u32).min(max_pixels);
            Some(
                PdfRenderConfig::new()
                    .set_target_width(target as i32)
                    .set_maximum_height(max_pixels as i32),
            )
        }
        PdfImageMode::Embedded => None,
    };

    let mut units = Vec::with_capacity(pages.len() as usize);

    for (idx, page) in pages.iter().enumerate() {
        let unit_num = idx + 1;

        let text = match page.text() {
            Ok(t) => repair_umlauts(&t.all()),
            Err(e) => {
                warn!("Page {}: text layer unreadable: {:?}", unit_num, e);
                String::new()
            }
        };

        let images = match &render_config {
            Some(rc) => match page.render_with_config(rc) {
                Ok(bitmap) => vec![bitmap.as_image()],
                Err(e) => {
                    warn!("Page {}: rasterisation failed: {:?}", unit_num, e);
                    Vec::new()
                }
            },
            None => embedded_images(&page, unit_num),
        };

        debug!(
            "Page {}: {} chars text, {} images",
            unit_num,
            text.len(),
            images.len()
        );

        units.push(Unit {
            unit_num,
            text,
            images,
            error: None,
        });
    }

    Ok(units)
}

/// Pull the raster image objects out of one page, in object order.
///
/// A single undecodable image degrades that unit (logged, omitted); it
/// never aborts the page.
fn embedded_images(page: &PdfPage, unit_num: usize) -> Vec<image::DynamicImage> {
    let mut images = Vec::new();
    for object in page.objects().iter() {
        if let Some(image_object) = object.as_image_object() {
            match image_object.get_raw_image() {
                Ok(img) => images.push(img),
                Err(e) => {
                    warn!("Page {}: undecodable embedded image: {:?}", unit_num, e);
                }
            }
        }
    }
    images
}
