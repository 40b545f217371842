//! Word-processing document ingestion (`.docx`).
//!
//! The package is decoded with `docx_rs::read_docx`; its body, styles, list definitions,
//! hyperlink targets and embedded images are mapped onto a small block model, then rendered
//! either as HTML ([`convert_to_markup`]) or as plain text ([`extract_raw_text`]).

mod markup;
mod model;
mod read;
mod text;

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use docx_rs::ReadDocxOptions;

use crate::error::IngestionResult;
use crate::types::DocumentConversion;

use super::sniff::check_document_signature;
use read::ReadDocument;

/// Convert a document to markup, returning the warnings collected along the way.
pub fn convert_to_markup(bytes: &[u8]) -> IngestionResult<DocumentConversion> {
    let doc = open(bytes)?;
    let images = image_sources(&doc);
    let ctx = markup::MarkupContext {
        styles: &doc.styles,
        lists: &doc.lists,
        images: &images,
    };
    Ok(markup::render(&doc.blocks, &ctx))
}

/// Convert a document to markup, discarding warnings.
pub fn read_markup(bytes: &[u8]) -> IngestionResult<String> {
    convert_to_markup(bytes).map(|conversion| conversion.value)
}

/// Extract the document's text, one paragraph per line.
pub fn extract_raw_text(bytes: &[u8]) -> IngestionResult<String> {
    Ok(text::render(&open(bytes)?.blocks))
}

fn open(bytes: &[u8]) -> IngestionResult<ReadDocument> {
    check_document_signature(bytes)?;
    // Images are embedded as-is, so skip the reader's PNG preview pass.
    let options = ReadDocxOptions::default().with_image_previews(false);
    let docx = docx_rs::read_docx_with_options(bytes, options)?;
    Ok(ReadDocument::from_docx(docx))
}

/// `data:` URIs for every embedded image the body references, keyed by relationship id.
///
/// Relationships without an image part are left out; the renderer reports them.
fn image_sources(doc: &ReadDocument) -> HashMap<String, String> {
    let mut ids = Vec::new();
    for block in &doc.blocks {
        block.image_rel_ids(&mut ids);
    }

    let mut sources = HashMap::new();
    for id in ids {
        if sources.contains_key(id) {
            continue;
        }
        let Some((path, bytes)) = doc.images.get(id) else {
            continue;
        };
        let uri = format!("data:{};base64,{}", media_type(path), STANDARD.encode(bytes));
        sources.insert(id.to_string(), uri);
    }
    sources
}

fn media_type(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        _ => "application/octet-stream",
    }
}
