// src/extract.rs
//! Text extraction from uploaded documents.
//!
//! Supported: `.txt`, `.pdf` (digital), `.docx`, `.csv`, `.json`. The strategy is
//! picked from the lowercase file extension; anything else is rejected before
//! the file is read.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::display::{render_table, Align};
use crate::error::{AnalysisError, Result};

pub const SUPPORTED_EXTENSIONS: [&str; 5] = [".txt", ".pdf", ".docx", ".csv", ".json"];

/// Convert a file on disk to plain text.
pub fn load_text_from_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let ext = extension_of(path);
    ensure_supported(&ext)?;
    let bytes = fs::read(path)?;
    extract_by_extension(&ext, &bytes)
}

/// Same as [`load_text_from_file`] for uploads that never touched the disk.
pub fn extract_text_from_bytes(file_name: &str, bytes: &[u8]) -> Result<String> {
    let ext = extension_of(Path::new(file_name));
    ensure_supported(&ext)?;
    extract_by_extension(&ext, bytes)
}

/// Lowercase extension with its leading dot, or `""`.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| format!(".{}", s.to_ascii_lowercase()))
        .unwrap_or_default()
}

fn ensure_supported(ext: &str) -> Result<()> {
    if SUPPORTED_EXTENSIONS.contains(&ext) {
        Ok(())
    } else {
        Err(AnalysisError::UnsupportedFormat(ext.to_string()))
    }
}

fn extract_by_extension(ext: &str, bytes: &[u8]) -> Result<String> {
    debug!(ext, bytes = bytes.len(), "extracting text");
    match ext {
        ".txt" => Ok(decode_lossy(bytes)),
        ".pdf" => extract_pdf(bytes),
        ".docx" => extract_docx(bytes),
        ".csv" => extract_csv(bytes),
        ".json" => Ok(extract_json(bytes)),
        other => Err(AnalysisError::UnsupportedFormat(other.to_string())),
    }
}

/// UTF-8 with undecodable bytes dropped.
fn decode_lossy(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(bytes).replace('\u{FFFD}', ""),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
        warn!("PDF extraction failed: {}", e);
        AnalysisError::Extraction(format!("pdf: {e}"))
    })
}

/// Body paragraphs joined by newlines; empty paragraphs are kept as blank lines.
fn extract_docx(bytes: &[u8]) -> Result<String> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| {
        warn!("DOCX extraction failed: {}", e);
        AnalysisError::Extraction(format!("docx: {e}"))
    })?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            docx_rs::DocumentChild::Paragraph(para) => Some(paragraph_text(para)),
            _ => None,
        })
        .collect();
    Ok(paragraphs.join("\n"))
}

fn paragraph_text(para: &docx_rs::Paragraph) -> String {
    para.children
        .iter()
        .filter_map(|pc| match pc {
            docx_rs::ParagraphChild::Run(run) => Some(
                run.children
                    .iter()
                    .filter_map(|rc| match rc {
                        docx_rs::RunChild::Text(t) => Some(t.text.as_str()),
                        _ => None,
                    })
                    .collect::<String>(),
            ),
            _ => None,
        })
        .collect()
}

/// Header plus rows as a right-aligned table, no index column.
fn extract_csv(bytes: &[u8]) -> Result<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AnalysisError::Extraction(format!("csv headers: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AnalysisError::Extraction(format!("csv record: {e}")))?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }
    Ok(render_table(&headers, &rows, Align::Right))
}

/// Valid JSON is re-serialized with two-space indentation (key order kept);
/// anything else comes back as the raw text.
fn extract_json(bytes: &[u8]) -> String {
    let raw = decode_lossy(bytes);
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(v) => serde_json::to_string_pretty(&v).unwrap_or(raw),
        Err(_) => raw,
    }
}
