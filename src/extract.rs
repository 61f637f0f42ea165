//! Multi-format text extraction for uploaded documents.
//!
//! Dispatch is on the declared file extension; this module takes raw bytes and
//! returns best-effort plain UTF-8 text. Extraction is never retried; failures
//! surface to the caller as validation-class errors.

use std::io::Read;
use std::io::Write;

/// Extensions accepted by the upload path, lowercase, without the dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "docx", "txt", "jpg", "jpeg", "png"];

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug)]
pub enum ExtractError {
    UnsupportedExtension(String),
    Pdf(String),
    Docx(String),
    Text(String),
    Ocr(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::UnsupportedExtension(ext) => {
                write!(f, "unsupported file extension: {}", ext)
            }
            ExtractError::Pdf(e) => write!(f, "Error processing PDF: {}", e),
            ExtractError::Docx(e) => write!(f, "Error processing DOCX: {}", e),
            ExtractError::Text(e) => write!(f, "Error decoding text file: {}", e),
            ExtractError::Ocr(e) => write!(f, "Error processing image: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Returns the lowercase extension of a filename, without the dot.
pub fn file_extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Extracts plain text from document bytes. `extension` is matched
/// case-insensitively and may carry a leading dot.
pub async fn extract_text(bytes: &[u8], extension: &str) -> Result<String, ExtractError> {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => extract_pdf(bytes),
        "docx" => extract_docx(bytes),
        "txt" => extract_plain_text(bytes),
        "jpg" | "jpeg" | "png" => extract_image(bytes, &ext).await,
        _ => Err(ExtractError::UnsupportedExtension(ext)),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes)
        .map(|t| t.trim_end().to_string())
        .map_err(|e| ExtractError::Pdf(e.to_string()))
}

fn extract_plain_text(bytes: &[u8]) -> Result<String, ExtractError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| ExtractError::Text(e.to_string()))
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut doc_xml = Vec::new();
    let mut found = false;
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| ExtractError::Docx(e.to_string()))?;
        if entry.name() == "word/document.xml" {
            entry
                .take(MAX_XML_ENTRY_BYTES)
                .read_to_end(&mut doc_xml)
                .map_err(|e| ExtractError::Docx(e.to_string()))?;
            if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
                return Err(ExtractError::Docx(
                    "word/document.xml exceeds size limit".to_string(),
                ));
            }
            found = true;
            break;
        }
    }
    if !found {
        return Err(ExtractError::Docx(
            "word/document.xml not found".to_string(),
        ));
    }
    extract_paragraph_text(&doc_xml)
}

/// Walks `word/document.xml` collecting `w:t` runs, inserting a newline at each
/// paragraph boundary so the output mirrors the document's paragraph order.
fn extract_paragraph_text(xml: &[u8]) -> Result<String, ExtractError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        out.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"p" && !out.is_empty() {
                    out.push('\n');
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out.trim_end().to_string())
}

/// Runs the `tesseract` CLI over the image bytes. The temp file is removed on
/// drop, covering both success and error exits.
async fn extract_image(bytes: &[u8], ext: &str) -> Result<String, ExtractError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("plaindoc-ocr-")
        .suffix(&format!(".{}", ext))
        .tempfile()
        .map_err(|e| ExtractError::Ocr(e.to_string()))?;
    tmp.write_all(bytes)
        .map_err(|e| ExtractError::Ocr(e.to_string()))?;
    tmp.flush().map_err(|e| ExtractError::Ocr(e.to_string()))?;

    let output = tokio::process::Command::new("tesseract")
        .arg(tmp.path())
        .arg("stdout")
        .output()
        .await
        .map_err(|e| ExtractError::Ocr(format!("failed to run tesseract: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtractError::Ocr(format!(
            "tesseract exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let text = String::from_utf8_lossy(&output.stdout);
    Ok(text.trim().to_string())
}
