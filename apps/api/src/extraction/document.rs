//! Plain-text extraction from uploaded documents (PDF, DOCX, DOC, TXT).

use std::io::{Cursor, Read};

use bytes::Bytes;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use thiserror::Error;

use crate::errors::AppError;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp", "svg", "heic"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "flac", "ogg", "m4a"];
const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "rar", "7z", "tar", "gz", "bz2", "xz"];

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("{category} files are not supported ('{filename}'). Upload a PDF, DOCX, DOC or TXT file")]
    Unsupported {
        category: &'static str,
        filename: String,
    },

    #[error("'{0}' has an unsupported format. Upload a PDF, DOCX, DOC or TXT file")]
    UnknownFormat(String),

    #[error("'{0}' is empty")]
    Empty(String),

    #[error("'{filename}' exceeds the {limit} byte upload limit")]
    TooLarge { filename: String, limit: usize },

    #[error("could not read PDF '{filename}': {reason}")]
    Pdf { filename: String, reason: String },

    #[error("could not read Word document '{filename}': {reason}")]
    Docx { filename: String, reason: String },

    #[error("'{0}' is a legacy binary Word document. Save it as PDF or DOCX and upload again")]
    LegacyDoc(String),

    #[error("document decoding task failed: {0}")]
    Task(String),
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Task(msg) => AppError::Internal(anyhow::anyhow!(msg)),
            other => AppError::Validation(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    /// Tried as OOXML first; true legacy binaries are rejected.
    Doc,
    Txt,
}

impl DocumentKind {
    pub fn from_filename(filename: &str) -> Result<Self, DocumentError> {
        let ext = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        let unsupported = |category| DocumentError::Unsupported {
            category,
            filename: filename.to_string(),
        };

        match ext.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" => Ok(DocumentKind::Docx),
            "doc" => Ok(DocumentKind::Doc),
            "txt" => Ok(DocumentKind::Txt),
            e if IMAGE_EXTENSIONS.contains(&e) => Err(unsupported("Image")),
            e if VIDEO_EXTENSIONS.contains(&e) => Err(unsupported("Video")),
            e if AUDIO_EXTENSIONS.contains(&e) => Err(unsupported("Audio")),
            e if ARCHIVE_EXTENSIONS.contains(&e) => Err(unsupported("Archive")),
            _ => Err(DocumentError::UnknownFormat(filename.to_string())),
        }
    }
}

/// Validates the upload, decodes it off the async runtime and returns cleaned text.
pub async fn extract_text(
    filename: &str,
    data: Bytes,
    max_bytes: usize,
) -> Result<String, DocumentError> {
    let kind = DocumentKind::from_filename(filename)?;
    if data.is_empty() {
        return Err(DocumentError::Empty(filename.to_string()));
    }
    if data.len() > max_bytes {
        return Err(DocumentError::TooLarge {
            filename: filename.to_string(),
            limit: max_bytes,
        });
    }

    let name = filename.to_string();
    let raw = tokio::task::spawn_blocking(move || decode(kind, &name, &data))
        .await
        .map_err(|e| {
            if e.is_panic() {
                // pdf-extract panics on some malformed inputs
                DocumentError::Pdf {
                    filename: filename.to_string(),
                    reason: "the file is damaged or not a valid document".to_string(),
                }
            } else {
                DocumentError::Task(e.to_string())
            }
        })??;

    Ok(clean_text(&raw))
}

pub fn decode(kind: DocumentKind, filename: &str, data: &[u8]) -> Result<String, DocumentError> {
    match kind {
        DocumentKind::Pdf => {
            pdf_extract::extract_text_from_mem(data).map_err(|e| DocumentError::Pdf {
                filename: filename.to_string(),
                reason: e.to_string(),
            })
        }
        DocumentKind::Docx => docx_text(data).map_err(|reason| DocumentError::Docx {
            filename: filename.to_string(),
            reason,
        }),
        DocumentKind::Doc => {
            docx_text(data).map_err(|_| DocumentError::LegacyDoc(filename.to_string()))
        }
        DocumentKind::Txt => Ok(plain_text(data)),
    }
}

/// UTF-8 with a Latin-1 fallback. A leading BOM is dropped.
fn plain_text(data: &[u8]) -> String {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    match std::str::from_utf8(data) {
        Ok(s) => s.to_string(),
        Err(_) => data.iter().map(|&b| b as char).collect(),
    }
}

/// Reads `word/document.xml` from the OOXML container.
fn docx_text(data: &[u8]) -> Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).map_err(|e| e.to_string())?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| e.to_string())?
        .read_to_string(&mut xml)
        .map_err(|e| e.to_string())?;

    let mut reader = Reader::from_str(&xml);
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => out.push('\t'),
                b"w:br" | b"w:cr" | b"w:p" => out.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => {
                out.push_str(&t.unescape().map_err(|e| e.to_string())?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(out)
}

/// Trims each line, collapses whitespace runs to one space, drops empty lines.
pub fn clean_text(raw: &str) -> String {
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_bytes(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    const DOCUMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">Skills: </w:t></w:r><w:r><w:t>Rust &amp; Go</w:t></w:r></w:p>
    <w:p><w:r><w:t>Role</w:t><w:tab/><w:t>Engineer</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

    #[test]
    fn test_kind_from_extension_is_case_insensitive() {
        assert_eq!(DocumentKind::from_filename("cv.PDF").unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_filename("cv.docx").unwrap(), DocumentKind::Docx);
        assert_eq!(DocumentKind::from_filename("cv.Doc").unwrap(), DocumentKind::Doc);
        assert_eq!(DocumentKind::from_filename("a.b.txt").unwrap(), DocumentKind::Txt);
    }

    #[test]
    fn test_unsupported_messages_name_category() {
        let msg = DocumentKind::from_filename("photo.jpeg").unwrap_err().to_string();
        assert!(msg.starts_with("Image files are not supported"));
        let msg = DocumentKind::from_filename("clip.mp4").unwrap_err().to_string();
        assert!(msg.starts_with("Video"));
        let msg = DocumentKind::from_filename("song.mp3").unwrap_err().to_string();
        assert!(msg.starts_with("Audio"));
        let msg = DocumentKind::from_filename("bundle.zip").unwrap_err().to_string();
        assert!(msg.starts_with("Archive"));
        assert!(matches!(
            DocumentKind::from_filename("README"),
            Err(DocumentError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_docx_paragraphs_and_tabs() {
        let text = decode(DocumentKind::Docx, "cv.docx", &docx_bytes(DOCUMENT_XML)).unwrap();
        let cleaned = clean_text(&text);
        assert_eq!(cleaned, "Jane Doe\nSkills: Rust & Go\nRole Engineer");
    }

    #[test]
    fn test_doc_extension_accepts_ooxml_content() {
        let text = decode(DocumentKind::Doc, "cv.doc", &docx_bytes(DOCUMENT_XML)).unwrap();
        assert!(text.contains("Jane Doe"));
    }

    #[test]
    fn test_legacy_doc_is_rejected() {
        // OLE2 compound file header
        let legacy = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0, 0, 0, 0];
        let err = decode(DocumentKind::Doc, "old.doc", &legacy).unwrap_err();
        assert!(matches!(err, DocumentError::LegacyDoc(_)));
    }

    #[test]
    fn test_corrupt_docx_is_a_document_error() {
        let err = decode(DocumentKind::Docx, "bad.docx", b"not a zip").unwrap_err();
        assert!(matches!(err, DocumentError::Docx { .. }));
        assert!(matches!(AppError::from(err), AppError::Validation(_)));
    }

    #[test]
    fn test_txt_latin1_fallback() {
        let bytes = b"Caf\xe9 manager";
        assert_eq!(plain_text(bytes), "Café manager");
        assert_eq!(plain_text("\u{feff}hello".as_bytes()), "hello");
    }

    #[test]
    fn test_clean_text_keeps_lines() {
        let raw = "  Jane   Doe \n\n\t Rust\tDeveloper  \n   \n";
        assert_eq!(clean_text(raw), "Jane Doe\nRust Developer");
    }

    #[tokio::test]
    async fn test_extract_rejects_empty_and_oversized() {
        let err = extract_text("cv.txt", Bytes::new(), 100).await.unwrap_err();
        assert!(matches!(err, DocumentError::Empty(_)));

        let err = extract_text("cv.txt", Bytes::from(vec![b'a'; 101]), 100)
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::TooLarge { limit: 100, .. }));
    }

    #[tokio::test]
    async fn test_extract_txt_is_cleaned() {
        let text = extract_text("cv.txt", Bytes::from_static(b" a  b \n\n c "), 1024)
            .await
            .unwrap();
        assert_eq!(text, "a b\nc");
    }

    #[tokio::test]
    async fn test_garbage_pdf_is_validation_error() {
        let err = extract_text("cv.pdf", Bytes::from_static(b"%PDF-garbage"), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Pdf { .. }));
    }
}
