//! Document readers that turn a source file into page-level text

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{Document, FileType, Page};

/// Capability interface for anything that can load a page-structured document
pub trait DocumentReader: Send + Sync {
    /// Read the file at `path` into pages
    fn read(&self, path: &Path) -> Result<Document>;

    /// Get reader name for logging
    fn name(&self) -> &str;
}

/// Typographic characters PDF text extraction commonly produces, folded to ASCII
const PDF_REPLACEMENTS: &[(char, &str)] = &[
    ('\u{2010}', "-"),   // Hyphen
    ('\u{2011}', "-"),   // Non-breaking hyphen
    ('\u{2013}', "-"),   // En dash
    ('\u{2014}', "--"),  // Em dash
    ('\u{2018}', "'"),   // Left single quote
    ('\u{2019}', "'"),   // Right single quote
    ('\u{201C}', "\""),  // Left double quote
    ('\u{201D}', "\""),  // Right double quote
    ('\u{2022}', "* "),  // Bullet
    ('\u{2026}', "..."), // Ellipsis
    ('\u{00A0}', " "),   // Non-breaking space
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

/// Clean up extracted PDF text: fold glyphs, drop NULs and blank lines
fn cleanup_pdf_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match PDF_REPLACEMENTS.iter().find(|(from, _)| *from == ch) {
            Some((_, to)) => result.push_str(to),
            None if ch == '\0' => {}
            None => result.push(ch),
        }
    }

    result
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// PDF reader producing one page per PDF page
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfReader;

impl PdfReader {
    /// Parse PDF bytes already in memory
    pub fn read_bytes(&self, source: &str, data: &[u8]) -> Result<Document> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::source_read(source, format!("Failed to load PDF: {}", e)))?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Err(Error::source_read(source, "PDF contains no pages"));
        }

        let mut pages = Vec::with_capacity(page_numbers.len());
        for page_number in page_numbers {
            let text = match doc.extract_text(&[page_number]) {
                Ok(text) => cleanup_pdf_text(&text),
                Err(e) => {
                    tracing::warn!("Could not extract text from page {}: {}", page_number, e);
                    String::new()
                }
            };
            pages.push(Page::new(page_number, text));
        }

        tracing::debug!("Extracted {} pages from {}", pages.len(), source);
        Ok(Document::new(source, FileType::Pdf, pages))
    }
}

impl DocumentReader for PdfReader {
    fn read(&self, path: &Path) -> Result<Document> {
        let source = path.display().to_string();
        let data = std::fs::read(path).map_err(|e| Error::source_read(&source, e.to_string()))?;
        self.read_bytes(&source, &data)
    }

    fn name(&self) -> &str {
        "lopdf"
    }
}

/// Plain text / markdown reader. Form feeds separate pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextReader;

impl TextReader {
    /// Split text into pages on form feed characters
    pub fn parse_text(&self, source: &str, file_type: FileType, content: &str) -> Document {
        let pages = content
            .split('\u{000C}')
            .enumerate()
            .map(|(i, text)| Page::new(i as u32 + 1, text))
            .collect();
        Document::new(source, file_type, pages)
    }
}

impl DocumentReader for TextReader {
    fn read(&self, path: &Path) -> Result<Document> {
        let source = path.display().to_string();
        let data = std::fs::read(path).map_err(|e| Error::source_read(&source, e.to_string()))?;
        let content = String::from_utf8_lossy(&data);

        let file_type = match FileType::from_path(path) {
            FileType::Markdown => FileType::Markdown,
            _ => FileType::Txt,
        };
        Ok(self.parse_text(&source, file_type, &content))
    }

    fn name(&self) -> &str {
        "text"
    }
}

/// Picks a reader from the file extension
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoReader {
    pdf: PdfReader,
    text: TextReader,
}

impl DocumentReader for AutoReader {
    fn read(&self, path: &Path) -> Result<Document> {
        match FileType::from_path(path) {
            FileType::Pdf => self.pdf.read(path),
            FileType::Txt | FileType::Markdown => self.text.read(path),
            FileType::Unknown => Err(Error::source_read(
                path.display().to_string(),
                "Unsupported file type (expected .pdf, .txt or .md)",
            )),
        }
    }

    fn name(&self) -> &str {
        "auto"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cleanup_pdf_text() {
        let raw = "  Certi\u{FB01}cation\u{2014}ISO 9001 \u{201C}required\u{201D}\0\n\n   \nnext ";
        assert_eq!(
            cleanup_pdf_text(raw),
            "Certification--ISO 9001 \"required\"\nnext"
        );
    }

    #[test]
    fn test_text_reader_splits_on_form_feed() {
        let doc = TextReader.parse_text("mem", FileType::Txt, "page one\u{000C}page two");
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages[1], Page::new(2, "page two"));
    }

    #[test]
    fn test_auto_reader_reads_text_file() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "Certification: ISO 9001 required").unwrap();

        let doc = AutoReader::default().read(file.path()).unwrap();
        assert_eq!(doc.file_type, FileType::Txt);
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.pages[0].text.contains("ISO 9001"));
    }

    #[test]
    fn test_auto_reader_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        let err = AutoReader::default().read(file.path()).unwrap_err();
        assert!(matches!(err, Error::SourceRead { .. }));
    }

    #[test]
    fn test_missing_file_is_source_read_error() {
        let err = TextReader.read(Path::new("/nonexistent/rfp.txt")).unwrap_err();
        assert!(matches!(err, Error::SourceRead { .. }));
    }

    #[test]
    fn test_invalid_pdf_is_source_read_error() {
        let err = PdfReader.read_bytes("bad.pdf", b"not a pdf at all").unwrap_err();
        assert!(matches!(err, Error::SourceRead { .. }));
    }
}
