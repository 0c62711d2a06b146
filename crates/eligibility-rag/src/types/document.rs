//! Document, page and passage types with source tracking

use serde::{Deserialize, Serialize};

/// Source formats the built-in readers understand
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Plain text file (pages separated by form feeds)
    Txt,
    /// Markdown file
    Markdown,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a path
    pub fn from_path(path: &std::path::Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Get display name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Pdf => "PDF",
            Self::Txt => "Text File",
            Self::Markdown => "Markdown",
            Self::Unknown => "Unknown",
        }
    }
}

/// Text of a single page as produced by a document reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Raw page text
    pub text: String,
}

impl Page {
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }
}

/// A loaded source document. Immutable once produced by a reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Where the document came from (path or label)
    pub source: String,
    /// File type
    pub file_type: FileType,
    /// Pages in reading order
    pub pages: Vec<Page>,
}

impl Document {
    /// Create a document from its pages
    pub fn new(source: impl Into<String>, file_type: FileType, pages: Vec<Page>) -> Self {
        Self {
            source: source.into(),
            file_type,
            pages,
        }
    }

    /// Build a document from in-memory page texts, numbered from 1
    pub fn from_texts<I, S>(source: impl Into<String>, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Page::new(i as u32 + 1, text))
            .collect();
        Self::new(source, FileType::Txt, pages)
    }

    /// Total pages
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// True when no page carries any text
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.text.is_empty())
    }
}

/// A bounded excerpt of one page, eligible for independent retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Position of this passage in document order
    pub index: usize,
    /// Page the text was taken from
    pub page_number: u32,
    /// Passage text
    pub text: String,
    /// Start offset within the page, in characters
    pub char_start: usize,
    /// End offset (exclusive) within the page, in characters
    pub char_end: usize,
}

impl Passage {
    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.char_end - self.char_start
    }

    /// Format source for display
    pub fn format_source(&self) -> String {
        format!(
            "Page {}, chars {}-{}",
            self.page_number, self.char_start, self.char_end
        )
    }
}
