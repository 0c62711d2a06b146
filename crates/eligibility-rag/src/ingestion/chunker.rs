//! Text chunking with page and position tracking

use crate::error::{Error, Result};
use crate::types::{Document, Passage};

/// Fixed-size sliding-window chunker. Sizes are counted in characters.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    /// Window length in characters
    chunk_size: usize,
    /// Characters shared by consecutive windows
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker. Requires `chunk_size > 0` and `overlap < chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::invalid_config("chunk_size must be greater than 0"));
        }
        if overlap >= chunk_size {
            return Err(Error::invalid_config(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Split every page of a document, preserving page order then offset order
    pub fn split(&self, doc: &Document) -> Vec<Passage> {
        let mut passages = Vec::new();

        for page in &doc.pages {
            let before = passages.len();
            self.split_page(page.page_number, &page.text, &mut passages);
            tracing::debug!(
                "Page {}: {} passages",
                page.page_number,
                passages.len() - before
            );
        }

        passages
    }

    /// Walk the window over one page's text
    fn split_page(&self, page_number: u32, text: &str, out: &mut Vec<Passage>) {
        // Byte offset of every char boundary, including the end of text
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_count = boundaries.len() - 1;

        if char_count == 0 {
            return;
        }

        let mut start = 0usize;
        loop {
            let end = (start + self.chunk_size).min(char_count);

            out.push(Passage {
                index: out.len(),
                page_number,
                text: text[boundaries[start]..boundaries[end]].to_string(),
                char_start: start,
                char_end: end,
            });

            if end == char_count {
                break;
            }
            start += self.stride();
        }
    }
}
