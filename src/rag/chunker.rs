//! Overlapping fixed-size text splitting.
//!
//! Segments never exceed `chunk_size` characters and each one starts exactly
//! `overlap` characters before the previous one ended, so dropping the first
//! `overlap` characters of every segment after the first and concatenating
//! reproduces the input. Within that window a segment ends right after the
//! last line break it can reach; without one it is cut at the size limit.

use serde::{Deserialize, Serialize};

use crate::core::config::RagSettings;
use crate::core::errors::RagError;

/// A contiguous slice of a document. Offsets are in characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    pub fn is_empty(&self) -> bool {
        self.start_offset == self.end_offset
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl From<&RagSettings> for ChunkerConfig {
    fn from(settings: &RagSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            overlap: settings.chunk_overlap,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Result<Self, RagError> {
        validate(config.chunk_size, config.overlap)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> ChunkerConfig {
        self.config
    }

    pub fn split(&self, text: &str) -> Vec<Segment> {
        split_validated(text, self.config.chunk_size, self.config.overlap)
    }
}

/// Splits `text` into overlapping segments. Blank input yields no segments.
pub fn split(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<Segment>, RagError> {
    validate(chunk_size, overlap)?;
    Ok(split_validated(text, chunk_size, overlap))
}

fn validate(chunk_size: usize, overlap: usize) -> Result<(), RagError> {
    if chunk_size == 0 {
        return Err(RagError::InvalidInput(
            "chunk_size must be greater than zero".to_string(),
        ));
    }
    if overlap >= chunk_size {
        return Err(RagError::InvalidInput(format!(
            "overlap ({}) must be smaller than chunk_size ({})",
            overlap, chunk_size
        )));
    }
    Ok(())
}

fn split_validated(text: &str, chunk_size: usize, overlap: usize) -> Vec<Segment> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let byte_offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let total_chars = chars.len();

    let mut segments = Vec::new();
    let mut start = 0;

    loop {
        let hard_end = (start + chunk_size).min(total_chars);
        let end = if hard_end == total_chars {
            total_chars
        } else {
            find_line_break(&chars, start + overlap, hard_end).unwrap_or(hard_end)
        };

        segments.push(Segment {
            index: segments.len(),
            text: text[byte_offsets[start]..byte_offsets[end]].to_string(),
            start_offset: start,
            end_offset: end,
        });

        if end == total_chars {
            break;
        }

        // end > start + overlap always holds, so this advances
        start = end - overlap;
    }

    segments
}

/// Latest segment end in `(min_end, max_end]` that falls right after a newline.
fn find_line_break(chars: &[char], min_end: usize, max_end: usize) -> Option<usize> {
    (min_end..max_end)
        .rev()
        .find(|&i| chars[i] == '\n')
        .map(|i| i + 1)
}
