use serde::{Deserialize, Serialize};

/// Full extracted text for one subject. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: String,
    source: String,
}

impl Document {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Where the text came from (profile URL, file name, "inline").
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn stats(&self, segments: usize) -> DocumentStats {
        DocumentStats {
            characters: self.text.chars().count(),
            words: self.text.split_whitespace().count(),
            lines: self.text.matches('\n').count() + 1,
            segments,
        }
    }
}

/// Display-only counters for a processed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    pub characters: usize,
    pub words: usize,
    pub lines: usize,
    pub segments: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_count_characters_words_and_lines() {
        let doc = Document::new("Name: Zoë\nHeadline: Engineer at Acme", "inline");
        let stats = doc.stats(1);

        assert_eq!(stats.characters, 36);
        assert_eq!(stats.words, 6);
        assert_eq!(stats.lines, 2);
        assert_eq!(stats.segments, 1);
    }

    #[test]
    fn empty_document_has_one_line() {
        let stats = Document::new("", "inline").stats(0);
        assert_eq!(stats.characters, 0);
        assert_eq!(stats.words, 0);
        assert_eq!(stats.lines, 1);
    }
}
