//! Text processing: cleaning, sentence splitting, tokenizing, chunking.

pub mod chunker;
pub mod cleaner;
pub mod splitter;
pub mod tokenizer;

pub use chunker::{DEFAULT_TARGET_WORDS, segment_text};

use serde::Serialize;

/// A contiguous span of source text assigned one generated image.
#[derive(Debug, Clone, Serialize)]
pub struct Segment {
    /// 0-based position in the segment sequence
    pub index: usize,
    /// The segment text
    pub text: String,
    /// Number of word tokens in `text`
    pub word_count: usize,
}

impl Segment {
    /// Create a segment, deriving the word count from the text.
    pub fn new(index: usize, text: String) -> Self {
        let word_count = tokenizer::word_count(&text);
        Self {
            index,
            text,
            word_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_word_count_derived() {
        let seg = Segment::new(3, "three little words".to_string());
        assert_eq!(seg.index, 3);
        assert_eq!(seg.word_count, 3);
    }
}
