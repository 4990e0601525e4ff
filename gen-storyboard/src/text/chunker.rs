//! Greedy sentence-packing chunker.
//!
//! Accumulates whole sentences toward a target word count. A segment is
//! flushed when adding the next sentence would overshoot the tolerance
//! (1.4 × target) or once the target is reached, so segment sizes vary
//! between the target and the tolerance but sentences are never split.

use super::Segment;
use super::cleaner::clean_text;
use super::splitter::split_sentences;
use super::tokenizer::word_count;

/// Default target segment size in words.
pub const DEFAULT_TARGET_WORDS: usize = 25;

/// Overshoot tolerance relative to the target word count.
const TOLERANCE: f64 = 1.4;

/// Pack sentences into segments of roughly `target_words` words.
///
/// A non-positive target is clamped to 1. Empty input yields an empty
/// vec. Segment indices are contiguous and 0-based; each segment's
/// `word_count` equals the tokenized length of its text.
pub fn chunk_sentences(sentences: &[String], target_words: usize) -> Vec<Segment> {
    let target = target_words.max(1);
    let limit = target as f64 * TOLERANCE;

    let mut segments: Vec<Segment> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_words = 0usize;

    for sentence in sentences {
        let words = word_count(sentence);
        if words == 0 {
            continue;
        }

        // Flush first when this sentence would overshoot the tolerance.
        if !current.is_empty() && (current_words + words) as f64 > limit {
            push_segment(&mut segments, &current);
            current.clear();
            current_words = 0;
        }

        current.push(sentence);
        current_words += words;

        if current_words >= target {
            push_segment(&mut segments, &current);
            current.clear();
            current_words = 0;
        }
    }

    // Don't forget the last partial segment
    if !current.is_empty() {
        push_segment(&mut segments, &current);
    }

    segments
}

fn push_segment(segments: &mut Vec<Segment>, sentences: &[&str]) {
    let index = segments.len();
    let text = sentences.join(" ");
    segments.push(Segment::new(index, text));
}

/// Process raw text into segments: clean, split into sentences, chunk.
pub fn segment_text(text: &str, target_words: usize) -> Vec<Segment> {
    let cleaned = clean_text(text);
    if cleaned.trim().is_empty() {
        return Vec::new();
    }

    let sentences = split_sentences(&cleaned);
    chunk_sentences(&sentences, target_words)
}
