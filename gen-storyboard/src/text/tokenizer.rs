//! Whitespace tokenization shared by the splitter and chunker.

/// Split text into whitespace-delimited word tokens.
///
/// Tokens keep internal punctuation (contractions, decimals); empty
/// tokens are dropped.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Number of word tokens in a string.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
