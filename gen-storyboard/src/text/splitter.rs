//! Abbreviation-aware sentence splitting.
//!
//! A single forward scan over whitespace-normalized text. `!`, `?` and
//! `…` always terminate a sentence; `.` terminates unless it closes a
//! known abbreviation or the text clearly continues (lowercase letter or
//! digit ahead, as in decimal numbers and mid-sentence periods).

use std::sync::OnceLock;

/// Abbreviations that should not trigger a sentence split. All entries
/// are lowercase and end with a period. Matching is case-insensitive and
/// longest-first, with a word-boundary check so entries cannot fire
/// inside an ordinary word.
const ABBREVIATIONS: &[&str] = &[
    // Titles and honorifics
    "mr.", "mrs.", "ms.", "dr.", "prof.", "rev.", "hon.", "st.", "jr.", "sr.",
    "capt.", "sgt.", "lt.", "col.", "gen.",
    // Latin and scholarly
    "e.g.", "i.e.", "etc.", "vs.", "cf.", "approx.", "vol.", "ch.", "pp.",
    "ed.", "dept.", "ph.d.", "u.s.",
    // Clock and calendar
    "a.m.", "p.m.",
    "jan.", "feb.", "mar.", "apr.", "jun.", "jul.", "aug.", "sep.", "sept.",
    "oct.", "nov.", "dec.",
    // Measurements
    "mm.", "cm.", "km.", "kg.", "mg.", "oz.", "lb.", "ft.",
];

/// Characters that close a quotation or bracketed span. The look-ahead
/// after a period skips these before judging the next significant
/// character.
const CLOSING_WRAPPERS: &[char] = &['"', '\'', ')', ']', '}', '\u{00bb}', '\u{203a}', '\u{2019}', '\u{201d}'];

static SORTED_ABBREVIATIONS: OnceLock<Vec<&'static str>> = OnceLock::new();

/// Abbreviation list sorted longest-first so a short entry never masks a
/// longer one ("g." must not shadow "e.g.").
fn abbreviations_longest_first() -> &'static [&'static str] {
    SORTED_ABBREVIATIONS.get_or_init(|| {
        let mut list = ABBREVIATIONS.to_vec();
        list.sort_by_key(|a| std::cmp::Reverse(a.len()));
        list
    })
}

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into sentences.
///
/// Empty or whitespace-only input yields an empty vec; text with no
/// terminal punctuation yields a single sentence. Joining the returned
/// sentences with single spaces reproduces the normalized input content.
pub fn split_sentences(text: &str) -> Vec<String> {
    let normalized = normalize_whitespace(text);
    if normalized.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = normalized.chars().collect();
    let mut sentences = Vec::new();
    let mut buf = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if !is_terminal(c) {
            buf.push(c);
            i += 1;
            continue;
        }

        // Consume the whole punctuation run ("...", "?!", "…") into the
        // current sentence before deciding whether to terminate.
        let run_start = i;
        while i < chars.len() && is_terminal(chars[i]) {
            buf.push(chars[i]);
            i += 1;
        }
        let run = &chars[run_start..i];
        let only_single_period = run.len() == 1 && run[0] == '.';

        if !only_single_period {
            // '!', '?', '…' or any multi-character run always terminates.
            i = consume_closing_wrappers(&chars, i, &mut buf);
            flush(&mut buf, &mut sentences);
            continue;
        }

        if ends_with_abbreviation(&buf) {
            continue;
        }

        if extends_abbreviation(&buf, chars.get(i).copied()) {
            // Inside a multi-dot abbreviation ("U.S.", "Ph.D.").
            continue;
        }

        if continues_after_period(&chars, i) {
            // Decimal number or lowercase continuation.
            continue;
        }

        i = consume_closing_wrappers(&chars, i, &mut buf);
        flush(&mut buf, &mut sentences);
    }

    flush(&mut buf, &mut sentences);
    sentences
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…')
}

/// Keep closing quotes and brackets attached to the sentence they close.
fn consume_closing_wrappers(chars: &[char], mut i: usize, buf: &mut String) -> usize {
    while i < chars.len() && CLOSING_WRAPPERS.contains(&chars[i]) {
        buf.push(chars[i]);
        i += 1;
    }
    i
}

/// Push the trimmed buffer as a sentence if it is non-empty.
fn flush(buf: &mut String, sentences: &mut Vec<String>) {
    let trimmed = buf.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    buf.clear();
}

/// Check whether the buffer (which ends with the period just consumed)
/// ends with a known abbreviation.
fn ends_with_abbreviation(buf: &str) -> bool {
    let lower = buf.to_lowercase();

    for abbr in abbreviations_longest_first() {
        if !lower.ends_with(abbr) {
            continue;
        }
        // Word boundary: the character before the abbreviation must not
        // be alphanumeric ("piano." must not match "no.").
        let boundary = lower.len() - abbr.len();
        let before = lower[..boundary].chars().next_back();
        if before.is_none_or(|c| !c.is_alphanumeric()) {
            return true;
        }
    }

    false
}

/// Check whether the trailing dotted token could still grow into a
/// listed multi-dot abbreviation. At the first period of "U.S." the
/// buffer ends with "U.", which matches no entry on its own; the
/// uppercase look-ahead would terminate there, so the full entry could
/// never be reached. Only fires when the next character follows the
/// period directly (no space), as it does inside a dotted token.
fn extends_abbreviation(buf: &str, next: Option<char>) -> bool {
    let Some(next) = next else {
        return false;
    };
    if !next.is_alphabetic() {
        return false;
    }

    let lower = buf.to_lowercase();
    let token_start = lower.rfind(char::is_whitespace).map_or(0, |p| p + 1);
    let token = &lower[token_start..];
    if token.is_empty() {
        return false;
    }

    abbreviations_longest_first()
        .iter()
        .any(|abbr| abbr.len() > token.len() && abbr.starts_with(token))
}

/// Look ahead past spaces and closing wrappers; the period is
/// non-terminal when the next significant character is a lowercase
/// letter or a digit.
fn continues_after_period(chars: &[char], from: usize) -> bool {
    for &c in &chars[from..] {
        if c == ' ' || CLOSING_WRAPPERS.contains(&c) {
            continue;
        }
        return c.is_lowercase() || c.is_numeric();
    }
    false
}
