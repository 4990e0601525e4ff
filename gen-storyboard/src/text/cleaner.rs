//! Text cleaning ahead of sentence splitting.

/// Invisible characters that break tokenization and their replacements.
const PROBLEMATIC_CHARS: &[(char, &str)] = &[
    ('\u{00a0}', " "), // Non-breaking space
    ('\u{2000}', " "), // En quad
    ('\u{2001}', " "), // Em quad
    ('\u{2002}', " "), // En space
    ('\u{2003}', " "), // Em space
    ('\u{2009}', " "), // Thin space
    ('\u{202f}', " "), // Narrow no-break space
    ('\u{3000}', " "), // Ideographic space
    ('\u{200b}', ""),  // Zero-width space
    ('\u{200c}', ""),  // Zero-width non-joiner
    ('\u{200d}', ""),  // Zero-width joiner
    ('\u{feff}', ""),  // BOM
];

/// Clean text for segmentation.
///
/// Replaces exotic space characters with ASCII spaces, strips zero-width
/// characters and control characters (keeping newlines and tabs).
/// Sentence-terminal punctuation is left untouched: the splitter treats
/// `…` and punctuation runs as significant.
pub fn clean_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for c in text.chars() {
        let replacement = PROBLEMATIC_CHARS
            .iter()
            .find(|(ch, _)| *ch == c)
            .map(|(_, r)| *r);

        if let Some(r) = replacement {
            result.push_str(r);
        } else if is_allowed_char(c) {
            result.push(c);
        }
        // Skip disallowed characters (control chars except newline/tab)
    }

    result
}

/// Check if a character may pass through cleaning.
fn is_allowed_char(c: char) -> bool {
    if c == '\n' || c == '\t' {
        return true;
    }

    !c.is_control()
}
