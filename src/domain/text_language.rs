//! Language detection for text that has already been extracted.
//!
//! Detection walks a fixed, ordered list of Unicode blocks and returns the code of
//! the first block present anywhere in the text. The order is the tie-break: a
//! string with both Devanagari and Latin letters is reported as Hindi because the
//! Devanagari check runs first. Latin-script languages are told apart by a small
//! set of diacritics, again in a fixed priority order.

/// Code returned when no rule matches.
pub const DEFAULT_LANGUAGE_CODE: &str = "en";

/// Ordered Unicode block rules. Each entry is a language code and the inclusive
/// code point ranges that identify it.
const SCRIPT_RULES: &[(&str, &[(char, char)])] = &[
    ("hi", &[('\u{0900}', '\u{097F}')]), // Devanagari
    ("ta", &[('\u{0B80}', '\u{0BFF}')]), // Tamil
    ("te", &[('\u{0C00}', '\u{0C7F}')]), // Telugu
    ("kn", &[('\u{0C80}', '\u{0CFF}')]), // Kannada
    ("ml", &[('\u{0D00}', '\u{0D7F}')]), // Malayalam
    ("gu", &[('\u{0A80}', '\u{0AFF}')]), // Gujarati
    ("bn", &[('\u{0980}', '\u{09FF}')]), // Bengali
    ("pa", &[('\u{0A00}', '\u{0A7F}')]), // Gurmukhi
    ("or", &[('\u{0B00}', '\u{0B7F}')]), // Oriya
    ("ar", &[('\u{0600}', '\u{06FF}')]), // Arabic
    ("zh", &[('\u{4E00}', '\u{9FFF}')]), // Han
    ("ja", &[('\u{3040}', '\u{309F}'), ('\u{30A0}', '\u{30FF}')]), // Hiragana, Katakana
    ("ko", &[('\u{AC00}', '\u{D7AF}')]), // Hangul syllables
    ("th", &[('\u{0E00}', '\u{0E7F}')]), // Thai
    ("ru", &[('\u{0400}', '\u{04FF}')]), // Cyrillic
];

/// Ordered diacritic rules for Latin-script languages, matched case-insensitively.
const DIACRITIC_RULES: &[(&str, &str)] = &[
    ("es", "áéíóúñ¿¡"),
    ("fr", "àâçéèêëîïôûùüÿœæ"),
    ("de", "äöüß"),
    ("it", "àèéìíîòóùú"),
    ("pt", "ãõçâêôáéíóú"),
];

/// Returns the UI language code for `text`.
///
/// Empty or whitespace-only input, and text matching no rule, yield `"en"`.
///
/// # Example
///
/// ```
/// use lipi::domain::detect_language_code;
///
/// assert_eq!(detect_language_code("नमस्ते hello"), "hi");
/// assert_eq!(detect_language_code("¿Dónde está?"), "es");
/// assert_eq!(detect_language_code("   "), "en");
/// ```
pub fn detect_language_code(text: &str) -> &'static str {
    if text.trim().is_empty() {
        return DEFAULT_LANGUAGE_CODE;
    }

    for &(code, ranges) in SCRIPT_RULES {
        if text
            .chars()
            .any(|c| ranges.iter().any(|(lo, hi)| (*lo..=*hi).contains(&c)))
        {
            return code;
        }
    }

    for &(code, marks) in DIACRITIC_RULES {
        if text
            .chars()
            .flat_map(char::to_lowercase)
            .any(|c| marks.contains(c))
        {
            return code;
        }
    }

    DEFAULT_LANGUAGE_CODE
}
