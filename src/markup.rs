/*!
 * Part markup resolution.
 *
 * Scene text is authored as a single string with an optional part delimiter.
 * Before a part is displayed or sent to a synthesis provider its markup is
 * resolved: whitespace runs collapse to single spaces and surrounding
 * whitespace is trimmed, so visually identical text always produces the same
 * voice cache key.
 */

use once_cell::sync::Lazy;
use regex::Regex;

// @const: Whitespace run matcher
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalize a raw text fragment into part markup.
pub fn normalize(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned()
}

/// Split scene text into resolved part markups.
///
/// Empty segments produced by leading, trailing or doubled delimiters are
/// dropped. Every scene has at least one part: blank text yields a single
/// empty markup so the scene still occupies a display window.
pub fn split_parts(text: &str, delimiter: &str) -> Vec<String> {
    let parts: Vec<String> = text
        .split(delimiter)
        .map(normalize)
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        vec![String::new()]
    } else {
        parts
    }
}
