/*!
 * Whitespace helpers shared by the protocol and the dispatcher.
 */

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Collapse every whitespace run into a single space and trim both ends
pub fn clean_spaces(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned()
}

/// True when the text holds nothing but whitespace
pub fn is_empty(text: &str) -> bool {
    text.trim().is_empty()
}
