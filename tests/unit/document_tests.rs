/*!
 * Tests for plain-text documents
 */

use chunkwise::document::{generate_output_path, TextDocument, WriteMode};
use chunkwise::translation::Incision;

use crate::common::texts;

#[test]
fn test_fragments_shouldSkipBlankLinesAndTrim() {
    let document = TextDocument::parse("  Chapter 1  \n\n   \nIt was dark.\nIt rained.\n");
    let fragments = document.fragments();

    let fragment_texts: Vec<&str> = fragments.iter().map(|f| f.text.as_str()).collect();
    assert_eq!(fragment_texts, vec!["Chapter 1", "It was dark.", "It rained."]);
    assert_eq!(fragments[0].end_incision, Incision::Possible);
    assert_eq!(fragments[1].start_incision, Incision::Possible);
    assert_eq!(fragments[1].end_incision, Incision::Unset);
}

#[test]
fn test_render_withAppend_shouldInterleaveTranslations() {
    let document = TextDocument::parse("Hello\nworld\n");
    assert_eq!(
        document.render(&texts(&["Bonjour", "monde"]), WriteMode::Append),
        "Hello\nBonjour\nworld\nmonde\n"
    );
}

#[test]
fn test_render_withTooFewTranslations_shouldKeepRemainingSource() {
    let document = TextDocument::parse("One\n\nTwo\n");
    assert_eq!(document.render(&texts(&["Un"]), WriteMode::Replace), "Un\n\nTwo\n");
}

#[test]
fn test_generateOutputPath_withDottedName_shouldKeepExtension() {
    let path = generate_output_path("/tmp/my.book.txt", "es");
    assert_eq!(path.file_name().unwrap(), "my.book.es.txt");
}
