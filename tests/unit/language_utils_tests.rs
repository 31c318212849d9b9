/*!
 * Tests for language code utilities
 */

use chunkwise::language_utils::{get_language_name, language_codes_match, normalize_language_code, validate_language_code};

#[test]
fn test_normalize_withBibliographicCodes_shouldShareCanonicalForm() {
    for (code, expected) in [("ger", "de"), ("chi", "zh"), ("dut", "nl"), ("en", "en"), ("spa", "es")] {
        assert_eq!(normalize_language_code(code).unwrap(), expected, "code {}", code);
    }
}

#[test]
fn test_validate_shouldAcceptTwoAndThreeLetterCodes() {
    assert!(validate_language_code("it").is_ok());
    assert!(validate_language_code("ita").is_ok());
    assert!(validate_language_code("it-IT").is_err());
}

#[test]
fn test_languageCodesMatch_acrossCodeForms() {
    assert!(language_codes_match("zh", "chi"));
    assert!(language_codes_match("EN", "eng"));
    assert!(!language_codes_match("en", "es"));
}

#[test]
fn test_getLanguageName_withThreeLetterCode_shouldResolve() {
    assert_eq!(get_language_name("spa").unwrap(), "Spanish");
    assert!(get_language_name("abcd").is_err());
}
