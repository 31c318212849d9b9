/*!
 * ISO 639 language code handling.
 *
 * The target language enters the pipeline twice: its code is mixed into every
 * chunk hash and its English name is written into the prompts. Codes are
 * normalized first so that `fr`, `fra` and `fre` share cache entries.
 */

use anyhow::{anyhow, Result};
use isolang::Language;

/// ISO 639-2/B codes that differ from their ISO 639-2/T counterpart
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("dut", "nld"),
    ("fre", "fra"),
    ("geo", "kat"),
    ("ger", "deu"),
    ("gre", "ell"),
    ("ice", "isl"),
    ("mac", "mkd"),
    ("may", "msa"),
    ("per", "fas"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Resolve a 2- or 3-letter code, case and surrounding spaces ignored
pub fn parse_language(code: &str) -> Result<Language> {
    let code = code.trim().to_lowercase();
    let language = match code.len() {
        2 => Language::from_639_1(&code),
        3 => {
            let terminology = BIBLIOGRAPHIC_CODES
                .iter()
                .find(|(bibliographic, _)| *bibliographic == code)
                .map_or(code.as_str(), |(_, terminology)| terminology);
            Language::from_639_3(terminology)
        }
        _ => None,
    };
    language.ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<()> {
    parse_language(code).map(|_| ())
}

/// Canonical form of a code: ISO 639-1 when it exists, ISO 639-3 otherwise
pub fn normalize_language_code(code: &str) -> Result<String> {
    let language = parse_language(code)?;
    Ok(language
        .to_639_1()
        .map_or_else(|| language.to_639_3().to_string(), |part1| part1.to_string()))
}

/// Check if two language codes represent the same language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (parse_language(code1), parse_language(code2)) {
        (Ok(first), Ok(second)) => first == second,
        _ => false,
    }
}

/// English name of the language, as used in prompts
pub fn get_language_name(code: &str) -> Result<String> {
    Ok(parse_language(code)?.to_name().to_string())
}
