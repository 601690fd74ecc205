/*!
 * Tests for language code utilities
 */

use article_translator::language_utils::{
    get_language_name, language_codes_match, to_backend_code, to_backend_source_code,
};

/// Codes reach the backends in their short form
#[test]
fn test_to_backend_code_withMixedFormats_shouldNormalize() {
    let cases = [
        ("en", "en"),
        ("EN", "en"),
        ("fra", "fr"),
        ("fre", "fr"),
        ("jpn", "ja"),
        (" ko ", "ko"),
        ("zh-tw", "zh-TW"),
    ];

    for (input, expected) in cases {
        assert_eq!(to_backend_code(input).unwrap(), expected, "input {:?}", input);
    }
}

/// `auto` only makes sense on the source side
#[test]
fn test_auto_detect_shouldOnlyBeAcceptedAsSource() {
    assert_eq!(to_backend_source_code("auto").unwrap(), "auto");
    assert!(to_backend_code("auto").is_err());
}

/// Region subtags do not make two codes different languages
#[test]
fn test_language_codes_match_withRegions_shouldCompareLanguageOnly() {
    assert!(language_codes_match("pt-BR", "por"));
    assert!(!language_codes_match("auto", "en"));
}

/// Names come from the ISO tables
#[test]
fn test_get_language_name_withVariousCodes_shouldReturnName() {
    assert_eq!(get_language_name("ja").unwrap(), "Japanese");
    assert_eq!(get_language_name("ger").unwrap(), "German");
    assert!(get_language_name("??").is_err());
}
