//! Language utilities for translation backend language codes
//!
//! Backends take ISO 639-1 codes, sometimes with a region subtag
//! (`zh-CN`, `pt-BR`). Users may configure 3-letter codes, which are
//! mapped down to the 2-letter form here.

use anyhow::{Result, anyhow};
use isolang::Language;

/// Source-language placeholder understood by every backend as "detect it"
pub const AUTO_DETECT: &str = "auto";

/// Map an ISO 639-2/B code to its ISO 639-2/T equivalent
fn bibliographic_to_terminology(code: &str) -> &str {
    match code {
        "fre" => "fra",
        "ger" => "deu",
        "dut" => "nld",
        "gre" => "ell",
        "chi" => "zho",
        "cze" => "ces",
        "ice" => "isl",
        "alb" => "sqi",
        "arm" => "hye",
        "baq" => "eus",
        "bur" => "mya",
        "per" => "fas",
        "geo" => "kat",
        "may" => "msa",
        "mac" => "mkd",
        "rum" => "ron",
        "slo" => "slk",
        "wel" => "cym",
        other => other,
    }
}

/// Split `zh-CN` / `pt_BR` into the language part and an optional region
fn split_region(code: &str) -> (String, Option<String>) {
    let code = code.trim();
    match code.split_once(['-', '_']) {
        Some((lang, region)) if !region.is_empty() => {
            (lang.to_lowercase(), Some(region.to_uppercase()))
        }
        _ => (code.to_lowercase(), None),
    }
}

/// Resolve the language part of a code
fn lookup(language: &str) -> Option<Language> {
    match language.len() {
        2 => Language::from_639_1(language),
        3 => Language::from_639_3(bibliographic_to_terminology(language)),
        _ => None,
    }
}

/// Normalize a user-supplied code into the form backends expect.
///
/// `eng` becomes `en`, `zh_cn` becomes `zh-CN`. Languages without a 2-letter
/// code keep their 3-letter code.
pub fn to_backend_code(code: &str) -> Result<String> {
    let (language, region) = split_region(code);
    let lang = lookup(&language).ok_or_else(|| anyhow!("Invalid language code: {}", code))?;

    let base = lang
        .to_639_1()
        .map(|c| c.to_string())
        .unwrap_or_else(|| lang.to_639_3().to_string());

    Ok(match region {
        Some(region) => format!("{}-{}", base, region),
        None => base,
    })
}

/// Normalize a source-language code, which may also be `auto`
pub fn to_backend_source_code(code: &str) -> Result<String> {
    if code.trim().eq_ignore_ascii_case(AUTO_DETECT) {
        return Ok(AUTO_DETECT.to_string());
    }
    to_backend_code(code)
}

/// Check if two language codes represent the same language (region ignored)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    let (a, _) = split_region(code1);
    let (b, _) = split_region(code2);
    match (lookup(&a), lookup(&b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let (language, _) = split_region(code);
    let lang = lookup(&language)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;
    Ok(lang.to_name().to_string())
}
