//! Language utilities for descriptors, detection parsing and the script heuristic
//!
//! Each provider carries an ordered table of supported languages. Remote
//! detection answers are free text, so they are reduced to an ISO 639-1 code
//! before being matched against that table.

use isolang::Language;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Sentinel code meaning "detect" on input and "unknown" on output
pub const AUTO_CODE: &str = "auto";

/// A language as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageDescriptor {
    /// ISO 639-1 code, or `auto`
    pub code: String,
    /// English name
    pub name: String,
    /// Name in the language itself
    pub native_name: String,
}

impl LanguageDescriptor {
    pub fn new(code: impl Into<String>, name: impl Into<String>, native_name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            native_name: native_name.into(),
        }
    }

    /// The auto-detect / unknown sentinel
    pub fn auto() -> Self {
        Self::new(AUTO_CODE, "Auto-detect", "Auto")
    }

    /// Descriptor for a code missing from the supported table
    pub fn stub(code: &str) -> Self {
        Self::new(code, code, code)
    }

    pub fn is_auto(&self) -> bool {
        self.code == AUTO_CODE
    }
}

static DEFAULT_LANGUAGES: Lazy<Vec<LanguageDescriptor>> = Lazy::new(|| {
    [
        ("en", "English", "English"),
        ("tr", "Turkish", "Türkçe"),
        ("de", "German", "Deutsch"),
        ("fr", "French", "Français"),
        ("es", "Spanish", "Español"),
        ("it", "Italian", "Italiano"),
        ("pt", "Portuguese", "Português"),
        ("ru", "Russian", "Русский"),
        ("zh", "Chinese", "中文"),
        ("ja", "Japanese", "日本語"),
        ("ko", "Korean", "한국어"),
        ("ar", "Arabic", "العربية"),
        ("hi", "Hindi", "हिन्दी"),
        ("nl", "Dutch", "Nederlands"),
        ("pl", "Polish", "Polski"),
        ("sv", "Swedish", "Svenska"),
        ("da", "Danish", "Dansk"),
        ("no", "Norwegian", "Norsk"),
        ("fi", "Finnish", "Suomi"),
        ("el", "Greek", "Ελληνικά"),
        ("he", "Hebrew", "עברית"),
        ("th", "Thai", "ไทย"),
        ("vi", "Vietnamese", "Tiếng Việt"),
        ("id", "Indonesian", "Bahasa Indonesia"),
        ("uk", "Ukrainian", "Українська"),
        ("cs", "Czech", "Čeština"),
        ("ro", "Romanian", "Română"),
        ("hu", "Hungarian", "Magyar"),
        ("fa", "Persian", "فارسی"),
        ("bg", "Bulgarian", "Български"),
    ]
    .into_iter()
    .map(|(code, name, native)| LanguageDescriptor::new(code, name, native))
    .collect()
});

/// The supported-language table every provider starts from
pub fn default_languages() -> Vec<LanguageDescriptor> {
    DEFAULT_LANGUAGES.clone()
}

/// Find a language by code in a table (case-insensitive, region suffix ignored)
pub fn find_language<'a>(table: &'a [LanguageDescriptor], code: &str) -> Option<&'a LanguageDescriptor> {
    let base = base_code(code);
    table.iter().find(|lang| lang.code.eq_ignore_ascii_case(&base))
}

/// Resolve a code against a table, falling back to a stub descriptor
pub fn resolve_language(table: &[LanguageDescriptor], code: &str) -> LanguageDescriptor {
    if code.trim().eq_ignore_ascii_case(AUTO_CODE) {
        return LanguageDescriptor::auto();
    }
    find_language(table, code)
        .cloned()
        .unwrap_or_else(|| LanguageDescriptor::stub(code.trim()))
}

/// Strip a region suffix (`zh-CN`, `pt_BR`) and lowercase
fn base_code(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Normalize a code or English language name to ISO 639-1
///
/// Accepts 2-letter codes, ISO 639-2/B and 639-3 codes, and English names.
pub fn normalize_to_part1(token: &str) -> Option<String> {
    let normalized = base_code(token);

    match normalized.len() {
        0 | 1 => None,
        2 => Language::from_639_1(&normalized).map(|_| normalized),
        3 => {
            let part2t = match normalized.as_str() {
                "fre" => "fra",
                "ger" => "deu",
                "dut" => "nld",
                "gre" => "ell",
                "chi" => "zho",
                "cze" => "ces",
                "per" => "fas",
                "rum" => "ron",
                other => other,
            };
            Language::from_639_3(part2t)
                .and_then(|lang| lang.to_639_1())
                .map(str::to_string)
        }
        _ => {
            let mut chars = normalized.chars();
            let capitalized = match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => return None,
            };
            Language::from_name(&capitalized)
                .and_then(|lang| lang.to_639_1())
                .map(str::to_string)
        }
    }
}

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z]+(?:[-_][A-Za-z]+)?").expect("valid token pattern"));

/// Extract a supported language from a free-text detection answer
///
/// Tokens are tried in order; the first that normalizes to a code present in
/// the table wins. Anything else yields the `auto` sentinel.
pub fn parse_detected_language(response: &str, table: &[LanguageDescriptor]) -> LanguageDescriptor {
    TOKEN_PATTERN
        .find_iter(response)
        .filter_map(|token| normalize_to_part1(token.as_str()))
        .find_map(|code| find_language(table, &code).cloned())
        .unwrap_or_else(LanguageDescriptor::auto)
}

/// Script checks applied in order by the offline heuristic
static SCRIPT_RULES: &[(&str, fn(char) -> bool)] = &[
    ("tr", |c| matches!(c, 'ğ' | 'Ğ' | 'ş' | 'Ş' | 'ı' | 'İ')),
    ("ru", |c| ('\u{0400}'..='\u{04FF}').contains(&c)),
    ("ja", |c| ('\u{3040}'..='\u{30FF}').contains(&c)),
    ("zh", |c| ('\u{4E00}'..='\u{9FFF}').contains(&c)),
    ("ko", |c| ('\u{AC00}'..='\u{D7AF}').contains(&c) || ('\u{1100}'..='\u{11FF}').contains(&c)),
    ("ar", |c| ('\u{0600}'..='\u{06FF}').contains(&c)),
    ("hi", |c| ('\u{0900}'..='\u{097F}').contains(&c)),
    ("th", |c| ('\u{0E00}'..='\u{0E7F}').contains(&c)),
    ("el", |c| ('\u{0370}'..='\u{03FF}').contains(&c)),
    ("he", |c| ('\u{0590}'..='\u{05FF}').contains(&c)),
    ("en", |c| c.is_ascii_alphabetic()),
];

/// Guess the language code from the characters used; `auto` when nothing matches
pub fn detect_by_script(text: &str) -> &'static str {
    SCRIPT_RULES
        .iter()
        .find(|(_, matches)| text.chars().any(matches))
        .map(|(code, _)| *code)
        .unwrap_or(AUTO_CODE)
}

/// Offline detection resolved against a table; never fails
pub fn fallback_detect(text: &str, table: &[LanguageDescriptor]) -> LanguageDescriptor {
    resolve_language(table, detect_by_script(text))
}
