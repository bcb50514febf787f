use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::InvalidLocale;

fn locale_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Language subtag plus optional region/script/variant subtags: en, pt-BR, zh_Hant, sr-Latn-RS
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z]{2,3}(?:[-_][A-Za-z0-9]{2,8})*$").expect("locale pattern is valid")
    })
}

/// A locale code as used by the host, e.g. `en` or `pt-BR`.
///
/// Codes are compared exactly; no case folding happens here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    pub fn parse(code: &str) -> Result<Self, InvalidLocale> {
        let code = code.trim();
        if locale_re().is_match(code) {
            Ok(Self(code.to_string()))
        } else {
            Err(InvalidLocale(code.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Locale {
    type Error = InvalidLocale;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Locale> for String {
    fn from(value: Locale) -> Self {
        value.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_codes() {
        for code in ["en", "fr", "pt-BR", "zh_Hant", "sr-Latn-RS", "fil"] {
            assert_eq!(Locale::parse(code).unwrap().as_str(), code);
        }
    }

    #[test]
    fn rejects_garbage() {
        for code in ["", "e", "english-language-long", "en BR", "../en"] {
            assert!(Locale::parse(code).is_err(), "{code} should be rejected");
        }
    }

    #[test]
    fn deserialize_validates() {
        let ok: Locale = serde_json::from_str("\"de\"").unwrap();
        assert_eq!(ok.as_str(), "de");
        assert!(serde_json::from_str::<Locale>("\"not a locale\"").is_err());
    }
}
