//! Decoding of catalog files uploaded in whatever encoding the translator's
//! tool produced.

use std::sync::OnceLock;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use regex::bytes::Regex;
use serde::Serialize;
use tracing::debug;

use crate::error::CatalogError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub encoding: String,
    pub confidence: f32,
    /// How the encoding was picked: `bom`, `header`, `utf-8` or `guess`.
    pub method: &'static str,
}

fn charset_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)"Content-Type:[^"]*charset=([A-Za-z0-9_.:\-]+)"#)
            .expect("charset pattern is valid")
    })
}

pub fn detect(bytes: &[u8]) -> Detection {
    let (encoding, confidence, method) = pick(bytes);
    Detection {
        encoding: encoding.name().to_lowercase(),
        confidence,
        method,
    }
}

/// Decodes catalog bytes to text. Tries the BOM, then the charset declared
/// in the header entry, then UTF-8, then a statistical guess.
pub fn decode_catalog(bytes: &[u8]) -> Result<String, CatalogError> {
    let (encoding, confidence, method) = pick(bytes);
    debug!(encoding = encoding.name(), confidence, method, "decoding catalog");

    // decode() strips a matching BOM.
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(CatalogError::Undecodable {
            encoding: encoding.name().to_string(),
        });
    }
    Ok(text.into_owned())
}

fn pick(bytes: &[u8]) -> (&'static Encoding, f32, &'static str) {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return (encoding, 0.99, "bom");
    }

    if let Some(encoding) = declared_charset(bytes) {
        return (encoding, 0.95, "header");
    }

    if std::str::from_utf8(bytes).is_ok() {
        return (UTF_8, 0.90, "utf-8");
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    (encoding, estimate_confidence(bytes, encoding), "guess")
}

fn declared_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let caps = charset_re().captures(bytes)?;
    let label = caps.get(1)?.as_bytes();
    if label.eq_ignore_ascii_case(b"charset") {
        return None;
    }
    Encoding::for_label(label)
}

fn estimate_confidence(bytes: &[u8], encoding: &'static Encoding) -> f32 {
    let (text, _, had_errors) = encoding.decode(bytes);

    if had_errors {
        return 0.35;
    }

    let len = text.len();
    if len < 64 {
        0.55
    } else if len < 512 {
        0.70
    } else if len < 4096 {
        0.82
    } else {
        0.90
    }
}
