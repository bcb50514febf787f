use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ObjectId, SourceId};
use super::locale::Locale;

pub const OBJECT_REPR_MAX_CHARS: usize = 200;

/// Immutable snapshot of an object's content in its original locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationSource {
    #[serde(default)]
    pub id: SourceId,
    pub object_id: ObjectId,
    /// Concrete content type the snapshot was taken from; may be more specific
    /// than the object's own content type.
    pub specific_content_type: String,
    pub locale: Locale,
    pub object_repr: String,
    /// Canonical JSON of the host payload.
    pub content_json: String,
    /// sha256 hex of `content_json`.
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

pub fn truncate_repr(repr: &str) -> String {
    repr.chars().take(OBJECT_REPR_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repr_is_truncated_on_char_boundary() {
        let long = "é".repeat(250);
        let out = truncate_repr(&long);
        assert_eq!(out.chars().count(), OBJECT_REPR_MAX_CHARS);
        assert_eq!(truncate_repr("Home"), "Home");
    }
}
