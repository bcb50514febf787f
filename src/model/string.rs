use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::{StringId, TemplateId};
use super::locale::Locale;

/// An interned piece of source text, scoped to the locale it was written in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceString {
    #[serde(default)]
    pub id: StringId,
    pub locale: Locale,
    /// Nil on rows written before hashing existed; backfilled on load.
    #[serde(default)]
    pub data_hash: Uuid,
    pub data: String,
}

/// An interned structural fragment, e.g. a rich-text skeleton with placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub id: TemplateId,
    pub uuid: Uuid,
    pub format: String,
    pub template: String,
    pub string_count: usize,
}
