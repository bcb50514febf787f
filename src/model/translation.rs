use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::{
    ContextId, LogId, ObjectId, SourceId, StringId, StringTranslationId, TranslationId,
};
use super::locale::Locale;

/// A translation-memory entry: the text of `string_id` in `locale` at `context_id`.
///
/// Outlives any single source; this is the memory itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringTranslation {
    #[serde(default)]
    pub id: StringTranslationId,
    pub string_id: StringId,
    pub locale: Locale,
    pub context_id: ContextId,
    pub data: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The live link between an object and one target locale.
///
/// Exactly one exists per (object, target locale); resubmitting the object
/// repoints `source_id` instead of creating a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    #[serde(default)]
    pub id: TranslationId,
    /// Opaque identifier handed to external systems (catalog headers).
    pub uuid: Uuid,
    pub object_id: ObjectId,
    pub target_locale: Locale,
    pub source_id: SourceId,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub source_last_updated_at: DateTime<Utc>,
    #[serde(default)]
    pub translations_last_updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub destination_last_updated_at: Option<DateTime<Utc>>,
}

fn default_enabled() -> bool {
    true
}

/// Append-only record of a localized object write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationLog {
    #[serde(default)]
    pub id: LogId,
    pub source_id: SourceId,
    pub locale: Locale,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub revision: Option<String>,
}
