use std::io;

use uuid::Uuid;

use crate::model::ids::{SegmentId, TranslationId};
use crate::model::locale::Locale;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated on {table}")]
    UniqueViolation { table: &'static str },

    #[error("{table} row {id} not found")]
    NotFound { table: &'static str, id: u64 },

    #[error("data integrity: {0}")]
    Integrity(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure reported by a [`crate::host::ContentHost`] implementation.
#[derive(Debug, thiserror::Error)]
#[error("host error: {0}")]
pub struct HostError(pub String);

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("catalog bytes are not valid {encoding}")]
    Undecodable { encoding: String },

    #[error("catalog has no X-Localize-TranslationID header")]
    MissingTranslationId,

    #[error("invalid translation id {0:?}")]
    InvalidTranslationId(String),
}

#[derive(Debug, thiserror::Error)]
#[error("invalid locale code {0:?}")]
pub struct InvalidLocale(pub String);

#[derive(Debug, thiserror::Error)]
pub enum LocalizeError {
    #[error("the object this source was taken from no longer exists")]
    SourceDeleted,

    #[error("cannot save a draft of {content_type}: it has no draft lifecycle")]
    CannotSaveDraft { content_type: String },

    #[error("segment {segment} has no translation into {locale}")]
    MissingTranslation { segment: SegmentId, locale: Locale },

    #[error("segment {segment} references object {object} which has no {locale} instance yet")]
    MissingRelatedObject {
        segment: SegmentId,
        locale: Locale,
        object: Uuid,
    },

    #[error("no translation record {0}")]
    UnknownTranslation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Locale(#[from] InvalidLocale),
}

impl LocalizeError {
    pub fn unknown_translation(id: TranslationId) -> Self {
        Self::UnknownTranslation(id.to_string())
    }
}

pub type Result<T, E = LocalizeError> = std::result::Result<T, E>;
