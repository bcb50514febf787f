//! Catalog interchange: gettext PO files carrying one translation's strings.

pub mod export;
pub mod import;
pub mod po;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CatalogError;

pub use export::{export_source_catalog, export_translation_catalog};
pub use import::{import_catalog, import_file, FileImport, ImportReport, ImportWarning};

/// Header naming the translation a catalog was exported for.
pub const TRANSLATION_ID_HEADER: &str = "X-Localize-TranslationID";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub metadata: IndexMap<String, String>,
    pub entries: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub msgctxt: Option<String>,
    pub msgid: String,
    pub msgstr: String,
    /// Kept for reference only; not part of the current source.
    #[serde(default)]
    pub obsolete: bool,
}

impl CatalogEntry {
    pub fn new(msgctxt: impl Into<String>, msgid: impl Into<String>, msgstr: impl Into<String>) -> Self {
        Self {
            msgctxt: Some(msgctxt.into()),
            msgid: msgid.into(),
            msgstr: msgstr.into(),
            obsolete: false,
        }
    }

    pub fn obsolete(mut self) -> Self {
        self.obsolete = true;
        self
    }
}

impl Catalog {
    /// The translation id from the header. `None` when there is no header,
    /// an error when it is not a UUID.
    pub fn translation_id(&self) -> Result<Option<Uuid>, CatalogError> {
        match self.metadata.get(TRANSLATION_ID_HEADER) {
            None => Ok(None),
            Some(raw) => Uuid::try_parse(raw.trim())
                .map(Some)
                .map_err(|_| CatalogError::InvalidTranslationId(raw.clone())),
        }
    }

    pub fn active(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(|e| !e.obsolete)
    }

    pub fn obsolete(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(|e| e.obsolete)
    }
}
