use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use super::{po, Catalog};
use crate::error::{CatalogError, LocalizeError, Result};
use crate::host::ContentHost;
use crate::model::TranslationId;
use crate::services::memory::{self, RecordOutcome};
use crate::services::{assemble, context, encoding, interner, segments, staging, translations};
use crate::store::{Database, Store};

/// A catalog entry that was not applied. `index` is the entry's position in
/// the file, header excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportWarning {
    UnknownString {
        index: usize,
        msgid: String,
    },
    UnknownContext {
        index: usize,
        msgctxt: String,
    },
    StringNotUsedInContext {
        index: usize,
        msgid: String,
        msgctxt: String,
    },
}

impl ImportWarning {
    pub fn index(&self) -> usize {
        match self {
            ImportWarning::UnknownString { index, .. }
            | ImportWarning::UnknownContext { index, .. }
            | ImportWarning::StringNotUsedInContext { index, .. } => *index,
        }
    }
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportWarning::UnknownString { index, msgid } => {
                write!(f, "entry {index}: unknown string {msgid:?}")
            }
            ImportWarning::UnknownContext { index, msgctxt } => {
                write!(f, "entry {index}: unknown context {msgctxt:?}")
            }
            ImportWarning::StringNotUsedInContext {
                index,
                msgid,
                msgctxt,
            } => write!(f, "entry {index}: string {msgid:?} is not used in {msgctxt:?}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// False when the catalog was addressed to another translation.
    pub applied: bool,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Entries with an empty translation.
    pub skipped: usize,
    pub deleted: usize,
    pub warnings: Vec<ImportWarning>,
}

impl ImportReport {
    pub fn changed(&self) -> bool {
        self.created + self.updated + self.deleted > 0
    }
}

/// Applies `catalog` to the memory of translation `id`.
///
/// A catalog whose translation id header names another translation is
/// ignored. With `delete_unseen`, memory rows of this object and locale that
/// no entry matched are removed.
pub fn import_catalog(
    db: &mut Database,
    id: TranslationId,
    catalog: &Catalog,
    delete_unseen: bool,
) -> Result<ImportReport> {
    let translation = translations::require(db, id)?.clone();
    let mut report = ImportReport::default();

    match catalog.translation_id() {
        Ok(Some(uuid)) if uuid != translation.uuid => {
            info!(translation = %id, catalog = %uuid, "catalog is for another translation, ignoring");
            return Ok(report);
        }
        Err(e) => {
            warn!(translation = %id, error = %e, "catalog translation id unreadable, ignoring");
            return Ok(report);
        }
        Ok(_) => {}
    }

    let source = db.sources.require(translation.source_id)?.clone();
    let locale = &translation.target_locale;
    let mut seen = HashSet::new();

    for (index, entry) in catalog.entries.iter().enumerate() {
        if entry.msgstr.is_empty() {
            report.skipped += 1;
            continue;
        }

        let Some(string_id) = interner::find_string(db, &source.locale, &entry.msgid).map(|s| s.id)
        else {
            report.warnings.push(ImportWarning::UnknownString {
                index,
                msgid: entry.msgid.clone(),
            });
            continue;
        };

        let msgctxt = entry.msgctxt.clone().unwrap_or_default();
        let Some(context_id) =
            context::from_key(db, translation.object_id, &msgctxt).map(|c| c.id)
        else {
            report
                .warnings
                .push(ImportWarning::UnknownContext { index, msgctxt });
            continue;
        };

        if !segments::string_used_in_context(db, string_id, context_id) {
            report.warnings.push(ImportWarning::StringNotUsedInContext {
                index,
                msgid: entry.msgid.clone(),
                msgctxt,
            });
            continue;
        }

        let (row, outcome) = memory::record(db, string_id, locale, context_id, &entry.msgstr)?;
        seen.insert(row.id);
        match outcome {
            RecordOutcome::Created => report.created += 1,
            RecordOutcome::Updated => report.updated += 1,
            RecordOutcome::Unchanged => report.unchanged += 1,
        }
    }

    if delete_unseen {
        let stale: Vec<_> = memory::entries_for_object(db, translation.object_id, locale)
            .filter(|row| !seen.contains(&row.id))
            .map(|row| row.id)
            .collect();
        for row in stale {
            db.string_translations.delete(row);
            report.deleted += 1;
        }
    }

    report.applied = true;
    if report.changed() {
        translations::touch_translations(db, id)?;
    }

    for w in &report.warnings {
        warn!(translation = %id, index = w.index(), "{w}");
    }
    info!(
        translation = %id,
        created = report.created,
        updated = report.updated,
        unchanged = report.unchanged,
        deleted = report.deleted,
        warnings = report.warnings.len(),
        "imported catalog"
    );

    Ok(report)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileImport {
    pub translation_id: TranslationId,
    pub report: ImportReport,
    /// Whether the localized object was rewritten.
    pub saved: bool,
    /// Why the localized object was left for later, if it was.
    pub deferred: Option<String>,
}

/// Imports an uploaded catalog file into the translation named by its
/// header, then brings the localized object up to date.
pub fn import_file<H: ContentHost>(
    store: &Store,
    host: &mut H,
    bytes: &[u8],
    delete_unseen: bool,
) -> Result<FileImport> {
    let text = encoding::decode_catalog(bytes)?;
    let catalog = po::parse(&text)?;
    let uuid = catalog
        .translation_id()?
        .ok_or(CatalogError::MissingTranslationId)?;

    staging::atomic(store, host, |db, host| {
        let id = translations::find_by_uuid(db, uuid)
            .map(|t| t.id)
            .ok_or_else(|| LocalizeError::UnknownTranslation(uuid.to_string()))?;

        let report = import_catalog(db, id, &catalog, delete_unseen)?;
        let mut out = FileImport {
            translation_id: id,
            report,
            saved: false,
            deferred: None,
        };
        if !out.report.changed() {
            return Ok(out);
        }

        match staging::savepoint(db, host, |db, host| {
            assemble::save_target_in(db, host, id, true)
        }) {
            Ok(_) => out.saved = true,
            Err(e @ LocalizeError::MissingRelatedObject { .. }) => {
                warn!(translation = %id, error = %e, "imported, localized object deferred");
                out.deferred = Some(e.to_string());
            }
            Err(e) => return Err(e),
        }
        Ok(out)
    })
}
