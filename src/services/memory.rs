//! Translation memory: translated text per (string, locale, context).

use std::fmt;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use super::segments;
use crate::error::StoreError;
use crate::model::{ContextId, Locale, ObjectId, SourceId, StringId, StringTranslation};
use crate::store::Database;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Get-or-create the memory entry; an existing entry is only touched when the
/// text differs.
pub fn record(
    db: &mut Database,
    string_id: StringId,
    locale: &Locale,
    context_id: ContextId,
    text: &str,
) -> Result<(StringTranslation, RecordOutcome), StoreError> {
    let now = Utc::now();
    let (mut row, created) = db.string_translations.get_or_insert(StringTranslation {
        id: Default::default(),
        string_id,
        locale: locale.clone(),
        context_id,
        data: text.to_string(),
        created_at: now,
        updated_at: now,
    })?;

    if created {
        debug!(id = %row.id, string = %string_id, %locale, "recorded translation");
        return Ok((row, RecordOutcome::Created));
    }
    if row.data == text {
        return Ok((row, RecordOutcome::Unchanged));
    }

    row.data = text.to_string();
    row.updated_at = now;
    db.string_translations.update(row.clone())?;
    debug!(id = %row.id, string = %string_id, %locale, "updated translation");
    Ok((row, RecordOutcome::Updated))
}

pub fn lookup<'a>(
    db: &'a Database,
    string_id: StringId,
    locale: &Locale,
    context_id: ContextId,
) -> Option<&'a StringTranslation> {
    db.string_translations
        .find(&(locale.clone(), string_id, context_id))
}

/// Memory entries in `locale` reachable from the contexts of `object_id`.
pub fn entries_for_object<'a>(
    db: &'a Database,
    object_id: ObjectId,
    locale: &'a Locale,
) -> impl Iterator<Item = &'a StringTranslation> + 'a {
    db.string_translations.iter().filter(move |t| {
        &t.locale == locale
            && db
                .contexts
                .get(t.context_id)
                .is_some_and(|c| c.object_id == object_id)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub total: usize,
    pub translated: usize,
}

impl Progress {
    pub fn status(&self) -> TranslationStatus {
        if self.total == self.translated {
            TranslationStatus::UpToDate
        } else {
            TranslationStatus::WaitingForTranslations
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationStatus {
    UpToDate,
    WaitingForTranslations,
}

impl fmt::Display for TranslationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationStatus::UpToDate => f.write_str("Up to date"),
            TranslationStatus::WaitingForTranslations => f.write_str("Waiting for translations"),
        }
    }
}

/// Counts string segments of `source_id` and how many have a memory entry in
/// `locale`.
///
/// Template and related-object segments are not counted; only leaf strings
/// gate the progress shown to users.
pub fn progress(db: &Database, source_id: SourceId, locale: &Locale) -> Progress {
    let strings = segments::string_segments(db, source_id);
    let translated = strings
        .iter()
        .filter(|(seg, string_id, _)| lookup(db, *string_id, locale, seg.context_id).is_some())
        .count();

    Progress {
        total: strings.len(),
        translated,
    }
}
