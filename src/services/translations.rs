use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::memory::{self, Progress};
use crate::error::{LocalizeError, Result, StoreError};
use crate::host::ContentHost;
use crate::model::{Locale, ObjectId, SourceId, Translation, TranslationId, TranslationLog};
use crate::store::Database;

/// Get-or-create the translation of `object_id` into `target_locale`.
///
/// A new record points at `source_id`. An existing one is repointed when it
/// tracks an older source. Returns the record and whether it was created.
pub fn get_or_create_translation(
    db: &mut Database,
    object_id: ObjectId,
    target_locale: &Locale,
    source_id: SourceId,
) -> Result<(Translation, bool), StoreError> {
    let now = Utc::now();
    let (mut row, created) = db.translations.get_or_insert(Translation {
        id: Default::default(),
        uuid: Uuid::new_v4(),
        object_id,
        target_locale: target_locale.clone(),
        source_id,
        enabled: true,
        created_at: now,
        source_last_updated_at: now,
        translations_last_updated_at: None,
        destination_last_updated_at: None,
    })?;

    if created {
        debug!(id = %row.id, uuid = %row.uuid, locale = %target_locale, "created translation");
    } else if row.source_id != source_id {
        debug!(id = %row.id, from = %row.source_id, to = %source_id, "repointed translation");
        row.source_id = source_id;
        row.source_last_updated_at = now;
        db.translations.update(row.clone())?;
    }

    Ok((row, created))
}

pub fn require(db: &Database, id: TranslationId) -> Result<&Translation> {
    db.translations
        .get(id)
        .ok_or_else(|| LocalizeError::unknown_translation(id))
}

pub fn find_by_uuid(db: &Database, uuid: Uuid) -> Option<&Translation> {
    db.translations.iter().find(|t| t.uuid == uuid)
}

pub fn for_object(db: &Database, object_id: ObjectId) -> Vec<&Translation> {
    db.translations
        .iter()
        .filter(|t| t.object_id == object_id)
        .collect()
}

pub fn progress(db: &Database, translation: &Translation) -> Progress {
    memory::progress(db, translation.source_id, &translation.target_locale)
}

/// Marks that the memory behind `id` changed.
pub fn touch_translations(db: &mut Database, id: TranslationId) -> Result<()> {
    let mut row = require(db, id)?.clone();
    row.translations_last_updated_at = Some(Utc::now());
    db.translations.update(row)?;
    Ok(())
}

/// Marks that the localized object behind `id` was written.
pub fn touch_destination(db: &mut Database, id: TranslationId) -> Result<()> {
    let mut row = require(db, id)?.clone();
    row.destination_last_updated_at = Some(Utc::now());
    db.translations.update(row)?;
    Ok(())
}

/// Write history of the localized object, newest first.
pub fn logs_for(db: &Database, translation: &Translation) -> Vec<TranslationLog> {
    let mut logs: Vec<TranslationLog> = db
        .logs
        .iter()
        .filter(|l| {
            l.locale == translation.target_locale
                && db
                    .sources
                    .get(l.source_id)
                    .is_some_and(|s| s.object_id == translation.object_id)
        })
        .cloned()
        .collect();
    logs.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
    logs
}

/// The localized instance a log entry was written to, if it still exists.
pub fn logged_instance<H: ContentHost>(
    db: &Database,
    host: &H,
    log: &TranslationLog,
) -> Result<Option<H::Instance>> {
    let source = db.sources.require(log.source_id)?;
    let object = db.objects.require(source.object_id)?;
    Ok(host.get_instance(&object.key(), &log.locale))
}
