use std::collections::HashSet;

use chrono::Utc;
use indexmap::IndexMap;
use uuid::Uuid;

use super::{Catalog, CatalogEntry, TRANSLATION_ID_HEADER};
use crate::error::{Result, StoreError};
use crate::model::{SourceId, TranslationId};
use crate::services::{context, memory, segments, translations};
use crate::store::Database;

fn metadata(request_id: Option<Uuid>) -> IndexMap<String, String> {
    let mut meta = IndexMap::new();
    meta.insert(
        "POT-Creation-Date".to_string(),
        Utc::now().format("%Y-%m-%d %H:%M%z").to_string(),
    );
    meta.insert("MIME-Version".to_string(), "1.0".to_string());
    meta.insert(
        "Content-Type".to_string(),
        "text/plain; charset=utf-8".to_string(),
    );
    if let Some(id) = request_id {
        meta.insert(TRANSLATION_ID_HEADER.to_string(), id.to_string());
    }
    meta
}

/// Untranslated catalog of a source: one entry per distinct text.
///
/// When a text appears at several contexts the entry carries the context of
/// its last occurrence, while keeping the position of its first.
pub fn export_source_catalog(
    db: &Database,
    source_id: SourceId,
    request_id: Option<Uuid>,
) -> Result<Catalog, StoreError> {
    let source = db.sources.require(source_id)?;
    let object = db.objects.require(source.object_id)?;

    let mut messages: IndexMap<&str, String> = IndexMap::new();
    for (seg, string_id, _) in segments::string_segments(db, source_id) {
        let text = db.strings.require(string_id)?.data.as_str();
        let path = &db.contexts.require(seg.context_id)?.path;
        messages.insert(text, context::encode_key(object.translation_key, path));
    }

    Ok(Catalog {
        metadata: metadata(request_id),
        entries: messages
            .into_iter()
            .map(|(text, key)| CatalogEntry::new(key, text, ""))
            .collect(),
    })
}

/// Catalog of a translation with the memory's current text, followed by
/// obsolete entries for remembered translations whose string and context no
/// longer meet in the current source.
pub fn export_translation_catalog(db: &Database, id: TranslationId) -> Result<Catalog> {
    let translation = translations::require(db, id)?;
    let locale = &translation.target_locale;
    let object = db.objects.require(translation.object_id)?;

    let mut entries: IndexMap<(String, String), String> = IndexMap::new();
    let mut current = HashSet::new();

    for (seg, string_id, _) in segments::string_segments(db, translation.source_id) {
        current.insert((string_id, seg.context_id));
        let text = db.strings.require(string_id)?.data.clone();
        let key = context::encode_key(
            object.translation_key,
            &db.contexts.require(seg.context_id)?.path,
        );
        let msgstr = memory::lookup(db, string_id, locale, seg.context_id)
            .map(|t| t.data.clone())
            .unwrap_or_default();
        entries.insert((key, text), msgstr);
    }

    let mut catalog = Catalog {
        metadata: metadata(Some(translation.uuid)),
        entries: entries
            .into_iter()
            .map(|((key, text), msgstr)| CatalogEntry::new(key, text, msgstr))
            .collect(),
    };

    for row in memory::entries_for_object(db, object.id, locale) {
        if current.contains(&(row.string_id, row.context_id)) {
            continue;
        }
        let text = &db.strings.require(row.string_id)?.data;
        let key = context::encode_key(
            object.translation_key,
            &db.contexts.require(row.context_id)?.path,
        );
        catalog
            .entries
            .push(CatalogEntry::new(key, text.as_str(), row.data.as_str()).obsolete());
    }

    Ok(catalog)
}
