//! Source snapshots: the immutable, versioned content an object is translated from.

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

use super::{hash, normalize, objects, segments};
use crate::error::{LocalizeError, Result, StoreError};
use crate::host::ContentHost;
use crate::model::{ObjectId, Segment, TranslationSource};
use crate::model::source::truncate_repr;
use crate::store::Database;

/// Most recent snapshot of `object_id`, by creation time then id.
pub fn latest_source(db: &Database, object_id: ObjectId) -> Option<&TranslationSource> {
    db.sources
        .iter()
        .filter(|s| s.object_id == object_id)
        .max_by_key(|s| (s.created_at, s.id))
}

/// Snapshots `instance`, reusing the latest snapshot when its canonical
/// payload is identical. Returns the snapshot and whether it is new.
///
/// Segments are not extracted here; see [`extract_segments`].
pub fn from_instance<H: ContentHost>(
    db: &mut Database,
    host: &H,
    instance: &H::Instance,
    force: bool,
) -> Result<(TranslationSource, bool)> {
    let key = host.object_key(instance);
    let object = objects::get_or_create_object(db, &key)?;
    let locale = host.locale(instance);

    let payload = host.serialize(instance)?;
    let content_json = normalize::canonical_json(&payload);
    let content_hash = hash::content_hash(&content_json);

    if !force {
        if let Some(latest) = latest_source(db, object.id) {
            if latest.content_hash == content_hash
                && latest.content_json == content_json
                && latest.locale == locale
            {
                debug!(source = %latest.id, object = %object.id, "content unchanged, reusing source");
                return Ok((latest.clone(), false));
            }
        }
    }

    let source = db.sources.insert(TranslationSource {
        id: Default::default(),
        object_id: object.id,
        specific_content_type: host.specific_content_type(instance),
        locale,
        object_repr: truncate_repr(&host.repr(instance)),
        content_json,
        content_hash,
        created_at: Utc::now(),
    })?;

    info!(source = %source.id, object = %object.id, locale = %source.locale, "created source");
    Ok((source, true))
}

pub fn extract_segments<H: ContentHost>(
    db: &mut Database,
    host: &H,
    source: &TranslationSource,
    instance: &H::Instance,
) -> Result<Vec<Segment>> {
    let values = host.extract(instance)?;
    Ok(segments::extract_into(db, source, &values)?)
}

/// Rebuilds the instance the snapshot was taken from, with the snapshot's
/// content.
pub fn as_instance<H: ContentHost>(
    db: &Database,
    host: &H,
    source: &TranslationSource,
) -> Result<H::Instance> {
    let object = db.objects.require(source.object_id)?;
    let content: Value = serde_json::from_str(&source.content_json).map_err(StoreError::from)?;

    host.materialize(&object.key(), &source.locale, &content)?
        .ok_or(LocalizeError::SourceDeleted)
}
