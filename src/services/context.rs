//! Context registry and the context key carried in catalog `msgctxt` fields.
//!
//! A key is `"<translation key>:<path>"`. The translation key is always a
//! hyphenated UUID, i.e. exactly 36 characters, so the key is split at that
//! fixed offset and the path may itself contain `:`.

use tracing::debug;
use uuid::Uuid;

use super::hash;
use crate::error::StoreError;
use crate::model::{ObjectId, TranslationContext};
use crate::store::Database;

const UUID_LEN: usize = 36;

pub fn get_or_create_context(
    db: &mut Database,
    object_id: ObjectId,
    path: &str,
) -> Result<TranslationContext, StoreError> {
    let (row, created) = db.contexts.get_or_insert(TranslationContext {
        id: Default::default(),
        object_id,
        path_id: hash::path_hash(path),
        path: path.to_string(),
    })?;

    if !created && row.path != path {
        return Err(StoreError::Integrity(format!(
            "path hash collision: {:?} vs {:?}",
            row.path, path
        )));
    }
    if created {
        debug!(id = %row.id, object = %object_id, path, "registered context");
    }

    Ok(row)
}

pub fn find_context<'a>(db: &'a Database, object_id: ObjectId, path: &str) -> Option<&'a TranslationContext> {
    db.contexts.find(&(object_id, hash::path_hash(path)))
}

pub fn encode_key(translation_key: Uuid, path: &str) -> String {
    format!("{}:{}", translation_key.hyphenated(), path)
}

/// Splits a context key into its translation key and path.
pub fn decode_key(key: &str) -> Option<(Uuid, &str)> {
    let head = key.get(..UUID_LEN)?;
    let path = key.get(UUID_LEN..)?.strip_prefix(':')?;
    let translation_key = Uuid::try_parse(head).ok()?;
    Some((translation_key, path))
}

pub fn context_key(db: &Database, context: &TranslationContext) -> Result<String, StoreError> {
    let object = db.objects.require(context.object_id)?;
    Ok(encode_key(object.translation_key, &context.path))
}

/// Resolves a context key to a context of `object_id`. Keys naming another
/// object's translation key do not resolve.
pub fn from_key<'a>(db: &'a Database, object_id: ObjectId, key: &str) -> Option<&'a TranslationContext> {
    let (translation_key, path) = decode_key(key)?;
    let object = db.objects.get(object_id)?;
    if object.translation_key != translation_key {
        return None;
    }
    find_context(db, object.id, path)
}
