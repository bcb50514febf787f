use tracing::debug;

use crate::error::StoreError;
use crate::model::{ObjectKey, TranslatableObject};
use crate::store::Database;

pub fn get_or_create_object(db: &mut Database, key: &ObjectKey) -> Result<TranslatableObject, StoreError> {
    let (row, created) = db.objects.get_or_insert(TranslatableObject {
        id: Default::default(),
        content_type: key.content_type.clone(),
        translation_key: key.translation_key,
    })?;
    if created {
        debug!(id = %row.id, content_type = %row.content_type, key = %row.translation_key, "registered object");
    }
    Ok(row)
}

pub fn find_object<'a>(db: &'a Database, key: &ObjectKey) -> Option<&'a TranslatableObject> {
    db.objects.find(&(key.content_type.clone(), key.translation_key))
}
