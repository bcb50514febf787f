use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::ObjectId;

/// Host-side identity of a translatable object, shared by all of its locale copies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectKey {
    pub content_type: String,
    pub translation_key: Uuid,
}

impl ObjectKey {
    pub fn new(content_type: impl Into<String>, translation_key: Uuid) -> Self {
        Self {
            content_type: content_type.into(),
            translation_key,
        }
    }
}

/// One row per distinct (content type, translation key); anchors every source,
/// context and translation of the object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatableObject {
    #[serde(default)]
    pub id: ObjectId,
    pub content_type: String,
    pub translation_key: Uuid,
}

impl TranslatableObject {
    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.content_type.clone(), self.translation_key)
    }
}
