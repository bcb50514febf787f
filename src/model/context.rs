use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::{ContextId, ObjectId};

/// A location inside an object's structure, e.g. `title` or `body.3.value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationContext {
    #[serde(default)]
    pub id: ContextId,
    pub object_id: ObjectId,
    pub path_id: Uuid,
    pub path: String,
}
