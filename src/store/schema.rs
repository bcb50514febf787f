use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::table::{Row, Table};
use crate::model::{
    ContextId, LogId, Locale, ObjectId, Segment, SegmentId, SegmentKind, SourceId, SourceString,
    StringId, StringTranslation, StringTranslationId, Template, TemplateId, TranslatableObject,
    Translation, TranslationContext, TranslationId, TranslationLog, TranslationSource,
};
use crate::services::hash;

/// Every table of the translation store. A transaction works on a clone of this.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub objects: Table<TranslatableObject>,
    #[serde(default)]
    pub sources: Table<TranslationSource>,
    #[serde(default)]
    pub strings: Table<SourceString>,
    #[serde(default)]
    pub templates: Table<Template>,
    #[serde(default)]
    pub contexts: Table<TranslationContext>,
    #[serde(default)]
    pub segments: Table<Segment>,
    #[serde(default)]
    pub string_translations: Table<StringTranslation>,
    #[serde(default)]
    pub translations: Table<Translation>,
    #[serde(default)]
    pub logs: Table<TranslationLog>,
}

impl Database {
    pub(crate) fn was_migrated(&self) -> bool {
        self.strings.was_migrated()
    }
}

macro_rules! row_ids {
    ($id:ty, $table:literal) => {
        const TABLE: &'static str = $table;
        type Id = $id;

        fn id(&self) -> $id {
            self.id
        }

        fn set_id(&mut self, id: $id) {
            self.id = id;
        }
    };
}

impl Row for TranslatableObject {
    row_ids!(ObjectId, "translatable_object");
    type Key = (String, Uuid);

    fn unique_key(&self) -> Self::Key {
        (self.content_type.clone(), self.translation_key)
    }
}

impl Row for TranslationSource {
    row_ids!(SourceId, "translation_source");
    type Key = SourceId;

    fn unique_key(&self) -> Self::Key {
        self.id
    }
}

impl Row for SourceString {
    row_ids!(StringId, "string");
    type Key = (Locale, Uuid);

    fn unique_key(&self) -> Self::Key {
        (self.locale.clone(), self.data_hash)
    }

    fn backfill(&mut self) -> bool {
        if self.data_hash.is_nil() {
            self.data_hash = hash::string_hash(&self.locale, &self.data);
            return true;
        }
        false
    }
}

impl Row for Template {
    row_ids!(TemplateId, "template");
    type Key = Uuid;

    fn unique_key(&self) -> Self::Key {
        self.uuid
    }
}

impl Row for TranslationContext {
    row_ids!(ContextId, "translation_context");
    type Key = (ObjectId, Uuid);

    fn unique_key(&self) -> Self::Key {
        (self.object_id, self.path_id)
    }
}

impl Row for Segment {
    row_ids!(SegmentId, "segment");
    type Key = (SourceId, ContextId, u32, SegmentKind);

    fn unique_key(&self) -> Self::Key {
        (self.source_id, self.context_id, self.order, self.kind.clone())
    }
}

impl Row for StringTranslation {
    row_ids!(StringTranslationId, "string_translation");
    type Key = (Locale, StringId, ContextId);

    fn unique_key(&self) -> Self::Key {
        (self.locale.clone(), self.string_id, self.context_id)
    }
}

impl Row for Translation {
    row_ids!(TranslationId, "translation");
    type Key = (ObjectId, Locale);

    fn unique_key(&self) -> Self::Key {
        (self.object_id, self.target_locale.clone())
    }
}

impl Row for TranslationLog {
    row_ids!(LogId, "translation_log");
    type Key = LogId;

    fn unique_key(&self) -> Self::Key {
        self.id
    }
}
