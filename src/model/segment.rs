use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::ids::{ContextId, ObjectId, SegmentId, SourceId, StringId, TemplateId};

/// Attributes stripped from a string during extraction, keyed by element anchor
/// (`"a#a1" -> {"href": "..."}`). Reapplied verbatim on ingestion.
pub type SegmentAttrs = Map<String, Value>;

/// A stored segment of one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub id: SegmentId,
    pub source_id: SourceId,
    pub context_id: ContextId,
    pub order: u32,
    pub kind: SegmentKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentKind {
    String {
        string_id: StringId,
        /// Canonical JSON of the [`SegmentAttrs`].
        attrs: String,
    },
    Template {
        template_id: TemplateId,
    },
    RelatedObject {
        object_id: ObjectId,
    },
}

impl Segment {
    pub fn string_id(&self) -> Option<StringId> {
        match &self.kind {
            SegmentKind::String { string_id, .. } => Some(*string_id),
            _ => None,
        }
    }
}

/// A segment as produced by extraction or consumed by ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentValue {
    pub path: String,
    #[serde(default)]
    pub order: u32,
    #[serde(flatten)]
    pub kind: SegmentValueKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentValueKind {
    String {
        text: String,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        attrs: SegmentAttrs,
    },
    Template {
        format: String,
        template: String,
        string_count: usize,
    },
    Related {
        content_type: String,
        translation_key: Uuid,
    },
}

impl SegmentValue {
    pub fn string(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            order: 0,
            kind: SegmentValueKind::String {
                text: text.into(),
                attrs: SegmentAttrs::new(),
            },
        }
    }

    pub fn rich_string(path: impl Into<String>, text: impl Into<String>, attrs: SegmentAttrs) -> Self {
        Self {
            path: path.into(),
            order: 0,
            kind: SegmentValueKind::String {
                text: text.into(),
                attrs,
            },
        }
    }

    pub fn template(
        path: impl Into<String>,
        format: impl Into<String>,
        template: impl Into<String>,
        string_count: usize,
    ) -> Self {
        Self {
            path: path.into(),
            order: 0,
            kind: SegmentValueKind::Template {
                format: format.into(),
                template: template.into(),
                string_count,
            },
        }
    }

    pub fn related(path: impl Into<String>, content_type: impl Into<String>, translation_key: Uuid) -> Self {
        Self {
            path: path.into(),
            order: 0,
            kind: SegmentValueKind::Related {
                content_type: content_type.into(),
                translation_key,
            },
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_wire_shape_is_flat_and_tagged() {
        let v = SegmentValue::string("title", "Hello").with_order(2);
        assert_eq!(
            serde_json::to_value(&v).unwrap(),
            json!({"path": "title", "order": 2, "kind": "string", "text": "Hello"})
        );

        let back: SegmentValue = serde_json::from_value(json!({
            "path": "author",
            "kind": "related",
            "content_type": "person",
            "translation_key": "0b0c9c4e-4d0b-4c7e-9a8b-2f1e0d3c4b5a"
        }))
        .unwrap();
        assert_eq!(back.order, 0);
        assert!(matches!(back.kind, SegmentValueKind::Related { .. }));
    }
}
