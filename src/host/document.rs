//! A JSON document host.
//!
//! Documents are field maps. Extraction walks them depth first and addresses
//! values by dotted path (`body.2.caption`):
//!
//! * a non-blank string is a string segment;
//! * `{"$text": "...", "$attrs": {...}}` is a string segment with attributes;
//! * `{"$template": {"format": "...", "template": "...", "string_count": n}}`
//!   is a template segment;
//! * `{"$related": {"content_type": "...", "translation_key": "..."}}` is a
//!   reference to another document;
//! * objects and arrays are walked, everything else is left alone.
//!
//! Top-level fields listed in `synchronized` are not extracted; they are
//! copied verbatim into every locale.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;
use uuid::Uuid;

use super::{ContentHost, SaveMode};
use crate::error::{HostError, StoreError};
use crate::model::segment::SegmentAttrs;
use crate::model::{Locale, ObjectKey, SegmentValue, SegmentValueKind};
use crate::store::file;

pub const DOCUMENTS_FILE: &str = "documents.json";

const TEXT: &str = "$text";
const ATTRS: &str = "$attrs";
const TEMPLATE: &str = "$template";
const RELATED: &str = "$related";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content_type: String,
    pub translation_key: Uuid,
    pub locale: Locale,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub synchronized: Vec<String>,
    /// Whether the document has a draft/publish lifecycle.
    #[serde(default)]
    pub drafts: bool,
    #[serde(default)]
    pub revisions: Vec<Revision>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub number: u32,
    pub created_at: DateTime<Utc>,
    pub published: bool,
}

impl Document {
    pub fn new(content_type: impl Into<String>, translation_key: Uuid, locale: Locale) -> Self {
        Self {
            content_type: content_type.into(),
            translation_key,
            locale,
            fields: Map::new(),
            synchronized: Vec::new(),
            drafts: false,
            revisions: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.content_type.clone(), self.translation_key)
    }

    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentHost {
    #[serde(default)]
    documents: Vec<Document>,
    /// File the host persists to; `None` keeps it in memory.
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl DocumentHost {
    /// Opens the host backed by `path`; a missing file is an empty host.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let mut host = if path.exists() {
            let data = std::fs::read_to_string(path)?;
            serde_json::from_str(&data)?
        } else {
            Self::default()
        };
        host.path = Some(path.to_path_buf());
        Ok(host)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        file::save_json(path, self)
    }

    /// Inserts or replaces the document with the same key and locale.
    pub fn put(&mut self, doc: Document) {
        match self.position(&doc.key(), &doc.locale) {
            Some(i) => self.documents[i] = doc,
            None => self.documents.push(doc),
        }
    }

    pub fn get(&self, key: &ObjectKey, locale: &Locale) -> Option<&Document> {
        self.position(key, locale).map(|i| &self.documents[i])
    }

    pub fn remove(&mut self, key: &ObjectKey, locale: &Locale) -> Option<Document> {
        self.position(key, locale).map(|i| self.documents.remove(i))
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    fn position(&self, key: &ObjectKey, locale: &Locale) -> Option<usize> {
        self.documents.iter().position(|d| {
            d.content_type == key.content_type
                && d.translation_key == key.translation_key
                && &d.locale == locale
        })
    }
}

impl ContentHost for DocumentHost {
    type Instance = Document;

    fn object_key(&self, doc: &Document) -> ObjectKey {
        doc.key()
    }

    fn locale(&self, doc: &Document) -> Locale {
        doc.locale.clone()
    }

    fn repr(&self, doc: &Document) -> String {
        match doc.field_str("title") {
            Some(title) if !title.trim().is_empty() => title.to_string(),
            _ => format!("{} {}", doc.content_type, doc.translation_key),
        }
    }

    fn serialize(&self, doc: &Document) -> Result<Value, HostError> {
        Ok(Value::Object(doc.fields.clone()))
    }

    fn materialize(
        &self,
        key: &ObjectKey,
        locale: &Locale,
        content: &Value,
    ) -> Result<Option<Document>, HostError> {
        let Some(live) = self.get(key, locale) else {
            return Ok(None);
        };
        let fields = content
            .as_object()
            .cloned()
            .ok_or_else(|| HostError::new("snapshot payload is not an object"))?;

        Ok(Some(Document {
            fields,
            ..live.clone()
        }))
    }

    fn get_instance(&self, key: &ObjectKey, locale: &Locale) -> Option<Document> {
        self.get(key, locale).cloned()
    }

    fn copy_for_translation(&self, original: &Document, locale: &Locale) -> Result<Document, HostError> {
        if self.get(&original.key(), locale).is_some() {
            return Err(HostError::new(format!(
                "{} already exists in {locale}",
                original.translation_key
            )));
        }
        Ok(Document {
            locale: locale.clone(),
            revisions: Vec::new(),
            ..original.clone()
        })
    }

    fn synchronized_fields(&self, doc: &Document) -> Vec<String> {
        doc.synchronized.clone()
    }

    fn copy_field(&self, from: &Document, to: &mut Document, field: &str) -> Result<(), HostError> {
        match from.fields.get(field) {
            Some(v) => {
                to.fields.insert(field.to_string(), v.clone());
            }
            None => {
                to.fields.remove(field);
            }
        }
        Ok(())
    }

    fn extract(&self, doc: &Document) -> Result<Vec<SegmentValue>, HostError> {
        let mut out = Vec::new();
        for (name, value) in &doc.fields {
            if doc.synchronized.iter().any(|s| s == name) {
                continue;
            }
            walk(name.clone(), value, &mut out)?;
        }
        for (i, seg) in out.iter_mut().enumerate() {
            seg.order = i as u32;
        }
        Ok(out)
    }

    /// Rebuilds every non-synchronized field of `target` from `original`
    /// before writing the segments, so the target follows the source's
    /// structure. Synchronized fields keep the target's value.
    fn ingest(
        &self,
        original: &Document,
        target: &mut Document,
        _source_locale: &Locale,
        _target_locale: &Locale,
        segments: &[SegmentValue],
    ) -> Result<(), HostError> {
        let mut fields = Map::new();
        for (name, value) in &original.fields {
            let value = match target.fields.get(name) {
                Some(kept) if original.synchronized.contains(name) => kept.clone(),
                _ => value.clone(),
            };
            fields.insert(name.clone(), value);
        }
        target.fields = fields;

        for seg in segments {
            set_path(&mut target.fields, &seg.path, render(seg))?;
        }
        Ok(())
    }

    fn supports_drafts(&self, doc: &Document) -> bool {
        doc.drafts
    }

    fn save(&mut self, doc: &Document, mode: SaveMode) -> Result<Option<String>, HostError> {
        if mode == SaveMode::Draft && !doc.drafts {
            return Err(HostError::new(format!("{} has no drafts", doc.content_type)));
        }

        let mut doc = doc.clone();
        let revision = if doc.drafts {
            let number = doc.revisions.len() as u32 + 1;
            doc.revisions.push(Revision {
                number,
                created_at: Utc::now(),
                published: mode == SaveMode::Publish,
            });
            Some(number.to_string())
        } else {
            None
        };

        debug!(key = %doc.translation_key, locale = %doc.locale, ?revision, "saved document");
        self.put(doc);
        Ok(revision)
    }

    fn persist(&self) -> Result<(), HostError> {
        match &self.path {
            Some(path) => self
                .save_to(path)
                .map_err(|e| HostError::new(format!("{}: {e}", path.display()))),
            None => Ok(()),
        }
    }
}

fn walk(path: String, value: &Value, out: &mut Vec<SegmentValue>) -> Result<(), HostError> {
    match value {
        Value::String(s) if !s.trim().is_empty() => out.push(SegmentValue::string(path, s.clone())),
        Value::Object(map) if map.contains_key(TEXT) => {
            let text = map
                .get(TEXT)
                .and_then(Value::as_str)
                .ok_or_else(|| HostError::new(format!("{path}: {TEXT} must be a string")))?;
            let attrs: SegmentAttrs = map
                .get(ATTRS)
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            out.push(SegmentValue::rich_string(path, text, attrs));
        }
        Value::Object(map) if map.contains_key(TEMPLATE) => {
            let t = &map[TEMPLATE];
            let format = t.get("format").and_then(Value::as_str).unwrap_or("text");
            let template = t
                .get("template")
                .and_then(Value::as_str)
                .ok_or_else(|| HostError::new(format!("{path}: template body missing")))?;
            let string_count = t.get("string_count").and_then(Value::as_u64).unwrap_or(0) as usize;
            out.push(SegmentValue::template(path, format, template, string_count));
        }
        Value::Object(map) if map.contains_key(RELATED) => {
            let r = &map[RELATED];
            let content_type = r
                .get("content_type")
                .and_then(Value::as_str)
                .ok_or_else(|| HostError::new(format!("{path}: related content_type missing")))?;
            let translation_key = r
                .get("translation_key")
                .and_then(Value::as_str)
                .and_then(|k| Uuid::try_parse(k).ok())
                .ok_or_else(|| HostError::new(format!("{path}: related translation_key invalid")))?;
            out.push(SegmentValue::related(path, content_type, translation_key));
        }
        Value::Object(map) => {
            for (k, v) in map {
                walk(format!("{path}.{k}"), v, out)?;
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                walk(format!("{path}.{i}"), v, out)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn render(seg: &SegmentValue) -> Value {
    match &seg.kind {
        SegmentValueKind::String { text, attrs } if attrs.is_empty() => Value::String(text.clone()),
        SegmentValueKind::String { text, attrs } => json!({ TEXT: text, ATTRS: attrs }),
        SegmentValueKind::Template {
            format,
            template,
            string_count,
        } => json!({ TEMPLATE: {"format": format, "template": template, "string_count": string_count} }),
        SegmentValueKind::Related {
            content_type,
            translation_key,
        } => json!({ RELATED: {"content_type": content_type, "translation_key": translation_key} }),
    }
}

fn set_path(fields: &mut Map<String, Value>, path: &str, value: Value) -> Result<(), HostError> {
    let mut parts = path.split('.');
    let first = parts
        .next()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| HostError::new("empty path"))?;
    let rest: Vec<&str> = parts.collect();

    let mut slot = fields
        .entry(first.to_string())
        .or_insert_with(|| Value::Object(Map::new()));

    for part in rest {
        slot = match slot {
            Value::Object(map) => map
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            Value::Array(items) => {
                let i: usize = part
                    .parse()
                    .map_err(|_| HostError::new(format!("{path}: {part} is not an index")))?;
                items
                    .get_mut(i)
                    .ok_or_else(|| HostError::new(format!("{path}: index {i} out of range")))?
            }
            _ => return Err(HostError::new(format!("{path}: cannot descend into {part}"))),
        };
    }

    *slot = value;
    Ok(())
}
