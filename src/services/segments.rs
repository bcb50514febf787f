use serde_json::Value;
use tracing::info;

use super::{context, interner, normalize, objects};
use crate::error::StoreError;
use crate::model::segment::SegmentAttrs;
use crate::model::{
    ContextId, ObjectKey, Segment, SegmentKind, SegmentValue, SegmentValueKind, SourceId, StringId,
    TranslationSource,
};
use crate::store::Database;

/// Stores the extracted segments of `source`, reusing existing rows, so
/// extracting the same values twice leaves the store unchanged.
pub fn extract_into(
    db: &mut Database,
    source: &TranslationSource,
    values: &[SegmentValue],
) -> Result<Vec<Segment>, StoreError> {
    let mut out = Vec::with_capacity(values.len());
    let mut created = 0usize;

    for value in values {
        let ctx = context::get_or_create_context(db, source.object_id, &value.path)?;

        let kind = match &value.kind {
            SegmentValueKind::String { text, attrs } => {
                let string = interner::intern_string(db, &source.locale, text)?;
                SegmentKind::String {
                    string_id: string.id,
                    attrs: encode_attrs(attrs),
                }
            }
            SegmentValueKind::Template {
                format,
                template,
                string_count,
            } => {
                let template = interner::intern_template(db, format, template, *string_count)?;
                SegmentKind::Template {
                    template_id: template.id,
                }
            }
            SegmentValueKind::Related {
                content_type,
                translation_key,
            } => {
                let key = ObjectKey::new(content_type.clone(), *translation_key);
                let object = objects::get_or_create_object(db, &key)?;
                SegmentKind::RelatedObject { object_id: object.id }
            }
        };

        let (segment, is_new) = db.segments.get_or_insert(Segment {
            id: Default::default(),
            source_id: source.id,
            context_id: ctx.id,
            order: value.order,
            kind,
        })?;
        if is_new {
            created += 1;
        }
        out.push(segment);
    }

    info!(source = %source.id, segments = out.len(), created, "extracted segments");
    Ok(out)
}

/// All segments of a source in extraction order.
pub fn segments_for_source(db: &Database, source_id: SourceId) -> Vec<&Segment> {
    let mut segments: Vec<&Segment> = db
        .segments
        .iter()
        .filter(|s| s.source_id == source_id)
        .collect();
    segments.sort_by_key(|s| (s.order, s.id));
    segments
}

/// String segments of a source in extraction order, with their string and attrs.
pub fn string_segments(db: &Database, source_id: SourceId) -> Vec<(&Segment, StringId, &str)> {
    segments_for_source(db, source_id)
        .into_iter()
        .filter_map(|s| match &s.kind {
            SegmentKind::String { string_id, attrs } => Some((s, *string_id, attrs.as_str())),
            _ => None,
        })
        .collect()
}

/// Whether any source, current or superseded, ever used `string_id` at `context_id`.
pub fn string_used_in_context(db: &Database, string_id: StringId, context_id: ContextId) -> bool {
    db.segments
        .iter()
        .any(|s| s.context_id == context_id && s.string_id() == Some(string_id))
}

pub fn encode_attrs(attrs: &SegmentAttrs) -> String {
    normalize::canonical_json(&Value::Object(attrs.clone()))
}

pub fn decode_attrs(attrs: &str) -> Result<SegmentAttrs, StoreError> {
    if attrs.is_empty() {
        return Ok(SegmentAttrs::new());
    }
    Ok(serde_json::from_str(attrs)?)
}
