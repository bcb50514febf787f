//! Rebuilding a localized object from its source snapshot and the memory.

use chrono::Utc;
use tracing::info;

use super::{memory, segments, sources, staging, translations};
use crate::error::{LocalizeError, Result};
use crate::host::{ContentHost, SaveMode};
use crate::model::{
    Locale, SegmentKind, SegmentValue, SourceId, TranslationId, TranslationLog, TranslationSource,
};
use crate::store::{Database, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssembleOptions {
    /// Publish the saved revision. `false` saves a draft.
    pub publish: bool,
    /// Use the source text for strings the memory has no translation for.
    pub fallback_to_source: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            publish: true,
            fallback_to_source: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Assembled<I> {
    pub instance: I,
    pub created: bool,
    pub revision: Option<String>,
}

/// Writes the `locale` copy of the object `source_id` was taken from, in one
/// unit of work. Nothing is persisted on any error.
pub fn create_or_update_localized_object<H: ContentHost>(
    store: &Store,
    host: &mut H,
    source_id: SourceId,
    locale: &Locale,
    options: AssembleOptions,
) -> Result<Assembled<H::Instance>> {
    staging::atomic(store, host, |db, host| {
        assemble_in(db, host, source_id, locale, options)
    })
}

pub fn assemble_in<H: ContentHost>(
    db: &mut Database,
    host: &mut H,
    source_id: SourceId,
    locale: &Locale,
    options: AssembleOptions,
) -> Result<Assembled<H::Instance>> {
    let source = db.sources.require(source_id)?.clone();
    let original = sources::as_instance(db, host, &source)?;

    if !options.publish && !host.supports_drafts(&original) {
        return Err(LocalizeError::CannotSaveDraft {
            content_type: source.specific_content_type.clone(),
        });
    }

    let key = db.objects.require(source.object_id)?.key();
    let (mut target, created) = match host.get_instance(&key, locale) {
        Some(existing) => (existing, false),
        None => (host.copy_for_translation(&original, locale)?, true),
    };

    for field in host.synchronized_fields(&original) {
        host.copy_field(&original, &mut target, &field)?;
    }

    let values = localized_segments(db, host, &source, locale, options.fallback_to_source)?;
    host.ingest(&original, &mut target, &source.locale, locale, &values)?;

    let mode = if options.publish {
        SaveMode::Publish
    } else {
        SaveMode::Draft
    };
    let revision = host.save(&target, mode)?;

    db.logs.insert(TranslationLog {
        id: Default::default(),
        source_id: source.id,
        locale: locale.clone(),
        created_at: Utc::now(),
        revision: revision.clone(),
    })?;

    info!(
        source = %source.id,
        %locale,
        created,
        segments = values.len(),
        revision = revision.as_deref().unwrap_or("-"),
        "assembled localized object"
    );

    let instance = host.get_instance(&key, locale).unwrap_or(target);
    Ok(Assembled {
        instance,
        created,
        revision,
    })
}

/// Segments of `source` with every string replaced by its `locale` text.
fn localized_segments<H: ContentHost>(
    db: &Database,
    host: &H,
    source: &TranslationSource,
    locale: &Locale,
    fallback_to_source: bool,
) -> Result<Vec<SegmentValue>> {
    let mut out = Vec::new();

    for seg in segments::segments_for_source(db, source.id) {
        let path = db.contexts.require(seg.context_id)?.path.clone();

        let value = match &seg.kind {
            SegmentKind::String { string_id, attrs } => {
                let text = match memory::lookup(db, *string_id, locale, seg.context_id) {
                    Some(t) => t.data.clone(),
                    None if fallback_to_source => db.strings.require(*string_id)?.data.clone(),
                    None => {
                        return Err(LocalizeError::MissingTranslation {
                            segment: seg.id,
                            locale: locale.clone(),
                        })
                    }
                };
                SegmentValue::rich_string(path, text, segments::decode_attrs(attrs)?)
            }
            SegmentKind::Template { template_id } => {
                let t = db.templates.require(*template_id)?;
                SegmentValue::template(path, &t.format, &t.template, t.string_count)
            }
            SegmentKind::RelatedObject { object_id } => {
                let related = db.objects.require(*object_id)?;
                if !host.has_instance(&related.key(), locale) {
                    return Err(LocalizeError::MissingRelatedObject {
                        segment: seg.id,
                        locale: locale.clone(),
                        object: related.translation_key,
                    });
                }
                SegmentValue::related(path, &related.content_type, related.translation_key)
            }
        };

        out.push(value.with_order(seg.order));
    }

    Ok(out)
}

/// Brings the localized object of translation `id` up to date, falling back
/// to source text for anything untranslated.
pub fn save_target<H: ContentHost>(
    store: &Store,
    host: &mut H,
    id: TranslationId,
    publish: bool,
) -> Result<Assembled<H::Instance>> {
    staging::atomic(store, host, |db, host| save_target_in(db, host, id, publish))
}

pub fn save_target_in<H: ContentHost>(
    db: &mut Database,
    host: &mut H,
    id: TranslationId,
    publish: bool,
) -> Result<Assembled<H::Instance>> {
    let translation = translations::require(db, id)?.clone();
    let options = AssembleOptions {
        publish,
        fallback_to_source: true,
    };

    let assembled = assemble_in(
        db,
        host,
        translation.source_id,
        &translation.target_locale,
        options,
    )?;
    translations::touch_destination(db, id)?;
    Ok(assembled)
}
