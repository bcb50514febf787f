//! Submitting objects for translation.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{assemble, segments, sources, staging, translations};
use crate::error::{LocalizeError, Result};
use crate::host::ContentHost;
use crate::model::{Locale, ObjectId, ObjectKey, SegmentKind, SourceId, TranslationId};
use crate::store::{Database, Store};

#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub target_locales: Vec<Locale>,
    /// Snapshot even when the content is unchanged.
    pub force: bool,
    /// Submit referenced objects first, so the localized copy can point at
    /// their translations.
    pub include_related: bool,
}

impl SubmitRequest {
    pub fn new(target_locales: Vec<Locale>) -> Self {
        Self {
            target_locales,
            force: false,
            include_related: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedSource {
    pub object_id: ObjectId,
    pub source_id: SourceId,
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deferred {
    pub translation_id: TranslationId,
    pub locale: Locale,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmitReport {
    pub sources: Vec<SubmittedSource>,
    pub translations: Vec<TranslationId>,
    /// Translations whose localized object was written.
    pub saved: Vec<TranslationId>,
    /// Translations left for later because a related object is not
    /// translated yet.
    pub deferred: Vec<Deferred>,
}

impl SubmitReport {
    /// The submission for the instance the caller passed in.
    pub fn root(&self) -> Option<&SubmittedSource> {
        self.sources.last()
    }
}

pub fn submit_for_translation<H: ContentHost>(
    store: &Store,
    host: &mut H,
    instance: &H::Instance,
    request: &SubmitRequest,
) -> Result<SubmitReport> {
    let report = staging::atomic(store, host, |db, host| {
        let mut report = SubmitReport::default();
        let mut seen = HashSet::new();
        submit_in(db, host, instance, request, &mut seen, &mut report)?;
        Ok(report)
    })?;

    info!(
        sources = report.sources.len(),
        saved = report.saved.len(),
        deferred = report.deferred.len(),
        "submitted for translation"
    );
    Ok(report)
}

fn submit_in<H: ContentHost>(
    db: &mut Database,
    host: &mut H,
    instance: &H::Instance,
    request: &SubmitRequest,
    seen: &mut HashSet<ObjectKey>,
    report: &mut SubmitReport,
) -> Result<()> {
    if !seen.insert(host.object_key(instance)) {
        return Ok(());
    }

    let (source, created) = sources::from_instance(db, host, instance, request.force)?;
    if created {
        sources::extract_segments(db, host, &source, instance)?;
    }

    if request.include_related {
        for key in related_keys(db, source.id)? {
            match host.get_instance(&key, &source.locale) {
                Some(related) => submit_in(db, host, &related, request, seen, report)?,
                None => debug!(key = %key.translation_key, locale = %source.locale, "related object has no source-locale instance"),
            }
        }
    }

    report.sources.push(SubmittedSource {
        object_id: source.object_id,
        source_id: source.id,
        created,
    });

    for locale in &request.target_locales {
        if *locale == source.locale {
            continue;
        }

        let (translation, _) =
            translations::get_or_create_translation(db, source.object_id, locale, source.id)?;
        report.translations.push(translation.id);
        if !translation.enabled {
            continue;
        }

        let id = translation.id;
        match staging::savepoint(db, host, |db, host| {
            assemble::save_target_in(db, host, id, true)
        }) {
            Ok(_) => report.saved.push(id),
            Err(e @ LocalizeError::MissingRelatedObject { .. }) => {
                warn!(translation = %id, %locale, error = %e, "deferring localized object");
                report.deferred.push(Deferred {
                    translation_id: id,
                    locale: locale.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

fn related_keys(db: &Database, source_id: SourceId) -> Result<Vec<ObjectKey>> {
    let mut keys = Vec::new();
    for seg in segments::segments_for_source(db, source_id) {
        if let SegmentKind::RelatedObject { object_id } = seg.kind {
            let key = db.objects.require(object_id)?.key();
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }
    Ok(keys)
}
