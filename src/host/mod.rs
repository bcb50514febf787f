//! The seam to the system that owns the content objects.
//!
//! The translation core never looks inside an object. It asks the host to
//! serialize it, to list its segments, to copy it into a new locale, to
//! rewrite it from translated segments, and to save it.

pub mod document;

use serde_json::Value;

use crate::error::HostError;
use crate::model::{Locale, ObjectKey, SegmentValue};

pub use document::{Document, DocumentHost};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    Publish,
    Draft,
}

/// Hosts are cloned to stage their writes next to a store transaction, so a
/// failed operation leaves both untouched.
pub trait ContentHost: Clone {
    type Instance: Clone;

    fn object_key(&self, instance: &Self::Instance) -> ObjectKey;

    /// Concrete type of this instance, when the host has subtypes.
    fn specific_content_type(&self, instance: &Self::Instance) -> String {
        self.object_key(instance).content_type
    }

    fn locale(&self, instance: &Self::Instance) -> Locale;

    /// Short human-readable label.
    fn repr(&self, instance: &Self::Instance) -> String;

    /// Full content payload used for snapshots.
    fn serialize(&self, instance: &Self::Instance) -> Result<Value, HostError>;

    /// Rebuilds an instance from a snapshot payload. `None` when the live
    /// object the snapshot was taken from no longer exists.
    fn materialize(
        &self,
        key: &ObjectKey,
        locale: &Locale,
        content: &Value,
    ) -> Result<Option<Self::Instance>, HostError>;

    fn get_instance(&self, key: &ObjectKey, locale: &Locale) -> Option<Self::Instance>;

    fn has_instance(&self, key: &ObjectKey, locale: &Locale) -> bool {
        self.get_instance(key, locale).is_some()
    }

    /// Derives a new, unsaved instance for `locale` from `original`.
    fn copy_for_translation(
        &self,
        original: &Self::Instance,
        locale: &Locale,
    ) -> Result<Self::Instance, HostError>;

    /// Fields kept identical across locales; never segment-translated.
    fn synchronized_fields(&self, instance: &Self::Instance) -> Vec<String>;

    fn copy_field(
        &self,
        from: &Self::Instance,
        to: &mut Self::Instance,
        field: &str,
    ) -> Result<(), HostError>;

    fn extract(&self, instance: &Self::Instance) -> Result<Vec<SegmentValue>, HostError>;

    /// Rewrites `target` in place from `segments`, addressed by path.
    fn ingest(
        &self,
        original: &Self::Instance,
        target: &mut Self::Instance,
        source_locale: &Locale,
        target_locale: &Locale,
        segments: &[SegmentValue],
    ) -> Result<(), HostError>;

    fn supports_drafts(&self, instance: &Self::Instance) -> bool;

    /// Persists `instance`. Returns the new revision id when the instance has
    /// a draft lifecycle.
    fn save(&mut self, instance: &Self::Instance, mode: SaveMode) -> Result<Option<String>, HostError>;

    /// Writes the host's state to durable storage. Runs inside the store
    /// commit, before the store itself is written; an error aborts the commit.
    fn persist(&self) -> Result<(), HostError> {
        Ok(())
    }
}
