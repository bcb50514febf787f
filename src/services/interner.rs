use tracing::debug;

use super::hash;
use crate::error::StoreError;
use crate::model::{Locale, SourceString, Template};
use crate::store::Database;

/// Returns the string row for `text` in `locale`, creating it on first sight.
/// Existing rows are never modified.
pub fn intern_string(db: &mut Database, locale: &Locale, text: &str) -> Result<SourceString, StoreError> {
    let (row, created) = db.strings.get_or_insert(SourceString {
        id: Default::default(),
        locale: locale.clone(),
        data_hash: hash::string_hash(locale, text),
        data: text.to_string(),
    })?;

    if !created && row.data != text {
        return Err(StoreError::Integrity(format!(
            "string hash collision in {locale}: {:?} vs {:?}",
            row.data, text
        )));
    }
    if created {
        debug!(id = %row.id, %locale, "interned string");
    }

    Ok(row)
}

pub fn intern_template(
    db: &mut Database,
    format: &str,
    template: &str,
    string_count: usize,
) -> Result<Template, StoreError> {
    let (row, created) = db.templates.get_or_insert(Template {
        id: Default::default(),
        uuid: hash::template_hash(format, template),
        format: format.to_string(),
        template: template.to_string(),
        string_count,
    })?;

    if !created && (row.format != format || row.template != template) {
        return Err(StoreError::Integrity(format!(
            "template hash collision on {}",
            row.uuid
        )));
    }
    if created {
        debug!(id = %row.id, format, "interned template");
    }

    Ok(row)
}

/// Exact lookup used by catalog import: the string must already exist.
pub fn find_string<'a>(db: &'a Database, locale: &Locale, text: &str) -> Option<&'a SourceString> {
    db.strings
        .find(&(locale.clone(), hash::string_hash(locale, text)))
        .filter(|s| s.data == text)
}
