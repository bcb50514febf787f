//! Units of work spanning the store and the content host.

use tracing::error;

use crate::error::Result;
use crate::host::ContentHost;
use crate::store::{self, Database, Store};

/// Runs `f` in one store transaction against a staged copy of `host`.
///
/// The staged host is persisted as part of the commit, before the store is
/// written. If the store write then fails, the previous host state is
/// persisted again. The copy replaces `host` only once both have committed.
pub fn atomic<H, T>(
    store: &Store,
    host: &mut H,
    f: impl FnOnce(&mut Database, &mut H) -> Result<T>,
) -> Result<T>
where
    H: ContentHost,
{
    let mut staged = host.clone();
    let mut host_written = false;

    let result = store.transaction(|db| {
        let out = f(db, &mut staged)?;
        staged.persist()?;
        host_written = true;
        Ok(out)
    });

    match result {
        Ok(out) => {
            *host = staged;
            Ok(out)
        }
        Err(e) => {
            if host_written {
                if let Err(restore) = host.persist() {
                    error!(error = %restore, "failed to restore host state after aborted commit");
                }
            }
            Err(e)
        }
    }
}

/// Nested rollback point for both sides; see [`store::savepoint`].
pub fn savepoint<H, T>(
    db: &mut Database,
    host: &mut H,
    f: impl FnOnce(&mut Database, &mut H) -> Result<T>,
) -> Result<T>
where
    H: ContentHost,
{
    let saved = host.clone();
    let out = store::savepoint(db, |db| f(db, host));
    if out.is_err() {
        *host = saved;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LocalizeError;
    use crate::host::{Document, DocumentHost};
    use crate::model::{Locale, ObjectKey};
    use crate::services::objects;
    use uuid::Uuid;

    fn doc() -> Document {
        Document::new("page", Uuid::new_v4(), Locale::parse("en").unwrap())
    }

    #[test]
    fn failed_unit_discards_host_and_store_writes() {
        let store = Store::in_memory();
        let mut host = DocumentHost::default();
        let d = doc();

        let res: Result<()> = atomic(&store, &mut host, |db, host| {
            objects::get_or_create_object(db, &d.key())?;
            host.put(d.clone());
            Err(LocalizeError::SourceDeleted)
        });
        assert!(res.is_err());
        assert!(host.documents().is_empty());
        assert_eq!(store.read(|db| db.objects.len()), 0);

        atomic(&store, &mut host, |db, host| {
            objects::get_or_create_object(db, &d.key())?;
            host.put(d.clone());
            Ok(())
        })
        .unwrap();
        assert_eq!(host.documents().len(), 1);
        assert_eq!(store.read(|db| db.objects.len()), 1);
    }

    #[test]
    fn host_file_is_written_with_the_commit() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("localize.json")).unwrap();
        let docs = dir.path().join("documents.json");
        let mut host = DocumentHost::load(&docs).unwrap();
        let d = doc();

        atomic(&store, &mut host, |db, host| {
            objects::get_or_create_object(db, &d.key())?;
            host.put(d.clone());
            Ok(())
        })
        .unwrap();

        let reloaded = DocumentHost::load(&docs).unwrap();
        assert_eq!(reloaded.documents(), &[d]);
    }

    #[cfg(unix)]
    #[test]
    fn unwritable_host_aborts_the_store_commit() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("localize.json");
        let store = Store::open(&store_path).unwrap();
        let docs = dir.path().join("documents.json");
        let mut host = DocumentHost::load(&docs).unwrap();
        std::fs::create_dir_all(&docs).unwrap();
        let d = doc();

        let res: Result<()> = atomic(&store, &mut host, |db, host| {
            objects::get_or_create_object(db, &d.key())?;
            host.put(d.clone());
            Ok(())
        });

        assert!(matches!(res, Err(LocalizeError::Host(_))));
        assert!(host.documents().is_empty());
        assert_eq!(store.read(|db| db.objects.len()), 0);
        assert!(!store_path.exists());
    }

    #[test]
    fn savepoint_keeps_outer_writes() {
        let store = Store::in_memory();
        let mut host = DocumentHost::default();
        let (a, b) = (doc(), doc());

        atomic(&store, &mut host, |db, host| {
            host.put(a.clone());
            let inner: Result<()> = savepoint(db, host, |db, host| {
                objects::get_or_create_object(db, &ObjectKey::new("page", b.translation_key))?;
                host.put(b.clone());
                Err(LocalizeError::SourceDeleted)
            });
            assert!(inner.is_err());
            Ok(())
        })
        .unwrap();

        assert_eq!(host.documents(), &[a]);
        assert_eq!(store.read(|db| db.objects.len()), 0);
    }
}
