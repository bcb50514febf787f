//! Transactional storage for the translation tables.
//!
//! The whole database lives in memory behind a mutex and is optionally backed
//! by a JSON file. [`Store::transaction`] runs a closure against a private
//! copy; the copy replaces the live state (and is written to disk) only when
//! the closure returns `Ok`, so a failed operation leaves nothing behind.
//! Holding the mutex for the duration of the transaction makes every writer
//! exclusive.

pub mod file;
pub mod schema;
pub mod table;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::error::StoreError;
pub use schema::Database;
pub use table::{Row, Table};

#[derive(Debug)]
pub struct Store {
    db: Mutex<Database>,
    path: Option<PathBuf>,
}

impl Store {
    pub fn in_memory() -> Self {
        Self {
            db: Mutex::new(Database::default()),
            path: None,
        }
    }

    /// Opens (or starts) a file-backed store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let db = file::load(&path)?;
        debug!(path = %path.display(), "opened store");
        Ok(Self {
            db: Mutex::new(db),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn read<T>(&self, f: impl FnOnce(&Database) -> T) -> T {
        let guard = self.lock();
        f(&guard)
    }

    /// Runs `f` atomically. Any `Err` discards every write made by `f`.
    pub fn transaction<T, E>(&self, f: impl FnOnce(&mut Database) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut guard = self.lock();
        let mut staged = guard.clone();

        let out = f(&mut staged)?;

        if let Some(path) = &self.path {
            file::save(path, &staged)?;
        }
        *guard = staged;

        Ok(out)
    }

    fn lock(&self) -> MutexGuard<'_, Database> {
        // A panic inside a transaction only ever touched the staged copy.
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Nested rollback point inside a transaction: when `f` fails, `db` is put
/// back as it was before `f` ran and the error is returned to the caller,
/// which may choose to carry on.
pub fn savepoint<T, E>(db: &mut Database, f: impl FnOnce(&mut Database) -> Result<T, E>) -> Result<T, E> {
    let saved = db.clone();
    let out = f(db);
    if out.is_err() {
        *db = saved;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Locale, SourceString};
    use uuid::Uuid;

    fn string(data: &str) -> SourceString {
        SourceString {
            id: Default::default(),
            locale: Locale::parse("en").unwrap(),
            data_hash: Uuid::new_v4(),
            data: data.to_string(),
        }
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let store = Store::in_memory();

        let res: Result<(), StoreError> = store.transaction(|db| {
            db.strings.insert(string("kept?"))?;
            Err(StoreError::Integrity("boom".into()))
        });
        assert!(res.is_err());
        assert_eq!(store.read(|db| db.strings.len()), 0);

        store
            .transaction(|db| db.strings.insert(string("kept")).map(|_| ()))
            .unwrap();
        assert_eq!(store.read(|db| db.strings.len()), 1);
    }

    #[test]
    fn savepoint_restores_only_its_own_writes() {
        let store = Store::in_memory();

        store
            .transaction(|db| {
                db.strings.insert(string("outer"))?;
                let inner: Result<(), StoreError> = savepoint(db, |db| {
                    db.strings.insert(string("inner"))?;
                    Err(StoreError::Integrity("skip".into()))
                });
                assert!(inner.is_err());
                Ok::<_, StoreError>(())
            })
            .unwrap();

        let data: Vec<String> = store.read(|db| db.strings.iter().map(|s| s.data.clone()).collect());
        assert_eq!(data, vec!["outer".to_string()]);
    }

    #[test]
    fn file_backed_store_reloads_committed_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(file::STORE_FILE);

        {
            let store = Store::open(&path).unwrap();
            store
                .transaction(|db| db.strings.insert(string("Hello")).map(|_| ()))
                .unwrap();
        }

        let store = Store::open(&path).unwrap();
        let data: Vec<String> = store.read(|db| db.strings.iter().map(|s| s.data.clone()).collect());
        assert_eq!(data, vec!["Hello".to_string()]);
    }
}
