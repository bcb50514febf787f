use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::{info, warn};

use super::schema::Database;
use crate::error::StoreError;

pub const STORE_FILE: &str = "localize.json";

/// Loads the database at `path`; a missing file is an empty database.
///
/// Rows that needed a backfill are written back immediately.
pub fn load(path: &Path) -> Result<Database, StoreError> {
    if !path.exists() {
        return Ok(Database::default());
    }

    let data = fs::read_to_string(path)?;
    let db: Database = serde_json::from_str(&data)?;

    if db.was_migrated() {
        info!(path = %path.display(), "backfilled missing hashes, persisting migration");
        if let Err(e) = save(path, &db) {
            warn!(path = %path.display(), error = %e, "failed to persist migration");
        }
    }

    Ok(db)
}

pub fn save(path: &Path, db: &Database) -> Result<(), StoreError> {
    save_json(path, db)
}

pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value)?;
    write_atomic(path, json.as_bytes())
}

pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp = tmp_path(path);

    if let Some(parent) = tmp.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&tmp, bytes)?;
    replace(&tmp, path)
}

/// Moves `tmp` over `path`. `rename` replaces an existing file atomically
/// except on Windows, where the old file has to go first.
fn replace(tmp: &Path, path: &Path) -> Result<(), StoreError> {
    #[cfg(windows)]
    if path.exists() {
        fs::remove_file(path)?;
    }

    fs::rename(tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut p = path.to_path_buf();
    let file_name = match path.file_name().and_then(|s| s.to_str()) {
        Some(n) => n.to_string(),
        None => "store".to_string(),
    };
    p.set_file_name(format!("{file_name}.tmp"));
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = load(&dir.path().join(STORE_FILE)).unwrap();
        assert!(db.strings.is_empty());
    }

    #[test]
    fn write_atomic_replaces_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "two");
        assert!(!tmp_path(&path).exists());
    }

    #[cfg(unix)]
    #[test]
    fn failed_replace_keeps_the_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        write_atomic(&path, b"one").unwrap();

        assert!(replace(&dir.path().join("missing.tmp"), &path).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "one");
    }

    #[test]
    fn corrupt_file_is_an_error_not_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORE_FILE);
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load(&path), Err(StoreError::Serialization(_))));
    }
}
