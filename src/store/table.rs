use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::StoreError;

/// A row type stored in a [`Table`], with exactly one uniqueness constraint.
pub trait Row: Clone + Debug + Serialize + DeserializeOwned {
    const TABLE: &'static str;

    type Id: Copy + Ord + From<u64> + Into<u64>;
    type Key: Clone + Eq + Hash + Debug;

    fn id(&self) -> Self::Id;
    fn set_id(&mut self, id: Self::Id);
    fn unique_key(&self) -> Self::Key;

    /// Fills in derived columns missing from older state files.
    /// Returns true when the row changed.
    fn backfill(&mut self) -> bool {
        false
    }
}

/// Rows ordered by id plus a unique index.
#[derive(Debug, Clone)]
pub struct Table<R: Row> {
    next_id: u64,
    rows: BTreeMap<u64, R>,
    index: HashMap<R::Key, u64>,
    migrated: bool,
}

impl<R: Row> Default for Table<R> {
    fn default() -> Self {
        Self {
            next_id: 0,
            rows: BTreeMap::new(),
            index: HashMap::new(),
            migrated: false,
        }
    }
}

impl<R: Row> Table<R> {
    /// Inserts `row` under a fresh id. Fails with
    /// [`StoreError::UniqueViolation`] when the unique key is taken.
    pub fn insert(&mut self, mut row: R) -> Result<R, StoreError> {
        let id = self.next_id + 1;
        row.set_id(R::Id::from(id));

        let key = row.unique_key();
        if self.index.contains_key(&key) {
            return Err(StoreError::UniqueViolation { table: R::TABLE });
        }

        self.next_id = id;
        self.index.insert(key, id);
        self.rows.insert(id, row.clone());
        Ok(row)
    }

    /// Get-or-create: insert, and on a uniqueness violation fetch the row
    /// holding the key. Returns the row and whether it was created.
    pub fn get_or_insert(&mut self, row: R) -> Result<(R, bool), StoreError> {
        let key = row.unique_key();
        match self.insert(row) {
            Ok(row) => Ok((row, true)),
            Err(StoreError::UniqueViolation { .. }) => {
                let existing = self.find(&key).cloned().ok_or_else(|| {
                    StoreError::Integrity(format!("{}: unique key {key:?} has no row", R::TABLE))
                })?;
                Ok((existing, false))
            }
            Err(e) => Err(e),
        }
    }

    pub fn get(&self, id: R::Id) -> Option<&R> {
        self.rows.get(&id.into())
    }

    pub fn require(&self, id: R::Id) -> Result<&R, StoreError> {
        let raw: u64 = id.into();
        self.rows.get(&raw).ok_or(StoreError::NotFound {
            table: R::TABLE,
            id: raw,
        })
    }

    pub fn find(&self, key: &R::Key) -> Option<&R> {
        self.index.get(key).and_then(|id| self.rows.get(id))
    }

    /// Replaces the stored row with the same id.
    pub fn update(&mut self, row: R) -> Result<(), StoreError> {
        let raw: u64 = row.id().into();
        let old_key = match self.rows.get(&raw) {
            Some(old) => old.unique_key(),
            None => {
                return Err(StoreError::NotFound {
                    table: R::TABLE,
                    id: raw,
                })
            }
        };

        let new_key = row.unique_key();
        if new_key != old_key {
            if self.index.contains_key(&new_key) {
                return Err(StoreError::UniqueViolation { table: R::TABLE });
            }
            self.index.remove(&old_key);
            self.index.insert(new_key, raw);
        }

        self.rows.insert(raw, row);
        Ok(())
    }

    pub fn delete(&mut self, id: R::Id) -> Option<R> {
        let row = self.rows.remove(&id.into())?;
        self.index.remove(&row.unique_key());
        Some(row)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &R> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn was_migrated(&self) -> bool {
        self.migrated
    }

    fn from_rows(next_id: u64, rows: Vec<R>) -> Result<Self, StoreError> {
        let mut table = Self::default();

        for mut row in rows {
            table.migrated |= row.backfill();

            let raw: u64 = row.id().into();
            if raw == 0 || table.rows.contains_key(&raw) {
                return Err(StoreError::Integrity(format!(
                    "{}: missing or duplicate id {raw}",
                    R::TABLE
                )));
            }

            let key = row.unique_key();
            if table.index.insert(key, raw).is_some() {
                return Err(StoreError::Integrity(format!(
                    "{}: duplicate unique key on row {raw}",
                    R::TABLE
                )));
            }

            table.next_id = table.next_id.max(raw);
            table.rows.insert(raw, row);
        }

        table.next_id = table.next_id.max(next_id);
        Ok(table)
    }
}

#[derive(Serialize)]
struct TableRef<'a, R: Serialize> {
    next_id: u64,
    rows: Vec<&'a R>,
}

#[derive(Deserialize)]
struct TableData<R> {
    #[serde(default)]
    next_id: u64,
    rows: Vec<R>,
}

impl<R: Row> Serialize for Table<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TableRef {
            next_id: self.next_id,
            rows: self.rows.values().collect(),
        }
        .serialize(serializer)
    }
}

impl<'de, R: Row> Deserialize<'de> for Table<R> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let data = TableData::<R>::deserialize(deserializer)?;
        Table::from_rows(data.next_id, data.rows).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tag {
        id: u64,
        name: String,
    }

    impl Row for Tag {
        const TABLE: &'static str = "tag";
        type Id = u64;
        type Key = String;

        fn id(&self) -> u64 {
            self.id
        }

        fn set_id(&mut self, id: u64) {
            self.id = id;
        }

        fn unique_key(&self) -> String {
            self.name.clone()
        }
    }

    fn tag(name: &str) -> Tag {
        Tag {
            id: 0,
            name: name.to_string(),
        }
    }

    #[test]
    fn insert_assigns_ids_and_enforces_key() {
        let mut t = Table::<Tag>::default();
        assert_eq!(t.insert(tag("a")).unwrap().id, 1);
        assert_eq!(t.insert(tag("b")).unwrap().id, 2);

        let err = t.insert(tag("a")).unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { table: "tag" }));
        assert_eq!(t.len(), 2);
        assert_eq!(t.find(&"b".to_string()).unwrap().id, 2);
    }

    #[test]
    fn get_or_insert_reselects_existing_row() {
        let mut t = Table::<Tag>::default();
        let (a, created) = t.get_or_insert(tag("a")).unwrap();
        assert!(created);

        let (again, created) = t.get_or_insert(tag("a")).unwrap();
        assert!(!created);
        assert_eq!(again, a);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let mut t = Table::<Tag>::default();
        t.insert(tag("a")).unwrap();
        t.insert(tag("b")).unwrap();
        t.delete(2).unwrap();
        assert_eq!(t.insert(tag("c")).unwrap().id, 3);
        assert!(t.find(&"b".to_string()).is_none());
    }

    #[test]
    fn update_reindexes_and_rejects_clash() {
        let mut t = Table::<Tag>::default();
        let mut a = t.insert(tag("a")).unwrap();
        t.insert(tag("b")).unwrap();

        a.name = "b".into();
        assert!(t.update(a.clone()).is_err());

        a.name = "z".into();
        t.update(a).unwrap();
        assert!(t.find(&"a".to_string()).is_none());
        assert_eq!(t.find(&"z".to_string()).unwrap().id, 1);
    }

    #[test]
    fn serde_round_trip_rebuilds_index() {
        let mut t = Table::<Tag>::default();
        t.insert(tag("a")).unwrap();
        t.insert(tag("b")).unwrap();
        t.delete(2);

        let json = serde_json::to_string(&t).unwrap();
        let back: Table<Tag> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert!(back.find(&"a".to_string()).is_some());

        let mut back = back;
        assert_eq!(back.insert(tag("c")).unwrap().id, 3);
    }

    #[test]
    fn duplicate_keys_in_file_are_an_integrity_error() {
        let json = r#"{"next_id": 2, "rows": [{"id": 1, "name": "a"}, {"id": 2, "name": "a"}]}"#;
        assert!(serde_json::from_str::<Table<Tag>>(json).is_err());
    }
}
