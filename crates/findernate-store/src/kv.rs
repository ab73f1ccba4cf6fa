//! Key/value helpers, the client's equivalent of browser local storage.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// Read a raw string value.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Insert or replace a raw string value.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn().execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Delete a key. Returns whether it existed.
    pub fn kv_remove(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }

    /// Read a JSON value and decode it.
    ///
    /// A value that no longer decodes (schema drift, manual edits) is
    /// reported as an error rather than silently treated as absent.
    pub fn kv_get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.kv_get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Encode a value as JSON and store it.
    pub fn kv_set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.kv_set(key, &raw)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use crate::{Database, StoreError};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Prefs {
        theme: String,
        muted: bool,
    }

    #[test]
    fn test_set_get_remove() {
        let db = Database::open_in_memory().unwrap();

        assert_eq!(db.kv_get("token").unwrap(), None);
        db.kv_set("token", "abc").unwrap();
        assert_eq!(db.kv_get("token").unwrap().as_deref(), Some("abc"));

        db.kv_set("token", "def").unwrap();
        assert_eq!(db.kv_get("token").unwrap().as_deref(), Some("def"));

        assert!(db.kv_remove("token").unwrap());
        assert!(!db.kv_remove("token").unwrap());
        assert_eq!(db.kv_get("token").unwrap(), None);
    }

    #[test]
    fn test_json_values() {
        let db = Database::open_in_memory().unwrap();
        let prefs = Prefs {
            theme: "dark".into(),
            muted: true,
        };

        db.kv_set_json("prefs", &prefs).unwrap();
        let loaded: Option<Prefs> = db.kv_get_json("prefs").unwrap();
        assert_eq!(loaded, Some(prefs));

        let missing: Option<Prefs> = db.kv_get_json("nope").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_corrupt_json_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        db.kv_set("prefs", "{not json").unwrap();

        let result: Result<Option<Prefs>, _> = db.kv_get_json("prefs");
        assert!(matches!(result, Err(StoreError::Serde(_))));
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.db");

        Database::open_at(&path).unwrap().kv_set("user", "{}").unwrap();
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.kv_get("user").unwrap().as_deref(), Some("{}"));
    }
}
