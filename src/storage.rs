// Key-value persistence primitive shared by every open page
//
// The hide list lives in ONE named value. Backends only need get/set/delete plus
// a compare-and-set, which the store uses to detect writes from sibling pages.

use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Get/set/delete of named persisted values
pub trait ValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn delete(&self, key: &str) -> Result<()>;

    /// Write `value` only if the current value equals `expected`
    /// (`None` = key absent). Returns whether the write happened.
    fn compare_and_set(&self, key: &str, expected: Option<&str>, value: &str) -> Result<bool>;
}

// ============================================================================
// IN-MEMORY BACKEND
// ============================================================================

/// Process-local store. Clones share the same map, so two clones behave like
/// two pages open on the same profile.
#[derive(Debug, Clone, Default)]
pub struct MemoryValueStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a consistent map: every write is a whole-value replace
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ValueStore for MemoryValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }

    fn compare_and_set(&self, key: &str, expected: Option<&str>, value: &str) -> Result<bool> {
        let mut values = self.lock();
        if values.get(key).map(String::as_str) != expected {
            return Ok(false);
        }
        values.insert(key.to_string(), value.to_string());
        Ok(true)
    }
}

// ============================================================================
// SQLITE BACKEND
// ============================================================================

/// SQLite-backed store. Each connection is one "page"; several connections on
/// the same file share the hide list.
pub struct SqliteValueStore {
    conn: Connection,
}

impl SqliteValueStore {
    /// Open (or create) the database file and ensure the schema exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        // Enable WAL mode so readers in other pages never block on our writes
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::bootstrap(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(SqliteValueStore { conn })
    }
}

impl ValueStore for SqliteValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn compare_and_set(&self, key: &str, expected: Option<&str>, value: &str) -> Result<bool> {
        // Single statements are atomic in SQLite, so no explicit transaction
        let changed = match expected {
            None => self.conn.execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO NOTHING",
                params![key, value],
            )?,
            Some(expected) => self.conn.execute(
                "UPDATE kv SET value = ?3 WHERE key = ?1 AND value = ?2",
                params![key, expected, value],
            )?,
        };
        Ok(changed == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise_backend(store: &dyn ValueStore) {
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "one").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("one"));

        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));

        store.delete("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);

        // Deleting an absent key is not an error
        store.delete("k").unwrap();
    }

    fn exercise_compare_and_set(store: &dyn ValueStore) {
        assert!(store.compare_and_set("k", None, "first").unwrap());
        assert!(!store.compare_and_set("k", None, "again").unwrap());
        assert!(!store.compare_and_set("k", Some("stale"), "x").unwrap());
        assert!(store.compare_and_set("k", Some("first"), "second").unwrap());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_memory_backend() {
        exercise_backend(&MemoryValueStore::new());
        exercise_compare_and_set(&MemoryValueStore::new());
    }

    #[test]
    fn test_sqlite_backend() {
        exercise_backend(&SqliteValueStore::open_in_memory().unwrap());
        exercise_compare_and_set(&SqliteValueStore::open_in_memory().unwrap());
    }

    #[test]
    fn test_memory_clones_share_state() {
        let tab_a = MemoryValueStore::new();
        let tab_b = tab_a.clone();
        tab_a.set("k", "from a").unwrap();
        assert_eq!(tab_b.get("k").unwrap().as_deref(), Some("from a"));
    }

    #[test]
    fn test_sqlite_connections_share_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jsa.db");

        let tab_a = SqliteValueStore::open(&path).unwrap();
        let tab_b = SqliteValueStore::open(&path).unwrap();

        tab_a.set("k", "from a").unwrap();
        assert_eq!(tab_b.get("k").unwrap().as_deref(), Some("from a"));
        assert!(!tab_b.compare_and_set("k", None, "from b").unwrap());
    }
}
