//! Durable key/value store backed by SQLite.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::error::ErrorKind;
use log::{error, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Mutex;

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence failure reported by a `KeyValueStore`.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    InvalidKey(String),
    Serialization(String),
    /// Another thread panicked while holding the connection.
    Poisoned,
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Write
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "store write failed: {err}"),
            Self::InvalidKey(key) => write!(f, "invalid store key `{key}`"),
            Self::Serialization(message) => write!(f, "cannot serialize value: {message}"),
            Self::Poisoned => write!(f, "store connection is poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Synchronous key/value persistence contract.
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` when the key was never written.
    fn load(&self, key: &str) -> StoreResult<Option<String>>;
    /// Writes `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &str) -> StoreResult<()>;
}

/// SQLite-backed durable store. One row per key in `kv_entries`.
pub struct SqliteKeyValueStore {
    conn: Mutex<Connection>,
}

impl SqliteKeyValueStore {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens (or creates) the store file at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    /// Opens a store that lives only as long as this value.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn load(&self, key: &str) -> StoreResult<Option<String>> {
        let key = normalize_key(key)?;
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|err| {
                warn!("event=kv_load module=store status=error key={key} error={err}");
                err
            })?;
        Ok(value)
    }

    fn save(&self, key: &str, value: &str) -> StoreResult<()> {
        let key = normalize_key(key)?;
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )
        .map_err(|err| {
            error!(
                "event=kv_save module=store status=error key={key} bytes={} error={err}",
                value.len()
            );
            err
        })?;
        Ok(())
    }
}

pub(super) fn normalize_key(key: &str) -> StoreResult<&str> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::{KeyValueStore, SqliteKeyValueStore, StoreError};

    #[test]
    fn missing_key_loads_as_none() {
        let store = SqliteKeyValueStore::open_in_memory().unwrap();
        assert_eq!(store.load("quotes").unwrap(), None);
    }

    #[test]
    fn save_overwrites_previous_value() {
        let store = SqliteKeyValueStore::open_in_memory().unwrap();
        store.save("selected_filter", "all").unwrap();
        store.save("selected_filter", "Life").unwrap();
        assert_eq!(
            store.load("selected_filter").unwrap().as_deref(),
            Some("Life")
        );
    }

    #[test]
    fn blank_key_is_rejected() {
        let store = SqliteKeyValueStore::open_in_memory().unwrap();
        let err = store.save("  ", "value").unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }
}
