use super::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// Schema stamp written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: u32 = 1;

const KV_ENTRIES: &str = "
CREATE TABLE IF NOT EXISTS kv_entries (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
);";

/// Creates `kv_entries` on a fresh file and stamps it; accepts a stamped file as-is.
pub(super) fn ensure_schema(conn: &Connection) -> DbResult<()> {
    let found: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if found > SCHEMA_VERSION {
        return Err(DbError::SchemaTooNew {
            found,
            supported: SCHEMA_VERSION,
        });
    }
    if found == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(KV_ENTRIES)?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;
    info!("event=db_schema module=db status=ok created_version={SCHEMA_VERSION}");
    Ok(())
}
