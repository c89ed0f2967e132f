//! Catalog schema steps, tracked in `PRAGMA user_version`.
//!
//! Step `n` (1-based) lives at `STEPS[n - 1]`; append only. The reserved
//! directory rows depend on configuration and are written by the catalog.

use super::DbError;
use log::debug;
use rusqlite::Connection;

const STEPS: [&str; 2] = [
    include_str!("0001_directories.sql"),
    include_str!("0002_directory_accounts.sql"),
];

/// Schema version produced by the last step.
pub fn latest_version() -> u32 {
    STEPS.len() as u32
}

/// Brings `conn` to `latest_version()` inside one transaction.
pub fn apply_migrations(conn: &mut Connection) -> Result<(), DbError> {
    let found = current_user_version(conn)?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    let pending = (found + 1..=supported).zip(STEPS.iter().skip(found as usize));
    let tx = conn.transaction()?;
    for (version, sql) in pending {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        debug!("event=db_migrate module=db status=ok version={version}");
    }
    tx.commit()?;
    Ok(())
}

pub fn current_user_version(conn: &Connection) -> Result<u32, DbError> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}
