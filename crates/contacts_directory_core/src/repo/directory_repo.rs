//! Directory repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and bulk-prune APIs over the `directories` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `DirectoryInfo::validate()` before SQL mutations.
//! - Absent optional fields are written as SQL `NULL`.
//! - Generic update/delete/prune statements never touch reserved rows.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::directory::{
    AccountRef, DirectoryId, DirectoryInfo, DirectoryRecord, DirectoryValidationError,
    ExportSupport, ReservedDirectory, DEFAULT_DIRECTORY_ID, LOCAL_INVISIBLE_DIRECTORY_ID,
};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const DIRECTORY_SELECT_SQL: &str = "SELECT
    id,
    package_name,
    authority,
    type_label,
    display_name,
    export_support,
    account_name,
    account_type
FROM directories";

const REQUIRED_COLUMNS: &[&str] = &[
    "id",
    "package_name",
    "authority",
    "type_label",
    "display_name",
    "export_support",
    "account_name",
    "account_type",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for directory persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(DirectoryValidationError),
    Db(DbError),
    NotFound(DirectoryId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "directory not found: {id}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted directory data: {message}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DirectoryValidationError> for RepoError {
    fn from(value: DirectoryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for the directory catalog table.
pub trait DirectoryRepository {
    /// Inserts a user-defined directory and returns its fresh id.
    fn insert_directory(&self, info: &DirectoryInfo) -> RepoResult<DirectoryId>;
    /// Writes the fixed metadata of one reserved directory, creating it if needed.
    fn upsert_reserved(&self, slot: ReservedDirectory, info: &DirectoryInfo) -> RepoResult<()>;
    /// Replaces all mutable fields of a user-defined directory.
    fn update_directory(&self, id: DirectoryId, info: &DirectoryInfo) -> RepoResult<()>;
    /// Deletes a user-defined directory.
    fn delete_directory(&self, id: DirectoryId) -> RepoResult<()>;
    fn get_directory(&self, id: DirectoryId) -> RepoResult<Option<DirectoryRecord>>;
    /// Lists every directory ordered by id.
    fn list_directories(&self) -> RepoResult<Vec<DirectoryRecord>>;
    /// Deletes every user-defined directory owned by `package`.
    fn delete_by_owner_package(&self, package: &str) -> RepoResult<Vec<DirectoryId>>;
    /// Deletes every directory tied to an account missing from `accounts`.
    fn delete_for_missing_accounts(
        &self,
        accounts: &BTreeSet<AccountRef>,
    ) -> RepoResult<Vec<DirectoryId>>;
}

/// SQLite-backed directory repository.
#[derive(Debug)]
pub struct SqliteDirectoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDirectoryRepository<'conn> {
    /// Constructs a repository after checking schema version and table shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Constructs a repository over a connection already checked by `try_new`.
    ///
    /// Used inside transactions opened on a verified connection.
    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl DirectoryRepository for SqliteDirectoryRepository<'_> {
    fn insert_directory(&self, info: &DirectoryInfo) -> RepoResult<DirectoryId> {
        info.validate()?;

        self.conn.execute(
            "INSERT INTO directories (
                package_name,
                authority,
                type_label,
                display_name,
                export_support,
                account_name,
                account_type
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                info.owner_package.as_str(),
                info.authority.as_str(),
                info.type_label.as_deref(),
                info.display_name.as_deref(),
                info.export_support.as_code(),
                info.account_name.as_deref(),
                info.account_type.as_deref(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn upsert_reserved(&self, slot: ReservedDirectory, info: &DirectoryInfo) -> RepoResult<()> {
        info.validate()?;

        self.conn.execute(
            "INSERT INTO directories (
                id,
                package_name,
                authority,
                type_label,
                display_name,
                export_support,
                account_name,
                account_type
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                package_name = excluded.package_name,
                authority = excluded.authority,
                type_label = excluded.type_label,
                display_name = excluded.display_name,
                export_support = excluded.export_support,
                account_name = excluded.account_name,
                account_type = excluded.account_type,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                slot.id(),
                info.owner_package.as_str(),
                info.authority.as_str(),
                info.type_label.as_deref(),
                info.display_name.as_deref(),
                info.export_support.as_code(),
                info.account_name.as_deref(),
                info.account_type.as_deref(),
            ],
        )?;

        Ok(())
    }

    fn update_directory(&self, id: DirectoryId, info: &DirectoryInfo) -> RepoResult<()> {
        info.validate()?;

        let changed = self.conn.execute(
            "UPDATE directories
             SET
                authority = ?2,
                type_label = ?3,
                display_name = ?4,
                export_support = ?5,
                account_name = ?6,
                account_type = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND id NOT IN (?8, ?9);",
            params![
                id,
                info.authority.as_str(),
                info.type_label.as_deref(),
                info.display_name.as_deref(),
                info.export_support.as_code(),
                info.account_name.as_deref(),
                info.account_type.as_deref(),
                DEFAULT_DIRECTORY_ID,
                LOCAL_INVISIBLE_DIRECTORY_ID,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_directory(&self, id: DirectoryId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM directories WHERE id = ?1 AND id NOT IN (?2, ?3);",
            params![id, DEFAULT_DIRECTORY_ID, LOCAL_INVISIBLE_DIRECTORY_ID],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn get_directory(&self, id: DirectoryId) -> RepoResult<Option<DirectoryRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DIRECTORY_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_directory_row(row)?));
        }

        Ok(None)
    }

    fn list_directories(&self) -> RepoResult<Vec<DirectoryRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DIRECTORY_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut directories = Vec::new();

        while let Some(row) = rows.next()? {
            directories.push(parse_directory_row(row)?);
        }

        Ok(directories)
    }

    fn delete_by_owner_package(&self, package: &str) -> RepoResult<Vec<DirectoryId>> {
        let ids = select_ids(
            self.conn,
            "SELECT id FROM directories
             WHERE package_name = ?1
               AND id NOT IN (?2, ?3)
             ORDER BY id ASC;",
            params![package, DEFAULT_DIRECTORY_ID, LOCAL_INVISIBLE_DIRECTORY_ID],
        )?;
        delete_ids(self.conn, &ids)?;
        Ok(ids)
    }

    fn delete_for_missing_accounts(
        &self,
        accounts: &BTreeSet<AccountRef>,
    ) -> RepoResult<Vec<DirectoryId>> {
        let mut orphaned = Vec::new();
        {
            let mut stmt = self.conn.prepare(
                "SELECT id, account_name, account_type
                 FROM directories
                 WHERE account_name IS NOT NULL
                   AND account_type IS NOT NULL
                   AND id NOT IN (?1, ?2)
                 ORDER BY id ASC;",
            )?;
            let mut rows =
                stmt.query(params![DEFAULT_DIRECTORY_ID, LOCAL_INVISIBLE_DIRECTORY_ID])?;
            while let Some(row) = rows.next()? {
                let account = AccountRef::new(
                    row.get::<_, String>("account_name")?,
                    row.get::<_, String>("account_type")?,
                );
                if !accounts.contains(&account) {
                    orphaned.push(row.get::<_, DirectoryId>("id")?);
                }
            }
        }

        delete_ids(self.conn, &orphaned)?;
        Ok(orphaned)
    }
}

fn parse_directory_row(row: &Row<'_>) -> RepoResult<DirectoryRecord> {
    let id: DirectoryId = row.get("id")?;
    let export_code: i64 = row.get("export_support")?;
    let export_support = ExportSupport::from_code(export_code).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid export_support value `{export_code}` in directories.export_support"
        ))
    })?;

    let info = DirectoryInfo {
        owner_package: row.get("package_name")?,
        authority: row.get("authority")?,
        display_name: row.get("display_name")?,
        type_label: row.get("type_label")?,
        export_support,
        account_name: row.get("account_name")?,
        account_type: row.get("account_type")?,
    };
    info.validate()
        .map_err(|err| RepoError::InvalidData(format!("directory {id}: {err}")))?;

    Ok(DirectoryRecord::from_parts(id, info))
}

fn select_ids(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> RepoResult<Vec<DirectoryId>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

fn delete_ids(conn: &Connection, ids: &[DirectoryId]) -> RepoResult<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    conn.execute(
        &format!("DELETE FROM directories WHERE id IN ({placeholders});"),
        params_from_iter(ids.iter()),
    )?;
    Ok(())
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "directories")? {
        return Err(RepoError::MissingRequiredTable("directories"));
    }

    for &column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "directories", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "directories",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
