//! Directory catalog store with ownership enforcement.
//!
//! # Responsibility
//! - Serialize catalog access over one SQLite connection.
//! - Enforce owner-only mutation and reserved-record immutability.
//! - Materialize the reserved local directories at open time.
//!
//! # Invariants
//! - Checks run in order existence, reserved, ownership, validation, and all
//!   of them run inside the same `IMMEDIATE` transaction as the write.
//! - A failed mutation leaves no partial change behind.
//! - Reserved directories exist after every successful `open`.

use crate::config::{ConfigError, DirectoryConfig};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::directory::{
    AccountRef, DirectoryId, DirectoryInfo, DirectoryRecord, DirectoryValidationError,
    ExportSupport, ReservedDirectory,
};
use crate::repo::directory_repo::{DirectoryRepository, RepoError, SqliteDirectoryRepository};
use log::{info, warn};
use rusqlite::{Connection, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Mutex;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Identity of the package issuing a catalog mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallingPackage(String);

impl CallingPackage {
    pub fn new(package: impl Into<String>) -> Self {
        Self(package.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for CallingPackage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog-level error.
#[derive(Debug)]
pub enum CatalogError {
    /// Caller does not own the record it tried to create or mutate.
    Unauthorized {
        directory_id: Option<DirectoryId>,
        calling_package: String,
        owner_package: String,
    },
    /// Reserved directories reject update and delete.
    ImmutableRecord(DirectoryId),
    NotFound(DirectoryId),
    Validation(DirectoryValidationError),
    Config(ConfigError),
    LockPoisoned,
    Repo(RepoError),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized {
                directory_id: Some(id),
                calling_package,
                owner_package,
            } => write!(
                f,
                "package `{calling_package}` may not modify directory {id} owned by `{owner_package}`"
            ),
            Self::Unauthorized {
                directory_id: None,
                calling_package,
                owner_package,
            } => write!(
                f,
                "package `{calling_package}` may not register a directory for `{owner_package}`"
            ),
            Self::ImmutableRecord(id) => write!(f, "directory {id} is reserved and immutable"),
            Self::NotFound(id) => write!(f, "directory not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::LockPoisoned => write!(f, "directory catalog lock poisoned"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<DbError> for CatalogError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

impl From<ConfigError> for CatalogError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// Shared, persisted directory catalog.
pub struct DirectoryCatalog {
    conn: Mutex<Connection>,
    contacts_package: String,
}

impl DirectoryCatalog {
    /// Opens the catalog database named by `config`, in memory when unset.
    pub fn open_with_config(config: &DirectoryConfig) -> CatalogResult<Self> {
        config.validate()?;
        let conn = match config.database_path.as_ref() {
            Some(path) => open_db(path)?,
            None => open_db_in_memory()?,
        };
        Self::open(conn, config)
    }

    /// Wraps a migrated connection and upserts the reserved directories.
    pub fn open(conn: Connection, config: &DirectoryConfig) -> CatalogResult<Self> {
        config.validate()?;
        let _ = SqliteDirectoryRepository::try_new(&conn)?;

        let catalog = Self {
            conn: Mutex::new(conn),
            contacts_package: config.contacts_package.clone(),
        };
        catalog.in_transaction(|repo| {
            for slot in ReservedDirectory::ALL {
                repo.upsert_reserved(slot, &reserved_info(slot, config))?;
            }
            Ok(())
        })?;

        info!(
            "event=catalog_open module=catalog status=ok contacts_package={} local_authority={}",
            config.contacts_package, config.local_authority
        );
        Ok(catalog)
    }

    /// Package recorded as owner of the reserved directories.
    pub fn contacts_package(&self) -> &str {
        &self.contacts_package
    }

    /// Registers a new directory owned by `caller`.
    pub fn insert(
        &self,
        info: &DirectoryInfo,
        caller: &CallingPackage,
    ) -> CatalogResult<DirectoryId> {
        if info.owner_package != caller.as_str() {
            warn!(
                "event=directory_insert module=catalog status=denied calling_package={} owner_package={}",
                caller, info.owner_package
            );
            return Err(CatalogError::Unauthorized {
                directory_id: None,
                calling_package: caller.as_str().to_string(),
                owner_package: info.owner_package.clone(),
            });
        }

        let id = self.in_transaction(|repo| Ok(repo.insert_directory(info)?))?;
        info!(
            "event=directory_insert module=catalog status=ok directory_id={} owner_package={} authority={}",
            id, info.owner_package, info.authority
        );
        Ok(id)
    }

    /// Replaces the mutable fields of a directory owned by `caller`.
    pub fn update(
        &self,
        id: DirectoryId,
        info: &DirectoryInfo,
        caller: &CallingPackage,
    ) -> CatalogResult<()> {
        self.in_transaction(|repo| {
            let stored = load_mutable(repo, id, caller, "directory_update")?;
            if info.owner_package != stored.info().owner_package {
                warn!(
                    "event=directory_update module=catalog status=denied directory_id={} reason=owner_change",
                    id
                );
                return Err(CatalogError::Unauthorized {
                    directory_id: Some(id),
                    calling_package: caller.as_str().to_string(),
                    owner_package: stored.info().owner_package.clone(),
                });
            }
            repo.update_directory(id, info)?;
            Ok(())
        })?;

        info!(
            "event=directory_update module=catalog status=ok directory_id={} authority={}",
            id, info.authority
        );
        Ok(())
    }

    /// Deletes a directory owned by `caller`.
    pub fn delete(&self, id: DirectoryId, caller: &CallingPackage) -> CatalogResult<()> {
        self.in_transaction(|repo| {
            load_mutable(repo, id, caller, "directory_delete")?;
            repo.delete_directory(id)?;
            Ok(())
        })?;

        info!(
            "event=directory_delete module=catalog status=ok directory_id={}",
            id
        );
        Ok(())
    }

    pub fn get(&self, id: DirectoryId) -> CatalogResult<Option<DirectoryRecord>> {
        self.with_repo(|repo| Ok(repo.get_directory(id)?))
    }

    /// Lists all directories, reserved ones first.
    pub fn list(&self) -> CatalogResult<Vec<DirectoryRecord>> {
        self.with_repo(|repo| Ok(repo.list_directories()?))
    }

    /// Removes every directory registered by `package`.
    pub fn remove_package_directories(&self, package: &str) -> CatalogResult<Vec<DirectoryId>> {
        self.in_transaction(|repo| Ok(repo.delete_by_owner_package(package)?))
    }

    /// Removes every directory tied to an account outside `accounts`.
    pub fn remove_orphaned_account_directories(
        &self,
        accounts: &BTreeSet<AccountRef>,
    ) -> CatalogResult<Vec<DirectoryId>> {
        self.in_transaction(|repo| Ok(repo.delete_for_missing_accounts(accounts)?))
    }

    fn with_repo<T>(
        &self,
        f: impl FnOnce(&SqliteDirectoryRepository<'_>) -> CatalogResult<T>,
    ) -> CatalogResult<T> {
        let conn = self.conn.lock().map_err(|_| CatalogError::LockPoisoned)?;
        f(&SqliteDirectoryRepository::new(&conn))
    }

    fn in_transaction<T>(
        &self,
        f: impl FnOnce(&SqliteDirectoryRepository<'_>) -> CatalogResult<T>,
    ) -> CatalogResult<T> {
        let mut conn = self.conn.lock().map_err(|_| CatalogError::LockPoisoned)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let output = f(&SqliteDirectoryRepository::new(&tx))?;
        tx.commit()?;
        Ok(output)
    }
}

fn load_mutable(
    repo: &SqliteDirectoryRepository<'_>,
    id: DirectoryId,
    caller: &CallingPackage,
    event: &str,
) -> CatalogResult<DirectoryRecord> {
    let record = repo.get_directory(id)?.ok_or(CatalogError::NotFound(id))?;

    if record.is_reserved() {
        warn!(
            "event={} module=catalog status=denied directory_id={} reason=reserved",
            event, id
        );
        return Err(CatalogError::ImmutableRecord(id));
    }

    let owner_package = &record.info().owner_package;
    if owner_package != caller.as_str() {
        warn!(
            "event={} module=catalog status=denied directory_id={} calling_package={} owner_package={}",
            event, id, caller, owner_package
        );
        return Err(CatalogError::Unauthorized {
            directory_id: Some(id),
            calling_package: caller.as_str().to_string(),
            owner_package: owner_package.clone(),
        });
    }

    Ok(record)
}

fn reserved_info(slot: ReservedDirectory, config: &DirectoryConfig) -> DirectoryInfo {
    DirectoryInfo {
        owner_package: config.contacts_package.clone(),
        authority: config.local_authority.clone(),
        display_name: None,
        type_label: Some(slot.type_label().to_string()),
        export_support: ExportSupport::None,
        account_name: None,
        account_type: None,
    }
}
