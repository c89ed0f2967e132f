//! Query routing between local storage and remote providers.
//!
//! # Responsibility
//! - Resolve an optional directory selector through the catalog.
//! - Send reserved directories to local storage with the matching
//!   visibility partition and everything else to the remote forwarder.
//!
//! # Invariants
//! - An absent selector means `DEFAULT_DIRECTORY_ID`.
//! - The catalog lock is released before local or remote work starts.
//! - Results are returned whole or not at all.

use crate::local::{LocalContactStore, LocalStoreError};
use crate::model::directory::{
    AccountRef, DirectoryId, DirectoryRecord, ReservedDirectory, DEFAULT_DIRECTORY_ID,
};
use crate::model::query::{ContactsQuery, ResultSet, Visibility};
use crate::remote::forwarder::{ForwardingError, RemoteForwarder};
use crate::remote::resolver::ProviderResolver;
use crate::service::catalog::{CatalogError, DirectoryCatalog};
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type QueryResult<T> = Result<T, QueryError>;

/// Routed query failure.
#[derive(Debug)]
pub enum QueryError {
    /// Selector does not name any catalog entry.
    UnknownDirectory(DirectoryId),
    Catalog(CatalogError),
    Local(LocalStoreError),
    Forwarding(ForwardingError),
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownDirectory(id) => write!(f, "unknown directory: {id}"),
            Self::Catalog(err) => write!(f, "{err}"),
            Self::Local(err) => write!(f, "{err}"),
            Self::Forwarding(err) => write!(f, "{err}"),
        }
    }
}

impl Error for QueryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnknownDirectory(_) => None,
            Self::Catalog(err) => Some(err),
            Self::Local(err) => Some(err),
            Self::Forwarding(err) => Some(err),
        }
    }
}

impl From<CatalogError> for QueryError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<LocalStoreError> for QueryError {
    fn from(value: LocalStoreError) -> Self {
        Self::Local(value)
    }
}

impl From<ForwardingError> for QueryError {
    fn from(value: ForwardingError) -> Self {
        Self::Forwarding(value)
    }
}

/// Destination chosen for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Local(Visibility),
    Remote {
        authority: String,
        account: Option<AccountRef>,
    },
}

/// Dispatches contact queries to the source behind a directory.
#[derive(Clone)]
pub struct QueryRouter {
    catalog: Arc<DirectoryCatalog>,
    local: Arc<dyn LocalContactStore>,
    forwarder: RemoteForwarder,
}

impl QueryRouter {
    pub fn new(
        catalog: Arc<DirectoryCatalog>,
        local: Arc<dyn LocalContactStore>,
        resolver: Arc<dyn ProviderResolver>,
    ) -> Self {
        Self {
            catalog,
            local,
            forwarder: RemoteForwarder::new(resolver),
        }
    }

    /// Resolves `selector` to a route without running the query.
    pub fn route(&self, selector: Option<DirectoryId>) -> QueryResult<Route> {
        let id = selector.unwrap_or(DEFAULT_DIRECTORY_ID);
        let Some(record) = self.catalog.get(id)? else {
            warn!(
                "event=directory_route module=router status=error directory_id={} error_code=unknown_directory",
                id
            );
            return Err(QueryError::UnknownDirectory(id));
        };

        let route = match record {
            DirectoryRecord::Reserved {
                slot: ReservedDirectory::Default,
                ..
            } => Route::Local(Visibility::Visible),
            DirectoryRecord::Reserved {
                slot: ReservedDirectory::LocalInvisible,
                ..
            } => Route::Local(Visibility::Hidden),
            DirectoryRecord::UserDefined { info, .. } => Route::Remote {
                account: info.account(),
                authority: info.authority,
            },
        };
        debug!(
            "event=directory_route module=router status=ok directory_id={} route={:?}",
            id, route
        );
        Ok(route)
    }

    /// Runs `query` against the directory named by `selector`.
    pub fn query(
        &self,
        selector: Option<DirectoryId>,
        query: &ContactsQuery,
    ) -> QueryResult<ResultSet> {
        match self.route(selector)? {
            Route::Local(visibility) => Ok(self.local.query(visibility, query)?),
            Route::Remote { authority, account } => {
                Ok(self.forwarder.forward(&authority, account, query)?)
            }
        }
    }

    /// Returns the local directory a contact currently belongs to.
    pub fn directory_for_contact(&self, contact_id: i64) -> QueryResult<Option<ReservedDirectory>> {
        let visibility = self.local.contact_visibility(contact_id)?;
        Ok(visibility.map(|value| match value {
            Visibility::Visible => ReservedDirectory::Default,
            Visibility::Hidden => ReservedDirectory::LocalInvisible,
        }))
    }
}
