//! Resource-path facade over the catalog and the query router.
//!
//! # Responsibility
//! - Map `directories` paths to catalog CRUD.
//! - Map `contacts` paths to routed queries.
//!
//! # Invariants
//! - Writes address `directories` (insert) or `directories/{id}`
//!   (update, delete); anything else is `UnsupportedOperation`.
//! - Contacts paths are read-only.

use crate::config::DirectoryConfig;
use crate::local::LocalContactStore;
use crate::model::directory::{DirectoryInfo, DirectoryRecord};
use crate::model::query::{ContactsQuery, ResultSet};
use crate::remote::resolver::ProviderResolver;
use crate::resource::{directory_path, parse_resource_path, ResourceError, ResourcePath};
use crate::service::catalog::{CallingPackage, CatalogError, DirectoryCatalog};
use crate::service::reconciler::LifecycleReconciler;
use crate::service::router::{QueryError, QueryRouter};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type EndpointResult<T> = Result<T, EndpointError>;

/// Failure of a resource-path operation.
#[derive(Debug)]
pub enum EndpointError {
    Resource(ResourceError),
    /// Path parses but does not accept the requested operation.
    UnsupportedOperation {
        operation: &'static str,
        path: String,
    },
    Catalog(CatalogError),
    Query(QueryError),
}

impl Display for EndpointError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resource(err) => write!(f, "{err}"),
            Self::UnsupportedOperation { operation, path } => {
                write!(f, "operation `{operation}` is not supported on `{path}`")
            }
            Self::Catalog(err) => write!(f, "{err}"),
            Self::Query(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EndpointError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Resource(err) => Some(err),
            Self::UnsupportedOperation { .. } => None,
            Self::Catalog(err) => Some(err),
            Self::Query(err) => Some(err),
        }
    }
}

impl From<ResourceError> for EndpointError {
    fn from(value: ResourceError) -> Self {
        Self::Resource(value)
    }
}

impl From<CatalogError> for EndpointError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<QueryError> for EndpointError {
    fn from(value: QueryError) -> Self {
        Self::Query(value)
    }
}

/// Caller-supplied contact query parameters; target and limit come from
/// the resource path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub projection: Option<Vec<String>>,
    pub selection: Option<String>,
    pub selection_args: Option<Vec<String>>,
    pub sort_order: Option<String>,
}

/// Exposed contacts directory provider.
pub struct ContactsDirectoryProvider {
    catalog: Arc<DirectoryCatalog>,
    router: QueryRouter,
}

impl ContactsDirectoryProvider {
    pub fn new(
        catalog: Arc<DirectoryCatalog>,
        local: Arc<dyn LocalContactStore>,
        resolver: Arc<dyn ProviderResolver>,
    ) -> Self {
        let router = QueryRouter::new(Arc::clone(&catalog), local, resolver);
        Self { catalog, router }
    }

    /// Opens the catalog from `config` and wires the collaborators.
    pub fn open(
        config: &DirectoryConfig,
        local: Arc<dyn LocalContactStore>,
        resolver: Arc<dyn ProviderResolver>,
    ) -> EndpointResult<Self> {
        let catalog = Arc::new(DirectoryCatalog::open_with_config(config)?);
        Ok(Self::new(catalog, local, resolver))
    }

    pub fn catalog(&self) -> &Arc<DirectoryCatalog> {
        &self.catalog
    }

    pub fn router(&self) -> &QueryRouter {
        &self.router
    }

    /// Returns a reconciler bound to the same catalog.
    pub fn lifecycle_reconciler(&self) -> LifecycleReconciler {
        LifecycleReconciler::new(Arc::clone(&self.catalog))
    }

    /// Registers a directory and returns its item path.
    pub fn insert(
        &self,
        path: &str,
        info: &DirectoryInfo,
        caller: &CallingPackage,
    ) -> EndpointResult<String> {
        match parse_resource_path(path)? {
            ResourcePath::Directories => {
                let id = self.catalog.insert(info, caller)?;
                Ok(directory_path(id))
            }
            _ => Err(unsupported("insert", path)),
        }
    }

    /// Updates one directory; returns the number of rows changed.
    pub fn update(
        &self,
        path: &str,
        info: &DirectoryInfo,
        caller: &CallingPackage,
    ) -> EndpointResult<usize> {
        match parse_resource_path(path)? {
            ResourcePath::Directory(id) => {
                self.catalog.update(id, info, caller)?;
                Ok(1)
            }
            _ => Err(unsupported("update", path)),
        }
    }

    /// Deletes one directory; returns the number of rows removed.
    pub fn delete(&self, path: &str, caller: &CallingPackage) -> EndpointResult<usize> {
        match parse_resource_path(path)? {
            ResourcePath::Directory(id) => {
                self.catalog.delete(id, caller)?;
                Ok(1)
            }
            _ => Err(unsupported("delete", path)),
        }
    }

    /// Lists all directories or fetches one by item path.
    pub fn query_directories(&self, path: &str) -> EndpointResult<Vec<DirectoryRecord>> {
        match parse_resource_path(path)? {
            ResourcePath::Directories => Ok(self.catalog.list()?),
            ResourcePath::Directory(id) => Ok(self.catalog.get(id)?.into_iter().collect()),
            ResourcePath::Contacts(_) => Err(unsupported("query_directories", path)),
        }
    }

    /// Runs a contacts query against the directory selected by `path`.
    pub fn query_contacts(&self, path: &str, params: QueryParams) -> EndpointResult<ResultSet> {
        let ResourcePath::Contacts(resource) = parse_resource_path(path)? else {
            return Err(unsupported("query_contacts", path));
        };

        let query = ContactsQuery {
            target: resource.target,
            projection: params.projection,
            selection: params.selection,
            selection_args: params.selection_args,
            sort_order: params.sort_order,
            limit: resource.limit,
        };
        debug!(
            "event=contacts_query module=provider status=start directory_id={:?}",
            resource.selector
        );
        Ok(self.router.query(resource.selector, &query)?)
    }
}

fn unsupported(operation: &'static str, path: &str) -> EndpointError {
    EndpointError::UnsupportedOperation {
        operation,
        path: path.to_string(),
    }
}
