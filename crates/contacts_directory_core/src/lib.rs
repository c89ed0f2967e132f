//! Contacts directory registry and query-forwarding engine.
//! This crate is the single source of truth for catalog ownership rules.

pub mod config;
pub mod db;
pub mod local;
pub mod logging;
pub mod model;
pub mod remote;
pub mod repo;
pub mod resource;
pub mod service;

pub use config::{ConfigError, DirectoryConfig};
pub use local::{LocalContactStore, LocalStoreError};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::directory::{
    AccountRef, DirectoryId, DirectoryInfo, DirectoryRecord, DirectoryValidationError,
    ExportSupport, ReservedDirectory, DEFAULT_DIRECTORY_ID, LOCAL_INVISIBLE_DIRECTORY_ID,
};
pub use model::query::{ContactsQuery, QueryTarget, ResultSet, RowShapeError, Visibility};
pub use remote::forwarder::{ForwardingError, RemoteForwarder};
pub use remote::resolver::{ProviderRegistry, ProviderRegistryError, ProviderResolver};
pub use remote::{ForwardedQuery, RemoteDirectory, RemoteFailure};
pub use repo::directory_repo::{
    DirectoryRepository, RepoError, RepoResult, SqliteDirectoryRepository,
};
pub use resource::{parse_resource_path, ContactsResource, ResourceError, ResourcePath};
pub use service::catalog::{CallingPackage, CatalogError, CatalogResult, DirectoryCatalog};
pub use service::provider::{ContactsDirectoryProvider, EndpointError, QueryParams};
pub use service::reconciler::{LifecycleEvent, LifecycleListener, LifecycleReconciler};
pub use service::router::{QueryError, QueryRouter, Route};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
