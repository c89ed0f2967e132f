//! Lifecycle reconciliation of the directory catalog.
//!
//! The host delivers account and package lifecycle events through
//! [`LifecycleListener`]; each event prunes the catalog in one transaction.
//!
//! # Invariants
//! - Handlers are idempotent.
//! - Reserved directories survive every event.

use crate::model::directory::AccountRef;
use crate::service::catalog::{CatalogResult, DirectoryCatalog};
use log::info;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Host lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Full set of accounts currently present on the device.
    AccountsChanged(Vec<AccountRef>),
    PackageUninstalled(String),
}

/// Receiver of host lifecycle notifications.
///
/// Returned counts are the number of catalog rows removed.
pub trait LifecycleListener {
    fn on_accounts_changed(&self, current_accounts: &[AccountRef]) -> CatalogResult<usize>;
    fn on_package_uninstalled(&self, package: &str) -> CatalogResult<usize>;
}

/// Prunes catalog rows whose account or owner package disappeared.
pub struct LifecycleReconciler {
    catalog: Arc<DirectoryCatalog>,
}

impl LifecycleReconciler {
    pub fn new(catalog: Arc<DirectoryCatalog>) -> Self {
        Self { catalog }
    }

    /// Dispatches one event to the matching handler.
    pub fn handle(&self, event: &LifecycleEvent) -> CatalogResult<usize> {
        match event {
            LifecycleEvent::AccountsChanged(accounts) => self.on_accounts_changed(accounts),
            LifecycleEvent::PackageUninstalled(package) => self.on_package_uninstalled(package),
        }
    }
}

impl LifecycleListener for LifecycleReconciler {
    fn on_accounts_changed(&self, current_accounts: &[AccountRef]) -> CatalogResult<usize> {
        let accounts: BTreeSet<AccountRef> = current_accounts.iter().cloned().collect();
        let removed = self.catalog.remove_orphaned_account_directories(&accounts)?;
        info!(
            "event=accounts_changed module=reconciler status=ok accounts={} removed={} removed_ids={:?}",
            accounts.len(),
            removed.len(),
            removed
        );
        Ok(removed.len())
    }

    fn on_package_uninstalled(&self, package: &str) -> CatalogResult<usize> {
        let removed = self.catalog.remove_package_directories(package)?;
        info!(
            "event=package_uninstalled module=reconciler status=ok package={} removed={} removed_ids={:?}",
            package,
            removed.len(),
            removed
        );
        Ok(removed.len())
    }
}
