//! Local contact storage boundary.
//!
//! The local contacts query engine lives outside this crate. The router only
//! picks which visibility partition to read.

use crate::model::query::{ContactsQuery, ResultSet, Visibility};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure reported by the local contact store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalStoreError {
    pub message: String,
}

impl LocalStoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for LocalStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "local contact store failed: {}", self.message)
    }
}

impl Error for LocalStoreError {}

/// Query service over device-local contacts.
pub trait LocalContactStore: Send + Sync {
    /// Runs `query` against one visibility partition.
    fn query(
        &self,
        visibility: Visibility,
        query: &ContactsQuery,
    ) -> Result<ResultSet, LocalStoreError>;

    /// Returns the current partition of one contact, `None` when unknown.
    fn contact_visibility(&self, contact_id: i64) -> Result<Option<Visibility>, LocalStoreError>;
}
