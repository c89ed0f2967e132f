//! External directory provider boundary.
//!
//! # Responsibility
//! - Define the callable contract of a remote directory provider.
//! - Resolve provider endpoints by authority and relay queries to them.
//!
//! # Invariants
//! - Query parameters reach the provider exactly as the caller sent them.
//! - Provider failures are surfaced unchanged and never retried here.

pub mod forwarder;
pub mod resolver;

use crate::model::directory::AccountRef;
use crate::model::query::{ContactsQuery, ResultSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Request handed to a remote directory provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedQuery {
    /// Correlates forwarder and provider log events.
    pub request_id: Uuid,
    pub authority: String,
    /// Account the directory is tied to, if any.
    pub account: Option<AccountRef>,
    /// Caller query, untouched.
    pub query: ContactsQuery,
}

/// Failure reported by a remote provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFailure {
    pub code: String,
    pub message: String,
}

impl RemoteFailure {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl Display for RemoteFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for RemoteFailure {}

/// Callable query endpoint of one external directory provider.
pub trait RemoteDirectory: Send + Sync {
    fn query(&self, request: &ForwardedQuery) -> Result<ResultSet, RemoteFailure>;
}
