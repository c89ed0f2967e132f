//! Remote query forwarding.
//!
//! # Invariants
//! - The caller query is cloned into the forwarded request, never rewritten.
//! - The provider result set is returned as produced, including column order.
//! - One forward is one synchronous call; no retries.

use crate::model::directory::AccountRef;
use crate::model::query::{ContactsQuery, ResultSet};
use crate::remote::resolver::ProviderResolver;
use crate::remote::{ForwardedQuery, RemoteFailure};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Forwarding failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardingError {
    /// No provider endpoint is registered for the authority.
    UnresolvedAuthority(String),
    /// The provider answered with its own failure.
    Remote {
        authority: String,
        failure: RemoteFailure,
    },
}

impl Display for ForwardingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnresolvedAuthority(authority) => {
                write!(f, "no directory provider for authority `{authority}`")
            }
            Self::Remote { authority, failure } => {
                write!(f, "directory provider `{authority}` failed: {failure}")
            }
        }
    }
}

impl Error for ForwardingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnresolvedAuthority(_) => None,
            Self::Remote { failure, .. } => Some(failure),
        }
    }
}

/// Relays contact queries to external directory providers.
#[derive(Clone)]
pub struct RemoteForwarder {
    resolver: Arc<dyn ProviderResolver>,
}

impl RemoteForwarder {
    pub fn new(resolver: Arc<dyn ProviderResolver>) -> Self {
        Self { resolver }
    }

    /// Forwards `query` to the provider registered for `authority`.
    pub fn forward(
        &self,
        authority: &str,
        account: Option<AccountRef>,
        query: &ContactsQuery,
    ) -> Result<ResultSet, ForwardingError> {
        let started_at = Instant::now();
        let request_id = Uuid::new_v4();

        let Some(provider) = self.resolver.resolve(authority) else {
            warn!(
                "event=directory_forward module=remote status=error request_id={} authority={} error_code=authority_unresolved",
                request_id, authority
            );
            return Err(ForwardingError::UnresolvedAuthority(authority.to_string()));
        };

        let request = ForwardedQuery {
            request_id,
            authority: authority.to_string(),
            account,
            query: query.clone(),
        };

        match provider.query(&request) {
            Ok(result) => {
                info!(
                    "event=directory_forward module=remote status=ok request_id={} authority={} rows={} duration_ms={}",
                    request_id,
                    authority,
                    result.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(result)
            }
            Err(failure) => {
                warn!(
                    "event=directory_forward module=remote status=error request_id={} authority={} error_code={} duration_ms={}",
                    request_id,
                    authority,
                    failure.code,
                    started_at.elapsed().as_millis()
                );
                Err(ForwardingError::Remote {
                    authority: authority.to_string(),
                    failure,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ForwardingError, RemoteForwarder};
    use crate::model::directory::AccountRef;
    use crate::model::query::{ContactsQuery, ResultSet};
    use crate::remote::resolver::ProviderRegistry;
    use crate::remote::{ForwardedQuery, RemoteDirectory, RemoteFailure};
    use rusqlite::types::Value;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingDirectory {
        seen: Mutex<Vec<ForwardedQuery>>,
    }

    impl RemoteDirectory for RecordingDirectory {
        fn query(&self, request: &ForwardedQuery) -> Result<ResultSet, RemoteFailure> {
            self.seen
                .lock()
                .expect("recording lock")
                .push(request.clone());
            let mut result = ResultSet::new(["b", "a"]);
            result
                .push_row(vec![Value::Null, Value::Integer(1)])
                .expect("row fits");
            Ok(result)
        }
    }

    struct FailingDirectory;

    impl RemoteDirectory for FailingDirectory {
        fn query(&self, _request: &ForwardedQuery) -> Result<ResultSet, RemoteFailure> {
            Err(RemoteFailure::new("unavailable", "ldap server down"))
        }
    }

    #[test]
    fn forwards_query_and_account_verbatim() {
        let directory = Arc::new(RecordingDirectory::default());
        let mut registry = ProviderRegistry::new();
        registry
            .register("corp", directory.clone())
            .expect("provider should register");
        let forwarder = RemoteForwarder::new(Arc::new(registry));

        let query = ContactsQuery::contacts()
            .with_projection(["f1"])
            .with_selection("x = ?", ["1"]);
        let account = AccountRef::new("me@corp", "corp.account");
        let result = forwarder
            .forward("corp", Some(account.clone()), &query)
            .expect("forward should succeed");

        assert_eq!(result.columns(), ["b", "a"]);
        let seen = directory.seen.lock().expect("recording lock");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].query, query);
        assert_eq!(seen[0].account, Some(account));
        assert_eq!(seen[0].authority, "corp");
    }

    #[test]
    fn unresolved_authority_is_reported() {
        let forwarder = RemoteForwarder::new(Arc::new(ProviderRegistry::new()));
        let err = forwarder
            .forward("missing", None, &ContactsQuery::contacts())
            .expect_err("unregistered authority must fail");
        assert_eq!(
            err,
            ForwardingError::UnresolvedAuthority("missing".to_string())
        );
    }

    #[test]
    fn remote_failure_is_propagated_unchanged() {
        let mut registry = ProviderRegistry::new();
        registry
            .register("corp", Arc::new(FailingDirectory))
            .expect("provider should register");
        let forwarder = RemoteForwarder::new(Arc::new(registry));

        let err = forwarder
            .forward("corp", None, &ContactsQuery::contacts())
            .expect_err("provider failure must surface");
        match err {
            ForwardingError::Remote { authority, failure } => {
                assert_eq!(authority, "corp");
                assert_eq!(
                    failure,
                    RemoteFailure::new("unavailable", "ldap server down")
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
