//! Provider resolution by authority.

use crate::remote::RemoteDirectory;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Resolves an authority to a callable provider endpoint.
pub trait ProviderResolver: Send + Sync {
    fn resolve(&self, authority: &str) -> Option<Arc<dyn RemoteDirectory>>;
}

/// Provider registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderRegistryError {
    InvalidAuthority(String),
    DuplicateAuthority(String),
    AuthorityNotFound(String),
}

impl Display for ProviderRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAuthority(value) => write!(f, "provider authority is invalid: {value}"),
            Self::DuplicateAuthority(value) => {
                write!(f, "provider authority already registered: {value}")
            }
            Self::AuthorityNotFound(value) => write!(f, "provider authority not found: {value}"),
        }
    }
}

impl Error for ProviderRegistryError {}

/// In-process registry of provider endpoints keyed by authority.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn RemoteDirectory>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one provider endpoint under `authority`.
    pub fn register(
        &mut self,
        authority: &str,
        provider: Arc<dyn RemoteDirectory>,
    ) -> Result<(), ProviderRegistryError> {
        let authority = authority.trim().to_string();
        if !is_valid_authority(&authority) {
            return Err(ProviderRegistryError::InvalidAuthority(authority));
        }
        if self.providers.contains_key(authority.as_str()) {
            return Err(ProviderRegistryError::DuplicateAuthority(authority));
        }

        self.providers.insert(authority, provider);
        Ok(())
    }

    /// Removes the endpoint registered under `authority`.
    pub fn unregister(&mut self, authority: &str) -> Result<(), ProviderRegistryError> {
        let normalized = authority.trim();
        match self.providers.remove(normalized) {
            Some(_) => Ok(()),
            None => Err(ProviderRegistryError::AuthorityNotFound(
                normalized.to_string(),
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Returns sorted authorities.
    pub fn authorities(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

impl ProviderResolver for ProviderRegistry {
    fn resolve(&self, authority: &str) -> Option<Arc<dyn RemoteDirectory>> {
        self.providers.get(authority.trim()).cloned()
    }
}

fn is_valid_authority(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
}
