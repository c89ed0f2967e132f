//! Directory catalog domain model.
//!
//! # Responsibility
//! - Define the catalog record for local and external contact directories.
//! - Separate the two reserved local directories from caller-registered ones.
//!
//! # Invariants
//! - `DEFAULT_DIRECTORY_ID` and `LOCAL_INVISIBLE_DIRECTORY_ID` always exist.
//! - User-defined records carry a non-empty owner package and authority.
//! - Account name and type are either both set or both absent.

use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable integer identifier of one directory row.
pub type DirectoryId = i64;

/// Well-known id of the local directory holding visible contacts.
pub const DEFAULT_DIRECTORY_ID: DirectoryId = 0;
/// Well-known id of the local directory holding hidden contacts.
pub const LOCAL_INVISIBLE_DIRECTORY_ID: DirectoryId = 1;

/// How freely results of a directory may be exported to other accounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportSupport {
    /// Results must not be exported.
    #[default]
    None,
    /// Results may be copied into the directory's own account only.
    SameAccountOnly,
    /// Results may be copied into any account.
    AnyAccount,
}

impl ExportSupport {
    /// Integer code persisted in `directories.export_support`.
    pub fn as_code(self) -> i64 {
        match self {
            Self::None => 0,
            Self::SameAccountOnly => 1,
            Self::AnyAccount => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::SameAccountOnly),
            2 => Some(Self::AnyAccount),
            _ => None,
        }
    }
}

/// User account a directory is tied to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountRef {
    pub name: String,
    pub account_type: String,
}

impl AccountRef {
    pub fn new(name: impl Into<String>, account_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            account_type: account_type.into(),
        }
    }
}

/// The two local directories materialized at catalog initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservedDirectory {
    /// Local contacts currently in a visible group.
    Default,
    /// Local contacts outside every visible group.
    LocalInvisible,
}

impl ReservedDirectory {
    pub const ALL: [Self; 2] = [Self::Default, Self::LocalInvisible];

    pub fn id(self) -> DirectoryId {
        match self {
            Self::Default => DEFAULT_DIRECTORY_ID,
            Self::LocalInvisible => LOCAL_INVISIBLE_DIRECTORY_ID,
        }
    }

    pub fn from_id(id: DirectoryId) -> Option<Self> {
        match id {
            DEFAULT_DIRECTORY_ID => Some(Self::Default),
            LOCAL_INVISIBLE_DIRECTORY_ID => Some(Self::LocalInvisible),
            _ => None,
        }
    }

    /// Fixed type label stored for the reserved row.
    pub fn type_label(self) -> &'static str {
        match self {
            Self::Default => "default_directory",
            Self::LocalInvisible => "local_invisible_directory",
        }
    }
}

/// Mutable field set of a directory row.
///
/// Used both as insert payload and as full-replacement update payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryInfo {
    /// Package that registered the directory. Immutable after creation.
    pub owner_package: String,
    /// Authority of the provider serving this directory.
    pub authority: String,
    pub display_name: Option<String>,
    pub type_label: Option<String>,
    pub export_support: ExportSupport,
    pub account_name: Option<String>,
    pub account_type: Option<String>,
}

impl DirectoryInfo {
    /// Creates a field set with every optional field absent.
    pub fn new(owner_package: impl Into<String>, authority: impl Into<String>) -> Self {
        Self {
            owner_package: owner_package.into(),
            authority: authority.into(),
            display_name: None,
            type_label: None,
            export_support: ExportSupport::None,
            account_name: None,
            account_type: None,
        }
    }

    /// Ties this directory to `account`.
    pub fn with_account(mut self, account: &AccountRef) -> Self {
        self.account_name = Some(account.name.clone());
        self.account_type = Some(account.account_type.clone());
        self
    }

    /// Returns the tied account when both name and type are present.
    pub fn account(&self) -> Option<AccountRef> {
        match (self.account_name.as_ref(), self.account_type.as_ref()) {
            (Some(name), Some(account_type)) => {
                Some(AccountRef::new(name.as_str(), account_type.as_str()))
            }
            _ => None,
        }
    }

    /// Validates caller-provided fields before persistence.
    pub fn validate(&self) -> Result<(), DirectoryValidationError> {
        if self.owner_package.trim().is_empty() {
            return Err(DirectoryValidationError::EmptyOwnerPackage);
        }
        if self.authority.trim().is_empty() {
            return Err(DirectoryValidationError::EmptyAuthority);
        }
        if self.account_name.is_some() != self.account_type.is_some() {
            return Err(DirectoryValidationError::PartialAccount);
        }
        Ok(())
    }
}

/// One row of the directory catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DirectoryRecord {
    Reserved {
        slot: ReservedDirectory,
        info: DirectoryInfo,
    },
    UserDefined {
        id: DirectoryId,
        info: DirectoryInfo,
    },
}

impl DirectoryRecord {
    /// Builds a record, classifying reserved ids automatically.
    pub fn from_parts(id: DirectoryId, info: DirectoryInfo) -> Self {
        match ReservedDirectory::from_id(id) {
            Some(slot) => Self::Reserved { slot, info },
            None => Self::UserDefined { id, info },
        }
    }

    pub fn id(&self) -> DirectoryId {
        match self {
            Self::Reserved { slot, .. } => slot.id(),
            Self::UserDefined { id, .. } => *id,
        }
    }

    pub fn info(&self) -> &DirectoryInfo {
        match self {
            Self::Reserved { info, .. } | Self::UserDefined { info, .. } => info,
        }
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self, Self::Reserved { .. })
    }
}

/// Field validation errors for directory payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryValidationError {
    EmptyOwnerPackage,
    EmptyAuthority,
    PartialAccount,
}

impl Display for DirectoryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyOwnerPackage => write!(f, "owner_package must not be empty"),
            Self::EmptyAuthority => write!(f, "authority must not be empty"),
            Self::PartialAccount => write!(
                f,
                "account_name and account_type must be set together or both left empty"
            ),
        }
    }
}

impl Error for DirectoryValidationError {}

#[cfg(test)]
mod tests {
    use super::{
        AccountRef, DirectoryInfo, DirectoryRecord, DirectoryValidationError, ExportSupport,
        ReservedDirectory, DEFAULT_DIRECTORY_ID,
    };

    #[test]
    fn from_parts_classifies_reserved_ids() {
        let info = DirectoryInfo::new("pkg", "auth");
        let record = DirectoryRecord::from_parts(DEFAULT_DIRECTORY_ID, info.clone());
        assert!(matches!(
            record,
            DirectoryRecord::Reserved {
                slot: ReservedDirectory::Default,
                ..
            }
        ));

        let record = DirectoryRecord::from_parts(7, info);
        assert!(!record.is_reserved());
        assert_eq!(record.id(), 7);
    }

    #[test]
    fn validate_rejects_half_set_account() {
        let mut info = DirectoryInfo::new("pkg", "auth");
        info.account_name = Some("name".to_string());
        assert_eq!(
            info.validate(),
            Err(DirectoryValidationError::PartialAccount)
        );
        assert!(info.account().is_none());

        let info = DirectoryInfo::new("pkg", "auth").with_account(&AccountRef::new("n", "t"));
        info.validate().expect("full account should validate");
        assert_eq!(info.account(), Some(AccountRef::new("n", "t")));
    }

    #[test]
    fn validate_rejects_blank_identity_fields() {
        assert_eq!(
            DirectoryInfo::new("  ", "auth").validate(),
            Err(DirectoryValidationError::EmptyOwnerPackage)
        );
        assert_eq!(
            DirectoryInfo::new("pkg", "").validate(),
            Err(DirectoryValidationError::EmptyAuthority)
        );
    }

    #[test]
    fn record_serializes_with_kind_tag() {
        let reserved = DirectoryRecord::from_parts(
            DEFAULT_DIRECTORY_ID,
            DirectoryInfo::new("com.example.contacts", "contacts"),
        );
        let value = serde_json::to_value(&reserved).expect("record should serialize");
        assert_eq!(value["kind"], "reserved");
        assert_eq!(value["slot"], "default");
        assert_eq!(value["info"]["export_support"], "none");
        assert!(value["info"]["account_name"].is_null());

        let info = DirectoryInfo::new("pkg", "auth").with_account(&AccountRef::new("n", "t"));
        let value = serde_json::to_value(DirectoryRecord::from_parts(9, info))
            .expect("record should serialize");
        assert_eq!(value["kind"], "user_defined");
        assert_eq!(value["id"], 9);
        assert_eq!(value["info"]["account_type"], "t");
    }

    #[test]
    fn export_support_codes_are_stable() {
        for value in [
            ExportSupport::None,
            ExportSupport::SameAccountOnly,
            ExportSupport::AnyAccount,
        ] {
            assert_eq!(ExportSupport::from_code(value.as_code()), Some(value));
        }
        assert_eq!(ExportSupport::from_code(9), None);
    }
}
