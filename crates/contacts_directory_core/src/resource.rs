//! Resource paths of the exposed directory and contacts endpoints.
//!
//! Supported shapes:
//! - `directories`
//! - `directories/{id}`
//! - `contacts[?directory={id}][&limit={n}]`
//! - `contacts/filter/{text}[?directory={id}][&limit={n}]`
//!
//! The filter segment is percent-decoded; parameters are decoded as
//! `application/x-www-form-urlencoded`. Each parameter may appear once.

use crate::model::directory::DirectoryId;
use crate::model::query::QueryTarget;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::error::Error;
use std::fmt::{Display, Formatter};
use url::form_urlencoded;

/// Query parameter carrying the directory selector.
pub const DIRECTORY_PARAM: &str = "directory";
/// Query parameter carrying the row limit.
pub const LIMIT_PARAM: &str = "limit";

static DIRECTORIES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^directories/?$").expect("valid directories regex"));
static DIRECTORY_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^directories/(\d+)$").expect("valid directory item regex"));
static CONTACTS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^contacts/?$").expect("valid contacts regex"));
static CONTACTS_FILTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^contacts/filter/([^/]+)$").expect("valid contacts filter regex"));

/// Parsed resource path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourcePath {
    Directories,
    Directory(DirectoryId),
    Contacts(ContactsResource),
}

/// Contacts collection addressed by a path, with routing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactsResource {
    pub target: QueryTarget,
    pub selector: Option<DirectoryId>,
    pub limit: Option<u32>,
}

/// Resource path parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    UnsupportedPath(String),
    InvalidParameter { name: String, value: String },
    /// Parameter is unknown for the path or given more than once.
    UnexpectedParameter(String),
    /// Path segment does not decode to UTF-8.
    InvalidEncoding(String),
}

impl Display for ResourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedPath(path) => write!(f, "unsupported resource path `{path}`"),
            Self::InvalidParameter { name, value } => {
                write!(f, "invalid value `{value}` for parameter `{name}`")
            }
            Self::UnexpectedParameter(name) => write!(f, "unexpected parameter `{name}`"),
            Self::InvalidEncoding(segment) => {
                write!(f, "path segment `{segment}` is not valid percent-encoded UTF-8")
            }
        }
    }
}

impl Error for ResourceError {}

/// Returns the item path of one directory.
pub fn directory_path(id: DirectoryId) -> String {
    format!("directories/{id}")
}

/// Parses a resource path with optional query string.
pub fn parse_resource_path(raw: &str) -> Result<ResourcePath, ResourceError> {
    let trimmed = raw.trim().trim_start_matches('/');
    let (path, query) = match trimmed.split_once('?') {
        Some((path, query)) => (path, query),
        None => (trimmed, ""),
    };
    let params: Vec<(Cow<'_, str>, Cow<'_, str>)> =
        form_urlencoded::parse(query.as_bytes()).collect();

    if DIRECTORIES_RE.is_match(path) {
        reject_params(&params)?;
        return Ok(ResourcePath::Directories);
    }

    if let Some(caps) = DIRECTORY_ITEM_RE.captures(path) {
        reject_params(&params)?;
        let id = parse_number::<DirectoryId>("id", &caps[1])?;
        return Ok(ResourcePath::Directory(id));
    }

    let target = if CONTACTS_RE.is_match(path) {
        QueryTarget::Contacts
    } else if let Some(caps) = CONTACTS_FILTER_RE.captures(path) {
        QueryTarget::Filter(decode_segment(&caps[1])?)
    } else {
        return Err(ResourceError::UnsupportedPath(path.to_string()));
    };

    let mut resource = ContactsResource {
        target,
        selector: None,
        limit: None,
    };
    for (name, value) in &params {
        match &**name {
            DIRECTORY_PARAM if resource.selector.is_none() => {
                resource.selector = Some(parse_number(name, value)?);
            }
            LIMIT_PARAM if resource.limit.is_none() => {
                resource.limit = Some(parse_number(name, value)?);
            }
            other => return Err(ResourceError::UnexpectedParameter(other.to_string())),
        }
    }
    Ok(ResourcePath::Contacts(resource))
}

/// Percent-decodes one path segment. `+` stays literal.
fn decode_segment(segment: &str) -> Result<String, ResourceError> {
    urlencoding::decode(segment)
        .map(Cow::into_owned)
        .map_err(|_| ResourceError::InvalidEncoding(segment.to_string()))
}

fn reject_params(params: &[(Cow<'_, str>, Cow<'_, str>)]) -> Result<(), ResourceError> {
    match params.first() {
        Some((name, _)) => Err(ResourceError::UnexpectedParameter(name.to_string())),
        None => Ok(()),
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ResourceError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ResourceError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
        })
}
