#![allow(dead_code)]

use contacts_directory_core::{
    ContactsQuery, DirectoryCatalog, DirectoryConfig, ForwardedQuery, LocalContactStore,
    LocalStoreError, QueryTarget, RemoteDirectory, RemoteFailure, ResultSet, Visibility,
};
use rusqlite::types::Value;
use std::sync::{Arc, Mutex};

pub const EXCHANGE_PACKAGE: &str = "com.example.exchange";
pub const EXCHANGE_AUTHORITY: &str = "com.example.exchange.directory";

pub fn open_catalog() -> Arc<DirectoryCatalog> {
    Arc::new(DirectoryCatalog::open_with_config(&DirectoryConfig::default()).unwrap())
}

pub struct FakeContact {
    pub id: i64,
    pub name: &'static str,
    pub visible: bool,
}

/// Local store over a fixed contact list.
pub struct FakeLocalContacts {
    contacts: Vec<FakeContact>,
}

impl FakeLocalContacts {
    pub fn new(contacts: Vec<FakeContact>) -> Self {
        Self { contacts }
    }

    pub fn sample() -> Self {
        Self::new(vec![
            FakeContact {
                id: 1,
                name: "Ada Lovelace",
                visible: true,
            },
            FakeContact {
                id: 2,
                name: "Grace Hopper",
                visible: true,
            },
            FakeContact {
                id: 3,
                name: "Hidden Harry",
                visible: false,
            },
        ])
    }
}

impl LocalContactStore for FakeLocalContacts {
    fn query(
        &self,
        visibility: Visibility,
        query: &ContactsQuery,
    ) -> Result<ResultSet, LocalStoreError> {
        let wanted_visible = visibility == Visibility::Visible;
        let needle = match &query.target {
            QueryTarget::Contacts => None,
            QueryTarget::Filter(text) => Some(text.to_lowercase()),
        };

        let mut result = ResultSet::new(["_id", "display_name"]);
        let matching = self
            .contacts
            .iter()
            .filter(|contact| contact.visible == wanted_visible)
            .filter(|contact| {
                needle
                    .as_deref()
                    .map_or(true, |text| contact.name.to_lowercase().contains(text))
            })
            .take(query.limit.map_or(usize::MAX, |limit| limit as usize));
        for contact in matching {
            result
                .push_row(vec![
                    Value::Integer(contact.id),
                    Value::Text(contact.name.to_string()),
                ])
                .map_err(|err| LocalStoreError::new(err.to_string()))?;
        }
        Ok(result)
    }

    fn contact_visibility(&self, contact_id: i64) -> Result<Option<Visibility>, LocalStoreError> {
        Ok(self
            .contacts
            .iter()
            .find(|contact| contact.id == contact_id)
            .map(|contact| {
                if contact.visible {
                    Visibility::Visible
                } else {
                    Visibility::Hidden
                }
            }))
    }
}

/// Remote provider that echoes the forwarded parameters as one row.
#[derive(Default)]
pub struct EchoDirectory {
    pub requests: Mutex<Vec<ForwardedQuery>>,
}

impl RemoteDirectory for EchoDirectory {
    fn query(&self, request: &ForwardedQuery) -> Result<ResultSet, RemoteFailure> {
        self.requests.lock().unwrap().push(request.clone());

        let query = &request.query;
        let mut result = ResultSet::new([
            "projection",
            "selection",
            "selection_args",
            "sort_order",
            "account_name",
        ]);
        let row = vec![
            optional_list(query.projection.as_deref()),
            optional_text(query.selection.as_deref()),
            optional_list(query.selection_args.as_deref()),
            optional_text(query.sort_order.as_deref()),
            optional_text(request.account.as_ref().map(|account| account.name.as_str())),
        ];
        result
            .push_row(row)
            .map_err(|err| RemoteFailure::new("shape", err.to_string()))?;
        Ok(result)
    }
}

/// Remote provider that always fails.
pub struct FailingDirectory;

impl RemoteDirectory for FailingDirectory {
    fn query(&self, _request: &ForwardedQuery) -> Result<ResultSet, RemoteFailure> {
        Err(RemoteFailure::new("unavailable", "provider offline"))
    }
}

fn optional_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

fn optional_list(values: Option<&[String]>) -> Value {
    values.map_or(Value::Null, |items| {
        Value::Text(format!("[{}]", items.join(", ")))
    })
}
