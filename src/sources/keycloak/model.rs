use crate::core::event::{AdminEvent, AuthDetails, OperationType, ParseOperationTypeError, UserEvent};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// User event as exported by the identity server.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEventRecord {
    pub time: Option<i64>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub realm_id: String,
    pub client_id: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub ip_address: Option<String>,
    pub error: Option<String>,
    pub details: Option<BTreeMap<String, Option<String>>>,
}

/// Admin event as exported by the identity server.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminEventRecord {
    pub time: Option<i64>,
    pub realm_id: String,
    /// Missing and `null` both read as an anonymous actor.
    pub auth_details: Option<AuthDetailsRecord>,
    pub operation_type: String,
    pub resource_type: Option<String>,
    pub resource_path: Option<String>,
    /// Either a JSON string or the resource inlined as JSON.
    pub representation: Option<Value>,
    pub error: Option<String>,
    /// Per-record override of the representation policy.
    pub include_representation: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthDetailsRecord {
    pub realm_id: Option<String>,
    pub client_id: Option<String>,
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
}

impl From<UserEventRecord> for UserEvent {
    fn from(record: UserEventRecord) -> Self {
        UserEvent {
            time: record.time,
            event_type: record.event_type,
            error: record.error,
            user_id: record.user_id,
            realm_id: record.realm_id,
            client_id: record.client_id,
            session_id: record.session_id,
            ip_address: record.ip_address,
            details: record.details.unwrap_or_default(),
        }
    }
}

impl From<AuthDetailsRecord> for AuthDetails {
    fn from(record: AuthDetailsRecord) -> Self {
        AuthDetails {
            realm_id: record.realm_id,
            client_id: record.client_id,
            user_id: record.user_id,
            ip_address: record.ip_address,
        }
    }
}

impl TryFrom<AdminEventRecord> for AdminEvent {
    type Error = ParseOperationTypeError;

    fn try_from(record: AdminEventRecord) -> Result<Self, Self::Error> {
        let operation_type: OperationType = record.operation_type.parse()?;
        Ok(AdminEvent {
            time: record.time,
            operation_type,
            error: record.error,
            auth_details: record.auth_details.unwrap_or_default().into(),
            realm_id: record.realm_id,
            resource_path: record.resource_path,
            resource_type: record.resource_type,
            representation: record.representation.and_then(representation_text),
        })
    }
}

fn representation_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}
