//! Turns raw identity events into sink-ready reports.
//!
//! User events honor the errors-only policy; admin events are always
//! reported.

use crate::core::event::{AdminEvent, RawEvent, UserEvent};
use crate::core::report::{EventSource, Level, Report, ReportUser, TAG_SOURCE, TAG_TYPE};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Policy applied while normalizing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizerConfig {
    /// Suppress user events that carry no error code.
    pub errors_only: bool,
}

/// Normalizes a user event, or returns `None` when the errors-only policy
/// filters it out.
pub fn normalize_user_event(event: &UserEvent, config: &NormalizerConfig) -> Option<Report> {
    if config.errors_only && event.error.is_none() {
        return None;
    }

    let mut extras: Map<String, Value> = event
        .details
        .iter()
        .map(|(key, value)| (key.clone(), nullable(value.as_deref())))
        .collect();
    extras.insert("realmId".to_string(), Value::String(event.realm_id.clone()));
    extras.insert("clientId".to_string(), nullable(event.client_id.as_deref()));
    extras.insert("sessionId".to_string(), nullable(event.session_id.as_deref()));
    extras.insert("ipAddress".to_string(), nullable(event.ip_address.as_deref()));

    Some(Report {
        message: message(config, event.error.as_deref(), &event.event_type),
        level: Level::for_error(event.error.as_deref()),
        user: actor(event.user_id.as_deref()),
        extras,
        tags: tags(&event.event_type, EventSource::Common),
        timestamp: timestamp(event.time),
    })
}

/// Normalizes an admin event. Admin events are never filtered.
pub fn normalize_admin_event(
    event: &AdminEvent,
    include_representation: bool,
    config: &NormalizerConfig,
) -> Report {
    let operation = event.operation_type.as_str();
    let auth = &event.auth_details;

    let mut extras = Map::new();
    extras.insert("realmId".to_string(), Value::String(event.realm_id.clone()));
    extras.insert("clientId".to_string(), nullable(auth.client_id.as_deref()));
    extras.insert("ipAddress".to_string(), nullable(auth.ip_address.as_deref()));
    extras.insert("resourcePath".to_string(), nullable(event.resource_path.as_deref()));
    extras.insert("resourceType".to_string(), nullable(event.resource_type.as_deref()));
    if include_representation {
        extras.insert(
            "representation".to_string(),
            nullable(event.representation.as_deref()),
        );
    }

    Report {
        message: message(config, event.error.as_deref(), operation),
        level: Level::for_error(event.error.as_deref()),
        user: actor(auth.user_id.as_deref()),
        extras,
        tags: tags(operation, EventSource::Admin),
        timestamp: timestamp(event.time),
    }
}

/// Normalizes either event shape.
pub fn normalize(event: &RawEvent, config: &NormalizerConfig) -> Option<Report> {
    match event {
        RawEvent::User(event) => normalize_user_event(event, config),
        RawEvent::Admin {
            event,
            include_representation,
        } => Some(normalize_admin_event(event, *include_representation, config)),
    }
}

// Under errors-only the error code is the summary; otherwise the type code is.
fn message(config: &NormalizerConfig, error: Option<&str>, type_code: &str) -> Option<String> {
    if config.errors_only {
        error.map(str::to_string)
    } else {
        Some(type_code.to_string())
    }
}

fn actor(user_id: Option<&str>) -> Option<ReportUser> {
    user_id.map(|id| ReportUser { id: id.to_string() })
}

fn tags(type_code: &str, source: EventSource) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    tags.insert(TAG_TYPE.to_string(), type_code.to_string());
    tags.insert(TAG_SOURCE.to_string(), source.as_str().to_string());
    tags
}

fn nullable(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |value| Value::String(value.to_string()))
}

fn timestamp(time: Option<i64>) -> Option<DateTime<Utc>> {
    time.and_then(DateTime::from_timestamp_millis)
}
