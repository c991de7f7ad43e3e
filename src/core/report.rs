use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Tag key carrying the event or operation type code.
pub const TAG_TYPE: &str = "type";
/// Tag key carrying the originating [`EventSource`].
pub const TAG_SOURCE: &str = "source";

/// Normalized report handed to a sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Summary text; absent when the selected code is absent.
    pub message: Option<String>,
    pub level: Level,
    /// Acting user, when the event names one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ReportUser>,
    /// Structured context. Keys may map to `null`.
    pub extras: Map<String, Value>,
    pub tags: BTreeMap<String, String>,
    /// Time the source event occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Report {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn source(&self) -> Option<&str> {
        self.tag(TAG_SOURCE)
    }
}

/// Report severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Error,
}

impl Level {
    /// `Error` when an error code is present, `Info` otherwise.
    pub fn for_error(error: Option<&str>) -> Self {
        match error {
            Some(_) => Level::Error,
            None => Level::Info,
        }
    }
}

/// Acting user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportUser {
    pub id: String,
}

/// Which raw event shape produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventSource {
    /// End-user authentication and session events.
    Common,
    /// Administrative operations.
    Admin,
}

impl EventSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Common => "COMMON",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_follows_error_presence() {
        assert_eq!(Level::for_error(None), Level::Info);
        assert_eq!(Level::for_error(Some("invalid_grant")), Level::Error);
        assert_eq!(Level::for_error(Some("")), Level::Error);
    }

    #[test]
    fn report_json_shape() {
        let mut extras = Map::new();
        extras.insert("realmId".to_string(), Value::from("r1"));
        extras.insert("clientId".to_string(), Value::Null);
        let mut tags = BTreeMap::new();
        tags.insert(TAG_TYPE.to_string(), "LOGIN".to_string());
        tags.insert(TAG_SOURCE.to_string(), EventSource::Common.to_string());
        let report = Report {
            message: Some("LOGIN".to_string()),
            level: Level::Info,
            user: None,
            extras,
            tags,
            timestamp: None,
        };

        let value = serde_json::to_value(&report).expect("serialize");
        assert_eq!(value["level"], "info");
        assert_eq!(value["extras"]["clientId"], Value::Null);
        assert_eq!(value["tags"]["source"], "COMMON");
        assert!(value.get("user").is_none());
        assert_eq!(report.source(), Some("COMMON"));
    }
}
