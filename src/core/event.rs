use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Authentication or session event raised on behalf of an end user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserEvent {
    /// Event time in epoch milliseconds, when the server recorded one.
    pub time: Option<i64>,
    /// Event type code (`LOGIN`, `LOGOUT`, `CODE_TO_TOKEN`, ...).
    pub event_type: String,
    /// Error code; present only when the action failed.
    pub error: Option<String>,
    pub user_id: Option<String>,
    pub realm_id: String,
    pub client_id: Option<String>,
    pub session_id: Option<String>,
    pub ip_address: Option<String>,
    /// Free-form detail entries attached by the server. Values may be null.
    pub details: BTreeMap<String, Option<String>>,
}

/// Administrative operation performed through the management API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminEvent {
    /// Event time in epoch milliseconds, when the server recorded one.
    pub time: Option<i64>,
    pub operation_type: OperationType,
    /// Error code; present only when the operation failed.
    pub error: Option<String>,
    /// Who performed the operation.
    pub auth_details: AuthDetails,
    pub realm_id: String,
    pub resource_path: Option<String>,
    /// Resource type in string form (`USER`, `CLIENT`, `REALM_ROLE`, ...).
    pub resource_type: Option<String>,
    /// Serialized snapshot of the affected resource.
    pub representation: Option<String>,
}

/// Acting principal of an admin operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthDetails {
    pub realm_id: Option<String>,
    pub client_id: Option<String>,
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
}

/// Kind of change an admin operation applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Create,
    Update,
    Delete,
    Action,
}

impl OperationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Action => "ACTION",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = ParseOperationTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            "ACTION" => Ok(Self::Action),
            _ => Err(ParseOperationTypeError(s.to_string())),
        }
    }
}

/// Returned when an operation type code is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation type: {0}")]
pub struct ParseOperationTypeError(pub String);

/// Raw event as delivered by the host, in either of its two shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvent {
    User(UserEvent),
    Admin {
        event: AdminEvent,
        /// Whether the resource representation may be attached to the report.
        include_representation: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_type_codes() {
        for op in [
            OperationType::Create,
            OperationType::Update,
            OperationType::Delete,
            OperationType::Action,
        ] {
            assert_eq!(op.as_str().parse::<OperationType>(), Ok(op));
        }
        assert_eq!(OperationType::Delete.to_string(), "DELETE");
    }

    #[test]
    fn unknown_operation_type() {
        let err = "create".parse::<OperationType>().expect_err("lower case");
        assert_eq!(err.to_string(), "unknown operation type: create");
    }
}
