//! Response envelope and error taxonomy
//!
//! Every tool result and every transport call is an [`Envelope`]. Failures
//! carry an [`ErrorKind`]; the recommended [`ErrorAction`] and retry hint are
//! derived from the kind, so the two can never disagree.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// How the model should react to a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorAction {
    /// Transient failure; the same call may succeed later
    Retry,
    /// The call itself was wrong; fix the arguments
    Correct,
    /// Domain information; incorporate it into the reasoning
    Inform,
}

impl ErrorAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorAction::Retry => "retry",
            ErrorAction::Correct => "correct",
            ErrorAction::Inform => "inform",
        }
    }
}

impl fmt::Display for ErrorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    ServerError,
    ClientError,
    InvalidJson,
    Timeout,
    ConnectionRefused,
    NetworkError,
    NotCasualty,
    NoTimestamp,
    InvalidTimestamp,
    InvalidArguments,
    ToolExecutionError,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 12] = [
        ErrorKind::NotFound,
        ErrorKind::ServerError,
        ErrorKind::ClientError,
        ErrorKind::InvalidJson,
        ErrorKind::Timeout,
        ErrorKind::ConnectionRefused,
        ErrorKind::NetworkError,
        ErrorKind::NotCasualty,
        ErrorKind::NoTimestamp,
        ErrorKind::InvalidTimestamp,
        ErrorKind::InvalidArguments,
        ErrorKind::ToolExecutionError,
    ];

    /// The single action each kind maps to
    pub const fn action(self) -> ErrorAction {
        match self {
            ErrorKind::NotFound
            | ErrorKind::NotCasualty
            | ErrorKind::NoTimestamp
            | ErrorKind::InvalidTimestamp => ErrorAction::Inform,
            ErrorKind::ClientError | ErrorKind::InvalidArguments => ErrorAction::Correct,
            ErrorKind::ServerError
            | ErrorKind::InvalidJson
            | ErrorKind::Timeout
            | ErrorKind::ConnectionRefused
            | ErrorKind::NetworkError
            | ErrorKind::ToolExecutionError => ErrorAction::Retry,
        }
    }

    /// Suggested back-off before retrying, where one applies
    pub const fn retry_after_seconds(self) -> Option<u32> {
        match self {
            ErrorKind::ServerError => Some(5),
            ErrorKind::Timeout => Some(3),
            ErrorKind::ConnectionRefused => Some(10),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::ServerError => "SERVER_ERROR",
            ErrorKind::ClientError => "CLIENT_ERROR",
            ErrorKind::InvalidJson => "INVALID_JSON",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::ConnectionRefused => "CONNECTION_REFUSED",
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::NotCasualty => "NOT_CASUALTY",
            ErrorKind::NoTimestamp => "NO_TIMESTAMP",
            ErrorKind::InvalidTimestamp => "INVALID_TIMESTAMP",
            ErrorKind::InvalidArguments => "INVALID_ARGUMENTS",
            ErrorKind::ToolExecutionError => "TOOL_EXECUTION_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
    pub retry_after_seconds: Option<u32>,
}

impl Failure {
    /// Failure with the kind's default retry hint
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after_seconds: kind.retry_after_seconds(),
        }
    }

    pub fn action(&self) -> ErrorAction {
        self.kind.action()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.kind, self.action(), self.message)
    }
}

/// Canonical result of a tool or transport call
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T = Value> {
    Success {
        data: Option<T>,
        message: Option<String>,
    },
    /// The call worked but the requested fact does not exist.
    /// Serialized as success with null data and an `inform` action.
    Absent { message: String },
    Failure(Failure),
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Envelope::Success {
            data: Some(data),
            message: None,
        }
    }

    /// Success with only a human message
    pub fn message(message: impl Into<String>) -> Self {
        Envelope::Success {
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn absent(message: impl Into<String>) -> Self {
        Envelope::Absent {
            message: message.into(),
        }
    }

    pub fn fail(kind: ErrorKind, message: impl Into<String>) -> Self {
        Envelope::Failure(Failure::new(kind, message))
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Envelope::Failure(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Envelope::Success { data, .. } => data.as_ref(),
            _ => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Envelope::Success { data, .. } => data,
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Envelope::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.failure().map(|f| f.kind)
    }

    /// Action recommended to the model, if any
    pub fn action(&self) -> Option<ErrorAction> {
        match self {
            Envelope::Success { .. } => None,
            Envelope::Absent { .. } => Some(ErrorAction::Inform),
            Envelope::Failure(failure) => Some(failure.action()),
        }
    }

    pub fn message_text(&self) -> Option<&str> {
        match self {
            Envelope::Success { message, .. } => message.as_deref(),
            Envelope::Absent { message } => Some(message),
            Envelope::Failure(failure) => Some(&failure.message),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Envelope<U> {
        match self {
            Envelope::Success { data, message } => Envelope::Success {
                data: data.map(f),
                message,
            },
            Envelope::Absent { message } => Envelope::Absent { message },
            Envelope::Failure(failure) => Envelope::Failure(failure),
        }
    }
}

impl<T: Serialize> Envelope<T> {
    /// Erase the payload type into JSON
    pub fn into_value(self) -> serde_json::Result<Envelope<Value>> {
        Ok(match self {
            Envelope::Success { data, message } => Envelope::Success {
                data: data.map(serde_json::to_value).transpose()?,
                message,
            },
            Envelope::Absent { message } => Envelope::Absent { message },
            Envelope::Failure(failure) => Envelope::Failure(failure),
        })
    }

    /// JSON text for a `tool` message
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"success":false,"error":"TOOL_EXECUTION_ERROR","message":"unserializable result: {}","action":"retry"}}"#,
                e.to_string().replace('"', "'")
            )
        })
    }
}

impl<T> From<Failure> for Envelope<T> {
    fn from(failure: Failure) -> Self {
        Envelope::Failure(failure)
    }
}

#[derive(Serialize)]
struct WireRef<'a, T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<ErrorAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_seconds: Option<u32>,
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            Envelope::Success { data, message } => WireRef {
                success: true,
                data: data.as_ref(),
                error: None,
                message: message.as_deref(),
                action: None,
                retry_after_seconds: None,
            },
            Envelope::Absent { message } => WireRef {
                success: true,
                data: None,
                error: None,
                message: Some(message),
                action: Some(ErrorAction::Inform),
                retry_after_seconds: None,
            },
            Envelope::Failure(failure) => WireRef {
                success: false,
                data: None,
                error: Some(failure.kind),
                message: Some(&failure.message),
                action: Some(failure.action()),
                retry_after_seconds: failure.retry_after_seconds,
            },
        };
        wire.serialize(serializer)
    }
}

#[derive(Deserialize)]
struct WireOwned<T> {
    success: bool,
    data: Option<T>,
    error: Option<ErrorKind>,
    message: Option<String>,
    action: Option<ErrorAction>,
    retry_after_seconds: Option<u32>,
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Envelope<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireOwned::<T>::deserialize(deserializer)?;

        if !wire.success {
            let kind = wire
                .error
                .ok_or_else(|| D::Error::custom("failed envelope without error kind"))?;
            return Ok(Envelope::Failure(Failure {
                kind,
                message: wire.message.unwrap_or_default(),
                retry_after_seconds: wire.retry_after_seconds,
            }));
        }

        match (wire.data, wire.action) {
            (None, Some(ErrorAction::Inform)) => Ok(Envelope::Absent {
                message: wire.message.unwrap_or_default(),
            }),
            (data, _) => Ok(Envelope::Success {
                data,
                message: wire.message,
            }),
        }
    }
}
