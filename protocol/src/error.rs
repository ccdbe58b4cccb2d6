//! # API Error Catalog
//!
//! Rosetta clients see failures as a small, fixed catalog of `{code,
//! message, retriable}` entries. That catalog is advertised verbatim by
//! `/network/options`, so codes are stable forever once shipped. Free-form
//! error text from lower layers travels in `details.context`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The fixed set of failures the API can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unimplemented,
    UnavailableOffline,
    Node,
    UnableToDecompressPubkey,
    UnclearIntent,
    UnableToParseIntermediateResult,
    SignatureInvalid,
    BroadcastFailed,
    CallParametersInvalid,
    InvalidAddress,
    NodeNotReady,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 11] = [
        ErrorKind::Unimplemented,
        ErrorKind::UnavailableOffline,
        ErrorKind::Node,
        ErrorKind::UnableToDecompressPubkey,
        ErrorKind::UnclearIntent,
        ErrorKind::UnableToParseIntermediateResult,
        ErrorKind::SignatureInvalid,
        ErrorKind::BroadcastFailed,
        ErrorKind::CallParametersInvalid,
        ErrorKind::InvalidAddress,
        ErrorKind::NodeNotReady,
    ];

    pub fn code(&self) -> i32 {
        match self {
            Self::Unimplemented => 0,
            Self::UnavailableOffline => 1,
            Self::Node => 2,
            Self::UnableToDecompressPubkey => 3,
            Self::UnclearIntent => 4,
            Self::UnableToParseIntermediateResult => 5,
            Self::SignatureInvalid => 6,
            Self::BroadcastFailed => 7,
            Self::CallParametersInvalid => 8,
            Self::InvalidAddress => 12,
            Self::NodeNotReady => 13,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Unimplemented => "Endpoint not implemented",
            Self::UnavailableOffline => "Endpoint unavailable offline",
            Self::Node => "gvite error",
            Self::UnableToDecompressPubkey => "Unable to decompress public key",
            Self::UnclearIntent => "Unable to parse intent",
            Self::UnableToParseIntermediateResult => "Unable to parse intermediate result",
            Self::SignatureInvalid => "Signature invalid",
            Self::BroadcastFailed => "Unable to broadcast transaction",
            Self::CallParametersInvalid => "Call parameters invalid",
            Self::InvalidAddress => "Invalid address",
            Self::NodeNotReady => "gvite not ready",
        }
    }

    pub fn retriable(&self) -> bool {
        matches!(self, Self::NodeNotReady)
    }
}

/// The Rosetta error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: i32,
    pub message: String,
    pub retriable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl ApiError {
    /// Bare catalog entry.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            code: kind.code(),
            message: kind.message().to_string(),
            retriable: kind.retriable(),
            details: None,
        }
    }

    /// Catalog entry carrying the underlying error text in
    /// `details.context`.
    pub fn wrap(kind: ErrorKind, err: impl fmt::Display) -> Self {
        let mut details = Map::new();
        details.insert("context".to_string(), Value::String(err.to_string()));
        Self {
            details: Some(details),
            ..Self::new(kind)
        }
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.code == kind.code()
    }

    /// The `details.context` text, if any.
    pub fn context(&self) -> Option<&str> {
        self.details
            .as_ref()
            .and_then(|d| d.get("context"))
            .and_then(Value::as_str)
    }

    /// Every catalog entry, for `/network/options`.
    pub fn catalog() -> Vec<ApiError> {
        ErrorKind::ALL.into_iter().map(ApiError::new).collect()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.context() {
            Some(context) => write!(f, "{} ({}): {}", self.message, self.code, context),
            None => write!(f, "{} ({})", self.message, self.code),
        }
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_unique() {
        let codes: HashSet<i32> = ErrorKind::ALL.iter().map(ErrorKind::code).collect();
        assert_eq!(codes.len(), ErrorKind::ALL.len());
    }

    #[test]
    fn test_only_node_not_ready_is_retriable() {
        let retriable: Vec<_> = ErrorKind::ALL.into_iter().filter(|k| k.retriable()).collect();
        assert_eq!(retriable, vec![ErrorKind::NodeNotReady]);
    }

    #[test]
    fn test_wrap_puts_text_in_context() {
        let err = ApiError::wrap(ErrorKind::UnclearIntent, "missing operations");
        assert!(err.is(ErrorKind::UnclearIntent));
        assert_eq!(err.context(), Some("missing operations"));

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], 4);
        assert_eq!(json["message"], "Unable to parse intent");
        assert_eq!(json["details"]["context"], "missing operations");
    }

    #[test]
    fn test_bare_error_has_no_details() {
        let json = serde_json::to_value(ApiError::new(ErrorKind::Unimplemented)).unwrap();
        assert!(json.get("details").is_none());
    }
}
