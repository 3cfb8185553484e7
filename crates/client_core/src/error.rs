//! Client-side error taxonomy: transport-level `ClientError` from the resource
//! client, and the user-facing `OperationError` the controllers report.

use std::{collections::BTreeMap, fmt};

use thiserror::Error;

pub const NO_RESPONSE_MESSAGE: &str = "No response from server. Check your connection and retry.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong, please try again.";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The request never produced a response: refused, reset, DNS or timeout.
    #[error("no response from server: {0}")]
    Network(String),
    #[error("server answered {status} without a response envelope")]
    HttpStatus { status: u16 },
    #[error("malformed response body: {0}")]
    Decode(String),
    #[error("resource {resource} has no {operation} endpoint")]
    Unsupported {
        resource: String,
        operation: String,
    },
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            ClientError::Decode(value.to_string())
        } else if let Some(status) = value.status() {
            ClientError::HttpStatus {
                status: status.as_u16(),
            }
        } else {
            ClientError::Network(value.to_string())
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(value: url::ParseError) -> Self {
        ClientError::InvalidUrl(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Required,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::Required => f.write_str("is required"),
        }
    }
}

/// Field-level validation failures, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<String, FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, error: FieldError) {
        self.0.insert(field.into(), error);
    }

    pub fn get(&self, field: &str) -> Option<FieldError> {
        self.0.get(field).copied()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, error)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field} {error}")?;
        }
        Ok(())
    }
}

/// Failure of one user-initiated operation. None of these are fatal: the draft
/// or row is left as it was and the user may retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OperationError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("server rejected the request: {0}")]
    ServerRejection(String),
    #[error("no response from server: {0}")]
    NetworkFailure(String),
    #[error("client misconfigured: {0}")]
    Misconfigured(String),
}

impl OperationError {
    /// Rejection carrying the server's message, or the generic fallback when
    /// the server sent none.
    pub fn rejection(server_message: Option<&str>) -> Self {
        OperationError::ServerRejection(
            server_message
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or(GENERIC_FAILURE_MESSAGE)
                .to_string(),
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            OperationError::Validation(errors) => errors.to_string(),
            OperationError::ServerRejection(message) => message.clone(),
            OperationError::NetworkFailure(_) => NO_RESPONSE_MESSAGE.to_string(),
            OperationError::Misconfigured(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl From<ClientError> for OperationError {
    fn from(value: ClientError) -> Self {
        match value {
            ClientError::Network(detail) => OperationError::NetworkFailure(detail),
            ClientError::HttpStatus { .. } | ClientError::Decode(_) => {
                OperationError::rejection(None)
            }
            ClientError::Unsupported { .. } | ClientError::InvalidUrl(_) => {
                OperationError::Misconfigured(value.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_and_rejection_messages_differ() {
        let network = OperationError::from(ClientError::Network("connection refused".into()));
        let rejected = OperationError::rejection(Some("Already accepted"));
        assert_eq!(network.user_message(), NO_RESPONSE_MESSAGE);
        assert_eq!(rejected.user_message(), "Already accepted");
        assert_ne!(network.user_message(), rejected.user_message());
    }

    #[test]
    fn blank_server_message_falls_back_to_generic() {
        assert_eq!(
            OperationError::rejection(Some("  ")).user_message(),
            GENERIC_FAILURE_MESSAGE
        );
        assert_eq!(
            OperationError::from(ClientError::HttpStatus { status: 502 }).user_message(),
            GENERIC_FAILURE_MESSAGE
        );
    }

    #[test]
    fn validation_summary_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("reason", FieldError::Required);
        errors.add("remark", FieldError::Required);
        assert_eq!(errors.to_string(), "reason is required; remark is required");
    }
}
