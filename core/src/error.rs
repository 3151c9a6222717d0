//! Error type shared by every remote data operation.

use thiserror::Error;

/// Failure of a query or mutation.
///
/// The type is `Clone` so a single in-flight request can hand the same
/// outcome to every caller that was de-duplicated onto it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// HTTP 401. The session has already been cleared by the time a caller
    /// sees this.
    #[error("not authenticated: {message}")]
    Unauthorized { message: String },

    /// HTTP 404. Views render this as an empty state, not an error.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Any other non-success HTTP status.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// The response body was not the expected JSON shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized { .. } => Some(401),
            ClientError::NotFound { .. } => Some(404),
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message the server put in the envelope, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Unauthorized { message }
            | ClientError::NotFound { message }
            | ClientError::Api { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }

    /// Text for a transient user-facing notice: the server's message when it
    /// sent one, `fallback` otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Parse(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn user_message_prefers_server_text() {
        let err = ClientError::Api {
            status: 409,
            message: "Email already registered".to_string(),
            details: None,
        };
        assert_eq!(err.user_message("Failed"), "Email already registered");
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn user_message_falls_back_for_transport_failures() {
        let err = ClientError::Network("connection refused".to_string());
        assert_eq!(err.user_message("Failed to submit ticket"), "Failed to submit ticket");
        assert_eq!(err.status(), None);

        let blank = ClientError::Api {
            status: 500,
            message: "  ".to_string(),
            details: None,
        };
        assert_eq!(blank.user_message("Failed"), "Failed");
    }
}
