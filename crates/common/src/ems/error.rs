use std::fmt::Display;

/// Failure talking to the management service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmsError {
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP status {code}: {body}")]
    Status { code: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("default policy not found")]
    DefaultPolicyNotFound,
}

impl EmsError {
    pub fn authentication<E: Display>(e: E) -> Self {
        Self::Authentication(e.to_string())
    }

    pub fn transport<E: Display>(e: E) -> Self {
        Self::Transport(e.to_string())
    }

    pub fn malformed<E: Display>(e: E) -> Self {
        Self::Malformed(e.to_string())
    }

    /// The service refused a create because the resource already exists.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Status { code: 409 | 422, .. })
    }
}
