use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("server rejected the request: {}", message.as_deref().unwrap_or("no reason given"))]
    Rejected { message: Option<String> },

    #[error("invalid notification id '{0}'")]
    InvalidId(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl NotifyError {
    /// HTTP status for errors that came back from the server.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Message suitable for showing to a person.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { status: 401 | 403, .. } => "Please sign in again.".into(),
            Self::Status { status: 404, .. } => "That notification no longer exists.".into(),
            Self::Rejected { message: Some(m) } => m.clone(),
            _ => "Something went wrong. Please try again.".into(),
        }
    }
}

pub type NotifyResult<T> = Result<T, NotifyError>;
