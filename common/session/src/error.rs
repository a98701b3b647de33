use thiserror::Error;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no active session to update")]
    Missing,
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("session record is malformed: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for SessionError {
    fn from(value: serde_json::Error) -> Self {
        Self::Malformed(value.to_string())
    }
}
