use common_session::SessionError;
use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// No response was received at all.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("request could not be built: {0}")]
    Request(String),
    #[error("transport failure: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_connect() {
            Self::Connect(value.to_string())
        } else if value.is_timeout() {
            Self::Timeout(value.to_string())
        } else if value.is_builder() {
            Self::Request(value.to_string())
        } else {
            Self::Other(value.to_string())
        }
    }
}

/// Errors surfaced by [`crate::Gateway::send`].
///
/// `Clone` so that the outcome of one refresh can settle every parked caller.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("{method} {path} was rejected as unauthorized: {detail}")]
    Unauthorized {
        method: String,
        path: String,
        detail: String,
    },
    #[error("credential refresh rejected with HTTP {status}: {detail}")]
    RefreshRejected { status: u16, detail: String },
    #[error("credential refresh could not reach the backend: {0}")]
    RefreshUnavailable(TransportError),
    #[error("credential refresh returned an unreadable body: {0}")]
    RefreshDecode(String),
    #[error("session store failure: {0}")]
    Session(String),
    #[error("failed to encode request: {0}")]
    Encode(String),
    #[error("credential refresh was abandoned before completing")]
    RefreshAbandoned,
    #[error("gateway setup failed: {0}")]
    Setup(String),
}

impl GatewayError {
    /// True for authorization failures the gateway could not recover from.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(
            self,
            GatewayError::Unauthorized { .. }
                | GatewayError::RefreshRejected { .. }
                | GatewayError::RefreshUnavailable(_)
                | GatewayError::RefreshDecode(_)
                | GatewayError::RefreshAbandoned
        )
    }
}

impl From<SessionError> for GatewayError {
    fn from(value: SessionError) -> Self {
        Self::Session(value.to_string())
    }
}
