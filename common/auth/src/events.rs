use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// A 401 arrived and no refresh credential was stored.
    MissingRefreshToken,
    /// The refresh call failed; carries the failure description.
    RefreshFailed(String),
    /// The request was rejected again with the freshly refreshed credential.
    RejectedAfterRefresh,
    LoggedOut,
}

/// Emitted once per purged session. Hosts subscribe through
/// [`crate::Gateway::subscribe`] and send the user back to sign in.
#[derive(Debug, Clone)]
pub struct SessionTerminated {
    pub reason: TerminationReason,
    pub at: DateTime<Utc>,
}

impl SessionTerminated {
    pub fn now(reason: TerminationReason) -> Self {
        Self {
            reason,
            at: Utc::now(),
        }
    }
}
