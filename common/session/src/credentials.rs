use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::roles::ROLE_ADMIN;

/// Durable key holding the access credential.
pub const KEY_ACCESS_TOKEN: &str = "jwtToken";
/// Durable key holding the refresh credential.
pub const KEY_REFRESH_TOKEN: &str = "refreshToken";
pub const KEY_USER_ID: &str = "userId";
pub const KEY_USERNAME: &str = "username";

/// Credentials for the signed-in user.
///
/// `roles` live only in process memory; everything else survives restarts
/// through [`PersistedSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user_id: String,
    pub username: String,
    pub roles: BTreeSet<String>,
}

impl SessionCredentials {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        user_id: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.filter(|token| !token.trim().is_empty()),
            user_id: user_id.into(),
            username: username.into(),
            roles: BTreeSet::new(),
        }
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Refresh credential, if the backend issued a usable one.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    /// Swap in a refreshed access credential. Refresh credentials are not
    /// guaranteed to rotate, so `None` keeps the current one.
    pub fn rotate(&mut self, access_token: &str, refresh_token: Option<&str>) {
        self.access_token = access_token.to_string();
        if let Some(refresh) = refresh_token.filter(|value| !value.trim().is_empty()) {
            self.refresh_token = Some(refresh.to_string());
        }
    }
}

/// On-disk shape of a session. Key names are shared with other readers of
/// the store and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(rename = "jwtToken")]
    pub access_token: String,
    #[serde(
        rename = "refreshToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_token: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "username")]
    pub username: String,
}

impl From<&SessionCredentials> for PersistedSession {
    fn from(value: &SessionCredentials) -> Self {
        Self {
            access_token: value.access_token.clone(),
            refresh_token: value.refresh_token.clone(),
            user_id: value.user_id.clone(),
            username: value.username.clone(),
        }
    }
}

impl PersistedSession {
    pub fn into_credentials(self, roles: BTreeSet<String>) -> SessionCredentials {
        SessionCredentials {
            access_token: self.access_token,
            refresh_token: self.refresh_token.filter(|token| !token.trim().is_empty()),
            user_id: self.user_id,
            username: self.username,
            roles,
        }
    }
}
