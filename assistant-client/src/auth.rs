use common_auth::{ApiRequest, Gateway, GatewayError, TerminationReason};
use common_session::SessionCredentials;
use tracing::info;

use crate::error::{decode, ClientError, ClientResult};
use crate::models::{LoginResponse, RegisteredUser, UsernamePassword};

/// Sign-in, registration and sign-out.
#[derive(Clone)]
pub struct AuthApi {
    gateway: Gateway,
}

impl AuthApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Exchange a username and password for credentials and persist them.
    ///
    /// Any stored session is discarded first, so a wrong password is reported
    /// as such instead of spending the old refresh credential.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<SessionCredentials> {
        self.gateway
            .store()
            .clear()
            .await
            .map_err(GatewayError::from)?;
        let request = ApiRequest::post("/auth/login").json(&UsernamePassword { username, password })?;
        let response = match self.gateway.send(request).await {
            Err(GatewayError::Unauthorized { .. }) => {
                return Err(ClientError::Invalid("invalid username or password".into()))
            }
            other => other?,
        };
        let grant: LoginResponse = decode(response)?;

        let credentials = SessionCredentials::new(
            grant.token,
            grant.refresh_token,
            grant.user_id,
            grant.username.unwrap_or_else(|| username.to_string()),
        )
        .with_roles(grant.roles);
        self.gateway.establish_session(&credentials).await?;
        info!(user_id = %credentials.user_id, "signed in");
        Ok(credentials)
    }

    pub async fn register(&self, username: &str, password: &str) -> ClientResult<RegisteredUser> {
        let request =
            ApiRequest::post("/auth/register").json(&UsernamePassword { username, password })?;
        decode(self.gateway.send(request).await?)
    }

    /// Register, then sign in with the same credentials.
    pub async fn register_and_login(
        &self,
        username: &str,
        password: &str,
    ) -> ClientResult<SessionCredentials> {
        self.register(username, password).await?;
        self.login(username, password).await
    }

    /// Purge the stored session. Returns whether one was present.
    pub async fn logout(&self) -> bool {
        self.gateway.end_session(TerminationReason::LoggedOut).await
    }

    pub async fn whoami(&self) -> ClientResult<SessionCredentials> {
        self.gateway
            .current_session()
            .await?
            .ok_or(ClientError::NotSignedIn)
    }
}
