use std::sync::Arc;

use common_observability::GatewayMetrics;
use common_session::{InMemorySessionStore, SessionCredentials, SessionStore};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, oneshot, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::events::{SessionTerminated, TerminationReason};
use crate::request::{ApiRequest, ApiResponse};
use crate::transport::{ReqwestTransport, Transport};

const TERMINATION_CHANNEL_CAPACITY: usize = 16;

type RefreshOutcome = GatewayResult<String>;

/// Refresh bookkeeping. `waiters` is only non-empty while `in_progress` is set,
/// and both are reset under the same lock acquisition.
#[derive(Default)]
struct RefreshState {
    in_progress: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    #[serde(rename = "refreshToken")]
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshGrant {
    token: String,
    #[serde(rename = "refreshToken", default)]
    refresh_token: Option<String>,
}

struct GatewayInner {
    config: GatewayConfig,
    transport: Arc<dyn Transport>,
    store: Arc<dyn SessionStore>,
    metrics: GatewayMetrics,
    refresh: Mutex<RefreshState>,
    terminations: broadcast::Sender<SessionTerminated>,
}

/// Single entry point for every backend call.
///
/// Attaches the stored access credential, and on a 401 performs at most one
/// refresh at a time while parking every other rejected caller until it
/// settles. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

impl Gateway {
    pub fn builder(config: GatewayConfig) -> GatewayBuilder {
        GatewayBuilder::new(config)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.inner.metrics
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.inner.store
    }

    /// Send a request, transparently refreshing credentials on a 401.
    ///
    /// Responses with any status other than 401 are returned as `Ok`.
    pub async fn send(&self, request: ApiRequest) -> GatewayResult<ApiResponse> {
        self.inner.send(request).await
    }

    /// Listen for session terminations.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionTerminated> {
        self.inner.terminations.subscribe()
    }

    pub async fn establish_session(&self, credentials: &SessionCredentials) -> GatewayResult<()> {
        self.inner.store.save(credentials).await?;
        info!(user_id = %credentials.user_id, "session established");
        Ok(())
    }

    pub async fn current_session(&self) -> GatewayResult<Option<SessionCredentials>> {
        Ok(self.inner.store.load().await?)
    }

    /// Purge the session and notify subscribers. Returns `false` when there
    /// was nothing to purge.
    pub async fn end_session(&self, reason: TerminationReason) -> bool {
        self.inner.terminate(reason).await
    }
}

impl GatewayInner {
    async fn send(self: &Arc<Self>, mut request: ApiRequest) -> GatewayResult<ApiResponse> {
        if let Some(session) = self.store.load().await? {
            request.set_bearer(&session.access_token)?;
        }

        loop {
            let response = self.dispatch(&request).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            let rejection = unauthorized(&request, &response);
            if request.is_retried() {
                return Err(self.reject_after_refresh(rejection).await);
            }
            request.mark_retried();

            let sent_with = request.bearer().map(str::to_owned);
            let token = self.fresh_token(sent_with, rejection).await?;
            request.set_bearer(&token)?;
            self.metrics.requests_replayed.inc();
        }
    }

    async fn dispatch(&self, request: &ApiRequest) -> GatewayResult<ApiResponse> {
        match self.transport.execute(request).await {
            Ok(response) => {
                debug!(
                    method = %request.method,
                    path = %request.path,
                    status = response.status().as_u16(),
                    retried = request.is_retried(),
                    "backend responded"
                );
                let outcome = if response.status() == StatusCode::UNAUTHORIZED {
                    "unauthorized"
                } else if response.is_success() {
                    "ok"
                } else {
                    "error_status"
                };
                self.metrics.record_outcome(outcome);
                Ok(response)
            }
            Err(err) => {
                debug!(method = %request.method, path = %request.path, error = %err, "no response");
                self.metrics.record_outcome("transport_error");
                Err(err.into())
            }
        }
    }

    /// Obtain an access credential that postdates `sent_with`, joining a
    /// running refresh or starting one.
    async fn fresh_token(
        self: &Arc<Self>,
        sent_with: Option<String>,
        rejection: GatewayError,
    ) -> RefreshOutcome {
        let receiver = {
            let mut state = self.refresh.lock().await;
            if !state.in_progress {
                let current = self.store.load().await?.map(|session| session.access_token);
                if let Some(current) = current {
                    if sent_with.as_deref() != Some(current.as_str()) {
                        debug!("access credential rotated since dispatch, replaying");
                        return Ok(current);
                    }
                }
            }

            let (sender, receiver) = oneshot::channel();
            state.waiters.push(sender);
            if state.in_progress {
                self.metrics.requests_queued.inc();
            } else {
                state.in_progress = true;
                let inner = Arc::clone(self);
                tokio::spawn(async move { inner.run_refresh(rejection).await });
            }
            receiver
        };

        receiver.await.unwrap_or(Err(GatewayError::RefreshAbandoned))
    }

    async fn run_refresh(self: Arc<Self>, rejection: GatewayError) {
        let outcome = self.refresh_credentials(rejection).await;

        let waiters = {
            let mut state = self.refresh.lock().await;
            state.in_progress = false;
            std::mem::take(&mut state.waiters)
        };
        debug!(waiters = waiters.len(), ok = outcome.is_ok(), "settling refresh waiters");
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }

    async fn refresh_credentials(&self, rejection: GatewayError) -> RefreshOutcome {
        let refresh_token = self
            .store
            .load()
            .await?
            .and_then(|session| session.refresh_token);

        let Some(refresh_token) = refresh_token else {
            warn!("authorization failed and no refresh credential is stored");
            self.purge().await;
            self.signal(TerminationReason::MissingRefreshToken);
            return Err(rejection);
        };

        self.metrics.refresh_attempts.inc();
        let result = match self.request_refresh(&refresh_token).await {
            Ok(grant) => self
                .store
                .update_tokens(&grant.token, grant.refresh_token.as_deref())
                .await
                .map(|session| session.access_token)
                .map_err(GatewayError::from),
            Err(err) => Err(err),
        };

        match result {
            Ok(token) => {
                info!("access credential refreshed");
                Ok(token)
            }
            Err(err) => {
                self.metrics.refresh_failures.inc();
                warn!(error = %err, "credential refresh failed");
                self.purge().await;
                self.signal(TerminationReason::RefreshFailed(err.to_string()));
                Err(err)
            }
        }
    }

    /// Calls the refresh endpoint on the raw transport so the call itself is
    /// never intercepted.
    async fn request_refresh(&self, refresh_token: &str) -> GatewayResult<RefreshGrant> {
        let request =
            ApiRequest::post(self.config.refresh_path.clone()).json(&RefreshRequest { refresh_token })?;
        let response = self
            .transport
            .execute(&request)
            .await
            .map_err(GatewayError::RefreshUnavailable)?;

        if !response.is_success() {
            return Err(GatewayError::RefreshRejected {
                status: response.status().as_u16(),
                detail: response.text(),
            });
        }

        let grant: RefreshGrant = response
            .json()
            .map_err(|err| GatewayError::RefreshDecode(err.to_string()))?;
        if grant.token.trim().is_empty() {
            return Err(GatewayError::RefreshDecode(
                "response carried an empty access token".into(),
            ));
        }
        Ok(grant)
    }

    async fn reject_after_refresh(&self, rejection: GatewayError) -> GatewayError {
        self.terminate(TerminationReason::RejectedAfterRefresh).await;
        rejection
    }

    /// Purge and signal, unless the session was already gone. Callers outside
    /// the refresh task may race each other here.
    async fn terminate(&self, reason: TerminationReason) -> bool {
        if !self.purge().await {
            return false;
        }
        self.signal(reason);
        true
    }

    /// Returns whether a session may have been removed. A failed purge counts,
    /// since the store state is then unknown.
    async fn purge(&self) -> bool {
        match self.store.clear().await {
            Ok(removed) => removed,
            Err(err) => {
                error!(error = %err, "failed to purge session");
                true
            }
        }
    }

    fn signal(&self, reason: TerminationReason) {
        self.metrics.session_terminations.inc();
        warn!(reason = ?reason, "session terminated");
        let _ = self.terminations.send(SessionTerminated::now(reason));
    }
}

fn unauthorized(request: &ApiRequest, response: &ApiResponse) -> GatewayError {
    GatewayError::Unauthorized {
        method: request.method.to_string(),
        path: request.path.clone(),
        detail: response.text(),
    }
}

pub struct GatewayBuilder {
    config: GatewayConfig,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn SessionStore>>,
    metrics: Option<GatewayMetrics>,
}

impl GatewayBuilder {
    fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            transport: None,
            store: None,
            metrics: None,
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_metrics(mut self, metrics: GatewayMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Defaults: a reqwest transport for the configured base URL and an
    /// in-memory session store.
    pub fn build(self) -> GatewayResult<Gateway> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(self.config.clone())?),
        };
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemorySessionStore::new()));
        let metrics = match self.metrics {
            Some(metrics) => metrics,
            None => GatewayMetrics::new().map_err(|err| GatewayError::Setup(err.to_string()))?,
        };
        let (terminations, _) = broadcast::channel(TERMINATION_CHANNEL_CAPACITY);

        Ok(Gateway {
            inner: Arc::new(GatewayInner {
                config: self.config,
                transport,
                store,
                metrics,
                refresh: Mutex::new(RefreshState::default()),
                terminations,
            }),
        })
    }
}
