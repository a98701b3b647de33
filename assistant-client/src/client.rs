use anyhow::{Context, Result};
use common_auth::Gateway;

use crate::auth::AuthApi;
use crate::chat::ChatApi;
use crate::config::ClientConfig;
use crate::conversations::ConversationsApi;
use crate::documents::DocumentsApi;
use crate::statistics::StatisticsApi;
use crate::tenant_users::TenantUsersApi;

/// Every backend API, sharing one gateway and therefore one session and
/// one refresh coordinator.
#[derive(Clone)]
pub struct AssistantClient {
    gateway: Gateway,
    pub auth: AuthApi,
    pub conversations: ConversationsApi,
    pub chat: ChatApi,
    pub documents: DocumentsApi,
    pub statistics: StatisticsApi,
    pub users: TenantUsersApi,
}

impl AssistantClient {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            auth: AuthApi::new(gateway.clone()),
            conversations: ConversationsApi::new(gateway.clone()),
            chat: ChatApi::new(gateway.clone()),
            documents: DocumentsApi::new(gateway.clone()),
            statistics: StatisticsApi::new(gateway.clone()),
            users: TenantUsersApi::new(gateway.clone()),
            gateway,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let gateway = Gateway::builder(config.gateway_config())
            .with_store(config.session_store())
            .build()
            .context("Failed to build request gateway")?;
        Ok(Self::new(gateway))
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }
}
