use common_auth::{ApiRequest, Gateway};

use crate::error::{decode, expect_success, ClientResult};
use crate::models::{Conversation, Message};

#[derive(Clone)]
pub struct ConversationsApi {
    gateway: Gateway,
}

impl ConversationsApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, user_id: &str) -> ClientResult<Vec<Conversation>> {
        let request = ApiRequest::get("/conversations").query("userId", user_id);
        decode(self.gateway.send(request).await?)
    }

    pub async fn get(&self, id: &str) -> ClientResult<Conversation> {
        decode(self.gateway.send(ApiRequest::get(format!("/conversations/{id}"))).await?)
    }

    /// Messages of one conversation, oldest first.
    pub async fn messages(&self, id: &str) -> ClientResult<Vec<Message>> {
        let request = ApiRequest::get(format!("/conversations/{id}/messages"));
        decode(self.gateway.send(request).await?)
    }

    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        let request = ApiRequest::delete(format!("/conversations/{id}"));
        expect_success(self.gateway.send(request).await?)?;
        Ok(())
    }
}
