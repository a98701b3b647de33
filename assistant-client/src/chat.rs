use common_auth::{ApiRequest, Gateway};

use crate::error::{decode, ClientError, ClientResult};
use crate::models::{ChatReply, ChatRequest};

#[derive(Clone)]
pub struct ChatApi {
    gateway: Gateway,
}

impl ChatApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Ask the assistant. Without a conversation id the backend starts a new
    /// conversation and reports its id in the reply.
    pub async fn send(&self, message: &str, conversation_id: Option<&str>) -> ClientResult<ChatReply> {
        if message.trim().is_empty() {
            return Err(ClientError::Invalid("message cannot be empty".into()));
        }
        let request = ApiRequest::post("/chat").json(&ChatRequest {
            message,
            conversation_id,
        })?;
        decode(self.gateway.send(request).await?)
    }
}
