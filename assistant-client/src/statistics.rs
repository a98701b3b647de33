use common_auth::{ApiRequest, Gateway};

use crate::error::{decode, ClientResult};
use crate::models::{SystemStatistics, UserStatistics};

#[derive(Clone)]
pub struct StatisticsApi {
    gateway: Gateway,
}

impl StatisticsApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn system(&self) -> ClientResult<SystemStatistics> {
        decode(self.gateway.send(ApiRequest::get("/statistics")).await?)
    }

    pub async fn for_user(&self, user_id: &str) -> ClientResult<UserStatistics> {
        let request = ApiRequest::get("/statistics").query("userId", user_id);
        decode(self.gateway.send(request).await?)
    }
}
