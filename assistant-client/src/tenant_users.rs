use common_auth::{ApiRequest, Gateway};

use crate::error::{decode, expect_success, ClientResult};
use crate::models::{TenantUser, UserUpdate, UsernamePassword};

/// User administration within the caller's tenant. Requires the admin role.
#[derive(Clone)]
pub struct TenantUsersApi {
    gateway: Gateway,
}

impl TenantUsersApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> ClientResult<Vec<TenantUser>> {
        decode(self.gateway.send(ApiRequest::get("/tenants/users")).await?)
    }

    pub async fn get(&self, id: &str) -> ClientResult<TenantUser> {
        decode(self.gateway.send(ApiRequest::get(format!("/tenants/users/{id}"))).await?)
    }

    pub async fn create(&self, username: &str, password: &str) -> ClientResult<TenantUser> {
        let request =
            ApiRequest::post("/tenants/users").json(&UsernamePassword { username, password })?;
        decode(self.gateway.send(request).await?)
    }

    pub async fn update(&self, id: &str, update: &UserUpdate) -> ClientResult<TenantUser> {
        let request = ApiRequest::put(format!("/tenants/users/{id}")).json(update)?;
        decode(self.gateway.send(request).await?)
    }

    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        let request = ApiRequest::delete(format!("/tenants/users/{id}"));
        expect_success(self.gateway.send(request).await?)?;
        Ok(())
    }
}
