use crate::core::{ApiClient, ApiRequest};
use crate::domain::model::{LoginRequest, LoginResponse, User};
use crate::utils::error::Result;

use super::no_query;

#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// 登入並取得 token；token 的保存交由呼叫端的 `TokenProvider`
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.client.post("/auth/login", &request).await?;
        tracing::info!("🔑 Logged in as {}", username);
        Ok(response)
    }

    pub async fn current_user(&self) -> Result<User> {
        self.client.get("/auth/me", no_query()).await
    }

    pub async fn logout(&self) -> Result<()> {
        self.client.execute(&ApiRequest::post("/auth/logout")).await?;
        Ok(())
    }
}
