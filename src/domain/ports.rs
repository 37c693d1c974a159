use crate::utils::error::ApiError;
use async_trait::async_trait;
use std::time::Duration;

/// 提供目前的 bearer token；沒有登入時回傳 `None`
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

impl<F> TokenProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

/// 固定 token，通常來自設定檔或環境變數
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// 收到 401 時呼叫 (例如登出並導回登入頁)
pub trait UnauthorizedHandler: Send + Sync {
    fn on_unauthorized(&self, error: &ApiError);
}

impl<F> UnauthorizedHandler for F
where
    F: Fn(&ApiError) + Send + Sync,
{
    fn on_unauthorized(&self, error: &ApiError) {
        self(error)
    }
}

/// 重試與健康檢查之間的等待
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
