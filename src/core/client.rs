//! 共用的 HTTP client。
//!
//! 負責附加 bearer token、分類失敗回應，並在疑似後端重啟時
//! 先做健康檢查再以指數退避重送同一個請求。

use crate::config::client_config::ClientConfig;
use crate::core::backoff::retry_delay;
use crate::core::classify::{self, StatusClass, TransportClass};
use crate::core::health::{HealthChecker, HealthStatus};
use crate::core::request::{parse_body, ApiRequest, ApiResponse};
use crate::domain::ports::{Sleeper, StaticToken, TokenProvider, TokioSleeper, UnauthorizedHandler};
use crate::utils::error::{ApiError, ClientError, ErrorKind, Result};
use crate::utils::validation::Validate;
use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

type ResponseFuture = BoxFuture<'static, std::result::Result<Value, ApiError>>;

/// 只保留 weak handle，所有呼叫端都放棄時 future 會隨之釋放
struct PendingEntry {
    id: u64,
    handle: WeakShared<ResponseFuture>,
}

/// 隨共用 future 一起 drop，完成或被放棄時都會移除自己的項目
struct PendingCleanup {
    inner: Weak<ClientInner>,
    key: String,
    id: u64,
}

impl Drop for PendingCleanup {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            let mut pending = inner.pending.lock().unwrap_or_else(PoisonError::into_inner);
            if pending.get(&self.key).is_some_and(|entry| entry.id == self.id) {
                pending.remove(&self.key);
            }
        }
    }
}

/// 單次送出的失敗結果
enum AttemptFailure {
    Status { status: u16, body: Value },
    Transport(reqwest::Error),
}

#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: String,
    config: ClientConfig,
    health: HealthChecker,
    token_provider: Option<Box<dyn TokenProvider>>,
    unauthorized_handler: Option<Box<dyn UnauthorizedHandler>>,
    sleeper: Arc<dyn Sleeper>,
    pending: Mutex<HashMap<String, PendingEntry>>,
    next_pending_id: AtomicU64,
}

pub struct ApiClientBuilder {
    config: ClientConfig,
    token_provider: Option<Box<dyn TokenProvider>>,
    unauthorized_handler: Option<Box<dyn UnauthorizedHandler>>,
    sleeper: Option<Arc<dyn Sleeper>>,
}

impl ApiClientBuilder {
    pub fn token_provider(mut self, provider: impl TokenProvider + 'static) -> Self {
        self.token_provider = Some(Box::new(provider));
        self
    }

    pub fn unauthorized_handler(mut self, handler: impl UnauthorizedHandler + 'static) -> Self {
        self.unauthorized_handler = Some(Box::new(handler));
        self
    }

    pub fn sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Some(Arc::new(sleeper));
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        self.config.validate()?;

        let mut http = reqwest::Client::builder().timeout(self.config.request_timeout());
        if let Some(user_agent) = &self.config.api.user_agent {
            http = http.user_agent(user_agent.clone());
        }
        let http = http.build().map_err(|e| ClientError::ConfigValidationError {
            field: "api".to_string(),
            message: format!("Failed to build HTTP client: {}", e),
        })?;

        let base_url = self.config.api.base_url.trim_end_matches('/').to_string();
        let health = HealthChecker::new(&base_url, self.config.health_check.clone())?;

        // 沒有注入 token provider 時退回設定檔中的 token
        let token_provider = self.token_provider.or_else(|| {
            self.config
                .auth
                .token
                .clone()
                .map(|t| Box::new(StaticToken(t)) as Box<dyn TokenProvider>)
        });

        tracing::debug!("API client ready for {}", base_url);

        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                config: self.config,
                health,
                token_provider,
                unauthorized_handler: self.unauthorized_handler,
                sleeper: self
                    .sleeper
                    .unwrap_or_else(|| Arc::new(TokioSleeper) as Arc<dyn Sleeper>),
                pending: Mutex::new(HashMap::new()),
                next_pending_id: AtomicU64::new(0),
            }),
        })
    }
}

impl ApiClient {
    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            token_provider: None,
            unauthorized_handler: None,
            sleeper: None,
        }
    }

    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.inner.base_url, path)
        } else {
            format!("{}/{}", self.inner.base_url, path)
        }
    }

    pub fn health_check_in_progress(&self) -> bool {
        self.inner.health.is_in_progress()
    }

    /// 目前可被合併的進行中 GET 數量
    pub fn in_flight_requests(&self) -> usize {
        self.pending().len()
    }

    /// 清除進行中的合併請求與健康檢查旗標
    pub fn reset(&self) {
        self.pending().clear();
        self.inner.health.reset();
    }

    /// 手動觸發健康檢查；已有檢查進行中時回傳 `Skipped`
    pub async fn check_health(&self) -> HealthStatus {
        match self.inner.health.try_begin() {
            Some(_guard) => self.inner.health.check(self.inner.sleeper.as_ref()).await,
            None => HealthStatus::Skipped,
        }
    }

    /// 送出請求，必要時重試；失敗時回傳正規化的錯誤
    pub async fn execute(&self, request: &ApiRequest) -> std::result::Result<ApiResponse, ApiError> {
        let url = self.url_for(&request.path);
        let retry = &self.inner.config.retry;
        let mut retry_count: u32 = 0;

        loop {
            let failure = match self.send_once(request, &url).await {
                Ok(response) => {
                    if retry_count > 0 {
                        tracing::info!(
                            "✅ {} {} succeeded after {} retr{}",
                            request.method,
                            url,
                            retry_count,
                            if retry_count == 1 { "y" } else { "ies" }
                        );
                    }
                    return Ok(response);
                }
                Err(failure) => failure,
            };

            let attempts = retry_count + 1;
            let retryable_kind = match &failure {
                AttemptFailure::Status { status, body } => {
                    match classify::classify_status(*status, Some(body), retry) {
                        StatusClass::Auth => {
                            let err = self.auth_error(request, &url, *status, body, attempts);
                            if *status == 401 {
                                tracing::warn!("🔒 {} {} unauthorized", request.method, url);
                                if let Some(handler) = &self.inner.unauthorized_handler {
                                    handler.on_unauthorized(&err);
                                }
                            } else {
                                tracing::warn!("🔒 {} {} forbidden", request.method, url);
                            }
                            return Err(err);
                        }
                        StatusClass::Http => {
                            return Err(self.http_error(request, &url, *status, body, attempts));
                        }
                        StatusClass::BackendRestart => ErrorKind::BackendRestart,
                    }
                }
                AttemptFailure::Transport(e) => match classify::classify_transport(e) {
                    TransportClass::ConnectionRefused => ErrorKind::Network,
                    TransportClass::Timeout => ErrorKind::Timeout,
                    TransportClass::Other => {
                        return Err(self.transport_error(
                            request,
                            &url,
                            ErrorKind::Network,
                            e,
                            attempts,
                        ));
                    }
                },
            };

            if retry_count >= retry.max_retries {
                tracing::error!(
                    "❌ {} {} failed after {} attempt(s), giving up",
                    request.method,
                    url,
                    attempts
                );
                return Err(match failure {
                    AttemptFailure::Status { status, body } => {
                        self.restart_error(request, &url, status, body, attempts)
                    }
                    AttemptFailure::Transport(e) => {
                        self.transport_error(request, &url, retryable_kind, &e, attempts)
                    }
                });
            }

            tracing::warn!(
                "🔄 {} {} looks like a backend restart ({:?}), retry {}/{}",
                request.method,
                url,
                retryable_kind,
                retry_count + 1,
                retry.max_retries
            );
            self.wait_before_retry(retry_count).await;
            retry_count += 1;
        }
    }

    /// GET 並回傳 JSON；相同的並行 GET 共用同一次呼叫
    pub async fn get_json(&self, request: ApiRequest) -> std::result::Result<Value, ApiError> {
        let key = request.dedup_key(&self.url_for(&request.path));

        let shared = {
            let mut pending = self.pending();
            let existing = pending.get(&key).and_then(|entry| entry.handle.upgrade());
            if let Some(existing) = existing {
                tracing::debug!("Joining in-flight request {}", key);
                existing
            } else {
                let id = self.inner.next_pending_id.fetch_add(1, Ordering::Relaxed);
                let cleanup = PendingCleanup {
                    inner: Arc::downgrade(&self.inner),
                    key: key.clone(),
                    id,
                };
                let client = self.clone();
                let future = async move {
                    let _cleanup = cleanup;
                    client.execute(&request).await.map(|r| r.body)
                }
                .boxed()
                .shared();
                if let Some(handle) = future.downgrade() {
                    pending.insert(key, PendingEntry { id, handle });
                }
                future
            }
        };

        shared.await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: Vec<(String, String)>) -> Result<T> {
        let request = ApiRequest::get(path).with_query(query);
        let url = self.url_for(path);
        let body = self.get_json(request).await?;
        decode(&url, body)
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(ApiRequest::post(path).with_json(body)?).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(ApiRequest::put(path).with_json(body)?).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(ApiRequest::patch(path).with_json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(&ApiRequest::delete(path)).await?;
        Ok(())
    }

    /// 送出任意請求並解碼 JSON 回應 (不合併)
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let url = self.url_for(&request.path);
        let response = self.execute(&request).await?;
        decode(&url, response.body)
    }

    async fn send_once(
        &self,
        request: &ApiRequest,
        url: &str,
    ) -> std::result::Result<ApiResponse, AttemptFailure> {
        let mut builder = self.inner.http.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = self.inner.token_provider.as_ref().and_then(|p| p.token()) {
            builder = builder.bearer_auth(token);
        }

        tracing::debug!("➡️ {} {}", request.method, url);
        let response = builder.send().await.map_err(AttemptFailure::Transport)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(AttemptFailure::Transport)?;
        tracing::debug!("⬅️ {} {} -> {}", request.method, url, status);

        let body = parse_body(&text);
        if (200..300).contains(&status) {
            Ok(ApiResponse { status, body })
        } else {
            Err(AttemptFailure::Status { status, body })
        }
    }

    async fn wait_before_retry(&self, retry_count: u32) {
        let retry = &self.inner.config.retry;
        let sleeper = self.inner.sleeper.as_ref();

        match self.inner.health.try_begin() {
            Some(_guard) => {
                tracing::info!("🩺 Checking backend health at {}", self.inner.health.url());
                let status = self.inner.health.check(sleeper).await;
                if !status.is_healthy() {
                    tracing::warn!("🩺 Retrying although health check did not pass: {:?}", status);
                }
            }
            None => {
                tracing::debug!("🩺 Health check already running, waiting instead");
                sleeper.sleep(retry.base_delay()).await;
            }
        }

        let delay = retry_delay(retry.base_delay(), retry.backoff_factor, retry_count);
        tracing::debug!("⏳ Waiting {:?} before retry", delay);
        sleeper.sleep(delay).await;
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, HashMap<String, PendingEntry>> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn base_error(
        &self,
        request: &ApiRequest,
        url: &str,
        kind: ErrorKind,
        message: &str,
        attempts: u32,
    ) -> ApiError {
        ApiError {
            kind,
            status: None,
            message: message.to_string(),
            detail: String::new(),
            server_message: None,
            body: None,
            method: request.method.to_string(),
            url: url.to_string(),
            attempts,
        }
    }

    fn with_response(mut err: ApiError, status: u16, body: &Value) -> ApiError {
        err.status = Some(status);
        err.detail = format!("HTTP {}", status);
        err.server_message = body
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string);
        err.body = (!body.is_null()).then(|| body.clone());
        err
    }

    fn auth_error(
        &self,
        request: &ApiRequest,
        url: &str,
        status: u16,
        body: &Value,
        attempts: u32,
    ) -> ApiError {
        let message = if status == 401 {
            classify::SESSION_EXPIRED_MESSAGE
        } else {
            classify::FORBIDDEN_MESSAGE
        };
        let err = self.base_error(request, url, ErrorKind::Auth, message, attempts);
        Self::with_response(err, status, body)
    }

    fn http_error(
        &self,
        request: &ApiRequest,
        url: &str,
        status: u16,
        body: &Value,
        attempts: u32,
    ) -> ApiError {
        tracing::debug!("{} {} failed with status {}", request.method, url, status);
        let message = classify::status_message(status);
        let err = self.base_error(request, url, ErrorKind::Http, message, attempts);
        Self::with_response(err, status, body)
    }

    fn restart_error(
        &self,
        request: &ApiRequest,
        url: &str,
        status: u16,
        body: Value,
        attempts: u32,
    ) -> ApiError {
        let err = self.base_error(
            request,
            url,
            ErrorKind::BackendRestart,
            classify::BACKEND_RESTART_MESSAGE,
            attempts,
        );
        Self::with_response(err, status, &body)
    }

    fn transport_error(
        &self,
        request: &ApiRequest,
        url: &str,
        kind: ErrorKind,
        source: &reqwest::Error,
        attempts: u32,
    ) -> ApiError {
        let message = match kind {
            ErrorKind::Timeout => classify::TIMEOUT_MESSAGE,
            _ => classify::NETWORK_MESSAGE,
        };
        let mut err = self.base_error(request, url, kind, message, attempts);
        err.detail = source.to_string();
        err
    }
}

/// 解碼回應，容許 `{ "data": ... }` 外層包裝
pub fn decode<T: DeserializeOwned>(url: &str, body: Value) -> Result<T> {
    let direct_error = match serde_json::from_value::<T>(body.clone()) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    if let Value::Object(mut obj) = body {
        if let Some(data) = obj.remove("data") {
            if let Ok(value) = serde_json::from_value::<T>(data) {
                return Ok(value);
            }
        }
    }

    Err(ClientError::DecodeError {
        url: url.to_string(),
        message: direct_error.to_string(),
    })
}
