use crate::config::client_config::HealthCheckConfig;
use crate::core::backoff::retry_delay;
use crate::domain::ports::Sleeper;
use crate::utils::error::{ClientError, Result};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};

/// 健康檢查延遲的成長倍率
const HEALTH_BACKOFF_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy { attempts: u32 },
    Unhealthy { attempts: u32, last_error: String },
    /// 已有另一個檢查在進行中
    Skipped,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy { .. })
    }
}

#[derive(Debug, Deserialize)]
struct HealthPayload {
    status: Option<String>,
}

/// 後端健康檢查；同一個 client 同時間只會有一個檢查在跑
pub struct HealthChecker {
    client: reqwest::Client,
    url: String,
    config: HealthCheckConfig,
    in_progress: AtomicBool,
}

/// 持有期間代表檢查進行中，drop 時清除旗標
pub struct HealthCheckGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for HealthCheckGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl HealthChecker {
    pub fn new(base_url: &str, config: HealthCheckConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::ConfigValidationError {
                field: "health_check".to_string(),
                message: format!("Failed to build health check client: {}", e),
            })?;

        Ok(Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), config.path),
            config,
            in_progress: AtomicBool::new(false),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// 搶到旗標才回傳 guard
    pub fn try_begin(&self) -> Option<HealthCheckGuard<'_>> {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| HealthCheckGuard {
                flag: &self.in_progress,
            })
    }

    pub fn reset(&self) {
        self.in_progress.store(false, Ordering::Release);
    }

    /// 探測健康端點，失敗時以 `base × 1.5^attempt` 間隔重試
    pub async fn check(&self, sleeper: &dyn Sleeper) -> HealthStatus {
        let mut last_error = String::new();

        for attempt in 0..self.config.max_attempts {
            match self.probe_once().await {
                Ok(()) => {
                    tracing::info!("🩺 Backend healthy after {} attempt(s)", attempt + 1);
                    return HealthStatus::Healthy {
                        attempts: attempt + 1,
                    };
                }
                Err(e) => {
                    tracing::debug!(
                        "🩺 Health check attempt {}/{} failed: {}",
                        attempt + 1,
                        self.config.max_attempts,
                        e
                    );
                    last_error = e;
                }
            }

            if attempt + 1 < self.config.max_attempts {
                let delay = retry_delay(self.config.base_delay(), HEALTH_BACKOFF_FACTOR, attempt);
                sleeper.sleep(delay).await;
            }
        }

        tracing::warn!(
            "🩺 Backend still unhealthy after {} attempts: {}",
            self.config.max_attempts,
            last_error
        );
        HealthStatus::Unhealthy {
            attempts: self.config.max_attempts,
            last_error,
        }
    }

    async fn probe_once(&self) -> std::result::Result<(), String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("status {}", status));
        }

        // 沒有 JSON 或沒有 status 欄位時只看 HTTP 狀態碼
        let text = response.text().await.unwrap_or_default();
        if let Ok(HealthPayload {
            status: Some(reported),
        }) = serde_json::from_str::<HealthPayload>(&text)
        {
            if reported.eq_ignore_ascii_case("down") {
                return Err(format!("backend reported status {}", reported));
            }
        }
        Ok(())
    }
}
