use crate::utils::error::{ClientError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_BASE_URL: &str = "AUTOCARE_API_URL";
pub const ENV_TOKEN: &str = "AUTOCARE_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub health_check: HealthCheckConfig,
    pub auth: AuthConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub user_agent: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_ms: 30_000,
            user_agent: None,
        }
    }
}

/// 404 是否視為後端重啟
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotFoundRetry {
    /// 所有 404 都重試
    Always,
    /// 只有沒有錯誤碼、且訊息為通用「找不到」字樣的 404 才重試
    GenericMessage,
    /// 404 一律視為一般錯誤
    Never,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub backoff_factor: f64,
    pub not_found: NotFoundRetry,
    /// 以 `*` 結尾表示前綴比對，否則需完全相同 (不分大小寫)
    pub generic_not_found_phrases: Vec<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            backoff_factor: 1.5,
            not_found: NotFoundRetry::GenericMessage,
            generic_not_found_phrases: vec![
                "not found".to_string(),
                "không tìm thấy".to_string(),
                "cannot get*".to_string(),
                "no handler found*".to_string(),
                "no static resource*".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    pub path: String,
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            path: "/health".to_string(),
            timeout_ms: 3000,
            max_attempts: 5,
            base_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub time_slot_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            time_slot_ttl_secs: 60,
        }
    }
}

impl ClientConfig {
    /// 指定 base URL，其餘使用預設值
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.api.base_url = base_url.into();
        config
    }

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ClientError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let mut config: ClientConfig =
            toml::from_str(&processed_content).map_err(|e| ClientError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;

        // 未設定的 ${AUTOCARE_TOKEN} 會原樣留下，視為沒有 token
        if config
            .auth
            .token
            .as_deref()
            .is_some_and(|t| t.trim().is_empty() || t.starts_with("${"))
        {
            config.auth.token = None;
        }

        Ok(config)
    }

    /// 只使用預設值與環境變數
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// `AUTOCARE_API_URL` / `AUTOCARE_TOKEN` 覆寫檔案中的設定
    pub fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = std::env::var(ENV_BASE_URL) {
            if !base_url.trim().is_empty() {
                self.api.base_url = base_url;
            }
        }
        if let Ok(token) = std::env::var(ENV_TOKEN) {
            if !token.trim().is_empty() {
                self.auth.token = Some(token);
            }
        }
    }

    /// 替換環境變數 (例如 ${AUTOCARE_API_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ClientError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.api.timeout_ms)
    }

    pub fn time_slot_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.time_slot_ttl_secs)
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl HealthCheckConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl Validate for ClientConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("api.base_url", &self.api.base_url)?;
        validation::validate_positive_number("api.timeout_ms", self.api.timeout_ms, 1)?;
        validation::validate_range("retry.max_retries", self.retry.max_retries, 0, 10)?;
        validation::validate_range("retry.backoff_factor", self.retry.backoff_factor, 1.0, 10.0)?;
        validation::validate_endpoint_path("health_check.path", &self.health_check.path)?;
        validation::validate_positive_number(
            "health_check.timeout_ms",
            self.health_check.timeout_ms,
            1,
        )?;
        validation::validate_positive_number(
            "health_check.max_attempts",
            u64::from(self.health_check.max_attempts),
            1,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay_ms, 1000);
        assert_eq!(config.retry.backoff_factor, 1.5);
        assert_eq!(config.health_check.timeout_ms, 3000);
        assert_eq!(config.health_check.max_attempts, 5);
        assert_eq!(config.retry.not_found, NotFoundRetry::GenericMessage);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_content = r#"
[api]
base_url = "https://garage.example.com/api"

[retry]
max_retries = 2
not_found = "never"

[health_check]
path = "/actuator/health"
"#;

        let config = ClientConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api.base_url, "https://garage.example.com/api");
        assert_eq!(config.api.timeout_ms, 30_000);
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.base_delay_ms, 1000);
        assert_eq!(config.retry.not_found, NotFoundRetry::Never);
        assert_eq!(config.health_check.path, "/actuator/health");
        assert_eq!(config.health_check.max_attempts, 5);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("AUTOCARE_TEST_BASE_URL", "https://test.garage.vn/api");

        let toml_content = r#"
[api]
base_url = "${AUTOCARE_TEST_BASE_URL}"

[auth]
token = "${AUTOCARE_TEST_UNSET_TOKEN}"
"#;

        let config = ClientConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api.base_url, "https://test.garage.vn/api");
        assert!(config.auth.token.is_none());

        std::env::remove_var("AUTOCARE_TEST_BASE_URL");
    }

    #[test]
    fn test_config_validation() {
        let config = ClientConfig::with_base_url("invalid-url");
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.health_check.path = "health".to_string();
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.retry.backoff_factor = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = ClientConfig::from_toml_str("[api\nbase_url = 1").unwrap_err();
        assert!(matches!(err, ClientError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[cache]\ntime_slot_ttl_secs = 5\n")
            .unwrap();

        let config = ClientConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.time_slot_ttl(), Duration::from_secs(5));
    }
}
