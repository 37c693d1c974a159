use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// 請求失敗的分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 401 / 403，不重試
    Auth,
    /// 無法建立連線或沒有收到回應
    Network,
    /// 超過請求逾時
    Timeout,
    /// 疑似後端重啟 (5xx 或通用 404)，重試用盡後回報
    BackendRestart,
    /// 其他 4xx/5xx
    Http,
}

/// 正規化後的請求錯誤，帶有可直接顯示給使用者的訊息
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    /// 本地化 (越南文) 的使用者訊息
    pub message: String,
    /// 原始錯誤描述，僅供日誌使用
    pub detail: String,
    /// 後端回傳的 `message` 欄位
    pub server_message: Option<String>,
    pub body: Option<Value>,
    pub method: String,
    pub url: String,
    pub attempts: u32,
}

impl ApiError {
    pub fn is_auth_error(&self) -> bool {
        self.kind == ErrorKind::Auth
    }

    pub fn is_network_error(&self) -> bool {
        self.kind == ErrorKind::Network
    }

    pub fn is_timeout_error(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }

    pub fn is_backend_restart(&self) -> bool {
        self.kind == ErrorKind::BackendRestart
    }

    /// 別名，對應 UI 層慣用的 `userMessage`
    pub fn user_message(&self) -> &str {
        &self.message
    }

    /// 取出 400 回應中 `errors` 物件每個欄位的第一則訊息
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        let mut result = BTreeMap::new();
        let Some(errors) = self
            .body
            .as_ref()
            .and_then(|b| b.get("errors"))
            .and_then(|e| e.as_object())
        else {
            return result;
        };

        for (field, value) in errors {
            let first = match value {
                Value::String(s) => Some(s.clone()),
                Value::Array(items) => items.iter().find_map(|v| v.as_str().map(str::to_string)),
                _ => None,
            };
            if let Some(message) = first {
                result.insert(field.clone(), message);
            }
        }
        result
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Response decode error for {url}: {message}")]
    DecodeError { url: String, message: String },

    #[error("Configuration validation error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Network,
    Server,
    Request,
    Configuration,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ClientError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ClientError::Api(e) => match e.kind {
                ErrorKind::Auth => ErrorCategory::Authentication,
                ErrorKind::Network | ErrorKind::Timeout => ErrorCategory::Network,
                ErrorKind::BackendRestart => ErrorCategory::Server,
                ErrorKind::Http => ErrorCategory::Request,
            },
            ClientError::ConfigValidationError { .. }
            | ClientError::InvalidConfigValueError { .. }
            | ClientError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ClientError::IoError(_)
            | ClientError::SerializationError(_)
            | ClientError::DecodeError { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::Server => ErrorSeverity::Medium,
            ErrorCategory::Authentication | ErrorCategory::Request | ErrorCategory::Data => {
                ErrorSeverity::High
            }
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ClientError::Api(e) => e.message.clone(),
            ClientError::DecodeError { .. } | ClientError::SerializationError(_) => {
                "Dữ liệu phản hồi từ máy chủ không hợp lệ.".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Authentication => "Đăng nhập lại hoặc kiểm tra quyền của tài khoản.",
            ErrorCategory::Network => "Kiểm tra kết nối mạng và địa chỉ máy chủ (base_url).",
            ErrorCategory::Server => "Máy chủ có thể đang khởi động lại, hãy thử lại sau ít phút.",
            ErrorCategory::Request => "Kiểm tra lại dữ liệu gửi lên.",
            ErrorCategory::Configuration => "Kiểm tra tệp cấu hình và các biến môi trường.",
            ErrorCategory::Data => "Kiểm tra phiên bản API của máy chủ.",
        }
    }

    /// 若為請求錯誤則回傳底層 `ApiError`
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            ClientError::Api(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
