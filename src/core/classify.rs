//! 失敗回應的分類與本地化訊息。
//!
//! 分類只看狀態碼與傳輸層錯誤；404 是否重試由 [`NotFoundRetry`] 決定。

use crate::config::client_config::{NotFoundRetry, RetryConfig};
use serde_json::Value;

pub const SESSION_EXPIRED_MESSAGE: &str = "Phiên đăng nhập đã hết hạn. Vui lòng đăng nhập lại.";
pub const FORBIDDEN_MESSAGE: &str = "Bạn không có quyền thực hiện thao tác này.";
pub const NETWORK_MESSAGE: &str =
    "Không thể kết nối đến máy chủ. Vui lòng kiểm tra kết nối mạng và thử lại.";
pub const TIMEOUT_MESSAGE: &str = "Yêu cầu đã quá thời gian chờ. Vui lòng thử lại.";
pub const BACKEND_RESTART_MESSAGE: &str =
    "Máy chủ đang khởi động lại hoặc tạm thời không khả dụng. Vui lòng thử lại sau giây lát.";
pub const GENERIC_MESSAGE: &str = "Đã xảy ra lỗi. Vui lòng thử lại sau.";

/// 有回應時的分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Auth,
    BackendRestart,
    Http,
}

/// 沒有回應時的分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportClass {
    ConnectionRefused,
    Timeout,
    Other,
}

impl TransportClass {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportClass::Other)
    }
}

pub fn classify_status(status: u16, body: Option<&Value>, retry: &RetryConfig) -> StatusClass {
    match status {
        401 | 403 => StatusClass::Auth,
        500 | 502 | 503 | 504 => StatusClass::BackendRestart,
        404 => match retry.not_found {
            NotFoundRetry::Always => StatusClass::BackendRestart,
            NotFoundRetry::Never => StatusClass::Http,
            NotFoundRetry::GenericMessage => {
                if is_generic_not_found(body, &retry.generic_not_found_phrases) {
                    StatusClass::BackendRestart
                } else {
                    StatusClass::Http
                }
            }
        },
        _ => StatusClass::Http,
    }
}

pub fn classify_transport(err: &reqwest::Error) -> TransportClass {
    if err.is_timeout() {
        TransportClass::Timeout
    } else if err.is_connect() {
        TransportClass::ConnectionRefused
    } else {
        TransportClass::Other
    }
}

/// 判斷 404 是否只是路由尚未就緒的通用回應，而非業務上的「資源不存在」。
///
/// 帶有後端錯誤碼 (`code` / `errorCode`) 的回應一律視為業務錯誤。
pub fn is_generic_not_found(body: Option<&Value>, phrases: &[String]) -> bool {
    let message = match body {
        None | Some(Value::Null) => return true,
        Some(Value::String(text)) => Some(text.as_str()),
        Some(Value::Object(obj)) => {
            let has_code = ["code", "errorCode"]
                .iter()
                .any(|key| obj.get(*key).is_some_and(|v| !v.is_null()));
            if has_code {
                return false;
            }
            obj.get("message")
                .or_else(|| obj.get("error"))
                .and_then(|v| v.as_str())
        }
        Some(_) => None,
    };

    let Some(message) = message else {
        return true;
    };

    let normalized = message.trim().trim_end_matches('.').to_lowercase();
    if normalized.is_empty() {
        return true;
    }

    phrases.iter().any(|phrase| {
        let phrase = phrase.trim().to_lowercase();
        match phrase.strip_suffix('*') {
            Some(prefix) => normalized.starts_with(prefix),
            None => normalized == phrase,
        }
    })
}

/// 狀態碼對應的使用者訊息
pub fn status_message(status: u16) -> &'static str {
    match status {
        400 => "Dữ liệu gửi lên không hợp lệ.",
        401 => SESSION_EXPIRED_MESSAGE,
        403 => FORBIDDEN_MESSAGE,
        404 => "Không tìm thấy dữ liệu yêu cầu.",
        405 => "Phương thức không được hỗ trợ.",
        408 => TIMEOUT_MESSAGE,
        409 => "Dữ liệu bị xung đột hoặc đã tồn tại.",
        413 => "Dữ liệu gửi lên quá lớn.",
        422 => "Dữ liệu không thể xử lý.",
        429 => "Bạn đã gửi quá nhiều yêu cầu. Vui lòng thử lại sau.",
        500 => "Lỗi máy chủ nội bộ. Vui lòng thử lại sau.",
        502 => "Máy chủ trung gian không phản hồi hợp lệ.",
        503 => "Dịch vụ tạm thời không khả dụng.",
        504 => "Máy chủ phản hồi quá chậm.",
        _ => GENERIC_MESSAGE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn retry_with(policy: NotFoundRetry) -> RetryConfig {
        RetryConfig {
            not_found: policy,
            ..RetryConfig::default()
        }
    }

    #[test]
    fn test_auth_statuses() {
        let retry = RetryConfig::default();
        assert_eq!(classify_status(401, None, &retry), StatusClass::Auth);
        assert_eq!(classify_status(403, None, &retry), StatusClass::Auth);
    }

    #[test]
    fn test_server_errors_are_backend_restart() {
        let retry = RetryConfig::default();
        for status in [500, 502, 503, 504] {
            assert_eq!(classify_status(status, None, &retry), StatusClass::BackendRestart);
        }
        assert_eq!(classify_status(501, None, &retry), StatusClass::Http);
        assert_eq!(classify_status(400, None, &retry), StatusClass::Http);
    }

    #[test]
    fn test_not_found_policies() {
        let domain_404 = json!({"message": "Không tìm thấy trung tâm với id 9"});

        let always = retry_with(NotFoundRetry::Always);
        assert_eq!(
            classify_status(404, Some(&domain_404), &always),
            StatusClass::BackendRestart
        );

        let never = retry_with(NotFoundRetry::Never);
        assert_eq!(classify_status(404, None, &never), StatusClass::Http);

        let generic = retry_with(NotFoundRetry::GenericMessage);
        assert_eq!(
            classify_status(404, Some(&domain_404), &generic),
            StatusClass::Http
        );
        assert_eq!(
            classify_status(404, Some(&json!({"message": "Không tìm thấy"})), &generic),
            StatusClass::BackendRestart
        );
    }

    #[test]
    fn test_generic_not_found_detection() {
        let phrases = RetryConfig::default().generic_not_found_phrases;

        assert!(is_generic_not_found(None, &phrases));
        assert!(is_generic_not_found(Some(&json!({"message": "Not Found."})), &phrases));
        assert!(is_generic_not_found(
            Some(&json!("Cannot GET /api/centers")),
            &phrases
        ));
        assert!(is_generic_not_found(
            Some(&json!({"status": 404, "error": "Not Found"})),
            &phrases
        ));
        assert!(!is_generic_not_found(
            Some(&json!({"message": "Not found", "code": "CENTER_NOT_FOUND"})),
            &phrases
        ));
        assert!(!is_generic_not_found(
            Some(&json!({"message": "Không tìm thấy xe"})),
            &phrases
        ));
    }

    #[test]
    fn test_status_message_fallback() {
        assert_eq!(status_message(418), GENERIC_MESSAGE);
        assert!(status_message(401).contains("đăng nhập"));
    }
}
