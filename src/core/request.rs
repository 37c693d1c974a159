use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

/// 一次呼叫的完整描述；重試時原樣重送
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> serde_json::Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// 合併相同 GET 請求時使用的鍵
    pub(crate) fn dedup_key(&self, url: &str) -> String {
        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        format!("{} {}?{}", self.method, url, query)
    }
}

/// 成功的回應；body 無法解析為 JSON 時以字串保存，空 body 為 `Null`
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

pub(crate) fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_and_dedup_key() {
        let request = ApiRequest::get("/centers").with_query([("page", "0"), ("size", "10")]);
        assert_eq!(
            request.dedup_key("http://localhost/api/centers"),
            "GET http://localhost/api/centers?page=0&size=10"
        );
    }

    #[test]
    fn test_with_json_body() {
        let request = ApiRequest::post("/auth/login")
            .with_json(&json!({"username": "admin"}))
            .unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.body, Some(json!({"username": "admin"})));
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body("{\"a\":1}"), json!({"a": 1}));
        assert_eq!(parse_body("Cannot GET /x"), json!("Cannot GET /x"));
    }
}
