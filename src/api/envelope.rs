//! 响应归一化
//!
//! 平台返回三种外形：`{code:200,data}`、`{success:true,data}` 以及裸数据。
//! 先分类为 [`Envelope`]，再统一折叠为 [`CanonicalResponse`]。

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::api::generation::Generation;
use crate::error::ApiError;

const SUCCESS_MESSAGE: &str = "请求成功";
const FAILURE_MESSAGE: &str = "请求失败";

/// 统一响应 `{success, message, data}`
///
/// 失败的响应永远不携带数据；成功的响应也可能没有数据。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalResponse {
    success: bool,
    message: String,
    data: Option<Value>,
}

impl CanonicalResponse {
    pub fn success(data: Option<Value>) -> Self {
        Self {
            success: true,
            message: SUCCESS_MESSAGE.to_string(),
            data: data.filter(|v| !v.is_null()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    pub fn from_error(err: &ApiError) -> Self {
        Self::failure(err.to_string())
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<Value> {
        self.data
    }

    /// 将数据反序列化为具体类型；失败响应或无数据时返回 `Ok(None)`
    pub fn parse_data<T: DeserializeOwned>(&self) -> Result<Option<T>, ApiError> {
        match &self.data {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| ApiError::JsonParseFailed { source }),
            None => Ok(None),
        }
    }
}

/// 一次针对某一代接口的调用结果
#[derive(Debug, Clone)]
pub struct Attempt {
    pub generation: Generation,
    pub response: CanonicalResponse,
}

impl Attempt {
    pub fn new(generation: Generation, response: CanonicalResponse) -> Self {
        Self {
            generation,
            response,
        }
    }

    pub fn into_response(self) -> CanonicalResponse {
        self.response
    }
}

/// 原始响应外形
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// `{code, message?, data?}`，code 为 200 即成功
    Coded {
        code: Option<i64>,
        message: Option<String>,
        data: Option<Value>,
    },
    /// `{success, message?, data?}`
    Flagged {
        success: bool,
        message: Option<String>,
        data: Option<Value>,
    },
    /// 没有外壳的裸数据
    Bare(Value),
}

impl Envelope {
    pub fn classify(value: Value) -> Self {
        let Value::Object(mut object) = value else {
            return Envelope::Bare(value);
        };

        let message = object
            .get("message")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        if let Some(code) = object.get("code") {
            let code = code_value(code);
            return Envelope::Coded {
                code,
                message,
                data: object.remove("data"),
            };
        }

        if let Some(flag) = object.get("success") {
            let success = truthy(flag);
            return Envelope::Flagged {
                success,
                message,
                data: object.remove("data"),
            };
        }

        Envelope::Bare(Value::Object(object))
    }

    pub fn normalize(self) -> CanonicalResponse {
        match self {
            Envelope::Coded { code: Some(200), data, .. } => CanonicalResponse::success(data),
            Envelope::Coded { code, message, .. } => CanonicalResponse::failure(
                ApiError::UnsuccessfulEnvelope {
                    code,
                    message: message.unwrap_or_else(|| FAILURE_MESSAGE.to_string()),
                }
                .to_string(),
            ),
            Envelope::Flagged { success: true, data, .. } => CanonicalResponse::success(data),
            Envelope::Flagged { message, .. } => CanonicalResponse::failure(
                ApiError::UnsuccessfulEnvelope {
                    code: None,
                    message: message.unwrap_or_else(|| FAILURE_MESSAGE.to_string()),
                }
                .to_string(),
            ),
            Envelope::Bare(Value::Null) => CanonicalResponse::failure("API返回空结果"),
            Envelope::Bare(value) => CanonicalResponse::success(Some(value)),
        }
    }
}

fn code_value(code: &Value) -> Option<i64> {
    match code {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Null => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coded_envelope() {
        let ok = Envelope::classify(json!({"code": 200, "data": {"coursename": "数据结构"}})).normalize();
        assert!(ok.is_success());
        assert_eq!(ok.data(), Some(&json!({"coursename": "数据结构"})));

        let failed = Envelope::classify(json!({"code": 404, "message": "not found", "data": {"x": 1}})).normalize();
        assert!(!failed.is_success());
        assert!(failed.data().is_none());
        assert!(failed.message().contains("not found"));
    }

    #[test]
    fn test_code_as_string() {
        let ok = Envelope::classify(json!({"code": "200", "data": [1, 2]})).normalize();
        assert!(ok.is_success());
    }

    #[test]
    fn test_flagged_envelope() {
        let ok = Envelope::classify(json!({"success": true, "data": null})).normalize();
        assert!(ok.is_success());
        assert!(ok.data().is_none());

        let failed = Envelope::classify(json!({"success": false})).normalize();
        assert!(!failed.is_success());
        assert!(failed.message().contains(FAILURE_MESSAGE));
    }

    #[test]
    fn test_bare_payload() {
        let payload = json!({"chapters": [], "coursename": "高数"});
        let ok = Envelope::classify(payload.clone()).normalize();
        assert!(ok.is_success());
        assert_eq!(ok.into_data(), Some(payload));

        let text = Envelope::classify(json!("plain text")).normalize();
        assert_eq!(text.data(), Some(&json!("plain text")));

        assert!(!Envelope::classify(Value::Null).normalize().is_success());
    }

    #[test]
    fn test_parse_data() {
        #[derive(serde::Deserialize)]
        struct User {
            name: String,
        }
        let response = CanonicalResponse::success(Some(json!({"name": "张三"})));
        let user: User = response.parse_data().unwrap().unwrap();
        assert_eq!(user.name, "张三");

        let failed = CanonicalResponse::failure("x");
        assert!(failed.parse_data::<User>().unwrap().is_none());
    }
}
