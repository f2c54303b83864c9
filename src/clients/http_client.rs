/// HTTP 客户端
///
/// 持有会话与默认请求头（授权令牌、UA），请求带超时，
/// 网络层失败与非 2xx 状态分别返回不同的错误
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::api::Endpoint;
use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult, ConfigError};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/137.0.0.0 Safari/537.36";
const ORIGIN: &str = "https://ua.ulearning.cn";

/// 平台 HTTP 客户端
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// 创建新的客户端，默认请求头只在这里写入一次
    pub fn new(config: &Config) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );
        headers.insert(reqwest::header::ACCEPT_LANGUAGE, HeaderValue::from_static("zh"));
        headers.insert(reqwest::header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(reqwest::header::ORIGIN, HeaderValue::from_static(ORIGIN));
        headers.insert(reqwest::header::REFERER, HeaderValue::from_static("https://ua.ulearning.cn/"));
        headers.insert(
            reqwest::header::AUTHORIZATION,
            token_header("AUTHORIZATION_TOKEN", &config.authorization_token)?,
        );
        headers.insert(
            HeaderName::from_static("ua-authorization"),
            token_header("UA_AUTHORIZATION_TOKEN", &config.ua_authorization_token)?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(config.timeouts.long)
            .build()
            .map_err(|e| AppError::Other(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self { client })
    }

    /// 发送请求并返回解析后的 JSON
    ///
    /// 非 JSON 响应体按字符串返回；空响应体视为失败。
    pub async fn send(&self, endpoint: &Endpoint, timeout: Duration) -> Result<Value, ApiError> {
        debug!("Making {} request to: {}", endpoint.method, endpoint.url);

        let mut request = self
            .client
            .request(endpoint.method.clone(), &endpoint.url)
            .timeout(timeout);
        if !endpoint.query.is_empty() {
            request = request.query(&endpoint.query);
        }
        if let Some(body) = &endpoint.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: endpoint.url.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                url: endpoint.url.clone(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(|source| ApiError::Transport {
            url: endpoint.url.clone(),
            source,
        })?;

        if text.trim().is_empty() {
            return Err(ApiError::EmptyResponse {
                url: endpoint.url.clone(),
            });
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Ok(value),
            Err(_) => Ok(Value::String(text)),
        }
    }

    /// 用无请求体的 OPTIONS 请求探测端点是否可用
    ///
    /// 200 / 204 / 405 视为可用，其余状态以及网络失败视为不可用
    pub async fn probe(&self, url: &str, timeout: Duration) -> bool {
        match self
            .client
            .request(Method::OPTIONS, url)
            .timeout(timeout)
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                debug!("探测 {} -> {}", url, status);
                matches!(
                    status,
                    StatusCode::OK | StatusCode::NO_CONTENT | StatusCode::METHOD_NOT_ALLOWED
                )
            }
            Err(e) => {
                debug!("探测 {} 失败: {}", url, e);
                false
            }
        }
    }
}

fn token_header(var_name: &str, token: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(token).map_err(|_| {
        AppError::Config(ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: token.to_string(),
            expected_type: "HTTP header value".to_string(),
        })
    })
}
