//! 端点解析
//!
//! 逻辑操作名 + 接口版本 → 具体 URL。路径模板中的 `{name}` 由请求参数替换，
//! 未被路径消费的参数在 GET 时作为查询参数，在 POST 时作为 JSON 请求体。

use std::collections::HashMap;
use std::fmt;

use reqwest::Method;
use serde_json::{Map, Value};

use crate::api::generation::Generation;
use crate::config::Timeouts;
use crate::error::EndpointError;

/// 逻辑操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CourseDirectory,
    ChapterContent,
    QuestionAnswer,
    UserInfo,
    CourseRemaining,
    StudyRecord,
    StudyHeartbeat,
    SyncPersonalData,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::CourseDirectory => "course_directory",
            Operation::ChapterContent => "chapter_content",
            Operation::QuestionAnswer => "question_answer",
            Operation::UserInfo => "user_info",
            Operation::CourseRemaining => "course_remaining",
            Operation::StudyRecord => "study_record",
            Operation::StudyHeartbeat => "study_heartbeat",
            Operation::SyncPersonalData => "sync_personal_data",
        }
    }

    /// 答案查询用短超时，整章内容用长超时
    pub fn timeout(self, timeouts: &Timeouts) -> std::time::Duration {
        match self {
            Operation::QuestionAnswer => timeouts.short,
            Operation::ChapterContent => timeouts.long,
            _ => timeouts.default,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 请求参数（扁平键值，保持插入顺序）
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    fields: Vec<(String, String)>,
    body: Option<Value>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push((key.into(), value.to_string()));
        self
    }

    /// 显式指定 POST 请求体，优先于剩余参数
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    path: String,
}

/// 解析完成、可直接发送的请求
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub operation: Operation,
    pub generation: Generation,
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// 端点表：每个 (操作, 版本) 对应一个路径模板
#[derive(Debug, Clone)]
pub struct EndpointTable {
    base_url: String,
    routes: HashMap<(Operation, Generation), Route>,
}

impl EndpointTable {
    /// 内置的两代接口路径
    pub fn new(base_url: &str) -> Self {
        use Generation::{Current, Legacy};
        use Operation::*;

        Self::empty(base_url)
            // 旧版
            .with_route(CourseDirectory, Legacy, Method::GET, "/course/stu/{courseId}/directory")
            .with_route(ChapterContent, Legacy, Method::GET, "/wholepage/chapter/stu/{nodeId}")
            .with_route(QuestionAnswer, Legacy, Method::GET, "/questionAnswer/{questionId}")
            .with_route(UserInfo, Legacy, Method::GET, "/user")
            // 新版
            .with_route(CourseDirectory, Current, Method::GET, "/uaapi/course/{courseId}/directory")
            .with_route(ChapterContent, Current, Method::GET, "/uaapi/wholepage/chapter/stu/{nodeId}")
            .with_route(QuestionAnswer, Current, Method::GET, "/uaapi/questionAnswer/{questionId}")
            .with_route(UserInfo, Current, Method::GET, "/uaapi/user")
            .with_route(CourseRemaining, Current, Method::GET, "/uaapi/course/{courseId}/remaining")
            .with_route(StudyRecord, Current, Method::GET, "/uaapi/studyrecord/item/{recordId}")
            .with_route(
                StudyHeartbeat,
                Current,
                Method::GET,
                "/uaapi/studyrecord/heartbeat/{recordId}/{timestamp}",
            )
            .with_route(SyncPersonalData, Current, Method::POST, "/uaapi/yws/api/personal/sync")
    }

    /// 不含任何路径的表
    pub fn empty(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            routes: HashMap::new(),
        }
    }

    pub fn with_route(
        mut self,
        operation: Operation,
        generation: Generation,
        method: Method,
        path: impl Into<String>,
    ) -> Self {
        self.routes.insert(
            (operation, generation),
            Route {
                method,
                path: path.into(),
            },
        );
        self
    }

    pub fn has_route(&self, operation: Operation, generation: Generation) -> bool {
        self.routes.contains_key(&(operation, generation))
    }

    /// 解析为可发送的请求
    pub fn resolve(
        &self,
        operation: Operation,
        generation: Generation,
        params: &RequestParams,
    ) -> Result<Endpoint, EndpointError> {
        let route = self.route(operation, generation)?;

        let mut path = route.path.clone();
        let mut rest = Vec::new();
        for (key, value) in &params.fields {
            let placeholder = format!("{{{}}}", key);
            if path.contains(&placeholder) {
                path = path.replace(&placeholder, value);
            } else {
                rest.push((key.clone(), value.clone()));
            }
        }

        if let Some(start) = path.find('{') {
            let end = path[start..].find('}').map(|i| start + i + 1).unwrap_or(path.len());
            return Err(EndpointError::MissingPathParam {
                operation,
                param: path[start..end].trim_matches(|c| c == '{' || c == '}').to_string(),
            });
        }

        let (query, body) = if route.method == Method::GET {
            (rest, None)
        } else if let Some(body) = params.body.clone() {
            (Vec::new(), Some(body))
        } else if rest.is_empty() {
            (Vec::new(), None)
        } else {
            let object: Map<String, Value> = rest
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            (Vec::new(), Some(Value::Object(object)))
        };

        Ok(Endpoint {
            operation,
            generation,
            method: route.method.clone(),
            url: format!("{}{}", self.base_url, path),
            query,
            body,
        })
    }

    fn route(&self, operation: Operation, generation: Generation) -> Result<&Route, EndpointError> {
        self.routes
            .get(&(operation, generation))
            .ok_or(EndpointError::UnknownOperation {
                operation,
                generation,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_path_and_query() {
        let table = EndpointTable::new("https://api.ulearning.cn/");
        let params = RequestParams::new().field("courseId", 46099).field("classId", "851527");

        let legacy = table.resolve(Operation::CourseDirectory, Generation::Legacy, &params).unwrap();
        assert_eq!(legacy.url, "https://api.ulearning.cn/course/stu/46099/directory");
        assert_eq!(legacy.query, vec![("classId".to_string(), "851527".to_string())]);
        assert!(legacy.body.is_none());

        let current = table.resolve(Operation::CourseDirectory, Generation::Current, &params).unwrap();
        assert_eq!(current.url, "https://api.ulearning.cn/uaapi/course/46099/directory");
    }

    #[test]
    fn test_unknown_operation_for_missing_generation() {
        let table = EndpointTable::new("https://api.ulearning.cn");
        let err = table
            .resolve(Operation::StudyHeartbeat, Generation::Legacy, &RequestParams::new())
            .unwrap_err();
        assert!(matches!(
            err,
            EndpointError::UnknownOperation {
                operation: Operation::StudyHeartbeat,
                generation: Generation::Legacy
            }
        ));
    }

    #[test]
    fn test_missing_path_param() {
        let table = EndpointTable::new("https://api.ulearning.cn");
        let err = table
            .resolve(Operation::ChapterContent, Generation::Legacy, &RequestParams::new())
            .unwrap_err();
        match err {
            EndpointError::MissingPathParam { param, .. } => assert_eq!(param, "nodeId"),
            other => panic!("unexpected: {}", other),
        }
    }

    #[test]
    fn test_post_uses_leftover_fields_as_body() {
        let table = EndpointTable::empty("http://localhost")
            .with_route(Operation::SyncPersonalData, Generation::Current, Method::POST, "/sync/{userId}");
        let params = RequestParams::new().field("userId", 7).field("nodeId", 3);
        let endpoint = table.resolve(Operation::SyncPersonalData, Generation::Current, &params).unwrap();
        assert_eq!(endpoint.url, "http://localhost/sync/7");
        assert_eq!(endpoint.body, Some(serde_json::json!({"nodeId": "3"})));
        assert!(endpoint.query.is_empty());
    }

    #[test]
    fn test_operation_timeouts() {
        let timeouts = Timeouts::default();
        assert_eq!(Operation::QuestionAnswer.timeout(&timeouts), timeouts.short);
        assert_eq!(Operation::ChapterContent.timeout(&timeouts), timeouts.long);
        assert_eq!(Operation::UserInfo.timeout(&timeouts), timeouts.default);
    }
}
