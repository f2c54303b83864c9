//! API 门面
//!
//! 无论当前使用哪一代接口，都对外提供同一组方法。
//!
//! 自动模式下每次调用：
//! 1. 按会话当前首选版本（初始为新版）解析 URL；
//! 2. 开启探测时先对新版 URL 发 OPTIONS，不可用则直接进入第 3 步；
//! 3. 新版不可用或返回失败响应时，切换到旧版重试同一操作一次；
//! 4. 旧版也失败或没有对应路径时，将失败响应返回给调用方。
//!
//! 新版调用一旦失败，会话首选版本会持久切换为旧版（粘性切换），
//! 只有显式调用 [`CoursewareApi::switch_generation`] 才会恢复。

use std::sync::atomic::{AtomicU8, Ordering};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::endpoints::{EndpointTable, Operation, RequestParams};
use crate::api::envelope::{Attempt, CanonicalResponse, Envelope};
use crate::api::generation::Generation;
use crate::clients::HttpClient;
use crate::config::{ApiVersion, Config, Timeouts};
use crate::error::{AppResult, EndpointError};

/// 会话状态：当前首选的接口版本
#[derive(Debug)]
pub struct ApiSession {
    preferred: AtomicU8,
}

impl ApiSession {
    pub fn new(generation: Generation) -> Self {
        Self {
            preferred: AtomicU8::new(generation.as_u8()),
        }
    }

    pub fn preferred(&self) -> Generation {
        Generation::from_u8(self.preferred.load(Ordering::SeqCst))
    }

    pub fn set_preferred(&self, generation: Generation) {
        self.preferred.store(generation.as_u8(), Ordering::SeqCst);
    }
}

/// 优学院 API 门面
pub struct CoursewareApi {
    http: HttpClient,
    endpoints: EndpointTable,
    version: ApiVersion,
    probe_endpoints: bool,
    timeouts: Timeouts,
    session: ApiSession,
}

impl CoursewareApi {
    /// 根据配置创建门面
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = HttpClient::new(config)?;
        let endpoints = EndpointTable::new(&config.base_api_url);
        Ok(Self::with_parts(http, endpoints, config))
    }

    /// 使用自定义端点表创建门面
    pub fn with_parts(http: HttpClient, endpoints: EndpointTable, config: &Config) -> Self {
        let initial = match config.api_version {
            ApiVersion::Legacy => Generation::Legacy,
            ApiVersion::Auto | ApiVersion::Current => Generation::Current,
        };
        Self {
            http,
            endpoints,
            version: config.api_version,
            probe_endpoints: config.probe_endpoints,
            timeouts: config.timeouts,
            session: ApiSession::new(initial),
        }
    }

    /// 当前使用的接口版本
    pub fn current_generation(&self) -> Generation {
        self.session.preferred()
    }

    /// 手动切换接口版本
    pub fn switch_generation(&self, generation: Generation) {
        self.session.set_preferred(generation);
        info!("已切换到{}API", generation_label(generation));
    }

    /// 通过用户信息接口检测新版是否可用，并据此固定首选版本
    pub async fn detect_best_generation(&self) -> Result<Generation, EndpointError> {
        let attempt = self
            .attempt(Operation::UserInfo, Generation::Current, &RequestParams::new())
            .await?;
        let generation = if attempt.response.is_success() {
            info!("检测到新API可用，使用新API");
            Generation::Current
        } else {
            warn!("新API不可用 ({})，回退到旧API", attempt.response.message());
            Generation::Legacy
        };
        self.session.set_preferred(generation);
        Ok(generation)
    }

    /// 执行一个逻辑操作，按需回退
    ///
    /// 网络与业务失败都以失败的 `CanonicalResponse` 返回；
    /// 只有两代接口都没有该操作时才返回错误。
    pub async fn call(
        &self,
        operation: Operation,
        params: RequestParams,
    ) -> Result<Attempt, EndpointError> {
        let preferred = self.session.preferred();
        let primary = if self.endpoints.has_route(operation, preferred) {
            preferred
        } else if self.version == ApiVersion::Auto
            && self.endpoints.has_route(operation, preferred.other())
        {
            debug!("{} 在{}API中不存在，直接使用{}API", operation, generation_label(preferred), generation_label(preferred.other()));
            preferred.other()
        } else {
            return Err(EndpointError::UnknownOperation {
                operation,
                generation: preferred,
            });
        };

        let first = self.attempt(operation, primary, &params).await?;
        if first.response.is_success() || !self.falls_back_from(primary) {
            return Ok(first);
        }

        // 新版失败：粘性切换到旧版
        self.session.set_preferred(Generation::Legacy);
        if !self.endpoints.has_route(operation, Generation::Legacy) {
            warn!(
                "新API {} 调用失败 ({})，旧API没有对应接口",
                operation,
                first.response.message()
            );
            return Ok(first);
        }

        warn!(
            "新API {} 调用失败 ({})，自动切换到旧API",
            operation,
            first.response.message()
        );
        self.attempt(operation, Generation::Legacy, &params).await
    }

    fn falls_back_from(&self, generation: Generation) -> bool {
        self.version == ApiVersion::Auto && generation == Generation::Current
    }

    /// 针对某一代接口的单次调用
    async fn attempt(
        &self,
        operation: Operation,
        generation: Generation,
        params: &RequestParams,
    ) -> Result<Attempt, EndpointError> {
        let endpoint = self.endpoints.resolve(operation, generation, params)?;

        if generation == Generation::Current
            && self.version == ApiVersion::Auto
            && self.probe_endpoints
            && !self.http.probe(&endpoint.url, self.timeouts.short).await
        {
            return Ok(Attempt::new(
                generation,
                CanonicalResponse::failure(format!("端点不可用: {}", endpoint.url)),
            ));
        }

        let response = match self.http.send(&endpoint, operation.timeout(&self.timeouts)).await {
            Ok(value) => Envelope::classify(value).normalize(),
            Err(e) => {
                warn!("API请求失败: {}", e);
                CanonicalResponse::from_error(&e)
            }
        };

        Ok(Attempt::new(generation, response))
    }

    // ========== 对外的稳定方法集 ==========

    /// 获取课程目录
    pub async fn get_course_directory(
        &self,
        course_id: &str,
        class_id: &str,
    ) -> Result<CanonicalResponse, EndpointError> {
        let params = RequestParams::new()
            .field("courseId", course_id)
            .field("classId", class_id);
        Ok(self.call(Operation::CourseDirectory, params).await?.into_response())
    }

    /// 获取整个章节页面内容
    pub async fn get_whole_chapter_page_content(
        &self,
        node_id: &str,
    ) -> Result<CanonicalResponse, EndpointError> {
        let params = RequestParams::new().field("nodeId", node_id);
        Ok(self.call(Operation::ChapterContent, params).await?.into_response())
    }

    /// 获取题目答案
    pub async fn get_question_answer(
        &self,
        question_id: &str,
        parent_id: &str,
    ) -> Result<CanonicalResponse, EndpointError> {
        let params = RequestParams::new()
            .field("questionId", question_id)
            .field("parentId", parent_id);
        Ok(self.call(Operation::QuestionAnswer, params).await?.into_response())
    }

    /// 获取用户信息
    pub async fn get_user_info(&self) -> Result<CanonicalResponse, EndpointError> {
        Ok(self
            .call(Operation::UserInfo, RequestParams::new())
            .await?
            .into_response())
    }

    /// 获取课程剩余内容
    pub async fn get_course_remaining(
        &self,
        course_id: &str,
    ) -> Result<CanonicalResponse, EndpointError> {
        let params = RequestParams::new().field("courseId", course_id);
        Ok(self.call(Operation::CourseRemaining, params).await?.into_response())
    }

    /// 获取学习记录
    pub async fn get_study_record(
        &self,
        record_id: &str,
    ) -> Result<CanonicalResponse, EndpointError> {
        let params = RequestParams::new().field("recordId", record_id);
        Ok(self.call(Operation::StudyRecord, params).await?.into_response())
    }

    /// 发送学习心跳，未指定时间戳时使用当前毫秒时间
    pub async fn send_study_heartbeat(
        &self,
        record_id: &str,
        timestamp: Option<i64>,
    ) -> Result<CanonicalResponse, EndpointError> {
        let timestamp = timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
        let params = RequestParams::new()
            .field("recordId", record_id)
            .field("timestamp", timestamp);
        Ok(self.call(Operation::StudyHeartbeat, params).await?.into_response())
    }

    /// 同步个人数据
    pub async fn sync_personal_data(
        &self,
        encrypted_data: &str,
    ) -> Result<CanonicalResponse, EndpointError> {
        let params = RequestParams::new().body(Value::String(encrypted_data.to_string()));
        Ok(self.call(Operation::SyncPersonalData, params).await?.into_response())
    }
}

fn generation_label(generation: Generation) -> &'static str {
    match generation {
        Generation::Legacy => "旧",
        Generation::Current => "新",
    }
}
