//! # Ulearning Export
//!
//! 把优学院课件中的题目导出为刷题平台导入格式的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Clients）
//! - `clients/` - 持有 HTTP 会话与默认请求头，只暴露请求能力
//! - `HttpClient` - 带超时的 GET/POST，区分网络失败与状态码失败
//!
//! ### ② 接口层（API）
//! - `api/` - 两代平台接口的统一门面
//! - `EndpointTable` - 操作名 + 版本 → 具体路径
//! - `Envelope` - 三种响应外形 → `CanonicalResponse`
//! - `CoursewareApi` - 稳定方法集、自动回退与粘性切换
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单道题或一组结果
//! - `html_text` - HTML 转纯文本、填空位置识别
//! - `question_normalizer` - 题型推断与题干重建
//! - `export_writer` - JSON / 刷题平台导入文本 / 单题详情
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"一个章节"的完整导出流程
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/` - 课程目录、章节筛选、结果写出与统计
//!
//! ## 模块结构

pub mod api;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use api::{CanonicalResponse, CoursewareApi, Generation};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{CanonicalQuestion, QuestionKind};
pub use orchestrator::{App, ExportSummary};
pub use services::normalize;
pub use workflow::{ChapterCtx, ChapterFlow, ChapterResult};
