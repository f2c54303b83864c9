//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一门课程的导出调度，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! course_exporter (处理 Vec<Chapter>)
//!     ↓
//! workflow::ChapterFlow (处理单个章节及其题目)
//!     ↓
//! services (能力层：归一化 / HTML 文本 / 写出)
//!     ↓
//! api::CoursewareApi (两代接口的统一门面)
//!     ↓
//! clients::HttpClient (基础设施)
//! ```
//!
//! ## 设计原则
//!
//! 1. **顺序执行**：一章处理完再开始下一章，没有并发请求
//! 2. **资源隔离**：只有编排层持有 API 门面
//! 3. **无业务逻辑**：只做调度和统计，不做题目的具体判断

pub mod course_exporter;

// 重新导出主要类型
pub use course_exporter::{App, ExportSummary};
