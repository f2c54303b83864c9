//! API 模块
//!
//! 负责与优学院平台两代接口的交互：端点解析、响应归一化以及版本回退

pub mod endpoints;
pub mod envelope;
pub mod facade;
pub mod generation;

// 重新导出常用类型
pub use endpoints::{Endpoint, EndpointTable, Operation, RequestParams};
pub use envelope::{Attempt, CanonicalResponse, Envelope};
pub use facade::{ApiSession, CoursewareApi};
pub use generation::Generation;
