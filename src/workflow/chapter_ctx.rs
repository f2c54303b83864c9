//! 章节处理上下文
//!
//! 封装"我正在导出哪门课的第几章"这一信息

use std::fmt::Display;

/// 章节处理上下文
#[derive(Debug, Clone)]
pub struct ChapterCtx {
    /// 课程名称
    pub course_name: String,

    /// 章节 nodeId
    pub node_id: String,

    /// 章节标题
    pub title: String,

    /// 章节序号（从1开始，仅用于日志显示）
    pub index: usize,
}

impl ChapterCtx {
    /// 创建新的章节上下文
    pub fn new(course_name: String, node_id: String, title: String, index: usize) -> Self {
        Self {
            course_name,
            node_id,
            title,
            index,
        }
    }
}

impl Display for ChapterCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[章节 #{} NodeID#{}]", self.index, self.node_id)
    }
}
