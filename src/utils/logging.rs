/// 日志工具模块
///
/// 提供日志初始化以及格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::Generation;
use crate::config::{ApiVersion, Config};

/// 初始化 tracing 订阅者
///
/// 日志级别取自 `RUST_LOG`，未设置时为 `info`。重复调用不会报错。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 优学院课件题目导出");
    info!("📚 课程ID: {}  班级ID: {}", config.course_id, config.class_id);
    info!("🌐 API地址: {}", config.base_api_url);
    info!("🔀 API版本: {}", api_version_label(config.api_version));
    info!("📁 输出目录: {}", config.base_output_dir);
    info!("{}", "=".repeat(60));
}

/// 记录课程目录加载信息
///
/// # 参数
/// - `course_name`: 课程名称
/// - `total`: 章节总数
/// - `selected`: 本次要导出的章节数
pub fn log_directory_loaded(course_name: &str, total: usize, selected: usize) {
    info!("✓ 课程: {}", course_name);
    info!("📋 共 {} 个章节，本次导出 {} 个\n", total, selected);
}

/// 记录章节开始信息
///
/// # 参数
/// - `index`: 章节序号（从1开始）
/// - `total`: 本次导出的章节总数
/// - `title`: 章节标题
/// - `node_id`: 章节 nodeId
pub fn log_chapter_start(index: usize, total: usize, title: &str, node_id: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📖 开始处理第 {}/{} 章: {}", index, total, title);
    info!("🆔 NodeID: {}", node_id);
    info!("{}", "=".repeat(60));
}

/// 记录章节完成信息
pub fn log_chapter_complete(index: usize, units: usize, questions: usize, degraded: usize) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 第 {} 章完成: 单元 {}, 题目 {}, 需人工复核 {}",
        index, units, questions, degraded
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `exported`: 成功导出的章节数
/// - `skipped`: 跳过的章节数
/// - `questions`: 题目总数
/// - `generation`: 结束时使用的接口版本
pub fn print_final_stats(exported: usize, skipped: usize, questions: usize, generation: Generation) {
    info!("\n{}", "=".repeat(60));
    info!("📊 导出完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功章节: {}", exported);
    info!("❌ 跳过章节: {}", skipped);
    info!("📝 题目总数: {}", questions);
    info!("🔀 最终API版本: {}", generation);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

fn api_version_label(version: ApiVersion) -> &'static str {
    match version {
        ApiVersion::Auto => "auto（优先新版，失败回退旧版）",
        ApiVersion::Legacy => "old",
        ApiVersion::Current => "new",
    }
}
