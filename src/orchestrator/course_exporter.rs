//! 课程导出器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一门课程的完整导出。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：创建 API 门面，按需检测可用的接口版本
//! 2. **目录加载**：获取课程目录，失败时中止整次导出
//! 3. **章节筛选**：按 `SELECTED_CHAPTERS` 选出要导出的章节
//! 4. **顺序处理**：逐章委托 `ChapterFlow`，一章结束后再开始下一章
//! 5. **结果写出**：JSON 和/或刷题平台导入文本
//! 6. **全局统计**：汇总所有章节的处理结果

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use crate::api::CoursewareApi;
use crate::config::{ApiVersion, Config};
use crate::error::BusinessError;
use crate::models::{CanonicalQuestion, ChapterEntry, CourseDirectory};
use crate::services::ExportWriter;
use crate::utils::logging::{
    log_chapter_complete, log_chapter_start, log_directory_loaded, log_startup, print_final_stats,
};
use crate::workflow::{ChapterCtx, ChapterFlow, ChapterResult};

/// 一次导出的汇总
#[derive(Debug, Default, Clone)]
pub struct ExportSummary {
    /// 课程名称
    pub course_name: String,
    /// 本次选中的章节数
    pub chapters_selected: usize,
    /// 成功导出的章节数
    pub chapters_exported: usize,
    /// 因内容获取失败而跳过的章节数
    pub chapters_skipped: usize,
    /// 导出的题目
    pub questions: Vec<CanonicalQuestion>,
    /// 生成的文件
    pub written: Vec<PathBuf>,
}

/// 应用主结构
pub struct App {
    config: Config,
    api: CoursewareApi,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        log_startup(&config);

        let api = CoursewareApi::new(&config)?;
        let app = Self::with_api(config, api);

        if app.config.api_version == ApiVersion::Auto && app.config.detect_api_on_start {
            info!("🔍 正在检测可用的API版本...");
            app.api.detect_best_generation().await?;
        }

        Ok(app)
    }

    /// 使用已创建的门面构建应用
    pub fn with_api(config: Config, api: CoursewareApi) -> Self {
        Self { config, api }
    }

    pub fn api(&self) -> &CoursewareApi {
        &self.api
    }

    /// 运行应用主逻辑
    ///
    /// 只有课程目录获取失败会返回错误；单章、单题的失败只记录日志。
    pub async fn run(&self) -> Result<ExportSummary> {
        let directory = self.load_directory().await?;
        let course_name = directory
            .coursename
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("UnknownCourse_{}", self.config.course_id));

        let mut summary = ExportSummary {
            course_name: course_name.clone(),
            ..Default::default()
        };

        if directory.chapters.is_empty() {
            warn!(
                "⚠️ {}，程序结束",
                BusinessError::NoChapters {
                    course_id: self.config.course_id.clone(),
                }
            );
            return Ok(summary);
        }

        let chapters: Vec<(&ChapterEntry, &str)> = directory
            .chapters
            .iter()
            .filter_map(|chapter| match chapter.nodeid.as_deref() {
                Some(node_id) => Some((chapter, node_id)),
                None => {
                    warn!(
                        "跳过缺少 nodeId 的章节: {}",
                        chapter.nodetitle.as_deref().unwrap_or("未命名章节")
                    );
                    None
                }
            })
            .filter(|(_, node_id)| self.config.export.chapters.includes(node_id))
            .collect();

        summary.chapters_selected = chapters.len();
        log_directory_loaded(&course_name, directory.chapters.len(), chapters.len());

        let writer = ExportWriter::prepare(
            Path::new(&self.config.base_output_dir),
            &self.config.course_id,
            &course_name,
        )?;
        let flow = ChapterFlow::new(&self.api, &self.config, &writer);

        for (index, (chapter, node_id)) in chapters.iter().enumerate() {
            let index = index + 1;
            let title = chapter
                .nodetitle
                .clone()
                .unwrap_or_else(|| format!("UnknownChapter_{}", index));
            log_chapter_start(index, chapters.len(), &title, node_id);

            let ctx = ChapterCtx::new(course_name.clone(), node_id.to_string(), title, index);
            match flow.run(&ctx).await? {
                ChapterResult::Exported { questions, stats } => {
                    log_chapter_complete(index, stats.units, stats.questions, stats.degraded);
                    summary.chapters_exported += 1;
                    summary.questions.extend(questions);
                }
                ChapterResult::Skipped { reason } => {
                    warn!("{} ❌ 章节已跳过: {}", ctx, reason);
                    summary.chapters_skipped += 1;
                }
            }
        }

        summary.written = self.write_outputs(&writer, &summary.questions);

        print_final_stats(
            summary.chapters_exported,
            summary.chapters_skipped,
            summary.questions.len(),
            self.api.current_generation(),
        );
        info!("请检查输出目录: {}", writer.course_dir().display());

        Ok(summary)
    }

    /// 获取课程目录，这是唯一会中止导出的失败
    async fn load_directory(&self) -> Result<CourseDirectory> {
        info!("\n📁 正在获取课程目录...");
        let response = self
            .api
            .get_course_directory(&self.config.course_id, &self.config.class_id)
            .await?;

        let unavailable = |message: String| BusinessError::DirectoryUnavailable {
            course_id: self.config.course_id.clone(),
            message,
        };

        if !response.is_success() {
            return Err(unavailable(response.message().to_string()).into());
        }

        match response.parse_data::<CourseDirectory>() {
            Ok(Some(directory)) => Ok(directory),
            Ok(None) => Err(unavailable("目录数据为空".to_string()).into()),
            Err(e) => Err(unavailable(e.to_string()).into()),
        }
    }

    /// 按配置的格式写出结果，写入失败只记录日志
    fn write_outputs(&self, writer: &ExportWriter, questions: &[CanonicalQuestion]) -> Vec<PathBuf> {
        let format = self.config.export.format;
        let mut written = Vec::new();

        if format.writes_json() {
            match writer.write_json(questions) {
                Ok(path) => written.push(path),
                Err(e) => warn!("JSON 文件写入失败: {}", e),
            }
        }
        if format.writes_json_like() {
            match writer.write_json_like(questions) {
                Ok(path) => written.push(path),
                Err(e) => warn!("刷题平台导入文件写入失败: {}", e),
            }
        }

        written
    }
}
