//! 章节处理流程 - 流程层
//!
//! 核心职责：定义"一个章节"的完整导出流程
//!
//! 流程顺序：
//! 1. 获取整章页面内容，失败则跳过本章
//! 2. 遍历题目集合单元（contentType 7）
//! 3. 逐题获取答案 → 归一化 →（可选）写单题详情
//!
//! 所有请求按顺序执行，一次只有一个请求在途。

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::CoursewareApi;
use crate::config::Config;
use crate::error::EndpointError;
use crate::models::{question_id_of, CanonicalQuestion, ChapterContent, QuestionKind, RawAnswer, RawQuestion};
use crate::services::export_writer::{ExportWriter, QuestionInfo};
use crate::services::html_text::clean_text;
use crate::services::question_normalizer::{answer_texts, degrade, normalize};
use crate::utils::truncate_text;
use crate::workflow::chapter_ctx::ChapterCtx;

/// 章节内的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChapterStats {
    /// 题目集合单元数
    pub units: usize,
    /// 题目数
    pub questions: usize,
    /// 未获取到答案的题目数
    pub answers_missing: usize,
    /// 降级为未知题型、需要人工复核的题目数
    pub degraded: usize,
}

/// 章节处理结果
#[derive(Debug, Clone)]
pub enum ChapterResult {
    /// 章节内容获取成功
    Exported {
        questions: Vec<CanonicalQuestion>,
        stats: ChapterStats,
    },
    /// 章节内容获取失败，整章跳过
    Skipped { reason: String },
}

/// 题目所在单元
struct Unit<'a> {
    id: &'a str,
    title: &'a str,
}

/// 章节处理流程
///
/// 不持有 HTTP 资源，只借用门面
pub struct ChapterFlow<'a> {
    api: &'a CoursewareApi,
    question_files: Option<&'a ExportWriter>,
    verbose_logging: bool,
}

impl<'a> ChapterFlow<'a> {
    /// 创建新的章节处理流程
    ///
    /// 开启 `save_per_question_files` 时，每道题的详情写到 `writer` 的课程目录下
    pub fn new(api: &'a CoursewareApi, config: &Config, writer: &'a ExportWriter) -> Self {
        Self {
            api,
            question_files: config.export.save_per_question_files.then_some(writer),
            verbose_logging: config.verbose_logging,
        }
    }

    pub async fn run(&self, ctx: &ChapterCtx) -> Result<ChapterResult, EndpointError> {
        let response = self.api.get_whole_chapter_page_content(&ctx.node_id).await?;
        if !response.is_success() {
            warn!("{} 获取章节内容失败: {}", ctx, response.message());
            return Ok(ChapterResult::Skipped {
                reason: response.message().to_string(),
            });
        }

        let content: ChapterContent = match response.parse_data() {
            Ok(Some(content)) => content,
            Ok(None) => {
                warn!("{} 章节内容为空", ctx);
                return Ok(ChapterResult::Skipped {
                    reason: "章节内容为空".to_string(),
                });
            }
            Err(e) => {
                warn!("{} 章节内容无法解析: {}", ctx, e);
                return Ok(ChapterResult::Skipped {
                    reason: e.to_string(),
                });
            }
        };

        let mut stats = ChapterStats::default();
        let mut questions = Vec::new();

        for page in content
            .items
            .iter()
            .flat_map(|item| item.pages.iter())
            .filter(|page| page.is_question_set())
        {
            let Some(parent_id) = page.id.as_deref() else {
                warn!("{} 题目集合缺少单元ID，跳过", ctx);
                continue;
            };
            let unit_title = page
                .content
                .clone()
                .unwrap_or_else(|| format!("UnknownUnit_{}", parent_id));
            let unit = Unit {
                id: parent_id,
                title: &unit_title,
            };
            stats.units += 1;
            info!("{} 处理单元: {} (ParentID: {})", ctx, unit.title, unit.id);

            for value in page.coursepages.iter().flat_map(|cp| cp.questions.iter()) {
                let question = self.process_question(ctx, &unit, value, &mut stats).await?;
                stats.questions += 1;
                if question.kind == QuestionKind::Unknown {
                    stats.degraded += 1;
                }
                questions.push(question);
            }
        }

        Ok(ChapterResult::Exported { questions, stats })
    }

    /// 处理单道题：取答案并归一化
    ///
    /// 题目记录无法读取时降级为未知题型，不会中断本章
    async fn process_question(
        &self,
        ctx: &ChapterCtx,
        unit: &Unit<'_>,
        value: &Value,
        stats: &mut ChapterStats,
    ) -> Result<CanonicalQuestion, EndpointError> {
        let parsed = RawQuestion::from_value(value);
        let question_id = match &parsed {
            Ok(raw) => raw.questionid.clone(),
            Err(_) => question_id_of(value),
        };

        let answer = match question_id.as_deref() {
            Some(qid) => self.fetch_answer(ctx, qid, unit.id).await?,
            None => {
                warn!("{} 题目缺少 questionid，无法获取答案", ctx);
                None
            }
        };
        if answer.is_none() {
            stats.answers_missing += 1;
        }

        let question = match &parsed {
            Ok(raw) => normalize(raw, answer.as_ref()),
            Err(err) => {
                warn!("{} {}", ctx, err);
                degrade(err, value.get("title").and_then(Value::as_str), answer.as_ref())
            }
        };

        let qid = question_id.as_deref().unwrap_or("?");
        if question.kind == QuestionKind::Unknown {
            warn!("{} 题目 {} 题型未知，已标记人工复核", ctx, qid);
        }
        if self.verbose_logging {
            info!(
                "{} [{}] QID {}: {}",
                ctx,
                question.kind,
                qid,
                truncate_text(&question.stem, 60)
            );
        } else {
            debug!("{} 已处理题目 QID: {}", ctx, qid);
        }

        if let (Some(writer), Ok(raw)) = (self.question_files, &parsed) {
            self.save_question_info(writer, ctx, unit, raw, &question, answer.as_ref());
        }

        Ok(question)
    }

    /// 获取一道题的答案，失败时记录日志并返回 `None`
    async fn fetch_answer(
        &self,
        ctx: &ChapterCtx,
        question_id: &str,
        parent_id: &str,
    ) -> Result<Option<RawAnswer>, EndpointError> {
        let response = self.api.get_question_answer(question_id, parent_id).await?;
        if !response.is_success() {
            warn!(
                "{} 获取答案失败 (QID: {}, PID: {}): {}",
                ctx,
                question_id,
                parent_id,
                response.message()
            );
            return Ok(None);
        }

        match response.data().map(RawAnswer::from_value).transpose() {
            Ok(answer) => Ok(answer),
            Err(e) => {
                warn!("{} {}", ctx, e);
                Ok(None)
            }
        }
    }

    fn save_question_info(
        &self,
        writer: &ExportWriter,
        ctx: &ChapterCtx,
        unit: &Unit<'_>,
        raw: &RawQuestion,
        question: &CanonicalQuestion,
        answer: Option<&RawAnswer>,
    ) {
        let stem = clean_text(raw.title.as_deref().unwrap_or_default());
        let options: Vec<String> = raw
            .choices
            .iter()
            .map(|c| clean_text(c.title.as_deref().unwrap_or_default()))
            .collect();
        let answers = answer_texts(answer);

        let info = QuestionInfo {
            course_name: &ctx.course_name,
            chapter_id: &ctx.node_id,
            chapter_title: &ctx.title,
            unit_id: unit.id,
            unit_title: unit.title,
            question_id: raw.questionid.as_deref().unwrap_or("unknown"),
            kind: question.kind,
            stem: &stem,
            options: &options,
            answers: &answers,
        };

        if let Err(e) = writer.write_question_info(&info) {
            warn!("{} 题目详情写入失败: {}", ctx, e);
        }
    }
}
