//! 导出写入服务
//!
//! 只负责把归一化后的题目写到磁盘，不关心题目从哪里来

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{AppResult, FileError};
use crate::models::{CanonicalQuestion, QuestionKind};

const MAX_FILENAME_CHARS: usize = 100;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("valid filename regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_+").expect("valid underscore regex"));

/// 生成可用作文件名的字符串
pub fn sanitize_filename(name: &str) -> String {
    let name = UNSAFE_CHARS.replace_all(name, "_");
    let name = WHITESPACE.replace_all(&name, "_");
    let name = UNDERSCORES.replace_all(&name, "_");
    let name: String = name.trim_matches('_').chars().take(MAX_FILENAME_CHARS).collect();
    if name.is_empty() {
        "untitled".to_string()
    } else {
        name
    }
}

/// JSON 数组，两空格缩进，非 ASCII 字符原样输出
pub fn to_json(questions: &[CanonicalQuestion]) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(questions)?)
}

/// 刷题平台导入用的类 JSON 文本
///
/// 每题一行，键顺序固定；选项只有选择题才有，填空题没有答案，解析总是存在
pub fn to_json_like(questions: &[CanonicalQuestion]) -> String {
    let mut lines = vec!["[".to_string()];

    for (i, q) in questions.iter().enumerate() {
        let mut parts = vec![
            format!("\"题型\":\"{}\"", escape(q.kind.label())),
            format!("\"题干\":\"{}\"", escape(&q.stem)),
        ];
        if let Some(options) = &q.options {
            let options: Vec<String> = options.iter().map(|o| format!("\"{}\"", escape(o))).collect();
            parts.push(format!("\"选项\":[{}]", options.join(",")));
        }
        if let Some(answer) = &q.answer {
            if q.kind != QuestionKind::FillBlank {
                parts.push(format!("\"答案\":\"{}\"", escape(answer)));
            }
        }
        parts.push(format!("\"解析\":\"{}\"", escape(&q.analysis)));

        let mut line = format!("  {{{}}}", parts.join(","));
        if i + 1 < questions.len() {
            line.push(',');
        }
        lines.push(line);
    }

    lines.push("]".to_string());
    lines.join("\n")
}

fn escape(value: &str) -> String {
    value
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// 单题详情文件的内容
#[derive(Debug, Clone)]
pub struct QuestionInfo<'a> {
    pub course_name: &'a str,
    pub chapter_id: &'a str,
    pub chapter_title: &'a str,
    pub unit_id: &'a str,
    pub unit_title: &'a str,
    pub question_id: &'a str,
    pub kind: QuestionKind,
    pub stem: &'a str,
    pub options: &'a [String],
    pub answers: &'a [String],
}

impl QuestionInfo<'_> {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("课程名称: {}\n", self.course_name));
        out.push_str(&format!("章节名称: {}\n", self.chapter_title));
        out.push_str(&format!("单元名称: {}\n", self.unit_title));
        out.push_str(&format!("题目ID: {}\n", self.question_id));
        out.push_str(&format!("ParentID (单元ID): {}\n", self.unit_id));
        out.push_str(&format!("题型: {}\n\n", self.kind));
        out.push_str(&format!("【题干】:\n{}\n\n", self.stem));

        if !self.options.is_empty() {
            out.push_str("【选项】:\n");
            for (letter, option) in ('A'..='Z').zip(self.options) {
                out.push_str(&format!("{}. {}\n", letter, option));
            }
            out.push('\n');
        }

        let answers = if self.answers.is_empty() {
            "未获取到".to_string()
        } else {
            self.answers.join(" | ")
        };
        out.push_str(&format!("【正确答案】:\n{}\n", answers));
        out
    }

    fn relative_dir(&self) -> PathBuf {
        PathBuf::from(format!(
            "chapter_{}_{}",
            self.chapter_id,
            sanitize_filename(self.chapter_title)
        ))
        .join(format!("unit_{}_{}", self.unit_id, sanitize_filename(self.unit_title)))
        .join(format!("question_{}", self.question_id))
    }
}

/// 单门课程的输出目录
#[derive(Debug, Clone)]
pub struct ExportWriter {
    course_dir: PathBuf,
    file_stem: String,
}

impl ExportWriter {
    /// 创建 `<base>/course_<id>_<name>/` 目录
    pub fn prepare(base_output_dir: &Path, course_id: &str, course_name: &str) -> Result<Self, FileError> {
        let file_stem = sanitize_filename(course_name);
        let course_dir = base_output_dir.join(format!("course_{}_{}", course_id, file_stem));
        create_dir(&course_dir)?;
        debug!("输出目录: {}", course_dir.display());
        Ok(Self {
            course_dir,
            file_stem,
        })
    }

    pub fn course_dir(&self) -> &Path {
        &self.course_dir
    }

    pub fn json_path(&self) -> PathBuf {
        self.course_dir
            .join(format!("{}_questions_platform.json", self.file_stem))
    }

    pub fn json_like_path(&self) -> PathBuf {
        self.course_dir.join(format!("{}_刷题平台导入.txt", self.file_stem))
    }

    pub fn write_json(&self, questions: &[CanonicalQuestion]) -> AppResult<PathBuf> {
        let path = self.json_path();
        write_file(&path, &to_json(questions)?)?;
        info!("✓ JSON 文件已生成: {}", path.display());
        Ok(path)
    }

    pub fn write_json_like(&self, questions: &[CanonicalQuestion]) -> Result<PathBuf, FileError> {
        let path = self.json_like_path();
        write_file(&path, &to_json_like(questions))?;
        info!("✓ 刷题平台导入文件已生成: {}", path.display());
        Ok(path)
    }

    /// 写入 `chapter_*/unit_*/question_*/question_info.txt`
    pub fn write_question_info(&self, info: &QuestionInfo<'_>) -> Result<PathBuf, FileError> {
        let dir = self.course_dir.join(info.relative_dir());
        create_dir(&dir)?;
        let path = dir.join("question_info.txt");
        write_file(&path, &info.render())?;
        debug!("题目详情已写入: {}", path.display());
        Ok(path)
    }
}

fn create_dir(path: &Path) -> Result<(), FileError> {
    fs::create_dir_all(path).map_err(|source| FileError::CreateDirFailed {
        path: path.display().to_string(),
        source,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), FileError> {
    fs::write(path, contents).map_err(|source| FileError::WriteFailed {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<CanonicalQuestion> {
        vec![
            CanonicalQuestion::new(QuestionKind::Choice, "选 \"B\"")
                .with_options(vec!["甲".into(), "乙".into()])
                .with_answer("B"),
            CanonicalQuestion::new(QuestionKind::FillBlank, "首都是{北京}\n第二行"),
            CanonicalQuestion::new(QuestionKind::TrueFalse, "地球是圆的").with_answer("正确"),
        ]
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("数据结构: 第 1 章/习题?"), "数据结构_第_1_章_习题");
        assert_eq!(sanitize_filename("  __a  b__ "), "a_b");
        assert_eq!(sanitize_filename("???"), "untitled");
        assert_eq!(sanitize_filename(&"长".repeat(150)).chars().count(), 100);
    }

    #[test]
    fn test_json_output() {
        let json = to_json(&sample()).unwrap();
        assert!(json.starts_with("[\n  {\n    \"题型\": \"选择题\""));
        assert!(json.contains("北京"));
        let parsed: Vec<CanonicalQuestion> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn test_json_like_output() {
        let text = to_json_like(&sample());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "[");
        assert_eq!(
            lines[1],
            r#"  {"题型":"选择题","题干":"选 \"B\"","选项":["甲","乙"],"答案":"B","解析":""},"#
        );
        assert_eq!(lines[2], r#"  {"题型":"填空题","题干":"首都是{北京}\n第二行","解析":""},"#);
        assert_eq!(lines[3], r#"  {"题型":"判断题","题干":"地球是圆的","答案":"正确","解析":""}"#);
        assert_eq!(lines[4], "]");
    }

    #[test]
    fn test_json_like_empty() {
        assert_eq!(to_json_like(&[]), "[\n]");
    }

    #[test]
    fn test_writer_paths_and_files() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ExportWriter::prepare(tmp.path(), "46099", "高等 数学").unwrap();
        assert!(writer.course_dir().ends_with("course_46099_高等_数学"));

        let json = writer.write_json(&sample()).unwrap();
        assert!(json.ends_with("高等_数学_questions_platform.json"));
        let like = writer.write_json_like(&sample()).unwrap();
        assert!(like.ends_with("高等_数学_刷题平台导入.txt"));
        assert!(fs::read_to_string(like).unwrap().starts_with('['));
    }

    #[test]
    fn test_question_info_file() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ExportWriter::prepare(tmp.path(), "1", "课程").unwrap();
        let options = vec!["一".to_string(), "二".to_string()];
        let info = QuestionInfo {
            course_name: "课程",
            chapter_id: "100",
            chapter_title: "第一章",
            unit_id: "200",
            unit_title: "课后练习",
            question_id: "300",
            kind: QuestionKind::Choice,
            stem: "选择",
            options: &options,
            answers: &[],
        };
        let path = writer.write_question_info(&info).unwrap();
        assert!(path.ends_with("chapter_100_第一章/unit_200_课后练习/question_300/question_info.txt"));

        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("【选项】:\nA. 一\nB. 二\n"));
        assert!(contents.ends_with("【正确答案】:\n未获取到\n"));
    }
}
