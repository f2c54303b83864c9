use std::fmt;

use serde::{Deserialize, Serialize};

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionKind {
    #[serde(rename = "选择题")]
    Choice,
    #[serde(rename = "判断题")]
    TrueFalse,
    #[serde(rename = "填空题")]
    FillBlank,
    #[serde(rename = "问答题")]
    FreeResponse,
    #[serde(rename = "未知题型")]
    Unknown,
}

impl QuestionKind {
    /// 刷题平台使用的题型名称
    pub fn label(self) -> &'static str {
        match self {
            QuestionKind::Choice => "选择题",
            QuestionKind::TrueFalse => "判断题",
            QuestionKind::FillBlank => "填空题",
            QuestionKind::FreeResponse => "问答题",
            QuestionKind::Unknown => "未知题型",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 刷题平台导入格式的一道题
///
/// 字段顺序固定为 题型、题干、选项、答案、解析。
/// 选项只有选择题才有；填空题的答案嵌在题干中。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalQuestion {
    #[serde(rename = "题型")]
    pub kind: QuestionKind,
    #[serde(rename = "题干")]
    pub stem: String,
    #[serde(rename = "选项", default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(rename = "答案", default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(rename = "解析", default)]
    pub analysis: String,
}

impl CanonicalQuestion {
    pub fn new(kind: QuestionKind, stem: impl Into<String>) -> Self {
        Self {
            kind,
            stem: stem.into(),
            options: None,
            answer: None,
            analysis: String::new(),
        }
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_key_order() {
        let q = CanonicalQuestion::new(QuestionKind::Choice, "1+1=?")
            .with_options(vec!["1".into(), "2".into()])
            .with_answer("B");
        let json = serde_json::to_string(&q).unwrap();
        assert_eq!(
            json,
            r#"{"题型":"选择题","题干":"1+1=?","选项":["1","2"],"答案":"B","解析":""}"#
        );
    }

    #[test]
    fn test_fill_blank_has_no_answer_key() {
        let q = CanonicalQuestion::new(QuestionKind::FillBlank, "首都是{北京}");
        let json = serde_json::to_string(&q).unwrap();
        assert!(!json.contains("答案"));
        assert!(!json.contains("选项"));
        assert!(json.contains(r#""解析":"""#));
    }
}
