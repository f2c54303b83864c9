//! 平台原始数据结构
//!
//! 字段几乎全部为可选：平台返回的数据并不总是完整，缺失的字段
//! 在归一化阶段处理，而不是在反序列化阶段直接失败。

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::RecordError;

/// 课程目录
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseDirectory {
    #[serde(default)]
    pub coursename: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chapters: Vec<ChapterEntry>,
}

/// 目录中的章节
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChapterEntry {
    #[serde(default)]
    pub nodetitle: Option<String>,
    #[serde(default, deserialize_with = "deserialize_id")]
    pub nodeid: Option<String>,
}

/// 整章页面内容
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChapterContent {
    #[serde(rename = "wholepageItemDTOList", default, deserialize_with = "null_as_default")]
    pub items: Vec<WholepageItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WholepageItem {
    #[serde(rename = "wholepageDTOList", default, deserialize_with = "null_as_default")]
    pub pages: Vec<Wholepage>,
}

/// 页面中的一个单元
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Wholepage {
    #[serde(rename = "contentType", default)]
    pub content_type: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(rename = "coursepageDTOList", default, deserialize_with = "null_as_default")]
    pub coursepages: Vec<Coursepage>,
}

impl Wholepage {
    /// contentType 7 表示题目集合
    pub const QUESTION_SET: i64 = 7;

    pub fn is_question_set(&self) -> bool {
        self.content_type == Some(Self::QUESTION_SET)
    }
}

/// 课件页，题目保持未解析状态以便逐题处理
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Coursepage {
    #[serde(rename = "questionDTOList", default, deserialize_with = "null_as_default")]
    pub questions: Vec<Value>,
}

/// 原始题目记录
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuestion {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub questionid: Option<String>,
    /// HTML 题干
    #[serde(default)]
    pub title: Option<String>,
    /// 题型代码
    #[serde(rename = "type", default, deserialize_with = "deserialize_code")]
    pub type_code: Option<i64>,
    #[serde(rename = "choiceitemModels", default, deserialize_with = "null_as_default")]
    pub choices: Vec<RawChoice>,
    #[serde(default, deserialize_with = "deserialize_id")]
    pub parentid: Option<String>,
}

impl RawQuestion {
    /// 从未解析的 JSON 读取题目
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        serde_json::from_value(value.clone()).map_err(|e| RecordError::Malformed {
            question_id: question_id_of(value).unwrap_or_else(|| "?".to_string()),
            reason: e.to_string(),
        })
    }

    /// 检查必要字段
    pub fn validate(&self) -> Result<(), RecordError> {
        let mut missing = Vec::new();
        if self.title.is_none() {
            missing.push("title");
        }
        if self.type_code.is_none() {
            missing.push("type");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RecordError::Malformed {
                question_id: self.questionid.clone().unwrap_or_else(|| "?".to_string()),
                reason: format!("缺少字段: {}", missing.join(", ")),
            })
        }
    }
}

/// 原始选项，title 为 HTML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawChoice {
    #[serde(default)]
    pub title: Option<String>,
}

/// 原始答案记录
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAnswer {
    #[serde(rename = "correctAnswerList", default, deserialize_with = "null_as_default")]
    pub correct_answer_list: Vec<Value>,
    #[serde(default)]
    pub answer: Option<Value>,
}

impl RawAnswer {
    /// 原始答案字符串（未清洗）
    ///
    /// 优先使用 `correctAnswerList`，为空时退回单个 `answer`
    pub fn raw_answers(&self) -> Vec<String> {
        if !self.correct_answer_list.is_empty() {
            return self.correct_answer_list.iter().map(value_to_string).collect();
        }
        match &self.answer {
            Some(value) if !is_empty_value(value) => vec![value_to_string(value)],
            _ => Vec::new(),
        }
    }

    /// 从答案接口的数据部分构建
    ///
    /// 数据可能是完整的答案对象、答案列表或单个答案值
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        match value {
            Value::Object(_) => serde_json::from_value(value.clone()).map_err(|e| RecordError::Malformed {
                question_id: question_id_of(value).unwrap_or_else(|| "?".to_string()),
                reason: format!("答案记录无法解析: {}", e),
            }),
            Value::Array(list) => Ok(Self {
                correct_answer_list: list.clone(),
                answer: None,
            }),
            Value::Null => Ok(Self::default()),
            scalar => Ok(Self {
                correct_answer_list: Vec::new(),
                answer: Some(scalar.clone()),
            }),
        }
    }
}

/// 未解析题目中的 questionid
pub fn question_id_of(value: &Value) -> Option<String> {
    match value.get("questionid")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Bool(_) => false,
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}

/// `null` 按默认值处理
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// ID 既可能是字符串也可能是整数
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

/// 题型代码：整数或数字字符串
fn deserialize_code<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid type code: {}", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid type code: {:?}", s))),
        Some(other) => Err(D::Error::custom(format!("invalid type code: {}", other))),
    }
}
