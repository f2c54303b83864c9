//! 题目归一化
//!
//! 把平台原始题目记录与答案记录转换为刷题平台导入格式。纯函数，不做 I/O。

use std::collections::BTreeSet;

use crate::error::RecordError;
use crate::models::{CanonicalQuestion, QuestionKind, RawAnswer, RawQuestion};
use crate::services::html_text::{
    clean_text, clean_text_with_blanks, find_text_placeholders, has_blank_markup, BLANK_MARKER,
    BLANK_PLACEHOLDER,
};

/// 未知题型答案的前缀，便于人工复核
pub const UNKNOWN_ANSWER_PREFIX: &str = "未知题型答案: ";

/// 平台上同样属于填空题的其他题型代码
const SECONDARY_FILL_BLANK_CODES: [i64; 2] = [8, 9];

const TRUE_ANSWERS: [&str; 3] = ["true", "t", "对"];

/// 题型代码直接映射
pub fn kind_for_code(code: Option<i64>) -> QuestionKind {
    match code {
        Some(1) | Some(2) => QuestionKind::Choice,
        Some(4) => QuestionKind::TrueFalse,
        Some(5) => QuestionKind::FillBlank,
        Some(6) => QuestionKind::FreeResponse,
        _ => QuestionKind::Unknown,
    }
}

/// 推断题型，修正平台题型代码不一致的情况
pub fn infer_kind(raw: &RawQuestion, answers: &[String]) -> QuestionKind {
    let title = raw.title.as_deref().unwrap_or_default();

    match kind_for_code(raw.type_code) {
        QuestionKind::Unknown => {
            let secondary = raw
                .type_code
                .is_some_and(|code| SECONDARY_FILL_BLANK_CODES.contains(&code));
            let blank_without_options = raw.choices.is_empty()
                && (has_blank_markup(title) || !find_text_placeholders(&clean_text(title)).is_empty());
            if secondary || blank_without_options {
                QuestionKind::FillBlank
            } else {
                QuestionKind::Unknown
            }
        }
        // 没有选项的“选择题”其实是填空题
        QuestionKind::Choice
            if raw.choices.is_empty() && (!answers.is_empty() || has_blank_markup(title)) =>
        {
            QuestionKind::FillBlank
        }
        kind => kind,
    }
}

/// 清洗后的答案文本，保持原顺序
pub fn answer_texts(answer: Option<&RawAnswer>) -> Vec<String> {
    answer
        .map(|a| a.raw_answers().iter().map(|s| clean_text(s)).collect())
        .unwrap_or_default()
}

/// 归一化一道题
///
/// 缺少题干或题型代码的记录降级为未知题型，不会中断导出。
pub fn normalize(raw: &RawQuestion, answer: Option<&RawAnswer>) -> CanonicalQuestion {
    if let Err(err) = raw.validate() {
        return degrade(&err, raw.title.as_deref(), answer);
    }

    let title = raw.title.as_deref().unwrap_or_default();
    let answers = answer_texts(answer);
    let kind = infer_kind(raw, &answers);

    match kind {
        QuestionKind::Choice => {
            let options = raw
                .choices
                .iter()
                .map(|c| clean_text(c.title.as_deref().unwrap_or_default()))
                .collect();
            // 假定答案已经是选项字母
            let letters: BTreeSet<&str> = answers.iter().map(String::as_str).collect();
            CanonicalQuestion::new(kind, clean_text(title))
                .with_options(options)
                .with_answer(letters.into_iter().collect::<String>())
        }
        QuestionKind::TrueFalse => {
            let first = answers.first().map(|a| a.to_lowercase()).unwrap_or_default();
            let label = if TRUE_ANSWERS.contains(&first.as_str()) {
                "正确"
            } else {
                "错误"
            };
            CanonicalQuestion::new(kind, clean_text(title)).with_answer(label)
        }
        QuestionKind::FillBlank => CanonicalQuestion::new(kind, fill_blank_stem(title, &answers)),
        QuestionKind::FreeResponse => {
            CanonicalQuestion::new(kind, clean_text(title)).with_answer(answers.join("\n"))
        }
        QuestionKind::Unknown => CanonicalQuestion::new(kind, clean_text(title))
            .with_answer(format!("{}{}", UNKNOWN_ANSWER_PREFIX, answers.join(" | "))),
    }
}

/// 把无法读取的题目记录降级为带诊断信息的未知题型
pub fn degrade(
    err: &RecordError,
    title_html: Option<&str>,
    answer: Option<&RawAnswer>,
) -> CanonicalQuestion {
    let RecordError::Malformed { reason, .. } = err;
    let answers = answer_texts(answer);

    let mut diagnostic = format!("{}({})", UNKNOWN_ANSWER_PREFIX, reason);
    if !answers.is_empty() {
        diagnostic.push(' ');
        diagnostic.push_str(&answers.join(" | "));
    }

    CanonicalQuestion::new(QuestionKind::Unknown, clean_text(title_html.unwrap_or_default()))
        .with_answer(diagnostic)
}

/// 把答案按位置填入题干
///
/// 输入框标记优先，其次是文本占位符；数量不一致时把全部答案追加在题干后。
fn fill_blank_stem(title_html: &str, answers: &[String]) -> String {
    let marked = clean_text_with_blanks(title_html);
    let markers = marked.matches(BLANK_MARKER).count();

    if markers > 0 {
        if markers == answers.len() {
            let mut answers = answers.iter();
            let mut stem = String::with_capacity(marked.len());
            for ch in marked.chars() {
                if ch == BLANK_MARKER {
                    if let Some(answer) = answers.next() {
                        stem.push('{');
                        stem.push_str(answer);
                        stem.push('}');
                        continue;
                    }
                }
                stem.push(ch);
            }
            return stem;
        }
        return append_answers(marked.replace(BLANK_MARKER, BLANK_PLACEHOLDER), answers);
    }

    let placeholders = find_text_placeholders(&marked);
    if !placeholders.is_empty() && placeholders.len() == answers.len() {
        let mut stem = marked;
        // 从后往前替换，前面的偏移量不受影响
        for (range, answer) in placeholders.into_iter().zip(answers).rev() {
            stem.replace_range(range, &format!("{{{}}}", answer));
        }
        return stem;
    }

    append_answers(marked, answers)
}

fn append_answers(stem: String, answers: &[String]) -> String {
    if answers.is_empty() {
        return stem;
    }
    let braced: String = answers.iter().map(|a| format!("{{{}}}", a)).collect();
    format!("{} {}", stem, braced)
}
