//! HTML 转纯文本
//!
//! 段落类标签（p / div / li）结尾补换行，`<br>` 变为换行，脚本与样式丢弃。
//! 填空题的输入框（`<input>` 或 class 含 blank 的元素）在带标记的版本中
//! 输出为 [`BLANK_MARKER`]，由调用方按位置替换为答案。

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};

/// 填空位置标记（私用区字符，不会出现在正常文本中）
pub const BLANK_MARKER: char = '\u{E000}';

/// 未替换的填空位置显示为下划线
pub const BLANK_PLACEHOLDER: &str = "____";

static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid blank-line regex"));

static TEXT_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_{2,}|（\s*）|\(\s*\)").expect("valid placeholder regex"));

/// 提取纯文本，填空输入框显示为 `____`
pub fn clean_text(html: &str) -> String {
    clean_text_with_blanks(html).replace(BLANK_MARKER, BLANK_PLACEHOLDER)
}

/// 提取纯文本，填空输入框保留为 [`BLANK_MARKER`]
pub fn clean_text_with_blanks(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    walk(fragment.root_element(), &mut out);

    BLANK_LINES.replace_all(&out, "\n\n").trim().to_string()
}

/// HTML 中是否含有填空输入框
pub fn has_blank_markup(html: &str) -> bool {
    if html.trim().is_empty() {
        return false;
    }
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .any(is_blank_element)
}

/// 纯文本中的下划线 / 空括号占位符，按出现顺序
pub fn find_text_placeholders(text: &str) -> Vec<Range<usize>> {
    TEXT_PLACEHOLDER.find_iter(text).map(|m| m.range()).collect()
}

fn walk(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };

        if is_blank_element(child) {
            out.push(BLANK_MARKER);
            continue;
        }

        match child.value().name() {
            "script" | "style" => {}
            "br" => out.push('\n'),
            "p" | "div" | "li" => {
                walk(child, out);
                out.push('\n');
            }
            _ => walk(child, out),
        }
    }
}

fn is_blank_element(element: ElementRef<'_>) -> bool {
    let value = element.value();
    value.name() == "input"
        || value
            .attr("class")
            .is_some_and(|class| class.to_ascii_lowercase().contains("blank"))
}
