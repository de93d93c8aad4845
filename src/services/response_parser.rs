//! LLM 响应解析
//!
//! 模型经常在 JSON 外面包一层代码块或解释文字，这里尽量宽松地取出 JSON 对象，
//! 类型不对的字段一律视为缺失。

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("valid regex"));

/// 行首的列表标记：`-`、`*`、`•`、`1.`、`(2)`、`Q3:` 等
///
/// 数字编号后面必须跟空白或行尾，`3.5%` 这样的数值不是编号
static LIST_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*•]+\s*|\(?\d+[.)](?:\s+|$)|[Qq]\d+[:.)]\s*)").expect("valid regex")
});

/// 表示"没有内容"的占位值
const PLACEHOLDERS: [&str; 7] = [
    "n/a",
    "na",
    "none",
    "null",
    "unknown",
    "not mentioned",
    "not specified",
];

/// 从响应中取出第一个可解析的 JSON 对象
///
/// 依次尝试：整段文本、代码块内容、第一个 `{` 到最后一个 `}` 之间的内容
pub fn extract_json_object(response: &str) -> Option<Map<String, Value>> {
    let trimmed = response.trim();
    let mut candidates = vec![trimmed];

    if let Some(inner) = CODE_FENCE_RE.captures(trimmed).and_then(|c| c.get(1)) {
        candidates.push(inner.as_str().trim());
    }
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            candidates.push(&trimmed[start..=end]);
        }
    }

    candidates
        .into_iter()
        .find_map(|candidate| match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        })
}

/// 读取字符串字段；缺失、类型不对、空白或占位值都返回 `None`
pub fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => clean_text(s),
        _ => None,
    }
}

/// 读取字符串列表字段
///
/// 数组只保留其中的字符串元素；单个字符串按行拆分；其他类型视为空列表
pub fn string_list(map: &Map<String, Value>, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|item| clean_text(&LIST_MARKER_RE.replace(item, "")))
            .collect(),
        Some(Value::String(s)) => split_list_lines(s),
        _ => Vec::new(),
    }
}

/// 把纯文本列表拆成条目，去掉编号和项目符号
pub fn split_list_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| clean_text(&LIST_MARKER_RE.replace(line, "")))
        .collect()
}

pub fn clean_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let is_placeholder = PLACEHOLDERS
        .iter()
        .any(|p| trimmed.trim_end_matches('.').eq_ignore_ascii_case(p));

    (!trimmed.is_empty() && !is_placeholder).then(|| trimmed.to_string())
}
