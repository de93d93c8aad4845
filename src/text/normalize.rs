//! 文本规范化
//!
//! 清理从 PDF 等格式转换出来的文本噪声，同时保留段落结构，便于分段器按段落切分

use regex::Regex;
use std::sync::LazyLock;

static HYPHEN_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w)-\n(\w)").expect("valid regex"));
static EMPTY_BRACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\s*\}").expect("valid regex"));
static INLINE_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").expect("valid regex"));
static LINE_EDGE_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" ?\n ?").expect("valid regex"));
static EXTRA_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// 规范化文本
///
/// 统一换行符、去掉换页符、合并跨行断词、压缩空白、最多保留一个空行
pub fn normalize_text(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n").replace('\x0c', "");
    let text = HYPHEN_BREAK.replace_all(&text, "$1$2");
    let text = EMPTY_BRACES.replace_all(&text, "");
    let text = INLINE_SPACE.replace_all(&text, " ");
    let text = LINE_EDGE_SPACE.replace_all(&text, "\n");
    let text = EXTRA_NEWLINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}
