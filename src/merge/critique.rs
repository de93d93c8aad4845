//! 批评合并

use crate::merge::similarity::dedup_near_duplicates;
use crate::merge::MergeSettings;
use crate::models::CritiqueFragment;

/// 合并批评片段
///
/// 去掉空片段和近似重复片段（保留首次出现），按分段顺序每个片段一段拼接。
/// 总长度超过 `critique_max_chars` 时从最后加入的片段开始丢弃；
/// 第一个片段本身超长时在上限之前的词边界处截断。只有一个片段时原样返回。
pub fn merge_critiques(fragments: &[CritiqueFragment], settings: &MergeSettings) -> String {
    if let [only] = fragments {
        return only.clone().unwrap_or_default();
    }

    let present: Vec<&str> = fragments
        .iter()
        .filter_map(|f| f.as_deref())
        .filter(|f| !f.trim().is_empty())
        .collect();

    let points = dedup_near_duplicates(present, settings.similarity_threshold, |p| *p);
    let separator = settings.field_delimiter.as_str();
    let separator_len = separator.chars().count();

    let mut kept = Vec::with_capacity(points.len());
    let mut total = 0;
    for point in points {
        let mut point = point.trim();
        if kept.is_empty() {
            point = truncate_at_word(point, settings.critique_max_chars);
        }
        let added = point.chars().count() + if kept.is_empty() { 0 } else { separator_len };
        if !kept.is_empty() && total + added > settings.critique_max_chars {
            break;
        }
        total += added;
        kept.push(point);
    }

    kept.join(separator)
}

/// 截断到最多 `max_chars` 个字符，优先在空白处断开
fn truncate_at_word(text: &str, max_chars: usize) -> &str {
    let Some((cut, next)) = text.char_indices().nth(max_chars) else {
        return text;
    };
    let head = &text[..cut];
    if next.is_whitespace() {
        return head.trim_end();
    }
    match head.rfind(char::is_whitespace) {
        Some(space) if !head[..space].trim_end().is_empty() => head[..space].trim_end(),
        _ => head,
    }
}
