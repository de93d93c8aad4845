//! 分段器
//!
//! 把规范化后的文本切成有序、有界、可相互重叠的分段。
//!
//! 切分规则（对每个窗口 `[start, start + budget)`）：
//! 1. 在窗口末尾向前最多 `lookback` 个字符内，找最近的段落或句子边界
//! 2. 找不到时退而求其次，找最近的空白（词边界）
//! 3. 仍然找不到，就在 `start + budget` 处硬切
//!
//! 下一个分段从 `end - overlap` 开始。切点永远大于 `start + overlap`，
//! 因此每一轮至少前进一个字符，循环必然结束。

use std::iter;

use crate::error::{AppError, AppResult};
use crate::models::Segment;

/// 默认回看窗口（字符）
pub const DEFAULT_LOOKBACK: usize = 200;

/// 句末标点
const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];
/// 不需要后跟空白的句末标点
const CJK_TERMINATORS: [char; 3] = ['。', '！', '？'];

/// 分段参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentSettings {
    /// 单个分段最大字符数
    pub budget: usize,
    /// 相邻分段重叠字符数
    pub overlap: usize,
    /// 查找边界时的回看窗口
    pub lookback: usize,
}

impl SegmentSettings {
    pub fn new(budget: usize, overlap: usize) -> Self {
        Self {
            budget,
            overlap,
            lookback: DEFAULT_LOOKBACK,
        }
    }

    /// 预算的 10% 作为重叠
    pub fn with_default_overlap(budget: usize) -> Self {
        Self::new(budget, budget / 10)
    }
}

/// 使用默认回看窗口切分文本
pub fn segment(text: &str, budget: usize, overlap: usize) -> AppResult<Vec<Segment>> {
    segment_with(text, &SegmentSettings::new(budget, overlap))
}

/// 按给定参数切分文本
pub fn segment_with(text: &str, settings: &SegmentSettings) -> AppResult<Vec<Segment>> {
    let SegmentSettings {
        budget,
        overlap,
        lookback,
    } = *settings;

    if text.is_empty() {
        return Err(AppError::invalid_input("待分段文本为空"));
    }
    if budget <= overlap {
        return Err(AppError::invalid_input(format!(
            "分段预算 ({}) 必须大于重叠 ({})",
            budget, overlap
        )));
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    // 第 i 个字符的字节偏移，末尾追加 text.len()
    let byte_at: Vec<usize> = text
        .char_indices()
        .map(|(b, _)| b)
        .chain(iter::once(text.len()))
        .collect();

    let mut segments = Vec::new();
    let mut start = 0;

    loop {
        let hard_end = start + budget;
        let end = if hard_end >= total {
            total
        } else {
            find_cut(&chars, start + overlap, hard_end, lookback)
        };

        segments.push(Segment {
            index: segments.len(),
            text: text[byte_at[start]..byte_at[end]].to_string(),
            start_offset: start,
            end_offset: end,
        });

        if end >= total {
            break;
        }
        start = end - overlap;
    }

    Ok(segments)
}

/// 在 `(floor, hard_end]` 内寻找切点
///
/// 返回值 `p` 表示分段在 `chars[p]` 之前结束
fn find_cut(chars: &[char], floor: usize, hard_end: usize, lookback: usize) -> usize {
    let lower = (floor + 1).max(hard_end.saturating_sub(lookback));
    let window = || (lower..=hard_end).rev();

    window()
        .find(|&p| is_paragraph_break(chars, p) || is_sentence_end(chars, p))
        .or_else(|| window().find(|&p| chars[p - 1].is_whitespace()))
        .unwrap_or(hard_end)
}

fn is_paragraph_break(chars: &[char], p: usize) -> bool {
    p >= 2 && chars[p - 1] == '\n' && chars[p - 2] == '\n'
}

fn is_sentence_end(chars: &[char], p: usize) -> bool {
    let prev = chars[p - 1];
    if CJK_TERMINATORS.contains(&prev) {
        return true;
    }
    SENTENCE_TERMINATORS.contains(&prev) && chars.get(p).map_or(true, |c| c.is_whitespace())
}
