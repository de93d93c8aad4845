//! 文本相似度与近似去重

use std::collections::HashSet;
use std::hash::Hash;

/// 超过该长度（两段文本字符数之和）时不再计算编辑距离，只用词重叠
const EDIT_DISTANCE_LIMIT: usize = 600;

/// 比较前的规范化：小写、去标点、压缩空白
pub fn normalize_for_compare(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();
    let normalized = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        text.trim().to_string()
    } else {
        normalized
    }
}

/// 两段原始文本的相似度，范围 [0, 1]
pub fn similarity(a: &str, b: &str) -> f64 {
    similarity_normalized(&normalize_for_compare(a), &normalize_for_compare(b))
}

/// 已规范化文本的相似度：编辑距离比与词集合 Jaccard 系数取较大者
pub fn similarity_normalized(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let token = token_jaccard(&tokens(a), &tokens(b));
    let edit = if a.chars().count() + b.chars().count() <= EDIT_DISTANCE_LIMIT {
        strsim::normalized_levenshtein(a, b)
    } else {
        0.0
    };
    token.max(edit)
}

fn tokens(text: &str) -> HashSet<&str> {
    text.split_whitespace().collect()
}

fn token_jaccard<T: Eq + Hash>(left: &HashSet<T>, right: &HashSet<T>) -> f64 {
    let union = left.union(right).count();
    if union == 0 {
        return 0.0;
    }
    left.intersection(right).count() as f64 / union as f64
}

/// 去重时使用的比较键：规范化文本及其字符数
struct CompareKey {
    text: String,
    words: HashSet<String>,
    chars: usize,
}

impl CompareKey {
    fn new(raw: &str) -> Self {
        let text = normalize_for_compare(raw);
        let chars = text.chars().count();
        let words = text.split_whitespace().map(String::from).collect();
        Self { text, words, chars }
    }

    /// 与 [`similarity_normalized`] 判定一致，但能提前排除的组合不计算编辑距离
    fn is_similar(&self, other: &CompareKey, threshold: f64) -> bool {
        if self.text == other.text {
            return true;
        }
        if self.text.is_empty() || other.text.is_empty() {
            return false;
        }
        if token_jaccard(&self.words, &other.words) >= threshold {
            return true;
        }
        if self.chars + other.chars > EDIT_DISTANCE_LIMIT {
            return false;
        }
        // 编辑距离不小于长度差，归一化后的得分不会超过 短/长
        let (short, long) = (self.chars.min(other.chars), self.chars.max(other.chars));
        if (short as f64) / (long as f64) < threshold {
            return false;
        }
        strsim::normalized_levenshtein(&self.text, &other.text) >= threshold
    }
}

/// 近似去重：保留第一次出现的元素，丢弃后续相似度 ≥ `threshold` 的元素
pub fn dedup_near_duplicates<T, F>(items: Vec<T>, threshold: f64, text: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut kept: Vec<(T, CompareKey)> = Vec::with_capacity(items.len());
    for item in items {
        let key = CompareKey::new(text(&item));
        let duplicate = kept
            .iter()
            .any(|(_, existing)| existing.is_similar(&key, threshold));
        if !duplicate {
            kept.push((item, key));
        }
    }
    kept.into_iter().map(|(item, _)| item).collect()
}
