//! 字段抽取合并
//!
//! 每个字段独立合并：按分段顺序收集，去掉空值。
//! 后出现的值如果包含先前的值（规范化后子串），视为补充完善，替换先前的值；
//! 已被保留值包含的后续值直接丢弃；其余不同的值按分段顺序用分隔符拼接。

use crate::merge::similarity::normalize_for_compare;
use crate::models::{Field, FieldExtraction};

/// 合并所有分段的字段抽取结果
pub fn merge_fields(extractions: &[FieldExtraction], delimiter: &str) -> FieldExtraction {
    if let [only] = extractions {
        return only.clone();
    }

    let mut merged = FieldExtraction::default();
    for field in Field::ALL {
        let values: Vec<&str> = extractions
            .iter()
            .filter_map(|e| e.get(field))
            .filter(|v| !v.trim().is_empty())
            .collect();
        merged.set(field, merge_values(&values, delimiter));
    }
    merged
}

fn merge_values(values: &[&str], delimiter: &str) -> Option<String> {
    match values {
        [] => None,
        [only] => Some(only.to_string()),
        _ => {
            let mut kept: Vec<(&str, String)> = Vec::new();
            for &value in values {
                let key = normalize_for_compare(value);
                if kept.iter().any(|(_, existing)| existing.contains(key.as_str())) {
                    continue;
                }
                kept.retain(|(_, existing)| !key.contains(existing.as_str()));
                kept.push((value, key));
            }
            Some(
                kept.iter()
                    .map(|(raw, _)| *raw)
                    .collect::<Vec<_>>()
                    .join(delimiter),
            )
        }
    }
}
