//! 合并层（Merge Layer）
//!
//! ## 职责
//!
//! 把按分段顺序排列的单分段结果合并成文档级结果。
//!
//! - `fields` - 五个语义字段的合并
//! - `critique` - 批评片段的去重与拼接
//! - `questions` - 审稿问题的合并
//! - `similarity` - 近似重复判定
//!
//! ## 设计原则
//!
//! 1. **纯函数**：不做 I/O，不会失败，只读输入、返回新值
//! 2. **确定性**：输出只取决于输入顺序，与调用完成的先后无关
//! 3. **幂等**：只有一个分段时原样返回该分段的结果

pub mod critique;
pub mod fields;
pub mod questions;
pub mod similarity;

pub use critique::merge_critiques;
pub use fields::merge_fields;
pub use questions::merge_questions;
pub use similarity::{dedup_near_duplicates, similarity};

use crate::models::{AnalysisResult, CritiqueFragment, FieldExtraction, QuestionSet};

/// 合并参数
#[derive(Debug, Clone, PartialEq)]
pub struct MergeSettings {
    /// 近似重复阈值
    pub similarity_threshold: f64,
    /// 批评文本最大字符数
    pub critique_max_chars: usize,
    /// 子问题最大数量
    pub max_sub_questions: usize,
    /// 拼接分隔符
    pub field_delimiter: String,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
            critique_max_chars: 6000,
            max_sub_questions: 10,
            field_delimiter: "\n\n".to_string(),
        }
    }
}

/// 分别合并三类结果并组装最终报告
pub fn assemble_result(
    extractions: &[FieldExtraction],
    critiques: &[CritiqueFragment],
    questions: &[QuestionSet],
    settings: &MergeSettings,
) -> AnalysisResult {
    AnalysisResult {
        fields: merge_fields(extractions, &settings.field_delimiter),
        critique: merge_critiques(critiques, settings),
        reviewer_questions: merge_questions(questions, settings),
    }
}
