//! 分段处理上下文
//!
//! 封装"我正在处理哪篇文档的第几段、用哪种能力"这一信息

use std::fmt::Display;
use std::sync::Arc;

use crate::services::CapabilityKind;

/// 分段处理上下文
#[derive(Debug, Clone)]
pub struct SegmentCtx {
    /// 文档名称
    pub document: Arc<str>,

    /// 分段索引（从0开始）
    pub segment_index: usize,

    /// 分段总数（仅用于日志显示）
    pub total_segments: usize,

    pub kind: CapabilityKind,
}

impl SegmentCtx {
    pub fn new(
        document: Arc<str>,
        segment_index: usize,
        total_segments: usize,
        kind: CapabilityKind,
    ) -> Self {
        Self {
            document,
            segment_index,
            total_segments,
            kind,
        }
    }
}

impl Display for SegmentCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[文档 {} 分段 {}/{} {}]",
            self.document,
            self.segment_index + 1,
            self.total_segments,
            self.kind
        )
    }
}
