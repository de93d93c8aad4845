//! 分段调用流程 - 流程层
//!
//! 核心职责：对"一个分段 × 一种能力"执行一次调用
//!
//! 流程顺序：
//! 1. 获取并发许可
//! 2. 带超时调用能力
//! 3. 记录日志，把结果连同分段编号交回编排层

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::error::CapabilityError;
use crate::models::{CritiqueFragment, FieldExtraction, QuestionSet};
use crate::services::{Capabilities, CapabilityKind, SharedCapability};
use crate::workflow::segment_ctx::SegmentCtx;

/// 单次调用的产出
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityOutput {
    Extraction(FieldExtraction),
    Critique(CritiqueFragment),
    Questions(QuestionSet),
}

/// 已结束的调用
///
/// 调用可能以任意顺序结束，编排层按 `segment_index` 放回原位
#[derive(Debug)]
pub struct SettledCall {
    pub segment_index: usize,
    pub kind: CapabilityKind,
    pub result: Result<CapabilityOutput, CapabilityError>,
}

/// 分段调用流程
///
/// - 不持有分段列表，也不知道合并规则
/// - 一次调用失败只影响这一个 (分段, 能力) 组合
#[derive(Clone)]
pub struct SegmentFlow {
    capabilities: Capabilities,
    semaphore: Arc<Semaphore>,
    call_timeout: Duration,
}

impl SegmentFlow {
    pub fn new(capabilities: Capabilities, semaphore: Arc<Semaphore>, call_timeout: Duration) -> Self {
        Self {
            capabilities,
            semaphore,
            call_timeout,
        }
    }

    pub async fn run(&self, text: Arc<str>, ctx: SegmentCtx) -> SettledCall {
        let result = match ctx.kind {
            CapabilityKind::Extraction => self
                .invoke(&self.capabilities.extraction, &text, &ctx)
                .await
                .map(CapabilityOutput::Extraction),
            CapabilityKind::Critique => self
                .invoke(&self.capabilities.critique, &text, &ctx)
                .await
                .map(CapabilityOutput::Critique),
            CapabilityKind::Questions => self
                .invoke(&self.capabilities.questions, &text, &ctx)
                .await
                .map(CapabilityOutput::Questions),
        };

        SettledCall {
            segment_index: ctx.segment_index,
            kind: ctx.kind,
            result,
        }
    }

    async fn invoke<T: Send + 'static>(
        &self,
        capability: &SharedCapability<T>,
        text: &str,
        ctx: &SegmentCtx,
    ) -> Result<T, CapabilityError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| CapabilityError::Other("并发许可已关闭".to_string()))?;

        debug!("{} 🚀 开始调用 ({} 字符)", ctx, text.chars().count());
        let start = Instant::now();

        let result = match tokio::time::timeout(self.call_timeout, capability.analyze(text)).await {
            Ok(result) => result,
            Err(_) => Err(CapabilityError::Timeout {
                capability: capability.name(),
                after: self.call_timeout,
            }),
        };

        match &result {
            Ok(_) => info!("{} ✅ 调用成功，耗时 {:.2?}", ctx, start.elapsed()),
            Err(e) => warn!("{} ❌ 调用失败: {}", ctx, e),
        }
        result
    }
}
