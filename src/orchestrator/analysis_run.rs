//! 单篇文档分析运行 - 编排层
//!
//! ## 职责
//!
//! 本模块负责一篇文档从分段到合并的完整运行，是文档级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **分段**：按预算切分文档，参数非法时在分发前拒绝
//! 2. **分发**：为每个 (分段, 能力) 组合启动一个任务，Semaphore 限制并发
//! 3. **收集**：按分段编号写回各自的结果槽，与完成顺序无关
//! 4. **截止**：整体截止时间到达后取消未完成的任务，已完成的结果照常合并
//! 5. **合并**：调用三个合并器组装最终结果
//! 6. **统计**：记录成功/失败/取消的调用数量
//!
//! ## 状态流转
//!
//! `Pending → Dispatching → Merging → Completed`，没有任何成功调用时进入 `Failed`；
//! 输入非法时直接 `Pending → Failed`。

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult, CapabilityError};
use crate::merge::{assemble_result, MergeSettings};
use crate::models::{
    AnalysisResponse, AnalysisResult, CritiqueFragment, Document, Field, FieldExtraction,
    QuestionSet, Segment,
};
use crate::services::{Capabilities, CapabilityKind};
use crate::text::{segment_with, SegmentSettings};
use crate::utils::logging::truncate_text;
use crate::workflow::{CapabilityOutput, SegmentCtx, SegmentFlow};

/// 运行参数
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub segment: SegmentSettings,
    pub merge: MergeSettings,
    pub max_document_chars: usize,
    pub max_concurrent_calls: usize,
    /// 单次调用超时
    pub call_timeout: Duration,
    /// 整体截止时间，从开始分发计时
    pub run_deadline: Duration,
    pub verbose_logging: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            segment: SegmentSettings::with_default_overlap(4000),
            merge: MergeSettings::default(),
            max_document_chars: 2_000_000,
            max_concurrent_calls: 4,
            call_timeout: Duration::from_secs(120),
            run_deadline: Duration::from_secs(900),
            verbose_logging: false,
        }
    }
}

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Dispatching,
    Merging,
    Completed,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Pending => "Pending",
            RunState::Dispatching => "Dispatching",
            RunState::Merging => "Merging",
            RunState::Completed => "Completed",
            RunState::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// 运行统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub segments: usize,
    pub calls: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// 截止时间到达时仍未结束的调用
    pub cancelled: usize,
    pub deadline_exceeded: bool,
    pub elapsed: Duration,
}

/// 一次运行的报告
#[derive(Debug)]
pub struct RunReport {
    pub document: String,
    pub state: RunState,
    /// 依次经过的状态，包含初始的 `Pending`
    pub history: Vec<RunState>,
    pub outcome: AppResult<AnalysisResult>,
    pub stats: RunStats,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// 对外响应
    pub fn response(&self) -> AnalysisResponse {
        match &self.outcome {
            Ok(result) => AnalysisResponse::from(result.clone()),
            Err(e) => AnalysisResponse::failure(e.to_string()),
        }
    }

    pub fn into_response(self) -> AnalysisResponse {
        match self.outcome {
            Ok(result) => result.into(),
            Err(e) => AnalysisResponse::failure(e.to_string()),
        }
    }
}

/// 分析器
///
/// 持有三种能力和运行参数，可以反复用于多篇文档
pub struct Analyzer {
    capabilities: Capabilities,
    settings: RunSettings,
}

impl Analyzer {
    pub fn new(capabilities: Capabilities, settings: RunSettings) -> Self {
        Self {
            capabilities,
            settings,
        }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// 按当前参数构建文档
    pub fn document(&self, name: &str, text: &str) -> AppResult<Document> {
        Document::new(
            name,
            text,
            self.settings.segment.budget,
            self.settings.max_document_chars,
        )
    }

    /// 分析一段原始文本
    ///
    /// 文本不满足文档约束时返回 `Failed` 报告，不会发出任何调用
    pub async fn analyze_text(&self, name: &str, text: &str) -> RunReport {
        match self.document(name, text) {
            Ok(document) => self.analyze(&document).await,
            Err(e) => self.reject(name, e),
        }
    }

    /// 输入在分发前被拒绝时的报告：`Pending → Failed`
    pub fn reject(&self, name: &str, error: AppError) -> RunReport {
        warn!("[文档 {}] ❌ 输入被拒绝: {}", name, error);
        AnalysisRun::new(self, name).finish(Err(error), RunStats::default())
    }

    /// 分析一篇文档
    pub async fn analyze(&self, document: &Document) -> RunReport {
        AnalysisRun::new(self, document.name()).execute(document).await
    }
}

// ========== 单次运行 ==========

/// 单个调用槽的状态
#[derive(Debug)]
enum CallStatus<T> {
    Pending,
    Succeeded(T),
    Failed,
}

impl<T> CallStatus<T> {
    fn succeeded(&self) -> Option<&T> {
        match self {
            CallStatus::Succeeded(value) => Some(value),
            _ => None,
        }
    }

    fn is_pending(&self) -> bool {
        matches!(self, CallStatus::Pending)
    }
}

/// 一个分段的三个结果槽
#[derive(Debug)]
struct SegmentSlots {
    extraction: CallStatus<FieldExtraction>,
    critique: CallStatus<CritiqueFragment>,
    questions: CallStatus<QuestionSet>,
}

impl SegmentSlots {
    fn new() -> Self {
        Self {
            extraction: CallStatus::Pending,
            critique: CallStatus::Pending,
            questions: CallStatus::Pending,
        }
    }

    fn record(&mut self, kind: CapabilityKind, result: Result<CapabilityOutput, CapabilityError>) {
        match result {
            Ok(CapabilityOutput::Extraction(value)) => self.extraction = CallStatus::Succeeded(value),
            Ok(CapabilityOutput::Critique(value)) => self.critique = CallStatus::Succeeded(value),
            Ok(CapabilityOutput::Questions(value)) => self.questions = CallStatus::Succeeded(value),
            Err(_) => match kind {
                CapabilityKind::Extraction => self.extraction = CallStatus::Failed,
                CapabilityKind::Critique => self.critique = CallStatus::Failed,
                CapabilityKind::Questions => self.questions = CallStatus::Failed,
            },
        }
    }

    /// (成功, 失败, 未结束)
    fn tally(&self) -> (usize, usize, usize) {
        let states = [
            (self.extraction.succeeded().is_some(), self.extraction.is_pending()),
            (self.critique.succeeded().is_some(), self.critique.is_pending()),
            (self.questions.succeeded().is_some(), self.questions.is_pending()),
        ];
        states
            .iter()
            .fold((0, 0, 0), |(ok, failed, pending), &(is_ok, is_pending)| {
                if is_ok {
                    (ok + 1, failed, pending)
                } else if is_pending {
                    (ok, failed, pending + 1)
                } else {
                    (ok, failed + 1, pending)
                }
            })
    }
}

struct AnalysisRun<'a> {
    analyzer: &'a Analyzer,
    name: String,
    state: RunState,
    history: Vec<RunState>,
    started: Instant,
}

impl<'a> AnalysisRun<'a> {
    fn new(analyzer: &'a Analyzer, name: &str) -> Self {
        Self {
            analyzer,
            name: name.to_string(),
            state: RunState::Pending,
            history: vec![RunState::Pending],
            started: Instant::now(),
        }
    }

    fn transition(&mut self, next: RunState) {
        debug!("[文档 {}] 状态: {} → {}", self.name, self.state, next);
        self.state = next;
        self.history.push(next);
    }

    async fn execute(mut self, document: &Document) -> RunReport {
        let settings = SegmentSettings {
            budget: document.budget(),
            ..self.analyzer.settings.segment
        };

        let segments = match segment_with(document.text(), &settings) {
            Ok(segments) => segments,
            Err(e) => {
                warn!("[文档 {}] ❌ 分段失败: {}", self.name, e);
                return self.finish(Err(e), RunStats::default());
            }
        };

        info!(
            "[文档 {}] ✂️ {} 字符 ({} 字节) 切分为 {} 个分段",
            self.name,
            document.char_len(),
            document.source_bytes(),
            segments.len()
        );
        if self.analyzer.settings.verbose_logging {
            self.log_segments(&segments);
        }

        self.transition(RunState::Dispatching);
        let (slots, deadline_exceeded) = self.dispatch(&segments).await;
        let stats = self.tally(&slots, deadline_exceeded);

        if stats.succeeded == 0 {
            error!(
                "[文档 {}] ❌ 所有 {} 次调用均未成功",
                self.name, stats.calls
            );
            let error = AppError::TotalFailure {
                segments: stats.segments,
                calls: stats.calls,
            };
            return self.finish(Err(error), stats);
        }

        self.transition(RunState::Merging);
        let result = match self.merge(&slots).await {
            Ok(result) => result,
            Err(e) => {
                error!("[文档 {}] ❌ {}", self.name, e);
                return self.finish(Err(e), stats);
            }
        };
        log_result_structure(&self.name, &result);

        self.finish(Ok(result), stats)
    }

    /// 分发所有调用并等待结束或截止
    ///
    /// 返回按分段编号排列的结果槽，以及是否到达了截止时间
    async fn dispatch(&self, segments: &[Segment]) -> (Vec<SegmentSlots>, bool) {
        let settings = &self.analyzer.settings;
        let flow = SegmentFlow::new(
            self.analyzer.capabilities.clone(),
            Arc::new(Semaphore::new(settings.max_concurrent_calls)),
            settings.call_timeout,
        );
        let document: Arc<str> = Arc::from(self.name.as_str());
        let total = segments.len();

        let mut tasks = JoinSet::new();
        for segment in segments {
            let text: Arc<str> = Arc::from(segment.text.as_str());
            for kind in CapabilityKind::ALL {
                let flow = flow.clone();
                let text = text.clone();
                let ctx = SegmentCtx::new(document.clone(), segment.index, total, kind);
                tasks.spawn(async move { flow.run(text, ctx).await });
            }
        }

        info!(
            "[文档 {}] 🚀 已分发 {} 次调用 (最大并发 {})",
            self.name,
            tasks.len(),
            settings.max_concurrent_calls
        );

        let mut slots: Vec<SegmentSlots> = (0..total).map(|_| SegmentSlots::new()).collect();
        let deadline = Instant::now() + settings.run_deadline;
        let mut deadline_exceeded = false;

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok(settled))) => match slots.get_mut(settled.segment_index) {
                    Some(slot) => slot.record(settled.kind, settled.result),
                    None => error!(
                        "[文档 {}] 分段编号越界: {}",
                        self.name, settled.segment_index
                    ),
                },
                Ok(Some(Err(e))) => {
                    error!("[文档 {}] 任务执行失败: {}", self.name, e);
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        "[文档 {}] ⏰ 超过整体截止时间 {:?}，取消剩余 {} 次调用",
                        self.name,
                        settings.run_deadline,
                        tasks.len()
                    );
                    tasks.shutdown().await;
                    deadline_exceeded = true;
                    break;
                }
            }
        }

        (slots, deadline_exceeded)
    }

    fn tally(&self, slots: &[SegmentSlots], deadline_exceeded: bool) -> RunStats {
        let (succeeded, failed, pending) =
            slots
                .iter()
                .map(SegmentSlots::tally)
                .fold((0, 0, 0), |acc, (ok, failed, pending)| {
                    (acc.0 + ok, acc.1 + failed, acc.2 + pending)
                });

        // 没有截止时仍未结束的调用只能是任务异常退出
        let (failed, cancelled) = if deadline_exceeded {
            (failed, pending)
        } else {
            (failed + pending, 0)
        };

        RunStats {
            segments: slots.len(),
            calls: slots.len() * CapabilityKind::ALL.len(),
            succeeded,
            failed,
            cancelled,
            deadline_exceeded,
            elapsed: self.started.elapsed(),
        }
    }

    /// 按分段顺序收集成功结果，在阻塞线程上合并
    async fn merge(&self, slots: &[SegmentSlots]) -> AppResult<AnalysisResult> {
        let extractions: Vec<FieldExtraction> = slots
            .iter()
            .filter_map(|s| s.extraction.succeeded())
            .cloned()
            .collect();
        let critiques: Vec<CritiqueFragment> = slots
            .iter()
            .filter_map(|s| s.critique.succeeded())
            .cloned()
            .collect();
        let questions: Vec<QuestionSet> = slots
            .iter()
            .filter_map(|s| s.questions.succeeded())
            .cloned()
            .collect();

        debug!(
            "[文档 {}] 合并: 抽取 {} 份，批评 {} 份，问题 {} 份",
            self.name,
            extractions.len(),
            critiques.len(),
            questions.len()
        );

        let settings = self.analyzer.settings.merge.clone();
        tokio::task::spawn_blocking(move || {
            assemble_result(&extractions, &critiques, &questions, &settings)
        })
        .await
        .map_err(|e| AppError::Merge(e.to_string()))
    }

    fn finish(mut self, outcome: AppResult<AnalysisResult>, stats: RunStats) -> RunReport {
        let terminal = if outcome.is_ok() {
            RunState::Completed
        } else {
            RunState::Failed
        };
        self.transition(terminal);

        let stats = RunStats {
            elapsed: self.started.elapsed(),
            ..stats
        };
        log_run_complete(&self.name, terminal, &stats);

        RunReport {
            document: self.name,
            state: self.state,
            history: self.history,
            outcome,
            stats,
        }
    }

    fn log_segments(&self, segments: &[Segment]) {
        for segment in segments {
            debug!(
                "[文档 {}] 分段 {}: [{}, {}) {}",
                self.name,
                segment.index + 1,
                segment.start_offset,
                segment.end_offset,
                truncate_text(&segment.text, 60)
            );
        }
    }
}

// ========== 日志辅助函数 ==========

fn log_result_structure(name: &str, result: &AnalysisResult) {
    let field_lengths: Vec<String> = Field::ALL
        .iter()
        .map(|f| {
            let len = result.fields.get(*f).map_or(0, |v| v.chars().count());
            format!("{}={}", f.key(), len)
        })
        .collect();
    let sub_questions = result
        .reviewer_questions
        .as_ref()
        .map_or(0, |q| q.sub_questions.len());

    info!(
        "[文档 {}] 📋 结果结构: {}, critique={}, sub_questions={}",
        name,
        field_lengths.join(", "),
        result.critique.chars().count(),
        sub_questions
    );
}

fn log_run_complete(name: &str, state: RunState, stats: &RunStats) {
    let icon = if state == RunState::Completed { "✅" } else { "❌" };
    info!(
        "[文档 {}] {} {}: 成功 {}/{} 次调用，失败 {}，取消 {}，耗时 {:.2?}",
        name,
        icon,
        state,
        stats.succeeded,
        stats.calls,
        stats.failed,
        stats.cancelled,
        stats.elapsed
    );
    if stats.deadline_exceeded {
        warn!("[文档 {}] ⚠️ 结果基于截止前完成的调用", name);
    }
}
