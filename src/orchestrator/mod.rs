//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责文档级的运行调度和批量处理，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量文档处理器
//! - 管理应用生命周期（初始化、运行）
//! - 加载文档（Vec<TextSource>）
//! - 写出分析结果，输出全局统计信息
//!
//! ### `analysis_run` - 单篇文档分析运行
//! - 切分文档（Vec<Segment>）
//! - 为每个 (分段, 能力) 组合并发调用 SegmentFlow
//! - 处理调用超时和整体截止时间
//! - 按分段顺序合并结果，维护运行状态
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<TextSource>)
//!     ↓
//! analysis_run (处理 Vec<Segment>)
//!     ↓
//! workflow::SegmentFlow (处理单个 分段 × 能力)
//!     ↓
//! services (能力层：extraction / critique / questions)
//!     ↓
//! infrastructure (基础设施：LlmClient)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管批量，analysis_run 管单篇
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度和统计，合并规则在 `merge` 中

pub mod analysis_run;
pub mod batch_processor;

// 重新导出主要类型
pub use analysis_run::{Analyzer, RunReport, RunSettings, RunState, RunStats};
pub use batch_processor::{write_response, App};
