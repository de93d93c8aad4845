//! # Paper Critique
//!
//! 一个对长篇论文进行分段分析、批评和提问的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（LLM 客户端），只暴露能力
//! - `LlmClient` - 提供 send_to_llm() 能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个分段的文本
//! - `LlmExtractor` - 五个字段的抽取能力
//! - `LlmCritic` - 批评能力
//! - `LlmQuestioner` - 审稿问题能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个分段 × 一种能力"的调用流程
//! - `SegmentCtx` - 上下文封装（文档 + 分段编号 + 能力）
//! - `SegmentFlow` - 并发许可 → 超时调用 → 结果回传
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量文档处理器，加载文档、写出结果
//! - `orchestrator/analysis_run` - 单篇文档处理器，分段、分发、合并
//!
//! ### 纯逻辑模块
//! - `text/` - 文本规范化与分段
//! - `merge/` - 确定性的结果合并
//! - `models/` - 数据模型与文本加载
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod merge;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod text;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, CapabilityError};
pub use infrastructure::LlmClient;
pub use models::{AnalysisResponse, AnalysisResult, Document, FieldExtraction, QuestionSet, Segment};
pub use orchestrator::{Analyzer, App, RunReport, RunSettings, RunState, RunStats};
pub use services::{AnalysisCapability, Capabilities, FnCapability};
pub use text::segment;
pub use workflow::{SegmentCtx, SegmentFlow};
