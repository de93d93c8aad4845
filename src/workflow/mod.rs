//! 流程层（Workflow）
//!
//! 定义"一个分段 × 一种能力"的调用流程

pub mod segment_ctx;
pub mod segment_flow;

pub use segment_ctx::SegmentCtx;
pub use segment_flow::{CapabilityOutput, SegmentFlow, SettledCall};
