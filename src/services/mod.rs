//! 业务能力层（Services）
//!
//! 每个服务只处理一段文本，不知道分段编号、文档或合并规则

pub mod capability;
pub mod critique_service;
pub mod extraction_service;
pub mod question_service;
pub mod response_parser;

use std::sync::Arc;

pub use capability::{AnalysisCapability, Capabilities, CapabilityKind, FnCapability, SharedCapability};
pub use critique_service::LlmCritic;
pub use extraction_service::LlmExtractor;
pub use question_service::LlmQuestioner;

use crate::infrastructure::LlmClient;

impl Capabilities {
    /// 三种能力共用同一个 LLM 客户端
    pub fn from_llm(llm: Arc<LlmClient>) -> Self {
        Self::new(
            Arc::new(LlmExtractor::new(llm.clone())),
            Arc::new(LlmCritic::new(llm.clone())),
            Arc::new(LlmQuestioner::new(llm)),
        )
    }
}
