//! 批评服务 - 业务能力层

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::CapabilityError;
use crate::infrastructure::LlmClient;
use crate::models::CritiqueFragment;
use crate::services::capability::AnalysisCapability;
use crate::services::response_parser::{clean_text, extract_json_object, string_field};

const CAPABILITY_NAME: &str = "critique";

const SYSTEM_PROMPT: &str = r#"You are a rigorous peer reviewer. Critique the research paper excerpt
by identifying flaws, gaps, or reasoning problems.
Respond with a single JSON object and nothing else: {"critique": "..."}.
Use null for "critique" when the excerpt gives nothing to criticize."#;

/// 基于 LLM 的批评能力
pub struct LlmCritic {
    llm: Arc<LlmClient>,
}

impl LlmCritic {
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }

    async fn critique(&self, text: &str) -> Result<CritiqueFragment, CapabilityError> {
        let user_message = format!("Research paper excerpt:\n\n{}", text);
        let response = self.llm.send_to_llm(&user_message, Some(SYSTEM_PROMPT)).await?;
        Ok(parse_critique(&response))
    }
}

impl AnalysisCapability for LlmCritic {
    type Output = CritiqueFragment;

    fn name(&self) -> &'static str {
        CAPABILITY_NAME
    }

    fn analyze<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<CritiqueFragment, CapabilityError>> {
        self.critique(text).boxed()
    }
}

/// 解析批评结果
///
/// 有 JSON 对象时只读 `critique` 字段；模型直接回了纯文本时整段作为批评
pub fn parse_critique(response: &str) -> CritiqueFragment {
    match extract_json_object(response) {
        Some(map) => string_field(&map, "critique"),
        None => clean_text(response),
    }
}
