//! 字段抽取服务 - 业务能力层
//!
//! 只负责"从一段论文文本中抽取五个字段"，不关心分段与合并

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use crate::error::CapabilityError;
use crate::infrastructure::LlmClient;
use crate::models::{Field, FieldExtraction};
use crate::services::capability::AnalysisCapability;
use crate::services::response_parser::{extract_json_object, string_field};

const CAPABILITY_NAME: &str = "extraction";

const SYSTEM_PROMPT: &str = r#"You read an excerpt of a research paper and extract its key parts.
Respond with a single JSON object and nothing else, using exactly these keys:
- "goal": the main goal of the research
- "hypothesis": the main hypothesis or research question
- "methods": the methodology used in the research
- "results": the main results or findings
- "conclusion": the conclusions drawn from the results
Each value is a concise string. Use null when the excerpt does not mention that part."#;

/// 基于 LLM 的字段抽取能力
pub struct LlmExtractor {
    llm: Arc<LlmClient>,
}

impl LlmExtractor {
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }

    async fn extract(&self, text: &str) -> Result<FieldExtraction, CapabilityError> {
        let user_message = format!("Research paper excerpt:\n\n{}", text);
        let response = self.llm.send_to_llm(&user_message, Some(SYSTEM_PROMPT)).await?;
        let extraction = parse_extraction(&response)?;

        debug!(
            "字段抽取完成: {}/5 个字段有内容",
            Field::ALL.iter().filter(|f| extraction.get(**f).is_some()).count()
        );
        Ok(extraction)
    }
}

impl AnalysisCapability for LlmExtractor {
    type Output = FieldExtraction;

    fn name(&self) -> &'static str {
        CAPABILITY_NAME
    }

    fn analyze<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<FieldExtraction, CapabilityError>> {
        self.extract(text).boxed()
    }
}

/// 解析抽取结果；没有 JSON 对象时视为调用失败
pub fn parse_extraction(response: &str) -> Result<FieldExtraction, CapabilityError> {
    let map = extract_json_object(response)
        .ok_or_else(|| CapabilityError::malformed(CAPABILITY_NAME, "响应中没有 JSON 对象"))?;

    let mut extraction = FieldExtraction::default();
    for field in Field::ALL {
        extraction.set(field, string_field(&map, field.key()));
    }
    Ok(extraction)
}
