//! 审稿问题服务 - 业务能力层
//!
//! 为一段论文文本生成审稿人可能追问的问题

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use crate::error::CapabilityError;
use crate::infrastructure::LlmClient;
use crate::models::QuestionSet;
use crate::services::capability::AnalysisCapability;
use crate::services::response_parser::{extract_json_object, split_list_lines, string_field, string_list};

const CAPABILITY_NAME: &str = "questions";

const SYSTEM_PROMPT: &str = r#"You are a critical reviewer. Generate smart, critical follow-up questions
for the research paper excerpt.
Respond with a single JSON object and nothing else, using these keys:
- "main_question": the single most important question, or null
- "sub_questions": an array of further specific questions
- "addressed_questions": a short note on which questions the excerpt already answers, or null"#;

/// 基于 LLM 的审稿问题能力
pub struct LlmQuestioner {
    llm: Arc<LlmClient>,
}

impl LlmQuestioner {
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }

    async fn suggest(&self, text: &str) -> Result<QuestionSet, CapabilityError> {
        let user_message = format!("Research paper excerpt:\n\n{}", text);
        let response = self.llm.send_to_llm(&user_message, Some(SYSTEM_PROMPT)).await?;
        let questions = parse_questions(&response)?;

        debug!("生成了 {} 个子问题", questions.sub_questions.len());
        Ok(questions)
    }
}

impl AnalysisCapability for LlmQuestioner {
    type Output = QuestionSet;

    fn name(&self) -> &'static str {
        CAPABILITY_NAME
    }

    fn analyze<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<QuestionSet, CapabilityError>> {
        self.suggest(text).boxed()
    }
}

/// 解析问题集合
///
/// 没有 JSON 时把每一行当作一个子问题；连一行内容都没有才算失败
pub fn parse_questions(response: &str) -> Result<QuestionSet, CapabilityError> {
    if let Some(map) = extract_json_object(response) {
        return Ok(QuestionSet {
            main_question: string_field(&map, "main_question"),
            sub_questions: string_list(&map, "sub_questions"),
            addressed_questions: string_field(&map, "addressed_questions"),
        });
    }

    let lines = split_list_lines(response);
    if lines.is_empty() {
        return Err(CapabilityError::malformed(CAPABILITY_NAME, "响应中没有问题"));
    }
    Ok(QuestionSet {
        main_question: None,
        sub_questions: lines,
        addressed_questions: None,
    })
}
