//! 分段分析结果与最终报告

use serde::{Deserialize, Serialize};

/// 五个固定语义字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Goal,
    Hypothesis,
    Methods,
    Results,
    Conclusion,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Goal,
        Field::Hypothesis,
        Field::Methods,
        Field::Results,
        Field::Conclusion,
    ];

    /// JSON 中使用的键名
    pub fn key(self) -> &'static str {
        match self {
            Field::Goal => "goal",
            Field::Hypothesis => "hypothesis",
            Field::Methods => "methods",
            Field::Results => "results",
            Field::Conclusion => "conclusion",
        }
    }
}

/// 单个分段的字段抽取结果，没有相关内容的字段为 `None`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldExtraction {
    pub goal: Option<String>,
    pub hypothesis: Option<String>,
    pub methods: Option<String>,
    pub results: Option<String>,
    pub conclusion: Option<String>,
}

impl FieldExtraction {
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Goal => self.goal.as_deref(),
            Field::Hypothesis => self.hypothesis.as_deref(),
            Field::Methods => self.methods.as_deref(),
            Field::Results => self.results.as_deref(),
            Field::Conclusion => self.conclusion.as_deref(),
        }
    }

    pub fn set(&mut self, field: Field, value: Option<String>) {
        let slot = match field {
            Field::Goal => &mut self.goal,
            Field::Hypothesis => &mut self.hypothesis,
            Field::Methods => &mut self.methods,
            Field::Results => &mut self.results,
            Field::Conclusion => &mut self.conclusion,
        };
        *slot = value;
    }

    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|f| self.get(*f).is_none())
    }
}

/// 单个分段的批评片段
pub type CritiqueFragment = Option<String>;

/// 审稿问题集合
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub main_question: Option<String>,
    #[serde(default)]
    pub sub_questions: Vec<String>,
    pub addressed_questions: Option<String>,
}

impl QuestionSet {
    pub fn is_empty(&self) -> bool {
        self.main_question.is_none()
            && self.sub_questions.is_empty()
            && self.addressed_questions.is_none()
    }
}

/// 一次分析运行的最终结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisResult {
    pub fields: FieldExtraction,
    pub critique: String,
    pub reviewer_questions: Option<QuestionSet>,
}

/// 对外序列化的响应
///
/// 成功时 `error` 不出现；全部失败时只有 `error`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypothesis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critique: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer_questions: Option<QuestionSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

impl From<AnalysisResult> for AnalysisResponse {
    fn from(result: AnalysisResult) -> Self {
        let FieldExtraction {
            goal,
            hypothesis,
            methods,
            results,
            conclusion,
        } = result.fields;
        Self {
            goal,
            hypothesis,
            methods,
            results,
            conclusion,
            critique: Some(result.critique),
            reviewer_questions: result.reviewer_questions,
            error: None,
        }
    }
}
