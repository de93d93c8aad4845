use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::merge::MergeSettings;
use crate::orchestrator::RunSettings;
use crate::text::SegmentSettings;

/// 单个分段的硬性上限（字符），超过时截断到该值
pub const MAX_SEGMENT_BUDGET: usize = 8000;

/// 配置文件路径环境变量
pub const CONFIG_PATH_ENV: &str = "PAPER_CRITIQUE_CONFIG";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 分段配置 ---
    /// 每个分段的字符预算
    pub segment_budget: usize,
    /// 相邻分段的重叠字符数（为空时取预算的 10%）
    pub segment_overlap: Option<usize>,
    /// 查找句子/段落边界时最多回看的字符数
    pub boundary_lookback: usize,
    /// 单个文档允许的最大字符数
    pub max_document_chars: usize,

    // --- 调度配置 ---
    /// 同时进行的能力调用数量
    pub max_concurrent_calls: usize,
    /// 单次能力调用超时（秒）
    pub call_timeout_secs: u64,
    /// 一次分析运行的总时限（秒）
    pub run_deadline_secs: u64,

    // --- 合并配置 ---
    /// 近似重复判定阈值
    pub similarity_threshold: f64,
    /// 批评文本最大字符数
    pub critique_max_chars: usize,
    /// 子问题最大数量
    pub max_sub_questions: usize,
    /// 多个字段值之间的分隔符
    pub field_delimiter: String,

    // --- 输入输出 ---
    /// 待分析文档（文件或文件夹）
    pub input_path: String,
    /// 分析结果输出目录
    pub output_folder: String,
    /// 日志级别（RUST_LOG 优先）
    pub log_level: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,

    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            segment_budget: 4000,
            segment_overlap: None,
            boundary_lookback: 200,
            max_document_chars: 2_000_000,
            max_concurrent_calls: 4,
            call_timeout_secs: 120,
            run_deadline_secs: 900,
            similarity_threshold: 0.8,
            critique_max_chars: 6000,
            max_sub_questions: 10,
            field_delimiter: "\n\n".to_string(),
            input_path: "papers".to_string(),
            output_folder: "analysis_output".to_string(),
            log_level: "info".to_string(),
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_temperature: 0.3,
            llm_max_tokens: 1024,
        }
    }
}

impl Config {
    /// 只从环境变量读取配置
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 先读取可选的 TOML 配置文件，再应用环境变量覆盖
    ///
    /// 不做校验，调用方在日志初始化之后调用 [`Config::validate`]
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_toml_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// 从 TOML 文件读取配置，未出现的字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file(path.display().to_string(), e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::config(format!("TOML 解析失败: {}", e)))
    }

    fn with_env_overrides(self) -> Self {
        Self {
            segment_budget: env_parse("SEGMENT_BUDGET").unwrap_or(self.segment_budget),
            segment_overlap: env_parse("SEGMENT_OVERLAP").or(self.segment_overlap),
            boundary_lookback: env_parse("BOUNDARY_LOOKBACK").unwrap_or(self.boundary_lookback),
            max_document_chars: env_parse("MAX_DOCUMENT_CHARS").unwrap_or(self.max_document_chars),
            max_concurrent_calls: env_parse("MAX_CONCURRENT_CALLS").unwrap_or(self.max_concurrent_calls),
            call_timeout_secs: env_parse("CALL_TIMEOUT_SECS").unwrap_or(self.call_timeout_secs),
            run_deadline_secs: env_parse("RUN_DEADLINE_SECS").unwrap_or(self.run_deadline_secs),
            similarity_threshold: env_parse("SIMILARITY_THRESHOLD").unwrap_or(self.similarity_threshold),
            critique_max_chars: env_parse("CRITIQUE_MAX_CHARS").unwrap_or(self.critique_max_chars),
            max_sub_questions: env_parse("MAX_SUB_QUESTIONS").unwrap_or(self.max_sub_questions),
            field_delimiter: std::env::var("FIELD_DELIMITER").unwrap_or(self.field_delimiter),
            input_path: std::env::var("INPUT_PATH").unwrap_or(self.input_path),
            output_folder: std::env::var("OUTPUT_FOLDER").unwrap_or(self.output_folder),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(self.log_level),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
            llm_api_key: std::env::var("LLM_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .unwrap_or(self.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
            llm_temperature: env_parse("LLM_TEMPERATURE").unwrap_or(self.llm_temperature),
            llm_max_tokens: env_parse("LLM_MAX_TOKENS").unwrap_or(self.llm_max_tokens),
        }
    }

    /// 校验配置；超过上限的分段预算会被截断
    pub fn validate(mut self) -> AppResult<Self> {
        if self.segment_budget == 0 {
            return Err(AppError::config("segment_budget 必须大于 0"));
        }
        if self.segment_budget > MAX_SEGMENT_BUDGET {
            warn!(
                "⚠️ 分段预算 {} 超过上限，改用 {}",
                self.segment_budget, MAX_SEGMENT_BUDGET
            );
            self.segment_budget = MAX_SEGMENT_BUDGET;
        }
        if self.overlap() >= self.segment_budget {
            return Err(AppError::config(format!(
                "segment_overlap ({}) 必须小于 segment_budget ({})",
                self.overlap(),
                self.segment_budget
            )));
        }
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(AppError::config(format!(
                "similarity_threshold ({}) 必须在 (0, 1] 之间",
                self.similarity_threshold
            )));
        }
        if self.max_concurrent_calls == 0 {
            return Err(AppError::config("max_concurrent_calls 必须大于 0"));
        }
        if self.call_timeout_secs == 0 || self.run_deadline_secs == 0 {
            return Err(AppError::config("超时时间必须大于 0"));
        }
        if self.max_sub_questions == 0 {
            return Err(AppError::config("max_sub_questions 必须大于 0"));
        }
        if self.max_document_chars == 0 {
            return Err(AppError::config("max_document_chars 必须大于 0"));
        }
        Ok(self)
    }

    /// 实际使用的重叠字符数
    pub fn overlap(&self) -> usize {
        self.segment_overlap.unwrap_or(self.segment_budget / 10)
    }

    pub fn segment_settings(&self) -> SegmentSettings {
        SegmentSettings {
            budget: self.segment_budget,
            overlap: self.overlap(),
            lookback: self.boundary_lookback,
        }
    }

    pub fn merge_settings(&self) -> MergeSettings {
        MergeSettings {
            similarity_threshold: self.similarity_threshold,
            critique_max_chars: self.critique_max_chars,
            max_sub_questions: self.max_sub_questions,
            field_delimiter: self.field_delimiter.clone(),
        }
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            segment: self.segment_settings(),
            merge: self.merge_settings(),
            max_document_chars: self.max_document_chars,
            max_concurrent_calls: self.max_concurrent_calls,
            call_timeout: Duration::from_secs(self.call_timeout_secs),
            run_deadline: Duration::from_secs(self.run_deadline_secs),
            verbose_logging: self.verbose_logging,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
