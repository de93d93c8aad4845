//! 批量文档处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量文档的加载、分析和结果落盘。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：输出启动信息、创建 LLM 客户端和分析器
//! 2. **批量加载**：读取单个文件或扫描输入目录（`Vec<TextSource>`）
//! 3. **逐篇分析**：每篇文档交给 `Analyzer`，文档内部的调用并发执行
//! 4. **结果落盘**：每篇文档写出 `<name>.analysis.json`
//! 5. **全局统计**：汇总所有文档的处理结果

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::LlmClient;
use crate::models::{load_all_text_documents, load_text_document, AnalysisResponse, TextSource};
use crate::orchestrator::analysis_run::Analyzer;
use crate::services::Capabilities;
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    analyzer: Analyzer,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config);

        if config.llm_api_key.is_empty() {
            warn!("⚠️ 未设置 LLM_API_KEY / OPENAI_API_KEY，LLM 调用可能失败");
        }

        let llm = Arc::new(LlmClient::new(&config));
        info!("🔌 LLM 客户端已创建 (模型: {})", llm.model_name());
        let analyzer = Analyzer::new(Capabilities::from_llm(llm), config.run_settings());

        Ok(Self::with_analyzer(config, analyzer))
    }

    /// 使用自定义分析器创建应用
    pub fn with_analyzer(config: Config, analyzer: Analyzer) -> Self {
        Self { config, analyzer }
    }

    /// 运行应用主逻辑
    ///
    /// `input` 为空时处理配置中的输入路径
    pub async fn run(&self, input: Option<PathBuf>) -> Result<()> {
        let input = input.unwrap_or_else(|| PathBuf::from(&self.config.input_path));
        let documents = self.load_documents(&input).await?;

        if documents.is_empty() {
            warn!("⚠️ 没有找到待分析的文档，程序结束");
            return Ok(());
        }

        logging::log_documents_loaded(documents.len());

        let stats = self.process_all_documents(&documents).await?;

        logging::print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            &self.config.output_folder,
        );

        Ok(())
    }

    /// 加载文档
    async fn load_documents(&self, input: &Path) -> Result<Vec<TextSource>> {
        info!("\n📁 正在扫描待分析的文档: {}", input.display());

        if input.is_file() {
            Ok(vec![load_text_document(input).await?])
        } else {
            load_all_text_documents(input).await
        }
    }

    /// 逐篇处理所有文档
    async fn process_all_documents(&self, documents: &[TextSource]) -> Result<ProcessingStats> {
        let output_folder = Path::new(&self.config.output_folder);
        tokio::fs::create_dir_all(output_folder)
            .await
            .with_context(|| format!("无法创建输出目录: {}", output_folder.display()))?;

        let mut stats = ProcessingStats {
            total: documents.len(),
            ..Default::default()
        };

        for (idx, source) in documents.iter().enumerate() {
            match self.process_document(source, idx + 1, documents.len()).await {
                Ok(true) => stats.success += 1,
                Ok(false) => stats.failed += 1,
                Err(e) => {
                    error!("[文档 {}] ❌ 处理过程中发生错误: {:#}", source.name, e);
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }

    /// 分析单篇文档并写出结果
    ///
    /// 返回分析是否成功；失败的响应同样会写出
    async fn process_document(&self, source: &TextSource, index: usize, total: usize) -> Result<bool> {
        logging::log_document_start(index, total, &source.name, source.text.chars().count());

        let report = match self.analyzer.document(&source.name, &source.text) {
            Ok(document) => {
                let document = document.with_source_bytes(source.byte_len);
                self.analyzer.analyze(&document).await
            }
            Err(e) => self.analyzer.reject(&source.name, e),
        };

        let success = report.is_success();
        let output_path = write_response(
            Path::new(&self.config.output_folder),
            &source.name,
            &report.into_response(),
        )
        .await?;

        info!("[文档 {}] 💾 结果已写入: {}", source.name, output_path.display());
        Ok(success)
    }
}

/// 把响应写成 `<name>.analysis.json`
pub async fn write_response(
    output_folder: &Path,
    name: &str,
    response: &AnalysisResponse,
) -> Result<PathBuf> {
    let path = output_folder.join(format!("{}.analysis.json", name));
    let json = serde_json::to_string_pretty(response).context("序列化分析结果失败")?;
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("无法写入文件: {}", path.display()))?;
    Ok(path)
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    success: usize,
    failed: usize,
    total: usize,
}
