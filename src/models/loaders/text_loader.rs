use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

use crate::text::normalize_text;

/// 支持的文本文件扩展名
const TEXT_EXTENSIONS: [&str; 3] = ["txt", "md", "markdown"];

/// 文本来源：规范化后的文本以及原始文件字节数
#[derive(Debug, Clone)]
pub struct TextSource {
    pub name: String,
    pub text: String,
    pub byte_len: usize,
}

/// 从文本文件加载并规范化内容
pub async fn load_text_document(path: &Path) -> Result<TextSource> {
    let raw = fs::read(path)
        .await
        .with_context(|| format!("无法读取文件: {}", path.display()))?;

    let byte_len = raw.len();
    let content = String::from_utf8(raw)
        .with_context(|| format!("文件不是有效的 UTF-8 文本: {}", path.display()))?;

    let text = normalize_text(&content);
    if text.is_empty() {
        anyhow::bail!("文件中没有可分析的文本: {}", path.display());
    }

    let name = path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    Ok(TextSource {
        name,
        text,
        byte_len,
    })
}

/// 从文件夹中加载所有文本文件（按文件名排序）
pub async fn load_all_text_documents(folder_path: &Path) -> Result<Vec<TextSource>> {
    if !folder_path.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path.display());
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(folder_path)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_text_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut sources = Vec::new();
    for path in paths {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_text_document(&path).await {
            Ok(source) => {
                tracing::info!("成功加载 {} 字节", source.byte_len);
                sources.push(source);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(sources)
}

fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| TEXT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
