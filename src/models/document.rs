//! 文档与分段

use serde::Serialize;

use crate::error::{AppError, AppResult};

/// 待分析的文档
///
/// 文本不可变；`budget` 是单个分段允许的最大字符数
#[derive(Debug, Clone)]
pub struct Document {
    name: String,
    text: String,
    char_len: usize,
    source_bytes: usize,
    budget: usize,
}

impl Document {
    /// 创建文档
    ///
    /// 空文本、超过 `max_chars` 的文本以及为 0 的预算都会被拒绝
    pub fn new(
        name: impl Into<String>,
        text: impl Into<String>,
        budget: usize,
        max_chars: usize,
    ) -> AppResult<Self> {
        let name = name.into();
        let text = text.into();

        if text.trim().is_empty() {
            return Err(AppError::invalid_input(format!("文档 {} 内容为空", name)));
        }
        if budget == 0 {
            return Err(AppError::invalid_input("分段预算必须大于 0"));
        }

        let char_len = text.chars().count();
        if char_len > max_chars {
            return Err(AppError::invalid_input(format!(
                "文档 {} 过长: {} 字符，上限 {}",
                name, char_len, max_chars
            )));
        }

        let source_bytes = text.len();
        Ok(Self {
            name,
            text,
            char_len,
            source_bytes,
            budget,
        })
    }

    /// 记录原始文件的字节长度（转换前）
    pub fn with_source_bytes(mut self, source_bytes: usize) -> Self {
        self.source_bytes = source_bytes;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// 字符数
    pub fn char_len(&self) -> usize {
        self.char_len
    }

    pub fn source_bytes(&self) -> usize {
        self.source_bytes
    }

    pub fn budget(&self) -> usize {
        self.budget
    }
}

/// 文档中的一个分段
///
/// 偏移量以字符计，区间为 `[start_offset, end_offset)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub index: usize,
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl Segment {
    /// 分段长度（字符）
    pub fn len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
