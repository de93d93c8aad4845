//! 分析能力接口
//!
//! 每种能力只回答一个问题："给我一段文本，我能产出什么"。
//! 能力之间互不依赖，编排层为每个 (分段, 能力) 组合独立调用一次。

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::CapabilityError;
use crate::models::{CritiqueFragment, FieldExtraction, QuestionSet};

/// 分析能力
///
/// 实现必须可以被多个任务同时调用，编排层负责超时与并发限制
pub trait AnalysisCapability: Send + Sync {
    type Output: Send + 'static;

    /// 能力名称，用于日志和错误信息
    fn name(&self) -> &'static str;

    /// 分析一段文本
    fn analyze<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Self::Output, CapabilityError>>;
}

pub type SharedCapability<T> = Arc<dyn AnalysisCapability<Output = T>>;

/// 能力种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    Extraction,
    Critique,
    Questions,
}

impl CapabilityKind {
    pub const ALL: [CapabilityKind; 3] = [
        CapabilityKind::Extraction,
        CapabilityKind::Critique,
        CapabilityKind::Questions,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CapabilityKind::Extraction => "extraction",
            CapabilityKind::Critique => "critique",
            CapabilityKind::Questions => "questions",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 一次运行所用的三种能力
#[derive(Clone)]
pub struct Capabilities {
    pub extraction: SharedCapability<FieldExtraction>,
    pub critique: SharedCapability<CritiqueFragment>,
    pub questions: SharedCapability<QuestionSet>,
}

impl Capabilities {
    pub fn new(
        extraction: SharedCapability<FieldExtraction>,
        critique: SharedCapability<CritiqueFragment>,
        questions: SharedCapability<QuestionSet>,
    ) -> Self {
        Self {
            extraction,
            critique,
            questions,
        }
    }
}

/// 把异步闭包包装成能力
///
/// 闭包拿到分段文本的拷贝，主要用于测试替身和简单的本地能力
pub struct FnCapability<F> {
    name: &'static str,
    f: F,
}

impl<F> FnCapability<F> {
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F, Fut, T> AnalysisCapability for FnCapability<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, CapabilityError>> + Send + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn name(&self) -> &'static str {
        self.name
    }

    fn analyze<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<T, CapabilityError>> {
        (self.f)(text.to_string()).boxed()
    }
}
