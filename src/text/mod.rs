//! 文本处理：规范化与分段

pub mod normalize;
pub mod segmenter;

pub use normalize::normalize_text;
pub use segmenter::{segment, segment_with, SegmentSettings, DEFAULT_LOOKBACK};
