//! EPUB Translation CLI - EPUB电子书批量翻译工具库
//!
//! 这个库提供了归档成员遍历、段落片段提取、批量对齐翻译、译文回写和统计汇总等核心功能。

pub mod api_constants;
pub mod archive;
pub mod batch;
pub mod config;
pub mod error;
pub mod html_processor;
pub mod pipeline;
pub mod stats;
pub mod translator;
pub mod utils;
