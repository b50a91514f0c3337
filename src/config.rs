//! 配置管理模块
//!
//! 提供CLI参数解析和翻译配置管理功能

// 标准库导入
use std::path::PathBuf;

// 第三方crate导入
use clap::{Parser, ValueEnum};

// 本地模块导入
use crate::api_constants::{api_config, is_valid_api_url, markup_config, service_config};
use crate::error::{Result, TranslationError};
use crate::translation_error;

/// 翻译配置结构体
///
/// 流水线、批量对齐协议和翻译后端共享的配置，支持Builder模式进行链式配置。
///
/// # Examples
///
/// ```rust
/// use epub_translation_cli::config::TranslationConfig;
///
/// let config = TranslationConfig::new()
///     .target_language("ja")
///     .with_eligible_tags(&["p", "li"])
///     .with_max_retries(2);
///
/// assert!(config.is_markup_member("OEBPS/ch01.xhtml"));
/// assert_eq!(config.eligible_tags().to_vec(), vec!["p", "li"]);
/// ```
#[derive(Debug, Clone)]
pub struct TranslationConfig {
    /// 目标语言代码 (如: ko, zh, ja)
    target_lang: String,
    /// 模型标识
    model: String,
    /// 翻译API地址覆盖
    api_url: Option<String>,
    /// 可翻译元素标签
    eligible_tags: Vec<String>,
    /// 标记成员扩展名
    markup_extensions: Vec<String>,
    /// 最大重试次数
    max_retries: usize,
    /// HTTP请求超时（秒）
    timeout_secs: u64,
}

impl TranslationConfig {
    /// 创建新的配置实例
    ///
    /// 默认值：
    /// - 目标语言: 韩语 ("ko")
    /// - 模型: gemini-2.5-flash-lite
    /// - 可翻译元素: `p`
    /// - 标记扩展名: `.html` `.xhtml` `.htm`
    /// - 不重试
    pub fn new() -> Self {
        Self {
            target_lang: service_config::DEFAULT_TARGET_LANG.to_string(),
            model: api_config::DEFAULT_MODEL.to_string(),
            api_url: None,
            eligible_tags: markup_config::DEFAULT_ELIGIBLE_TAGS
                .iter()
                .map(|t| t.to_string())
                .collect(),
            markup_extensions: markup_config::DEFAULT_MARKUP_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            max_retries: service_config::DEFAULT_MAX_RETRIES,
            timeout_secs: service_config::REQUEST_TIMEOUT_SECONDS,
        }
    }

    /// 获取目标语言代码
    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    /// 获取模型标识
    pub fn model(&self) -> &str {
        &self.model
    }

    /// 获取API地址覆盖
    pub fn api_url(&self) -> Option<&str> {
        self.api_url.as_deref()
    }

    pub fn eligible_tags(&self) -> &[String] {
        &self.eligible_tags
    }

    pub fn markup_extensions(&self) -> &[String] {
        &self.markup_extensions
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// 设置目标语言代码
    pub fn target_language(mut self, lang: &str) -> Self {
        self.target_lang = lang.to_string();
        self
    }

    /// 设置模型
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// 设置API地址
    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = Some(url.to_string());
        self
    }

    /// 设置可翻译元素标签（统一小写）
    pub fn with_eligible_tags<S: AsRef<str>>(mut self, tags: &[S]) -> Self {
        self.eligible_tags = tags
            .iter()
            .map(|t| t.as_ref().trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        self
    }

    /// 设置标记成员扩展名，缺少前导点时自动补齐
    pub fn with_markup_extensions<S: AsRef<str>>(mut self, extensions: &[S]) -> Self {
        self.markup_extensions = extensions
            .iter()
            .map(|e| e.as_ref().trim().to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .map(|e| if e.starts_with('.') { e } else { format!(".{}", e) })
            .collect();
        self
    }

    /// 设置最大重试次数
    pub fn with_max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// 按成员名后缀判断是否为标记成员
    pub fn is_markup_member(&self, name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        self.markup_extensions.iter().any(|ext| lower.ends_with(ext))
    }

    /// 校验配置完整性
    pub fn validate(&self) -> Result<()> {
        if self.eligible_tags.is_empty() {
            return Err(translation_error!(config, "tags", "至少需要一个可翻译元素标签"));
        }
        if self.markup_extensions.is_empty() {
            return Err(translation_error!(config, "extensions", "至少需要一个标记文件扩展名"));
        }
        if self.model.trim().is_empty() {
            return Err(translation_error!(config, "model", "模型标识不能为空"));
        }
        if let Some(url) = &self.api_url {
            if !is_valid_api_url(url) {
                return Err(TranslationError::Configuration {
                    field: "api".to_string(),
                    reason: format!("无效的API地址: {}", url),
                });
            }
        }
        Ok(())
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// 翻译服务提供方
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    /// Google Gemini generateContent 接口
    Gemini,
    /// DeepLX兼容的通用HTTP翻译接口
    Http,
}

/// CLI参数结构
#[derive(Parser, Debug)]
#[command(author, version, about = "EPUB电子书翻译CLI工具 - 段落批量翻译，结构与资源原样保留", long_about = None)]
pub struct Cli {
    /// 输入EPUB文件路径
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// 输出文件路径 (可选，默认为输入文件名+语言代码)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// 目标语言代码 (如: ko, zh, ja, en)
    #[arg(short, long, default_value = service_config::DEFAULT_TARGET_LANG)]
    pub lang: String,

    /// 模型标识
    #[arg(short, long, default_value = api_config::DEFAULT_MODEL)]
    pub model: String,

    /// 翻译服务提供方
    #[arg(long, value_enum, default_value = "gemini")]
    pub provider: Provider,

    /// 翻译API地址 (http提供方默认 localhost:1188，gemini可覆盖基础地址)
    #[arg(short, long)]
    pub api: Option<String>,

    /// API凭据
    #[arg(long, env = api_config::API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// 可翻译元素标签，逗号分隔
    #[arg(long, value_delimiter = ',', default_value = "p")]
    pub tags: Vec<String>,

    /// 需要翻译的成员扩展名，逗号分隔
    #[arg(long, value_delimiter = ',', default_value = ".html,.xhtml,.htm")]
    pub extensions: Vec<String>,

    /// 最大重试次数
    #[arg(long, default_value = "0")]
    pub max_retries: usize,

    /// HTTP请求超时时间（秒）
    #[arg(long, default_value = "300")]
    pub timeout: u64,

    /// 详细输出模式
    #[arg(short, long)]
    pub verbose: bool,

    /// 静默模式 (仅输出错误)
    #[arg(short, long)]
    pub quiet: bool,

    /// 显示运行统计
    #[arg(long)]
    pub stats: bool,
}

impl Cli {
    /// 由命令行参数构建翻译配置
    pub fn translation_config(&self) -> TranslationConfig {
        let mut config = TranslationConfig::new()
            .target_language(&self.lang)
            .with_model(&self.model)
            .with_eligible_tags(self.tags.as_slice())
            .with_markup_extensions(self.extensions.as_slice())
            .with_max_retries(self.max_retries)
            .with_timeout_secs(self.timeout);
        if let Some(api) = &self.api {
            config = config.with_api_url(api);
        }
        config
    }
}
