//! 翻译服务模块
//!
//! 定义翻译后端的统一接口，以及Gemini、通用HTTP两种实现和调用方重试包装。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::api_constants::{api_config, language_name, service_config};
use crate::config::TranslationConfig;
use crate::error::{Result, TranslationError};
use crate::translation_error;

/// 翻译后端统一接口
///
/// 空白输入不会产生网络请求，直接返回空字符串。
#[async_trait]
pub trait Translator: Send + Sync {
    /// 翻译一段文本
    async fn translate(&self, text: &str) -> Result<String>;

    /// 后端名称，用于日志
    fn name(&self) -> &str;
}

/// 构造翻译提示词
///
/// 要求保留分隔行，否则批量结果无法按位置对齐。
pub fn build_prompt(target_lang: &str, text: &str) -> String {
    let language = language_name(target_lang).unwrap_or(target_lang);
    format!(
        "You are a professional translator. Translate the following text into natural and fluent {}. \
         The text consists of segments separated by lines containing only \"---\". \
         Keep every \"---\" separator line exactly as it is and translate each segment independently, \
         so the output has exactly the same number of segments. \
         Do not include any other explanations or supplementary text other than the translated text.\
         \n\nOriginal Text:\n{}",
        language, text
    )
}

/// 创建HTTP客户端
fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(TranslationError::from)
}

/// Google Gemini 翻译后端
#[derive(Debug, Clone)]
pub struct GeminiTranslator {
    client: Client,
    api_key: String,
    endpoint: String,
    target_lang: String,
}

impl GeminiTranslator {
    pub fn new(config: &TranslationConfig, api_key: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(translation_error!(
                config,
                api_config::API_KEY_ENV,
                "必须设置API凭据"
            ));
        }

        let base = config
            .api_url()
            .unwrap_or(api_config::GEMINI_API_BASE)
            .trim_end_matches('/');
        let endpoint = format!("{}/models/{}:generateContent", base, config.model());
        url::Url::parse(&endpoint).map_err(|e| {
            translation_error!(config, "api", format!("无效的Gemini地址 {}: {}", endpoint, e))
        })?;

        Ok(Self {
            client: build_client(config.timeout_secs())?,
            api_key: api_key.to_string(),
            endpoint,
            target_lang: config.target_lang().to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// 从generateContent响应中提取文本
pub fn extract_gemini_text(response: &Value) -> Option<String> {
    let parts = response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait]
impl Translator for GeminiTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let prompt = build_prompt(&self.target_lang, text);
        debug!("📤 发送Gemini请求: {} 字符", prompt.len());

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "contents": [{
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }]
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(translation_error!(
                translation_api,
                Some(status.as_u16()),
                body,
                self.endpoint
            ));
        }

        let json_val: Value = serde_json::from_str(&body).map_err(|e| {
            translation_error!(
                translation_api,
                Some(status.as_u16()),
                format!("响应不是有效JSON: {}", e),
                self.endpoint
            )
        })?;

        extract_gemini_text(&json_val).ok_or_else(|| {
            translation_error!(
                translation_api,
                Some(status.as_u16()),
                "响应中未找到翻译文本或格式不正确",
                self.endpoint
            )
        })
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// DeepLX兼容的通用HTTP翻译后端
#[derive(Debug, Clone)]
pub struct HttpApiTranslator {
    client: Client,
    api_url: String,
    target_lang: String,
}

impl HttpApiTranslator {
    pub fn new(config: &TranslationConfig) -> Result<Self> {
        // 未指定地址时使用本地DeepLX服务
        let api_url = config.api_url().unwrap_or(api_config::LOCAL_API_URL);

        Ok(Self {
            client: build_client(config.timeout_secs())?,
            api_url: api_url.to_string(),
            target_lang: config.target_lang().to_string(),
        })
    }
}

/// 解析通用翻译API响应
///
/// 依次尝试 `data` / `text` / `result` 字段；非对象响应按纯文本处理。
/// JSON对象中没有可用的文本字段时视为服务拒绝，不能把响应体当作译文。
pub fn extract_api_text(response_text: &str, api_url: &str) -> Result<String> {
    let json_val = match serde_json::from_str::<Value>(response_text) {
        Ok(value) => value,
        Err(_) => return Ok(response_text.to_string()),
    };
    if let Some(text) = json_val.as_str() {
        return Ok(text.to_string());
    }
    if !json_val.is_object() {
        return Ok(response_text.to_string());
    }

    ["data", "text", "result"]
        .iter()
        .find_map(|field| json_val.get(*field).and_then(|v| v.as_str()))
        .map(|text| text.to_string())
        .ok_or_else(|| {
            translation_error!(
                translation_api,
                None,
                format!("响应中未找到翻译文本: {}", response_text),
                api_url
            )
        })
}

#[async_trait]
impl Translator for HttpApiTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let response = self
            .client
            .post(&self.api_url)
            .json(&json!({
                "text": text,
                "source_lang": "auto",
                "target_lang": self.target_lang.to_uppercase()
            }))
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(translation_error!(
                translation_api,
                Some(status.as_u16()),
                response_text,
                self.api_url
            ));
        }

        extract_api_text(&response_text, &self.api_url)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// 调用方重试包装
///
/// 仅对服务错误重试，延迟按次数线性增长。
pub struct RetryingTranslator<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
}

impl<T: Translator> RetryingTranslator<T> {
    pub fn new(inner: T, max_retries: usize) -> Self {
        Self {
            inner,
            max_retries,
            base_delay: Duration::from_millis(service_config::RETRY_DELAY_BASE_MS),
        }
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }
}

#[async_trait]
impl<T: Translator> Translator for RetryingTranslator<T> {
    async fn translate(&self, text: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.inner.translate(text).await {
                Ok(translated) => return Ok(translated),
                Err(e) if e.is_service_error() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "🔁 翻译请求失败，第 {}/{} 次重试: {}",
                        attempt, self.max_retries, e
                    );
                    tokio::time::sleep(self.base_delay * attempt as u32).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
