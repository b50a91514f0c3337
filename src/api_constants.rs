/// 翻译API配置常量
///
/// 该文件定义了所有翻译服务相关的常量配置，方便统一管理和维护

/// 默认翻译API配置
pub mod api_config {
    /// Gemini API基础地址
    pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

    /// 默认模型
    pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";

    /// 凭据环境变量名
    pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

    /// 本地开发API地址 (DeepLX兼容)
    pub const LOCAL_API_URL: &str = "http://localhost:1188/translate";
}

/// 翻译服务配置
pub mod service_config {
    /// 默认目标语言
    pub const DEFAULT_TARGET_LANG: &str = "ko";

    /// 支持的语言代码及其英文名称
    pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
        ("zh", "Simplified Chinese"),
        ("en", "English"),
        ("ja", "Japanese"),
        ("ko", "Korean"),
        ("fr", "French"),
        ("de", "German"),
        ("es", "Spanish"),
        ("it", "Italian"),
        ("pt", "Portuguese"),
        ("ru", "Russian"),
        ("ar", "Arabic"),
        ("hi", "Hindi"),
        ("th", "Thai"),
        ("vi", "Vietnamese"),
        ("id", "Indonesian"),
        ("nl", "Dutch"),
        ("sv", "Swedish"),
        ("pl", "Polish"),
        ("tr", "Turkish"),
        ("uk", "Ukrainian"),
    ];

    /// 默认最大重试次数（0表示不重试）
    pub const DEFAULT_MAX_RETRIES: usize = 0;

    /// 重试延迟基数（毫秒）
    pub const RETRY_DELAY_BASE_MS: u64 = 1000;

    /// 请求超时时间（秒）
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 300;
}

/// 标记文本处理配置
pub mod markup_config {
    /// 片段分隔符
    pub const FRAGMENT_DELIMITER: &str = "\n---\n";

    /// 默认可翻译元素
    pub const DEFAULT_ELIGIBLE_TAGS: &[&str] = &["p"];

    /// 默认标记文件扩展名
    pub const DEFAULT_MARKUP_EXTENSIONS: &[&str] = &[".html", ".xhtml", ".htm"];

    /// 片段首尾需要保留的空白字符
    pub const WHITESPACE_CHARS: &[char] = &[' ', '\t', '\n', '\r'];
}

/// 验证API URL是否有效
pub fn is_valid_api_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// 验证语言代码是否支持
pub fn is_supported_language(lang: &str) -> bool {
    language_name(lang).is_some()
}

/// 获取语言代码对应的名称，用于构造提示词
pub fn language_name(lang: &str) -> Option<&'static str> {
    service_config::SUPPORTED_LANGUAGES
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(lang))
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_validation() {
        assert!(is_supported_language("ko"));
        assert!(is_supported_language("EN"));
        assert!(!is_supported_language("xx"));
        assert_eq!(language_name("ko"), Some("Korean"));
    }

    #[test]
    fn test_api_url_validation() {
        assert!(is_valid_api_url("https://example.com"));
        assert!(is_valid_api_url("http://localhost:8080"));
        assert!(!is_valid_api_url("ftp://example.com"));
        assert!(!is_valid_api_url("invalid-url"));
    }

    #[test]
    fn test_delimiter_is_separator_line() {
        assert_eq!(markup_config::FRAGMENT_DELIMITER.trim(), "---");
    }
}
