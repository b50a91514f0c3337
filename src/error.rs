//! 统一错误处理模块
//!
//! 提供EPUB翻译项目的统一错误类型定义和处理机制。
//! 每个成员级错误最终都会被流水线转换为"保留原文"的回退策略。

// 标准库导入
use std::fmt;

// 第三方crate导入
use anyhow::Error as AnyhowError;

/// EPUB翻译统一错误类型
#[derive(Debug)]
pub enum TranslationError {
    /// 网络请求相关错误（翻译服务不可达）
    Network {
        /// 错误消息
        message: String,
        /// HTTP状态码（如果适用）
        status_code: Option<u16>,
    },

    /// HTML解析相关错误
    HtmlParse {
        /// 具体错误信息
        details: String,
    },

    /// 翻译后序列化HTML失败
    Render {
        /// 具体错误信息
        details: String,
    },

    /// 翻译API相关错误（拒绝、配额、响应格式异常）
    TranslationApi {
        /// API响应状态码
        status_code: Option<u16>,
        /// 错误消息
        message: String,
        /// API地址
        api_url: String,
    },

    /// 译文分段数与原文片段数不一致
    Alignment {
        /// 提交的片段数
        expected: usize,
        /// 返回的分段数
        actual: usize,
    },

    /// 文件操作相关错误
    FileOperation {
        /// 文件路径或成员名
        path: String,
        /// 操作类型（读取、写入、创建等）
        operation: String,
        /// 底层错误信息
        source: String,
    },

    /// 配置相关错误
    Configuration {
        /// 配置项名称
        field: String,
        /// 错误原因
        reason: String,
    },

    /// 内部处理错误（包装anyhow::Error）
    Internal {
        /// 包装的错误
        source: AnyhowError,
    },
}

impl TranslationError {
    /// 是否属于翻译服务错误（网络或API）
    pub fn is_service_error(&self) -> bool {
        matches!(
            self,
            TranslationError::Network { .. } | TranslationError::TranslationApi { .. }
        )
    }

    /// 简短的错误分类标签，用于汇总报告
    pub fn kind(&self) -> &'static str {
        match self {
            TranslationError::Network { .. } | TranslationError::TranslationApi { .. } => {
                "service"
            }
            TranslationError::HtmlParse { .. } => "parse",
            TranslationError::Render { .. } => "render",
            TranslationError::Alignment { .. } => "alignment",
            TranslationError::FileOperation { .. } => "io",
            TranslationError::Configuration { .. } => "config",
            TranslationError::Internal { .. } => "internal",
        }
    }
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationError::Network {
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "网络请求失败 [{}]: {}", code, message)
                } else {
                    write!(f, "网络请求失败: {}", message)
                }
            }
            TranslationError::HtmlParse { details } => {
                write!(f, "HTML解析失败: {}", details)
            }
            TranslationError::Render { details } => {
                write!(f, "HTML序列化失败: {}", details)
            }
            TranslationError::TranslationApi {
                status_code,
                message,
                api_url,
            } => match status_code {
                Some(code) => write!(f, "翻译API错误 [{}] {}: {}", code, api_url, message),
                None => write!(f, "翻译API错误 {}: {}", api_url, message),
            },
            TranslationError::Alignment { expected, actual } => {
                write!(
                    f,
                    "译文分段数不匹配: 原文 {} 段, 译文 {} 段",
                    expected, actual
                )
            }
            TranslationError::FileOperation {
                path,
                operation,
                source,
            } => {
                write!(f, "文件{}操作失败 [{}]: {}", operation, path, source)
            }
            TranslationError::Configuration { field, reason } => {
                write!(f, "配置错误 [{}]: {}", field, reason)
            }
            TranslationError::Internal { source } => {
                write!(f, "内部处理错误: {}", source)
            }
        }
    }
}

impl std::error::Error for TranslationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TranslationError::Internal { source } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// EPUB翻译结果类型别名
pub type Result<T> = std::result::Result<T, TranslationError>;

/// 便捷的错误创建宏
#[macro_export]
macro_rules! translation_error {
    (html_parse, $details:expr) => {
        $crate::error::TranslationError::HtmlParse {
            details: $details.to_string(),
        }
    };
    (render, $details:expr) => {
        $crate::error::TranslationError::Render {
            details: $details.to_string(),
        }
    };
    (file_op, $path:expr, $op:expr, $source:expr) => {
        $crate::error::TranslationError::FileOperation {
            path: $path.to_string(),
            operation: $op.to_string(),
            source: $source.to_string(),
        }
    };
    (translation_api, $code:expr, $msg:expr, $url:expr) => {
        $crate::error::TranslationError::TranslationApi {
            status_code: $code,
            message: $msg.to_string(),
            api_url: $url.to_string(),
        }
    };
    (config, $field:expr, $reason:expr) => {
        $crate::error::TranslationError::Configuration {
            field: $field.to_string(),
            reason: $reason.to_string(),
        }
    };
}

/// 从anyhow::Error转换为TranslationError
impl From<AnyhowError> for TranslationError {
    fn from(error: AnyhowError) -> Self {
        TranslationError::Internal { source: error }
    }
}

/// 从reqwest::Error转换为TranslationError
impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        let status_code = error.status().map(|s| s.as_u16());
        TranslationError::Network {
            message: error.to_string(),
            status_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TranslationError::Network {
            message: "Connection failed".to_string(),
            status_code: Some(500),
        };

        assert_eq!(format!("{}", err), "网络请求失败 [500]: Connection failed");
    }

    #[test]
    fn test_alignment_display_reports_both_counts() {
        let err = TranslationError::Alignment {
            expected: 3,
            actual: 2,
        };
        assert_eq!(err.to_string(), "译文分段数不匹配: 原文 3 段, 译文 2 段");
        assert_eq!(err.kind(), "alignment");
        assert!(!err.is_service_error());
    }

    #[test]
    fn test_error_macro() {
        let err = translation_error!(file_op, "OEBPS/ch01.xhtml", "写入", "disk full");
        match err {
            TranslationError::FileOperation {
                ref path,
                ref operation,
                ref source,
            } => {
                assert_eq!(path, "OEBPS/ch01.xhtml");
                assert_eq!(operation, "写入");
                assert_eq!(source, "disk full");
            }
            _ => panic!("Wrong error type"),
        }
        assert_eq!(err.kind(), "io");
        assert_eq!(err.to_string(), "文件写入操作失败 [OEBPS/ch01.xhtml]: disk full");
    }

    #[test]
    fn test_service_classification() {
        let api = translation_error!(translation_api, Some(429), "quota", "https://api");
        assert!(api.is_service_error());
        assert_eq!(api.kind(), "service");

        let parse = translation_error!(html_parse, "bad bytes");
        assert!(!parse.is_service_error());
        assert_eq!(parse.kind(), "parse");
    }

    #[test]
    fn test_anyhow_conversion() {
        let anyhow_err = anyhow::anyhow!("Test anyhow error");
        let translation_err: TranslationError = anyhow_err.into();

        match translation_err {
            TranslationError::Internal { .. } => {}
            _ => panic!("Wrong error type"),
        }
    }
}
